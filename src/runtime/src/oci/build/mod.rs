//! Dockerfile generation and image build support.
//!
//! Renders mapped directives into a Dockerfile, assembles a build context
//! around it, and hands that context to an external build tool.
//!
//! # Emitted Instructions
//!
//! FROM, LABEL, ADD, ENV, USER, WORKDIR, CMD, ENTRYPOINT, EXPOSE

pub mod context;
pub mod dockerfile;
pub mod engine;

pub use context::{BuildContext, BuildContextAssembler};
pub use dockerfile::{BuildScript, Directive, Dockerfile, ScriptOptions, DOCKERFILE};
pub use engine::{BuildOutput, CommandBuilder, ImageBuilder};
