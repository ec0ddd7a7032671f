//! `oci2docker inspect` command: show the bundle's directive mapping.

use clap::Args;
use oci2docker_core::config::Verbosity;
use oci2docker_runtime::{DirectiveSet, Inspection};

use crate::output;

use super::MappingArgs;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub mapping: MappingArgs,

    /// Print the parsed spec and directives as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    args.mapping.bundle.require_bundle()?;
    let config = args.mapping.to_config("", Verbosity::Quiet);
    let inspection = oci2docker_runtime::inspect(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&inspection))?);
        return Ok(());
    }

    println!(
        "Bundle: {} ({} layout)",
        inspection.bundle.path().display(),
        inspection.bundle.layout()
    );
    let mut table = output::new_table(&["DIRECTIVE", "EMITTED", "VALUE"]);
    for row in directive_rows(&inspection.directives) {
        table.add_row([row.directive, output::yes_no(row.emitted), row.value.as_str()]);
    }
    println!("{table}");
    Ok(())
}

fn to_json(inspection: &Inspection) -> serde_json::Value {
    serde_json::json!({
        "Bundle": inspection.bundle.path().display().to_string(),
        "Layout": inspection.bundle.layout().to_string(),
        "RootfsEntries": inspection.bundle.rootfs_entries(),
        "Spec": inspection.spec,
        "Directives": inspection.directives,
    })
}

/// One table row per directive the mapper decides on.
struct DirectiveRow {
    directive: &'static str,
    emitted: bool,
    value: String,
}

fn directive_rows(set: &DirectiveSet) -> Vec<DirectiveRow> {
    let row = |directive, emitted, value: &str| DirectiveRow {
        directive,
        emitted,
        value: value.to_string(),
    };

    let mut exec = vec![set.entrypoint.as_str()];
    exec.extend(set.entrypoint_args.iter().map(String::as_str));

    vec![
        row("ADD", set.has_add, &set.content),
        row("ENV", set.has_env, &set.environment),
        row("USER", set.has_user, &set.user_string().unwrap_or_default()),
        row("WORKDIR", set.has_workdir, &set.workdir),
        row("CMD", set.has_cmd, &set.command),
        row("ENTRYPOINT", true, &exec.join(" ")),
        row("EXPOSE", set.has_port, &set.expose),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use oci2docker_runtime::oci::UserSpec;

    #[test]
    fn test_directive_rows() {
        let set = DirectiveSet {
            entrypoint: "/bin/nginx".to_string(),
            entrypoint_args: vec!["-g".to_string(), "daemon off;".to_string()],
            workdir: "/srv".to_string(),
            user: Some(UserSpec { uid: 0, gid: 0 }),
            content: "./rootfs".to_string(),
            has_add: true,
            has_user: true,
            ..Default::default()
        };

        let rows = directive_rows(&set);
        let names: Vec<_> = rows.iter().map(|r| r.directive).collect();
        assert_eq!(
            names,
            ["ADD", "ENV", "USER", "WORKDIR", "CMD", "ENTRYPOINT", "EXPOSE"]
        );

        let user = &rows[2];
        assert_eq!(user.value, "0:0");
        assert!(user.emitted);

        let entrypoint = &rows[5];
        assert!(entrypoint.emitted);
        assert_eq!(entrypoint.value, "/bin/nginx -g daemon off;");

        assert!(rows[0].emitted);
        assert!(!rows[3].emitted);
    }

    #[test]
    fn test_json_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"ociVersion": "1.0.2", "process": {"args": ["/app/server"], "env": ["PORT=8080"]}, "root": {"path": "rootfs"}}"#,
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("rootfs")).unwrap();

        let config = oci2docker_core::ConvertConfig::new(dir.path(), "");
        let inspection = oci2docker_runtime::inspect(&config).unwrap();
        let json = to_json(&inspection);

        assert_eq!(json["Layout"], "current");
        assert_eq!(json["RootfsEntries"], 0);
        assert_eq!(json["Spec"]["ociVersion"], "1.0.2");
        assert_eq!(json["Directives"]["entrypoint"], "/app/server");
        assert_eq!(json["Directives"]["environment"], "PORT=8080");
        assert_eq!(json["Directives"]["has_add"], true);
    }
}
