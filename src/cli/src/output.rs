//! Table formatting helpers for CLI output.

use comfy_table::{ContentArrangement, Table};

/// Create a styled table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_with_rows() {
        let mut table = new_table(&["DIRECTIVE", "EMITTED", "VALUE"]);
        table.add_row(["ENV", "yes", "PORT=8080"]);
        table.add_row(["EXPOSE", "no", ""]);
        let output = table.to_string();
        assert!(output.contains("DIRECTIVE"));
        assert!(output.contains("PORT=8080"));
        assert!(output.contains("EXPOSE"));
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no(true), "yes");
        assert_eq!(yes_no(false), "no");
    }
}
