//! Markdown table rendering for review tables.

use tracing::{debug, warn};

use reviewcrew_shared::Table;

/// Render a table as a GitHub-flavored Markdown table.
///
/// Columns are the union of record keys in first-seen order. Missing cells
/// render empty. A table with no records has no columns either, so the
/// result is an empty string.
pub fn render_table(table: &Table) -> String {
    let columns = table.columns();

    if columns.is_empty() {
        warn!(rows = table.len(), "no columns to render, emitting empty table");
        return String::new();
    }

    let mut md = String::new();

    // Header row
    push_row(&mut md, columns.iter().map(|c| escape_cell(c)));

    // Separator row
    push_row(&mut md, columns.iter().map(|_| "---".to_string()));

    // Data rows
    for row in table.rows(&columns) {
        push_row(&mut md, row.iter().map(|c| escape_cell(c)));
    }

    debug!(columns = columns.len(), rows = table.len(), "rendered markdown table");
    md
}

fn push_row(md: &mut String, cells: impl Iterator<Item = String>) {
    md.push_str("| ");
    md.push_str(&cells.collect::<Vec<_>>().join(" | "));
    md.push_str(" |\n");
}

/// Escape a cell so it can't break the table layout.
///
/// Pipes are backslash-escaped and line breaks become `<br>`.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reviewcrew_shared::Record;
    use serde_json::json;

    fn table(value: serde_json::Value) -> Table {
        Table::from_json(&value).expect("tabular fixture")
    }

    #[test]
    fn renders_header_separator_and_rows() {
        let md = render_table(&table(json!([
            {"name": "RAXE300", "rating": "4.5"},
            {"name": "RAXE500", "rating": "4.2"}
        ])));

        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "| name | rating |");
        assert_eq!(lines[1], "| --- | --- |");
        assert_eq!(lines[2], "| RAXE300 | 4.5 |");
        assert_eq!(lines[3], "| RAXE500 | 4.2 |");
    }

    #[test]
    fn heterogeneous_keys_leave_empty_cells() {
        let md = render_table(&table(json!([{"name": "A", "rating": "5"}, {"name": "B"}])));
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "| name | rating |");
        assert_eq!(lines[3], "| B |  |");
    }

    #[test]
    fn later_keys_are_appended_to_header() {
        let md = render_table(&table(json!([{"name": "A"}, {"price": 199, "name": "B"}])));
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "| name | price |");
        assert_eq!(lines[2], "| A |  |");
        assert_eq!(lines[3], "| B | 199 |");
    }

    #[test]
    fn pipes_and_newlines_are_escaped() {
        let md = render_table(&table(json!([
            {"features": "WiFi 6E | 2.5G port", "issues": "drops\nmobile clients"}
        ])));
        assert!(md.contains("WiFi 6E \\| 2.5G port"));
        assert!(md.contains("drops<br>mobile clients"));
        assert_eq!(md.lines().count(), 3);
    }

    #[test]
    fn empty_table_renders_empty() {
        assert_eq!(render_table(&Table::default()), "");
    }

    #[test]
    fn records_without_fields_render_empty() {
        assert_eq!(render_table(&table(json!([{}, {}]))), "");
    }

    fn arb_table() -> impl Strategy<Value = Table> {
        let record = prop::collection::vec(("[a-e]{1,3}", "[a-z ,\"\r\n|]{0,12}"), 1..4)
            .prop_map(|fields| {
                fields
                    .into_iter()
                    .fold(Record::new(), |rec, (key, value)| rec.with(key, value))
            });
        prop::collection::vec(record, 1..8).prop_map(Table::new)
    }

    proptest! {
        #[test]
        fn any_table_renders_one_line_per_record(table in arb_table()) {
            let md = render_table(&table);
            let lines: Vec<&str> = md.split_terminator('\n').collect();
            prop_assert_eq!(lines.len(), 2 + table.len());

            let mut keys: Vec<String> = Vec::new();
            for record in &table.records {
                for key in record.keys() {
                    if !keys.iter().any(|k| k == key) {
                        keys.push(key.to_string());
                    }
                }
            }
            prop_assert_eq!(lines[0], format!("| {} |", keys.join(" | ")));

            let separator = format!("|{}", " --- |".repeat(keys.len()));
            prop_assert_eq!(lines[1], separator);
        }
    }
}
