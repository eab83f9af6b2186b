// 👀 Preview - human-readable summary of each loaded table

use crate::table::{Table, TableRole};
use std::path::Path;

/// Rows shown in the head section.
pub const HEAD_ROWS: usize = 5;

/// Join keys whose presence is reported for every table.
pub const KEY_COLUMNS: [&str; 5] = ["id", "client_id", "card_id", "user_id", "customer_id"];

/// Render the preview block for one table.
pub fn preview_table(role: TableRole, table: &Table, path: &Path, sha256: &str) -> String {
    let label = role.label();
    let mut lines = Vec::new();

    lines.push(format!("[{}]  file: {}", label, path.display()));
    lines.push(format!("[{}]  sha256: {}", label, sha256));
    lines.push(format!(
        "[{}]  shape: {} rows × {} cols",
        label,
        table.row_count(),
        table.column_count()
    ));
    lines.push(format!("[{}]  columns: {}", label, table.column_names().join(", ")));

    let name_width = table.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let dtypes = table
        .columns
        .iter()
        .map(|c| format!("{:<width$}    {}", c.name, c.column_type.dtype(), width = name_width))
        .collect::<Vec<_>>()
        .join("\n");
    lines.push(format!("[{}]  dtypes:\n{}", label, dtypes));
    lines.push(format!("[{}]  head({}):\n{}", label, HEAD_ROWS, format_head(table, HEAD_ROWS)));

    let present = KEY_COLUMNS
        .iter()
        .map(|k| format!("{}={}", k, if table.has_column(k) { "Y" } else { "N" }))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("[{}]  key columns present: {}", label, present));

    lines.join("\n")
}

/// First `n` rows as right-aligned text columns.
fn format_head(table: &Table, n: usize) -> String {
    let head: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(n)
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            head.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:>width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut out = vec![render(table.column_names())];
    for row in &head {
        out.push(render(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}
