//! Table Extractor
//!
//! Splits the plain text of a results document into a header row and data
//! rows. Two layouts are recognized, decided by the first non-empty line:
//! - **Pipe tables** (`| Puesto | Nombre |`): cells split on `|`, one border
//!   pipe stripped at each end, empty interior cells kept so columns stay
//!   aligned
//! - **Column-aligned text**: cells separated by a tab or by two or more
//!   whitespace characters, so multi-word values like `Apellido y nombres`
//!   stay in one cell
//!
//! The text is assumed to hold a single table; the first line is the header.

use crate::models::{RawRow, RawTable};

/// Split `text` into a [`RawTable`]
///
/// ```
/// use podium_import::services::table_extractor::extract_table_from_text;
///
/// let table = extract_table_from_text("Puesto  Nombre\n1  Ana Gil\n");
/// assert_eq!(table.headers, vec!["Puesto", "Nombre"]);
/// assert_eq!(table.rows[0].cells(), ["1", "Ana Gil"]);
/// ```
pub fn extract_table_from_text(text: &str) -> RawTable {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let Some(header_line) = lines.next() else {
        return RawTable::default();
    };

    let split: fn(&str) -> Vec<String> = if header_line.contains('|') {
        split_pipes
    } else {
        split_aligned
    };

    let headers = split(header_line);
    let rows = lines
        .map(|line| RawRow::new(split(line)))
        .filter(|row| !row.is_blank())
        .collect();

    RawTable { headers, rows }
}

fn split_pipes(line: &str) -> Vec<String> {
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn split_aligned(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        let separator = c == '\t'
            || (c.is_whitespace() && chars.peek().is_some_and(|next| next.is_whitespace()));
        if separator {
            push_cell(&mut cells, &mut current);
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
        } else {
            current.push(c);
        }
    }
    push_cell(&mut cells, &mut current);

    cells
}

fn push_cell(cells: &mut Vec<String>, current: &mut String) {
    let cell = current.trim();
    if !cell.is_empty() {
        cells.push(cell.to_string());
    }
    current.clear();
}
