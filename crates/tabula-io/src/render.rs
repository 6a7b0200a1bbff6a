//! Plain-text views of a table for terminals and logs.

use std::fmt::Write as _;

use tabula_frame::{Column, ColumnType, Table, Value};

#[derive(Clone, Debug)]
pub struct PrintOptions {
    /// Rows shown before the "more rows" footer.
    pub max_rows: usize,
    /// Cells longer than this many characters are cut and end in `…`.
    pub max_cell_width: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            max_rows: 10,
            max_cell_width: 24,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GlimpseOptions {
    /// Total line width, including the `$ name <kind>` prefix.
    pub width: usize,
}

impl Default for GlimpseOptions {
    fn default() -> Self {
        Self { width: 80 }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Double(v) => format_double(*v),
        other => other.to_string(),
    }
}

/// Doubles print with up to four decimals, trailing zeros removed.
fn format_double(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let text = format!("{v:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn right_aligned(column: &Column) -> bool {
    column.column_type().is_numeric()
}

/// Tabular rendering: a size line, column names, kinds, then up to `max_rows` rows.
pub fn print(table: &Table, options: &PrintOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "A Table: {} x {}", table.nrow(), table.ncol());
    if table.ncol() == 0 {
        return out;
    }

    let shown = table.nrow().min(options.max_rows);
    let index_width = shown.to_string().len();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(table.ncol());
    let mut widths: Vec<usize> = Vec::with_capacity(table.ncol());
    for column in table.columns() {
        let mut col_cells = vec![
            truncate(column.name(), options.max_cell_width),
            format!("<{}>", column.column_type().abbreviation()),
        ];
        col_cells.extend(
            (0..shown).map(|row| truncate(&cell_text(&column.get(row)), options.max_cell_width)),
        );
        widths.push(col_cells.iter().map(|c| c.chars().count()).max().unwrap_or(0));
        cells.push(col_cells);
    }

    for line in 0..shown + 2 {
        let label = if line < 2 {
            String::new()
        } else {
            (line - 1).to_string()
        };
        let _ = write!(out, "{label:>index_width$}");
        for ((column, col_cells), width) in table.columns().iter().zip(&cells).zip(&widths) {
            let (text, width) = (&col_cells[line], *width);
            if right_aligned(column) || line < 2 {
                let _ = write!(out, " {text:>width$}");
            } else {
                let _ = write!(out, " {text:<width$}");
            }
        }
        // Left-aligned last cells leave trailing padding.
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }

    let hidden = table.nrow() - shown;
    if hidden > 0 {
        let _ = writeln!(out, "… with {hidden} more rows");
    }
    out
}

/// Transposed overview: one line per column with its kind and leading values.
pub fn glimpse(table: &Table, options: &GlimpseOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Observations: {}", table.nrow());
    let _ = writeln!(out, "Variables: {}", table.ncol());

    let name_width = table
        .names()
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);
    for column in table.columns() {
        let kind = column.column_type();
        let mut line = format!(
            "$ {:<name_width$} <{}> ",
            column.name(),
            kind.abbreviation()
        );
        let values: Vec<String> = column
            .iter()
            .take(options.width)
            .map(|v| match (&v, kind) {
                (Value::String(s), ColumnType::String) => format!("{s:?}"),
                _ => cell_text(&v),
            })
            .collect();
        line.push_str(&values.join(", "));
        let _ = writeln!(out, "{}", truncate(&line, options.width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_drop_trailing_zeros() {
        assert_eq!(format_double(2.5), "2.5");
        assert_eq!(format_double(3.0), "3");
        assert_eq!(format_double(1.0 / 3.0), "0.3333");
        assert_eq!(format_double(-0.00001), "0");
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
