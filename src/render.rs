//! Column-aligned rendering of flat rows.
//!
//! The rendered form is what fixtures are written in and what two tables are
//! diffed on, so it is fully deterministic: cells are left-justified to their
//! column width, columns are joined by `min_spacing` spaces and trailing
//! whitespace is trimmed from every line.

use crate::flatten::FlatTable;

/// Separator width used when none is configured.
pub const DEFAULT_MIN_SPACING: usize = 2;

/// Widest rendered cell per column, header included. Blank cells count as 0.
pub fn column_widths(flat: &FlatTable) -> Vec<usize> {
    widths_of(&flat.text_rows())
}

/// Element-wise maximum of two width lists.
pub fn union_widths(a: &[usize], b: &[usize]) -> Vec<usize> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.max(right)
        })
        .collect()
}

fn widths_of(rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        if widths.len() < row.len() {
            widths.resize(row.len(), 0);
        }
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

/// Render flat rows as aligned text.
///
/// `widths` defaults to [`column_widths`]; pass explicit widths to render two
/// tables on a common grid. Columns past the end of `widths` get width 0.
pub fn render(flat: &FlatTable, widths: Option<&[usize]>, min_spacing: usize) -> String {
    let rows = flat.text_rows();
    let computed;
    let widths = match widths {
        Some(widths) => widths,
        None => {
            computed = widths_of(&rows);
            computed.as_slice()
        }
    };

    let separator = " ".repeat(min_spacing);
    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let width = widths.get(i).copied().unwrap_or(0);
                    format!("{cell:<width$}")
                })
                .collect();
            cells.join(&separator).trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
