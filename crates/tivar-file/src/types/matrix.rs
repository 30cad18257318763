//! The matrix type.
//!
//! A matrix is a two-dimensional array of real elements. Data layout:
//! `[width:1][height:1][width × height × 9-byte reals]`, row-major. TI-OS
//! caps each dimension at 99 and the whole matrix at 400 elements.

use crate::diag::{Diagnostics, Warning};
use crate::entry::{Entry, EntryKind, EntryOptions, REAL_WIDTH};
use crate::error::{Result, VarError};
use crate::field::{INTEGER, SliceSpec, View};
use crate::types::real;

const WIDTH: View<u64> = View::new("width", None, SliceSpec::range(0, 1), INTEGER);
const HEIGHT: View<u64> = View::new("height", None, SliceSpec::range(1, 2), INTEGER);

fn expect_matrix(entry: &Entry, representation: &'static str) -> Result<()> {
    match entry.kind() {
        EntryKind::Matrix => Ok(()),
        kind => Err(VarError::not_implemented(kind.label(), representation)),
    }
}

/// The number of columns.
#[must_use]
pub fn width(entry: &Entry) -> usize {
    WIDTH.get(entry.data()) as usize
}

/// The number of rows.
#[must_use]
pub fn height(entry: &Entry) -> usize {
    HEIGHT.get(entry.data()) as usize
}

/// The number of elements.
#[must_use]
pub fn size(entry: &Entry) -> usize {
    width(entry) * height(entry)
}

/// Replace this matrix's contents with a rectangular grid of reals.
///
/// Ragged rows are rejected outright; dimension and size limits load with
/// warnings.
pub fn load_matrix(entry: &mut Entry, rows: &[Vec<Entry>], diag: &mut Diagnostics) -> Result<()> {
    expect_matrix(entry, "matrix")?;

    let row_width = rows.first().map_or(0, Vec::len);
    if rows.is_empty() || rows.iter().any(|row| row.len() != row_width) {
        return Err(VarError::structural("matrix has uneven rows"));
    }

    let mut data = vec![row_width as u8, rows.len() as u8];
    for row in rows {
        for element in row {
            if element.kind() != EntryKind::Real || element.data_length() != REAL_WIDTH {
                return Err(VarError::structural("matrix element is not a full real"));
            }
            data.extend_from_slice(element.data());
        }
    }

    for (dimension, value) in [("width", row_width), ("height", rows.len())] {
        if value > 99 {
            diag.warn(Warning::MatrixDimension { dimension, value });
        }
    }
    if row_width * rows.len() > 400 {
        diag.warn(Warning::MatrixTooBig {
            elements: row_width * rows.len(),
        });
    }

    entry.set_data(data);
    Ok(())
}

/// The elements of this matrix, row by row.
///
/// Each element is sliced out of the shared data section at flat index
/// `width * row + column`.
pub fn matrix(entry: &Entry) -> Result<Vec<Vec<Entry>>> {
    expect_matrix(entry, "matrix")?;

    let width = width(entry);
    let flashless = entry.meta_length() <= crate::entry::BASE_META_LENGTH;
    let body = entry.data().get(2..).unwrap_or_default();

    Ok((0..height(entry))
        .map(|row| {
            (0..width)
                .map(|column| {
                    let index = width * row + column;
                    let start = REAL_WIDTH * index;
                    let data = body
                        .get(start..start + REAL_WIDTH)
                        .unwrap_or_default()
                        .to_vec();

                    let options = EntryOptions::new(EntryKind::Real).with_data(data);
                    let options = if flashless { options.flashless() } else { options };
                    Entry::with_options(&options).0
                })
                .collect()
        })
        .collect())
}

/// Parse a string of the form `[[1, 2], [3, 4]]`.
pub fn load_string(entry: &mut Entry, string: &str, diag: &mut Diagnostics) -> Result<()> {
    expect_matrix(entry, "string")?;

    let compact: String = string.chars().filter(|c| !c.is_whitespace()).collect();
    let inner = compact
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| VarError::structural(format!("invalid matrix string {string:?}")))?;

    let mut rows = Vec::new();
    for row_text in inner.replace("],[", "][").split("][") {
        let row_text = row_text.trim_matches(['[', ']']);
        let mut row = Vec::new();
        for item in row_text.split(',') {
            let mut element = Entry::new(EntryKind::Real);
            real::load_string(&mut element, item, diag)?;
            row.push(element);
        }
        rows.push(row);
    }

    load_matrix(entry, &rows, diag)
}

/// Render this matrix as `[[a, b], [c, d]]`.
pub fn string(entry: &Entry) -> Result<String> {
    let rendered: Vec<String> = matrix(entry)?
        .iter()
        .map(|row| {
            let row: Vec<String> = row.iter().map(real::string).collect::<Result<_>>()?;
            Ok(format!("[{}]", row.join(", ")))
        })
        .collect::<Result<_>>()?;

    Ok(format!("[{}]", rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_entry(text: &str) -> Entry {
        let mut entry = Entry::new(EntryKind::Real);
        let mut diag = Diagnostics::new();
        real::load_string(&mut entry, text, &mut diag).unwrap();
        entry
    }

    #[test]
    fn rectangular_load_round_trips() {
        let mut entry = Entry::new(EntryKind::Matrix);
        let mut diag = Diagnostics::new();

        let rows = vec![
            vec![real_entry("1"), real_entry("2"), real_entry("3")],
            vec![real_entry("4"), real_entry("5"), real_entry("6")],
        ];
        load_matrix(&mut entry, &rows, &mut diag).unwrap();

        assert!(diag.is_empty());
        assert_eq!(width(&entry), 3);
        assert_eq!(height(&entry), 2);
        assert_eq!(entry.data_length(), 2 + 6 * 9);
        assert_eq!(string(&entry).unwrap(), "[[1, 2, 3], [4, 5, 6]]");
    }

    #[test]
    fn uneven_rows_are_rejected() {
        let mut entry = Entry::new(EntryKind::Matrix);
        let mut diag = Diagnostics::new();

        let rows = vec![
            vec![real_entry("1"), real_entry("2"), real_entry("3")],
            vec![real_entry("4"), real_entry("5")],
        ];
        let err = load_matrix(&mut entry, &rows, &mut diag).unwrap_err();
        assert!(matches!(err, VarError::StructuralMismatch { .. }));
    }

    #[test]
    fn string_parse_matches_manual_load() {
        let mut parsed = Entry::new(EntryKind::Matrix);
        let mut diag = Diagnostics::new();
        load_string(&mut parsed, "[[1.5, 2], [3, 4]]", &mut diag).unwrap();

        let elements = matrix(&parsed).unwrap();
        assert_eq!(real::string(&elements[0][0]).unwrap(), "1.5");
        assert_eq!(real::string(&elements[1][1]).unwrap(), "4");
    }

    #[test]
    fn oversized_dimensions_warn() {
        let mut entry = Entry::new(EntryKind::Matrix);
        let mut diag = Diagnostics::new();

        let row: Vec<Entry> = (0..101).map(|_| real_entry("0")).collect();
        load_matrix(&mut entry, &[row], &mut diag).unwrap();

        assert!(diag.any(|w| matches!(
            w,
            Warning::MatrixDimension {
                dimension: "width",
                value: 101
            }
        )));
    }

    #[test]
    fn element_count_mismatch_warns_on_load() {
        let mut source = Entry::new(EntryKind::Matrix);
        let mut diag = Diagnostics::new();
        load_string(&mut source, "[[1, 2], [3, 4]]", &mut diag).unwrap();

        // Claim a 3-wide matrix while carrying 2x2 elements.
        source.data_mut()[0] = 3;
        let bytes = source.bytes();

        let mut reparsed = Entry::new(EntryKind::Generic);
        let mut diag = Diagnostics::new();
        reparsed.load_bytes(&bytes, &mut diag).unwrap();
        assert!(diag.any(|w| matches!(w, Warning::ElementCountMismatch { .. })));
    }
}
