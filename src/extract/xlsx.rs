//! Spreadsheet extraction backed by `calamine`.
//!
//! Every sheet is flattened into text blocks. Sheets whose first row carries headers are read as
//! tables and each value is prefixed with its header so retrieval keeps the column context; other
//! sheets keep their row structure with `" | "` separators.

use super::types::{ExtractError, ExtractedDocument, FileType, file_name_of};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use std::path::Path;

/// Cell grid anchored at `A1`; `None` marks an empty cell.
pub type Grid = Vec<Vec<Option<String>>>;

/// Read a `.xlsx` workbook and flatten all sheets into one text body.
pub fn extract_xlsx(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|error| match error {
        calamine::XlsxError::Io(source) => ExtractError::Read {
            path: path.to_path_buf(),
            source,
        },
        other => ExtractError::Parse {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })?;

    let sheets: Vec<String> = workbook.sheet_names().to_vec();
    let mut blocks = Vec::new();
    for sheet in &sheets {
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|error| ExtractError::Parse {
                path: path.to_path_buf(),
                message: format!("sheet '{sheet}': {error}"),
            })?;
        let grid = range_to_grid(&range);
        tracing::trace!(sheet = %sheet, rows = grid.len(), "Flattening sheet");
        blocks.extend(flatten_sheet(sheet, &grid));
    }

    tracing::debug!(
        file = %path.display(),
        sheets = sheets.len(),
        blocks = blocks.len(),
        "Extracted spreadsheet"
    );

    Ok(ExtractedDocument {
        file_name: file_name_of(path),
        file_type: FileType::Xlsx,
        text: blocks.join("\n\n"),
        sheets,
    })
}

/// Convert a calamine range into a grid anchored at `A1`.
///
/// Calamine trims leading empty rows and columns; they are restored so that "row 1" keeps meaning
/// the first row of the sheet.
fn range_to_grid(range: &Range<Data>) -> Grid {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![None; start_col as usize];
        cells.extend(row.iter().map(cell_text));
        grid.push(cells);
    }
    grid
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            Some(value.clone())
        }
        Data::DateTime(value) if value.is_datetime() => Some(
            value
                .as_datetime()
                .map(|datetime| datetime.format(DATETIME_FORMAT).to_string())
                .unwrap_or_else(|| value.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

/// Flatten one sheet into text blocks, starting with the `Sheet:` marker.
pub fn flatten_sheet(name: &str, grid: &Grid) -> Vec<String> {
    let mut blocks = vec![format!("\nSheet: {name}")];

    let headers: Vec<String> = grid
        .first()
        .map(|row| {
            row.iter()
                .flatten()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if headers.is_empty() {
        blocks.extend(grid.iter().filter_map(|row| free_form_row(row)));
    } else {
        blocks.extend(
            grid.iter()
                .skip(1)
                .filter_map(|row| tabular_row(row, &headers)),
        );
    }

    blocks
}

fn non_blank(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().filter(|value| !value.trim().is_empty())
}

fn tabular_row(row: &[Option<String>], headers: &[String]) -> Option<String> {
    let values: Vec<String> = row
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| {
            non_blank(cell).map(|value| match headers.get(idx) {
                Some(header) => format!("{header}: {value}"),
                None => value.to_string(),
            })
        })
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join("\n"))
    }
}

fn free_form_row(row: &[Option<String>]) -> Option<String> {
    let values: Vec<&str> = row.iter().filter_map(non_blank).collect();
    match values.as_slice() {
        [] => None,
        [single] if single.contains('\n') => Some((*single).to_string()),
        _ => Some(values.join(" | ")),
    }
}
