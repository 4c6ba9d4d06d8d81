use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::{ExportError, ExportRow, AMOUNT_COLUMN, COLUMNS};
use crate::reimbursement::Amount;

pub const SHEET_NAME: &str = "Reimbursements";

const COLUMN_WIDTHS: [f64; 6] = [22.0, 16.0, 14.0, 10.0, 12.0, 14.0];

/// Single-sheet workbook with a bold header row
pub fn render(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut worksheet = Worksheet::new();
    fill_worksheet(&mut worksheet, rows)?;

    let mut workbook = Workbook::new();
    workbook.push_worksheet(worksheet);
    Ok(workbook.save_to_buffer()?)
}

fn fill_worksheet(worksheet: &mut Worksheet, rows: &[ExportRow]) -> Result<(), ExportError> {
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new().set_bold();
    for (col, name) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *name, &header)?;
        worksheet.set_column_width(col, COLUMN_WIDTHS[col as usize])?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            // Amounts go in as numbers so the sheet can sum them
            if col == AMOUNT_COLUMN {
                if let Some(n) = Amount::from(*cell).as_f64() {
                    worksheet.write_number(r, col as u16, n)?;
                    continue;
                }
            }
            worksheet.write_string(r, col as u16, *cell)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_rows;
    use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
    use std::io::Cursor;

    fn read_back(bytes: Vec<u8>) -> Range<Data> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        workbook.worksheet_range(SHEET_NAME).unwrap()
    }

    #[test]
    fn test_writes_every_row() {
        let rows = sample_rows(12);
        let range = read_back(render(&rows).unwrap());

        assert_eq!(range.height(), 1 + rows.len());
        assert_eq!(range.get((0, 0)), Some(&Data::String("Expense Category".to_string())));
        assert_eq!(range.get((12, 0)), Some(&Data::String("Fuel 11".to_string())));
    }

    #[test]
    fn test_amounts_are_numeric_cells() {
        let mut rows = sample_rows(2);
        rows[1].amount = "pending".to_string();
        let range = read_back(render(&rows).unwrap());

        assert_eq!(range.get((1, AMOUNT_COLUMN)), Some(&Data::Float(1000.0)));
        assert_eq!(range.get((2, AMOUNT_COLUMN)), Some(&Data::String("pending".to_string())));
    }

    #[test]
    fn test_render_is_a_zip() {
        let bytes = render(&sample_rows(2)).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_empty_view_is_header_only() {
        let range = read_back(render(&[]).unwrap());
        assert_eq!(range.height(), 1);
        assert_eq!(range.width(), COLUMNS.len());
    }
}
