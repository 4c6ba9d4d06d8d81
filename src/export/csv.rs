use super::{ExportError, ExportRow, COLUMNS};

/// Header line plus one RFC 4180 record per row, UTF-8
pub fn render(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_rows;

    #[test]
    fn test_row_count_matches() {
        let rows = sample_rows(5);
        let bytes = render(&rows).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), COLUMNS.to_vec());
        assert_eq!(reader.records().count(), rows.len());
    }

    #[test]
    fn test_quotes_awkward_values() {
        let mut rows = sample_rows(1);
        rows[0].category = "Fuel, \"premium\"".to_string();

        let text = String::from_utf8(render(&rows).unwrap()).unwrap();
        assert!(text.contains("\"Fuel, \"\"premium\"\"\""));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "Fuel, \"premium\"");
    }

    #[test]
    fn test_empty_view_is_header_only() {
        let text = String::from_utf8(render(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Expense Category,Driver,Amount (FRW)"));
    }
}
