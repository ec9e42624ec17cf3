use crate::core::error::AppError;
use crate::modules::spreadsheet::SheetData;

/// Write the sheet as CSV, limited to `selected` columns when any are given
pub fn export_csv(sheet: &SheetData, selected: &[String]) -> Result<Vec<u8>, AppError> {
    let indices: Vec<usize> = if selected.is_empty() {
        (0..sheet.headers.len()).collect()
    } else {
        selected
            .iter()
            .map(|column| {
                sheet.column_index(column).ok_or_else(|| {
                    AppError::BadRequest(format!("Column '{}' not found", column))
                })
            })
            .collect::<Result<_, _>>()?
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| AppError::Internal(format!("Failed to write CSV: {}", e));

    writer
        .write_record(indices.iter().map(|&i| sheet.headers[i].as_str()))
        .map_err(csv_err)?;

    for row in &sheet.data {
        writer
            .write_record(
                indices
                    .iter()
                    .map(|&i| row.get(i).map(|c| c.as_label()).unwrap_or_default()),
            )
            .map_err(csv_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to finish CSV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::spreadsheet::CellValue;

    fn sheet() -> SheetData {
        SheetData {
            name: "Sheet1".to_string(),
            headers: vec!["City".into(), "Population".into(), "Note".into()],
            data: vec![
                vec![
                    CellValue::Text("Lyon".into()),
                    CellValue::Int(522_000),
                    CellValue::Text("river, hills".into()),
                ],
                vec![CellValue::Text("Nice".into()), CellValue::Float(342.5)],
            ],
            total_rows: 2,
        }
    }

    #[test]
    fn test_all_columns_by_default() {
        let csv = String::from_utf8(export_csv(&sheet(), &[]).unwrap()).unwrap();
        assert_eq!(
            csv,
            "City,Population,Note\nLyon,522000,\"river, hills\"\nNice,342.5,\n"
        );
    }

    #[test]
    fn test_selected_columns_in_requested_order() {
        let selected = vec!["Population".to_string(), "City".to_string()];
        let csv = String::from_utf8(export_csv(&sheet(), &selected).unwrap()).unwrap();
        assert_eq!(csv, "Population,City\n522000,Lyon\n342.5,Nice\n");
    }

    #[test]
    fn test_unknown_column() {
        let selected = vec!["Altitude".to_string()];
        assert!(matches!(
            export_csv(&sheet(), &selected),
            Err(AppError::BadRequest(_))
        ));
    }
}
