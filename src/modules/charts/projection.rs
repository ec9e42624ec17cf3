use super::{
    ChartData, ChartDataset, ChartPoint, ChartType, ColorSpec, PIE_PALETTE, SCATTER_BACKGROUND,
    SERIES_BACKGROUND, SERIES_BORDER,
};
use crate::core::error::AppError;
use crate::modules::spreadsheet::CellValue;

/// Project two columns of a sheet into chart-ready data.
///
/// A row contributes only when both of its cells are truthy.
pub fn project_chart(
    rows: &[Vec<CellValue>],
    x_index: usize,
    y_index: usize,
    chart_type: ChartType,
) -> Result<ChartData, AppError> {
    let pairs = rows.iter().filter_map(|row| {
        let x = row.get(x_index)?;
        let y = row.get(y_index)?;
        (x.is_truthy() && y.is_truthy()).then_some((x, y))
    });

    match chart_type {
        ChartType::Bar | ChartType::Line | ChartType::Area => {
            let (labels, values) = labelled_values(pairs);
            Ok(ChartData {
                labels,
                datasets: vec![ChartDataset {
                    label: Some("Data".to_string()),
                    data: values,
                    background_color: Some(ColorSpec::Single(SERIES_BACKGROUND.to_string())),
                    border_color: Some(SERIES_BORDER.to_string()),
                    border_width: Some(1),
                    point_radius: None,
                }],
            })
        }
        ChartType::Pie | ChartType::Doughnut => {
            let (labels, values) = labelled_values(pairs);
            Ok(ChartData {
                labels,
                datasets: vec![ChartDataset {
                    label: None,
                    data: values,
                    background_color: Some(ColorSpec::Palette(
                        PIE_PALETTE.iter().map(|c| c.to_string()).collect(),
                    )),
                    border_color: None,
                    border_width: None,
                    point_radius: None,
                }],
            })
        }
        ChartType::Scatter => {
            let points = pairs
                .map(|(x, y)| ChartPoint::Xy {
                    x: x.as_number(),
                    y: y.as_number(),
                })
                .collect();
            Ok(ChartData {
                labels: Vec::new(),
                datasets: vec![ChartDataset {
                    label: Some("Data Points".to_string()),
                    data: points,
                    background_color: Some(ColorSpec::Single(SCATTER_BACKGROUND.to_string())),
                    border_color: Some(SERIES_BORDER.to_string()),
                    border_width: None,
                    point_radius: Some(6),
                }],
            })
        }
        other => Err(AppError::BadRequest(format!(
            "Unsupported chart type: {}",
            other
        ))),
    }
}

fn labelled_values<'a>(
    pairs: impl Iterator<Item = (&'a CellValue, &'a CellValue)>,
) -> (Vec<String>, Vec<ChartPoint>) {
    pairs
        .map(|(x, y)| (x.as_label(), ChartPoint::Value(y.as_number())))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn rows() -> Vec<Vec<CellValue>> {
        vec![
            vec![text("North"), CellValue::Int(10)],
            vec![text("South"), text("12.5kg")],
            vec![text(""), CellValue::Int(3)],
            vec![text("East"), CellValue::Int(0)],
            vec![text("West"), text("n/a")],
            vec![text("Short row")],
            vec![CellValue::Empty, CellValue::Float(2.0)],
        ]
    }

    #[test]
    fn test_bar_projection() {
        let chart = project_chart(&rows(), 0, 1, ChartType::Bar).unwrap();

        assert_eq!(chart.labels, vec!["North", "South", "West"]);
        assert_eq!(chart.values(), vec![10.0, 12.5, 0.0]);

        let dataset = &chart.datasets[0];
        assert_eq!(dataset.label.as_deref(), Some("Data"));
        assert_eq!(dataset.border_width, Some(1));
    }

    #[test]
    fn test_line_and_area_match_bar() {
        let bar = project_chart(&rows(), 0, 1, ChartType::Bar).unwrap();
        assert_eq!(project_chart(&rows(), 0, 1, ChartType::Line).unwrap(), bar);
        assert_eq!(project_chart(&rows(), 0, 1, ChartType::Area).unwrap(), bar);
    }

    #[test]
    fn test_pie_uses_palette() {
        let chart = project_chart(&rows(), 0, 1, ChartType::Doughnut).unwrap();
        let value = serde_json::to_value(&chart).unwrap();

        assert_eq!(value["labels"], json!(["North", "South", "West"]));
        assert_eq!(value["datasets"][0]["data"], json!([10.0, 12.5, 0.0]));
        assert_eq!(
            value["datasets"][0]["background_color"]
                .as_array()
                .map(|a| a.len()),
            Some(6)
        );
        assert!(value["datasets"][0].get("label").is_none());
    }

    #[test]
    fn test_scatter_points() {
        let rows = vec![
            vec![CellValue::Int(1), CellValue::Int(2)],
            vec![text("3.5 m"), text("x")],
            vec![CellValue::Int(0), CellValue::Int(9)],
        ];
        let chart = project_chart(&rows, 0, 1, ChartType::Scatter).unwrap();
        let value = serde_json::to_value(&chart).unwrap();

        assert_eq!(
            value["datasets"][0]["data"],
            json!([{"x": 1.0, "y": 2.0}, {"x": 3.5, "y": 0.0}])
        );
        assert_eq!(value["datasets"][0]["label"], "Data Points");
        assert_eq!(value["datasets"][0]["point_radius"], 6);
        assert!(value.get("labels").is_none());
    }

    #[test]
    fn test_unsupported_types() {
        for chart_type in [ChartType::Radar, ChartType::Bubble] {
            assert!(matches!(
                project_chart(&rows(), 0, 1, chart_type),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_empty_rows() {
        let chart = project_chart(&[], 0, 1, ChartType::Bar).unwrap();
        assert!(chart.labels.is_empty());
        assert!(chart.values().is_empty());
    }
}
