//! Chart data model, column projection and SVG rendering

mod projection;
mod svg;

pub use projection::project_chart;
pub use svg::{check_renderable, render_svg};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "chart_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Doughnut,
    Area,
    Radar,
    Bubble,
}

impl ChartType {
    /// Types that can be projected from two columns
    pub fn is_projectable(&self) -> bool {
        matches!(
            self,
            ChartType::Bar
                | ChartType::Line
                | ChartType::Area
                | ChartType::Pie
                | ChartType::Doughnut
                | ChartType::Scatter
        )
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Doughnut => "doughnut",
            ChartType::Area => "area",
            ChartType::Radar => "radar",
            ChartType::Bubble => "bubble",
        };
        write!(f, "{}", name)
    }
}

pub const SERIES_BACKGROUND: &str = "rgba(59, 130, 246, 0.5)";
pub const SERIES_BORDER: &str = "rgba(59, 130, 246, 1)";
pub const SCATTER_BACKGROUND: &str = "rgba(59, 130, 246, 0.6)";

pub const PIE_PALETTE: [&str; 6] = [
    "rgba(255, 99, 132, 0.8)",
    "rgba(54, 162, 235, 0.8)",
    "rgba(255, 206, 86, 0.8)",
    "rgba(75, 192, 192, 0.8)",
    "rgba(153, 102, 255, 0.8)",
    "rgba(255, 159, 64, 0.8)",
];

/// Chart-ready data in the shape charting front-ends consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: Vec<ChartPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartPoint {
    Value(f64),
    Xy { x: f64, y: f64 },
}

impl ChartPoint {
    pub fn y(&self) -> f64 {
        match self {
            ChartPoint::Value(v) => *v,
            ChartPoint::Xy { y, .. } => *y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    Palette(Vec<String>),
}

impl ChartData {
    /// Values of the first dataset
    pub fn values(&self) -> Vec<f64> {
        self.datasets
            .first()
            .map(|d| d.data.iter().map(ChartPoint::y).collect())
            .unwrap_or_default()
    }

    /// (x, y) pairs of the first dataset; plain values are placed at their index
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.datasets
            .first()
            .map(|d| {
                d.data
                    .iter()
                    .enumerate()
                    .map(|(i, p)| match p {
                        ChartPoint::Value(v) => (i as f64, *v),
                        ChartPoint::Xy { x, y } => (*x, *y),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Label of point `i`, falling back to its 1-based position
    pub fn label_at(&self, i: usize) -> String {
        self.labels
            .get(i)
            .cloned()
            .unwrap_or_else(|| (i + 1).to_string())
    }
}
