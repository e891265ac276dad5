//! Chart rendering for activity tables
//!
//! Renderers consume an [`ActivityTable`] and must plot one series per
//! column, keeping colors keyed on the column index so the legend lines
//! up with the table's column order.

pub mod svg;

pub use svg::SvgChartRenderer;

use thiserror::Error;

use crate::activity::ActivityTable;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to format chart: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Chart has no rows to plot")]
    EmptyTable,
}

pub trait ChartRenderer: Send + Sync {
    /// MIME type of the rendered bytes
    fn content_type(&self) -> &'static str;

    fn render(&self, title: &str, table: &ActivityTable) -> Result<Vec<u8>, RenderError>;
}
