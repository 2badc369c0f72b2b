//! FILENAME: core/tile-engine/src/view.rs
//! Tile View - Renderable output for the frontend.
//!
//! This module holds the structures the frontend renders directly:
//! chart point lists, series legends with assigned colors, summary
//! statistics and formatted tables. Everything here is plain data;
//! the engine module produces it, the frontend consumes it.

use serde::{Deserialize, Serialize};

use resultset::{ChartRow, Row, TableColumn};

use crate::definition::{TileId, TileKind};

// ============================================================================
// SERIES COLORS
// ============================================================================

/// The dashboard palette, assigned to series in order.
pub const SERIES_COLORS: [&str; 3] = ["#FF6492", "#141446", "#7A77FF"];

/// Color for the series at `index`. The palette repeats once exhausted
/// so late series stay visible.
pub fn series_color(index: usize) -> &'static str {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

// ============================================================================
// CHART VIEWS
// ============================================================================

/// One point of a flattened chart series.
///
/// `x` is the joined x-axis label, `color` the joined series label the
/// point belongs to, and `measure` the parsed numeric value. A missing
/// measure keeps the point but leaves the value out, so the chart shows
/// a gap instead of a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub x: String,
    pub color: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<f64>,
}

impl ChartPoint {
    pub fn new(x: impl Into<String>, color: impl Into<String>, measure: Option<f64>) -> Self {
        ChartPoint {
            x: x.into(),
            color: color.into(),
            measure,
        }
    }
}

/// One legend entry of a chart tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesView {
    /// Addresses the matching values inside each chart row.
    pub key: String,
    pub title: String,
    pub color: String,
}

/// A renderable chart: one row per x value, plus the legend.
///
/// Line and bar tiles share this shape; the tile kind tells the
/// frontend which chart component to mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTileView {
    pub rows: Vec<ChartRow>,
    pub series: Vec<SeriesView>,
}

// ============================================================================
// STATISTIC VIEW
// ============================================================================

/// One summary number of a statistic tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticValue {
    pub key: String,
    pub title: String,

    /// The headline number. `None` when the result set was empty or the
    /// series had no value in the leading row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// A renderable summary statistic: one headline number per series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticView {
    pub values: Vec<StatisticValue>,
}

// ============================================================================
// TABLE VIEW
// ============================================================================

/// A renderable pivot table: the column tree and the formatted rows.
/// Row fields are addressed by the leaf columns' `data_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableTileView {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Row>,
}

// ============================================================================
// TILE VIEW
// ============================================================================

/// The body of a rendered tile, one variant per presentation family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileBody {
    Chart(ChartTileView),
    Statistic(StatisticView),
    Table(TableTileView),
}

/// A fully rendered tile, ready to hand to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileView {
    pub tile_id: TileId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub kind: TileKind,
    pub body: TileBody,
}

// ============================================================================
// RENDER STATE
// ============================================================================

/// Where a tile is in its load cycle.
///
/// The guard order matters and matches the frontend: an upstream error
/// always wins over a pending load, and a tile only renders once a
/// result set is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderState<T> {
    /// No result yet; the frontend shows a spinner.
    Loading,
    /// The query failed; the message is displayed verbatim.
    Failed { message: String },
    /// The tile rendered.
    Ready(T),
}

impl<T> RenderState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, RenderState::Ready(_))
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            RenderState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            RenderState::Ready(view) => Some(view),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
