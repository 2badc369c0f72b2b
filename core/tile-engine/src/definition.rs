//! FILENAME: core/tile-engine/src/definition.rs
//! Tile Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a dashboard tile.
//! These structures are designed to be:
//! - Serializable (for saving/loading dashboard layouts)
//! - Sent to and from the JavaScript frontend
//! - Immutable snapshots of what the tile should show

use serde::{Deserialize, Serialize};

use resultset::{PivotConfig, Query};

/// Unique identifier for a tile within a dashboard.
pub type TileId = u32;

// ============================================================================
// TILE KIND
// ============================================================================

/// How a tile presents its query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileKind {
    /// A line chart over the pivoted x axis, one line per series.
    Line,
    /// A bar chart over the pivoted x axis, one bar stack per series.
    Bar,
    /// A single summary number per series, taken from the first pivot row.
    Number,
    /// A pivot table with type-aware cell formatting.
    Table,
}

// ============================================================================
// TILE DEFINITION
// ============================================================================

/// One dashboard tile: the query to run and how to render its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDefinition {
    pub id: TileId,

    /// Optional header text. Tiles without a title render chrome-free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub kind: TileKind,

    pub query: Query,

    /// Explicit axis layout. `None` means the axes are derived from the
    /// query when the tile is rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot_config: Option<PivotConfig>,
}

impl TileDefinition {
    pub fn new(id: TileId, kind: TileKind, query: Query) -> Self {
        TileDefinition {
            id,
            title: None,
            kind,
            query,
            pivot_config: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_pivot_config(mut self, pivot_config: PivotConfig) -> Self {
        self.pivot_config = Some(pivot_config);
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
