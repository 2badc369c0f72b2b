//! FILENAME: core/tile-engine/src/presets.rs
//! Dashboard Presets - The built-in tile definitions.
//!
//! The shipped dashboard shows order line items three ways: quantity
//! per day as a line chart, the leading quantity as a single number,
//! and the order count per day as a bar chart. All three pin their
//! pivot layout explicitly so a frontend change to the axis defaults
//! cannot reshape them.

use resultset::{OrderDirection, PivotConfig, Query, QueryOrder, TimeDimension, MEASURES_AXIS};

use crate::definition::{TileDefinition, TileKind};

/// The tiles of the line-items dashboard, in display order.
pub fn line_items_dashboard() -> Vec<TileDefinition> {
    vec![
        quantity_line_tile(),
        quantity_number_tile(),
        order_count_bar_tile(),
    ]
}

/// Line chart: quantity per creation day, largest quantities first.
pub fn quantity_line_tile() -> TileDefinition {
    TileDefinition::new(1, TileKind::Line, quantity_query())
        .with_pivot_config(created_at_pivot_config())
}

/// Summary number: the quantity of the leading row of the same query.
pub fn quantity_number_tile() -> TileDefinition {
    TileDefinition::new(2, TileKind::Number, quantity_query())
        .with_pivot_config(created_at_pivot_config())
}

/// Bar chart: line item count per creation day.
pub fn order_count_bar_tile() -> TileDefinition {
    let query = Query {
        measures: vec!["LineItems.count".to_string()],
        dimensions: vec!["LineItems.createdAt".to_string()],
        time_dimensions: vec![TimeDimension::new("LineItems.createdAt")],
        order: QueryOrder::by("LineItems.count", OrderDirection::Desc),
        ..Query::default()
    };
    TileDefinition::new(3, TileKind::Bar, query).with_pivot_config(created_at_pivot_config())
}

fn quantity_query() -> Query {
    Query {
        measures: vec!["LineItems.quantity".to_string()],
        dimensions: vec!["LineItems.createdAt".to_string()],
        order: QueryOrder::by("LineItems.quantity", OrderDirection::Desc),
        ..Query::default()
    }
}

fn created_at_pivot_config() -> PivotConfig {
    PivotConfig {
        x: vec!["LineItems.createdAt".to_string()],
        y: vec![MEASURES_AXIS.to_string()],
        fill_missing_dates: true,
        join_date_range: false,
    }
}

// ============================================================================
// TESTS
// ============================================================================
