//! FILENAME: core/tile-engine/src/lib.rs
//! Dashboard tile subsystem for Cubeboard.
//!
//! This crate turns loaded result sets into renderable dashboard tiles.
//! It depends on `resultset` for the response model and pivot accessors
//! but knows nothing about HTTP or the frontend itself; callers feed it
//! a tile definition plus the query outcome and get back a view the
//! frontend draws directly.
//!
//! Layers:
//! - `definition`: Serializable tile configuration (what a tile IS)
//! - `presets`: The built-in dashboard tiles (what we ship)
//! - `view`: Renderable output for the frontend (WHAT we display)
//! - `engine`: Formatting and assembly calculations (HOW we calculate)

pub mod definition;
pub mod presets;
pub mod view;
pub mod engine;

pub use definition::*;
pub use presets::*;
pub use view::*;
pub use engine::{
    chart_points, column_index, flatten_columns, format_row, format_table_data, format_value,
    render_tile, stacked_chart_data,
};
