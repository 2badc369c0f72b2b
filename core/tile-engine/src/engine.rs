//! FILENAME: core/tile-engine/src/engine.rs
//! Tile Engine - Formatting and assembly calculations.
//!
//! This module does the actual work of turning a loaded result set into
//! a renderable tile view: type-aware cell formatting for tables,
//! pivot flattening for charts, and the per-kind assembly behind
//! [`render_tile`].
//!
//! The formatting functions are pure and total. Malformed numeric
//! strings do not fail the percent format; they parse to NaN and render
//! as "NaN%", which the frontend has always shown for them.

use rustc_hash::FxHashMap;

use resultset::{
    axis_values_string, ColumnDataType, ColumnFormat, PivotConfig, PivotGroup, ResultSet, Row,
    TableColumn, Value,
};

use crate::definition::{TileDefinition, TileKind};
use crate::view::{
    series_color, ChartPoint, ChartTileView, RenderState, SeriesView, StatisticValue,
    StatisticView, TableTileView, TileBody, TileView,
};

// ============================================================================
// TABLE FORMATTING
// ============================================================================

/// The leaf columns of a column tree, depth first, left to right.
/// Only leaves address row fields; group columns are header chrome.
pub fn flatten_columns(columns: &[TableColumn]) -> Vec<&TableColumn> {
    let mut leaves = Vec::new();
    collect_leaves(columns, &mut leaves);
    leaves
}

fn collect_leaves<'a>(columns: &'a [TableColumn], leaves: &mut Vec<&'a TableColumn>) {
    for column in columns {
        if column.is_leaf() {
            leaves.push(column);
        } else {
            collect_leaves(&column.children, leaves);
        }
    }
}

/// Lookup table from row field name to the leaf column describing it.
/// When two leaves share a `data_index`, the later one wins.
pub fn column_index(columns: &[TableColumn]) -> FxHashMap<&str, &TableColumn> {
    flatten_columns(columns)
        .into_iter()
        .map(|column| (column.data_index.as_str(), column))
        .collect()
}

/// Formats one cell for table display according to its column's
/// declared type and format.
///
/// Missing values pass through untouched. Boolean columns stringify
/// booleans directly and coerce numbers through truthiness, but leave
/// other raw types alone. Percent-formatted number columns parse the
/// value and render it with two decimals and a "%" suffix. Everything
/// else, including unknown types and cells without a column, falls back
/// to plain stringification.
pub fn format_value(value: &Value, column: Option<&TableColumn>) -> Value {
    if value.is_missing() {
        return value.clone();
    }

    if let Some(column) = column {
        if column.column_type == ColumnDataType::Boolean {
            return match value {
                Value::Bool(flag) => Value::text(flag.to_string()),
                Value::Number(number) => {
                    let truthy = *number != 0.0 && !number.is_nan();
                    Value::text(truthy.to_string())
                }
                other => other.clone(),
            };
        }

        if column.column_type == ColumnDataType::Number
            && column.format == Some(ColumnFormat::Percent)
        {
            return Value::text(format!("{}%", fixed_two(value.parse_float())));
        }
    }

    Value::text(value.display_string())
}

/// Two-decimal rendering matching JavaScript's `toFixed(2)`, including
/// its treatment of NaN and the infinities.
fn fixed_two(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    format!("{:.2}", value)
}

/// Formats every field of a row against the column lookup table.
/// The field set and order never change; fields without a matching
/// column just get the default stringification.
pub fn format_row(row: &Row, columns_by_field: &FxHashMap<&str, &TableColumn>) -> Row {
    row.map_values(|field, value| format_value(value, columns_by_field.get(field).copied()))
}

/// Formats a table's worth of rows: flattens the column tree once,
/// builds the field lookup, then maps [`format_row`] over every row.
/// Output order matches input order.
pub fn format_table_data(columns: &[TableColumn], rows: &[Row]) -> Vec<Row> {
    let columns_by_field = column_index(columns);
    rows.iter()
        .map(|row| format_row(row, &columns_by_field))
        .collect()
}

// ============================================================================
// CHART FLATTENING
// ============================================================================

/// Flattens pivot groups into one chart point per series entry.
///
/// Points for one x-group are contiguous, groups stay in input order,
/// and entries keep their order within each group. The measure parses
/// to a float; a missing measure leaves the point value-free.
pub fn chart_points(groups: &[PivotGroup]) -> Vec<ChartPoint> {
    let mut points = Vec::new();
    for group in groups {
        let x = axis_values_string(&group.x_values, ", ");
        for entry in &group.y_values_array {
            points.push(ChartPoint {
                x: x.clone(),
                color: axis_values_string(&entry.y_values, ", "),
                measure: entry.value.as_ref().and_then(|value| value.as_measure()),
            });
        }
    }
    points
}

/// Pivots a result set and flattens it for stacked chart rendering.
pub fn stacked_chart_data(result_set: &ResultSet, config: &PivotConfig) -> Vec<ChartPoint> {
    chart_points(&result_set.pivot(config))
}

// ============================================================================
// TILE ASSEMBLY
// ============================================================================

/// Renders one tile from the current state of its query.
///
/// Guard order matches the frontend: an upstream error beats everything
/// and surfaces verbatim, a missing result set means the tile is still
/// loading, and only then does the result get pivoted and assembled.
pub fn render_tile(
    definition: &TileDefinition,
    error: Option<&str>,
    result_set: Option<&ResultSet>,
) -> RenderState<TileView> {
    if let Some(message) = error {
        log::debug!("tile {}: upstream error: {}", definition.id, message);
        return RenderState::Failed {
            message: message.to_string(),
        };
    }
    let result_set = match result_set {
        Some(result_set) => result_set,
        None => return RenderState::Loading,
    };

    let config = PivotConfig::normalized(&result_set.query, definition.pivot_config.clone());
    let body = match definition.kind {
        TileKind::Line | TileKind::Bar => TileBody::Chart(chart_tile(result_set, &config)),
        TileKind::Number => TileBody::Statistic(statistic_tile(result_set, &config)),
        TileKind::Table => TileBody::Table(table_tile(result_set, &config)),
    };
    log::debug!(
        "tile {}: rendered {:?} from {} rows",
        definition.id,
        definition.kind,
        result_set.data.len()
    );

    RenderState::Ready(TileView {
        tile_id: definition.id,
        title: definition.title.clone(),
        kind: definition.kind,
        body,
    })
}

fn chart_tile(result_set: &ResultSet, config: &PivotConfig) -> ChartTileView {
    let rows = result_set.chart_pivot(config);
    let series = result_set
        .series_names(config)
        .into_iter()
        .enumerate()
        .map(|(index, series)| SeriesView {
            key: series.key,
            title: series.title,
            color: series_color(index).to_string(),
        })
        .collect();
    ChartTileView { rows, series }
}

fn statistic_tile(result_set: &ResultSet, config: &PivotConfig) -> StatisticView {
    let total = result_set.total_row(config);
    if total.is_none() {
        log::warn!("statistic tile: empty result set, nothing to display");
    }
    let values = result_set
        .series_names(config)
        .into_iter()
        .map(|series| StatisticValue {
            value: total.as_ref().and_then(|row| row.value(&series.key)),
            key: series.key,
            title: series.title,
        })
        .collect();
    StatisticView { values }
}

fn table_tile(result_set: &ResultSet, config: &PivotConfig) -> TableTileView {
    let columns = result_set.table_columns(config);
    let rows = format_table_data(&columns, &result_set.table_pivot(config));
    TableTileView { columns, rows }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use resultset::{
        Annotation, ColumnDataType, MemberAnnotation, OrderDirection, Query, QueryOrder, RawRow,
        MEASURES_AXIS,
    };

    fn raw_row(entries: &[(&str, Value)]) -> RawRow {
        entries
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect()
    }

    /// Quantity per day, matching the shape the predefined dashboard
    /// queries load. Measures arrive as strings.
    fn quantity_result_set() -> ResultSet {
        let query = Query {
            measures: vec!["LineItems.quantity".to_string()],
            dimensions: vec!["LineItems.createdAt".to_string()],
            order: QueryOrder::by("LineItems.quantity", OrderDirection::Desc),
            ..Query::default()
        };

        let mut annotation = Annotation::default();
        annotation.measures.insert(
            "LineItems.quantity".to_string(),
            MemberAnnotation::new("Line Items Quantity", "Quantity", ColumnDataType::Number),
        );
        annotation.dimensions.insert(
            "LineItems.createdAt".to_string(),
            MemberAnnotation::new("Line Items Created at", "Created at", ColumnDataType::Time),
        );

        let data = vec![
            raw_row(&[
                ("LineItems.createdAt", Value::text("2024-01-16T00:00:00.000")),
                ("LineItems.quantity", Value::text("12")),
            ]),
            raw_row(&[
                ("LineItems.createdAt", Value::text("2024-01-17T00:00:00.000")),
                ("LineItems.quantity", Value::text("7")),
            ]),
        ];

        ResultSet::new(query, data, annotation)
    }

    fn quantity_tile(kind: TileKind) -> TileDefinition {
        TileDefinition::new(
            1,
            kind,
            quantity_result_set().query,
        )
        .with_pivot_config(PivotConfig {
            x: vec!["LineItems.createdAt".to_string()],
            y: vec![MEASURES_AXIS.to_string()],
            ..PivotConfig::default()
        })
    }

    // ------------------------------------------------------------------
    // Column flattening
    // ------------------------------------------------------------------

    #[test]
    fn test_flatten_columns_depth_first() {
        let columns = vec![
            TableColumn::leaf("d", "Date", ColumnDataType::Time),
            TableColumn::group(
                "Electronics",
                vec![
                    TableColumn::leaf("e.count", "Count", ColumnDataType::Number),
                    TableColumn::leaf("e.total", "Total", ColumnDataType::Number),
                ],
            ),
            TableColumn::leaf("t", "Text", ColumnDataType::Text),
        ];

        let leaves: Vec<&str> = flatten_columns(&columns)
            .iter()
            .map(|column| column.data_index.as_str())
            .collect();
        assert_eq!(leaves, vec!["d", "e.count", "e.total", "t"]);
    }

    #[test]
    fn test_column_index_later_duplicate_wins() {
        let columns = vec![
            TableColumn::leaf("dup", "First", ColumnDataType::Text),
            TableColumn::leaf("dup", "Second", ColumnDataType::Number),
        ];
        let index = column_index(&columns);
        assert_eq!(index["dup"].title, "Second");
    }

    // ------------------------------------------------------------------
    // Value formatting
    // ------------------------------------------------------------------

    fn boolean_column() -> TableColumn {
        TableColumn::leaf("b", "Flag", ColumnDataType::Boolean)
    }

    fn percent_column() -> TableColumn {
        TableColumn::leaf("p", "Rate", ColumnDataType::Number).with_format(ColumnFormat::Percent)
    }

    #[test]
    fn test_format_value_missing_passes_through() {
        assert_eq!(format_value(&Value::Null, None), Value::Null);
        assert_eq!(
            format_value(&Value::Null, Some(&percent_column())),
            Value::Null
        );
    }

    #[test]
    fn test_format_value_default_stringifies() {
        assert_eq!(format_value(&Value::Number(42.0), None), Value::text("42"));
        assert_eq!(format_value(&Value::Number(3.5), None), Value::text("3.5"));
        assert_eq!(format_value(&Value::Bool(true), None), Value::text("true"));
        assert_eq!(format_value(&Value::text("abc"), None), Value::text("abc"));
    }

    #[test]
    fn test_format_value_boolean_column() {
        let column = boolean_column();
        assert_eq!(
            format_value(&Value::Bool(true), Some(&column)),
            Value::text("true")
        );
        assert_eq!(
            format_value(&Value::Bool(false), Some(&column)),
            Value::text("false")
        );
        // Numbers coerce through truthiness.
        assert_eq!(
            format_value(&Value::Number(0.0), Some(&column)),
            Value::text("false")
        );
        assert_eq!(
            format_value(&Value::Number(5.0), Some(&column)),
            Value::text("true")
        );
        // Other raw types come back unchanged.
        assert_eq!(
            format_value(&Value::text("yes"), Some(&column)),
            Value::text("yes")
        );
    }

    #[test]
    fn test_format_value_percent() {
        let column = percent_column();
        assert_eq!(
            format_value(&Value::text("12.345"), Some(&column)),
            Value::text("12.35%")
        );
        assert_eq!(
            format_value(&Value::Number(50.0), Some(&column)),
            Value::text("50.00%")
        );
        // The documented quirk: garbage parses to NaN and renders as-is.
        assert_eq!(
            format_value(&Value::text("n/a"), Some(&column)),
            Value::text("NaN%")
        );
    }

    #[test]
    fn test_format_value_percent_requires_number_type() {
        let column =
            TableColumn::leaf("p", "Rate", ColumnDataType::Text).with_format(ColumnFormat::Percent);
        assert_eq!(
            format_value(&Value::text("12.345"), Some(&column)),
            Value::text("12.345")
        );
    }

    #[test]
    fn test_format_row_preserves_field_set() {
        let columns = vec![percent_column()];
        let columns_by_field = column_index(&columns);

        let mut row = Row::new();
        row.insert("p", Value::text("97.5"));
        row.insert("unknown", Value::Number(3.0));

        let formatted = format_row(&row, &columns_by_field);
        let fields: Vec<&str> = formatted.field_names().collect();
        assert_eq!(fields, vec!["p", "unknown"]);
        assert_eq!(formatted.get("p"), Some(&Value::text("97.50%")));
        // No column for the field: default stringification.
        assert_eq!(formatted.get("unknown"), Some(&Value::text("3")));
    }

    #[test]
    fn test_format_table_data_maps_all_rows() {
        let columns = vec![
            TableColumn::group("Flags", vec![boolean_column()]),
            percent_column(),
        ];
        let rows = vec![
            Row::from_iter([
                ("b".to_string(), Value::Number(1.0)),
                ("p".to_string(), Value::text("12.345")),
            ]),
            Row::from_iter([
                ("b".to_string(), Value::Bool(false)),
                ("p".to_string(), Value::Null),
            ]),
        ];

        let formatted = format_table_data(&columns, &rows);
        assert_eq!(formatted.len(), 2);
        assert_eq!(formatted[0].get("b"), Some(&Value::text("true")));
        assert_eq!(formatted[0].get("p"), Some(&Value::text("12.35%")));
        assert_eq!(formatted[1].get("b"), Some(&Value::text("false")));
        assert_eq!(formatted[1].get("p"), Some(&Value::Null));
    }

    // ------------------------------------------------------------------
    // Chart flattening
    // ------------------------------------------------------------------

    #[test]
    fn test_chart_points_flatten_in_group_order() {
        let groups = vec![
            PivotGroup::new(vec![Value::text("2024-01")])
                .with_entry(vec![Value::text("A")], Some(Value::Number(10.0)))
                .with_entry(vec![Value::text("B")], Some(Value::Number(20.0))),
            PivotGroup::new(vec![Value::text("2024-02")])
                .with_entry(vec![Value::text("A")], Some(Value::Number(5.0))),
        ];

        let points = chart_points(&groups);
        assert_eq!(
            points,
            vec![
                ChartPoint::new("2024-01", "A", Some(10.0)),
                ChartPoint::new("2024-01", "B", Some(20.0)),
                ChartPoint::new("2024-02", "A", Some(5.0)),
            ]
        );
    }

    #[test]
    fn test_chart_points_measure_handling() {
        let groups = vec![PivotGroup::new(vec![Value::text("x")])
            .with_entry(vec![Value::text("A")], None)
            .with_entry(vec![Value::text("B")], Some(Value::Null))
            .with_entry(vec![Value::text("C")], Some(Value::text("2.5")))];

        let points = chart_points(&groups);
        assert_eq!(points[0].measure, None);
        assert_eq!(points[1].measure, None);
        assert_eq!(points[2].measure, Some(2.5));
    }

    #[test]
    fn test_chart_points_join_multi_part_axes() {
        let groups = vec![PivotGroup::new(vec![Value::text("2024-01"), Value::Null])
            .with_entry(
                vec![Value::text("A"), Value::text("Quantity")],
                Some(Value::Number(1.0)),
            )];

        let points = chart_points(&groups);
        assert_eq!(points[0].x, "2024-01, ∅");
        assert_eq!(points[0].color, "A, Quantity");
    }

    #[test]
    fn test_stacked_chart_data_from_result_set() {
        let result_set = quantity_result_set();
        let config = PivotConfig::normalized(&result_set.query, None);
        let points = stacked_chart_data(&result_set, &config);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].x, "2024-01-16T00:00:00.000");
        // The color label is the raw series key; title resolution is the
        // legend's job, not the point stream's.
        assert_eq!(points[0].color, "LineItems.quantity");
        assert_eq!(points[0].measure, Some(12.0));
        assert_eq!(points[1].measure, Some(7.0));
    }

    // ------------------------------------------------------------------
    // Tile assembly
    // ------------------------------------------------------------------

    #[test]
    fn test_render_tile_error_wins() {
        let tile = quantity_tile(TileKind::Line);
        let result_set = quantity_result_set();

        let state = render_tile(&tile, Some("Continue wait"), Some(&result_set));
        match state {
            RenderState::Failed { message } => assert_eq!(message, "Continue wait"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_render_tile_loading_without_result() {
        let tile = quantity_tile(TileKind::Line);
        assert_eq!(render_tile(&tile, None, None), RenderState::Loading);
    }

    #[test]
    fn test_render_tile_line_chart() {
        let tile = quantity_tile(TileKind::Line);
        let result_set = quantity_result_set();

        let view = render_tile(&tile, None, Some(&result_set))
            .into_ready()
            .unwrap();
        assert_eq!(view.tile_id, 1);
        assert_eq!(view.kind, TileKind::Line);

        let chart = match view.body {
            TileBody::Chart(chart) => chart,
            other => panic!("expected chart body, got {other:?}"),
        };
        assert_eq!(chart.rows.len(), 2);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].key, "LineItems.quantity");
        assert_eq!(chart.series[0].title, "Line Items Quantity");
        assert_eq!(chart.series[0].color, "#FF6492");
        assert_eq!(chart.rows[0].value("LineItems.quantity"), Some(12.0));
    }

    #[test]
    fn test_render_tile_number_takes_leading_row() {
        let tile = quantity_tile(TileKind::Number);
        let result_set = quantity_result_set();

        let view = render_tile(&tile, None, Some(&result_set))
            .into_ready()
            .unwrap();
        let statistic = match view.body {
            TileBody::Statistic(statistic) => statistic,
            other => panic!("expected statistic body, got {other:?}"),
        };
        assert_eq!(statistic.values.len(), 1);
        assert_eq!(statistic.values[0].title, "Line Items Quantity");
        assert_eq!(statistic.values[0].value, Some(12.0));
    }

    #[test]
    fn test_render_tile_number_empty_result() {
        let tile = quantity_tile(TileKind::Number);
        let empty = ResultSet::new(
            quantity_result_set().query,
            Vec::new(),
            Annotation::default(),
        );

        let view = render_tile(&tile, None, Some(&empty)).into_ready().unwrap();
        match view.body {
            TileBody::Statistic(statistic) => assert!(statistic.values.is_empty()),
            other => panic!("expected statistic body, got {other:?}"),
        }
    }

    #[test]
    fn test_render_tile_table_formats_cells() {
        let query = Query {
            measures: vec!["Orders.completionRate".to_string()],
            dimensions: vec!["Products.inStock".to_string()],
            ..Query::default()
        };
        let mut annotation = Annotation::default();
        annotation.measures.insert(
            "Orders.completionRate".to_string(),
            MemberAnnotation::new("Completion Rate", "Rate", ColumnDataType::Number)
                .with_format(ColumnFormat::Percent),
        );
        annotation.dimensions.insert(
            "Products.inStock".to_string(),
            MemberAnnotation::new("In Stock", "Stock", ColumnDataType::Boolean),
        );
        let data = vec![
            raw_row(&[
                ("Products.inStock", Value::Bool(true)),
                ("Orders.completionRate", Value::text("97.525")),
            ]),
            raw_row(&[
                ("Products.inStock", Value::Number(0.0)),
                ("Orders.completionRate", Value::text("odd")),
            ]),
        ];
        let result_set = ResultSet::new(query.clone(), data, annotation);
        let tile = TileDefinition::new(4, TileKind::Table, query);

        let view = render_tile(&tile, None, Some(&result_set))
            .into_ready()
            .unwrap();
        let table = match view.body {
            TileBody::Table(table) => table,
            other => panic!("expected table body, got {other:?}"),
        };

        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].get("Products.inStock"),
            Some(&Value::text("true"))
        );
        assert_eq!(
            table.rows[0].get("Orders.completionRate"),
            Some(&Value::text("97.53%"))
        );
        assert_eq!(
            table.rows[1].get("Products.inStock"),
            Some(&Value::text("false"))
        );
        assert_eq!(
            table.rows[1].get("Orders.completionRate"),
            Some(&Value::text("NaN%"))
        );
    }
}
