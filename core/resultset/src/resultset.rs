//! FILENAME: core/resultset/src/resultset.rs
//! Result Set - The loaded response and its pivot accessors.
//!
//! The raw response is a flat list of rows keyed by member name;
//! everything a chart or table needs is derived from it by pivoting:
//! grouping rows along an x axis and fanning measures out into series
//! along a y axis.
//!
//! The accessors take the pivot configuration as given. Resolve axis
//! defaults with [`PivotConfig::normalized`] before calling them.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ResultSetError;
use crate::query::{PivotConfig, Query, MEASURES_AXIS};
use crate::schema::{Annotation, ColumnDataType, TableColumn};
use crate::value::{axis_display, axis_values_string, AxisValues, Value};

// ============================================================================
// ROWS
// ============================================================================

/// One raw response row: member name to cell value, order-free.
pub type RawRow = FxHashMap<String, Value>;

/// One display row of a pivoted table.
///
/// Unlike [`RawRow`], field order matters here: fields appear in the
/// order the pivot emitted them (x members first, then one field per
/// series), and the table renders them in that order. Inserting an
/// existing field replaces its value but keeps its original position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Row { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Row {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(field, _)| field.as_str())
    }

    /// A new row with the same fields in the same order, each value run
    /// through `transform`. The field set never changes.
    pub fn map_values<F>(&self, mut transform: F) -> Row
    where
        F: FnMut(&str, &Value) -> Value,
    {
        Row {
            fields: self
                .fields
                .iter()
                .map(|(field, value)| (field.clone(), transform(field, value)))
                .collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (field, value) in iter {
            row.insert(field, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map of field names to cell values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((field, value)) = access.next_entry::<String, Value>()? {
                    row.insert(field, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

// ============================================================================
// PIVOT OUTPUT
// ============================================================================

/// One x-axis group of a pivoted result: the x tuple and, per series
/// encountered for it, the y tuple and the measure value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotGroup {
    pub x_values: AxisValues,
    pub y_values_array: Vec<PivotEntry>,
}

impl PivotGroup {
    pub fn new(x_values: Vec<Value>) -> Self {
        PivotGroup {
            x_values: AxisValues::from_vec(x_values),
            y_values_array: Vec::new(),
        }
    }

    pub fn with_entry(mut self, y_values: Vec<Value>, value: Option<Value>) -> Self {
        self.y_values_array.push(PivotEntry {
            y_values: AxisValues::from_vec(y_values),
            value,
        });
        self
    }
}

/// One series entry inside a pivot group. `value` is `None` when the
/// row had no field for the measure at all; a present-but-null cell
/// arrives as `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotEntry {
    pub y_values: AxisValues,
    pub value: Option<Value>,
}

/// One chart row: the x-axis label plus a numeric value per series.
/// Every row carries every series key; a series absent from the row's
/// group shows up as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub x: String,
    pub x_values: AxisValues,
    pub values: Vec<SeriesValue>,
}

impl ChartRow {
    /// The numeric value for one series key, if the row has one.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesValue {
    pub key: String,
    pub value: Option<f64>,
}

/// One series of a pivoted result, in first-appearance order.
///
/// The key is the compact comma-joined y tuple and addresses chart row
/// values and table row fields; the titles resolve measure names
/// through the response annotation for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub key: String,
    pub title: String,
    pub short_title: String,
    pub y_values: AxisValues,
}

// ============================================================================
// RESULT SET
// ============================================================================

/// A successfully loaded query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub query: Query,

    #[serde(default)]
    pub data: Vec<RawRow>,

    #[serde(default)]
    pub annotation: Annotation,
}

impl ResultSet {
    pub fn new(query: Query, data: Vec<RawRow>, annotation: Annotation) -> Self {
        ResultSet {
            query,
            data,
            annotation,
        }
    }

    /// Parses a raw API response body.
    ///
    /// The API signals failure in-band with an `{ "error": "..." }`
    /// payload; that surfaces as [`ResultSetError::Api`] rather than a
    /// parse error.
    pub fn from_json(raw: &str) -> Result<ResultSet, ResultSetError> {
        #[derive(Deserialize)]
        struct ErrorEnvelope {
            #[serde(default)]
            error: Option<String>,
        }

        let envelope: ErrorEnvelope = serde_json::from_str(raw)?;
        if let Some(message) = envelope.error {
            return Err(ResultSetError::Api { message });
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Pivots the raw rows along the configured axes.
    ///
    /// Rows sharing an x tuple merge into one group, in first-seen row
    /// order; within a group, series entries accumulate in row order.
    /// The measures pseudo-member fans each row out into one entry per
    /// measure, with the measure's name as the axis value.
    pub fn pivot(&self, config: &PivotConfig) -> Vec<PivotGroup> {
        let measures = &self.query.measures;
        let mut group_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut groups: Vec<PivotGroup> = Vec::new();

        for row in &self.data {
            for (x_values, x_measure) in axis_combinations(row, &config.x, measures) {
                let group_key = axis_values_string(&x_values, ", ");
                let index = match group_index.get(&group_key) {
                    Some(&index) => index,
                    None => {
                        let index = groups.len();
                        group_index.insert(group_key, index);
                        groups.push(PivotGroup {
                            x_values,
                            y_values_array: Vec::new(),
                        });
                        index
                    }
                };
                for (y_values, y_measure) in axis_combinations(row, &config.y, measures) {
                    let value = x_measure
                        .or(y_measure)
                        .and_then(|slot| row.get(measures[slot].as_str()))
                        .cloned();
                    groups[index].y_values_array.push(PivotEntry { y_values, value });
                }
            }
        }
        groups
    }

    /// Chart-shaped rows: one per x group, each carrying a parsed float
    /// (or gap) for every series of the result.
    pub fn chart_pivot(&self, config: &PivotConfig) -> Vec<ChartRow> {
        let groups = self.pivot(config);
        let series_keys = collect_series_keys(&groups);

        groups
            .into_iter()
            .map(|group| {
                let mut by_series: FxHashMap<String, Option<f64>> = FxHashMap::default();
                for entry in &group.y_values_array {
                    by_series.insert(
                        axis_values_string(&entry.y_values, ","),
                        entry.value.as_ref().and_then(|value| value.as_measure()),
                    );
                }
                ChartRow {
                    x: axis_values_string(&group.x_values, ", "),
                    x_values: group.x_values,
                    values: series_keys
                        .iter()
                        .map(|key| SeriesValue {
                            key: key.clone(),
                            value: by_series.get(key).copied().flatten(),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// Table-shaped rows: x members under their own names, then one
    /// field per series holding the raw measure value. Formatting is a
    /// separate concern and happens downstream.
    pub fn table_pivot(&self, config: &PivotConfig) -> Vec<Row> {
        let has_measures = self.query.has_measures();
        self.pivot(config)
            .into_iter()
            .map(|group| {
                let mut row = Row::with_capacity(config.x.len() + group.y_values_array.len());
                for (position, member) in config.x.iter().enumerate() {
                    let value = group.x_values.get(position).cloned().unwrap_or(Value::Null);
                    row.insert(member.clone(), value);
                }
                if has_measures {
                    for entry in group.y_values_array {
                        let field = if entry.y_values.is_empty() {
                            "value".to_string()
                        } else {
                            axis_values_string(&entry.y_values, ",")
                        };
                        row.insert(field, entry.value.unwrap_or(Value::Null));
                    }
                }
                row
            })
            .collect()
    }

    /// Column descriptors matching [`ResultSet::table_pivot`] rows: one
    /// leaf per x member, then the series side, nested into groups when
    /// the y axis carries dimensions besides the measures pseudo-member.
    pub fn table_columns(&self, config: &PivotConfig) -> Vec<TableColumn> {
        let mut columns: Vec<TableColumn> = config
            .x
            .iter()
            .map(|member| {
                if member == MEASURES_AXIS {
                    TableColumn::leaf(MEASURES_AXIS, "Measures", ColumnDataType::Text)
                        .with_short_title("Measures")
                } else {
                    self.member_column(member)
                }
            })
            .collect();

        if self.query.has_measures() {
            let series = self.series_names(config);
            let has_group_members = config.y.iter().any(|member| member != MEASURES_AXIS);
            if has_group_members {
                let refs: Vec<&Series> = series.iter().collect();
                columns.extend(self.nested_series_columns(&refs, &config.y, 0));
            } else {
                columns.extend(
                    series
                        .iter()
                        .map(|series| self.series_leaf_column(series, &config.y)),
                );
            }
        }
        columns
    }

    /// The distinct series of the pivoted result, in first-appearance
    /// order.
    pub fn series_names(&self, config: &PivotConfig) -> Vec<Series> {
        let mut seen = FxHashSet::default();
        let mut series = Vec::new();
        for group in self.pivot(config) {
            for entry in group.y_values_array {
                let key = axis_values_string(&entry.y_values, ",");
                if !seen.insert(key.clone()) {
                    continue;
                }
                series.push(Series {
                    title: self.series_title(&config.y, &entry.y_values, false),
                    short_title: self.series_title(&config.y, &entry.y_values, true),
                    key,
                    y_values: entry.y_values,
                });
            }
        }
        series
    }

    /// The first chart row, used by single-number summary displays.
    /// `None` when the result has no rows.
    pub fn total_row(&self, config: &PivotConfig) -> Option<ChartRow> {
        self.chart_pivot(config).into_iter().next()
    }

    fn member_column(&self, member: &str) -> TableColumn {
        match self.annotation.member(member) {
            Some(annotation) => {
                let mut column = TableColumn::leaf(
                    member,
                    annotation.title.clone(),
                    annotation.member_type.clone(),
                )
                .with_short_title(annotation.short_title.clone());
                column.format = annotation.format.clone();
                column
            }
            // Unannotated member: keep its raw name and let formatting
            // fall back to stringification.
            None => TableColumn::leaf(member, member, ColumnDataType::Text),
        }
    }

    fn series_leaf_column(&self, series: &Series, y_members: &[String]) -> TableColumn {
        let measure_annotation = y_members
            .iter()
            .position(|member| member == MEASURES_AXIS)
            .and_then(|slot| series.y_values.get(slot))
            .and_then(|value| match value {
                Value::Text(name) => self.annotation.member(name),
                _ => None,
            });
        let annotation = measure_annotation
            .or_else(|| y_members.last().and_then(|member| self.annotation.member(member)));

        let (column_type, format) = match annotation {
            Some(annotation) => (annotation.member_type.clone(), annotation.format.clone()),
            None => (ColumnDataType::Text, None),
        };
        let mut column = TableColumn::leaf(series.key.clone(), series.title.clone(), column_type)
            .with_short_title(series.short_title.clone());
        column.format = format;
        column
    }

    fn nested_series_columns(
        &self,
        series: &[&Series],
        y_members: &[String],
        depth: usize,
    ) -> Vec<TableColumn> {
        if depth + 1 >= y_members.len() {
            return series
                .iter()
                .map(|series| self.series_leaf_column(series, y_members))
                .collect();
        }

        let mut labels: Vec<String> = Vec::new();
        let mut buckets: FxHashMap<String, Vec<&Series>> = FxHashMap::default();
        for &entry in series {
            let label = self.axis_member_display(
                y_members,
                depth,
                entry.y_values.get(depth).unwrap_or(&Value::Null),
                false,
            );
            if !buckets.contains_key(&label) {
                labels.push(label.clone());
            }
            buckets.entry(label).or_default().push(entry);
        }

        labels
            .into_iter()
            .map(|label| {
                let children = self.nested_series_columns(&buckets[&label], y_members, depth + 1);
                let column_type = y_members
                    .get(depth)
                    .filter(|member| member.as_str() != MEASURES_AXIS)
                    .and_then(|member| self.annotation.member(member))
                    .map(|annotation| annotation.member_type.clone())
                    .unwrap_or(ColumnDataType::Text);
                let mut column = TableColumn::group(label, children);
                column.column_type = column_type;
                column
            })
            .collect()
    }

    fn series_title(&self, y_members: &[String], y_values: &[Value], short: bool) -> String {
        let parts: Vec<String> = y_values
            .iter()
            .enumerate()
            .map(|(position, value)| self.axis_member_display(y_members, position, value, short))
            .collect();
        parts.join(", ")
    }

    /// Display form of one y-axis slot. A value in the measures slot is
    /// a measure name and resolves through its annotation title; other
    /// slots use the plain axis display rules.
    fn axis_member_display(
        &self,
        members: &[String],
        position: usize,
        value: &Value,
        short: bool,
    ) -> String {
        let is_measures_slot = members
            .get(position)
            .map(|member| member == MEASURES_AXIS)
            .unwrap_or(false);
        if is_measures_slot {
            if let Value::Text(name) = value {
                if let Some(annotation) = self.annotation.member(name) {
                    let title = if short {
                        &annotation.short_title
                    } else {
                        &annotation.title
                    };
                    if !title.is_empty() {
                        return title.clone();
                    }
                }
            }
        }
        axis_display(value)
    }
}

// ============================================================================
// PIVOT HELPERS
// ============================================================================

/// Expands one raw row into its axis tuples for the given members.
///
/// Plain members contribute the row's value for that member (null when
/// the field is absent). The measures pseudo-member multiplies the
/// combinations by one per measure and records which measure each
/// combination belongs to.
fn axis_combinations(
    row: &RawRow,
    members: &[String],
    measures: &[String],
) -> Vec<(AxisValues, Option<usize>)> {
    let mut combinations: Vec<(AxisValues, Option<usize>)> = vec![(AxisValues::new(), None)];
    for member in members {
        if member == MEASURES_AXIS {
            if measures.is_empty() {
                continue;
            }
            let mut expanded = Vec::with_capacity(combinations.len() * measures.len());
            for (values, _) in combinations {
                for (slot, measure) in measures.iter().enumerate() {
                    let mut with_measure = values.clone();
                    with_measure.push(Value::text(measure.clone()));
                    expanded.push((with_measure, Some(slot)));
                }
            }
            combinations = expanded;
        } else {
            for (values, _) in combinations.iter_mut() {
                values.push(row.get(member.as_str()).cloned().unwrap_or(Value::Null));
            }
        }
    }
    combinations
}

/// The distinct series keys across all groups, in first-appearance
/// order.
fn collect_series_keys(groups: &[PivotGroup]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut keys = Vec::new();
    for group in groups {
        for entry in &group.y_values_array {
            let key = axis_values_string(&entry.y_values, ",");
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
    }
    keys
}

// ============================================================================
// TESTS
// ============================================================================
