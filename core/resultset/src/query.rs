//! FILENAME: core/resultset/src/query.rs
//! Query Model - The serializable query and pivot configuration.
//!
//! This module describes what we ask the analytics API for and how the
//! answer should be laid out. Field names follow the JSON wire format
//! (camelCase) so a query round-trips byte-compatible with what the
//! JavaScript client sends.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Pseudo-member that places the query's measures on a pivot axis.
///
/// It expands to one axis value per measure, carrying the measure's name.
pub const MEASURES_AXIS: &str = "measures";

// ============================================================================
// QUERY
// ============================================================================

/// An analytics query: which measures to aggregate, sliced by which
/// dimensions, over which time ranges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measures: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_dimensions: Vec<TimeDimension>,

    #[serde(default, skip_serializing_if = "QueryOrder::is_empty")]
    pub order: QueryOrder,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Query {
    /// True when the query aggregates at least one measure.
    pub fn has_measures(&self) -> bool {
        !self.measures.is_empty()
    }

    /// The member names contributed by time dimensions, in query order.
    pub fn time_dimension_members(&self) -> Vec<String> {
        self.time_dimensions
            .iter()
            .map(|td| td.dimension.clone())
            .collect()
    }
}

/// One time dimension of a query. Granularity and date range are
/// optional; without a granularity the member keys rows by its raw
/// dimension name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDimension {
    pub dimension: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<Vec<String>>,
}

impl TimeDimension {
    pub fn new(dimension: impl Into<String>) -> Self {
        TimeDimension {
            dimension: dimension.into(),
            granularity: None,
            date_range: None,
        }
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Sort direction for one ordered member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// The query's `order` clause.
///
/// On the wire this is a JSON object mapping member names to directions,
/// and the object's textual order is significant, so it is kept as an
/// ordered list rather than a hash map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOrder(Vec<(String, OrderDirection)>);

impl QueryOrder {
    pub fn new() -> Self {
        QueryOrder(Vec::new())
    }

    /// Single-member ordering, the common case for the predefined queries.
    pub fn by(member: impl Into<String>, direction: OrderDirection) -> Self {
        QueryOrder(vec![(member.into(), direction)])
    }

    /// Appends another ordered member, replacing an earlier entry for the
    /// same member.
    pub fn then_by(mut self, member: impl Into<String>, direction: OrderDirection) -> Self {
        let member = member.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == member) {
            Some((_, slot)) => *slot = direction,
            None => self.0.push((member, direction)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, OrderDirection)> {
        self.0.iter().map(|(member, dir)| (member.as_str(), *dir))
    }
}

impl Serialize for QueryOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (member, direction) in &self.0 {
            map.serialize_entry(member, direction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QueryOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderVisitor;

        impl<'de> Visitor<'de> for OrderVisitor {
            type Value = QueryOrder;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a map of member names to sort directions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<QueryOrder, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, OrderDirection>()? {
                    entries.push(entry);
                }
                Ok(QueryOrder(entries))
            }
        }

        deserializer.deserialize_map(OrderVisitor)
    }
}

// ============================================================================
// PIVOT CONFIGURATION
// ============================================================================

/// Decides which query members span the x axis (rows / chart x values)
/// and which span the y axis (series / columns) when pivoting a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotConfig {
    #[serde(default)]
    pub x: Vec<String>,

    #[serde(default)]
    pub y: Vec<String>,

    #[serde(default = "default_true")]
    pub fill_missing_dates: bool,

    #[serde(default)]
    pub join_date_range: bool,
}

impl Default for PivotConfig {
    fn default() -> Self {
        PivotConfig {
            x: Vec::new(),
            y: Vec::new(),
            fill_missing_dates: true,
            join_date_range: false,
        }
    }
}

impl PivotConfig {
    /// Resolves the effective configuration for a query.
    ///
    /// Without an explicit configuration, time dimensions span the x axis
    /// and regular dimensions the y axis; a query with no time dimensions
    /// puts its dimensions on x instead. The measures pseudo-member is
    /// appended to the y axis when measures exist but neither axis names
    /// it, and stripped from both axes when the query has no measures.
    pub fn normalized(query: &Query, config: Option<PivotConfig>) -> PivotConfig {
        let mut config = config.unwrap_or_else(|| {
            let time_members = query.time_dimension_members();
            if time_members.is_empty() {
                PivotConfig {
                    x: query.dimensions.clone(),
                    y: Vec::new(),
                    ..PivotConfig::default()
                }
            } else {
                PivotConfig {
                    x: time_members,
                    y: query.dimensions.clone(),
                    ..PivotConfig::default()
                }
            }
        });

        if query.has_measures() {
            let on_either_axis = config
                .x
                .iter()
                .chain(config.y.iter())
                .any(|member| member == MEASURES_AXIS);
            if !on_either_axis {
                config.y.push(MEASURES_AXIS.to_string());
            }
        } else {
            config.x.retain(|member| member != MEASURES_AXIS);
            config.y.retain(|member| member != MEASURES_AXIS);
        }
        config
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// TESTS
// ============================================================================
