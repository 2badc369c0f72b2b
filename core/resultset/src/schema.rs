//! FILENAME: core/resultset/src/schema.rs
//! Response Schema - Member annotations and table column descriptors.
//!
//! This module describes what the fields of a result mean. Data types
//! and formats are open sets, since the API is free to introduce new
//! ones; unrecognized strings are preserved rather than rejected, and
//! the formatter falls back to plain stringification for them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// DATA TYPES AND FORMATS
// ============================================================================

/// The declared data type of a member, as annotated by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnDataType {
    Boolean,
    Number,
    Text,
    Time,
    /// A type this crate has no special handling for; kept verbatim.
    Other(String),
}

impl From<String> for ColumnDataType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "boolean" => ColumnDataType::Boolean,
            "number" => ColumnDataType::Number,
            "string" => ColumnDataType::Text,
            "time" => ColumnDataType::Time,
            _ => ColumnDataType::Other(raw),
        }
    }
}

impl From<ColumnDataType> for String {
    fn from(data_type: ColumnDataType) -> Self {
        match data_type {
            ColumnDataType::Boolean => "boolean".to_string(),
            ColumnDataType::Number => "number".to_string(),
            ColumnDataType::Text => "string".to_string(),
            ColumnDataType::Time => "time".to_string(),
            ColumnDataType::Other(raw) => raw,
        }
    }
}

/// A display format hint attached to a member, refining its data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnFormat {
    Percent,
    Currency,
    Id,
    Other(String),
}

impl From<String> for ColumnFormat {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "percent" => ColumnFormat::Percent,
            "currency" => ColumnFormat::Currency,
            "id" => ColumnFormat::Id,
            _ => ColumnFormat::Other(raw),
        }
    }
}

impl From<ColumnFormat> for String {
    fn from(format: ColumnFormat) -> Self {
        match format {
            ColumnFormat::Percent => "percent".to_string(),
            ColumnFormat::Currency => "currency".to_string(),
            ColumnFormat::Id => "id".to_string(),
            ColumnFormat::Other(raw) => raw,
        }
    }
}

// ============================================================================
// ANNOTATIONS
// ============================================================================

/// Per-member metadata block of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAnnotation {
    pub title: String,

    #[serde(default)]
    pub short_title: String,

    #[serde(rename = "type")]
    pub member_type: ColumnDataType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ColumnFormat>,
}

impl MemberAnnotation {
    pub fn new(
        title: impl Into<String>,
        short_title: impl Into<String>,
        member_type: ColumnDataType,
    ) -> Self {
        MemberAnnotation {
            title: title.into(),
            short_title: short_title.into(),
            member_type,
            format: None,
        }
    }

    pub fn with_format(mut self, format: ColumnFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// The annotation section of a response, grouping member metadata by
/// member kind. Lookups go through [`Annotation::member`], which searches
/// the groups in a fixed order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Annotation {
    pub measures: FxHashMap<String, MemberAnnotation>,
    pub dimensions: FxHashMap<String, MemberAnnotation>,
    pub segments: FxHashMap<String, MemberAnnotation>,
    pub time_dimensions: FxHashMap<String, MemberAnnotation>,
}

impl Annotation {
    /// Finds the annotation for a member name, whichever kind it is.
    pub fn member(&self, name: &str) -> Option<&MemberAnnotation> {
        self.measures
            .get(name)
            .or_else(|| self.dimensions.get(name))
            .or_else(|| self.time_dimensions.get(name))
            .or_else(|| self.segments.get(name))
    }
}

// ============================================================================
// TABLE COLUMNS
// ============================================================================

/// One column of a pivoted table.
///
/// Columns form a tree: a grouped y axis nests per-value group columns
/// above the measure leaves. Only leaf columns address row fields
/// (through `data_index`); group columns exist for header rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub key: String,
    pub data_index: String,
    pub title: String,
    pub short_title: String,

    #[serde(rename = "type")]
    pub column_type: ColumnDataType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ColumnFormat>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TableColumn>,
}

impl TableColumn {
    /// A leaf column addressing one row field.
    pub fn leaf(
        data_index: impl Into<String>,
        title: impl Into<String>,
        column_type: ColumnDataType,
    ) -> Self {
        let data_index = data_index.into();
        TableColumn {
            key: data_index.clone(),
            data_index,
            title: title.into(),
            short_title: String::new(),
            column_type,
            format: None,
            children: Vec::new(),
        }
    }

    /// A group column carrying child columns under a shared header.
    pub fn group(title: impl Into<String>, children: Vec<TableColumn>) -> Self {
        let title = title.into();
        TableColumn {
            key: title.clone(),
            data_index: title.clone(),
            title,
            short_title: String::new(),
            column_type: ColumnDataType::Text,
            format: None,
            children,
        }
    }

    pub fn with_short_title(mut self, short_title: impl Into<String>) -> Self {
        self.short_title = short_title.into();
        self
    }

    pub fn with_format(mut self, format: ColumnFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
