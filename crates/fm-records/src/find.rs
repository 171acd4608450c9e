//! Builder for `_find` request bodies.
//!
//! A find body is a list of query groups. Criteria inside one group are
//! ANDed; groups are ORed; an omit group removes its matches from the
//! result.
//!
//! # Example
//!
//! ```rust
//! use fmdata_records::{FindRequest, SortOrder};
//!
//! // (bandName = Sudie AND city = Nashville) OR bandName = "The Hunnies"
//! let request = FindRequest::new()
//!     .where_field("bandName", "Sudie")
//!     .and_field("city", "Nashville")
//!     .or_field("bandName", "The Hunnies")
//!     .sort("bandName", SortOrder::Ascend)
//!     .limit(10);
//!
//! let body = request.to_payload();
//! assert_eq!(body["query"].as_array().map(Vec::len), Some(2));
//! ```

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascend,
    Descend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SortRule {
    field_name: String,
    sort_order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct QueryGroup {
    criteria: Map<String, Value>,
    omit: bool,
}

/// A find request: OR of AND-groups, plus omit groups, sort and paging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindRequest {
    groups: Vec<QueryGroup>,
    sort: Vec<SortRule>,
    offset: Option<u32>,
    limit: Option<u32>,
}

impl FindRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion to the current group, starting one if there is none.
    ///
    /// Values use FileMaker find syntax (`"==Sudie"`, `">2010"`, `"*"`).
    pub fn where_field(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.and_field(field, value)
    }

    /// AND a criterion into the current group.
    pub fn and_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        match self.groups.last_mut() {
            Some(group) if !group.omit => {
                group.criteria.insert(field.into(), Value::String(value.into()));
            }
            _ => self.push_group(field, value, false),
        }
        self
    }

    /// Start a new group, ORed with the previous ones.
    pub fn or_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_group(field, value, false);
        self
    }

    /// Start an omit group.
    pub fn omit_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_group(field, value, true);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortRule {
            field_name: field.into(),
            sort_order: order,
        });
        self
    }

    /// 1-based index of the first record to return.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when no criteria were added.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The JSON body for `POST /layouts/{layout}/_find`.
    pub fn to_payload(&self) -> Value {
        let query: Vec<Value> = self
            .groups
            .iter()
            .map(|group| {
                let mut criteria = group.criteria.clone();
                if group.omit {
                    criteria.insert("omit".to_string(), json!("true"));
                }
                Value::Object(criteria)
            })
            .collect();

        let mut body = Map::new();
        body.insert("query".to_string(), Value::Array(query));
        if !self.sort.is_empty() {
            body.insert("sort".to_string(), json!(self.sort));
        }
        if let Some(offset) = self.offset {
            body.insert("offset".to_string(), json!(offset.to_string()));
        }
        if let Some(limit) = self.limit {
            body.insert("limit".to_string(), json!(limit.to_string()));
        }
        Value::Object(body)
    }

    fn push_group(&mut self, field: impl Into<String>, value: impl Into<String>, omit: bool) {
        let mut criteria = Map::new();
        criteria.insert(field.into(), Value::String(value.into()));
        self.groups.push(QueryGroup { criteria, omit });
    }
}
