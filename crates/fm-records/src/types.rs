//! Record payload types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One record as returned in a `data` array.
///
/// `recordId` and `modId` are absent from some layouts' responses, so both
/// are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub mod_id: Option<String>,
    #[serde(default)]
    pub field_data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_data: Option<Value>,
}

impl Record {
    /// Borrow a field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.field_data.get(name)
    }

    /// Deserialize a field value into `T`; `None` if absent or of another shape.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.field(name).and_then(|value| T::deserialize(value).ok())
    }
}

/// Counts the server reports alongside a found set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataInfo {
    pub database: String,
    pub layout: String,
    pub table: String,
    pub total_record_count: u64,
    pub found_count: u64,
    pub returned_count: u64,
}

/// Records returned by a list or find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoundSet {
    pub records: Vec<Record>,
    /// Present on servers that report counts.
    pub data_info: Option<DataInfo>,
}

impl FoundSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Just the `fieldData` of every record, in order.
    pub fn field_data(&self) -> Vec<&Map<String, Value>> {
        self.records.iter().map(|r| &r.field_data).collect()
    }
}

impl IntoIterator for FoundSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Ids of a record just created or duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIds {
    #[serde(deserialize_with = "required_id")]
    pub record_id: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub mod_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Text(String),
    Number(u64),
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        match id {
            Id::Text(s) => s,
            Id::Number(n) => n.to_string(),
        }
    }
}

// Ids are strings on current servers; accept numbers as well.
fn required_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Id::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Id>::deserialize(deserializer)?.map(String::from))
}
