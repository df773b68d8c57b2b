use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Display sentinel for absent or unparseable values. Never used in arithmetic.
pub const NOT_AVAILABLE: &str = "N/A";

/// Pseudo field resolving to the composite City/State location.
pub const LOCATION_FIELD: &str = "Location";

/// Store-assigned identifier of a funding record. Immutable across updates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A raw funding entry as stored by the record store. Schema-less: no field
/// is guaranteed to exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FundingRecord {
    pub data: HashMap<String, Value>,
}

impl FundingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.data.insert(name.to_string(), value.into());
        self
    }

    /// Field value, or `None` when the key is missing, null, or a blank string.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self.data.get(name)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            value => Some(value),
        }
    }

    /// Field rendered as text, trimmed. Arrays and objects are not display values.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 讀取 `_id` (store 慣例) 或 `id`，字串或數字皆可
    pub fn id(&self) -> Option<RecordId> {
        ["_id", "id"].iter().find_map(|key| match self.field(key)? {
            Value::String(s) => Some(RecordId::new(s.trim())),
            Value::Number(n) => Some(RecordId::new(n.to_string())),
            _ => None,
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

impl From<Value> for FundingRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(obj) => Self {
                data: obj.into_iter().collect(),
            },
            other => {
                let mut data = HashMap::new();
                data.insert("response".to_string(), other);
                Self { data }
            }
        }
    }
}

/// Display-stable, parsed projection of a [`FundingRecord`]. Recomputed on
/// every fetch and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub id: RecordId,
    /// Recognized display fields defaulted to `N/A`, plus every other present field.
    pub display_fields: BTreeMap<String, String>,
    /// Parsed numeric values. A missing key means "unknown", never zero.
    pub numeric_fields: BTreeMap<String, f64>,
    pub location: String,
    #[serde(skip)]
    pub(crate) present: BTreeMap<String, String>,
    #[serde(skip)]
    pub(crate) city: Option<String>,
    #[serde(skip)]
    pub(crate) state: Option<String>,
}

impl NormalizedRecord {
    /// Present text value of a field. `Location` resolves to the composite location.
    pub fn value(&self, field: &str) -> Option<&str> {
        if field.eq_ignore_ascii_case(LOCATION_FIELD) {
            return self.has_location().then_some(self.location.as_str());
        }
        self.present.get(field).map(String::as_str)
    }

    pub fn display(&self, field: &str) -> &str {
        if field.eq_ignore_ascii_case(LOCATION_FIELD) {
            return &self.location;
        }
        self.display_fields
            .get(field)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.numeric_fields.get(field).copied()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn has_location(&self) -> bool {
        self.city.is_some() || self.state.is_some()
    }
}
