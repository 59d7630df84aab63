use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record from the candidate view: column name → driver value, in select order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Returns the value of the first listed column that is present and non-null.
    pub fn pick(&self, columns: &[&str]) -> Option<&Value> {
        columns
            .iter()
            .filter_map(|column| self.0.get(*column))
            .find(|value| !value.is_null())
    }
}

impl From<Map<String, Value>> for RawRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// The fixed-shape candidate returned by `GET /api/all-candidates`.
/// Field order here is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCandidate {
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub country: Option<String>,
    pub latest_cv_title: Option<String>,
    pub skills: Option<String>,
    pub availability: i64,
    pub clearance: Option<String>,
}
