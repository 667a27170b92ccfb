use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Field under which every document stores its identity.
pub const ID_FIELD: &str = "_id";

/// Opaque, globally unique document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| MarketError::InvalidArgument(format!("malformed id '{s}'")))
    }
}

/// The five logical collections of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Decorators,
    Services,
    Bookings,
    Payments,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Decorators,
        Collection::Services,
        Collection::Bookings,
        Collection::Payments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Decorators => "decorators",
            Collection::Services => "services",
            Collection::Bookings => "bookings",
            Collection::Payments => "payments",
        }
    }

    /// Name of one record, for messages.
    pub fn singular(&self) -> &'static str {
        match self {
            Collection::Users => "user",
            Collection::Decorators => "decorator",
            Collection::Services => "service",
            Collection::Bookings => "booking",
            Collection::Payments => "payment",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type Document = Map<String, Value>;

/// Exact-match conjunction over top-level document fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: RecordId) -> Self {
        Self::all().with(ID_FIELD, id.to_string())
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), value.into()));
        self
    }

    /// Adds a clause only when a value is present.
    pub fn with_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(field, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// Fields an upsert copies into a freshly inserted document.
    pub fn equalities(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.clauses.iter().map(|(f, v)| (f.as_str(), v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordered list of sort keys; later keys break ties of earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort {
    keys: Vec<(String, Direction)>,
}

impl Sort {
    pub fn by(field: &str, direction: Direction) -> Self {
        Self::default().then(field, direction)
    }

    pub fn then(mut self, field: &str, direction: Direction) -> Self {
        self.keys.push((field.to_string(), direction));
        self
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, direction) in &self.keys {
            let ord = compare_values(a.get(field), b.get(field));
            let ord = match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn apply(&self, docs: &mut [Document]) {
        docs.sort_by(|a, b| self.compare(a, b));
    }
}

/// Missing values sort first; timestamps compare chronologically.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                x.parse::<DateTime<Utc>>(),
                y.parse::<DateTime<Utc>>(),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Applies `fields` on top of `doc`, returning whether anything changed.
pub fn merge_fields(doc: &mut Document, fields: &Document) -> bool {
    let mut modified = false;
    for (key, value) in fields {
        if doc.get(key) != Some(value) {
            doc.insert(key.clone(), value.clone());
            modified = true;
        }
    }
    modified
}

/// The document an upsert inserts when nothing matched: filter equalities,
/// then `on_insert`, then `set`, then a fresh `_id` if none was given.
pub fn upsert_document(filter: &Filter, on_insert: Document, set: Document) -> Document {
    let mut doc: Document = filter
        .equalities()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect();
    doc.extend(on_insert);
    doc.extend(set);
    doc.entry(ID_FIELD)
        .or_insert_with(|| Value::String(RecordId::new().to_string()));
    doc
}

/// Reads the identity field of a stored document.
pub fn document_id(doc: &Document) -> Result<RecordId> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| MarketError::InternalError("document without _id".into()))?
        .parse()
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(MarketError::InternalError(
            format!("expected an object, got {other}").into(),
        )),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertResult {
    /// True when no document matched and a new one was inserted.
    pub upserted: bool,
    pub id: RecordId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_malformed_id_is_invalid_argument() {
        let err = "not-an-id".parse::<RecordId>().unwrap_err();
        assert!(matches!(err, MarketError::InvalidArgument(_)));
        let id = RecordId::new();
        assert_eq!(id.to_string().parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn test_filter_exact_match() {
        let d = doc(json!({"userId": "a@x.com", "status": "pending"}));
        assert!(Filter::all().matches(&d));
        assert!(Filter::all().with("userId", "a@x.com").matches(&d));
        assert!(!Filter::all()
            .with("userId", "a@x.com")
            .with("status", "paid")
            .matches(&d));
        assert!(!Filter::all().with("missing", "x").matches(&d));
    }

    #[test]
    fn test_sort_timestamps_chronologically() {
        // Lexical order would put the fractional timestamp first.
        let mut docs = vec![
            doc(json!({"createdAt": "2025-12-01T12:00:00Z"})),
            doc(json!({"createdAt": "2025-12-01T12:00:00.500Z"})),
        ];
        Sort::by("createdAt", Direction::Descending).apply(&mut docs);
        assert_eq!(docs[0]["createdAt"], "2025-12-01T12:00:00.500Z");
    }

    #[test]
    fn test_sort_tie_break() {
        let mut docs = vec![
            doc(json!({"rating": 4.5, "createdAt": "2025-01-01T00:00:00Z", "n": 1})),
            doc(json!({"rating": 4.9, "createdAt": "2025-01-01T00:00:00Z", "n": 2})),
            doc(json!({"rating": 4.5, "createdAt": "2025-06-01T00:00:00Z", "n": 3})),
        ];
        Sort::by("rating", Direction::Descending)
            .then("createdAt", Direction::Descending)
            .apply(&mut docs);
        let order: Vec<_> = docs.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_merge_reports_modification() {
        let mut d = doc(json!({"status": "active"}));
        assert!(!merge_fields(&mut d, &doc(json!({"status": "active"}))));
        assert!(merge_fields(&mut d, &doc(json!({"status": "disabled"}))));
        assert_eq!(d["status"], "disabled");
    }
}
