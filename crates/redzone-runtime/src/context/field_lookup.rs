//! Field Resolver
//!
//! Resolves flat or dotted field paths against a customer snapshot.
//! A missing path is [`Resolved::Undefined`], which is distinct from a
//! field that exists but holds `null`.

use redzone_core::Value;
use redzone_repository::CustomerSnapshot;

/// Outcome of resolving a field path
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The path does not exist on the snapshot
    Undefined,
    /// The path exists; the value may be `Value::Null`
    Value(Value),
}

impl Resolved {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Resolved::Undefined)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Undefined => None,
            Resolved::Value(v) => Some(v),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Resolved::Undefined => None,
            Resolved::Value(v) => Some(v),
        }
    }
}

/// Resolve `path` against `snapshot`.
///
/// Supports direct column lookup and dotted lookup into JSON-valued columns.
/// JSON columns stored as text (`"{\"lastSentDate\": ...}"`) are parsed on the
/// way down. Pure: no side effects, no errors.
pub fn resolve(snapshot: &CustomerSnapshot, path: &str) -> Resolved {
    let path = path.trim();
    if path.is_empty() {
        return Resolved::Undefined;
    }

    if let Some(value) = snapshot.get(path) {
        return Resolved::Value(value.clone());
    }

    let mut segments = path.split('.');
    let head = match segments.next() {
        Some(head) => head,
        None => return Resolved::Undefined,
    };
    let mut current = match snapshot.get(head) {
        Some(value) => value.clone(),
        None => return Resolved::Undefined,
    };

    for segment in segments {
        current = match descend(&current, segment) {
            Some(next) => next,
            None => {
                tracing::trace!(path, segment, "field path not present on snapshot");
                return Resolved::Undefined;
            }
        };
    }

    Resolved::Value(current)
}

fn descend(value: &Value, key: &str) -> Option<Value> {
    match value {
        Value::Object(map) => map.get(key).cloned(),
        Value::String(text) => {
            let parsed: serde_json::Value = serde_json::from_str(text).ok()?;
            match Value::from(parsed) {
                Value::Object(map) => map.get(key).cloned(),
                _ => None,
            }
        }
        _ => None,
    }
}
