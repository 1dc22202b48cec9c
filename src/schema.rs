//! Composable validator tree.
//!
//! One [`Schema`] value describes the expected shape of one JSON value.
//! Schemas are immutable after construction and freely shared: every
//! parse/dump call reads the same tree, and a record embedded in another
//! record is composed by reference, never copied.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::record::{RecordHandle, RecordType};

/// Custom boolean check with a fixed failure message.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Schema {
    /// Accepts any value.
    Any,
    /// Symbol-ish value; JSON has no symbol type, so strings are accepted.
    Atom,
    Bool,
    Int,
    Float,
    Str,
    /// ISO-8601 calendar date (`YYYY-MM-DD`) carried as a string.
    Date,
    /// Exact equality. Numbers compare numerically (`1` matches `1.0`).
    Literal(Value),
    ListOf(Box<Schema>),
    TypedMap {
        keys: Box<Schema>,
        values: Box<Schema>,
    },
    UntypedMap,
    /// Ordered alternatives; first accepting arm wins. Order affects only
    /// the aggregated error message, not acceptance.
    OneOf(Vec<Schema>),
    /// Fixed-arity array with per-position schemas.
    Tuple(Vec<Schema>),
    /// Accepts `null` in addition to the inner shape.
    Nullable(Box<Schema>),
    /// Conjunction: every part must accept. Errors report the first failure.
    All(Vec<Schema>),
    Raw {
        test: Predicate,
        message: String,
    },
    /// A whole record's frozen field table.
    Record(RecordType),
    /// Lazy record reference; resolved at first use.
    RecordRef(RecordHandle),
}

impl Schema {
    pub fn literal(v: impl Into<Value>) -> Self {
        Schema::Literal(v.into())
    }

    pub fn list_of(elem: Schema) -> Self {
        Schema::ListOf(Box::new(elem))
    }

    pub fn typed_map(keys: Schema, values: Schema) -> Self {
        Schema::TypedMap {
            keys: Box::new(keys),
            values: Box::new(values),
        }
    }

    pub fn oneof(arms: impl IntoIterator<Item = Schema>) -> Self {
        Schema::OneOf(arms.into_iter().collect())
    }

    pub fn tuple(elems: impl IntoIterator<Item = Schema>) -> Self {
        Schema::Tuple(elems.into_iter().collect())
    }

    pub fn nullable(inner: Schema) -> Self {
        Schema::Nullable(Box::new(inner))
    }

    pub fn all(parts: impl IntoIterator<Item = Schema>) -> Self {
        Schema::All(parts.into_iter().collect())
    }

    pub fn raw(
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        Schema::Raw {
            test: Arc::new(test),
            message: message.into(),
        }
    }

    pub fn record(ty: &RecordType) -> Self {
        Schema::Record(ty.clone())
    }

    pub fn record_ref(handle: &RecordHandle) -> Self {
        Schema::RecordRef(handle.clone())
    }

    /// Human phrase used when building aggregated union errors
    /// ("expected either ... or ...").
    pub fn describe(&self) -> String {
        match self {
            Schema::Any => "anything".into(),
            Schema::Atom => "an atom".into(),
            Schema::Bool => "a boolean".into(),
            Schema::Int => "an integer".into(),
            Schema::Float => "a float".into(),
            Schema::Str => "a string".into(),
            Schema::Date => "a date".into(),
            Schema::Literal(v) => format!("the value {v}"),
            Schema::ListOf(_) => "a list".into(),
            Schema::TypedMap { .. } | Schema::UntypedMap => "a map".into(),
            Schema::OneOf(arms) => {
                let ds: Vec<String> = arms.iter().map(Schema::describe).collect();
                ds.join(" or ")
            }
            Schema::Tuple(elems) => {
                format!("a tuple of {} elements", elems.len())
            }
            Schema::Nullable(inner) => format!("nil or {}", inner.describe()),
            // The leading conjunct names the base type; the guards only
            // narrow it.
            Schema::All(parts) => match parts.first() {
                Some(first) => first.describe(),
                None => "anything".into(),
            },
            Schema::Raw { message, .. } => format!("a value that {message}"),
            Schema::Record(ty) => format!("a {} record", ty.name()),
            Schema::RecordRef(h) => format!("a {} record", h.name()),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Any => f.write_str("Any"),
            Schema::Atom => f.write_str("Atom"),
            Schema::Bool => f.write_str("Bool"),
            Schema::Int => f.write_str("Int"),
            Schema::Float => f.write_str("Float"),
            Schema::Str => f.write_str("Str"),
            Schema::Date => f.write_str("Date"),
            Schema::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Schema::ListOf(e) => f.debug_tuple("ListOf").field(e).finish(),
            Schema::TypedMap { keys, values } => f
                .debug_struct("TypedMap")
                .field("keys", keys)
                .field("values", values)
                .finish(),
            Schema::UntypedMap => f.write_str("UntypedMap"),
            Schema::OneOf(arms) => f.debug_tuple("OneOf").field(arms).finish(),
            Schema::Tuple(es) => f.debug_tuple("Tuple").field(es).finish(),
            Schema::Nullable(e) => f.debug_tuple("Nullable").field(e).finish(),
            Schema::All(ps) => f.debug_tuple("All").field(ps).finish(),
            Schema::Raw { message, .. } => f
                .debug_struct("Raw")
                .field("message", message)
                .finish_non_exhaustive(),
            // Shallow on purpose: records may reference each other.
            Schema::Record(ty) => f.debug_tuple("Record").field(&ty.name()).finish(),
            Schema::RecordRef(h) => f.debug_tuple("RecordRef").field(&h.name()).finish(),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_phrases() {
        assert_eq!(Schema::Int.describe(), "an integer");
        assert_eq!(
            Schema::oneof([Schema::Int, Schema::Float]).describe(),
            "an integer or a float"
        );
        assert_eq!(
            Schema::nullable(Schema::Str).describe(),
            "nil or a string"
        );
        let guarded = Schema::all([
            Schema::Int,
            Schema::raw(|v| v.as_i64().is_some_and(|n| n > 0), "must be >0"),
        ]);
        assert_eq!(guarded.describe(), "an integer");
    }

    #[test]
    fn debug_is_shallow_for_raw() {
        let s = Schema::raw(|_| true, "always");
        let dbg = format!("{s:?}");
        assert!(dbg.contains("always"));
    }
}
