//! Record types: construction, freezing, and the parse/dump runtime.
//!
//! A record type goes through exactly two phases. Under construction, a
//! [`RecordBuilder`] accumulates field declarations plus per-record
//! configuration (key transform, type fallback, nil-dump policy). `build()`
//! resolves every field in declaration order and freezes the result
//! atomically: either all fields resolve and an immutable [`RecordType`]
//! comes back, or construction fails and nothing partial is observable.
//!
//! Frozen types are cheap handles over a shared, read-only field table
//! (`Arc` inside), so `parse`, `parse_list`, and `dump` may run from any
//! number of threads without locking. For mutually recursive records,
//! [`RecordHandle`] gives a name a write-once slot that references resolve
//! lazily at first use.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::derive::{permissive_fallback, rejecting_fallback, TypeFallback};
use crate::descriptor::TypeDesc;
use crate::error::{ConstructionError, ParseError};
use crate::field::{lower_camel, Field, KeyTransform, ResolvedField};
use crate::schema::Schema;
use crate::unify::unify_record;

// ————————————————————————————————————————————————————————————————————————————
// FROZEN RECORD TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
struct RecordInner {
    name: String,
    /// Keyed by internal field name, in declaration order.
    fields: IndexMap<String, ResolvedField>,
    /// Dump `null`-valued fields explicitly instead of omitting them.
    dump_nil_fields: bool,
}

/// A frozen record type: its identity plus the ordered field table.
#[derive(Debug, Clone)]
pub struct RecordType {
    inner: Arc<RecordInner>,
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            name: name.into(),
            specs: Vec::new(),
            key_transform: Arc::new(lower_camel),
            fallback: permissive_fallback(),
            dump_nil_fields: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn fields(&self) -> &IndexMap<String, ResolvedField> {
        &self.inner.fields
    }

    /// This record as a schema node, for embedding in other schemas.
    pub fn schema(&self) -> Schema {
        Schema::Record(self.clone())
    }

    /// Validate and parse one loose JSON value into a record instance.
    pub fn parse(&self, data: &Value) -> Result<Record, ParseError> {
        match unify_record(self, data) {
            Ok(values) => Ok(Record {
                ty: self.clone(),
                values,
            }),
            Err(errors) => Err(ParseError {
                errors,
                input: data.clone(),
            }),
        }
    }

    /// Parse an ordered sequence, stopping at the first failing element.
    /// The error carries only that element's errors and raw data.
    pub fn parse_list(&self, items: &[Value]) -> Result<Vec<Record>, ParseError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.parse(item)?);
        }
        Ok(out)
    }

    /// Serialize a record instance back to an external-keyed map. Total for
    /// any valid record instance; no re-validation happens here.
    pub fn dump(&self, rec: &Record) -> Map<String, Value> {
        self.dump_fields(&rec.values)
    }

    fn dump_fields(&self, values: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for field in self.inner.fields.values() {
            let v = values.get(&field.name).cloned().unwrap_or(Value::Null);
            if v.is_null() && !self.inner.dump_nil_fields {
                continue;
            }
            out.insert(field.json_key.clone(), dump_value(&field.schema, &v));
        }
        out
    }
}

/// Re-externalize nested record values (parse keeps them keyed by internal
/// names) while walking through containers.
fn dump_value(schema: &Schema, v: &Value) -> Value {
    match (schema, v) {
        (Schema::Nullable(inner), v) if !v.is_null() => dump_value(inner, v),
        (Schema::Record(ty), Value::Object(values)) => Value::Object(ty.dump_fields(values)),
        (Schema::RecordRef(handle), Value::Object(values)) => match handle.get() {
            Some(ty) => Value::Object(ty.dump_fields(values)),
            None => v.clone(),
        },
        (Schema::ListOf(elem), Value::Array(items)) => {
            Value::Array(items.iter().map(|x| dump_value(elem, x)).collect())
        }
        (Schema::Tuple(elems), Value::Array(items)) => Value::Array(
            elems
                .iter()
                .zip(items)
                .map(|(s, x)| dump_value(s, x))
                .collect(),
        ),
        (Schema::TypedMap { values: vs, .. }, Value::Object(map)) => Value::Object(
            map.iter()
                .map(|(k, x)| (k.clone(), dump_value(vs, x)))
                .collect(),
        ),
        _ => v.clone(),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

/// Accumulates field declarations; not callable until `build()` freezes it.
pub struct RecordBuilder {
    name: String,
    specs: Vec<Field>,
    key_transform: KeyTransform,
    fallback: TypeFallback,
    dump_nil_fields: bool,
}

impl RecordBuilder {
    pub fn field(mut self, spec: Field) -> Self {
        self.specs.push(spec);
        self
    }

    /// External-key naming for this record. Must be pure and deterministic.
    pub fn key_transform(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.key_transform = Arc::new(f);
        self
    }

    /// Hook for descriptors with no derivation rule (tuples, opaque types).
    /// Returning `None` fails construction for that field.
    pub fn type_fallback(
        mut self,
        f: impl Fn(&TypeDesc) -> Option<Schema> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Arc::new(f);
        self
    }

    /// Enforce a closed type vocabulary: any descriptor that would fall
    /// through to the fallback becomes a construction error.
    pub fn deny_unknown_types(mut self) -> Self {
        self.fallback = rejecting_fallback();
        self
    }

    /// Include `null`-valued fields in dump output instead of omitting them.
    pub fn dump_nil_fields(mut self, yes: bool) -> Self {
        self.dump_nil_fields = yes;
        self
    }

    /// Resolve all fields in declaration order and freeze. Atomic: the
    /// first construction error aborts the whole record.
    pub fn build(self) -> Result<RecordType, ConstructionError> {
        let mut fields = IndexMap::with_capacity(self.specs.len());
        for spec in self.specs {
            let resolved = spec.resolve(&self.name, &fields, &self.key_transform, &self.fallback)?;
            fields.insert(resolved.name.clone(), resolved);
        }
        Ok(RecordType {
            inner: Arc::new(RecordInner {
                name: self.name,
                fields,
                dump_nil_fields: self.dump_nil_fields,
            }),
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LAZY HANDLES (cyclic references)
// ————————————————————————————————————————————————————————————————————————————

/// A named, write-once slot for a record type that is not built yet.
///
/// Declare the handle, reference it from other records via
/// [`TypeDesc::record_ref`], then bind it exactly once with [`init`].
/// References resolve lazily at first parse, so two records may reference
/// each other without infinite expansion.
///
/// [`init`]: RecordHandle::init
#[derive(Clone)]
pub struct RecordHandle {
    name: Arc<str>,
    cell: Arc<OnceCell<RecordType>>,
}

impl RecordHandle {
    pub fn declare(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            cell: Arc::new(OnceCell::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the handle. Publication is write-once: a second bind fails.
    pub fn init(&self, ty: &RecordType) -> Result<(), ConstructionError> {
        self.cell
            .set(ty.clone())
            .map_err(|_| ConstructionError::HandleAlreadyBound {
                name: self.name.to_string(),
            })
    }

    pub fn get(&self) -> Option<&RecordType> {
        self.cell.get()
    }
}

impl fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHandle")
            .field("name", &self.name)
            .field("bound", &self.cell.get().is_some())
            .finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INSTANCES
// ————————————————————————————————————————————————————————————————————————————

/// An immutable record instance: one slot per declared field, keyed by
/// internal field name, in declaration order.
#[derive(Debug, Clone)]
pub struct Record {
    ty: RecordType,
    values: Map<String, Value>,
}

impl Record {
    pub fn record_type(&self) -> &RecordType {
        &self.ty
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// External-keyed map; `null` fields omitted unless the record type was
    /// built with `dump_nil_fields(true)`.
    pub fn dump(&self) -> Map<String, Value> {
        self.ty.dump(self)
    }
}

/// Serializes as the dump output (external keys, nil policy applied).
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.dump().serialize(serializer)
    }
}

// ------------------------------- Tests ------------------------------------ //
