//! Field declarations and their resolution.
//!
//! A [`Field`] is the declarative form (name, type, options); resolution
//! merges it with the record's configuration into a [`ResolvedField`]:
//! external key, requiredness, default, and the derived (or overridden,
//! then nullable-wrapped) schema.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::derive::{derive, TypeFallback};
use crate::descriptor::TypeDesc;
use crate::error::ConstructionError;
use crate::schema::Schema;

/// Per-record external-key naming, captured at definition time.
pub type KeyTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

/// One declared field of a record under construction.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) ty: TypeDesc,
    pub(crate) nullable: bool,
    pub(crate) default: Option<Value>,
    pub(crate) json_key: Option<String>,
    pub(crate) schema: Option<Schema>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: None,
            json_key: None,
            schema: None,
        }
    }

    /// Accept `null` (and absence) for this field; the slot reads back as
    /// `null` when the key is missing.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when the key is absent from input. A field with a default
    /// is not required.
    pub fn default_value(mut self, v: impl Into<Value>) -> Self {
        self.default = Some(v.into());
        self
    }

    /// Explicit external key, bypassing the record's key transform.
    pub fn json_key(mut self, key: impl Into<String>) -> Self {
        self.json_key = Some(key.into());
        self
    }

    /// Explicit schema, bypassing derivation. The nullable wrapper still
    /// applies on top.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub(crate) fn resolve(
        self,
        record: &str,
        taken: &IndexMap<String, ResolvedField>,
        key_transform: &KeyTransform,
        fallback: &TypeFallback,
    ) -> Result<ResolvedField, ConstructionError> {
        if !IDENT_RE.is_match(&self.name) {
            return Err(ConstructionError::InvalidFieldName {
                record: record.to_owned(),
                name: self.name,
            });
        }
        if taken.contains_key(&self.name) {
            return Err(ConstructionError::DuplicateField {
                record: record.to_owned(),
                field: self.name,
            });
        }

        let json_key = match self.json_key {
            Some(k) => k,
            None => key_transform(&self.name),
        };
        let required = self.default.is_none() && !self.nullable;

        let schema = match self.schema {
            Some(s) => s,
            None => derive(&self.ty, fallback)?,
        };
        // Wrapped once, at the end, regardless of which rule produced the
        // inner schema.
        let schema = if self.nullable {
            Schema::Nullable(Box::new(schema))
        } else {
            schema
        };

        Ok(ResolvedField {
            json_key,
            name: self.name,
            required,
            default: self.default,
            schema,
        })
    }
}

/// A field after resolution; one entry of a frozen record's field table.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub json_key: String,
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
    pub schema: Schema,
}

/// Default key transform: snake_case → lowerCamelCase. Leading underscores
/// are kept verbatim.
pub fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while chars.peek() == Some(&'_') {
        out.push('_');
        chars.next();
    }
    let mut upper_next = false;
    for ch in chars {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
