// Declarative type vocabulary for record fields. No validation logic here;
// descriptors only exist while a record type is under construction.

use std::fmt;

use serde_json::Value;

use crate::record::{RecordHandle, RecordType};

/// Declarative description of a field's type; input to schema derivation.
#[derive(Debug, Clone)]
pub enum TypeDesc {
    /// Exact-equality match against one JSON value (number/bool/string/null).
    Literal(Value),
    Primitive(Primitive),
    List(Box<TypeDesc>),
    /// Ordered alternatives. Order matters only for error messages.
    Union(Vec<TypeDesc>),
    Map {
        key: Box<TypeDesc>,
        value: Box<TypeDesc>,
    },
    UntypedMap,
    /// Inclusive integer bounds.
    Range { lo: i64, hi: i64 },
    /// Deliberately not auto-derived; see the derivation rules.
    Tuple(Vec<TypeDesc>),
    /// Another record's frozen schema, composed by reference.
    Record(RecordType),
    /// Lazy reference, resolved at first use. Supports cyclic record pairs.
    RecordRef(RecordHandle),
    /// Anything not covered above; routed through the per-record fallback.
    Opaque(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Any,
    Atom,
    Bool,
    Float,
    Int,
    NegInt,
    NonNegInt,
    PosInt,
    Number,
    String,
    Date,
}

impl TypeDesc {
    pub fn literal(v: impl Into<Value>) -> Self {
        TypeDesc::Literal(v.into())
    }

    pub fn any() -> Self {
        TypeDesc::Primitive(Primitive::Any)
    }

    pub fn atom() -> Self {
        TypeDesc::Primitive(Primitive::Atom)
    }

    pub fn boolean() -> Self {
        TypeDesc::Primitive(Primitive::Bool)
    }

    pub fn float() -> Self {
        TypeDesc::Primitive(Primitive::Float)
    }

    pub fn integer() -> Self {
        TypeDesc::Primitive(Primitive::Int)
    }

    pub fn neg_int() -> Self {
        TypeDesc::Primitive(Primitive::NegInt)
    }

    pub fn non_neg_int() -> Self {
        TypeDesc::Primitive(Primitive::NonNegInt)
    }

    pub fn pos_int() -> Self {
        TypeDesc::Primitive(Primitive::PosInt)
    }

    /// Integer or float.
    pub fn number() -> Self {
        TypeDesc::Primitive(Primitive::Number)
    }

    pub fn string() -> Self {
        TypeDesc::Primitive(Primitive::String)
    }

    /// ISO-8601 calendar date carried as a string.
    pub fn date() -> Self {
        TypeDesc::Primitive(Primitive::Date)
    }

    pub fn list(elem: TypeDesc) -> Self {
        TypeDesc::List(Box::new(elem))
    }

    pub fn union(options: impl IntoIterator<Item = TypeDesc>) -> Self {
        TypeDesc::Union(options.into_iter().collect())
    }

    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn untyped_map() -> Self {
        TypeDesc::UntypedMap
    }

    /// Inclusive range `lo..hi`.
    pub fn range(lo: i64, hi: i64) -> Self {
        TypeDesc::Range { lo, hi }
    }

    pub fn tuple(elems: impl IntoIterator<Item = TypeDesc>) -> Self {
        TypeDesc::Tuple(elems.into_iter().collect())
    }

    pub fn record(ty: &RecordType) -> Self {
        TypeDesc::Record(ty.clone())
    }

    pub fn record_ref(handle: &RecordHandle) -> Self {
        TypeDesc::RecordRef(handle.clone())
    }

    pub fn opaque(raw: impl Into<Value>) -> Self {
        TypeDesc::Opaque(raw.into())
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Any => "any",
            Primitive::Atom => "atom",
            Primitive::Bool => "bool",
            Primitive::Float => "float",
            Primitive::Int => "int",
            Primitive::NegInt => "neg_int",
            Primitive::NonNegInt => "non_neg_int",
            Primitive::PosInt => "pos_int",
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::Date => "date",
        };
        f.write_str(name)
    }
}

/// Short rendering for diagnostics (construction error messages).
impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Literal(v) => write!(f, "literal {v}"),
            TypeDesc::Primitive(p) => write!(f, "{p}"),
            TypeDesc::List(elem) => write!(f, "list of {elem}"),
            TypeDesc::Union(opts) => {
                write!(f, "union of {} options", opts.len())
            }
            TypeDesc::Map { .. } | TypeDesc::UntypedMap => write!(f, "map"),
            TypeDesc::Range { lo, hi } => write!(f, "range {lo}..{hi}"),
            TypeDesc::Tuple(elems) => {
                write!(f, "tuple of {} elements", elems.len())
            }
            TypeDesc::Record(ty) => write!(f, "record {}", ty.name()),
            TypeDesc::RecordRef(h) => write!(f, "record {}", h.name()),
            TypeDesc::Opaque(raw) => write!(f, "opaque {raw}"),
        }
    }
}
