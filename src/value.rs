//! Dynamically typed values carried by parsed nodes and element values.
//!
//! A [`Value`] keeps the type it was created with. Reading it as another type
//! goes through the lossy `as_*` accessors, which never fail: they return `0`,
//! `0.0` or an empty string when there is nothing sensible to convert.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::parser::lexer::{is_number_only, is_start_of_number};

/// The type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Null,
    String,
    Int,
    Float,
    Array,
    Object,
}

/// A tagged union of the value kinds the declarative format can express, plus
/// an opaque shared object reference for host data.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Int(i32),
    Float(f64),
    Array(Vec<Value>),
    Object(Rc<dyn Any>),
}

impl Value {
    /// Parse `s`, picking the type from its content.
    ///
    /// - a lone number becomes [`Value::Int`], or [`Value::Float`] if it has a `.` or exponent
    /// - `[a, b, ...]` becomes an array of auto-parsed items
    /// - text starting with a number and containing spaces or commas becomes an array
    /// - anything else, including colors and `@references`, stays a string
    pub fn parse_auto(s: &str) -> Value {
        if is_number_only(s) {
            return parse_number(s.trim_end_matches(' '));
        }
        if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.trim_end().strip_suffix(']')) {
            return Value::Array(split_items(inner).map(Value::parse_auto).collect());
        }
        if is_start_of_number(s) && s.trim_end().contains([' ', ',']) {
            return Value::Array(split_items(s).map(Value::parse_auto).collect());
        }
        Value::String(s.to_owned())
    }

    /// Wrap a host object.
    pub fn object<T: Any>(object: T) -> Value {
        Value::Object(Rc::new(object))
    }

    /// The type tag.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::String(_) => ValueType::String,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view. Floats truncate, numeric strings parse, everything else is 0.
    pub fn as_int(&self) -> i32 {
        match self {
            Value::Int(v) => *v,
            Value::Float(v) => *v as i32,
            Value::String(s) if is_number_only(s) => parse_number(s.trim_end_matches(' ')).as_int(),
            _ => 0,
        }
    }

    /// Float view. Numeric strings parse, everything else is 0.0.
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(v) => f64::from(*v),
            Value::Float(v) => *v,
            Value::String(s) if is_number_only(s) => parse_number(s.trim_end_matches(' ')).as_float(),
            _ => 0.0,
        }
    }

    /// String view. Numbers are formatted, arrays are joined with `", "`,
    /// null and objects are empty.
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Array(items) => items
                .iter()
                .map(Value::as_string)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null | Value::Object(_) => String::new(),
        }
    }

    /// Borrow the string if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The items if this is a [`Value::Array`], otherwise an empty slice.
    pub fn as_array(&self) -> &[Value] {
        match self {
            Value::Array(items) => items,
            _ => &[],
        }
    }

    /// Downcast the object reference if this is a [`Value::Object`] of type `T`.
    pub fn as_object<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }
}

fn parse_number(s: &str) -> Value {
    if !s.contains(['.', 'e', 'E']) {
        if let Ok(v) = s.parse::<i32>() {
            return Value::Int(v);
        }
    }
    s.parse::<f64>().map(Value::Float).unwrap_or(Value::Null)
}

fn split_items(s: &str) -> impl Iterator<Item = &str> {
    s.split([' ', ',']).filter(|item| !item.is_empty())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(obj) => write!(f, "Object({:p})", Rc::as_ptr(obj)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
