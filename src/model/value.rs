//! Dynamically typed scalar stored in a row cell.

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single column value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
}

impl Value {
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  /// Render the value as a literal that can be spliced into SQL text.
  ///
  /// Text is single-quoted with embedded quotes doubled; everything else is
  /// written raw. Non-finite floats use PostgreSQL's quoted spellings.
  pub fn sql_literal(&self) -> String {
    match self {
      Value::Null => "NULL".to_string(),
      Value::Bool(true) => "TRUE".to_string(),
      Value::Bool(false) => "FALSE".to_string(),
      Value::Int(i) => i.to_string(),
      Value::Float(f) if f.is_nan() => "'NaN'".to_string(),
      Value::Float(f) if f.is_infinite() && *f > 0.0 => "'Infinity'".to_string(),
      Value::Float(f) if f.is_infinite() => "'-Infinity'".to_string(),
      Value::Float(f) => f.to_string(),
      Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
  }
}

// Floats compare by bit pattern so values can key the query cache.
impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Int(a), Value::Int(b)) => a == b,
      (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
      (Value::Text(a), Value::Text(b)) => a == b,
      _ => false,
    }
  }
}

impl Eq for Value {}

impl Hash for Value {
  fn hash<H: Hasher>(&self, state: &mut H) {
    std::mem::discriminant(self).hash(state);
    match self {
      Value::Null => {}
      Value::Bool(b) => b.hash(state),
      Value::Int(i) => i.hash(state),
      Value::Float(f) => f.to_bits().hash(state),
      Value::Text(s) => s.hash(state),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => write!(f, "NULL"),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Int(i) => write!(f, "{}", i),
      Value::Float(x) => write!(f, "{}", x),
      Value::Text(s) => write!(f, "{}", s),
    }
  }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Value::Bool(v)
  }
}

impl From<i16> for Value {
  fn from(v: i16) -> Self {
    Value::Int(v.into())
  }
}

impl From<i32> for Value {
  fn from(v: i32) -> Self {
    Value::Int(v.into())
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self {
    Value::Int(v)
  }
}

impl From<u32> for Value {
  fn from(v: u32) -> Self {
    Value::Int(v.into())
  }
}

impl From<f32> for Value {
  fn from(v: f32) -> Self {
    Value::Float(v.into())
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Float(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::Text(v.to_string())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::Text(v)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self {
    v.map(Into::into).unwrap_or(Value::Null)
  }
}
