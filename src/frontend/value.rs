//! Typed values from evaluated buildfiles.
//!
//! A value remembers the location of the expression that produced it so
//! type errors can point at the buildfile line.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Location};

/// The payload of a buildfile value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueKind {
    /// A string literal
    String(String),
    /// An integer
    Integer(i64),
    /// A boolean
    Boolean(bool),
    /// A list of values
    List(Vec<Value>),
}

impl ValueKind {
    /// The type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::String(_) => "string",
            ValueKind::Integer(_) => "integer",
            ValueKind::Boolean(_) => "boolean",
            ValueKind::List(_) => "list",
        }
    }
}

/// A buildfile value with the location of its originating expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    kind: ValueKind,
    origin: Option<Location>,
}

impl Value {
    /// Create a value with no recorded origin (programmatic values).
    pub fn new(kind: ValueKind) -> Self {
        Value { kind, origin: None }
    }

    /// Create a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::new(ValueKind::String(s.into()))
    }

    /// Create an integer value.
    pub fn integer(i: i64) -> Self {
        Value::new(ValueKind::Integer(i))
    }

    /// Create a boolean value.
    pub fn boolean(b: bool) -> Self {
        Value::new(ValueKind::Boolean(b))
    }

    /// Create a list value.
    pub fn list(items: Vec<Value>) -> Self {
        Value::new(ValueKind::List(items))
    }

    /// Attach the originating expression's location.
    pub fn with_origin(mut self, origin: Location) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The payload.
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// The originating location, when known.
    pub fn origin(&self) -> Option<&Location> {
        self.origin.as_ref()
    }

    /// The string payload, or a located type error.
    pub fn string_value(&self) -> Result<&str, Error> {
        match &self.kind {
            ValueKind::String(s) => Ok(s),
            other => Err(self.type_error("string", other)),
        }
    }

    /// The boolean payload, or a located type error.
    pub fn boolean_value(&self) -> Result<bool, Error> {
        match &self.kind {
            ValueKind::Boolean(b) => Ok(*b),
            other => Err(self.type_error("boolean", other)),
        }
    }

    /// The integer payload, or a located type error.
    pub fn integer_value(&self) -> Result<i64, Error> {
        match &self.kind {
            ValueKind::Integer(i) => Ok(*i),
            other => Err(self.type_error("integer", other)),
        }
    }

    /// The list payload, or a located type error.
    pub fn list_value(&self) -> Result<&[Value], Error> {
        match &self.kind {
            ValueKind::List(items) => Ok(items),
            other => Err(self.type_error("list", other)),
        }
    }

    fn type_error(&self, expected: &str, got: &ValueKind) -> Error {
        let mut err = Error::new(format!(
            "Value has the wrong type: expected {expected}, got {}.",
            got.type_name()
        ));
        if let Some(origin) = &self.origin {
            err = err.with_location(origin.clone());
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::string("hi").string_value().unwrap(), "hi");
        assert!(Value::boolean(true).boolean_value().unwrap());
        assert_eq!(Value::integer(4).integer_value().unwrap(), 4);
        assert_eq!(
            Value::list(vec![Value::string("a")]).list_value().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_type_error_carries_location() {
        let value = Value::string("hi").with_origin(Location::new("//BUILD", 3, 7));
        let err = value.boolean_value().unwrap_err();
        assert_eq!(err.location().unwrap().line, 3);
        assert!(err.message().contains("expected boolean, got string"));
    }
}
