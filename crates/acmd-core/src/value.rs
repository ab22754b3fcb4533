// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Exported value representation.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A plain record of named values.
pub type Record = BTreeMap<String, Value>;

type NativeFn = dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync;

/// A named native function that a module can export.
#[derive(Clone)]
pub struct NativeFunction {
    /// The function name
    pub name: String,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    /// Creates a new native function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Calls the function.
    pub fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// A value stored in a module's exports.
///
/// Values are thread-safe and can be shared between async tasks.
#[derive(Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Plain record
    Object(Record),
    /// Native function
    Function(NativeFunction),
    /// Opaque host value
    Native(Arc<dyn Any + Send + Sync>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of f64 comparison
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.func, &b.func),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Wraps a host value.
    pub fn native<T: Any + Send + Sync>(value: T) -> Self {
        Value::Native(Arc::new(value))
    }

    /// Creates a function value.
    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Value::Function(NativeFunction::new(name, func))
    }

    /// Converts a JSON document into a value.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => Value::Array(arr.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is nullish (null or undefined).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns the number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the record, if this is an object.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the function, if this is one.
    pub fn as_function(&self) -> Option<&NativeFunction> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Downcasts an opaque host value.
    pub fn downcast_native<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Native(value) => Arc::clone(value).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Native(_) => "native",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(record) => f.debug_tuple("Object").field(record).finish(),
            Value::Function(func) => write!(f, "{func:?}"),
            Value::Native(_) => write!(f, "Native(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(func) => write!(f, "[Function: {} (native)]", func.name),
            Value::Native(_) => write!(f, "[native]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record)
    }
}

impl From<NativeFunction> for Value {
    fn from(func: NativeFunction) -> Self {
        Value::Function(func)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::from_json(&json!({
            "name": "acmd",
            "tags": ["a", 1],
            "nested": { "ok": true, "none": null }
        }));

        let record = value.as_record().unwrap();
        assert_eq!(record["name"], Value::from("acmd"));
        assert_eq!(
            record["tags"],
            Value::Array(vec![Value::from("a"), Value::from(1)])
        );
        let nested = record["nested"].as_record().unwrap();
        assert_eq!(nested["ok"].as_bool(), Some(true));
        assert!(nested["none"].is_nullish());
    }

    #[test]
    fn test_function_identity() {
        let add = Value::function("add", |args| {
            let sum = args.iter().filter_map(Value::as_number).sum::<f64>();
            Ok(Value::Number(sum))
        });
        let same = add.clone();
        let other = Value::function("add", |_| Ok(Value::Undefined));

        assert_eq!(add, same);
        assert_ne!(add, other);

        let result = add
            .as_function()
            .unwrap()
            .call(&[Value::from(2), Value::from(3)])
            .unwrap();
        assert_eq!(result.as_number(), Some(5.0));
    }

    #[test]
    fn test_native_downcast() {
        #[derive(Debug, PartialEq)]
        struct Port(u16);

        let value = Value::native(Port(8080));
        assert_eq!(value.downcast_native::<Port>().as_deref(), Some(&Port(8080)));
        assert!(value.downcast_native::<String>().is_none());
        assert_eq!(value.type_of(), "native");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(
            Value::Array(vec![Value::from(1), Value::from("x")]).to_string(),
            "[1, x]"
        );
        assert_eq!(Value::Object(Record::new()).to_string(), "[object Object]");
    }

    #[test]
    fn test_nan_is_not_equal() {
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }
}
