//! Tool input validation.
//!
//! Checks raw JSON arguments field by field and reports every problem with
//! its path, before anything is deserialized or executed. `null` is treated
//! like an absent field.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result, ValidationIssue};

/// JSON type name as used in validation messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Default)]
pub(crate) struct Validator {
    issues: Vec<ValidationIssue>,
    prefix: Option<String>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn path(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.to_string(),
        }
    }

    fn issue(&mut self, path: String, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    fn mismatch(&mut self, key: &str, expected: &str, value: &Value) {
        let path = self.path(key);
        self.issue(
            path,
            format!("Expected {expected}, received {}", type_name(value)),
        );
    }

    fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
        obj.get(key).filter(|v| !v.is_null())
    }

    /// Run `f` with every reported path prefixed by `prefix`.
    pub(crate) fn nested(&mut self, prefix: &str, f: impl FnOnce(&mut Self)) {
        let previous = self.prefix.replace(self.path(prefix));
        f(self);
        self.prefix = previous;
    }

    /// The input itself must be an object.
    pub(crate) fn object<'a>(&mut self, input: &'a Value) -> Option<&'a Map<String, Value>> {
        match input {
            Value::Object(obj) => Some(obj),
            other => {
                let path = self.prefix.clone().unwrap_or_default();
                self.issue(
                    path,
                    format!("Expected object, received {}", type_name(other)),
                );
                None
            }
        }
    }

    pub(crate) fn required_string<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        key: &str,
    ) -> Option<&'a str> {
        match Self::field(obj, key) {
            None => {
                let path = self.path(key);
                self.issue(path, "Required");
                None
            }
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                self.mismatch(key, "string", other);
                None
            }
        }
    }

    pub(crate) fn optional_string<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        key: &str,
    ) -> Option<&'a str> {
        match Self::field(obj, key) {
            None => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                self.mismatch(key, "string", other);
                None
            }
        }
    }

    pub(crate) fn optional_bool(&mut self, obj: &Map<String, Value>, key: &str) {
        if let Some(value) = Self::field(obj, key) {
            if !value.is_boolean() {
                self.mismatch(key, "boolean", value);
            }
        }
    }

    pub(crate) fn optional_non_negative_integer(&mut self, obj: &Map<String, Value>, key: &str) {
        let Some(value) = Self::field(obj, key) else {
            return;
        };
        match value {
            Value::Number(n) if n.as_u64().is_some() => {}
            Value::Number(n) if n.as_i64().is_some() => {
                let path = self.path(key);
                self.issue(path, "Number must be greater than or equal to 0");
            }
            Value::Number(_) => {
                let path = self.path(key);
                self.issue(path, "Expected integer, received float");
            }
            other => self.mismatch(key, "number", other),
        }
    }

    pub(crate) fn optional_enum(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        allowed: &[&str],
    ) {
        let Some(value) = self.optional_string(obj, key) else {
            return;
        };
        if !allowed.contains(&value) {
            let expected = allowed
                .iter()
                .map(|a| format!("'{a}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            let path = self.path(key);
            self.issue(
                path,
                format!("Invalid enum value. Expected {expected}, received '{value}'"),
            );
        }
    }

    /// Object whose values are all strings.
    pub(crate) fn optional_string_map(&mut self, obj: &Map<String, Value>, key: &str) {
        let Some(value) = Self::field(obj, key) else {
            return;
        };
        let Value::Object(map) = value else {
            self.mismatch(key, "object", value);
            return;
        };
        self.nested(key, |v| {
            for (name, entry) in map {
                if !entry.is_string() {
                    v.mismatch(name, "string", entry);
                }
            }
        });
    }

    /// Optional nested object validated by `f`.
    pub(crate) fn optional_object(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        f: impl FnOnce(&mut Self, &Map<String, Value>),
    ) {
        let Some(value) = Self::field(obj, key) else {
            return;
        };
        let Value::Object(inner) = value else {
            self.mismatch(key, "object", value);
            return;
        };
        self.nested(key, |v| f(v, inner));
    }

    /// The value must parse as an absolute URL.
    pub(crate) fn absolute_url(&mut self, key: &str, value: &str) {
        if url::Url::parse(value).is_err() {
            let path = self.path(key);
            self.issue(path, "Invalid url");
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.issues))
        }
    }
}

/// Copy of `value` with `null` object fields removed at every depth.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Deserialize already-validated input.
pub(crate) fn deserialize<T: DeserializeOwned>(value: &Value) -> Result<T> {
    serde_json::from_value(without_nulls(value))
        .map_err(|e| Error::validation("", e.to_string()))
}
