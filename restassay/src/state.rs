use crate::error::Error;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex =
        Regex::new(r"\{\{\s*(?P<name>[A-Za-z0-9_.\-]+)\s*\}\}").unwrap();
}

/// Values handed from earlier steps of a scenario to later ones, by logical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioState {
    values: HashMap<String, Value>,
}

impl ScenarioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<S: Into<String>, V: Into<Value>>(&mut self, name: S, value: V) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<&Value, Error> {
        self.get(name).ok_or_else(|| {
            Error::MalformedRequest(format!("scenario state has no value named `{}`", name))
        })
    }

    /// Replaces every `{{name}}` in `input` with the textual form of the named value.
    pub fn interpolate(&self, input: &str) -> Result<String, Error> {
        let mut missing = None;
        let result = PLACEHOLDER_REGEX.replace_all(input, |captures: &Captures| {
            let name = &captures["name"];
            match self.get(name) {
                Some(value) => to_text(value),
                None => {
                    missing.get_or_insert_with(|| name.to_owned());
                    String::new()
                }
            }
        });

        match missing {
            Some(name) => Err(Error::MalformedRequest(format!(
                "scenario state has no value named `{}`",
                name
            ))),
            None => Ok(result.into_owned()),
        }
    }

    /// Resolves placeholders inside a JSON document. A string that is exactly one placeholder
    /// takes the stored value with its JSON type; other strings are interpolated as text.
    pub fn resolve(&self, value: &Value) -> Result<Value, Error> {
        Ok(match value {
            Value::String(text) => match whole_placeholder(text) {
                Some(name) => self.lookup(name)?.clone(),
                None => Value::String(self.interpolate(text)?),
            },
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, item)| Ok((key.clone(), self.resolve(item)?)))
                    .collect::<Result<_, Error>>()?,
            ),
            other => other.clone(),
        })
    }
}

fn whole_placeholder(text: &str) -> Option<&str> {
    let captures = PLACEHOLDER_REGEX.captures(text)?;
    let whole = captures.get(0)?;
    if whole.start() == 0 && whole.end() == text.len() {
        captures.name("name").map(|name| name.as_str())
    } else {
        None
    }
}

pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
