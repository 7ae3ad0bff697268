use crate::{
    data::ResponseEnvelope,
    error::{AssertionFailure, Error},
    state::{to_text, ScenarioState},
};
use serde_json::Value;

/// Right-hand side of a comparison: a literal or a value captured earlier in the scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Literal(Value),
    State(String),
}

impl Expected {
    fn resolve<'a>(&'a self, state: &'a ScenarioState) -> Result<&'a Value, AssertionFailure> {
        match self {
            Expected::Literal(value) => Ok(value),
            Expected::State(name) => state.get(name).ok_or_else(|| AssertionFailure {
                description: format!("scenario state `{}`", name),
                expected: "a captured value".into(),
                actual: "nothing captured".into(),
            }),
        }
    }
}

/// A pure observation over one response and its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    StatusCode(u16),
    HeaderPresent(String),
    HeaderContains { name: String, needle: String },
    FieldEquals { pointer: String, expected: Expected },
    FieldContains { pointer: String, needle: String },
    EveryElement { pointer: String, expected: Expected },
    Size(usize),
}

impl Assertion {
    pub fn status(code: u16) -> Self {
        Assertion::StatusCode(code)
    }

    pub fn header_present<S: Into<String>>(name: S) -> Self {
        Assertion::HeaderPresent(name.into())
    }

    pub fn header_contains<S1: Into<String>, S2: Into<String>>(name: S1, needle: S2) -> Self {
        Assertion::HeaderContains {
            name: name.into(),
            needle: needle.into(),
        }
    }

    pub fn equals<S: AsRef<str>, V: Into<Value>>(pointer: S, expected: V) -> Self {
        Assertion::FieldEquals {
            pointer: json_pointer(pointer.as_ref()),
            expected: Expected::Literal(expected.into()),
        }
    }

    pub fn equals_state<S1: AsRef<str>, S2: Into<String>>(pointer: S1, name: S2) -> Self {
        Assertion::FieldEquals {
            pointer: json_pointer(pointer.as_ref()),
            expected: Expected::State(name.into()),
        }
    }

    pub fn contains<S1: AsRef<str>, S2: Into<String>>(pointer: S1, needle: S2) -> Self {
        Assertion::FieldContains {
            pointer: json_pointer(pointer.as_ref()),
            needle: needle.into(),
        }
    }

    pub fn every<S: AsRef<str>, V: Into<Value>>(pointer: S, expected: V) -> Self {
        Assertion::EveryElement {
            pointer: json_pointer(pointer.as_ref()),
            expected: Expected::Literal(expected.into()),
        }
    }

    pub fn every_state<S1: AsRef<str>, S2: Into<String>>(pointer: S1, name: S2) -> Self {
        Assertion::EveryElement {
            pointer: json_pointer(pointer.as_ref()),
            expected: Expected::State(name.into()),
        }
    }

    pub fn size(expected: usize) -> Self {
        Assertion::Size(expected)
    }

    /// Evaluates the assertion. Never mutates anything.
    pub fn check(
        &self,
        response: &ResponseEnvelope,
        body: &Value,
        state: &ScenarioState,
    ) -> Result<(), Error> {
        self.evaluate(response, body, state).map_err(Error::Assertion)
    }

    fn evaluate(
        &self,
        response: &ResponseEnvelope,
        body: &Value,
        state: &ScenarioState,
    ) -> Result<(), AssertionFailure> {
        match self {
            Assertion::StatusCode(code) => expect(
                response.status_code == *code,
                "status code",
                code,
                response.status_code,
            ),
            Assertion::HeaderPresent(name) => expect(
                response.headers.contains(name),
                format!("header `{}`", name),
                "present",
                "absent",
            ),
            Assertion::HeaderContains { name, needle } => {
                let actual = response.headers.get(name);
                expect(
                    actual.map(|value| value.contains(needle.as_str())).unwrap_or(false),
                    format!("header `{}`", name),
                    format!("containing {:?}", needle),
                    actual.map(|value| format!("{:?}", value)).unwrap_or_else(|| "absent".into()),
                )
            }
            Assertion::FieldEquals { pointer, expected } => {
                let expected = expected.resolve(state)?;
                let actual = field(body, pointer)?;
                expect(
                    values_match(actual, expected),
                    format!("field `{}`", pointer),
                    expected,
                    actual,
                )
            }
            Assertion::FieldContains { pointer, needle } => {
                let actual = field(body, pointer)?;
                expect(
                    to_text(actual).contains(needle.as_str()),
                    format!("field `{}`", pointer),
                    format!("containing {:?}", needle),
                    actual,
                )
            }
            Assertion::EveryElement { pointer, expected } => {
                let expected = expected.resolve(state)?;
                let items = body.as_array().ok_or_else(|| AssertionFailure {
                    description: format!("every element's `{}`", pointer),
                    expected: "a list".into(),
                    actual: body.to_string(),
                })?;

                for (index, item) in items.iter().enumerate() {
                    let actual = field(item, pointer)?;
                    expect(
                        values_match(actual, expected),
                        format!("element {} field `{}`", index, pointer),
                        expected,
                        actual,
                    )?;
                }
                Ok(())
            }
            Assertion::Size(size) => {
                let actual = match body {
                    Value::Array(items) => Some(items.len()),
                    Value::Object(fields) => Some(fields.len()),
                    _ => None,
                };
                expect(
                    actual == Some(*size),
                    "size",
                    size,
                    actual.map(|len| len.to_string()).unwrap_or_else(|| body.to_string()),
                )
            }
        }
    }
}

fn expect<D: Into<String>, E: ToString, A: ToString>(
    holds: bool,
    description: D,
    expected: E,
    actual: A,
) -> Result<(), AssertionFailure> {
    if holds {
        Ok(())
    } else {
        Err(AssertionFailure {
            description: description.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

fn field<'a>(body: &'a Value, pointer: &str) -> Result<&'a Value, AssertionFailure> {
    body.pointer(pointer).ok_or_else(|| AssertionFailure {
        description: format!("field `{}`", pointer),
        expected: "present".into(),
        actual: "absent".into(),
    })
}

/// Accepts `tags/0/name` as shorthand for the JSON pointer `/tags/0/name`.
pub(crate) fn json_pointer(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{}", path)
    }
}

/// Structural equality, except that a string matches a scalar with the same text.
fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(text), other @ (Value::Number(_) | Value::Bool(_)))
        | (other @ (Value::Number(_) | Value::Bool(_)), Value::String(text)) => {
            *text == to_text(other)
        }
        _ => actual == expected,
    }
}
