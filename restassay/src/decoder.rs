use crate::{
    data::ResponseEnvelope,
    error::{DecodeErrorKind, Error},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{any, collections::BTreeMap, fmt};
use url::form_urlencoded;

/// The `{code, type, message}` descriptor the remote service answers with when it has no resource to return.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorEnvelope {
    pub code: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// A response body interpreted according to a [`Target`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    Resource(Value),
    List(Vec<Value>),
    Error(ErrorEnvelope),
    Counts(BTreeMap<String, i64>),
    Text(String),
    Empty,
}

impl DecodedBody {
    /// Uniform JSON view used by assertions and captures.
    pub fn to_value(&self) -> Value {
        match self {
            DecodedBody::Resource(value) => value.clone(),
            DecodedBody::List(items) => Value::Array(items.clone()),
            DecodedBody::Error(envelope) => serde_json::json!({
                "code": envelope.code,
                "type": envelope.kind,
                "message": envelope.message,
            }),
            DecodedBody::Counts(counts) => Value::Object(
                counts
                    .iter()
                    .map(|(key, count)| (key.clone(), Value::from(*count)))
                    .collect(),
            ),
            DecodedBody::Text(text) => Value::String(text.clone()),
            DecodedBody::Empty => Value::Null,
        }
    }

    /// Recovers the typed resource from a `Resource` body.
    pub fn resource<T: DeserializeOwned>(&self) -> Result<T, Error> {
        match self {
            DecodedBody::Resource(value) => from_value(value.clone()),
            other => Err(shape_mismatch("a single resource", other.shape())),
        }
    }

    /// Recovers the typed resources from a `List` body.
    pub fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        match self {
            DecodedBody::List(items) => items.iter().cloned().map(from_value).collect(),
            other => Err(shape_mismatch("a list", other.shape())),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            DecodedBody::Resource(_) => "a single resource",
            DecodedBody::List(_) => "a list",
            DecodedBody::Error(_) => "an error envelope",
            DecodedBody::Counts(_) => "a count map",
            DecodedBody::Text(_) => "text",
            DecodedBody::Empty => "nothing",
        }
    }
}

type Normalizer = fn(Value) -> Result<Value, serde_json::Error>;

fn normalize<T: DeserializeOwned + Serialize>(value: Value) -> Result<Value, serde_json::Error> {
    serde_json::to_value(serde_json::from_value::<T>(value)?)
}

/// What a step expects the response body to be.
#[derive(Clone, Copy)]
pub enum Target {
    Resource {
        type_name: &'static str,
        normalize: Normalizer,
    },
    List {
        type_name: &'static str,
        normalize: Normalizer,
    },
    ErrorEnvelope,
    Counts,
    Text,
    None,
}

impl Target {
    pub fn resource<T: DeserializeOwned + Serialize>() -> Self {
        Target::Resource {
            type_name: short_type_name::<T>(),
            normalize: normalize::<T>,
        }
    }

    pub fn list<T: DeserializeOwned + Serialize>() -> Self {
        Target::List {
            type_name: short_type_name::<T>(),
            normalize: normalize::<T>,
        }
    }

    pub fn error_envelope() -> Self {
        Target::ErrorEnvelope
    }

    pub fn counts() -> Self {
        Target::Counts
    }

    pub fn text() -> Self {
        Target::Text
    }

    pub fn none() -> Self {
        Target::None
    }

    /// Interprets the body of `envelope`. Unknown fields are dropped and absent ones defaulted
    /// by the target type, so the same bytes always decode to equal values.
    ///
    /// # Errors
    /// `Error::Decode` with `ShapeMismatch` when an object arrives for a list target or the
    /// other way round, and with `MalformedBody` when the body cannot be read as the target.
    pub fn decode(&self, envelope: &ResponseEnvelope) -> Result<DecodedBody, Error> {
        match self {
            Target::Text => Ok(DecodedBody::Text(envelope.body.clone())),
            Target::None => Ok(DecodedBody::Empty),
            Target::Resource { normalize, .. } => match body_value(envelope)? {
                value @ Value::Object(_) => Ok(DecodedBody::Resource(normalize(value).map_err(malformed)?)),
                other => Err(shape_mismatch("a single resource", json_shape(&other))),
            },
            Target::List { normalize, .. } => match body_value(envelope)? {
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| normalize(item).map_err(malformed))
                    .collect::<Result<_, _>>()
                    .map(DecodedBody::List),
                other => Err(shape_mismatch("a list", json_shape(&other))),
            },
            Target::ErrorEnvelope => match body_value(envelope)? {
                value @ Value::Object(_) => from_value(value).map(DecodedBody::Error),
                other => Err(shape_mismatch("an error envelope", json_shape(&other))),
            },
            Target::Counts => match body_value(envelope)? {
                value @ Value::Object(_) => from_value(value).map(DecodedBody::Counts),
                other => Err(shape_mismatch("a count map", json_shape(&other))),
            },
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Resource { type_name, .. } => write!(f, "Resource<{}>", type_name),
            Target::List { type_name, .. } => write!(f, "List<{}>", type_name),
            Target::ErrorEnvelope => write!(f, "ErrorEnvelope"),
            Target::Counts => write!(f, "Counts"),
            Target::Text => write!(f, "Text"),
            Target::None => write!(f, "None"),
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

fn body_value(envelope: &ResponseEnvelope) -> Result<Value, Error> {
    let is_form = envelope
        .content_type()
        .map(|content_type| content_type.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        let fields: Map<String, Value> = form_urlencoded::parse(envelope.body.as_bytes())
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect();
        return Ok(Value::Object(fields));
    }

    if envelope.body.trim().is_empty() {
        return Err(Error::decode(
            DecodeErrorKind::MalformedBody,
            "response body is empty",
        ));
    }

    serde_json::from_str(&envelope.body).map_err(malformed)
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(malformed)
}

fn malformed(e: serde_json::Error) -> Error {
    Error::decode(DecodeErrorKind::MalformedBody, e.to_string())
}

fn shape_mismatch(expected: &str, actual: &str) -> Error {
    Error::decode(
        DecodeErrorKind::ShapeMismatch,
        format!("expected {}, got {}", expected, actual),
    )
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
