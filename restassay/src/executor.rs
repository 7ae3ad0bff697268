use crate::{
    data::{Headers, RequestData, ResponseEnvelope},
    error::{Error, TransportErrorKind},
    http_client::HttpClient,
    request_specification::{ContentType, RequestSpecification},
    state::to_text,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::{fmt, sync::Arc, time::Duration};
use tracing::debug;
use url::form_urlencoded;

lazy_static! {
    static ref PATH_PARAM_REGEX: Regex = Regex::new(r"\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    pub fn carries_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against a [`RequestSpecification`]: method, path template and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path_template: String,
    pub path_params: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub headers: Headers,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new<S: Into<String>>(method: Method, path_template: S) -> Self {
        Self {
            method,
            path_template: path_template.into(),
            path_params: Vec::new(),
            query_params: Vec::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn path_param<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    pub fn query_param<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    pub fn header<S1: AsRef<str>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body<V: Into<Value>>(mut self, body: V) -> Self {
        self.body = Some(body.into());
        self
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues exactly one round trip per call and never retries.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http_client: Arc<dyn HttpClient + Send + Sync>,
    timeout: Duration,
}

impl RequestExecutor {
    pub fn new(http_client: Arc<dyn HttpClient + Send + Sync>, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Executes `request` against `spec`. Non-2xx responses are returned as envelopes.
    ///
    /// # Errors
    /// `Error::MalformedRequest` before any I/O when the request cannot be built,
    /// `Error::Transport` when the round trip itself fails or exceeds the timeout.
    pub async fn execute(
        &self,
        spec: &RequestSpecification,
        request: &HttpRequest,
    ) -> Result<ResponseEnvelope, Error> {
        let request_data = prepare(spec, request)?;

        debug!(
            method = %request_data.method,
            url = %request_data.url,
            body = request_data.body.as_deref().unwrap_or(""),
            "sending request"
        );

        let response = match tokio::time::timeout(self.timeout, self.http_client.send(&request_data)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::transport(
                    TransportErrorKind::Timeout,
                    format!(
                        "{} {} got no response within {:?}",
                        request_data.method, request_data.url, self.timeout
                    ),
                ))
            }
        };

        debug!(
            status = response.status_code,
            body = response.body.as_str(),
            "received response"
        );

        Ok(response)
    }
}

/// Builds the wire form of `request`. Pure: performs no I/O.
pub fn prepare(spec: &RequestSpecification, request: &HttpRequest) -> Result<RequestData, Error> {
    let segments = expand_path(&request.path_template, &request.path_params)?;
    let mut url = spec.base_address().clone();
    url.path_segments_mut()
        .map_err(|_| Error::MalformedRequest(format!("{} cannot carry a path", spec.base_address())))?
        .pop_if_empty()
        .extend(&segments);

    let content_type = spec.content_type();
    let form_body = content_type == ContentType::FormUrlEncoded && request.method.carries_body();

    let mut query: Vec<(String, String)> = spec.default_query().to_vec();
    if !form_body {
        query.extend(request.query_params.iter().cloned());
        if content_type == ContentType::FormUrlEncoded {
            query.extend(form_fields(request.body.as_ref())?);
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    let body = if form_body {
        encode_form(&request.query_params, request.body.as_ref())?
    } else {
        match &request.body {
            Some(body) if content_type == ContentType::Json => Some(serde_json::to_string(body)?),
            _ => None,
        }
    };

    let mut headers = spec.default_headers().clone();
    if content_type == ContentType::Json {
        headers.insert("accept", content_type.mime());
    }
    if body.is_some() {
        headers.insert("content-type", content_type.mime());
    }
    for (name, value) in request.headers.iter() {
        headers.insert(name, value.clone());
    }

    Ok(RequestData {
        method: request.method.as_str().to_owned(),
        url: url.into(),
        headers,
        body,
    })
}

/// Expands `{name}` placeholders segment by segment. Each value stays inside its own segment
/// once the URL encodes it, so `/`, `?` and `#` in a value never reshape the request.
fn expand_path(template: &str, params: &[(String, String)]) -> Result<Vec<String>, Error> {
    let mut missing = Vec::new();
    let segments = template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            PATH_PARAM_REGEX
                .replace_all(segment, |captures: &regex::Captures| {
                    let name = &captures["name"];
                    match params.iter().rev().find(|(key, _)| key == name) {
                        Some((_, value)) => value.clone(),
                        None => {
                            missing.push(name.to_owned());
                            String::new()
                        }
                    }
                })
                .into_owned()
        })
        .collect();

    if missing.is_empty() {
        Ok(segments)
    } else {
        Err(Error::MalformedRequest(format!(
            "path {} has no value for {}",
            template,
            missing.join(", ")
        )))
    }
}

/// Top-level fields of a form body as name/value pairs. Null fields are left out.
fn form_fields(body: Option<&Value>) -> Result<Vec<(String, String)>, Error> {
    match body {
        None => Ok(Vec::new()),
        Some(Value::Object(fields)) => Ok(fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), to_text(value)))
            .collect()),
        Some(other) => Err(Error::MalformedRequest(format!(
            "form-encoded body must be an object, got {}",
            other
        ))),
    }
}

fn encode_form(params: &[(String, String)], body: Option<&Value>) -> Result<Option<String>, Error> {
    let fields = form_fields(body)?;
    if params.is_empty() && fields.is_empty() {
        return Ok(None);
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(params.iter().chain(fields.iter()));
    Ok(Some(serializer.finish()))
}
