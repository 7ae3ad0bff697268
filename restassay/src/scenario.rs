use crate::{
    assertion::{json_pointer, Assertion},
    decoder::Target,
    error::Error,
    executor::{HttpRequest, Method},
    request_specification::RequestSpecification,
    state::ScenarioState,
};
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Build request, execute, decode, assert. Parameters, headers and body may name
/// scenario state with `{{name}}` placeholders.
#[derive(Debug, Clone)]
pub struct Step {
    request: HttpRequest,
    spec: Option<Arc<RequestSpecification>>,
    expected_status: Option<u16>,
    target: Target,
    assertions: Vec<Assertion>,
    captures: Vec<(String, String)>,
}

impl Step {
    pub fn new<S: Into<String>>(method: Method, path_template: S) -> Self {
        Self {
            request: HttpRequest::new(method, path_template),
            spec: None,
            expected_status: None,
            target: Target::none(),
            assertions: Vec::new(),
            captures: Vec::new(),
        }
    }

    pub fn get<S: Into<String>>(path_template: S) -> Self {
        Self::new(Method::Get, path_template)
    }

    pub fn post<S: Into<String>>(path_template: S) -> Self {
        Self::new(Method::Post, path_template)
    }

    pub fn put<S: Into<String>>(path_template: S) -> Self {
        Self::new(Method::Put, path_template)
    }

    pub fn delete<S: Into<String>>(path_template: S) -> Self {
        Self::new(Method::Delete, path_template)
    }

    pub fn path_param<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.request = self.request.path_param(name, value);
        self
    }

    pub fn query_param<S1: Into<String>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.request = self.request.query_param(name, value);
        self
    }

    pub fn header<S1: AsRef<str>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    pub fn body<V: Into<Value>>(mut self, body: V) -> Self {
        self.request = self.request.body(body);
        self
    }

    /// Sends this step through `spec` instead of the scenario's specification.
    pub fn with_spec(mut self, spec: Arc<RequestSpecification>) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn expect_status(mut self, code: u16) -> Self {
        self.expected_status = Some(code);
        self
    }

    pub fn decode(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Stores the decoded value at `pointer` in scenario state as `name`.
    pub fn capture<S1: Into<String>, S2: AsRef<str>>(mut self, name: S1, pointer: S2) -> Self {
        self.captures
            .push((name.into(), json_pointer(pointer.as_ref())));
        self
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn spec(&self) -> Option<&Arc<RequestSpecification>> {
        self.spec.as_ref()
    }

    pub fn expected_status(&self) -> Option<u16> {
        self.expected_status
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn captures(&self) -> &[(String, String)] {
        &self.captures
    }

    /// The request with every state placeholder substituted.
    pub fn resolve(&self, state: &ScenarioState) -> Result<HttpRequest, Error> {
        let request = &self.request;
        let resolve_pairs = |pairs: &[(String, String)]| -> Result<Vec<(String, String)>, Error> {
            pairs
                .iter()
                .map(|(name, value)| Ok((name.clone(), state.interpolate(value)?)))
                .collect()
        };

        let mut headers = request.headers.clone();
        for (name, value) in request.headers.iter() {
            headers.insert(name, state.interpolate(value)?);
        }

        Ok(HttpRequest {
            method: request.method,
            path_template: state.interpolate(&request.path_template)?,
            path_params: resolve_pairs(&request.path_params)?,
            query_params: resolve_pairs(&request.query_params)?,
            headers,
            body: match &request.body {
                Some(body) => Some(state.resolve(body)?),
                None => None,
            },
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.request.method, self.request.path_template)
    }
}

/// An ordered list of dependent steps verifying one multi-call contract.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    spec: Arc<RequestSpecification>,
    isolation_key: Option<String>,
    seed: ScenarioState,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new<S: Into<String>>(name: S, spec: Arc<RequestSpecification>) -> Self {
        Self {
            name: name.into(),
            spec,
            isolation_key: None,
            seed: ScenarioState::new(),
            steps: Vec::new(),
        }
    }

    /// Scenarios sharing a key never run at the same time.
    pub fn isolation_key<S: Into<String>>(mut self, key: S) -> Self {
        self.isolation_key = Some(key.into());
        self
    }

    /// Seeds the scenario state before the first step runs.
    pub fn with_value<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Self {
        self.seed.set(name, value);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &Arc<RequestSpecification> {
        &self.spec
    }

    pub fn key(&self) -> Option<&str> {
        self.isolation_key.as_deref()
    }

    pub fn initial_state(&self) -> &ScenarioState {
        &self.seed
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
