mod assertion;
mod data;
mod decoder;
mod error;
mod executor;
mod http_client;
mod isolation;
mod report;
mod request_specification;
mod runner;
mod runner_configuration;
mod scenario;
mod state;
mod test_session;
mod util;

pub use assertion::{Assertion, Expected};
pub use data::{Headers, RequestData, ResponseEnvelope};
pub use decoder::{DecodedBody, ErrorEnvelope, Target};
pub use error::{AssertionFailure, DecodeErrorKind, Error, TransportErrorKind};
pub use executor::{prepare, HttpRequest, Method, RequestExecutor, DEFAULT_TIMEOUT};
pub use http_client::{HttpClient, HyperHttpClient};
pub use isolation::IsolationLocks;
pub use report::{Failure, FailureKind, ScenarioReport, ScenarioStatus};
pub use request_specification::{ContentType, RequestSpecBuilder, RequestSpecification};
pub use restassay_codegen::scenario_test;
pub use runner::ScenarioRunner;
pub use runner_configuration::RunnerConfiguration;
pub use scenario::{Scenario, Step};
pub use state::ScenarioState;
pub use test_session::TestSession;

pub use async_trait::async_trait;
