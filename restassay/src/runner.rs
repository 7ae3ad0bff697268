use crate::{
    assertion::Assertion,
    data::ResponseEnvelope,
    error::{AssertionFailure, Error},
    executor::RequestExecutor,
    isolation::IsolationLocks,
    report::{Failure, ScenarioReport, ScenarioStatus},
    runner_configuration::RunnerConfiguration,
    scenario::{Scenario, Step},
    state::ScenarioState,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct StepError {
    error: Error,
    response: Option<ResponseEnvelope>,
}

impl From<Error> for StepError {
    fn from(error: Error) -> Self {
        Self {
            error,
            response: None,
        }
    }
}

/// Runs scenarios: steps of one scenario strictly in order, separate scenarios concurrently.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    executor: RequestExecutor,
    isolation: Arc<IsolationLocks>,
}

impl ScenarioRunner {
    pub fn new(configuration: &RunnerConfiguration) -> Self {
        Self {
            executor: configuration.executor(),
            isolation: Arc::new(IsolationLocks::new()),
        }
    }

    /// Shares `isolation` with other runners so their scenarios honor the same keys.
    pub fn with_isolation_locks(mut self, isolation: Arc<IsolationLocks>) -> Self {
        self.isolation = isolation;
        self
    }

    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let _guard = match scenario.key() {
            Some(key) => Some(self.isolation.acquire(key).await),
            None => None,
        };

        debug!(scenario = scenario.name(), from = %ScenarioStatus::Pending, to = %ScenarioStatus::Running, "scenario transition");
        info!(scenario = scenario.name(), steps = scenario.steps().len(), "running scenario");

        let report = self.run_steps(scenario).await;

        match &report.failure {
            None => info!(scenario = scenario.name(), "scenario passed"),
            Some(_) => warn!("{}", report),
        }

        report
    }

    /// Runs every scenario on its own task and returns the reports in input order.
    pub async fn run_all(&self, scenarios: Vec<Scenario>) -> Vec<ScenarioReport> {
        let handles = scenarios.into_iter().map(|scenario| {
            let runner = self.clone();
            let name = scenario.name().to_owned();
            let handle = tokio::spawn(async move { runner.run(&scenario).await });
            (name, handle)
        });
        let (names, handles): (Vec<_>, Vec<_>) = handles.unzip();

        futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(names)
            .map(|(joined, name)| match joined {
                Ok(report) => report,
                Err(e) => ScenarioReport::aborted(
                    name,
                    Error::Interrupted(format!("scenario task did not complete: {}", e)),
                ),
            })
            .collect()
    }

    async fn run_steps(&self, scenario: &Scenario) -> ScenarioReport {
        let mut state = scenario.initial_state().clone();

        for (index, step) in scenario.steps().iter().enumerate() {
            debug!(scenario = scenario.name(), step = index, "{}", step);

            if let Err(StepError { error, response }) = self.run_step(scenario, step, &mut state).await {
                let failure = Failure::from_error(Some(index), Some(step.to_string()), error, response);
                return ScenarioReport::stopped(scenario.name(), index, failure);
            }
        }

        ScenarioReport::passed(scenario.name(), scenario.steps().len())
    }

    async fn run_step(
        &self,
        scenario: &Scenario,
        step: &Step,
        state: &mut ScenarioState,
    ) -> Result<(), StepError> {
        let request = step.resolve(state)?;
        let spec = step.spec().unwrap_or_else(|| scenario.spec());
        let response = self.executor.execute(spec, &request).await?;

        let observed = |error: Error| StepError {
            error,
            response: Some(response.clone()),
        };

        if let Some(code) = step.expected_status() {
            Assertion::status(code)
                .check(&response, &serde_json::Value::Null, state)
                .map_err(observed)?;
        }

        let body = step
            .target()
            .decode(&response)
            .map_err(observed)?
            .to_value();

        for assertion in step.assertions() {
            assertion.check(&response, &body, state).map_err(observed)?;
        }

        for (name, pointer) in step.captures() {
            let value = body.pointer(pointer).cloned().ok_or_else(|| {
                observed(Error::Assertion(AssertionFailure {
                    description: format!("capture `{}` from `{}`", name, pointer),
                    expected: "present".into(),
                    actual: "absent".into(),
                }))
            })?;
            state.set(name.clone(), value);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::RequestData,
        decoder::Target,
        error::TransportErrorKind,
        http_client::HttpClient,
        report::FailureKind,
        request_specification::RequestSpecBuilder,
    };
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::{collections::VecDeque, sync::Mutex, time::Duration};

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Order {
        id: i64,
        pet_id: i64,
        status: String,
    }

    /// Answers requests from a queue and records what it was asked.
    #[derive(Debug, Default)]
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<ResponseEnvelope, Error>>>,
        requests: Mutex<Vec<RequestData>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<ResponseEnvelope, Error>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<RequestData> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn send(&self, request_data: &RequestData) -> Result<ResponseEnvelope, Error> {
            self.requests.lock().unwrap().push(request_data.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ResponseEnvelope::new(500, "script exhausted")))
        }
    }

    fn json_response(status: u16, body: serde_json::Value) -> Result<ResponseEnvelope, Error> {
        Ok(ResponseEnvelope::new(status, body.to_string()).with_header("content-type", "application/json"))
    }

    fn runner(client: Arc<ScriptedClient>) -> ScenarioRunner {
        let mut configuration = RunnerConfiguration::new();
        configuration.set_http_client(client);
        configuration.set_timeout(Duration::from_secs(5));
        ScenarioRunner::new(&configuration)
    }

    fn scenario(name: &str) -> Scenario {
        let spec = RequestSpecBuilder::new()
            .set_base_address("http://stub.local/v2")
            .build()
            .unwrap();
        Scenario::new(name, spec)
    }

    #[tokio::test]
    async fn empty_scenario_passes() {
        let client = ScriptedClient::new(vec![]);

        let report = runner(client.clone()).run(&scenario("empty")).await;

        assert_eq!(report.status, ScenarioStatus::Passed);
        assert_eq!(report.steps_run, 0);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn captured_value_feeds_later_steps() {
        let client = ScriptedClient::new(vec![
            json_response(200, json!({"id": 1986, "petId": 1234, "status": "placed"})),
            json_response(200, json!({"id": 1986, "petId": 1234, "status": "placed"})),
        ]);
        let scenario = scenario("order round trip")
            .step(
                Step::post("/store/order")
                    .body(json!({"id": 1986, "petId": 1234, "status": "placed"}))
                    .expect_status(200)
                    .decode(Target::resource::<Order>())
                    .capture("orderId", "id"),
            )
            .step(
                Step::get("/store/order/{orderId}")
                    .path_param("orderId", "{{orderId}}")
                    .expect_status(200)
                    .decode(Target::resource::<Order>())
                    .assert(Assertion::equals_state("/id", "orderId"))
                    .assert(Assertion::equals("/status", "placed")),
            );

        let report = runner(client.clone()).run(&scenario).await;

        assert!(report.is_passed(), "{}", report);
        assert_eq!(report.steps_run, 2);
        assert_eq!(client.requests()[1].url, "http://stub.local/v2/store/order/1986");
    }

    #[tokio::test]
    async fn failed_assertion_stops_the_scenario() {
        let client = ScriptedClient::new(vec![
            json_response(200, json!({"id": 6660})),
            json_response(200, json!({"code": 200, "type": "unknown", "message": "6660"})),
        ]);
        let scenario = scenario("fail fast")
            .step(
                Step::get("/store/order/1986")
                    .decode(Target::resource::<Order>())
                    .assert(Assertion::equals("/id", 1986)),
            )
            .step(Step::delete("/store/order/1986").expect_status(200));

        let report = runner(client.clone()).run(&scenario).await;

        assert_eq!(report.status, ScenarioStatus::Failed);
        assert_eq!(report.steps_run, 0);
        assert_eq!(client.requests().len(), 1);

        let failure = report.failure.unwrap();
        assert_eq!(failure.step_index, Some(0));
        assert_eq!(failure.kind, FailureKind::Assertion);
        assert_eq!(failure.expected.as_deref(), Some("1986"));
        assert_eq!(failure.actual.as_deref(), Some("6660"));
        assert_eq!(failure.response.unwrap().body, r#"{"id":6660}"#);
    }

    #[tokio::test]
    async fn unexpected_status_fails_before_decoding() {
        let client = ScriptedClient::new(vec![json_response(404, json!({"code": 1, "type": "error", "message": "Pet not found"}))]);
        let scenario = scenario("status").step(
            Step::get("/pet/1999")
                .expect_status(200)
                .decode(Target::list::<Order>()),
        );

        let failure = runner(client).run(&scenario).await.failure.unwrap();

        assert_eq!(failure.kind, FailureKind::Assertion);
        assert_eq!(failure.message, "status code");
        assert_eq!(failure.actual.as_deref(), Some("404"));
    }

    #[tokio::test]
    async fn shape_mismatch_fails_the_scenario() {
        let client = ScriptedClient::new(vec![json_response(200, json!({"id": 1}))]);
        let scenario = scenario("shape").step(Step::get("/pet/findByStatus").decode(Target::list::<Order>()));

        let report = runner(client).run(&scenario).await;

        assert_eq!(report.status, ScenarioStatus::Failed);
        assert_eq!(report.failure.unwrap().kind, FailureKind::Decode);
    }

    #[tokio::test]
    async fn transport_error_aborts_the_scenario() {
        let client = ScriptedClient::new(vec![Err(Error::Transport {
            kind: TransportErrorKind::ConnectFailure,
            message: "connection refused".into(),
        })]);
        let scenario = scenario("unreachable")
            .step(Step::get("/store/inventory"))
            .step(Step::get("/store/inventory"));

        let report = runner(client.clone()).run(&scenario).await;

        assert_eq!(report.status, ScenarioStatus::Aborted);
        assert_eq!(report.failure.unwrap().kind, FailureKind::Transport);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_state_aborts_without_io() {
        let client = ScriptedClient::new(vec![]);
        let scenario = scenario("no id").step(Step::get("/pet/{petId}").path_param("petId", "{{petId}}"));

        let report = runner(client.clone()).run(&scenario).await;

        assert_eq!(report.status, ScenarioStatus::Aborted);
        assert_eq!(report.failure.unwrap().kind, FailureKind::MalformedRequest);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_capture_fails_the_step() {
        let client = ScriptedClient::new(vec![json_response(200, json!({"id": 1}))]);
        let scenario = scenario("capture").step(
            Step::get("/store/order/1")
                .decode(Target::resource::<Order>())
                .capture("shipDate", "/shipDate"),
        );

        let failure = runner(client).run(&scenario).await.failure.unwrap();

        assert_eq!(failure.kind, FailureKind::Assertion);
        assert_eq!(failure.message, "capture `shipDate` from `/shipDate`");
    }

    #[tokio::test]
    async fn scenarios_do_not_share_state() {
        let client = ScriptedClient::new(vec![
            json_response(200, json!({"id": 5})),
        ]);
        let first = scenario("first").step(
            Step::get("/store/order/5")
                .decode(Target::resource::<Order>())
                .capture("orderId", "/id"),
        );
        let second = scenario("second").step(Step::get("/store/order/{{orderId}}"));
        let runner = runner(client.clone());

        assert!(runner.run(&first).await.is_passed());
        let report = runner.run(&second).await;

        assert_eq!(report.status, ScenarioStatus::Aborted);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn repeated_read_decodes_equal_values() {
        let body = json!({"id": 1986, "petId": 1234, "status": "placed", "extra": true});
        let client = ScriptedClient::new(vec![json_response(200, body.clone()), json_response(200, body)]);
        let scenario = scenario("idempotent read")
            .step(
                Step::get("/store/order/1986")
                    .decode(Target::resource::<Order>())
                    .capture("first", ""),
            )
            .step(
                Step::get("/store/order/1986")
                    .decode(Target::resource::<Order>())
                    .assert(Assertion::equals_state("", "first")),
            );

        let report = runner(client).run(&scenario).await;

        assert!(report.is_passed(), "{}", report);
    }

    #[tokio::test]
    async fn read_back_differing_from_creation_fails() {
        let client = ScriptedClient::new(vec![
            json_response(200, json!({"id": 1986, "petId": 1234, "status": "placed"})),
            json_response(200, json!({"id": 1986, "petId": 4321, "status": "placed"})),
        ]);
        let scenario = scenario("round trip")
            .step(
                Step::post("/store/order")
                    .body(json!({"id": 1986, "petId": 1234, "status": "placed"}))
                    .decode(Target::resource::<Order>())
                    .capture("createdOrder", ""),
            )
            .step(
                Step::get("/store/order/1986")
                    .decode(Target::resource::<Order>())
                    .assert(Assertion::equals_state("", "createdOrder")),
            );

        let report = runner(client).run(&scenario).await;

        assert_eq!(report.status, ScenarioStatus::Failed);
        let failure = report.failure.unwrap();
        assert_eq!(failure.step_index, Some(1));
        assert_eq!(failure.kind, FailureKind::Assertion);
        assert!(failure.actual.unwrap().contains("4321"));
    }

    #[derive(Debug)]
    struct PanickingClient;

    #[async_trait]
    impl HttpClient for PanickingClient {
        async fn send(&self, _request_data: &RequestData) -> Result<ResponseEnvelope, Error> {
            panic!("client crashed")
        }
    }

    #[tokio::test]
    async fn panicking_scenario_is_reported_as_interrupted() {
        let mut configuration = RunnerConfiguration::new();
        configuration.set_http_client(Arc::new(PanickingClient));
        let scenarios = vec![scenario("crash").step(Step::get("/store/inventory"))];

        let reports = ScenarioRunner::new(&configuration).run_all(scenarios).await;

        assert_eq!(reports[0].name, "crash");
        assert_eq!(reports[0].status, ScenarioStatus::Aborted);
        let failure = reports[0].failure.as_ref().unwrap();
        assert_eq!(failure.kind, FailureKind::Interrupted);
        assert!(failure.message.contains("did not complete"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_all_keeps_input_order() {
        let client = ScriptedClient::new(vec![]);
        let scenarios = vec![
            scenario("a").isolation_key("orders"),
            scenario("b").isolation_key("orders"),
            scenario("c"),
        ];

        let reports = runner(client).run_all(scenarios).await;

        let names: Vec<_> = reports.iter().map(|report| report.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(reports.iter().all(ScenarioReport::is_passed));
    }
}
