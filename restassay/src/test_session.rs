use crate::{
    error::Error, isolation::IsolationLocks, report::ScenarioReport, runner::ScenarioRunner,
    runner_configuration::RunnerConfiguration, scenario::Scenario,
};
use lazy_static::lazy_static;
use std::sync::{Arc, Once};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

static INITIALIZE_LOGGING: Once = Once::new();

lazy_static! {
    static ref ISOLATION_LOCKS: Arc<IsolationLocks> = Arc::new(IsolationLocks::new());
}

/// Blocking entry point for test harnesses. Every scenario run through a session shares one
/// process-wide set of isolation locks, so separate `#[test]` functions honor the same keys.
pub struct TestSession;

impl TestSession {
    pub fn init_logging() {
        INITIALIZE_LOGGING.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_test_writer()
                .try_init();
        });
    }

    pub fn isolation_locks() -> Arc<IsolationLocks> {
        ISOLATION_LOCKS.clone()
    }

    /// Runs `scenario` to completion. `name` labels the report when the scenario could not be built.
    pub fn run(
        name: &str,
        configuration: RunnerConfiguration,
        scenario: Result<Scenario, Error>,
    ) -> ScenarioReport {
        Self::init_logging();

        let scenario = match scenario {
            Ok(scenario) => scenario,
            Err(error) => return ScenarioReport::aborted(name, error),
        };

        let runtime = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                return ScenarioReport::aborted(
                    scenario.name(),
                    Error::Configuration(format!("could not start a runtime: {}", e)),
                )
            }
        };

        let runner = ScenarioRunner::new(&configuration).with_isolation_locks(Self::isolation_locks());
        runtime.block_on(runner.run(&scenario))
    }
}
