#[cfg(test)]
mod petstore_stub;

#[cfg(test)]
mod tests {
    use crate::petstore_stub;
    use petstore_contract::{scenarios, PetstoreSpecs};
    use restassay::{
        scenario_test, Error, FailureKind, RunnerConfiguration, Scenario, ScenarioRunner,
        ScenarioStatus, TestSession,
    };
    use std::{env, time::Duration};

    const DEFAULT_INVENTORY_CATEGORIES: usize = 3;

    /// `PETSTORE_BASE_URI` points the suite at a live service; otherwise the in-process stub answers.
    fn base_address() -> String {
        env::var("PETSTORE_BASE_URI").unwrap_or_else(|_| petstore_stub::base_address())
    }

    fn inventory_categories() -> usize {
        env::var("PETSTORE_INVENTORY_CATEGORIES")
            .ok()
            .and_then(|count| count.parse().ok())
            .unwrap_or(DEFAULT_INVENTORY_CATEGORIES)
    }

    fn specs() -> Result<PetstoreSpecs, Error> {
        PetstoreSpecs::new(base_address())
    }

    fn configure(config: &mut RunnerConfiguration) {
        config.set_timeout(Duration::from_secs(10));
    }

    #[scenario_test(configure)]
    fn order_lifecycle() -> Result<Scenario, Error> {
        scenarios::order_lifecycle(&specs()?)
    }

    #[scenario_test(configure)]
    fn delete_missing_order() -> Result<Scenario, Error> {
        scenarios::delete_missing_order(&specs()?)
    }

    #[scenario_test(configure)]
    fn store_inventory() -> Result<Scenario, Error> {
        scenarios::inventory(&specs()?, inventory_categories())
    }

    #[scenario_test(configure)]
    fn pet_lifecycle() -> Result<Scenario, Error> {
        scenarios::pet_lifecycle(&specs()?)
    }

    #[scenario_test(configure)]
    fn find_missing_pet() -> Result<Scenario, Error> {
        scenarios::find_missing_pet(&specs()?)
    }

    #[scenario_test(configure)]
    fn update_missing_pet() -> Result<Scenario, Error> {
        scenarios::update_missing_pet(&specs()?)
    }

    #[scenario_test(configure)]
    fn user_lifecycle() -> Result<Scenario, Error> {
        scenarios::user_lifecycle(&specs()?)
    }

    #[scenario_test]
    fn find_missing_user() -> Result<Scenario, Error> {
        scenarios::find_missing_user(&specs()?)
    }

    #[test]
    fn all_scenarios_run_concurrently() {
        TestSession::init_logging();

        let mut configuration = RunnerConfiguration::default();
        configure(&mut configuration);
        let runner =
            ScenarioRunner::new(&configuration).with_isolation_locks(TestSession::isolation_locks());
        let all = scenarios::all(&specs().unwrap(), inventory_categories()).unwrap();
        let names: Vec<String> = all.iter().map(|scenario| scenario.name().to_owned()).collect();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let reports = runtime.block_on(runner.run_all(all));

        assert_eq!(
            reports.iter().map(|report| report.name.clone()).collect::<Vec<_>>(),
            names
        );
        for report in reports {
            assert!(report.is_passed(), "{}", report);
        }
    }

    #[test]
    fn unreachable_service_aborts() {
        let mut configuration = RunnerConfiguration::default();
        configuration.set_timeout(Duration::from_secs(5));

        let report = TestSession::run(
            "unreachable_service_aborts",
            configuration,
            PetstoreSpecs::new("http://127.0.0.1:1/v2")
                .and_then(|specs| scenarios::find_missing_user(&specs)),
        );

        assert_eq!(report.status, ScenarioStatus::Aborted);
        let failure = report.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.step_index, Some(0));
        assert!(failure.response.is_none());
    }

    #[test]
    fn unbuildable_scenario_aborts_without_running() {
        let report = TestSession::run(
            "unbuildable_scenario_aborts_without_running",
            RunnerConfiguration::default(),
            PetstoreSpecs::new("not a base address").and_then(|specs| scenarios::order_lifecycle(&specs)),
        );

        assert_eq!(report.status, ScenarioStatus::Aborted);
        assert_eq!(report.name, "unbuildable_scenario_aborts_without_running");
        assert_eq!(report.steps_run, 0);
        assert_eq!(report.failure.unwrap().kind, FailureKind::Configuration);
    }
}
