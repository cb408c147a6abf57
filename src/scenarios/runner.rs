use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{
    client::ApiClient,
    report::{Report, ReportSink, ReportStatus, Status, TestResult},
};

use super::{Scenario, Suite};

/// Results of one suite run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct SuiteSummary {
    pub results: Vec<TestResult>,
    pub elapsed: Duration,
    pub publish_failures: usize,
}

impl SuiteSummary {
    fn count(&self, status: Status) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.count(Status::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Status::Failed)
    }

    pub fn broken(&self) -> usize {
        self.count(Status::Broken)
    }

    pub fn is_success(&self) -> bool {
        self.passed() == self.total()
    }
}

impl Suite {
    /// Runs every scenario in order and publishes each result to `sink`. A sink
    /// that cannot write is logged and counted; it never changes a scenario's
    /// status.
    pub async fn run(&self, client: &ApiClient, env_name: &str, sink: &dyn ReportSink) -> SuiteSummary {
        let started = Instant::now();
        let mut summary = SuiteSummary {
            results: Vec::with_capacity(self.len()),
            ..SuiteSummary::default()
        };

        for scenario in self.scenarios() {
            let result = run_scenario(scenario, client, env_name).await;
            if let Err(err) = sink.publish(&result) {
                warn!(scenario = %result.name, error = %err, "failed to publish result");
                summary.publish_failures += 1;
            }
            summary.results.push(result);
        }

        summary.elapsed = started.elapsed();
        info!(
            total = summary.total(),
            passed = summary.passed(),
            failed = summary.failed(),
            broken = summary.broken(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "suite finished"
        );
        summary
    }
}

pub async fn run_scenario(scenario: &Scenario, client: &ApiClient, env_name: &str) -> TestResult {
    let report = Report::new(&scenario.name).with_full_name(scenario.full_name());
    report.label("epic", scenario.epic);
    report.label("feature", scenario.feature);
    for tag in scenario.tags {
        report.label("tag", *tag);
    }
    report.label("env", env_name);

    info!(scenario = %scenario.name, env = env_name, "scenario started");
    let (status, message) = match scenario.execute(client, &report).await {
        Ok(()) => (Status::Passed, None),
        Err(err) => (err.report_status(), Some(err.to_string())),
    };

    match &message {
        None => info!(scenario = %scenario.name, "scenario passed"),
        Some(message) => warn!(
            scenario = %scenario.name,
            status = status.as_str(),
            %message,
            "scenario did not pass"
        ),
    }

    report.finish(status, message)
}
