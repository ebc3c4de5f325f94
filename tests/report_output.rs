// tests/report_output.rs

use std::collections::BTreeMap;
use std::error::Error;
use std::time::Duration;

use serde_json::{json, Value};

use testdag::dag::{CancelReason, Cause, FailureCause, SkipCause, UnitState};
use testdag::report::{
    JsonReport, OutputFormat, ReportWriter, RunResult, RunStatus, Summary, UnitRecord,
};

type TestResult = Result<(), Box<dyn Error>>;

fn record(state: UnitState, ran_ms: Option<(u64, u64)>, cause: Option<Cause>) -> UnitRecord {
    UnitRecord {
        state,
        start_tick: ran_ms.map(|_| 1),
        end_tick: Some(2),
        started_at: ran_ms.map(|(s, _)| Duration::from_millis(s)),
        finished_at: ran_ms.map(|(_, e)| Duration::from_millis(e)),
        cause,
    }
}

fn mixed_result() -> RunResult {
    let mut units = BTreeMap::new();
    units.insert(
        "Login".to_string(),
        record(UnitState::Passed, Some((0, 120)), None),
    );
    units.insert(
        "Collection".to_string(),
        record(
            UnitState::Failed,
            Some((120, 170)),
            Some(Cause::Failed(FailureCause::ExitCode { code: 2 })),
        ),
    );
    units.insert(
        "Order".to_string(),
        record(
            UnitState::Skipped,
            None,
            Some(Cause::Skipped(SkipCause::DependencyFailed {
                unit: "Collection".to_string(),
            })),
        ),
    );

    RunResult {
        units,
        total_duration: Duration::from_millis(175),
        cancelled: None,
    }
}

fn render(format: OutputFormat, summary: &Summary) -> Result<String, Box<dyn Error>> {
    let mut buf = Vec::new();
    ReportWriter::new(format).write(&JsonReport::from(summary), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

#[test]
fn summary_counts_and_status() {
    let summary = Summary::finalize(&mixed_result());

    assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 1, 1));
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.status, RunStatus::Failed);
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(
        summary.units.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        vec!["Collection", "Login", "Order"]
    );
    assert_eq!(summary.units[1].duration, Duration::from_millis(120));
}

#[test]
fn json_report_layout() -> TestResult {
    let summary = Summary::finalize(&mixed_result());
    let out = render(OutputFormat::Json, &summary)?;
    let value: Value = serde_json::from_str(&out)?;

    assert_eq!(
        value,
        json!({
            "units": {
                "Collection": {
                    "state": "failed",
                    "durationMs": 50,
                    "cause": { "kind": "exit_code", "code": 2 }
                },
                "Login": { "state": "passed", "durationMs": 120 },
                "Order": {
                    "state": "skipped",
                    "durationMs": 0,
                    "cause": { "kind": "dependency_failed", "unit": "Collection" }
                }
            },
            "summary": {
                "passed": 1,
                "failed": 1,
                "skipped": 1,
                "totalDurationMs": 175,
                "status": "failed"
            }
        })
    );
    Ok(())
}

#[test]
fn json_cancel_and_timeout_causes() -> TestResult {
    let timeout = serde_json::to_value(Cause::Failed(FailureCause::Timeout { after_ms: 90_000 }))?;
    assert_eq!(timeout, json!({ "kind": "timeout", "after_ms": 90000 }));

    let cancelled = serde_json::to_value(Cause::Skipped(SkipCause::Cancelled {
        reason: CancelReason::RunTimeout,
    }))?;
    assert_eq!(cancelled, json!({ "kind": "cancelled", "reason": "run_timeout" }));

    let interrupted = serde_json::to_value(Cause::Failed(FailureCause::Interrupted))?;
    assert_eq!(interrupted, json!({ "kind": "interrupted" }));
    Ok(())
}

#[test]
fn text_report_lists_units_and_summary() -> TestResult {
    let summary = Summary::finalize(&mixed_result());
    let out = render(OutputFormat::Text, &summary)?;
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[0], "FAIL  Collection (exited with code 2)");
    assert_eq!(lines[1], "PASS  Login (120 ms)");
    assert_eq!(lines[2], "SKIP  Order (dependency 'Collection' failed)");
    assert_eq!(lines[3], "");
    assert_eq!(lines[4], "1 passed, 1 failed, 1 skipped in 175 ms: FAILED");
    Ok(())
}

#[test]
fn skipped_only_run_is_incomplete() {
    let mut units = BTreeMap::new();
    units.insert("A".to_string(), record(UnitState::Passed, Some((0, 5)), None));
    units.insert(
        "B".to_string(),
        record(
            UnitState::Skipped,
            None,
            Some(Cause::Skipped(SkipCause::Cancelled {
                reason: CancelReason::Requested,
            })),
        ),
    );
    let result = RunResult {
        units,
        total_duration: Duration::from_millis(5),
        cancelled: Some(CancelReason::Requested),
    };

    let summary = Summary::finalize(&result);
    assert_eq!(summary.status, RunStatus::Incomplete);
    assert_eq!(summary.exit_code(), 1);
}
