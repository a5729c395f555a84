//! Tests for the retry driver: classification, retry counting, delays,
//! warning escalation and pattern errors.

#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use tfharness_cli::application::services::retry::run_with_retry;
use tfharness_cli::domain::RunError;
use tfharness_options::Options;

use crate::mocks::{RecordingLogger, ScriptedRunner, err_output, ok_output};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn retrying_options(max_retries: u32) -> (Options, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let mut opts = Options::new("fixtures/network");
    opts.retryable_errors
        .insert(".*transport is closing.*".into(), "Failed to reach Kubernetes API.".into());
    opts.max_retries = max_retries;
    opts.time_between_retries = Duration::ZERO;
    opts.logger = Some(logger.clone());
    (opts, logger)
}

// ── success and retry ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_success_on_first_attempt() {
    let (opts, _) = retrying_options(3);
    let runner = ScriptedRunner::new(vec![Ok(ok_output("Apply complete!\n"))]);

    let out = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .expect("apply succeeds");

    assert_eq!(out, "Apply complete!\n");
    assert_eq!(runner.call_count(), 1);
}

#[tokio::test]
async fn test_retryable_failure_then_success() {
    let (opts, logger) = retrying_options(3);
    let runner = ScriptedRunner::new(vec![
        Ok(err_output("Error: transport is closing")),
        Ok(ok_output("Apply complete!\n")),
    ]);

    let out = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .expect("second attempt succeeds");

    assert_eq!(out, "Apply complete!\n");
    assert_eq!(runner.call_count(), 2);
    assert!(logger.contains("warrants a retry. Further details: Failed to reach Kubernetes API."));
    assert!(logger.contains("Sleeping for"));
}

#[tokio::test]
async fn test_non_retryable_failure_is_fatal_immediately() {
    let (opts, _) = retrying_options(3);
    let runner = ScriptedRunner::new(vec![Ok(err_output("Error: Unsupported argument"))]);

    let err = run_with_retry(&runner, &opts, &args(&["plan"]))
        .await
        .unwrap_err();

    assert_eq!(runner.call_count(), 1);
    match &err {
        RunError::Fatal {
            description, cause, ..
        } => {
            assert_eq!(description, "terraform plan");
            assert_eq!(cause, "exit status 1");
        }
        other => panic!("expected Fatal, got {other:?}"),
    }
    assert_eq!(err.output(), Some("Error: Unsupported argument"));
    assert!(!err.is_configuration_error());
}

#[tokio::test]
async fn test_retries_exhausted() {
    let (opts, _) = retrying_options(2);
    let runner = ScriptedRunner::repeating(&err_output("transport is closing"), 5);

    let err = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .unwrap_err();

    assert_eq!(runner.call_count(), 3);
    match err {
        RunError::MaxRetriesExceeded {
            max_retries,
            last_cause,
            output,
            ..
        } => {
            assert_eq!(max_retries, 2);
            assert_eq!(last_cause, "exit status 1");
            assert_eq!(output, "transport is closing");
        }
        other => panic!("expected MaxRetriesExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_zero_retries_runs_once() {
    let (opts, _) = retrying_options(0);
    let runner = ScriptedRunner::repeating(&err_output("transport is closing"), 2);

    let err = run_with_retry(&runner, &opts, &args(&["init"]))
        .await
        .unwrap_err();

    assert_eq!(runner.call_count(), 1);
    assert!(matches!(err, RunError::MaxRetriesExceeded { max_retries: 0, .. }));
}

#[tokio::test]
async fn test_runner_error_text_is_classified() {
    let (mut opts, _) = retrying_options(1);
    opts.retryable_errors
        .insert("timed out after".into(), "Slow provider start.".into());
    let runner = ScriptedRunner::new(vec![
        Err(anyhow::anyhow!("terraform timed out after 30s")),
        Ok(ok_output("ok\n")),
    ]);

    let out = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .expect("retried after timeout");
    assert_eq!(out, "ok\n");
    assert_eq!(runner.call_count(), 2);
}

#[tokio::test]
async fn test_final_attempt_does_not_announce_a_retry() {
    let (opts, logger) = retrying_options(0);
    let runner = ScriptedRunner::new(vec![Ok(err_output("transport is closing"))]);

    let err = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::MaxRetriesExceeded { .. }));
    assert!(!logger.contains("warrants a retry"));
    assert!(!logger.contains("Sleeping for"));
}

#[tokio::test]
async fn test_one_retry_announced_once() {
    let (opts, logger) = retrying_options(1);
    let runner = ScriptedRunner::repeating(&err_output("transport is closing"), 2);

    run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .unwrap_err();

    assert_eq!(runner.call_count(), 2);
    let announced = logger
        .messages()
        .iter()
        .filter(|m| m.contains("warrants a retry"))
        .count();
    assert_eq!(announced, 1);
}

#[tokio::test]
async fn test_unmatched_runner_error_is_fatal_with_its_text() {
    let (opts, _) = retrying_options(3);
    let runner = ScriptedRunner::new(vec![Err(anyhow::anyhow!(
        "failed to spawn terraform: No such file or directory"
    ))]);

    let err = run_with_retry(&runner, &opts, &args(&["init"]))
        .await
        .unwrap_err();

    assert_eq!(runner.call_count(), 1);
    match &err {
        RunError::Fatal { cause, output, .. } => {
            assert!(cause.contains("failed to spawn terraform"), "got: {cause}");
            assert!(output.is_empty());
        }
        other => panic!("expected Fatal, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_waits_between_retries() {
    let (mut opts, _) = retrying_options(1);
    opts.time_between_retries = Duration::from_secs(5);
    let runner = ScriptedRunner::new(vec![
        Ok(err_output("transport is closing")),
        Ok(ok_output("done\n")),
    ]);

    let start = tokio::time::Instant::now();
    run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .expect("second attempt succeeds");
    assert!(start.elapsed() >= Duration::from_secs(5));
}

// ── built-in policy ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_default_policy_retries_provider_install_failure() {
    let opts = Options::new("fixtures/providers").with_default_retryable_errors();
    let runner = ScriptedRunner::new(vec![
        Ok(err_output("Error: Error installing provider \"aws\": unexpected EOF")),
        Ok(err_output("Error: registry service is unreachable")),
        Ok(ok_output("Terraform has been successfully initialized!\n")),
    ]);

    let out = run_with_retry(&runner, &opts, &args(&["init"]))
        .await
        .expect("third attempt succeeds");
    assert!(out.contains("successfully initialized"));
    assert_eq!(runner.call_count(), 3);
}

// ── warnings as errors ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_warning_escalates_successful_run() {
    let (mut opts, _) = retrying_options(3);
    opts.warnings_as_errors
        .insert("Deprecated attribute".into(), "Deprecations are errors here.".into());
    let output = "Apply complete!\n\nWarning: Deprecated attribute in module.db\n\n";
    let runner = ScriptedRunner::new(vec![Ok(ok_output(output))]);

    let err = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .unwrap_err();

    assert_eq!(runner.call_count(), 1);
    match err {
        RunError::WarningsFound {
            explanation,
            output: captured,
        } => {
            assert_eq!(explanation, "Deprecations are errors here.");
            assert_eq!(captured, output);
        }
        other => panic!("expected WarningsFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_retryable_warning_is_retried() {
    let (mut opts, _) = retrying_options(1);
    opts.warnings_as_errors
        .insert("Provider is flaky".into(), "flaky provider".into());
    opts.retryable_errors
        .insert("flaky provider".into(), "Provider warned, retrying.".into());
    let runner = ScriptedRunner::new(vec![
        Ok(ok_output("done\n\nWarning: Provider is flaky\n\n")),
        Ok(ok_output("done\n")),
    ]);

    let out = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .expect("clean second run");
    assert_eq!(out, "done\n");
    assert_eq!(runner.call_count(), 2);
}

// ── configuration errors ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_retryable_pattern_stops_before_running() {
    let (mut opts, _) = retrying_options(3);
    opts.retryable_errors.insert("(unclosed".into(), "bad".into());
    let runner = ScriptedRunner::new(vec![Ok(ok_output("never"))]);

    let err = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .unwrap_err();

    assert!(err.is_configuration_error());
    assert!(err.output().is_none());
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_warning_pattern_stops_before_running() {
    let (mut opts, _) = retrying_options(3);
    opts.warnings_as_errors.insert("[".into(), "bad".into());
    let runner = ScriptedRunner::new(vec![Ok(ok_output("never"))]);

    let err = run_with_retry(&runner, &opts, &args(&["apply"]))
        .await
        .unwrap_err();

    match err {
        RunError::InvalidPattern(pattern_err) => assert_eq!(pattern_err.pattern, "["),
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
    assert_eq!(runner.call_count(), 0);
}

// ── invocation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_command_carries_binary_dir_and_env() {
    let (mut opts, _) = retrying_options(0);
    opts.binary = "tofu".into();
    opts.env_vars.insert("TF_IN_AUTOMATION".into(), "1".into());
    opts.no_stderr = true;
    opts.output_max_line_size = 512;
    let runner = ScriptedRunner::new(vec![Ok(ok_output(""))]);

    run_with_retry(&runner, &opts, &args(&["validate"]))
        .await
        .expect("validate succeeds");

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let spec = &calls[0];
    assert_eq!(spec.program, "tofu");
    assert_eq!(spec.args, args(&["validate"]));
    assert_eq!(spec.dir, std::path::PathBuf::from("fixtures/network"));
    assert_eq!(spec.env["TF_IN_AUTOMATION"], "1");
    assert!(spec.no_stderr);
    assert_eq!(spec.max_line_size, 512);
}

#[tokio::test]
async fn test_clones_run_independently() {
    let (base, logger) = retrying_options(0);
    let mut staging = base.clone();
    staging.env_vars.insert("TF_WORKSPACE".into(), "staging".into());

    let runner = ScriptedRunner::new(vec![Ok(ok_output("")), Ok(ok_output(""))]);
    run_with_retry(&runner, &base, &args(&["plan"])).await.expect("base plan");
    run_with_retry(&runner, &staging, &args(&["plan"])).await.expect("staging plan");

    let calls = runner.calls();
    assert!(!calls[0].env.contains_key("TF_WORKSPACE"));
    assert_eq!(calls[1].env["TF_WORKSPACE"], "staging");
    // both clones report to the one shared logger
    assert_eq!(
        logger
            .messages()
            .iter()
            .filter(|m| m.starts_with("Running command"))
            .count(),
        2
    );
}
