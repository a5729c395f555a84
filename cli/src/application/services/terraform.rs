//! Terraform use-cases: one function per subcommand, each built from
//! [`crate::domain::args`] and run through the retry driver.

use tfharness_options::Options;

use crate::application::ports::CommandRunner;
use crate::application::services::retry::run_with_retry;
use crate::domain::args;
use crate::domain::error::RunError;

pub async fn init<R: CommandRunner>(runner: &R, options: &Options) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::init_args(options)).await
}

pub async fn get<R: CommandRunner>(runner: &R, options: &Options) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::get_args(options)).await
}

pub async fn plan<R: CommandRunner>(runner: &R, options: &Options) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::plan_args(options)).await
}

pub async fn apply<R: CommandRunner>(runner: &R, options: &Options) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::apply_args(options)).await
}

pub async fn destroy<R: CommandRunner>(runner: &R, options: &Options) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::destroy_args(options)).await
}

pub async fn validate<R: CommandRunner>(runner: &R, options: &Options) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::validate_args(options)).await
}

pub async fn validate_inputs<R: CommandRunner>(
    runner: &R,
    options: &Options,
) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::validate_inputs_args(options)).await
}

/// `terraform output -json [name]`, trimmed.
pub async fn output<R: CommandRunner>(
    runner: &R,
    options: &Options,
    name: Option<&str>,
) -> Result<String, RunError> {
    let out = run_with_retry(runner, options, &args::output_args(options, name)).await?;
    Ok(out.trim().to_string())
}

pub async fn show<R: CommandRunner>(runner: &R, options: &Options) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::show_args(options)).await
}

pub async fn workspace_select<R: CommandRunner>(
    runner: &R,
    options: &Options,
    name: &str,
) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::workspace_select_args(options, name)).await
}

pub async fn workspace_new<R: CommandRunner>(
    runner: &R,
    options: &Options,
    name: &str,
) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::workspace_new_args(options, name)).await
}

pub async fn workspace_delete<R: CommandRunner>(
    runner: &R,
    options: &Options,
    name: &str,
) -> Result<String, RunError> {
    run_with_retry(runner, options, &args::workspace_delete_args(options, name)).await
}

/// `init` then `apply`, returning the apply output.
pub async fn init_and_apply<R: CommandRunner>(
    runner: &R,
    options: &Options,
) -> Result<String, RunError> {
    init(runner, options).await?;
    apply(runner, options).await
}

/// `init` then `plan`, returning the plan output.
pub async fn init_and_plan<R: CommandRunner>(
    runner: &R,
    options: &Options,
) -> Result<String, RunError> {
    init(runner, options).await?;
    plan(runner, options).await
}
