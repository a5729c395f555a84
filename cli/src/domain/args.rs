//! Terraform argument assembly.
//!
//! Pure functions only: options in, argument vectors out. Every builder puts
//! the subcommand's fixed arguments first and the caller's `extra_args` for
//! that subcommand right after them, then the option-derived flags.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tfharness_options::{Options, Var};

use crate::domain::error::ArgsError;

// ── Subcommands ──────────────────────────────────────────────────────────────

/// Terraform subcommands the harness knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Subcommand {
    Init,
    Get,
    Plan,
    Apply,
    Destroy,
    Validate,
    ValidateInputs,
    Output,
    Show,
    WorkspaceSelect,
    WorkspaceNew,
    WorkspaceDelete,
}

impl Subcommand {
    /// Label used in logs and error messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Get => "get",
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
            Self::Validate => "validate",
            Self::ValidateInputs => "validate-inputs",
            Self::Output => "output",
            Self::Show => "show",
            Self::WorkspaceSelect => "workspace select",
            Self::WorkspaceNew => "workspace new",
            Self::WorkspaceDelete => "workspace delete",
        }
    }

    /// Commands that take `-var`, `-var-file`, `-target`, `-lock` and
    /// `-parallelism`.
    fn changes_state(self) -> bool {
        matches!(self, Self::Plan | Self::Apply | Self::Destroy)
    }

    /// Commands that accept `-no-color` and do not already carry it.
    fn accepts_no_color(self) -> bool {
        matches!(
            self,
            Self::Init | Self::Get | Self::Plan | Self::Apply | Self::Destroy | Self::Validate
        )
    }
}

// ── Ordering helper ──────────────────────────────────────────────────────────

/// `fixed` followed by `extra`, both in their original order.
#[must_use]
pub fn prepend<S: AsRef<str>>(extra: &[String], fixed: &[S]) -> Vec<String> {
    fixed
        .iter()
        .map(|arg| arg.as_ref().to_string())
        .chain(extra.iter().cloned())
        .collect()
}

// ── Builders ─────────────────────────────────────────────────────────────────

/// Arguments for `command`. `name` is the output name for `output` (all
/// outputs when `None`) and the workspace name for the workspace commands.
pub fn args_for(
    options: &Options,
    command: Subcommand,
    name: Option<&str>,
) -> Result<Vec<String>, ArgsError> {
    let require_name = || {
        name.ok_or(ArgsError::MissingName {
            command: command.label(),
        })
    };
    Ok(match command {
        Subcommand::Init => init_args(options),
        Subcommand::Get => get_args(options),
        Subcommand::Plan => plan_args(options),
        Subcommand::Apply => apply_args(options),
        Subcommand::Destroy => destroy_args(options),
        Subcommand::Validate => validate_args(options),
        Subcommand::ValidateInputs => validate_inputs_args(options),
        Subcommand::Output => output_args(options, name),
        Subcommand::Show => show_args(options),
        Subcommand::WorkspaceSelect => workspace_select_args(options, require_name()?),
        Subcommand::WorkspaceNew => workspace_new_args(options, require_name()?),
        Subcommand::WorkspaceDelete => workspace_delete_args(options, require_name()?),
    })
}

#[must_use]
pub fn init_args(options: &Options) -> Vec<String> {
    let mut fixed = vec!["init".to_string(), format!("-upgrade={}", options.upgrade)];
    if options.reconfigure {
        fixed.push("-reconfigure".to_string());
    }
    if options.migrate_state {
        fixed.push("-migrate-state".to_string());
        fixed.push("-force-copy".to_string());
    }
    fixed.extend(backend_config_args(&options.backend_config));
    if let Some(dir) = &options.plugin_dir {
        fixed.push(format!("-plugin-dir={}", dir.display()));
    }
    finish(
        options,
        Subcommand::Init,
        prepend(&options.extra_args.init, &fixed),
    )
}

#[must_use]
pub fn get_args(options: &Options) -> Vec<String> {
    finish(
        options,
        Subcommand::Get,
        prepend(&options.extra_args.get, &["get", "-update"]),
    )
}

#[must_use]
pub fn plan_args(options: &Options) -> Vec<String> {
    let base = prepend(&options.extra_args.plan, &["plan", "-input=false"]);
    finish(options, Subcommand::Plan, format_args(options, Subcommand::Plan, base))
}

#[must_use]
pub fn apply_args(options: &Options) -> Vec<String> {
    let base = prepend(
        &options.extra_args.apply,
        &["apply", "-input=false", "-auto-approve"],
    );
    finish(options, Subcommand::Apply, format_args(options, Subcommand::Apply, base))
}

#[must_use]
pub fn destroy_args(options: &Options) -> Vec<String> {
    let base = prepend(
        &options.extra_args.destroy,
        &["destroy", "-auto-approve", "-input=false"],
    );
    finish(
        options,
        Subcommand::Destroy,
        format_args(options, Subcommand::Destroy, base),
    )
}

#[must_use]
pub fn validate_args(options: &Options) -> Vec<String> {
    finish(
        options,
        Subcommand::Validate,
        prepend(&options.extra_args.validate, &["validate"]),
    )
}

#[must_use]
pub fn validate_inputs_args(options: &Options) -> Vec<String> {
    finish(
        options,
        Subcommand::ValidateInputs,
        prepend(&options.extra_args.validate_inputs, &["validate-inputs"]),
    )
}

#[must_use]
pub fn output_args(options: &Options, name: Option<&str>) -> Vec<String> {
    let mut fixed = vec!["output", "-no-color", "-json"];
    fixed.extend(name);
    finish(
        options,
        Subcommand::Output,
        prepend(&options.extra_args.output, &fixed),
    )
}

#[must_use]
pub fn show_args(options: &Options) -> Vec<String> {
    let mut fixed = vec![
        "show".to_string(),
        "-no-color".to_string(),
        "-json".to_string(),
    ];
    fixed.extend(options.plan_file_path.as_deref().map(path_arg));
    finish(
        options,
        Subcommand::Show,
        prepend(&options.extra_args.show, &fixed),
    )
}

#[must_use]
pub fn workspace_select_args(options: &Options, name: &str) -> Vec<String> {
    prepend(
        &options.extra_args.workspace_select,
        &["workspace", "select", name],
    )
}

#[must_use]
pub fn workspace_new_args(options: &Options, name: &str) -> Vec<String> {
    prepend(&options.extra_args.workspace_new, &["workspace", "new", name])
}

#[must_use]
pub fn workspace_delete_args(options: &Options, name: &str) -> Vec<String> {
    prepend(
        &options.extra_args.workspace_delete,
        &["workspace", "delete", name],
    )
}

// ── Shared formatting ────────────────────────────────────────────────────────

/// Appends vars, targets, lock and plan-file flags to `args` for the
/// state-changing commands. Vars are left out of `apply` with a plan file,
/// since the plan already carries them.
#[must_use]
pub fn format_args(options: &Options, command: Subcommand, mut args: Vec<String>) -> Vec<String> {
    if !command.changes_state() {
        return args;
    }
    let with_plan_file = command == Subcommand::Apply && options.plan_file_path.is_some();
    if !with_plan_file {
        if options.set_vars_after_var_files {
            args.extend(var_file_args(&options.var_files));
            args.extend(var_args(&options.vars));
        } else {
            args.extend(var_args(&options.vars));
            args.extend(var_file_args(&options.var_files));
        }
        args.extend(mixed_var_args(&options.mixed_vars));
    }
    args.extend(options.targets.iter().map(|target| format!("-target={target}")));
    args.push(format!("-lock={}", options.lock));
    if !options.lock_timeout.is_empty() {
        args.push(format!("-lock-timeout={}", options.lock_timeout));
    }
    if let Some(plan) = &options.plan_file_path {
        match command {
            Subcommand::Plan => args.push(format!("-out={}", plan.display())),
            Subcommand::Apply => args.push(path_arg(plan)),
            _ => {}
        }
    }
    args
}

/// Flags every command gets from the global options.
fn finish(options: &Options, command: Subcommand, mut args: Vec<String>) -> Vec<String> {
    if options.parallelism > 0 && command.changes_state() {
        args.push(format!("-parallelism={}", options.parallelism));
    }
    if options.no_color && command.accepts_no_color() && !args.iter().any(|a| a == "-no-color") {
        args.push("-no-color".to_string());
    }
    args
}

fn var_args(vars: &HashMap<String, Value>) -> Vec<String> {
    let mut names: Vec<&String> = vars.keys().collect();
    names.sort();
    names
        .into_iter()
        .flat_map(|name| {
            [
                "-var".to_string(),
                format!("{name}={}", to_hcl(&vars[name], false)),
            ]
        })
        .collect()
}

fn var_file_args(files: &[impl AsRef<Path>]) -> Vec<String> {
    files
        .iter()
        .flat_map(|file| ["-var-file".to_string(), path_arg(file.as_ref())])
        .collect()
}

fn mixed_var_args(vars: &[Var]) -> Vec<String> {
    vars.iter()
        .flat_map(|var| match var {
            Var::Inline { name, value } => {
                ["-var".to_string(), format!("{name}={}", to_hcl(value, false))]
            }
            Var::File(path) => ["-var-file".to_string(), path_arg(path)],
        })
        .collect()
}

/// `-backend-config=key=value`, or the bare `-backend-config=key` when the
/// value is null.
fn backend_config_args(config: &HashMap<String, Value>) -> Vec<String> {
    let mut keys: Vec<&String> = config.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|key| match &config[key] {
            Value::Null => format!("-backend-config={key}"),
            value => format!("-backend-config={key}={}", to_hcl(value, false)),
        })
        .collect()
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

// ── HCL values ───────────────────────────────────────────────────────────────

/// Renders `value` the way terraform parses a `-var` value.
///
/// A top-level string is passed bare; strings inside lists and objects are
/// quoted. `null` is always the bare word `null`, which terraform reads as
/// null only when nested.
#[must_use]
pub fn to_hcl(value: &Value, nested: bool) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if nested => quote(s),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(|item| to_hcl(item, true)).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, field)| format!("{} = {}", quote(key), to_hcl(field, true)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
