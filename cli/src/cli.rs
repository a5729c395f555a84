//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tfharness_options::{DEFAULT_RETRYABLE_ERRORS, Options};

use tfharness_cli::application::ports::OptionsStore;
use tfharness_cli::application::services::terraform;
use tfharness_cli::domain::args::{Subcommand, args_for};
use tfharness_cli::infra::command_runner::TokioCommandRunner;
use tfharness_cli::infra::config::YamlOptionsFile;

/// Run terraform with retries on known-transient failures
#[derive(Parser)]
#[command(
    name = "tfharness",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Options file (YAML). Falls back to $TFHARNESS_OPTIONS
    #[arg(long, global = true)]
    pub options: Option<PathBuf>,

    /// Terraform working directory, overriding the options file
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Merge in the built-in retryable errors (3 retries, 5s apart)
    #[arg(long, global = true)]
    pub defaults: bool,

    /// Kill a single terraform run after this long
    #[arg(long, global = true, default_value = "1h", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Pass -no-color to terraform. Any non-empty NO_COLOR other than
    /// false/no/off/0 turns it on
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// terraform init
    Init,
    /// terraform get -update
    Get,
    /// terraform plan
    Plan,
    /// terraform apply -auto-approve
    Apply,
    /// terraform destroy -auto-approve
    Destroy,
    /// terraform validate
    Validate,
    /// terragrunt validate-inputs
    ValidateInputs,
    /// terraform output -json
    Output {
        /// Single output to print; all outputs when omitted
        name: Option<String>,
    },
    /// terraform show -json of the plan file
    Show,
    /// Manage terraform workspaces
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
    /// Print the arguments a subcommand would run with, one per line
    Args {
        #[arg(value_enum)]
        subcommand: Subcommand,
        /// Output or workspace name
        #[arg(long)]
        name: Option<String>,
    },
    /// Compile the retryable and warning patterns without running terraform
    Check,
    /// Print the built-in retryable error table
    Defaults,
}

#[derive(clap::Subcommand)]
pub enum WorkspaceCommand {
    /// terraform workspace select
    Select { name: String },
    /// terraform workspace new
    New { name: String },
    /// terraform workspace delete
    Delete { name: String },
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if options cannot be loaded or terraform fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            options,
            dir,
            defaults,
            timeout,
            no_color,
            command,
        } = self;

        // The built-in table never depends on an options file.
        if matches!(command, Command::Defaults) {
            print_defaults();
            return Ok(());
        }

        let opts = load_options(options, dir, defaults, no_color)?;
        let runner = TokioCommandRunner::new(timeout);

        let out = match command {
            // printed before options were loaded
            Command::Defaults => String::new(),
            Command::Args { subcommand, name } => {
                for arg in args_for(&opts, subcommand, name.as_deref())? {
                    println!("{arg}");
                }
                return Ok(());
            }
            Command::Check => {
                opts.validate_patterns()?;
                println!(
                    "{} retryable and {} warning patterns OK",
                    opts.retryable_errors.len(),
                    opts.warnings_as_errors.len()
                );
                return Ok(());
            }
            Command::Init => terraform::init(&runner, &opts).await?,
            Command::Get => terraform::get(&runner, &opts).await?,
            Command::Plan => terraform::plan(&runner, &opts).await?,
            Command::Apply => terraform::apply(&runner, &opts).await?,
            Command::Destroy => terraform::destroy(&runner, &opts).await?,
            Command::Validate => terraform::validate(&runner, &opts).await?,
            Command::ValidateInputs => terraform::validate_inputs(&runner, &opts).await?,
            Command::Output { name } => {
                let value = terraform::output(&runner, &opts, name.as_deref()).await?;
                format!("{value}\n")
            }
            Command::Show => terraform::show(&runner, &opts).await?,
            Command::Workspace(WorkspaceCommand::Select { name }) => {
                terraform::workspace_select(&runner, &opts, &name).await?
            }
            Command::Workspace(WorkspaceCommand::New { name }) => {
                terraform::workspace_new(&runner, &opts, &name).await?
            }
            Command::Workspace(WorkspaceCommand::Delete { name }) => {
                terraform::workspace_delete(&runner, &opts, &name).await?
            }
        };
        print!("{out}");
        Ok(())
    }
}

fn load_options(
    file: Option<PathBuf>,
    dir: Option<PathBuf>,
    defaults: bool,
    no_color: bool,
) -> Result<Options> {
    let mut opts = match YamlOptionsFile::resolve(file) {
        Some(store) => store.load()?,
        None => Options::default(),
    };
    if let Some(dir) = dir {
        opts.dir = dir;
    }
    opts.no_color |= no_color;
    if defaults {
        opts = opts.with_default_retryable_errors();
    }
    Ok(opts)
}

fn print_defaults() {
    let mut table = DEFAULT_RETRYABLE_ERRORS.to_vec();
    table.sort_unstable();
    for (pattern, message) in table {
        println!("{pattern}\t{message}");
    }
}
