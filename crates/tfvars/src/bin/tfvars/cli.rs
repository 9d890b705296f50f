//! tfvars cli interface

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; tfvars ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the tfvars payload of a CI workflow
    ///
    /// Writes the formatted tfvars and backend files and appends the
    /// derived variables to the GitHub Actions environment file.
    Load(LoadCommand),

    /// Format a tfvars document
    ///
    /// Reads from stdin unless a file is given
    #[command(alias = "format")]
    Fmt(FmtCommand),

    /// Print assignments or workflow directives as json/yaml
    Show(ShowCommand),
}

#[derive(Parser, Debug)]
pub struct LoadCommand {
    /// The tfvars payload
    #[arg(
        long,
        env = "TERRAFORM_TFVARS",
        hide_env_values = true,
        default_value = ""
    )]
    pub payload: String,

    /// Fallback for --payload, kept for older workflows
    #[arg(
        long,
        env = "TERRAFORM_TFVARS_JSON",
        hide_env_values = true,
        default_value = "",
        hide = true
    )]
    pub payload_json: String,

    /// Where to write the formatted tfvars
    #[arg(long, env = "TF_VARS_FILE", default_value = "ci.auto.tfvars")]
    pub vars_file: PathBuf,

    /// Where to write the backend configuration
    #[arg(long, env = "TF_BACKEND_FILE", default_value = "backend.auto.tfbackend")]
    pub backend_file: PathBuf,

    /// Environment file to append exported variables to
    #[arg(long, env = "GITHUB_ENV")]
    pub env_file: Option<PathBuf>,

    /// Running inside GitHub Actions
    ///
    /// Only the value `true` enables it, anything else in GITHUB_ACTIONS counts as false.
    #[arg(long, env = "GITHUB_ACTIONS", value_parser = is_true)]
    pub github_actions: bool,

    /// Do not run `terraform fmt` on the written tfvars
    #[arg(long)]
    pub no_terraform_fmt: bool,
}

fn is_true(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(value == "true")
}

#[derive(Parser, Debug)]
pub struct FmtCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Rewrite the file in place instead of printing it
    #[arg(short = 'w', long, requires = "file", conflicts_with = "check")]
    pub write: bool,

    /// Exit with an error if the input is not formatted
    #[arg(long)]
    pub check: bool,
}

#[derive(Parser, Debug)]
pub struct ShowCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Show workflow directives instead of assignments
    #[arg(short = 'd', long)]
    pub directives: bool,
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// tfvars file to read, stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
