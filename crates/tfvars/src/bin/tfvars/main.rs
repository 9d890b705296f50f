mod cli;

use anyhow::Context;
use std::io::Write;
use std::path::Path;
use tfvars::workflow::{Exports, ProcessEnvironment, Settings};
use tfvars::{Map, Value};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFVARS_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let (command_result, annotate) = match cli.command {
        cli::Command::Load(load_cli) => (load(load_cli), true),
        cli::Command::Fmt(fmt_cli) => (fmt(fmt_cli), false),
        cli::Command::Show(show_cli) => (show(show_cli), false),
    };

    if let Err(e) = command_result {
        if annotate {
            // GitHub Actions annotation, shows up in the workflow summary
            eprintln!("::error::{e:#}");
        } else {
            for error in e.chain() {
                eprintln!("{error}")
            }
        }
        std::process::exit(1);
    }
}

pub fn load(cli: cli::LoadCommand) -> anyhow::Result<()> {
    let payload = payload(&cli)?;

    let assignments = tfvars::parse_assignments(payload)
        .context("Failed to parse TERRAFORM_TFVARS as tfvars")?;
    let directives = tfvars::extract_directives(payload)?;
    tracing::info!(
        assignments = assignments.len(),
        directives = directives.len(),
        "payload parsed"
    );

    let settings = Settings::new(
        cli.vars_file.clone(),
        cli.backend_file.clone(),
        cli.github_actions,
    );
    let exports = Exports::collect(assignments, &directives, &settings, &ProcessEnvironment)?;

    write_file(&cli.vars_file, &tfvars::format_document(&exports.tfvars))?;
    if !cli.no_terraform_fmt {
        terraform_fmt(&cli.vars_file);
    }

    if !exports.backend.is_empty() {
        let mut contents = exports.backend.join("\n");
        contents.push('\n');
        write_file(&cli.backend_file, &contents)?;
    }

    let env_file = cli
        .env_file
        .as_deref()
        .context("GITHUB_ENV is not available; cannot set environment variables.")?;
    append_env(env_file, &exports.env)
}

/// TERRAFORM_TFVARS, falling back to TERRAFORM_TFVARS_JSON when empty
fn payload(cli: &cli::LoadCommand) -> anyhow::Result<&str> {
    [&cli.payload, &cli.payload_json]
        .into_iter()
        .find(|payload| !payload.is_empty())
        .map(String::as_str)
        .context("TERRAFORM_TFVARS secret is empty. Provide a Terraform tfvars payload.")
}

/// Formats a document, comments (including workflow directives) are not preserved
pub fn fmt(cli: cli::FmtCommand) -> anyhow::Result<()> {
    let source = read_input(&cli.input)?;
    let formatted = tfvars::format_document(&tfvars::parse_assignments(&source)?);

    if cli.check {
        let name = cli
            .input
            .file
            .as_ref()
            .map_or("<stdin>".to_string(), |path| path.display().to_string());
        anyhow::ensure!(formatted == source, "{name} is not formatted");
        return Ok(());
    }

    match &cli.input.file {
        Some(path) if cli.write => write_file(path, &formatted),
        _ => {
            std::io::stdout().write_all(formatted.as_bytes())?;
            Ok(())
        }
    }
}

pub fn show(cli: cli::ShowCommand) -> anyhow::Result<()> {
    let source = read_input(&cli.input)?;
    let map: Map = if cli.directives {
        tfvars::extract_directives(&source)?
    } else {
        tfvars::parse_assignments(&source)?
    };

    output(&cli.output, &Value::Object(map))
}

fn read_input(input: &cli::InputArgs) -> anyhow::Result<String> {
    match &input.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display())),
        None => Ok(std::io::read_to_string(std::io::stdin())?),
    }
}

fn output(output: &cli::OutputArgs, value: &Value) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), value)?;
            println!();
        }
    };

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create directory {}", parent.display()))?;
    }

    std::fs::write(path, contents).with_context(|| format!("Unable to write {}", path.display()))?;
    tracing::info!(path=%path.display(), "file written");
    Ok(())
}

/// Runs `terraform fmt` on `path` when terraform is installed, failures only warn
fn terraform_fmt(path: &Path) {
    let Ok(terraform) = which::which("terraform") else {
        tracing::debug!("terraform not found, skipping fmt");
        return;
    };

    let details = match std::process::Command::new(&terraform)
        .arg("fmt")
        .arg(path)
        .output()
    {
        Ok(result) if result.status.success() => return,
        Ok(result) => String::from_utf8_lossy(&result.stderr).trim().to_string(),
        Err(err) => err.to_string(),
    };

    let mut message = format!("Failed to format {} with terraform fmt.", path.display());
    if !details.is_empty() {
        message.push_str(&format!(" Details: {details}"));
    }
    eprintln!("::warning::{message}");
}

fn append_env(env_file: &Path, chunks: &[String]) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(env_file)
        .with_context(|| format!("Unable to open {}", env_file.display()))?;

    for chunk in chunks {
        file.write_all(chunk.as_bytes())?;
        if !chunk.ends_with('\n') {
            file.write_all(b"\n")?;
        }
    }

    tracing::info!(path=%env_file.display(), count = chunks.len(), "environment exported");
    Ok(())
}
