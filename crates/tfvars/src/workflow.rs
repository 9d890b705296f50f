//! derive CI workflow exports from a parsed payload
//!
//! Given the top-level assignments and the [directives](crate::directive) of a payload this
//! computes
//! - the assignments that end up in the generated tfvars file
//! - the lines appended to the GitHub Actions environment file (`$GITHUB_ENV`)
//! - the contents of the terraform backend config file
//!
//! Everything here is pure. Reading the process environment is abstracted by [Environment]
//! so the same rules can be tested with a plain closure.
use crate::format::format_value;
use crate::value::{Map, Value};
use std::path::PathBuf;

/// Assignment holding the role that the workflow assumes before running terraform
const ASSUME_ROLE_KEY: &str = "assume_role_arn";

/// Lookup of environment variables
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

// blanket impl for closures
impl<F> Environment for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// The environment of the current process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

#[derive(derive_new::new, Debug, Clone)]
pub struct Settings {
    /// where the formatted tfvars are written
    pub tfvars_file: PathBuf,
    /// where the backend config is written
    pub backend_file: PathBuf,
    /// running inside GitHub Actions
    pub github_actions: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct Exports {
    /// Assignments to write to the tfvars file
    pub tfvars: Map,
    /// Chunks for the environment file, multi-line chunks use the `NAME<<EOF` form
    pub env: Vec<String>,
    /// Lines of the backend config file, empty when there is nothing to configure
    pub backend: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("Unable to serialize value of '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Exports {
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn collect(
        mut tfvars: Map,
        directives: &Map,
        settings: &Settings,
        env: &impl Environment,
    ) -> Result<Self, ExportError> {
        let env_var = |name: &str| env.var(name).filter(|value| !value.is_empty());

        // The workflow assumes the role itself. Passing it on to the provider would make
        // terraform assume it a second time.
        let assume_role = tfvars
            .get(ASSUME_ROLE_KEY)
            .and_then(Value::as_non_empty_str)
            .map(str::to_string);
        if assume_role.is_some() && settings.github_actions {
            tracing::info!("scrubbing {ASSUME_ROLE_KEY} from generated tfvars");
            tfvars.insert(ASSUME_ROLE_KEY.to_string(), Value::from(""));
        }

        let mut lines = vec![];
        for (key, value) in &tfvars {
            lines.push(env_chunk(&format!("TF_VAR_{key}"), value)?);
        }

        if let Some(region) = tfvars.get("region").and_then(Value::as_non_empty_str) {
            lines.push(format!("AWS_REGION={region}"));
            lines.push(format!("AWS_REGION_EFFECTIVE={region}"));
        }

        if let Some(role) = &assume_role {
            lines.push(format!("ASSUME_ROLE_ARN={role}"));
            lines.push(format!("AWS_ASSUME_ROLE_ARN={role}"));
        }

        let backend = Backend::from_directives(directives);
        if !backend.lines.is_empty() {
            lines.push(format!("TF_BACKEND_FILE={}", settings.backend_file.display()));
        }

        let from_tfvars = |name: &str| {
            tfvars
                .get(name)
                .and_then(Value::as_non_empty_str)
                .map(str::to_string)
        };

        let bucket = backend
            .bucket
            .clone()
            .or_else(|| from_tfvars("TF_BACKEND_BUCKET"))
            .or_else(|| from_tfvars("S3_BUCKET"))
            .or_else(|| env_var("TF_BACKEND_BUCKET"))
            .or_else(|| env_var("S3_BUCKET"));
        let key = backend
            .key
            .clone()
            .or_else(|| from_tfvars("TF_BACKEND_KEY"))
            .or_else(|| env_var("TF_BACKEND_KEY"));
        let region = backend
            .region
            .clone()
            .or_else(|| from_tfvars("TF_BACKEND_REGION"))
            .or_else(|| env_var("TF_BACKEND_REGION"))
            .or_else(|| env_var("AWS_REGION"));

        if let Some(bucket) = bucket {
            lines.push(format!("TF_BACKEND_BUCKET={bucket}"));
            lines.push(format!("S3_BUCKET={bucket}"));
        }
        if let Some(key) = key {
            lines.push(format!("TF_BACKEND_KEY={key}"));
        }
        if let Some(region) = region {
            lines.push(format!("TF_BACKEND_REGION={region}"));
        }

        if let Some(summary) = directives.get("summary").and_then(Value::as_object) {
            if let Some(bucket) = summary.get("bucket").and_then(Value::as_non_empty_str) {
                lines.push(format!("INFRA_SUMMARY_BUCKET={bucket}"));
            }
            if let Some(key) = summary.get("key").and_then(Value::as_non_empty_str) {
                lines.push(format!("INFRA_SUMMARY_KEY={key}"));
            }
        }

        if let Some(use_existing) = directives.get("use_existing").and_then(Value::as_bool) {
            lines.push(format!("USE_EXISTING={use_existing}"));
        }

        lines.push(format!("TF_VARS_FILE={}", settings.tfvars_file.display()));

        Ok(Self {
            tfvars,
            env: lines,
            backend: backend.lines,
        })
    }
}

/// Environment file entry for one assignment
///
/// Single line strings are exported as they are, everything else as compact JSON using
/// the delimiter form.
fn env_chunk(name: &str, value: &Value) -> Result<String, ExportError> {
    match value {
        Value::String(s) if !s.contains('\n') => Ok(format!("{name}={s}")),
        Value::String(s) => Ok(format!("{name}<<EOF\n{s}\nEOF")),
        _ => {
            let json = serde_json::to_string(value).map_err(|source| ExportError::Serialize {
                key: name.to_string(),
                source,
            })?;
            Ok(format!("{name}<<EOF\n{json}\nEOF"))
        }
    }
}

/// Backend settings taken from the `workflow.backend.*` directives
#[derive(Debug, Default)]
struct Backend {
    lines: Vec<String>,
    bucket: Option<String>,
    key: Option<String>,
    region: Option<String>,
}

impl Backend {
    fn from_directives(directives: &Map) -> Self {
        let mut backend = Backend::default();
        let Some(settings) = directives.get("backend").and_then(Value::as_object) else {
            return backend;
        };

        for (key, value) in settings {
            if value.is_null() {
                continue;
            }

            backend.lines.push(format!("{key} = {}", format_value(value)));

            let Some(text) = value.as_non_empty_str() else {
                continue;
            };
            match key.to_lowercase().as_str() {
                "bucket" => backend.bucket = Some(text.to_string()),
                "key" => backend.key = Some(text.to_string()),
                "region" => backend.region = Some(text.to_string()),
                _ => {}
            }
        }

        backend
    }
}
