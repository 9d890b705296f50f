//! # tfvars - terraform variables for CI workflows
//!
//! `tfvars` takes a terraform variables payload (usually stored as a CI secret), writes it
//! out as a canonically formatted `.tfvars` file and exports the settings the workflow needs
//! as environment variables.
//!
//! ## Introduction for developers
//!
//! ### Payload
//!
//! A payload is a list of `key = value` assignments, a small subset of HCL:
//!
//! ```hcl
//! # single line comments work like this
//! // ...or like this
//!
//! /* block comments
//!    /* may be nested */
//! */
//!
//! # workflow.backend.bucket = "state-bucket"
//!
//! region         = "eu-west-1"
//! instance_count = 2
//! ratio          = 0.5
//! enabled        = true
//! zones          = ["a", "b"]
//! tags           = { team = "infra", "cost-center" = 42 }
//! user_data      = <<-EOT
//!   #!/bin/sh
//!   echo hello
//! EOT
//! ```
//!
//! Values are strings, integers, decimals, booleans, `null`, arrays and objects
//! ([value::Value]). Anything terraform would have to evaluate (function calls, references,
//! interpolation, ...) is rejected.
//!
//! ### Parsing
//!
//! see [parse_assignments] and [parse_single_value]
//!
//! A hand written recursive descent parser walks the text with a cursor. Errors
//! ([ParseError]) carry line and column of the offending input.
//!
//! ### Directives
//!
//! see [extract_directives]
//!
//! Line comments starting with `workflow.` configure the workflow rather than terraform. They
//! are collected into a nested object keyed by their dotted path.
//!
//! ### Formatting
//!
//! see [format_document] and [format_value]
//!
//! Output is stable and can be parsed again, producing the same assignments. Object entries
//! are aligned on `=`, arrays and objects are spread over multiple lines with two space
//! indentation. Heredocs are written as regular (escaped) strings.
//!
//! ### Exports
//!
//! see [workflow::Exports]
//!
//! Derives `TF_VAR_*`, AWS and backend related environment variables plus the backend config
//! file from assignments and directives.
//!
pub mod directive;
pub mod format;
pub mod parser;
pub mod value;
pub mod workflow;

pub use directive::extract_directives;
pub use format::{format_document, format_value};
pub use parser::{parse_assignments, parse_single_value, ErrorKind, ParseError, Position};
pub use value::{Map, Value};
