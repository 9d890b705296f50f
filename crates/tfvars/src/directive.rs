//! workflow directives embedded in comments
//!
//! A tfvars payload may carry settings for the CI workflow itself. These are written as line
//! comments so that terraform ignores them:
//!
//! ```hcl
//! # workflow.backend.bucket = "my-bucket"
//! // workflow.backend.region = "us-east-1"
//! # workflow.use_existing = true
//! region = "us-east-1"
//! ```
//!
//! The dotted path after `workflow.` addresses a (nested) object, the right hand side is any
//! single tfvars value. The example above yields
//! `{ backend = { bucket = "my-bucket", region = "us-east-1" }, use_existing = true }`.
use crate::parser::{parse_single_value, ParseError};
use crate::value::{Map, Value};

/// Every directive comment starts with this prefix
pub const DIRECTIVE_PREFIX: &str = "workflow.";

/// Collects all workflow directives found in line comments of `text`
#[tracing::instrument(level = "trace", skip_all)]
pub fn extract_directives(text: &str) -> Result<Map, ParseError> {
    let mut directives = Map::new();

    for (index, line) in text.lines().enumerate() {
        let Some(body) = comment_body(line) else {
            continue;
        };
        let Some(directive) = body.strip_prefix(DIRECTIVE_PREFIX) else {
            continue;
        };

        let Some((path, expression)) = directive.split_once('=') else {
            return Err(ParseError::DirectiveMissingAssignment {
                directive: line.trim().to_string(),
            });
        };

        let value =
            parse_single_value(expression.trim()).map_err(|source| ParseError::Directive {
                directive: line.trim().to_string(),
                line: index + 1,
                source: Box::new(source),
            })?;

        let path: Vec<&str> = path.trim().split('.').collect();
        tracing::debug!(?path, kind = value.kind(), "workflow directive");
        deposit(&mut directives, &path, value)?;
    }

    Ok(directives)
}

/// Text of a `#` or `//` line comment, without marker and surrounding whitespace
fn comment_body(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('#')
        .or_else(|| line.strip_prefix("//"))
        .map(str::trim)
}

/// Sets `path` in `directives` to `value`, creating intermediate objects on the way
fn deposit(directives: &mut Map, path: &[&str], value: Value) -> Result<(), ParseError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut current = directives;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        let Value::Object(next) = entry else {
            return Err(ParseError::DirectivePathConflict {
                segment: segment.to_string(),
            });
        };
        current = next;
    }

    current.insert(last.to_string(), value);
    Ok(())
}
