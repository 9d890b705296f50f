//! recursive descent parser for tfvars documents
//!
//! Supported grammar (a small subset of HCL):
//!
//! ```text
//! document   = { key "=" value }
//! key        = string | identifier
//! value      = string | number | "true" | "false" | "null" | array | object | heredoc
//! array      = "[" [ value { "," value } [ "," ] ] "]"
//! object     = "{" { key ( "=" | ":" ) value [ "," ] } "}"
//! heredoc    = ( "<<" | "<<-" ) identifier newline { line newline } identifier
//! ```
//!
//! Whitespace and comments (`#`, `//`, nested `/* */`) may appear between any two tokens.
//! Function calls, interpolation, arithmetic and `for` expressions are not supported.
mod cursor;
mod value;

use crate::value::{Map, Value};
use cursor::Cursor;

pub(crate) use value::{is_identifier_continue, is_identifier_start};

/// Parses a whole tfvars document into its top-level assignments
///
/// Assigning the same key twice is not an error, the last assignment wins.
#[tracing::instrument(level = "trace", skip_all)]
pub fn parse_assignments(text: &str) -> Result<Map, ParseError> {
    let mut cursor = Cursor::new(text);
    let mut assignments = Map::new();

    loop {
        cursor.skip_trivia()?;
        if cursor.is_eof() {
            break;
        }

        let key = value::parse_key(&mut cursor, ErrorKind::InvalidKey)?;
        cursor.skip_trivia()?;
        if !cursor.eat("=") {
            return Err(cursor.error(ErrorKind::ExpectedAssignment));
        }

        let value = value::parse_value(&mut cursor)?;
        if assignments.insert(key.clone(), value).is_some() {
            tracing::debug!(%key, "assignment overwritten");
        }
    }

    tracing::debug!(count = assignments.len(), "parsed assignments");
    Ok(assignments)
}

/// Parses exactly one value; only trivia may follow it
#[tracing::instrument(level = "trace", skip_all)]
pub fn parse_single_value(text: &str) -> Result<Value, ParseError> {
    let mut cursor = Cursor::new(text);
    let value = value::parse_value(&mut cursor)?;
    cursor.skip_trivia()?;
    if !cursor.is_eof() {
        return Err(cursor.error(ErrorKind::TrailingCharacters));
    }

    Ok(value)
}

/// 1-based location within the parsed text
#[derive(derive_new::new, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{kind} at {position}")]
    Syntax { kind: ErrorKind, position: Position },
    #[error("Invalid workflow directive (missing '='): {directive}")]
    DirectiveMissingAssignment { directive: String },
    #[error("Unable to parse workflow directive '{directive}' on line {line}: {source}")]
    Directive {
        directive: String,
        line: usize,
        #[source]
        source: Box<ParseError>,
    },
    #[error("Workflow directive path conflict at '{segment}'")]
    DirectivePathConflict { segment: String },
}

impl ParseError {
    /// Kind of the underlying syntax error, if any
    pub fn syntax_kind(&self) -> Option<&ErrorKind> {
        match self {
            ParseError::Syntax { kind, .. } => Some(kind),
            ParseError::Directive { source, .. } => source.syntax_kind(),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Unterminated block comment")]
    UnterminatedBlockComment,
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Incomplete escape sequence in string")]
    IncompleteEscape,
    #[error("Invalid unicode escape in string")]
    InvalidUnicodeEscape,
    #[error("Unsupported escape sequence \\{0}")]
    UnsupportedEscape(char),
    #[error("Invalid number literal")]
    InvalidNumber,
    #[error("Invalid exponent in number literal")]
    InvalidExponent,
    #[error("Number literal out of range")]
    NumberOutOfRange,
    #[error("Unterminated heredoc")]
    UnterminatedHeredoc,
    #[error("Expected identifier")]
    ExpectedIdentifier,
    #[error("Expected ',' or ']' in array literal")]
    ExpectedArrayDelimiter,
    #[error("Expected '=' or ':' inside object literal")]
    ExpectedObjectAssignment,
    #[error("Invalid key in object literal")]
    InvalidObjectKey,
    #[error("Unterminated object literal")]
    UnterminatedObject,
    #[error("Invalid key in tfvars assignment")]
    InvalidKey,
    #[error("Expected '=' after key in tfvars assignment")]
    ExpectedAssignment,
    #[error("Unexpected end of input while parsing value")]
    UnexpectedEof,
    #[error("Unexpected trailing characters while parsing value")]
    TrailingCharacters,
    #[error("Unsupported expression in tfvars value")]
    UnsupportedExpression,
    #[error("Arrays and objects nested too deeply")]
    NestingTooDeep,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_of(result: Result<impl std::fmt::Debug, ParseError>) -> ErrorKind {
        result
            .expect_err("must fail")
            .syntax_kind()
            .cloned()
            .expect("must be a syntax error")
    }

    #[test]
    fn assignments_keep_document_order() {
        let assignments = parse_assignments(
            r#"
            # leading comment
            zeta  = 1
            alpha = "two"
            "quoted key" = true
            "#,
        )
        .unwrap();

        assert_eq!(
            assignments.keys().collect::<Vec<_>>(),
            ["zeta", "alpha", "quoted key"]
        );
        assert_eq!(assignments["alpha"], Value::from("two"));
        assert_eq!(assignments["quoted key"], Value::Boolean(true));
    }

    #[test]
    fn last_assignment_wins() {
        let assignments = parse_assignments("a = 1\nb = 2\na = 3").unwrap();
        assert_eq!(assignments.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(assignments["a"], Value::Integer(3));
    }

    #[test]
    fn assignments_without_newlines() {
        let assignments = parse_assignments("a = 1 b = [] c = {}").unwrap();
        assert_eq!(assignments.len(), 3);
    }

    #[test]
    fn empty_document() {
        assert!(parse_assignments("").unwrap().is_empty());
        assert!(parse_assignments("  # only a comment\n/* and a block */")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn hyphenated_identifier_keys() {
        let assignments = parse_assignments("my-var_2 = 1").unwrap();
        assert!(assignments.contains_key("my-var_2"));
    }

    #[test]
    fn missing_assignment_operator() {
        assert_eq!(
            kind_of(parse_assignments("region \"eu-west-1\"")),
            ErrorKind::ExpectedAssignment
        );
        assert_eq!(
            kind_of(parse_assignments("region : \"eu-west-1\"")),
            ErrorKind::ExpectedAssignment
        );
    }

    #[test]
    fn invalid_key() {
        assert_eq!(kind_of(parse_assignments("1abc = 1")), ErrorKind::InvalidKey);
        assert_eq!(kind_of(parse_assignments("= 1")), ErrorKind::InvalidKey);
    }

    #[test]
    fn missing_value() {
        assert_eq!(kind_of(parse_assignments("a =")), ErrorKind::UnexpectedEof);
        assert_eq!(kind_of(parse_assignments("a = # nothing")), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn single_value_rejects_trailing_input() {
        assert_eq!(kind_of(parse_single_value("1 2")), ErrorKind::TrailingCharacters);
        assert_eq!(
            kind_of(parse_single_value("\"a\" \"b\"")),
            ErrorKind::TrailingCharacters
        );
    }

    #[test]
    fn single_value_allows_surrounding_trivia() {
        assert_eq!(
            parse_single_value("  /* c */ 42 # trailing\n").unwrap(),
            Value::Integer(42)
        );
    }

    #[test]
    fn error_position() {
        let err = parse_assignments("a = 1\nb = 2\nc = truex").expect_err("must fail");
        assert_eq!(
            err,
            ParseError::Syntax {
                kind: ErrorKind::UnsupportedExpression,
                position: Position::new(3, 5),
            }
        );
        assert_eq!(
            err.to_string(),
            "Unsupported expression in tfvars value at line 3, column 5"
        );
    }
}
