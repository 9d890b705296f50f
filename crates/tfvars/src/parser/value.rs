use super::cursor::Cursor;
use super::{ErrorKind, ParseError};
use crate::value::{Map, Value};

/// Characters that may directly follow a `true`/`false`/`null` keyword
const KEYWORD_BOUNDARY: &[char] = &[' ', '\t', '\r', '\n', ',', ']', '}', '#', '/'];

/// Parses the value at the cursor, skipping leading trivia
pub(super) fn parse_value(cursor: &mut Cursor) -> Result<Value, ParseError> {
    cursor.skip_trivia()?;

    let Some(ch) = cursor.peek() else {
        return Err(cursor.error(ErrorKind::UnexpectedEof));
    };

    match ch {
        '"' => parse_string(cursor).map(Value::String),
        '{' => cursor.nested(parse_object).map(Value::Object),
        '[' => cursor.nested(parse_array).map(Value::Array),
        '-' | '0'..='9' => parse_number(cursor),
        '<' if cursor.starts_with("<<") => parse_heredoc(cursor).map(Value::String),
        _ => parse_keyword(cursor),
    }
}

fn parse_keyword(cursor: &mut Cursor) -> Result<Value, ParseError> {
    let keywords = [
        ("true", Value::Boolean(true)),
        ("false", Value::Boolean(false)),
        ("null", Value::Null),
    ];

    for (literal, value) in keywords {
        let Some(after) = cursor.rest().strip_prefix(literal) else {
            continue;
        };

        let at_boundary = after
            .chars()
            .next()
            .map_or(true, |next| KEYWORD_BOUNDARY.contains(&next));
        if at_boundary {
            cursor.advance_bytes(literal.len());
            return Ok(value);
        }
    }

    Err(cursor.error(ErrorKind::UnsupportedExpression))
}

/// Parses an assignment or object key: a quoted string or a bare identifier
pub(super) fn parse_key(cursor: &mut Cursor, invalid: ErrorKind) -> Result<String, ParseError> {
    match cursor.peek() {
        Some('"') => parse_string(cursor),
        Some(ch) if is_identifier_start(ch) => Ok(parse_identifier(cursor)?.to_string()),
        _ => Err(cursor.error(invalid)),
    }
}

pub(crate) fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

pub(crate) fn is_identifier_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

fn parse_identifier<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, ParseError> {
    let identifier = cursor.take_while(is_identifier_continue);
    if identifier.is_empty() {
        return Err(cursor.error(ErrorKind::ExpectedIdentifier));
    }

    Ok(identifier)
}

fn parse_string(cursor: &mut Cursor) -> Result<String, ParseError> {
    let start = cursor.clone();
    cursor.eat("\"");

    let mut result = String::new();
    while let Some(ch) = cursor.advance() {
        match ch {
            '"' => return Ok(result),
            '\\' => result.push(parse_escape(cursor)?),
            _ => result.push(ch),
        }
    }

    Err(start.error(ErrorKind::UnterminatedString))
}

/// Parses the escape sequence after a backslash
fn parse_escape(cursor: &mut Cursor) -> Result<char, ParseError> {
    let escape = cursor.clone();
    let Some(ch) = cursor.advance() else {
        return Err(cursor.error(ErrorKind::IncompleteEscape));
    };

    let unescaped = match ch {
        '"' => '"',
        '\\' => '\\',
        '/' => '/',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'u' => {
            let code = cursor
                .rest()
                .get(..4)
                .filter(|code| code.chars().all(|c| c.is_ascii_hexdigit()));
            let Some(ch) = code
                .and_then(|code| u32::from_str_radix(code, 16).ok())
                .and_then(char::from_u32)
            else {
                return Err(escape.error(ErrorKind::InvalidUnicodeEscape));
            };

            cursor.advance_bytes(4);
            ch
        }
        other => return Err(escape.error(ErrorKind::UnsupportedEscape(other))),
    };

    Ok(unescaped)
}

fn parse_number(cursor: &mut Cursor) -> Result<Value, ParseError> {
    let start = cursor.offset();
    let start_cursor = cursor.clone();
    let is_digit = |ch: char| ch.is_ascii_digit();

    cursor.eat("-");
    if cursor.take_while(is_digit).is_empty() {
        return Err(cursor.error(ErrorKind::InvalidNumber));
    }

    let mut is_integer = true;
    if cursor.eat(".") {
        is_integer = false;
        if cursor.take_while(is_digit).is_empty() {
            return Err(cursor.error(ErrorKind::InvalidNumber));
        }
    }

    if cursor.eat("e") || cursor.eat("E") {
        is_integer = false;
        let _ = cursor.eat("+") || cursor.eat("-");
        if cursor.take_while(is_digit).is_empty() {
            return Err(cursor.error(ErrorKind::InvalidExponent));
        }
    }

    let literal = cursor.slice_from(start);
    if is_integer {
        return literal
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| start_cursor.error(ErrorKind::NumberOutOfRange));
    }

    match literal.parse::<f64>() {
        Ok(decimal) if decimal.is_finite() => Ok(Value::Decimal(decimal)),
        _ => Err(start_cursor.error(ErrorKind::NumberOutOfRange)),
    }
}

fn parse_array(cursor: &mut Cursor) -> Result<Vec<Value>, ParseError> {
    cursor.eat("[");

    let mut values = vec![];
    loop {
        cursor.skip_trivia()?;
        if cursor.eat("]") {
            return Ok(values);
        }

        values.push(parse_value(cursor)?);

        cursor.skip_trivia()?;
        if cursor.eat(",") {
            continue;
        }
        if cursor.eat("]") {
            return Ok(values);
        }

        return Err(cursor.error(ErrorKind::ExpectedArrayDelimiter));
    }
}

/// Parses an object literal
///
/// Entries may be separated by `,`, by newlines or by nothing at all: `{a = 1 b = 2}` is a
/// valid two entry object.
fn parse_object(cursor: &mut Cursor) -> Result<Map, ParseError> {
    cursor.eat("{");

    let mut result = Map::new();
    loop {
        cursor.skip_trivia()?;
        if cursor.is_eof() {
            return Err(cursor.error(ErrorKind::UnterminatedObject));
        }
        if cursor.eat("}") {
            return Ok(result);
        }

        let key = parse_key(cursor, ErrorKind::InvalidObjectKey)?;
        cursor.skip_trivia()?;
        if !(cursor.eat("=") || cursor.eat(":")) {
            return Err(cursor.error(ErrorKind::ExpectedObjectAssignment));
        }

        let value = parse_value(cursor)?;
        result.insert(key, value);

        cursor.skip_trivia()?;
        cursor.eat(",");
    }
}

/// Parses a heredoc string (`<<LABEL` or `<<-LABEL`)
///
/// Body lines are kept verbatim. The `-` variant only relaxes terminator matching: the
/// terminator line may be indented with tabs/spaces. Body lines are never dedented.
/// CRLF line endings are accepted, the `\r` belongs to the line terminator and is not part of
/// the body or the terminator label.
fn parse_heredoc(cursor: &mut Cursor) -> Result<String, ParseError> {
    let start = cursor.clone();
    let indented = cursor.eat("<<-");
    if !indented {
        cursor.eat("<<");
    }

    let label = parse_identifier(cursor)?;
    cursor.take_line();

    let mut lines = vec![];
    while !cursor.is_eof() {
        let line = cursor.take_line();
        let line = line.strip_suffix('\r').unwrap_or(line);

        let candidate = if indented {
            line.trim_start_matches([' ', '\t'])
        } else {
            line
        };
        if candidate == label {
            return Ok(lines.join("\n"));
        }

        lines.push(line);
    }

    Err(start.error(ErrorKind::UnterminatedHeredoc))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::{parse_assignments, parse_single_value};
    use pretty_assertions::assert_eq;

    fn value(input: &str) -> Value {
        parse_single_value(input).expect("value must parse")
    }

    fn error(input: &str) -> ErrorKind {
        parse_single_value(input)
            .expect_err("value must not parse")
            .syntax_kind()
            .cloned()
            .expect("must be a syntax error")
    }

    #[test]
    fn keywords() {
        assert_eq!(value("true"), Value::Boolean(true));
        assert_eq!(value("false"), Value::Boolean(false));
        assert_eq!(value("null"), Value::Null);
    }

    #[test]
    fn keyword_boundary() {
        assert_eq!(error("truex"), ErrorKind::UnsupportedExpression);
        assert_eq!(error("nullable"), ErrorKind::UnsupportedExpression);
        assert_eq!(error("false_alarm"), ErrorKind::UnsupportedExpression);
        assert_eq!(value("[true,false]"), Value::from(vec![true, false]));
        assert_eq!(value("true# comment"), Value::Boolean(true));
        assert_eq!(value("true/* comment */"), Value::Boolean(true));
    }

    #[test]
    fn unsupported_expressions() {
        assert_eq!(error("var.region"), ErrorKind::UnsupportedExpression);
        assert_eq!(error("upper(\"a\")"), ErrorKind::UnsupportedExpression);
        assert_eq!(error("<tag>"), ErrorKind::UnsupportedExpression);
        assert_eq!(error("'single'"), ErrorKind::UnsupportedExpression);
    }

    #[test]
    fn integers_and_decimals() {
        assert_eq!(value("42"), Value::Integer(42));
        assert_eq!(value("-7"), Value::Integer(-7));
        assert_eq!(value("42.0"), Value::Decimal(42.0));
        assert_eq!(value("4.2e1"), Value::Decimal(42.0));
        assert_eq!(value("1E3"), Value::Decimal(1000.0));
        assert_eq!(value("1e-2"), Value::Decimal(0.01));
        assert_eq!(value("-2.5e+2"), Value::Decimal(-250.0));
    }

    #[test]
    fn invalid_numbers() {
        assert_eq!(error("-"), ErrorKind::InvalidNumber);
        assert_eq!(error("-x"), ErrorKind::InvalidNumber);
        assert_eq!(error("1."), ErrorKind::InvalidNumber);
        assert_eq!(error("1.e5"), ErrorKind::InvalidNumber);
        assert_eq!(error("1e"), ErrorKind::InvalidExponent);
        assert_eq!(error("1e+"), ErrorKind::InvalidExponent);
        assert_eq!(error("1.5x"), ErrorKind::TrailingCharacters);
    }

    #[test]
    fn nesting_depth_is_limited() {
        use crate::parser::cursor::MAX_NESTING;

        let deepest = format!("{}{}", "[".repeat(MAX_NESTING), "]".repeat(MAX_NESTING));
        assert!(parse_single_value(&deepest).is_ok());

        let levels = MAX_NESTING + 1;
        let too_deep = format!("{}1{}", "[".repeat(levels), "]".repeat(levels));
        assert_eq!(error(&too_deep), ErrorKind::NestingTooDeep);

        let depth = 10_000;
        let brackets = format!("a = {}{}", "[".repeat(depth), "]".repeat(depth));
        let err = parse_assignments(&brackets).expect_err("must fail");
        assert_eq!(err.syntax_kind(), Some(&ErrorKind::NestingTooDeep));

        let objects = format!("a = {}{}", "{ b = ".repeat(depth), "}".repeat(depth));
        let err = parse_assignments(&objects).expect_err("must fail");
        assert_eq!(err.syntax_kind(), Some(&ErrorKind::NestingTooDeep));
    }

    #[test]
    fn numbers_out_of_range() {
        assert_eq!(value("-9223372036854775808"), Value::Integer(i64::MIN));
        assert_eq!(error("9223372036854775808"), ErrorKind::NumberOutOfRange);
        assert_eq!(error("1e400"), ErrorKind::NumberOutOfRange);
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(value(r#""plain""#), Value::from("plain"));
        assert_eq!(value(r#""""#), Value::from(""));
        assert_eq!(
            value(r#""q\" b\\ s\/ \b\f\n\r\t""#),
            Value::from("q\" b\\ s/ \u{8}\u{c}\n\r\t")
        );
        assert_eq!(value(r#""é中""#), Value::from("é中"));
        assert_eq!(value("\"raw\nnewline\""), Value::from("raw\nnewline"));
    }

    #[test]
    fn invalid_strings() {
        assert_eq!(error(r#""open"#), ErrorKind::UnterminatedString);
        assert_eq!(error("\"trailing\\"), ErrorKind::IncompleteEscape);
        assert_eq!(error(r#""\x""#), ErrorKind::UnsupportedEscape('x'));
        assert_eq!(error(r#""\u12""#), ErrorKind::InvalidUnicodeEscape);
        assert_eq!(error(r#""\u12g4""#), ErrorKind::InvalidUnicodeEscape);
        assert_eq!(error(r#""\ud800""#), ErrorKind::InvalidUnicodeEscape);
    }

    #[test]
    fn arrays() {
        assert_eq!(value("[]"), Value::Array(vec![]));
        assert_eq!(value("[ /* empty */ ]"), Value::Array(vec![]));
        assert_eq!(
            value("[1, \"two\", [3]]"),
            Value::Array(vec![
                Value::Integer(1),
                Value::from("two"),
                Value::Array(vec![Value::Integer(3)]),
            ])
        );
        assert_eq!(
            value("[\n  1, # one\n  2,\n]"),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn invalid_arrays() {
        assert_eq!(error("[1 2]"), ErrorKind::ExpectedArrayDelimiter);
        assert_eq!(error("[1,"), ErrorKind::UnexpectedEof);
        assert_eq!(error("[1"), ErrorKind::ExpectedArrayDelimiter);
        assert_eq!(error("[,]"), ErrorKind::UnsupportedExpression);
    }

    #[test]
    fn objects() {
        let expected: Value = [("a", 1_i64), ("b", 2_i64)].into_iter().collect();
        assert_eq!(value("{a = 1 b = 2}"), expected);
        assert_eq!(value("{a = 1, b = 2}"), expected);
        assert_eq!(value("{\n  a = 1\n  b = 2\n}"), expected);
        assert_eq!(value("{\"a\": 1, b: 2,}"), expected);
        assert_eq!(value("{}"), Value::Object(Map::new()));
    }

    #[test]
    fn object_duplicate_keys_overwrite() {
        let expected: Value = [("a", 3_i64), ("b", 2_i64)].into_iter().collect();
        assert_eq!(value("{a = 1, b = 2, a = 3}"), expected);
    }

    #[test]
    fn nested_objects_keep_order() {
        let Value::Object(map) = value(r#"{ z = { y = [] } "key with spaces" = null a-b = 1 }"#)
        else {
            panic!("expected object");
        };
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            ["z", "key with spaces", "a-b"]
        );
    }

    #[test]
    fn invalid_objects() {
        assert_eq!(error("{a 1}"), ErrorKind::ExpectedObjectAssignment);
        assert_eq!(error("{a = 1"), ErrorKind::UnterminatedObject);
        assert_eq!(error("{1 = 1}"), ErrorKind::InvalidObjectKey);
        assert_eq!(error("{a = }"), ErrorKind::UnsupportedExpression);
    }

    #[test]
    fn indented_heredoc_keeps_body() {
        let assignments =
            parse_assignments("greeting = <<-EOT\n  hello\n  world\n  EOT\n").unwrap();
        assert_eq!(assignments["greeting"], Value::from("  hello\n  world"));
    }

    #[test]
    fn heredoc() {
        let assignments =
            parse_assignments("script = <<EOT\n#!/bin/sh\necho \"hi\"\nEOT\nnext = 1").unwrap();
        assert_eq!(assignments["script"], Value::from("#!/bin/sh\necho \"hi\""));
        assert_eq!(assignments["next"], Value::Integer(1));
    }

    #[test]
    fn heredoc_terminator_must_not_be_indented_without_dash() {
        let result = parse_assignments("a = <<EOT\n  body\n  EOT\n");
        assert_eq!(
            result.expect_err("must fail").syntax_kind(),
            Some(&ErrorKind::UnterminatedHeredoc)
        );
    }

    #[test]
    fn heredoc_edge_cases() {
        assert_eq!(value("<<EOT\nEOT"), Value::from(""));
        assert_eq!(value("<<EOT ignored\nline\nEOT"), Value::from("line"));
        assert_eq!(value("<<EOT\r\nline\r\nEOT\r\n"), Value::from("line"));
        assert_eq!(error("<<\nEOT"), ErrorKind::ExpectedIdentifier);
        assert_eq!(error("<<EOT\nnever closed\n"), ErrorKind::UnterminatedHeredoc);
    }
}
