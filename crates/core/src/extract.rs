//! Best-effort recovery of a JSON payload from free-form model output.
//!
//! Strategies run from least to most invasive and the first one that parses wins:
//!
//! 1. the whole text as JSON
//! 2. the body of the first fenced block (three backticks, optionally tagged `json`)
//! 3. the outermost bracketed span (first `{` to last `}`, or `[`..`]` when an array
//!    opens first), then depth-counted spans starting at each opening bracket
//! 4. the same span search over a cleaned copy of the text, cleaned from each opening
//!    bracket in turn so quotes in leading prose do not skew string tracking
//!
//! Nothing here talks to the generating service; retries belong to the caller.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const FENCE: &str = "```";

/// No strategy produced a parseable payload.
///
/// Carries the error from parsing the untouched text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to parse JSON: {message}")]
pub struct ExtractionError {
    message: String,
}

impl ExtractionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Which step of the chain produced the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    Fenced,
    OuterSpan,
    BalancedSpan,
    Cleaned,
}

/// Extracts a JSON value from `text`.
///
/// # Errors
///
/// Returns `ExtractionError` when every strategy fails.
pub fn extract(text: &str) -> Result<Value, ExtractionError> {
    extract_with_strategy(text).map(|(value, _)| value)
}

/// Extracts a JSON value and deserializes it into `T`.
///
/// # Errors
///
/// Returns `ExtractionError` when no JSON can be recovered or when it does not fit `T`.
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T, ExtractionError> {
    let value = extract(text)?;
    serde_json::from_value(value).map_err(|err| ExtractionError::new(err.to_string()))
}

/// Like [`extract`], also reporting the strategy that succeeded.
///
/// # Errors
///
/// Returns `ExtractionError` when every strategy fails.
pub fn extract_with_strategy(text: &str) -> Result<(Value, Strategy), ExtractionError> {
    let direct_err = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok((value, Strategy::Direct)),
        Err(err) => err,
    };

    let found = fenced_block(text)
        .and_then(parse)
        .map(|value| (value, Strategy::Fenced))
        .or_else(|| search_spans(text))
        .or_else(|| cleaned_spans(text).map(|value| (value, Strategy::Cleaned)));

    match found {
        Some((value, strategy)) => {
            debug!(?strategy, "recovered JSON payload from model output");
            Ok((value, strategy))
        }
        None => Err(ExtractionError::new(direct_err.to_string())),
    }
}

fn parse(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate).ok()
}

/// Body of the first fence whose opening line is empty or tagged `json`.
fn fenced_block(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(FENCE) {
        let open = search_from + offset;
        let after = &text[open + FENCE.len()..];
        let untagged = after.strip_prefix("json").unwrap_or(after);
        if let Some(newline) = untagged.find('\n') {
            if untagged[..newline].trim().is_empty() {
                let body = &untagged[newline + 1..];
                return body.find(FENCE).map(|close| body[..close].trim());
            }
        }
        search_from = open + FENCE.len();
    }
    None
}

fn search_spans(text: &str) -> Option<(Value, Strategy)> {
    let first_object = text.find('{');
    let first_array = text.find('[');
    let array_first = match (first_object, first_array) {
        (Some(o), Some(a)) => a < o,
        (None, Some(_)) => true,
        _ => false,
    };

    let outer = if array_first {
        outer_span(text, '[', ']').or_else(|| outer_span(text, '{', '}'))
    } else {
        outer_span(text, '{', '}')
    };
    if let Some(value) = outer {
        return Some((value, Strategy::OuterSpan));
    }

    balanced_spans(text).map(|value| (value, Strategy::BalancedSpan))
}

/// Greedy span from the first `open` to the last `close`.
fn outer_span(text: &str, open: char, close: char) -> Option<Value> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    parse(&text[start..=end])
}

/// Tries the depth-counted span starting at each opening bracket, in order.
fn balanced_spans(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| matches!(c, '{' | '['))
        .find_map(|(start, _)| {
            balanced_end(&text[start..]).and_then(|len| parse(&text[start..start + len]))
        })
}

/// Byte length of the bracketed value at the start of `text`, honoring string literals.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Span search over `text` cleaned from each opening bracket onward.
fn cleaned_spans(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| matches!(c, '{' | '['))
        .find_map(|(start, _)| search_spans(&clean(&text[start..])))
        .map(|(value, _)| value)
}

fn is_stray_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
}

/// Repairs the usual damage in model-written JSON.
///
/// Outside string literals control characters other than whitespace are dropped. Inside
/// them raw newlines, carriage returns and tabs become escapes, invalid backslash escapes
/// become literal backslashes, and a quote not followed by `,` `:` `}` `]` or the end of
/// the text is taken as part of the string and escaped.
fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if !in_string {
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                '\n' | '\r' | '\t' => out.push(c),
                _ if is_stray_control(c) => {}
                _ => out.push(c),
            }
            continue;
        }

        match c {
            '\\' => {
                let next = chars.peek().copied();
                if matches!(next, Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')) {
                    out.push('\\');
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else {
                    out.push_str("\\\\");
                }
            }
            '"' => {
                let rest = chars.clone().find(|ch| !ch.is_whitespace());
                if matches!(rest, None | Some(',' | ':' | '}' | ']')) {
                    in_string = false;
                    out.push('"');
                } else {
                    out.push_str("\\\"");
                }
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ if is_stray_control(c) => {}
            _ => out.push(c),
        }
    }
    out
}
