//! Stdin lines to outbound frames.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use devlink_core::LinkBridge;

/// What a console line asks for.
#[derive(Debug, PartialEq)]
pub(crate) enum ConsoleLine {
    Empty,
    /// A line starting with `{`, sent verbatim.
    Raw(String),
    /// `name` or `name {json}`.
    Action { name: String, data: Value },
}

/// Why a console line cannot be sent.
#[derive(Debug, Error)]
pub(crate) enum ConsoleError {
    #[error("data is not JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("data must be a JSON object, got {0}")]
    NotAnObject(Value),
}

pub(crate) fn parse_line(line: &str) -> Result<ConsoleLine, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleLine::Empty);
    }
    if line.starts_with('{') {
        return Ok(ConsoleLine::Raw(line.to_string()));
    }

    match line.split_once(char::is_whitespace) {
        Some((name, data)) => match serde_json::from_str::<Value>(data.trim())? {
            data @ Value::Object(_) => Ok(ConsoleLine::Action {
                name: name.to_string(),
                data,
            }),
            other => Err(ConsoleError::NotAnObject(other)),
        },
        None => Ok(ConsoleLine::Action {
            name: line.to_string(),
            data: json!({}),
        }),
    }
}

/// Send one console line through the bridge. Failures are reported, not fatal.
pub(crate) fn dispatch(bridge: &LinkBridge, line: &str) {
    let result = match parse_line(line) {
        Ok(ConsoleLine::Empty) => return,
        Ok(ConsoleLine::Raw(text)) => bridge.send(text),
        Ok(ConsoleLine::Action { name, data }) => bridge.send_action(&name, data),
        Err(e) => {
            warn!("Ignoring line, {}", e);
            return;
        }
    };

    if let Err(e) = result {
        warn!("Send failed: {}", e);
        eprintln!("{}", e);
    }
}
