//! JSON reporter
//!
//! Outputs plans and comparisons as pretty-printed JSON for piping to jq
//! or handing back to an HTTP caller.

use anyhow::Result;
use serde::Serialize;

/// Render as JSON
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
