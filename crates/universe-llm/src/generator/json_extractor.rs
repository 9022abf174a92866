//! JSON extraction utilities for cleaning LLM responses

use crate::error::{LLMError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extracts the first JSON array embedded in an LLM response.
///
/// Handles the usual wrapping: markdown fences, a sentence of preamble,
/// trailing notes. Candidates are tried left to right until one parses.
pub fn extract_json_array(llm_output: &str) -> Result<Value> {
    extract_balanced(llm_output, '[', ']')
        .ok_or_else(|| LLMError::InvalidResponse("No JSON array found in response".to_string()))
}

/// Extracts the first JSON object embedded in an LLM response
pub fn extract_json_object(llm_output: &str) -> Result<Value> {
    extract_balanced(llm_output, '{', '}')
        .ok_or_else(|| LLMError::InvalidResponse("No JSON object found in response".to_string()))
}

/// Extract and deserialize in one step
pub fn extract_as<T: DeserializeOwned>(llm_output: &str, open: char) -> Result<T> {
    let value = match open {
        '[' => extract_json_array(llm_output)?,
        _ => extract_json_object(llm_output)?,
    };
    Ok(serde_json::from_value(value)?)
}

fn extract_balanced(content: &str, open: char, close: char) -> Option<Value> {
    for (start, _) in content.match_indices(open) {
        if let Some(end) = balanced_end(&content[start..], open, close) {
            let candidate = &content[start..start + end];
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return Some(value);
            }
        }
    }
    None
}

/// Byte length of the balanced span starting at `text[0] == open`
fn balanced_end(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
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
            c if c == open => depth += 1,
            c if c == close => {
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
