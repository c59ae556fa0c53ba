// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tolerant post-processing of model output.

use regex::Regex;
use std::sync::OnceLock;

fn think_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // literal pattern
        Regex::new(r"(?s)<think>.*?</think>").unwrap()
    })
}

/// Strip `<think>...</think>` blocks from reasoning-model output. Falls
/// back to the original text when stripping would leave nothing.
pub fn strip_think_tags(text: &str) -> String {
    let cleaned = think_re().replace_all(text, "").trim().to_string();
    if cleaned.is_empty() {
        text.trim().to_string()
    } else {
        cleaned
    }
}

/// Strip leading/trailing markdown code fences (``` or ```json).
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
        .to_string()
}

/// Extract the first JSON array of objects from free-form model output.
///
/// Tries, in order: a direct parse, the outermost `[...]` span, then a
/// scan for individual objects. Non-object array members are dropped.
pub fn extract_json_array(text: &str) -> Vec<serde_json::Value> {
    let cleaned = strip_code_fences(&strip_think_tags(text));

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&cleaned) {
        match value {
            serde_json::Value::Array(items) => {
                return items.into_iter().filter(|v| v.is_object()).collect()
            }
            obj @ serde_json::Value::Object(_) => return vec![obj],
            _ => {}
        }
    }

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            if let Ok(serde_json::Value::Array(items)) =
                serde_json::from_str::<serde_json::Value>(&cleaned[start..=end])
            {
                return items.into_iter().filter(|v| v.is_object()).collect();
            }
        }
    }

    scan_objects(&cleaned)
}

/// Last-resort scan for balanced top-level `{...}` spans.
fn scan_objects(text: &str) -> Vec<serde_json::Value> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Ok(value) =
                            serde_json::from_str::<serde_json::Value>(&text[s..=i])
                        {
                            if value.is_object() {
                                out.push(value);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
#[path = "text_tests.rs"]
mod tests;
