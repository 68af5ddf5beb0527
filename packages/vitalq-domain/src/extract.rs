//! Best-effort extraction of a JSON object from free-form model output.
//!
//! Models wrap their answer in prose or code fences. The widest span from the first `{` to the
//! last `}` is tried first; when that does not parse, the balanced object that starts at the first
//! `{` is tried. Anything else yields `None`.

use serde_json::{Map, Value};

pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
	let start = raw.find('{')?;
	let end = raw.rfind('}')?;

	if end < start {
		return None;
	}
	if let Some(object) = parse_object(&raw[start..=end]) {
		return Some(object);
	}

	let balanced_end = balanced_end(raw, start)?;

	parse_object(&raw[start..=balanced_end])
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
	match serde_json::from_str::<Value>(candidate) {
		Ok(Value::Object(object)) => Some(object),
		_ => None,
	}
}

/// Byte offset of the `}` closing the object opened at `start`, skipping braces inside strings.
fn balanced_end(raw: &str, start: usize) -> Option<usize> {
	let mut depth = 0_usize;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, ch) in raw[start..].char_indices() {
		if in_string {
			match ch {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => {},
			}

			continue;
		}

		match ch {
			'"' => in_string = true,
			'{' => depth += 1,
			'}' => {
				depth = depth.checked_sub(1)?;

				if depth == 0 {
					return Some(start + offset);
				}
			},
			_ => {},
		}
	}

	None
}
