use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result, classify::Classification, extract, fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
	PatientInfo,
	Vitalsigns,
}
impl ResourceType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::PatientInfo => "patient_info",
			Self::Vitalsigns => "vitalsigns",
		}
	}
}

impl FromStr for ResourceType {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		match value.trim() {
			"patient_info" | "patients_info" => Ok(Self::PatientInfo),
			"vitalsigns" => Ok(Self::Vitalsigns),
			other => Err(Error::UnsupportedResourceType { resource_type: other.to_string() }),
		}
	}
}

impl fmt::Display for ResourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
	Ascending,
	Descending,
}
impl SortDirection {
	/// Only the exact words `ascending` and `descending` are accepted.
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"ascending" => Some(Self::Ascending),
			"descending" => Some(Self::Descending),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
	pub field: String,
	pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
	/// Last N days from now. Never zero.
	pub duration_days: Option<u32>,
	pub sort_by: Vec<SortKey>,
	/// Never zero.
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
	pub resource_type: ResourceType,
	pub patient_name: String,
	pub fields: Vec<String>,
	pub conditions: Conditions,
}
impl QueryPlan {
	pub fn sort_for(&self, field: &str) -> Option<&SortKey> {
		self.conditions.sort_by.iter().find(|key| key.field == field)
	}
}

/// Builds a plan from raw model output.
///
/// `Ok(None)` is the "no plan" outcome: the output held no usable object, or the object lacked a
/// patient name or (for vital signs) any field. An `interface_type` naming an unknown resource is
/// an error so it fails before any store access.
pub fn build(classification: Classification, raw: &str) -> Result<Option<QueryPlan>> {
	let Some(draft) = extract::extract_json_object(raw) else {
		return Ok(None);
	};

	from_draft(classification, draft)
}

pub fn from_draft(
	classification: Classification,
	mut draft: Map<String, Value>,
) -> Result<Option<QueryPlan>> {
	merge_split_name(&mut draft);

	let resource_type = match draft.get("interface_type").and_then(Value::as_str) {
		Some(raw) if !raw.trim().is_empty() => raw.parse::<ResourceType>()?,
		_ => match classification {
			Classification::Vitalsigns => ResourceType::Vitalsigns,
			Classification::Appointments | Classification::Default => return Ok(None),
		},
	};
	let Some(patient_name) = ["fullName", "patientName"]
		.iter()
		.filter_map(|key| draft.get(*key).and_then(Value::as_str))
		.map(str::trim)
		.find(|name| !name.is_empty())
		.map(str::to_string)
	else {
		return Ok(None);
	};
	let fields = match draft.get("retrieve") {
		Some(Value::Array(items)) =>
			fields::normalize_labels(items.iter().filter_map(Value::as_str)),
		Some(Value::String(single)) => fields::normalize_labels([single.as_str()]),
		_ => Vec::new(),
	};

	if resource_type == ResourceType::Vitalsigns && fields.is_empty() {
		return Ok(None);
	}

	let conditions = match draft.get("conditions") {
		Some(Value::Object(raw)) => normalize_conditions(raw),
		_ => Conditions::default(),
	};

	Ok(Some(QueryPlan { resource_type, patient_name, fields, conditions }))
}

pub fn normalize_conditions(raw: &Map<String, Value>) -> Conditions {
	let duration_days = first_present(raw, &["duration", "durationDays", "duration_days"])
		.and_then(positive_count);
	let limit = first_present(raw, &["limit"]).and_then(positive_count);
	let sort_by = first_present(raw, &["sortby", "sortBy", "sort_by"])
		.map(normalize_sort)
		.unwrap_or_default();

	Conditions { duration_days, sort_by, limit }
}

/// A sort specification that is not a mapping is discarded. Inside a mapping, labels are
/// normalized like fields and entries whose direction is not exact are dropped.
pub fn normalize_sort(raw: &Value) -> Vec<SortKey> {
	let Value::Object(entries) = raw else {
		return Vec::new();
	};
	let mut out: Vec<SortKey> = Vec::new();

	for (label, direction) in entries {
		let Some(direction) = direction.as_str().and_then(SortDirection::parse) else {
			continue;
		};
		let field = fields::normalize_label(label);

		if field.is_empty() || out.iter().any(|key| key.field == field) {
			continue;
		}

		out.push(SortKey { field, direction });
	}

	out
}

/// `0`, `"0"`, `""`, `"all"`, negatives and non-numeric text all read as unset.
fn positive_count(value: &Value) -> Option<u32> {
	let count = match value {
		Value::Number(number) => number.as_u64().or_else(|| {
			number.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)
		})?,
		Value::String(text) => text.trim().parse::<u64>().ok()?,
		_ => return None,
	};

	if count == 0 {
		return None;
	}

	Some(u32::try_from(count).unwrap_or(u32::MAX))
}

fn first_present<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
	keys.iter().find_map(|key| raw.get(*key))
}

/// Folds `lastName` + `firstName` into `fullName`, spelled the way the full-name table stores it:
/// `"{first} {last}"` when either part is Latin, `"{last}{first}"` otherwise. The name lookup is an
/// exact match, so the two spellings are not interchangeable.
fn merge_split_name(draft: &mut Map<String, Value>) {
	let (Some(Value::String(last)), Some(Value::String(first))) =
		(draft.get("lastName"), draft.get("firstName"))
	else {
		return;
	};
	let full_name = join_name(last.trim(), first.trim());

	draft.remove("lastName");
	draft.remove("firstName");
	draft.insert("fullName".to_string(), Value::String(full_name));
}

/// Family-name-first scripts concatenate without a space; Latin names read given name first.
fn join_name(last: &str, first: &str) -> String {
	let latin = |part: &str| part.chars().any(|ch| ch.is_ascii_alphabetic());

	if latin(last) || latin(first) {
		let parts: Vec<&str> = [first, last].into_iter().filter(|part| !part.is_empty()).collect();

		return parts.join(" ");
	}

	format!("{last}{first}")
}
