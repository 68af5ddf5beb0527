//! Field-label normalization for vital-sign attributes.
//!
//! Upstream drafts name fields with localized or free-form labels, optionally followed by an
//! annotation after a `：` or `:` separator (for example `體溫：TP`). Known labels map to the
//! canonical store codes; anything else passes through with the annotation removed.

pub const SYSTOLIC_BLOOD_PRESSURE: &str = "SYS";
pub const PULSE_RATE: &str = "PR";
pub const TEMPERATURE: &str = "TP";
pub const OXYGEN_SATURATION: &str = "SPO2";

const LABEL_ALIASES: [(&str, &str); 15] = [
	("血壓", SYSTOLIC_BLOOD_PRESSURE),
	("脈搏", PULSE_RATE),
	("體溫", TEMPERATURE),
	("血氧", OXYGEN_SATURATION),
	("blood pressure", SYSTOLIC_BLOOD_PRESSURE),
	("systolic blood pressure", SYSTOLIC_BLOOD_PRESSURE),
	("pulse", PULSE_RATE),
	("pulse rate", PULSE_RATE),
	("heart rate", PULSE_RATE),
	("temperature", TEMPERATURE),
	("body temperature", TEMPERATURE),
	("oxygen saturation", OXYGEN_SATURATION),
	("blood oxygen", OXYGEN_SATURATION),
	("spo2", OXYGEN_SATURATION),
	("sp02", OXYGEN_SATURATION),
];
const ANNOTATION_SEPARATORS: [char; 2] = ['：', ':'];

pub fn normalize_label(label: &str) -> String {
	let head = strip_annotation(label);
	let lower = head.to_lowercase();

	LABEL_ALIASES
		.iter()
		.find(|(alias, _)| *alias == lower)
		.map(|(_, canonical)| (*canonical).to_string())
		.unwrap_or_else(|| head.to_string())
}

/// Normalizes every label and drops empties and repeats, keeping first-seen order.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut out: Vec<String> = Vec::new();

	for label in labels {
		let field = normalize_label(label.as_ref());

		if field.is_empty() || out.contains(&field) {
			continue;
		}

		out.push(field);
	}

	out
}

fn strip_annotation(label: &str) -> &str {
	label.split(ANNOTATION_SEPARATORS).next().unwrap_or(label).trim()
}
