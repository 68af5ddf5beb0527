use serde::{Deserialize, Serialize};

const VITALSIGN_KEYWORDS: [&str; 12] = [
	"血壓",
	"脈搏",
	"體溫",
	"血氧",
	"blood pressure",
	"pulse",
	"heart rate",
	"temperature",
	"oxygen",
	"spo2",
	"vital sign",
	"vitalsign",
];
const APPOINTMENT_KEYWORDS: [&str; 6] =
	["預約", "會議", "安排", "appointment", "meeting", "schedule"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
	Vitalsigns,
	Appointments,
	Default,
}
impl Classification {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Vitalsigns => "vitalsigns",
			Self::Appointments => "appointments",
			Self::Default => "default",
		}
	}
}

/// Keyword classification of a free-text request. Vital-sign keywords win over appointment ones.
pub fn classify(text: &str) -> Classification {
	let lower = text.to_lowercase();

	if VITALSIGN_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
		return Classification::Vitalsigns;
	}
	if APPOINTMENT_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
		return Classification::Appointments;
	}

	Classification::Default
}
