//! Prompt templates for the planning and rendering passes.
//!
//! Placeholders are `{name}` and are filled by [`fill`]. Templates read from the lookup store use
//! the same placeholders.

use crate::classify::Classification;

pub const SYSTEM_PROMPT: &str =
	"You are an assistant for a care team. Produce exactly the output the request asks for.";

pub const PLAN_TEMPLATE: &str = "\
The following tool schema is available:
{tools}
###
question: {user_input}

Follow these rules for the output. If no tool fits the question, output none.
- Output the tool that answers the question as JSON with its name and parameters.
- Fill the parameters only with values taken from the question.
- Use only the parameters the schema defines. Never add new ones.
- Output only the JSON, with no extra description.
- Convert every date or period into a number of days.

OUTPUT: json
";

pub const RENDER_TEMPLATE: &str = "\
The following response schema is available:
{tools}
###
question: {user_input}
data: {db_output}
{link_section}
Write a natural-language reply from the data above and follow these rules:
- Reply in a friendly tone.
- Report every value in data. Do not invent values.
- Field codes mean: SYS is blood pressure, TP is temperature, SPO2 is oxygen saturation, PR is pulse.
- Mention the link only when one is given.

OUTPUT: string
";

pub const RENDER_TOOL: &str = r#"[{
    "response": "Hello, over <time range> the <data type> of <name> was <values>. Thank you! <link>"
}]"#;

pub const NO_PLAN_REPLY: &str =
	"Sorry, I could not work out which patient data the question asks for.";

const VITALSIGNS_TOOL: &str = r#"[{
    "interface_type": "vitalsigns",
    "fullName": "the patient's full name",
    "retrieve": ["requested fields, e.g. blood pressure: SYS, pulse: PR, temperature: TP, oxygen saturation: SPO2"],
    "conditions": {
        "duration": "period in days",
        "sortby": {"field": "ascending or descending"},
        "limit": "maximum number of records"
    }
}]"#;

const DEFAULT_TOOL: &str = r#"[{
    "interface_type": "patient_info",
    "fullName": "the patient's full name",
    "retrieve": ["requested patient attributes, e.g. birthday, sex, organization"]
}, {
    "interface_type": "vitalsigns",
    "fullName": "the patient's full name",
    "retrieve": ["requested fields, e.g. blood pressure: SYS, pulse: PR, temperature: TP, oxygen saturation: SPO2"],
    "conditions": {
        "duration": "period in days",
        "sortby": {"field": "ascending or descending"},
        "limit": "maximum number of records"
    }
}]"#;

/// Compiled-in tool schema for a classification. Appointments have no retrievable resource.
pub fn builtin_tools(classification: Classification) -> Option<&'static str> {
	match classification {
		Classification::Vitalsigns => Some(VITALSIGNS_TOOL),
		Classification::Default => Some(DEFAULT_TOOL),
		Classification::Appointments => None,
	}
}

/// Single pass, so braces inside substituted values are never treated as placeholders.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
	let mut out = String::with_capacity(template.len());
	let mut rest = template;

	while let Some(open) = rest.find('{') {
		out.push_str(&rest[..open]);

		let after = &rest[open + 1..];
		let replacement = after.find('}').and_then(|close| {
			let name = &after[..close];

			values.iter().find(|(key, _)| *key == name).map(|(_, value)| (close, *value))
		});

		match replacement {
			Some((close, value)) => {
				out.push_str(value);

				rest = &after[close + 1..];
			},
			None => {
				out.push('{');

				rest = after;
			},
		}
	}

	out.push_str(rest);

	out
}

pub fn plan_prompt(template: &str, tools: &str, user_input: &str) -> String {
	fill(template, &[("tools", tools), ("user_input", user_input)])
}

/// The link line is left out entirely when there is no link.
pub fn render_prompt(user_input: &str, db_output: &str, link: Option<&str>) -> String {
	let link_section = link.map(|link| format!("link: {link}\n")).unwrap_or_default();

	fill(
		RENDER_TEMPLATE,
		&[
			("tools", RENDER_TOOL),
			("user_input", user_input),
			("db_output", db_output),
			("link_section", link_section.as_str()),
		],
	)
}
