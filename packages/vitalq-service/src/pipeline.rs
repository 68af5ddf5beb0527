//! Entry points: free text to answer, structured queries to records, and the rendering pass.

use futures_util::future;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
	Error, QueryService, Result,
	compose::{self, Composed},
	credentials::Credentials,
	factory,
	retrieval::{ResultRecord, RetrievalInterface},
};
use vitalq_domain::{
	classify::{self, Classification},
	decompose,
	plan::{self, QueryPlan},
	prompt,
};
use vitalq_providers::completion::ChatMessage;
use vitalq_storage::models::PromptKind;

const PROMPT_SOURCE_DATABASE: &str = "database";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
	pub output_text: String,
	pub records: Vec<Map<String, Value>>,
	pub link: Option<String>,
	/// `None` when no plan could be built from the question.
	pub plan: Option<QueryPlan>,
}

/// A query that arrives already structured, bypassing the planning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
	pub interface_type: String,
	#[serde(rename = "patientName")]
	pub patient_name: String,
	#[serde(default)]
	pub retrieve: Vec<String>,
	#[serde(default)]
	pub conditions: Map<String, Value>,
}

impl QueryService {
	pub async fn answer(&self, input_text: &str, credentials: &Credentials) -> Result<Answer> {
		self.answer_at(input_text, credentials, OffsetDateTime::now_utc()).await
	}

	pub async fn answer_at(
		&self,
		input_text: &str,
		credentials: &Credentials,
		now: OffsetDateTime,
	) -> Result<Answer> {
		self.ensure_permission(credentials)?;

		let classification = classify::classify(input_text);
		let Some(plan) = self.plan(classification, input_text).await? else {
			tracing::info!(classification = classification.as_str(), "No query plan for input.");

			return Ok(Answer {
				output_text: prompt::NO_PLAN_REPLY.to_string(),
				records: Vec::new(),
				link: None,
				plan: None,
			});
		};
		let ctx = self.context();
		let interfaces = decompose::decompose(&plan)
			.into_iter()
			.map(|sub_plan| {
				factory::create(ctx, sub_plan.resource_type.as_str(), sub_plan, credentials)
			})
			.collect::<Result<Vec<_>>>()?;
		let Composed { records, link } = run_interfaces(&interfaces, now).await?;
		let output_text = self.render(input_text, &records, link.as_deref()).await?;

		Ok(Answer { output_text, records, link, plan: Some(plan) })
	}

	/// Runs already-structured queries in order and concatenates their records, links included.
	///
	/// Every query is validated and dispatched before the first store access.
	pub async fn execute_queries(
		&self,
		queries: &[StructuredQuery],
		credentials: &Credentials,
	) -> Result<Vec<ResultRecord>> {
		self.execute_queries_at(queries, credentials, OffsetDateTime::now_utc()).await
	}

	pub async fn execute_queries_at(
		&self,
		queries: &[StructuredQuery],
		credentials: &Credentials,
		now: OffsetDateTime,
	) -> Result<Vec<ResultRecord>> {
		self.ensure_permission(credentials)?;

		let ctx = self.context();
		let mut interfaces = Vec::with_capacity(queries.len());

		for (index, query) in queries.iter().enumerate() {
			let plan = structured_plan(index, query)?;

			interfaces.push(factory::create(ctx, &query.interface_type, plan, credentials)?);
		}

		let results =
			future::try_join_all(interfaces.iter().map(|interface| interface.execute_at(now)))
				.await?;

		Ok(results.into_iter().flatten().collect())
	}

	/// Second language-model pass over the retrieved records.
	pub async fn render(
		&self,
		input_text: &str,
		records: &[Map<String, Value>],
		link: Option<&str>,
	) -> Result<String> {
		let db_output =
			Value::Array(records.iter().cloned().map(Value::Object).collect()).to_string();
		let messages = [
			ChatMessage::system(prompt::SYSTEM_PROMPT),
			ChatMessage::user(prompt::render_prompt(input_text, &db_output, link)),
		];
		let raw =
			self.providers.completion.complete(&self.cfg.providers.llm, &messages).await?;
		let text = raw.trim().trim_matches('"').trim();

		if text.is_empty() || text.eq_ignore_ascii_case("none") {
			return Err(Error::Provider {
				message: "Rendering pass returned no answer.".to_string(),
			});
		}

		Ok(text.to_string())
	}

	/// Planning pass. `Ok(None)` is the normal "no plan" outcome.
	pub async fn plan(
		&self,
		classification: Classification,
		input_text: &str,
	) -> Result<Option<QueryPlan>> {
		let Some((template, tools)) = self.planning_prompt(classification).await? else {
			return Ok(None);
		};
		let messages = [
			ChatMessage::system(prompt::SYSTEM_PROMPT),
			ChatMessage::user(prompt::plan_prompt(&template, &tools, input_text)),
		];
		let raw =
			self.providers.completion.complete(&self.cfg.providers.llm, &messages).await?;

		tracing::debug!(classification = classification.as_str(), raw = %raw, "Planning output.");

		Ok(plan::build(classification, &raw)?)
	}

	/// Gate on `security.required_permission`, when one is configured.
	pub fn ensure_permission(&self, credentials: &Credentials) -> Result<()> {
		let Some(required) = self.cfg.security.required_permission.as_deref() else {
			return Ok(());
		};

		if credentials.has_permission(required) {
			return Ok(());
		}

		Err(Error::AccessDenied {
			message: format!("Permission {required} is required to submit a query."),
		})
	}

	/// Template and tool schema for a classification. Database content wins when configured and
	/// present; the compiled-in text fills any gap.
	async fn planning_prompt(
		&self,
		classification: Classification,
	) -> Result<Option<(String, String)>> {
		let builtin_tools = prompt::builtin_tools(classification).map(str::to_string);

		if self.cfg.prompts.source != PROMPT_SOURCE_DATABASE {
			return Ok(builtin_tools.map(|tools| (prompt::PLAN_TEMPLATE.to_string(), tools)));
		}

		let query_type = classification.as_str();
		let lookup = self.stores.lookup.as_ref();
		let template = lookup
			.prompt_content(PromptKind::BasePrompt, query_type)
			.await?
			.unwrap_or_else(|| prompt::PLAN_TEMPLATE.to_string());
		let tools = lookup.prompt_content(PromptKind::Tools, query_type).await?.or(builtin_tools);

		Ok(tools.map(|tools| (template, tools)))
	}
}

async fn run_interfaces(
	interfaces: &[RetrievalInterface<'_>],
	now: OffsetDateTime,
) -> Result<Composed> {
	let results =
		future::try_join_all(interfaces.iter().map(|interface| interface.execute_at(now))).await?;

	Ok(compose::compose(results))
}

fn structured_plan(index: usize, query: &StructuredQuery) -> Result<QueryPlan> {
	let mut draft = Map::new();

	draft.insert("interface_type".to_string(), Value::String(query.interface_type.clone()));
	draft.insert("patientName".to_string(), Value::String(query.patient_name.clone()));
	draft.insert(
		"retrieve".to_string(),
		Value::Array(query.retrieve.iter().cloned().map(Value::String).collect()),
	);
	draft.insert("conditions".to_string(), Value::Object(query.conditions.clone()));

	plan::from_draft(Classification::Default, draft)?.ok_or_else(|| Error::InvalidRequest {
		message: format!(
			"queries[{index}] needs a patientName and, for vitalsigns, at least one retrieve field."
		),
	})
}
