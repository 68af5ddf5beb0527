use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct DocumentRow {
	pub document_id: Uuid,
	pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
	pub document_id: Uuid,
	pub fields: Map<String, Value>,
}
impl Document {
	/// Keeps only the listed top-level keys. An empty projection keeps the whole body.
	pub fn from_row(row: DocumentRow, projection: &[String]) -> Self {
		let body = match row.body {
			Value::Object(body) => body,
			_ => Map::new(),
		};
		let fields = if projection.is_empty() {
			body
		} else {
			body.into_iter().filter(|(key, _)| projection.iter().any(|field| field == key)).collect()
		};

		Self { document_id: row.document_id, fields }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
	BasePrompt,
	Tools,
}
impl PromptKind {
	pub fn table(&self) -> &'static str {
		match self {
			Self::BasePrompt => "llm_base_prompts",
			Self::Tools => "llm_tools",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
	Ascending,
	Descending,
}
impl SortOrder {
	pub fn as_sql(&self) -> &'static str {
		match self {
			Self::Ascending => "ASC",
			Self::Descending => "DESC",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
	pub field: String,
	pub order: SortOrder,
}

/// Closed range over an RFC 3339 timestamp stored as text in the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
	pub field: String,
	pub start: OffsetDateTime,
	pub end: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
	/// Top-level field equality, compared as JSON values.
	pub equals: Vec<(String, Value)>,
	pub time_range: Option<TimeRange>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
	pub filter: DocumentFilter,
	pub projection: Vec<String>,
	pub sort: Vec<SortField>,
	pub limit: Option<u32>,
}
