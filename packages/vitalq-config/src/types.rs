use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub retrieval: Retrieval,
	#[serde(default)]
	pub prompts: Prompts,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// Lookup store holding the full-name table, patient grants and prompt content.
	pub relational: Postgres,
	pub documents: Documents,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Documents {
	pub dsn: String,
	pub pool_max_conns: u32,
	#[serde(default = "default_patients_collection")]
	pub patients_collection: String,
	#[serde(default = "default_vitalsigns_collection")]
	pub vitalsigns_collection: String,
}
impl Documents {
	/// Connection settings for the pool behind the document store.
	pub fn connection(&self) -> Postgres {
		Postgres { dsn: self.dsn.clone(), pool_max_conns: self.pool_max_conns }
	}
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retrieval {
	/// Patient attributes returned when a patient-info plan names no fields.
	pub patient_projection: Vec<String>,
	/// The patient identifier is appended to this base.
	pub patient_link_base: String,
	/// The patient identifier is appended to this base, followed by `?startDate=` when the plan
	/// carries a time window.
	pub vitalsigns_link_base: String,
	#[serde(default = "default_max_limit")]
	pub max_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct Prompts {
	/// One of "builtin" or "database".
	pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
	pub required_permission: Option<String>,
}

impl Default for Prompts {
	fn default() -> Self {
		Self { source: "builtin".to_string() }
	}
}

fn default_patients_collection() -> String {
	"patients".to_string()
}

fn default_vitalsigns_collection() -> String {
	"vitalsigns".to_string()
}

fn default_max_limit() -> u32 {
	1_000
}
