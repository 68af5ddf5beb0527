mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Documents, LlmProviderConfig, Postgres, Prompts, Providers, Retrieval, Security,
	Service, Storage,
};

use std::{fs, path::Path};

pub const PROMPT_SOURCES: [&str; 2] = ["builtin", "database"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(path, &raw)
}

pub fn parse(path: &Path, raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	for (label, dsn, pool_max_conns) in [
		("storage.relational", &cfg.storage.relational.dsn, cfg.storage.relational.pool_max_conns),
		("storage.documents", &cfg.storage.documents.dsn, cfg.storage.documents.pool_max_conns),
	] {
		if dsn.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label}.dsn must be non-empty.") });
		}
		if pool_max_conns == 0 {
			return Err(Error::Validation {
				message: format!("{label}.pool_max_conns must be greater than zero."),
			});
		}
	}

	for (label, value) in [
		("storage.documents.patients_collection", &cfg.storage.documents.patients_collection),
		("storage.documents.vitalsigns_collection", &cfg.storage.documents.vitalsigns_collection),
		("retrieval.patient_link_base", &cfg.retrieval.patient_link_base),
		("retrieval.vitalsigns_link_base", &cfg.retrieval.vitalsigns_link_base),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.retrieval.patient_projection.is_empty() {
		return Err(Error::Validation {
			message: "retrieval.patient_projection must be non-empty.".to_string(),
		});
	}
	if cfg.retrieval.patient_projection.iter().any(|field| field.trim().is_empty()) {
		return Err(Error::Validation {
			message: "retrieval.patient_projection must not contain empty field names.".to_string(),
		});
	}
	if cfg.retrieval.max_limit == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.llm.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider llm api_key must be non-empty.".to_string(),
		});
	}
	if !cfg.providers.llm.temperature.is_finite()
		|| !(0.0..=2.0).contains(&cfg.providers.llm.temperature)
	{
		return Err(Error::Validation {
			message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.providers.llm.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !PROMPT_SOURCES.contains(&cfg.prompts.source.as_str()) {
		return Err(Error::Validation {
			message: "prompts.source must be one of builtin or database.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}
	if cfg
		.security
		.required_permission
		.as_deref()
		.map(|permission| permission.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.required_permission = None;
	}

	cfg.prompts.source = cfg.prompts.source.trim().to_ascii_lowercase();
}
