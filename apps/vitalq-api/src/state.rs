use std::sync::Arc;

use vitalq_service::{QueryService, Stores};
use vitalq_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<QueryService>,
}
impl AppState {
	pub async fn new(config: vitalq_config::Config) -> color_eyre::Result<Self> {
		let relational = Db::connect(&config.storage.relational).await?;

		relational.ensure_relational_schema().await?;

		let documents = Db::connect(&config.storage.documents.connection()).await?;

		documents.ensure_document_schema().await?;

		let stores = Stores::postgres(relational, documents);

		Ok(Self::from_service(QueryService::new(config, stores)))
	}

	pub fn from_service(service: QueryService) -> Self {
		Self { service: Arc::new(service) }
	}

	pub fn api_auth_token(&self) -> Option<&str> {
		self.service.cfg.security.api_auth_token.as_deref()
	}
}
