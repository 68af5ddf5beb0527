pub mod access;
pub mod compose;
pub mod credentials;
pub mod factory;
pub mod identity;
pub mod pipeline;
pub mod retrieval;
pub mod stores;

mod error;

pub use access::{AccessDecision, AccessStage};
pub use compose::Composed;
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use identity::ResolvedPatient;
pub use pipeline::{Answer, StructuredQuery};
pub use retrieval::{ResultRecord, RetrievalInterface};
pub use stores::{DocumentStore, LookupStore, PgDocumentStore, PgLookupStore, Stores};

use std::{future::Future, pin::Pin, sync::Arc};

use vitalq_config::{Config, Documents, LlmProviderConfig, Retrieval};
use vitalq_providers::completion::{self, ChatMessage};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, vitalq_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
		Self { completion }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { completion: Arc::new(DefaultProviders) }
	}
}

/// Everything a retrieval interface reads besides its plan and the caller.
#[derive(Clone, Copy)]
pub struct Context<'a> {
	pub stores: &'a Stores,
	pub documents: &'a Documents,
	pub retrieval: &'a Retrieval,
}

pub struct QueryService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
}
impl QueryService {
	pub fn new(cfg: Config, stores: Stores) -> Self {
		Self { cfg, stores, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, stores: Stores, providers: Providers) -> Self {
		Self { cfg, stores, providers }
	}

	pub fn context(&self) -> Context<'_> {
		Context {
			stores: &self.stores,
			documents: &self.cfg.storage.documents,
			retrieval: &self.cfg.retrieval,
		}
	}
}

struct DefaultProviders;

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, vitalq_providers::Result<String>> {
		Box::pin(completion::complete(cfg, messages))
	}
}
