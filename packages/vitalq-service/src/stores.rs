//! Store seams. The pipeline only sees these traits; the Postgres adapters are what the process
//! entry point wires in.

use std::sync::Arc;

use uuid::Uuid;

use crate::BoxFuture;
use vitalq_storage::{
	db::Db,
	documents, lookup,
	models::{Document, FindQuery, PromptKind},
};

pub trait LookupStore
where
	Self: Send + Sync,
{
	fn patient_id_by_full_name<'a>(
		&'a self,
		full_name: &'a str,
	) -> BoxFuture<'a, vitalq_storage::Result<Option<String>>>;

	fn has_patient_grant<'a>(
		&'a self,
		subject: &'a str,
		patient_id: &'a str,
	) -> BoxFuture<'a, vitalq_storage::Result<bool>>;

	fn prompt_content<'a>(
		&'a self,
		kind: PromptKind,
		query_type: &'a str,
	) -> BoxFuture<'a, vitalq_storage::Result<Option<String>>>;
}

pub trait DocumentStore
where
	Self: Send + Sync,
{
	fn find_one<'a>(
		&'a self,
		collection: &'a str,
		document_id: Uuid,
		projection: &'a [String],
	) -> BoxFuture<'a, vitalq_storage::Result<Option<Document>>>;

	fn find_many<'a>(
		&'a self,
		collection: &'a str,
		query: &'a FindQuery,
	) -> BoxFuture<'a, vitalq_storage::Result<Vec<Document>>>;
}

#[derive(Clone)]
pub struct Stores {
	pub lookup: Arc<dyn LookupStore>,
	pub documents: Arc<dyn DocumentStore>,
}
impl Stores {
	pub fn new(lookup: Arc<dyn LookupStore>, documents: Arc<dyn DocumentStore>) -> Self {
		Self { lookup, documents }
	}

	pub fn postgres(relational: Db, documents: Db) -> Self {
		Self {
			lookup: Arc::new(PgLookupStore { db: relational }),
			documents: Arc::new(PgDocumentStore { db: documents }),
		}
	}
}

pub struct PgLookupStore {
	pub db: Db,
}

impl LookupStore for PgLookupStore {
	fn patient_id_by_full_name<'a>(
		&'a self,
		full_name: &'a str,
	) -> BoxFuture<'a, vitalq_storage::Result<Option<String>>> {
		Box::pin(lookup::patient_id_by_full_name(&self.db, full_name))
	}

	fn has_patient_grant<'a>(
		&'a self,
		subject: &'a str,
		patient_id: &'a str,
	) -> BoxFuture<'a, vitalq_storage::Result<bool>> {
		Box::pin(lookup::has_patient_grant(&self.db, subject, patient_id))
	}

	fn prompt_content<'a>(
		&'a self,
		kind: PromptKind,
		query_type: &'a str,
	) -> BoxFuture<'a, vitalq_storage::Result<Option<String>>> {
		Box::pin(lookup::prompt_content(&self.db, kind, query_type))
	}
}

pub struct PgDocumentStore {
	pub db: Db,
}

impl DocumentStore for PgDocumentStore {
	fn find_one<'a>(
		&'a self,
		collection: &'a str,
		document_id: Uuid,
		projection: &'a [String],
	) -> BoxFuture<'a, vitalq_storage::Result<Option<Document>>> {
		Box::pin(documents::find_one(&self.db, collection, document_id, projection))
	}

	fn find_many<'a>(
		&'a self,
		collection: &'a str,
		query: &'a FindQuery,
	) -> BoxFuture<'a, vitalq_storage::Result<Vec<Document>>> {
		Box::pin(documents::find_many(&self.db, collection, query))
	}
}
