//! Throwaway Postgres databases and seed helpers for the ignored integration tests.
//!
//! A [`TestDatabase`] lives next to the database named by `VITALQ_PG_DSN`. It is dropped by
//! [`TestDatabase::cleanup`], or on drop when cleanup was never awaited.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use serde_json::Value;
use sqlx::{
	ConnectOptions, Connection, Executor, PgPool,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "VITALQ_PG_DSN";

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse {DSN_ENV}: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("vitalq_test_{}", Uuid::new_v4().simple());

		admin_conn
			.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Connection settings for either store, pointed at this database.
	pub fn postgres(&self, pool_max_conns: u32) -> vitalq_config::Postgres {
		vitalq_config::Postgres { dsn: self.dsn.clone(), pool_max_conns }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.admin_options).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();
		// Drop can run inside a runtime, so the cleanup gets a runtime of its own.
		let worker = thread::spawn(move || {
			let result = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| Error::Message(format!("Failed to build cleanup runtime: {err}.")))
				.and_then(|runtime| runtime.block_on(drop_database(&name, &admin_options)));

			if let Err(err) = result {
				eprintln!("Test database cleanup failed for {name}: {err}.");
			}
		});
		let _ = worker.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

pub async fn insert_full_name(pool: &PgPool, full_name: &str, patient_id: &str) -> Result<()> {
	sqlx::query("INSERT INTO patient_fullnames (full_name, patient_id) VALUES ($1, $2)")
		.bind(full_name)
		.bind(patient_id)
		.execute(pool)
		.await?;

	Ok(())
}

/// A revoked grant keeps its row with `revoked_at` set.
pub async fn insert_grant(
	pool: &PgPool,
	subject: &str,
	patient_id: &str,
	revoked: bool,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO patient_grants (subject, patient_id, relation, revoked_at)
VALUES ($1, $2, 'family', CASE WHEN $3 THEN now() ELSE NULL END)",
	)
	.bind(subject)
	.bind(patient_id)
	.bind(revoked)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn insert_document(
	pool: &PgPool,
	collection: &str,
	document_id: Uuid,
	body: Value,
) -> Result<()> {
	sqlx::query("INSERT INTO documents (collection, document_id, body) VALUES ($1, $2, $3)")
		.bind(collection)
		.bind(document_id)
		.bind(body)
		.execute(pool)
		.await?;

	Ok(())
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn drop_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await.map_err(|err| {
		Error::Message(format!("Failed to connect to admin database for cleanup: {err}."))
	})?;

	// Pools from the test may still hold connections.
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}
