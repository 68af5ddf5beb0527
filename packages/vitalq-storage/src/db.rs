use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

const RELATIONAL_SCHEMA_LOCK_ID: i64 = 7_320_401;
const DOCUMENT_SCHEMA_LOCK_ID: i64 = 7_320_402;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &vitalq_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_relational_schema(&self) -> Result<()> {
		self.apply_schema(&schema::render_relational_schema(), RELATIONAL_SCHEMA_LOCK_ID).await
	}

	pub async fn ensure_document_schema(&self) -> Result<()> {
		self.apply_schema(&schema::render_document_schema(), DOCUMENT_SCHEMA_LOCK_ID).await
	}

	async fn apply_schema(&self, sql: &str, lock_id: i64) -> Result<()> {
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
