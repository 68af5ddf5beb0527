//! Document store over JSONB rows keyed by collection and UUID.

use sqlx::{Postgres, QueryBuilder, types::Json};
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{Document, DocumentRow, FindQuery},
};

pub async fn find_one(
	db: &Db,
	collection: &str,
	document_id: Uuid,
	projection: &[String],
) -> Result<Option<Document>> {
	let row: Option<DocumentRow> = sqlx::query_as(
		"\
SELECT document_id, body
FROM documents
WHERE collection = $1 AND document_id = $2",
	)
	.bind(collection)
	.bind(document_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row.map(|row| Document::from_row(row, projection)))
}

/// Rows without a sort key present order after rows that have one. Without sort fields, rows come
/// back in insertion order.
pub async fn find_many(db: &Db, collection: &str, query: &FindQuery) -> Result<Vec<Document>> {
	if query.limit == Some(0) {
		return Err(Error::InvalidArgument("limit must be greater than zero.".to_string()));
	}
	if query.sort.iter().any(|key| key.field.trim().is_empty()) {
		return Err(Error::InvalidArgument("sort fields must be non-empty.".to_string()));
	}

	let mut builder = build_find_many(collection, query);

	tracing::debug!(collection, sql = builder.sql(), "Running document query.");

	let rows: Vec<DocumentRow> = builder.build_query_as().fetch_all(&db.pool).await?;

	Ok(rows.into_iter().map(|row| Document::from_row(row, &query.projection)).collect())
}

fn build_find_many<'a>(collection: &'a str, query: &'a FindQuery) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new("SELECT document_id, body FROM documents WHERE collection = ");

	builder.push_bind(collection);

	for (field, value) in &query.filter.equals {
		builder.push(" AND body -> ");
		builder.push_bind(field.as_str());
		builder.push(" = ");
		builder.push_bind(Json(value));
	}

	// Unparseable timestamps fall outside the window.
	if let Some(range) = &query.filter.time_range {
		builder.push(" AND CASE WHEN pg_input_is_valid(body ->> ");
		builder.push_bind(range.field.as_str());
		builder.push(", 'timestamptz') THEN (body ->> ");
		builder.push_bind(range.field.as_str());
		builder.push(")::timestamptz END BETWEEN ");
		builder.push_bind(range.start);
		builder.push(" AND ");
		builder.push_bind(range.end);
	}

	builder.push(" ORDER BY ");

	for key in &query.sort {
		builder.push("body -> ");
		builder.push_bind(key.field.as_str());
		builder.push(" ");
		builder.push(key.order.as_sql());
		builder.push(" NULLS LAST, ");
	}

	builder.push("inserted_at ASC, document_id ASC");

	if let Some(limit) = query.limit {
		builder.push(" LIMIT ");
		builder.push_bind(i64::from(limit));
	}

	builder
}
