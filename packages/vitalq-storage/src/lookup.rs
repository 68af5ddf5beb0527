//! Relational lookup store: full-name resolution, patient grants and keyed prompt content.

use crate::{Result, db::Db, models::PromptKind};

/// Exact match only. Names are not trimmed or case-folded here.
pub async fn patient_id_by_full_name(db: &Db, full_name: &str) -> Result<Option<String>> {
	let patient_id: Option<String> = sqlx::query_scalar(
		"\
SELECT patient_id
FROM patient_fullnames
WHERE full_name = $1
LIMIT 1",
	)
	.bind(full_name)
	.fetch_optional(&db.pool)
	.await?;

	Ok(patient_id)
}

pub async fn has_patient_grant(db: &Db, subject: &str, patient_id: &str) -> Result<bool> {
	let exists: bool = sqlx::query_scalar(
		"\
SELECT EXISTS (
	SELECT 1
	FROM patient_grants
	WHERE subject = $1
		AND patient_id = $2
		AND revoked_at IS NULL
)",
	)
	.bind(subject)
	.bind(patient_id)
	.fetch_one(&db.pool)
	.await?;

	Ok(exists)
}

pub async fn prompt_content(db: &Db, kind: PromptKind, query_type: &str) -> Result<Option<String>> {
	let sql = format!("SELECT content FROM {} WHERE query_type = $1", kind.table());
	let content: Option<String> =
		sqlx::query_scalar(&sql).bind(query_type).fetch_optional(&db.pool).await?;

	Ok(content)
}
