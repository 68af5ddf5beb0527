//! Full-name to patient resolution across the lookup store and the document store.
//!
//! Misses at either store, and a cross-reference that is not a well-formed document identifier,
//! resolve to `None`. Only store faults are errors.

use serde_json::Value;
use uuid::Uuid;

use crate::{Context, Result};

pub const ORGANIZATION_FIELD: &str = "organization";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPatient {
	pub patient_id: Uuid,
	/// The cross-reference exactly as stored. Grants, vital-sign references, and links key on it.
	pub patient_id_str: String,
	/// Empty when the patient document carries no organization.
	pub patient_org_id: String,
}

pub async fn resolve(ctx: Context<'_>, full_name: &str) -> Result<Option<ResolvedPatient>> {
	let Some(raw_id) = ctx.stores.lookup.patient_id_by_full_name(full_name).await? else {
		tracing::info!(full_name, "No matching patient for name.");

		return Ok(None);
	};
	let patient_id_str = raw_id.trim().to_string();
	let Ok(patient_id) = Uuid::parse_str(&patient_id_str) else {
		tracing::warn!(full_name, patient_id = %raw_id, "Patient cross-reference is malformed.");

		return Ok(None);
	};
	let projection = [ORGANIZATION_FIELD.to_string()];
	let Some(patient) = ctx
		.stores
		.documents
		.find_one(&ctx.documents.patients_collection, patient_id, &projection)
		.await?
	else {
		tracing::info!(%patient_id, "Patient document is missing.");

		return Ok(None);
	};
	let patient_org_id = organization_id(patient.fields.get(ORGANIZATION_FIELD));

	Ok(Some(ResolvedPatient { patient_id, patient_id_str, patient_org_id }))
}

/// Store-native identifier shapes (`{"$oid": ...}`, numbers) collapse to plain strings.
pub fn organization_id(value: Option<&Value>) -> String {
	match value {
		Some(Value::String(id)) => id.trim().to_string(),
		Some(Value::Object(wrapped)) => match wrapped.get("$oid") {
			Some(Value::String(id)) => id.trim().to_string(),
			_ => String::new(),
		},
		Some(Value::Number(id)) => id.to_string(),
		_ => String::new(),
	}
}
