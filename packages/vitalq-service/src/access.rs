//! Two-stage access policy: organization membership first, patient-specific grant second.

use crate::{Error, Result, credentials::Credentials, identity::ResolvedPatient, stores::LookupStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStage {
	Organization,
	PatientGrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
	Allowed(AccessStage),
	Denied,
}
impl AccessDecision {
	pub fn into_result(self) -> Result<AccessStage> {
		match self {
			Self::Allowed(stage) => Ok(stage),
			Self::Denied => Err(Error::AccessDenied { message: "Access denied.".to_string() }),
		}
	}
}

/// The grant lookup only runs when the organization check fails. A fault in that lookup is an
/// error, never a denial.
pub async fn authorize(
	lookup: &dyn LookupStore,
	credentials: &Credentials,
	patient: &ResolvedPatient,
) -> Result<AccessDecision> {
	if organization_matches(credentials, patient) {
		tracing::info!(
			subject = %credentials.subject,
			patient_id = %patient.patient_id_str,
			stage = "organization",
			"Access allowed."
		);

		return Ok(AccessDecision::Allowed(AccessStage::Organization));
	}

	let patient_id = patient.patient_id_str.as_str();

	if lookup.has_patient_grant(&credentials.subject, patient_id).await? {
		tracing::info!(
			subject = %credentials.subject,
			patient_id = %patient_id,
			stage = "patient_grant",
			"Access allowed."
		);

		return Ok(AccessDecision::Allowed(AccessStage::PatientGrant));
	}

	tracing::info!(subject = %credentials.subject, patient_id = %patient_id, "Access denied.");

	Ok(AccessDecision::Denied)
}

fn organization_matches(credentials: &Credentials, patient: &ResolvedPatient) -> bool {
	!patient.patient_org_id.is_empty()
		&& credentials.organization() == Some(patient.patient_org_id.as_str())
}
