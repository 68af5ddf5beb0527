use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Caller identity as handed over by the upstream token verifier. Read-only inside the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	pub subject: String,
	#[serde(default)]
	pub permissions: BTreeSet<String>,
	#[serde(default)]
	pub roles: BTreeSet<String>,
	#[serde(default)]
	pub org_membership: Option<String>,
}
impl Credentials {
	pub fn has_permission(&self, permission: &str) -> bool {
		self.permissions.contains(permission)
	}

	/// The organization claim, if one is present and non-blank.
	pub fn organization(&self) -> Option<&str> {
		self.org_membership.as_deref().map(str::trim).filter(|org| !org.is_empty())
	}
}
