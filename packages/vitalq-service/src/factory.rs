use crate::{
	Context, Result,
	credentials::Credentials,
	retrieval::{PatientInfoInterface, RetrievalInterface, VitalsignsInterface},
};
use vitalq_domain::plan::{QueryPlan, ResourceType};

/// Pure dispatch. An unknown resource type fails here, before any store is touched.
pub fn create<'a>(
	ctx: Context<'a>,
	resource_type: &str,
	plan: QueryPlan,
	credentials: &'a Credentials,
) -> Result<RetrievalInterface<'a>> {
	let interface = match resource_type.parse::<ResourceType>()? {
		ResourceType::PatientInfo =>
			RetrievalInterface::PatientInfo(PatientInfoInterface { ctx, plan, credentials }),
		ResourceType::Vitalsigns =>
			RetrievalInterface::Vitalsigns(VitalsignsInterface { ctx, plan, credentials }),
	};

	Ok(interface)
}
