use crate::plan::{Conditions, QueryPlan, ResourceType};

/// Splits a vital-sign plan into one single-field plan per requested field, in field order.
///
/// Each sub-plan keeps the window and limit, and only the sort entry for its own field. A
/// patient-info plan is a projection rather than a metric and passes through whole.
pub fn decompose(plan: &QueryPlan) -> Vec<QueryPlan> {
	match plan.resource_type {
		ResourceType::PatientInfo => vec![plan.clone()],
		ResourceType::Vitalsigns => plan
			.fields
			.iter()
			.map(|field| QueryPlan {
				resource_type: plan.resource_type,
				patient_name: plan.patient_name.clone(),
				fields: vec![field.clone()],
				conditions: Conditions {
					duration_days: plan.conditions.duration_days,
					sort_by: plan.sort_for(field).cloned().into_iter().collect(),
					limit: plan.conditions.limit,
				},
			})
			.collect(),
	}
}
