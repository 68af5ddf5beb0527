use serde_json::{Value, json};

use vitalq_domain::plan::{Conditions, QueryPlan, ResourceType, SortDirection, SortKey};
use vitalq_service::{Error, ResultRecord, factory};

use super::{FakeDocuments, FakeLookup, Harness, JANE_ID, JANE_ORG, caller, now, object};

fn jane_tp_plan() -> QueryPlan {
	QueryPlan {
		resource_type: ResourceType::Vitalsigns,
		patient_name: "Jane Doe".to_string(),
		fields: vec!["TP".to_string()],
		conditions: Conditions {
			duration_days: Some(365),
			sort_by: vec![SortKey { field: "TP".to_string(), direction: SortDirection::Descending }],
			limit: Some(3),
		},
	}
}

fn data_values<'a>(records: &'a [ResultRecord], field: &str) -> Vec<&'a Value> {
	records
		.iter()
		.filter_map(|record| match record {
			ResultRecord::Data(fields) => fields.get(field),
			ResultRecord::Link(_) => None,
		})
		.collect()
}

fn links(records: &[ResultRecord]) -> Vec<&str> {
	records.iter().filter_map(ResultRecord::as_link).collect()
}

#[tokio::test]
async fn jane_doe_scenario_returns_sorted_capped_records_and_dated_link() {
	let harness = Harness::jane(&[]);
	let credentials = caller(Some(JANE_ORG));
	let interface =
		factory::create(harness.service.context(), "vitalsigns", jane_tp_plan(), &credentials)
			.expect("Factory failed.");
	let records = interface.execute_at(now()).await.expect("Execution failed.");

	assert_eq!(data_values(&records, "TP"), vec![&json!(38.1), &json!(37.9), &json!(37.2)]);
	assert_eq!(
		links(&records),
		vec![format!("https://care.test/VitalSign/patient/{JANE_ID}?startDate=2025-06-01").as_str()]
	);
	assert_eq!(records.len(), 4);
	assert!(records.last().and_then(ResultRecord::as_link).is_some());

	let (grant_lookups, _, find_many_calls) = harness.store_calls();

	assert_eq!(grant_lookups, 0);
	assert_eq!(find_many_calls, 1);
}

#[tokio::test]
async fn post_filter_keeps_only_records_with_every_requested_field() {
	let mut documents = FakeDocuments::with_jane();

	documents.vitalsigns.push(object(json!({
		"patient": JANE_ID.to_string(),
		"createdDate": "2026-05-31T00:00:00Z",
		"TP": null,
	})));

	let harness = Harness::new(FakeLookup::with_jane(), documents, &[]);
	let credentials = caller(Some(JANE_ORG));
	let plan = QueryPlan {
		resource_type: ResourceType::Vitalsigns,
		patient_name: "Jane Doe".to_string(),
		fields: vec!["TP".to_string()],
		conditions: Conditions::default(),
	};
	let interface = factory::create(harness.service.context(), "vitalsigns", plan, &credentials)
		.expect("Factory failed.");
	let records = interface.execute_at(now()).await.expect("Execution failed.");

	for record in &records {
		if let ResultRecord::Data(fields) = record {
			assert!(fields.get("TP").is_some_and(|value| !value.is_null()));
		}
	}

	assert_eq!(data_values(&records, "TP").len(), 5);
	assert_eq!(links(&records), vec![format!("https://care.test/VitalSign/patient/{JANE_ID}")]);
}

#[tokio::test]
async fn unknown_patient_yields_empty_sequence_without_further_lookups() {
	let harness = Harness::new(FakeLookup::default(), FakeDocuments::with_jane(), &[]);
	let credentials = caller(Some(JANE_ORG));

	for resource_type in ["vitalsigns", "patient_info"] {
		let interface =
			factory::create(harness.service.context(), resource_type, jane_tp_plan(), &credentials)
				.expect("Factory failed.");
		let records = interface.execute_at(now()).await.expect("Execution failed.");

		assert!(records.is_empty());
	}

	assert_eq!(harness.store_calls(), (0, 0, 0));
}

#[tokio::test]
async fn malformed_cross_reference_is_treated_as_no_match() {
	let mut lookup = FakeLookup::default();

	lookup.names.insert("Jane Doe".to_string(), "5f0c0c0c0c0c0c0c0c0c0c0c".to_string());

	let harness = Harness::new(lookup, FakeDocuments::with_jane(), &[]);
	let credentials = caller(Some(JANE_ORG));
	let interface =
		factory::create(harness.service.context(), "vitalsigns", jane_tp_plan(), &credentials)
			.expect("Factory failed.");

	assert_eq!(interface.execute_at(now()).await.expect("Execution failed."), Vec::new());
	assert_eq!(harness.store_calls(), (0, 0, 0));
}

#[tokio::test]
async fn missing_patient_document_is_treated_as_no_match() {
	let mut documents = FakeDocuments::with_jane();

	documents.patients.clear();

	let harness = Harness::new(FakeLookup::with_jane(), documents, &[]);
	let credentials = caller(Some(JANE_ORG));
	let interface =
		factory::create(harness.service.context(), "vitalsigns", jane_tp_plan(), &credentials)
			.expect("Factory failed.");

	assert!(interface.execute_at(now()).await.expect("Execution failed.").is_empty());
	assert_eq!(harness.store_calls(), (0, 1, 0));
}

#[tokio::test]
async fn denied_at_both_stages_raises_access_denied_without_querying_vitalsigns() {
	let harness = Harness::jane(&[]);
	let credentials = caller(Some("org-2"));
	let interface =
		factory::create(harness.service.context(), "vitalsigns", jane_tp_plan(), &credentials)
			.expect("Factory failed.");
	let err = interface.execute_at(now()).await.expect_err("Expected access to be denied.");

	assert!(matches!(err, Error::AccessDenied { .. }));
	assert_eq!(harness.store_calls(), (1, 1, 0));
}

#[tokio::test]
async fn patient_grant_allows_when_organization_does_not_match() {
	let mut lookup = FakeLookup::with_jane();

	lookup.grants.insert(("user-1".to_string(), JANE_ID.to_string()));

	let harness = Harness::new(lookup, FakeDocuments::with_jane(), &[]);
	let credentials = caller(None);
	let interface =
		factory::create(harness.service.context(), "vitalsigns", jane_tp_plan(), &credentials)
			.expect("Factory failed.");
	let records = interface.execute_at(now()).await.expect("Execution failed.");

	assert_eq!(data_values(&records, "TP").len(), 3);
	assert_eq!(harness.store_calls(), (1, 1, 1));
}

#[tokio::test]
async fn stored_cross_reference_is_used_verbatim_for_grants_filters_and_links() {
	let stored_id = JANE_ID.to_string().to_uppercase();
	let mut lookup = FakeLookup::default();

	lookup.names.insert("Jane Doe".to_string(), stored_id.clone());
	lookup.grants.insert(("user-1".to_string(), stored_id.clone()));

	let mut documents = FakeDocuments::with_jane();

	documents.vitalsigns.clear();
	documents.push_vitalsign_for(&stored_id, 1, Some(36.9), Some(70));
	documents.push_vitalsign_for(&stored_id, 2, Some(37.4), Some(71));

	let harness = Harness::new(lookup, documents, &[]);
	let credentials = caller(None);
	let interface =
		factory::create(harness.service.context(), "vitalsigns", jane_tp_plan(), &credentials)
			.expect("Factory failed.");
	let records = interface.execute_at(now()).await.expect("Execution failed.");

	assert_eq!(data_values(&records, "TP"), vec![&json!(37.4), &json!(36.9)]);
	assert_eq!(
		links(&records),
		vec![format!("https://care.test/VitalSign/patient/{stored_id}?startDate=2025-06-01").as_str()]
	);
	assert_eq!(harness.store_calls(), (1, 1, 1));
}

#[tokio::test]
async fn grant_lookup_fault_is_a_storage_error_not_a_denial() {
	let mut lookup = FakeLookup::with_jane();

	lookup.fail_grants = true;

	let harness = Harness::new(lookup, FakeDocuments::with_jane(), &[]);
	let credentials = caller(Some("org-2"));
	let interface =
		factory::create(harness.service.context(), "vitalsigns", jane_tp_plan(), &credentials)
			.expect("Factory failed.");
	let err = interface.execute_at(now()).await.expect_err("Expected a storage fault.");

	assert!(matches!(err, Error::Storage { .. }));
	assert_eq!(harness.store_calls().2, 0);
}

#[tokio::test]
async fn limit_is_clamped_to_configured_maximum() {
	let mut cfg = super::test_config();

	cfg.retrieval.max_limit = 2;

	let harness =
		Harness::with_config(cfg, FakeLookup::with_jane(), FakeDocuments::with_jane(), &[]);
	let credentials = caller(Some(JANE_ORG));
	let mut plan = jane_tp_plan();

	plan.conditions.limit = Some(500);

	let interface = factory::create(harness.service.context(), "vitalsigns", plan, &credentials)
		.expect("Factory failed.");
	let records = interface.execute_at(now()).await.expect("Execution failed.");
	let queries = harness.documents.queries.lock().unwrap_or_else(|err| err.into_inner());

	assert_eq!(queries[0].limit, Some(2));
	assert_eq!(data_values(&records, "TP"), vec![&json!(38.1), &json!(37.9)]);
}

#[tokio::test]
async fn patient_info_uses_default_projection_and_appends_link() {
	let harness = Harness::jane(&[]);
	let credentials = caller(Some(JANE_ORG));
	let plan = QueryPlan {
		resource_type: ResourceType::PatientInfo,
		patient_name: "Jane Doe".to_string(),
		fields: Vec::new(),
		conditions: Conditions::default(),
	};
	let interface = factory::create(harness.service.context(), "patient_info", plan, &credentials)
		.expect("Factory failed.");
	let records = interface.execute_at(now()).await.expect("Execution failed.");

	assert_eq!(records, vec![
		ResultRecord::Data(object(json!({ "lastName": "Doe", "firstName": "Jane" }))),
		ResultRecord::link(format!("https://care.test/MyPatient/{JANE_ID}")),
	]);
}

#[tokio::test]
async fn patient_info_honors_requested_fields() {
	let harness = Harness::jane(&[]);
	let credentials = caller(Some(JANE_ORG));
	let plan = QueryPlan {
		resource_type: ResourceType::PatientInfo,
		patient_name: "Jane Doe".to_string(),
		fields: vec!["birthday".to_string()],
		conditions: Conditions::default(),
	};
	let interface = factory::create(harness.service.context(), "patient_info", plan, &credentials)
		.expect("Factory failed.");
	let records = interface.execute_at(now()).await.expect("Execution failed.");

	assert_eq!(records[0], ResultRecord::Data(object(json!({ "birthday": "1950-02-03" }))));
}

#[tokio::test]
async fn patient_info_denied_raises_access_denied() {
	let harness = Harness::jane(&[]);
	let credentials = caller(None);
	let plan = QueryPlan {
		resource_type: ResourceType::PatientInfo,
		patient_name: "Jane Doe".to_string(),
		fields: Vec::new(),
		conditions: Conditions::default(),
	};
	let interface = factory::create(harness.service.context(), "patient_info", plan, &credentials)
		.expect("Factory failed.");

	assert!(matches!(
		interface.execute_at(now()).await,
		Err(Error::AccessDenied { .. })
	));
	assert_eq!(harness.store_calls(), (1, 1, 0));
}
