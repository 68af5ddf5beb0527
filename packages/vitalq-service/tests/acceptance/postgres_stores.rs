use serde_json::{Value, json};
use time::{Duration, format_description::well_known::Rfc3339};
use uuid::Uuid;

use vitalq_service::{Error, QueryService, ResultRecord, StructuredQuery, Stores};
use vitalq_storage::db::Db;
use vitalq_testkit::TestDatabase;

use super::{JANE_ORG, caller, now, object, test_config};

async fn connect(test_db: &TestDatabase) -> Db {
	Db::connect(&test_db.postgres(2)).await.expect("Failed to connect to Postgres.")
}

async fn insert_document(db: &Db, collection: &str, document_id: Uuid, body: Value) {
	vitalq_testkit::insert_document(&db.pool, collection, document_id, body)
		.await
		.expect("Failed to insert document.");
}

async fn seed(relational: &Db, documents: &Db) -> Uuid {
	let patient_id = Uuid::new_v4();

	vitalq_testkit::insert_full_name(&relational.pool, "Jane Doe", &patient_id.to_string())
		.await
		.expect("Failed to insert full name.");
	vitalq_testkit::insert_grant(&relational.pool, "user-1", &patient_id.to_string(), false)
		.await
		.expect("Failed to insert grant.");

	insert_document(
		documents,
		"patients",
		patient_id,
		json!({ "organization": { "$oid": JANE_ORG }, "lastName": "Doe", "firstName": "Jane" }),
	)
	.await;

	for (days_ago, tp) in [(1, json!(36.5)), (2, json!(38.1)), (3, Value::Null), (4, json!(37.2))] {
		let created =
			(now() - Duration::days(days_ago)).format(&Rfc3339).expect("Failed to format timestamp.");

		insert_document(
			documents,
			"vitalsigns",
			Uuid::new_v4(),
			json!({ "patient": patient_id.to_string(), "createdDate": created, "TP": tp }),
		)
		.await;
	}

	patient_id
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set VITALQ_PG_DSN to run."]
async fn postgres_stores_serve_structured_queries() {
	let Some(base_dsn) = vitalq_testkit::env_dsn() else {
		eprintln!("Skipping postgres_stores_serve_structured_queries; set VITALQ_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let relational = connect(&test_db).await;
	let documents = connect(&test_db).await;

	relational.ensure_relational_schema().await.expect("Failed to ensure relational schema.");
	documents.ensure_document_schema().await.expect("Failed to ensure document schema.");

	let patient_id = seed(&relational, &documents).await;
	let service = QueryService::new(test_config(), Stores::postgres(relational, documents));
	let query = StructuredQuery {
		interface_type: "vitalsigns".to_string(),
		patient_name: "Jane Doe".to_string(),
		retrieve: vec!["TP".to_string()],
		conditions: object(json!({ "duration": 30, "sortby": { "TP": "descending" } })),
	};
	let records = service
		.execute_queries_at(std::slice::from_ref(&query), &caller(Some(JANE_ORG)), now())
		.await
		.expect("Structured query failed.");

	assert_eq!(records, vec![
		ResultRecord::Data(object(json!({ "TP": 38.1 }))),
		ResultRecord::Data(object(json!({ "TP": 37.2 }))),
		ResultRecord::Data(object(json!({ "TP": 36.5 }))),
		ResultRecord::link(format!(
			"https://care.test/VitalSign/patient/{patient_id}?startDate=2026-05-02"
		)),
	]);

	// A patient grant admits a caller from another organization.
	let records = service
		.execute_queries_at(std::slice::from_ref(&query), &caller(Some("org-2")), now())
		.await
		.expect("Granted query failed.");

	assert_eq!(records.len(), 4);

	let mut stranger = caller(Some("org-2"));

	stranger.subject = "user-2".to_string();

	let err = service
		.execute_queries_at(std::slice::from_ref(&query), &stranger, now())
		.await
		.expect_err("Expected access to be denied.");

	assert!(matches!(err, Error::AccessDenied { .. }));

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
