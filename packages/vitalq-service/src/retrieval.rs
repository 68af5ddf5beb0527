//! Retrieval interfaces, one per resource type.
//!
//! Both interfaces resolve the patient and evaluate access before touching the resource itself.
//! An unresolved patient yields an empty sequence. A denial is a [`crate::Error::AccessDenied`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};

use crate::{
	Context, Result, access, credentials::Credentials, identity, identity::ResolvedPatient,
};
use vitalq_domain::plan::{QueryPlan, ResourceType, SortDirection};
use vitalq_storage::models::{DocumentFilter, FindQuery, SortField, SortOrder, TimeRange};

pub const PATIENT_REFERENCE_FIELD: &str = "patient";
pub const CREATED_DATE_FIELD: &str = "createdDate";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultRecord {
	Link(LinkRecord),
	Data(Map<String, Value>),
}
impl ResultRecord {
	pub fn link(url: impl Into<String>) -> Self {
		Self::Link(LinkRecord { link: url.into() })
	}

	pub fn as_link(&self) -> Option<&str> {
		match self {
			Self::Link(record) => Some(record.link.as_str()),
			Self::Data(_) => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkRecord {
	pub link: String,
}

pub struct PatientInfoInterface<'a> {
	pub(crate) ctx: Context<'a>,
	pub(crate) plan: QueryPlan,
	pub(crate) credentials: &'a Credentials,
}
impl PatientInfoInterface<'_> {
	async fn execute(&self) -> Result<Vec<ResultRecord>> {
		let Some(patient) =
			resolve_and_authorize(self.ctx, self.credentials, &self.plan.patient_name).await?
		else {
			return Ok(Vec::new());
		};
		let projection = if self.plan.fields.is_empty() {
			self.ctx.retrieval.patient_projection.as_slice()
		} else {
			self.plan.fields.as_slice()
		};
		let mut records = Vec::with_capacity(2);

		if let Some(document) = self
			.ctx
			.stores
			.documents
			.find_one(&self.ctx.documents.patients_collection, patient.patient_id, projection)
			.await?
		{
			records.push(ResultRecord::Data(document.fields));
		}

		records.push(ResultRecord::link(patient_link(
			&self.ctx.retrieval.patient_link_base,
			&patient.patient_id_str,
		)));

		Ok(records)
	}
}

pub struct VitalsignsInterface<'a> {
	pub(crate) ctx: Context<'a>,
	pub(crate) plan: QueryPlan,
	pub(crate) credentials: &'a Credentials,
}
impl VitalsignsInterface<'_> {
	async fn execute_at(&self, now: OffsetDateTime) -> Result<Vec<ResultRecord>> {
		let Some(patient) =
			resolve_and_authorize(self.ctx, self.credentials, &self.plan.patient_name).await?
		else {
			return Ok(Vec::new());
		};
		let patient_id = patient.patient_id_str.as_str();
		let window = self.plan.conditions.duration_days.map(|days| window_start(now, days));
		let query = self.find_query(patient_id, window, now);

		tracing::debug!(
			patient_id = %patient_id,
			fields = ?self.plan.fields,
			window_start = ?window,
			limit = ?query.limit,
			"Querying vital signs."
		);

		let documents = self
			.ctx
			.stores
			.documents
			.find_many(&self.ctx.documents.vitalsigns_collection, &query)
			.await?;
		let mut records: Vec<ResultRecord> = documents
			.into_iter()
			.filter(|document| has_every_field(&document.fields, &self.plan.fields))
			.map(|document| ResultRecord::Data(document.fields))
			.collect();

		records.push(ResultRecord::link(vitalsigns_link(
			&self.ctx.retrieval.vitalsigns_link_base,
			patient_id,
			window,
		)));

		Ok(records)
	}

	fn find_query(
		&self,
		patient_id: &str,
		window_start: Option<OffsetDateTime>,
		now: OffsetDateTime,
	) -> FindQuery {
		let limit = effective_limit(self.plan.conditions.limit, self.ctx.retrieval.max_limit);
		let sort = self
			.plan
			.conditions
			.sort_by
			.iter()
			.filter(|key| self.plan.fields.contains(&key.field))
			.map(|key| SortField {
				field: key.field.clone(),
				order: match key.direction {
					SortDirection::Ascending => SortOrder::Ascending,
					SortDirection::Descending => SortOrder::Descending,
				},
			})
			.collect();

		FindQuery {
			filter: DocumentFilter {
				equals: vec![(
					PATIENT_REFERENCE_FIELD.to_string(),
					Value::String(patient_id.to_string()),
				)],
				time_range: window_start.map(|start| TimeRange {
					field: CREATED_DATE_FIELD.to_string(),
					start,
					end: now,
				}),
			},
			projection: self.plan.fields.clone(),
			sort,
			limit: Some(limit),
		}
	}
}

/// Closed tagged variant over the supported resource types. Built by [`crate::factory::create`].
pub enum RetrievalInterface<'a> {
	PatientInfo(PatientInfoInterface<'a>),
	Vitalsigns(VitalsignsInterface<'a>),
}
impl RetrievalInterface<'_> {
	pub fn resource_type(&self) -> ResourceType {
		match self {
			Self::PatientInfo(_) => ResourceType::PatientInfo,
			Self::Vitalsigns(_) => ResourceType::Vitalsigns,
		}
	}

	pub fn plan(&self) -> &QueryPlan {
		match self {
			Self::PatientInfo(interface) => &interface.plan,
			Self::Vitalsigns(interface) => &interface.plan,
		}
	}

	pub async fn execute(&self) -> Result<Vec<ResultRecord>> {
		self.execute_at(OffsetDateTime::now_utc()).await
	}

	/// `now` anchors the vital-sign time window.
	pub async fn execute_at(&self, now: OffsetDateTime) -> Result<Vec<ResultRecord>> {
		match self {
			Self::PatientInfo(interface) => interface.execute().await,
			Self::Vitalsigns(interface) => interface.execute_at(now).await,
		}
	}
}

pub fn patient_link(base: &str, patient_id: &str) -> String {
	format!("{}/{patient_id}", base.trim_end_matches('/'))
}

pub fn vitalsigns_link(
	base: &str,
	patient_id: &str,
	window_start: Option<OffsetDateTime>,
) -> String {
	let link = format!("{}/{patient_id}", base.trim_end_matches('/'));

	match window_start {
		Some(start) => {
			let date = start.date();

			format!(
				"{link}?startDate={:04}-{:02}-{:02}",
				date.year(),
				u8::from(date.month()),
				date.day()
			)
		},
		None => link,
	}
}

/// Requested fields must be present and non-null.
pub fn has_every_field(fields: &Map<String, Value>, requested: &[String]) -> bool {
	requested.iter().all(|field| fields.get(field).is_some_and(|value| !value.is_null()))
}

async fn resolve_and_authorize(
	ctx: Context<'_>,
	credentials: &Credentials,
	full_name: &str,
) -> Result<Option<ResolvedPatient>> {
	let Some(patient) = identity::resolve(ctx, full_name).await? else {
		return Ok(None);
	};

	access::authorize(ctx.stores.lookup.as_ref(), credentials, &patient).await?.into_result()?;

	Ok(Some(patient))
}

/// An unset limit reads the whole window, capped at `max_limit`.
fn effective_limit(requested: Option<u32>, max_limit: u32) -> u32 {
	match requested {
		Some(limit) => limit.min(max_limit),
		None => {
			tracing::debug!(max_limit, "No limit requested. Capping at the configured maximum.");

			max_limit
		},
	}
}

/// Start of the "last N days" window, clamped to the Unix epoch.
fn window_start(now: OffsetDateTime, days: u32) -> OffsetDateTime {
	now.checked_sub(Duration::days(i64::from(days)))
		.map_or(OffsetDateTime::UNIX_EPOCH, |start| start.max(OffsetDateTime::UNIX_EPOCH))
}

impl From<ResultRecord> for Value {
	fn from(record: ResultRecord) -> Self {
		match record {
			ResultRecord::Link(LinkRecord { link }) => {
				let mut object = Map::new();

				object.insert("link".to_string(), Value::String(link));

				Value::Object(object)
			},
			ResultRecord::Data(fields) => Value::Object(fields),
		}
	}
}
