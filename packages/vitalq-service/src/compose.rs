use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::retrieval::ResultRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composed {
	pub records: Vec<Map<String, Value>>,
	pub link: Option<String>,
}

/// Flattens per-field results in order and lifts out the first link. Further link records repeat
/// the same patient and are dropped.
pub fn compose<I>(results: I) -> Composed
where
	I: IntoIterator<Item = Vec<ResultRecord>>,
{
	let mut composed = Composed::default();

	for record in results.into_iter().flatten() {
		match record {
			ResultRecord::Link(record) =>
				if composed.link.is_none() {
					composed.link = Some(record.link);
				},
			ResultRecord::Data(fields) => composed.records.push(fields),
		}
	}

	composed
}
