use axum::{
	Json, Router,
	body::Body,
	extract::State,
	http::{HeaderMap, Request, StatusCode},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::AppState;
use vitalq_service::{Answer, Credentials, Error as ServiceError, ResultRecord, StructuredQuery};

pub const HEADER_CREDENTIALS: &str = "x-vitalq-credentials";

const HEADER_AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
	pub input_text: String,
}

#[derive(Debug, Deserialize)]
pub struct QueriesRequest {
	pub queries: Vec<StructuredQuery>,
}

#[derive(Debug, Serialize)]
pub struct QueriesResponse {
	pub records: Vec<ResultRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
	pub input_text: String,
	#[serde(default)]
	pub records: Vec<Map<String, Value>>,
	#[serde(default)]
	pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
	pub output_text: String,
}

pub fn router(state: AppState) -> Router {
	let api = Router::new()
		.route("/v1/answer", post(answer))
		.route("/v1/queries", post(queries))
		.route("/v1/render", post(render))
		.route_layer(middleware::from_fn_with_state(state.clone(), api_auth_middleware));

	Router::new().route("/health", get(health)).merge(api).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn answer(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<AnswerRequest>,
) -> Result<Json<Answer>, ApiError> {
	let credentials = read_credentials(&headers)?;

	require_input_text(&payload.input_text)?;

	let response = state.service.answer(&payload.input_text, &credentials).await?;

	Ok(Json(response))
}

async fn queries(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<QueriesRequest>,
) -> Result<Json<QueriesResponse>, ApiError> {
	let credentials = read_credentials(&headers)?;
	let records = state.service.execute_queries(&payload.queries, &credentials).await?;

	Ok(Json(QueriesResponse { records }))
}

async fn render(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
	let credentials = read_credentials(&headers)?;

	state.service.ensure_permission(&credentials)?;
	require_input_text(&payload.input_text)?;

	let output_text = state
		.service
		.render(&payload.input_text, &payload.records, payload.link.as_deref())
		.await?;

	Ok(Json(RenderResponse { output_text }))
}

async fn api_auth_middleware(
	State(state): State<AppState>,
	req: Request<Body>,
	next: Next,
) -> Response {
	let authorized = match state.api_auth_token() {
		Some(expected) => read_bearer_token(req.headers()) == Some(expected),
		None => true,
	};

	if !authorized {
		return json_error(
			StatusCode::UNAUTHORIZED,
			"UNAUTHENTICATED",
			"A valid Bearer token is required.",
		)
		.into_response();
	}

	next.run(req).await
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

/// Credentials arrive already verified by the upstream gateway as a JSON header.
fn read_credentials(headers: &HeaderMap) -> Result<Credentials, ApiError> {
	let Some(raw) = headers.get(HEADER_CREDENTIALS) else {
		return Err(json_error(
			StatusCode::UNAUTHORIZED,
			"UNAUTHENTICATED",
			format!("{HEADER_CREDENTIALS} header is required."),
		));
	};
	let credentials: Credentials = serde_json::from_slice(raw.as_bytes()).map_err(|err| {
		json_error(
			StatusCode::UNAUTHORIZED,
			"UNAUTHENTICATED",
			format!("{HEADER_CREDENTIALS} header is not valid credentials JSON: {err}."),
		)
	})?;

	if credentials.subject.trim().is_empty() {
		return Err(json_error(
			StatusCode::UNAUTHORIZED,
			"UNAUTHENTICATED",
			"Credentials must name a subject.",
		));
	}

	Ok(credentials)
}

fn require_input_text(input_text: &str) -> Result<(), ApiError> {
	if input_text.trim().is_empty() {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			"input_text must be non-empty.",
		));
	}

	Ok(())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::AccessDenied { message } =>
				json_error(StatusCode::FORBIDDEN, "ACCESS_DENIED", message),
			ServiceError::UnsupportedResourceType { resource_type } => json_error(
				StatusCode::BAD_REQUEST,
				"UNSUPPORTED_RESOURCE_TYPE",
				format!("Resource type {resource_type} is not supported."),
			),
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Backing store fault.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"A backing store request failed.",
				)
			},
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Language model fault.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"PROVIDER_ERROR",
					"The language model request failed.",
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
