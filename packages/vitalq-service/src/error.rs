pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Access denied: {message}")]
	AccessDenied { message: String },
	#[error("Unsupported resource type: {resource_type}.")]
	UnsupportedResourceType { resource_type: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl From<vitalq_storage::Error> for Error {
	fn from(err: vitalq_storage::Error) -> Self {
		match err {
			vitalq_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			vitalq_storage::Error::InvalidArgument(message) => Self::Storage { message },
		}
	}
}

impl From<vitalq_providers::Error> for Error {
	fn from(err: vitalq_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<vitalq_domain::Error> for Error {
	fn from(err: vitalq_domain::Error) -> Self {
		match err {
			vitalq_domain::Error::UnsupportedResourceType { resource_type } =>
				Self::UnsupportedResourceType { resource_type },
		}
	}
}
