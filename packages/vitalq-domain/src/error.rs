pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Unsupported resource type: {resource_type}.")]
	UnsupportedResourceType { resource_type: String },
}
