use thiserror::Error;

/// Errors from model server calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The model server could not be reached.
    #[error("network: {0}")]
    Network(String),

    /// The model server answered with a non-success status.
    #[error("model server: {0}")]
    Api(String),

    /// The response could not be parsed.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// The client could not be constructed.
    #[error("client config: {0}")]
    Config(String),
}
