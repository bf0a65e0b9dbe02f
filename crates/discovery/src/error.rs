//! Discovery error types.

use thiserror::Error;

/// Errors talking to the service registry.
///
/// "No healthy instance" is not an error; resolvers return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The registry could not be reached (connection refused, timeout, ...).
    #[error("Service registry unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The registry answered with something other than the expected payload.
    #[error("Invalid response from service registry: {0}")]
    InvalidResponse(String),

    /// A static service table could not be parsed.
    #[error("Invalid static service entry '{entry}': {reason}")]
    InvalidStaticEntry { entry: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to build registry client: {0}")]
    Client(String),
}

/// Convenience type alias for discovery results.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
