//! Errors raised while assembling the core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A host bridge was not injected and no platform default exists.
    #[error("Missing {capability} bridge: {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A platform default bridge could not be constructed.
    #[error("Default {capability} bridge unavailable: {reason}")]
    DefaultBridge { capability: String, reason: String },

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    /// Whether the host can fix this by changing what it passes to the
    /// builder.
    pub fn is_host_fixable(&self) -> bool {
        matches!(self, Error::Config(_) | Error::CapabilityMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_capability() {
        let err = Error::CapabilityMissing {
            capability: "CacheStorage".to_string(),
            message: "inject one with .cache_storage()".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing CacheStorage bridge: inject one with .cache_storage()"
        );
        assert!(err.is_host_fixable());
        assert!(!Error::Logging("already set".into()).is_host_fixable());
    }
}
