//! Error types for credkeeper

use thiserror::Error;

/// Result type alias for credkeeper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Errors talking to the authentication service or to resource endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    /// Neither an access nor a renewal credential is held. Raised before
    /// any request is sent.
    #[error("No credential available. Run `credkeeper login` to sign in.")]
    NoCredential,

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Access denied. You don't have permission to access this resource.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Held credential cannot be sent as a bearer header")]
    InvalidCredential,

    #[error("Invalid request target: {0}")]
    InvalidTarget(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Durable credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Store database error: {0}")]
    Database(String),

    #[error("Store file is corrupt: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_no_credential_message() {
        let err = ApiError::NoCredential;
        assert!(err.to_string().contains("credkeeper login"));
    }

    #[test]
    fn test_api_error_unauthorized_carries_message() {
        let err = ApiError::Unauthorized("Credenciais inválidas".to_string());
        assert!(err.to_string().contains("Credenciais inválidas"));
    }

    #[test]
    fn test_api_error_forbidden_message() {
        let err = ApiError::Forbidden;
        assert!(err.to_string().contains("permission"));
    }

    #[test]
    fn test_api_error_network() {
        let err = ApiError::Network("Connection refused".to_string());
        assert!(err.to_string().contains("Connection refused"));
    }

    #[test]
    fn test_api_error_invalid_target() {
        let err = ApiError::InvalidTarget("::bad".to_string());
        assert!(err.to_string().contains("::bad"));
    }

    #[test]
    fn test_config_error_parse() {
        let err = ConfigError::ParseError("unexpected key".to_string());
        assert!(err.to_string().contains("unexpected key"));
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io.into();
        match err {
            StoreError::Io(msg) => assert!(msg.contains("denied")),
            other => panic!("Expected StoreError::Io, got {other:?}"),
        }
    }

    #[test]
    fn test_error_from_api_error() {
        let err: Error = ApiError::NoCredential.into();

        match err {
            Error::Api(ApiError::NoCredential) => (),
            _ => panic!("Expected Error::Api(ApiError::NoCredential)"),
        }
    }

    #[test]
    fn test_error_from_store_error() {
        let err: Error = StoreError::Corrupt("bad yaml".to_string()).into();

        match err {
            Error::Store(StoreError::Corrupt(_)) => (),
            _ => panic!("Expected Error::Store(StoreError::Corrupt)"),
        }
    }

    #[test]
    fn test_config_error_from_yaml_error() {
        let yaml_str = "invalid: [yaml: content";
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let config_err: ConfigError = yaml_err.into();

        match config_err {
            ConfigError::ParseError(_) => (),
            _ => panic!("Expected ConfigError::ParseError"),
        }
    }
}
