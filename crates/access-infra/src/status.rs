//! Error-to-status conversion: maps the typed error enums from every layer
//! onto a transport-agnostic wire status, so the RPC boundary never has to
//! match on domain error variants directly.

use std::collections::HashMap;

use access_cache::CacheError;
use access_core::CoreError;
use access_domain::DomainError;
use access_providers::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    NotFound,
    AlreadyExists,
    FailedPrecondition,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone)]
pub struct WireStatus {
    pub code: StatusCode,
    pub message: String,
    pub attributes: HashMap<String, String>,
}

/// Implemented locally for each crate's error enum (the orphan rule forbids
/// implementing a foreign trait for a foreign type, so this trait — not
/// `std::error::Error` itself — is what every layer's error enum picks up).
pub trait DomainFailure {
    fn status_code(&self) -> StatusCode;
    fn parameter_name(&self) -> &'static str;
}

impl DomainFailure for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::GroupNotFound(_)
            | DomainError::EntityTypeNotFound(_)
            | DomainError::EntityNotFound(_, _)
            | DomainError::EdgeDoesNotExist(_, _)
            | DomainError::MappingDoesNotExist => StatusCode::NotFound,
            DomainError::VertexAlreadyExists(_) | DomainError::EdgeAlreadyExists(_, _) | DomainError::MappingAlreadyExists => {
                StatusCode::AlreadyExists
            }
            DomainError::EmptyIdentifier { .. } | DomainError::CircularReference(_, _) => StatusCode::FailedPrecondition,
        }
    }

    fn parameter_name(&self) -> &'static str {
        DomainError::parameter_name(self)
    }
}

impl DomainFailure for CoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Validation(e) => e.status_code(),
            CoreError::FlushFailed(_) => StatusCode::Unavailable,
            CoreError::Internal(_) => StatusCode::Internal,
        }
    }

    fn parameter_name(&self) -> &'static str {
        CoreError::parameter_name(self)
    }
}

impl DomainFailure for PersistenceError {
    fn status_code(&self) -> StatusCode {
        StatusCode::Unavailable
    }

    fn parameter_name(&self) -> &'static str {
        "Persistence"
    }
}

impl DomainFailure for CacheError {
    fn status_code(&self) -> StatusCode {
        StatusCode::Unavailable
    }

    fn parameter_name(&self) -> &'static str {
        "Cache"
    }
}

/// Recognized `ErrorHandling.*` configuration keys.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlingConfig {
    /// Flattens `std::error::Error::source()` chains into an
    /// `InnerExceptions` attribute instead of discarding them.
    pub include_inner_exceptions: bool,
    /// Replaces an `Internal`-coded message with
    /// `internal_server_error_message_override` instead of the error's own
    /// `Display` text, so internals never leak to callers.
    pub override_internal_server_errors: bool,
    pub internal_server_error_message_override: String,
}

pub struct ErrorToStatusConverter {
    config: ErrorHandlingConfig,
}

impl ErrorToStatusConverter {
    pub fn new(config: ErrorHandlingConfig) -> Self {
        Self { config }
    }

    /// Builds a `WireStatus` for any error implementing `DomainFailure`,
    /// tagging it with the originating method name and the `ParameterName`
    /// attribute.
    pub fn convert(&self, error: &(impl DomainFailure + std::error::Error), originating_method: &str) -> WireStatus {
        let mut attributes = HashMap::new();
        attributes.insert("ParameterName".to_string(), error.parameter_name().to_string());
        attributes.insert("Method".to_string(), originating_method.to_string());

        let code = error.status_code();
        let message = if code == StatusCode::Internal && self.config.override_internal_server_errors {
            self.config.internal_server_error_message_override.clone()
        } else {
            error.to_string()
        };

        if self.config.include_inner_exceptions {
            let mut chain = Vec::new();
            let mut source = std::error::Error::source(error);
            while let Some(cause) = source {
                chain.push(cause.to_string());
                source = cause.source();
            }
            if !chain.is_empty() {
                attributes.insert("InnerExceptions".to_string(), chain.join(" -> "));
            }
        }

        WireStatus { code, message, attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_found_status_with_parameter_name() {
        let converter = ErrorToStatusConverter::new(ErrorHandlingConfig::default());
        let err = DomainError::UserNotFound("alice".to_string());
        let status = converter.convert(&err, "GetUserAccess");
        assert_eq!(status.code, StatusCode::NotFound);
        assert_eq!(status.attributes.get("ParameterName").map(String::as_str), Some("UserId"));
        assert_eq!(status.attributes.get("Method").map(String::as_str), Some("GetUserAccess"));
    }

    #[test]
    fn circular_reference_maps_to_failed_precondition() {
        let converter = ErrorToStatusConverter::new(ErrorHandlingConfig::default());
        let err = DomainError::CircularReference("g1".to_string(), "g2".to_string());
        let status = converter.convert(&err, "AddGroupToGroup");
        assert_eq!(status.code, StatusCode::FailedPrecondition);
    }

    #[test]
    fn internal_message_override_replaces_internal_errors_only() {
        let converter = ErrorToStatusConverter::new(ErrorHandlingConfig {
            override_internal_server_errors: true,
            internal_server_error_message_override: "internal error".to_string(),
            ..Default::default()
        });

        let internal = CoreError::Internal("disk full at /var/lib/access".to_string());
        let status = converter.convert(&internal, "Flush");
        assert_eq!(status.code, StatusCode::Internal);
        assert_eq!(status.message, "internal error");

        let not_found = DomainError::UserNotFound("alice".to_string());
        let status = converter.convert(&not_found, "GetUserAccess");
        assert_eq!(status.message, "user not found: alice");
    }

    #[test]
    fn inner_exceptions_are_flattened_when_enabled() {
        let converter = ErrorToStatusConverter::new(ErrorHandlingConfig { include_inner_exceptions: true, ..Default::default() });
        let err = CoreError::Validation(DomainError::UserNotFound("alice".to_string()));
        let status = converter.convert(&err, "AddUserToGroup");
        assert_eq!(status.message, "validation failed: user not found: alice");
        assert_eq!(status.attributes.get("InnerExceptions").map(String::as_str), Some("user not found: alice"));
    }

    #[test]
    fn inner_exceptions_are_omitted_when_disabled() {
        let converter = ErrorToStatusConverter::new(ErrorHandlingConfig::default());
        let err = CoreError::Validation(DomainError::UserNotFound("alice".to_string()));
        let status = converter.convert(&err, "AddUserToGroup");
        assert!(!status.attributes.contains_key("InnerExceptions"));
    }
}
