//! Error types for pagient-api.

use thiserror::Error;

/// Failures talking to the patient service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Credentials or session token rejected (HTTP 401/403).
    #[error("patient service rejected credentials")]
    Unauthorized,

    /// The addressed resource does not exist (HTTP 404).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Any other non-success status.
    #[error("patient service returned HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// Connection refused, DNS failure, timeout, broken pipe.
    #[error("transport error: {0}")]
    Transport(String),

    /// Success status but a body that does not match the expected shape.
    #[error("could not decode response from {resource}: {reason}")]
    Decode { resource: String, reason: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Map an HTTP error status onto the taxonomy above.
    pub fn from_status(code: u16, message: impl Into<String>, resource: &str) -> Self {
        match code {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound {
                resource: resource.to_string(),
            },
            _ => ApiError::Status {
                code,
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(401)]
    #[case(403)]
    fn auth_statuses_map_to_unauthorized(#[case] code: u16) {
        let err = ApiError::from_status(code, "nope", "/api/auth/login");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn missing_resource_maps_to_not_found() {
        let err = ApiError::from_status(404, "", "patient 7");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "patient 7 not found");
    }

    #[rstest]
    #[case(500)]
    #[case(502)]
    #[case(503)]
    #[case(409)]
    fn other_statuses_keep_code_and_message(#[case] code: u16) {
        let err = ApiError::from_status(code, "boom", "patient 7");
        assert_eq!(
            err,
            ApiError::Status {
                code,
                message: "boom".to_string()
            }
        );
        assert!(!err.is_not_found() && !err.is_unauthorized());
    }
}
