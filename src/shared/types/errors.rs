use thiserror::Error;

/// Error raised by the remote backend, carried through unmodified.
///
/// `message` is exactly what the backend reported; pages display it
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status of the failed call, when there was a response at all.
    pub status: Option<u16>,
    /// PostgREST / GoTrue error code (`PGRST116`, `invalid_credentials`, ...).
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// 401 and 403 force a logout.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    /// Local schema check failed; no remote call was made.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Not found: {resource} with id={id}")]
    NotFound { resource: String, id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdminError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote(RemoteError::new(status, message))
    }

    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// HTTP status attached to the error, if it came from the backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote(err) => err.status,
            _ => None,
        }
    }

    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::Remote(err) if err.is_authorization_failure())
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        Self::remote(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_message_is_displayed_verbatim() {
        let err = AdminError::remote(Some(409), "duplicate key value violates unique constraint");
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn only_401_and_403_are_authorization_failures() {
        assert!(AdminError::remote(Some(401), "JWT expired").is_authorization_failure());
        assert!(AdminError::remote(Some(403), "permission denied").is_authorization_failure());
        assert!(!AdminError::remote(Some(500), "boom").is_authorization_failure());
        assert!(!AdminError::Validation("x".into()).is_authorization_failure());
    }
}
