#[derive(Debug)]
pub enum ResolverError {
    /// A required argument is missing or unusable. Shown to the caller as an input error.
    InvalidInput(String),
    /// A referenced entity does not exist.
    NotFound(String),
    /// The search engine or another collaborator failed.
    Upstream(anyhow::Error),
}

impl ResolverError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ResolverError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ResolverError::NotFound(message.into())
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ResolverError::InvalidInput(_) | ResolverError::NotFound(_)
        )
    }
}

impl From<anyhow::Error> for ResolverError {
    fn from(error: anyhow::Error) -> Self {
        ResolverError::Upstream(error)
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(error: serde_json::Error) -> Self {
        ResolverError::InvalidInput(format!("Malformed arguments: {}", error))
    }
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ResolverError::NotFound(msg) => write!(f, "No such entity: {}", msg),
            ResolverError::Upstream(err) => write!(f, "Search engine failure: {:#}", err),
        }
    }
}

impl std::error::Error for ResolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolverError::Upstream(err) => Some(&**err),
            _ => None,
        }
    }
}

pub type ResolverResult<T> = Result<T, ResolverError>;
