use catalog_graphql::ResolverError;
use std::path::PathBuf;

/// Error type for CLI command failures
#[derive(Debug)]
pub enum CliError {
    DocumentsLoad(PathBuf, anyhow::Error),
    InvalidJson(String, serde_json::Error),
    Config(anyhow::Error),
    Resolver(ResolverError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::DocumentsLoad(path, e) => {
                write!(
                    f,
                    "Failed to load documents from {}: {e:#}\n\nThe file must hold a JSON array of flat objects, e.g. [{{\"id\": 1, \"store_id\": 1, \"object_type\": \"product\", \"sku\": \"ABC-1\"}}]",
                    path.display()
                )
            }
            CliError::InvalidJson(what, e) => {
                write!(f, "Invalid JSON in {what}: {e}")
            }
            CliError::Config(e) => {
                write!(
                    f,
                    "Failed to load resolver config: {e:#}\n\nCheck CATALOG_CONFIG and the CATALOG_*_PAGE_SIZE variables in the environment or .env"
                )
            }
            CliError::Resolver(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::DocumentsLoad(_, e) | CliError::Config(e) => Some(&**e),
            CliError::InvalidJson(_, e) => Some(e),
            CliError::Resolver(e) => Some(e),
        }
    }
}

impl From<ResolverError> for CliError {
    fn from(error: ResolverError) -> Self {
        CliError::Resolver(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_load_display_is_actionable() {
        let error = CliError::DocumentsLoad(
            PathBuf::from("/tmp/docs.json"),
            anyhow::anyhow!("No such file"),
        );
        let msg = error.to_string();
        assert!(msg.contains("/tmp/docs.json"));
        assert!(msg.contains("No such file"));
        assert!(msg.contains("JSON array"));
    }

    #[test]
    fn test_resolver_error_is_wrapped() {
        let error: CliError =
            ResolverError::invalid_input("'ids' or 'levels' input argument is required.").into();
        assert!(matches!(error, CliError::Resolver(ResolverError::InvalidInput(_))));
        assert!(error.to_string().contains("'ids' or 'levels'"));
        let error: Box<dyn std::error::Error> = error.into();
        assert!(error.source().is_some());
    }

    #[test]
    fn test_invalid_json_display() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let msg = CliError::InvalidJson("--filter".to_string(), parse_error).to_string();
        assert!(msg.starts_with("Invalid JSON in --filter"));
    }
}
