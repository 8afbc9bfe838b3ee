//! Error types for dataset loading and point resolution.

use std::path::PathBuf;

/// A dataset file exists but could not be turned into regions.
///
/// A missing non-root file is not an error; loaders report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },
    #[error("invalid dataset {path}: {reason}")]
    Format { path: PathBuf, reason: String },
    #[error("root dataset not found at {path}")]
    MissingRoot { path: PathBuf },
}

impl LoadError {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single `resolve` call.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid {field}: {value}")]
    Validation { field: &'static str, value: f64 },
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ResolveError {
    /// Whether the caller sent bad input (as opposed to a server-side fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, ResolveError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_split() {
        let validation = ResolveError::Validation {
            field: "latitude",
            value: 91.0,
        };
        assert!(validation.is_client_error());

        let load = ResolveError::from(LoadError::format("citys/1.json", "bad ring"));
        assert!(!load.is_client_error());
    }
}
