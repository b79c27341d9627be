use thiserror::Error;

/// Errors raised while loading process configuration or the league catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read leagues file {path}: {source}")]
    LeaguesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse leagues file: {0}")]
    LeaguesFileParse(#[from] serde_yaml::Error),

    #[error("leagues validation error: {0}")]
    Validation(String),
}
