use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported region: {0}")]
    UnsupportedRegion(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read regions file {path}: {source}")]
    RegionsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse regions file: {0}")]
    RegionsFileParse(#[from] serde_yaml::Error),

    #[error("invalid regions configuration: {0}")]
    InvalidRegions(String),
}
