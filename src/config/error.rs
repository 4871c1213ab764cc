use thiserror::Error;

/// Errors while loading or validating client configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("secret key must not be empty")]
    MissingSecretKey,

    #[error("{0} must be greater than 0")]
    ZeroLimit(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        assert_eq!(
            ConfigError::MissingApiKey.to_string(),
            "API key must not be empty"
        );
        assert_eq!(
            ConfigError::ZeroLimit("rate_limit").to_string(),
            "rate_limit must be greater than 0"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                key: "AUTOPAY_TIMEOUT".to_string(),
                value: "soon".to_string()
            }
            .to_string(),
            "Invalid value for AUTOPAY_TIMEOUT: soon"
        );
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let config_err = ConfigError::from(io_err);
        assert!(matches!(config_err, ConfigError::Io(_)));
    }
}
