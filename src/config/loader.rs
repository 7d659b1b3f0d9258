//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, SinkKind};

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:12345");
        assert_eq!(config.capture.tracking_header_name, "http-tracking-id");
        assert_eq!(config.capture.max_request_body_bytes, Some(65536));
        assert_eq!(config.capture.sink, SinkKind::Console);
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "0.0.0.0:8080"

            [capture]
            tracking_header_name = "x-correlation-id"
            max_response_body_bytes = 128
            sink = "tracing"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.capture.tracking_header_name, "x-correlation-id");
        assert_eq!(config.capture.max_request_body_bytes, Some(65536));
        assert_eq!(config.capture.max_response_body_bytes, Some(128));
        assert_eq!(config.capture.sink, SinkKind::Tracing);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = parse_config("[capture\nsink = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn semantic_errors_are_listed() {
        let err = parse_config("[timeouts]\nrequest_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("request_secs"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "traffic-capture-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[capture]\nsink = \"none\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.capture.sink, SinkKind::None);
        assert!(config.capture.to_options().sink.is_none());

        fs::remove_file(&path).unwrap_or_default();
    }
}
