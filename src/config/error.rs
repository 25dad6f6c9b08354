//! Errors raised while loading and checking `pagecast.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read site configuration at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("site configuration is not valid TOML")]
    Toml(#[from] toml::de::Error),

    #[error("invalid site configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("pagecast.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("could not read site configuration"));
        assert!(display.contains("pagecast.toml"));

        let validation_err = ConfigError::Validation("bad theme color".to_string());
        let display = format!("{validation_err}");
        assert!(display.contains("invalid site configuration"));
        assert!(display.contains("bad theme color"));
    }
}
