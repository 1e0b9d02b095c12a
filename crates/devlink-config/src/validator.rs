//! Configuration validation.

use url::Url;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error, if any, into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_device(config, &mut result);
        Self::validate_session(config, &mut result);

        result
    }

    fn validate_device(config: &Config, result: &mut ValidationResult) {
        match Url::parse(&config.device.location) {
            Ok(url) if url.cannot_be_a_base() => {
                result.add_error(ValidationError::new(
                    "device.location",
                    "must be a hierarchical URL such as http://device/",
                ));
            }
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                result.add_warning(ValidationWarning::new(
                    "device.location",
                    format!("unusual scheme '{}', socket endpoint will use ws", url.scheme()),
                ));
            }
            Ok(url) => Self::validate_host_parameter(&url, result),
            Err(e) => {
                result.add_error(ValidationError::new("device.location", e.to_string()));
            }
        }
    }

    /// The `host` query parameter must name a usable origin.
    fn validate_host_parameter(location: &Url, result: &mut ValidationResult) {
        let Some(host) = location
            .query_pairs()
            .find(|(key, _)| key == "host")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
        else {
            return;
        };

        let target = if host.starts_with("http:") || host.starts_with("https:") {
            host
        } else {
            format!("http://{}", host)
        };

        if let Err(e) = Url::parse(&target) {
            result.add_error(ValidationError::new(
                "device.location",
                format!("invalid host parameter '{}': {}", target, e),
            ));
        }
    }

    fn validate_session(config: &Config, result: &mut ValidationResult) {
        if config.session.keepalive_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "session.keepalive_interval_ms",
                "must be greater than zero",
            ));
        }

        if config.session.reload_delay_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "session.reload_delay_ms",
                "zero delay reloads immediately after a failed handshake",
            ));
        }
    }
}
