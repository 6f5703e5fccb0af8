use std::path::PathBuf;

/// Errors raised while building a scene or a blob from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Rejects non-finite and negative values.
pub(crate) fn ensure_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::invalid(field, format!("{} is not finite", value)));
    }
    if value < 0.0 {
        return Err(ConfigError::invalid(field, format!("{} is negative", value)));
    }
    Ok(())
}

/// Rejects non-finite and non-positive values.
pub(crate) fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("{} must be a positive number", value),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::invalid(field, format!("{} is not finite", value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_error_names_field() {
        let err = ConfigError::invalid("blob_size", "-1 must be a positive number");
        assert_eq!(
            err.to_string(),
            "invalid value for blob_size: -1 must be a positive number"
        );
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert!(ensure_non_negative("amount", 0.0).is_ok());
        assert!(ensure_non_negative("amount", -0.1).is_err());
        assert!(ensure_non_negative("amount", f32::NAN).is_err());
    }

    #[test]
    fn positive_rejects_zero_and_infinity() {
        assert!(ensure_positive("radius", 0.0).is_err());
        assert!(ensure_positive("radius", f32::INFINITY).is_err());
        assert!(ensure_positive("radius", 1.0).is_ok());
    }
}
