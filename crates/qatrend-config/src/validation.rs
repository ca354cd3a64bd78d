//! Custom validators for configuration values

use validator::ValidationError;

/// Log level must be one of the five tracing levels
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

/// Value must lie strictly between 0 and 1
pub fn validate_open_unit_interval(value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ValidationError::new("outside_open_unit_interval"))
    }
}

/// Value must be finite and strictly positive
pub fn validate_positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("not_positive"))
    }
}

/// Endpoint paths are absolute and carry no query string
pub fn validate_endpoint_path(path: &str) -> Result<(), ValidationError> {
    if !path.starts_with('/') {
        return Err(ValidationError::new("endpoint_not_absolute"));
    }

    if path.contains('?') || path.contains('#') {
        return Err(ValidationError::new("endpoint_has_query"));
    }

    Ok(())
}
