use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(engine) = expect_optional_object(root, "engine")? {
        validate_u64_field(
            engine,
            "engine.stream_step_delay_ms",
            "stream_step_delay_ms",
            0,
            60_000,
        )?;
    }

    if let Some(logging) = expect_optional_object(root, "logging")? {
        validate_optional_string_field(logging, "logging.level", "level")?;
        validate_optional_string_field(logging, "logging.file_name", "file_name")?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    match value.as_str() {
        Some(text) if text.trim().is_empty() => Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        ))),
        Some(_) => Ok(()),
        None => Err(config_type_error(path, "string")),
    }
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_empty_and_valid_configs() {
        assert!(validate_config(&json!({})).is_ok());
        assert!(validate_config(&json!({
            "server": {"host": "0.0.0.0", "port": 8080, "cors_allowed_origins": ["http://a"]},
            "engine": {"stream_step_delay_ms": 0},
            "logging": {"level": "debug"}
        }))
        .is_ok());
    }

    #[test]
    fn test_rejects_bad_types_and_ranges() {
        assert!(validate_config(&json!([])).is_err());
        assert!(validate_config(&json!({"server": "x"})).is_err());
        assert!(validate_config(&json!({"server": {"port": 70000}})).is_err());
        assert!(validate_config(&json!({"server": {"port": "80"}})).is_err());
        assert!(validate_config(&json!({"server": {"cors_allowed_origins": [""]}})).is_err());
        assert!(validate_config(&json!({"engine": {"stream_step_delay_ms": -1}})).is_err());
        assert!(validate_config(&json!({"logging": {"level": " "}})).is_err());
    }
}
