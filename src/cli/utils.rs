use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format. In JSON mode the
/// fields of `data` are merged next to `message`.
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_body(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a bare value: the raw string in text mode, pretty JSON otherwise
pub fn output_value(output_format: &OutputFormat, key: &str, value: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ key: value }))?),
        OutputFormat::Text => println!("{}", value),
    }
    Ok(())
}

fn success_body(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    match (response.as_object_mut(), data) {
        (Some(obj), Some(Value::Object(extra))) => obj.extend(extra),
        (Some(obj), Some(other)) => {
            obj.insert("data".to_string(), other);
        }
        _ => {}
    }
    response
}

/// Read a required environment variable with a hint about where it comes from
pub fn require_env(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(anyhow::anyhow!("{} is not set (export it or add it to .env)", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_body_merges_object_data() {
        let body = success_body("ok", Some(json!({ "status": "UP" })));
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "UP");
    }

    #[test]
    fn test_success_body_nests_non_object_data() {
        let body = success_body("ok", Some(json!([1, 2])));
        assert_eq!(body["data"], json!([1, 2]));
    }
}
