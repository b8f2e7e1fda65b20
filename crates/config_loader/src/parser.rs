//! Configuration parsing.
//!
//! Supports TOML (primary) and JSON formats.

use contracts::{EnvBlueprint, EnvError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<EnvBlueprint, EnvError> {
    toml::from_str(content).map_err(|e| EnvError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<EnvBlueprint, EnvError> {
    serde_json::from_str(content).map_err(|e| EnvError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<EnvBlueprint, EnvError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[simulation]
physics_dt = 0.01
render_dt = 0.05

[[sensors]]
name = "odom"
kind = "pose_velocity"
rate_hz = 20.0
[sensors.mount]
translation = { x = 0.0, y = 0.0, z = 0.0 }

[[channels]]
name = "/odom"
schema = "pose_velocity"
source = "odom"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.sensors.len(), 1);
        assert_eq!(bp.channels.len(), 1);
        // scene defaults kick in when the table is omitted
        assert_eq!(bp.scene.family, "office");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "simulation": { "physics_dt": 0.01, "render_dt": 0.05 },
            "sensors": [{
                "name": "imu",
                "kind": "inertial",
                "rate_hz": 100.0,
                "publish_rate_hz": 20.0,
                "mount": { "translation": { "x": 0.0, "y": 0.0, "z": 0.0 } }
            }],
            "channels": [{ "name": "/imu/data", "schema": "inertial", "source": "imu" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, EnvError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
