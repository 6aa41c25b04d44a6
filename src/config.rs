use serde::Deserialize;

/// Runtime settings, read from a JSON file next to the binary.
#[derive(Deserialize)]
pub struct Config {
    pub bind_address: String,
    pub database_path: String,
}

impl Config {
    pub fn from_config(config: String) -> Result<Self, String> {
        match serde_json::from_str(&config) {
            Ok(data) => Ok(data),
            Err(err) => Err(format!("Could not deserialize.\n{}", err)),
        }
    }

    /// Read the config file, falling back to the defaults when the file is
    /// missing or malformed.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_config(contents) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("Ignoring {}: {}", path, err);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:7878".to_string(),
            database_path: "data.db".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_full_config() {
        let config = Config::from_config(
            r#"{"bind_address": "0.0.0.0:8080", "database_path": "bars.db"}"#.to_string(),
        )
        .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database_path, "bars.db");
    }

    #[test]
    fn rejects_malformed_config() {
        assert!(Config::from_config("not json".to_string()).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load("does-not-exist.json");
        assert_eq!(config.bind_address, "127.0.0.1:7878");
        assert_eq!(config.database_path, "data.db");
    }
}
