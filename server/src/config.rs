use anyhow::{Result, bail};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    /// Load the demo data set into the in-memory stores on `serve`.
    pub seed_demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: vec!["http://localhost:5173".into()],
            seed_demo: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let cors_allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .collect::<Vec<_>>(),
            None => defaults.cors_allowed_origins,
        };

        let seed_demo = match lookup("SEED_DEMO") {
            Some(raw) => parse_flag("SEED_DEMO", &raw)?,
            None => defaults.seed_demo,
        };

        Ok(Self {
            cors_allowed_origins,
            seed_demo,
        })
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => bail!("{key} must be one of 1|true|yes|0|false|no, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
        assert!(config.seed_demo);
    }

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        let config =
            load(&[("CORS_ALLOWED_ORIGINS", " https://a.test, ,https://b.test ")]).unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.test", "https://b.test"]
        );
    }

    #[test]
    fn seed_flag_is_strict() {
        assert!(!load(&[("SEED_DEMO", "No")]).unwrap().seed_demo);
        assert!(load(&[("SEED_DEMO", "maybe")]).is_err());
    }
}
