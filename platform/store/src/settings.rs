use serde::Deserialize;

/// Where the hosted record service lives and how to identify to it.
#[derive(Clone, Debug, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

impl StoreSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: None,
            public_key: None,
        }
    }

    /// Reads `CRM_STORE_URL`, `CRM_PROJECT_ID` and `CRM_PUBLIC_KEY`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("CRM_STORE_URL").unwrap_or_else(|_| default_base_url());
        Self {
            base_url,
            project_id: non_blank_env("CRM_PROJECT_ID"),
            public_key: non_blank_env("CRM_PUBLIC_KEY"),
        }
    }

    pub fn with_credentials(
        mut self,
        project_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        self.project_id = Some(project_id.into());
        self.public_key = Some(public_key.into());
        self
    }

    pub(crate) fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
