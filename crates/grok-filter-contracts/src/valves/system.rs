use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.x.ai";
pub const IMAGE_GENERATIONS_PATH: &str = "/v1/images/generations";

/// Filter-wide settings, fixed when the filter is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValves {
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for FilterValves {
    fn default() -> Self {
        Self {
            priority: 0,
            api_key: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl FilterValves {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Base URL with surrounding whitespace and trailing slashes removed.
    pub fn normalized_api_base(&self) -> &str {
        self.api_base.trim().trim_end_matches('/')
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.normalized_api_base(), IMAGE_GENERATIONS_PATH)
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
