use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_MODEL: &str = "grok-2-image";
pub const MIN_IMAGES: u32 = 1;
pub const MAX_IMAGES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Url,
    B64Json,
}

impl ResponseFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::B64Json => "b64_json",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "b64_json" => Ok(Self::B64Json),
            other => Err(format!(
                "unsupported response format '{other}' (expected 'url' or 'b64_json')"
            )),
        }
    }
}

/// Per-user generation settings supplied with each hook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserValves {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_n")]
    pub n: u32,
    #[serde(default)]
    pub response_format: ResponseFormat,
    #[serde(default)]
    pub user: Option<String>,
}

impl Default for UserValves {
    fn default() -> Self {
        Self {
            model: default_model(),
            n: default_n(),
            response_format: ResponseFormat::default(),
            user: None,
        }
    }
}

impl UserValves {
    /// Image count clamped into the range the API accepts.
    pub fn effective_n(&self) -> u32 {
        self.n.clamp(MIN_IMAGES, MAX_IMAGES)
    }

    /// End-user identifier, only when it is present and non-empty.
    pub fn user_identifier(&self) -> Option<&str> {
        self.user.as_deref().filter(|value| !value.is_empty())
    }
}

/// Typed replacement for the host's `__user__` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub valves: UserValves,
}

impl UserContext {
    pub fn new(valves: UserValves) -> Self {
        Self {
            valves,
            ..Self::default()
        }
    }
}

fn default_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_n() -> u32 {
    1
}
