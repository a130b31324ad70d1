use serde::{Deserialize, Serialize};

pub const REVISED_PROMPT_LABEL: &str = "修改后的提示词";
/// Caption used for `b64_json` results; the payload itself is not embedded.
pub const BASE64_IMAGE_PLACEHOLDER: &str = "(Base64-encoded image)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Markdown shown to the user.
    pub image: String,
    #[serde(default)]
    pub revised_prompt: String,
}

impl GeneratedImage {
    pub fn from_url(index: usize, url: &str, revised_prompt: impl Into<String>) -> Self {
        Self {
            image: format!("![image{index}]({url})"),
            revised_prompt: revised_prompt.into(),
        }
    }

    pub fn base64_placeholder(revised_prompt: impl Into<String>) -> Self {
        Self {
            image: BASE64_IMAGE_PLACEHOLDER.to_string(),
            revised_prompt: revised_prompt.into(),
        }
    }

    pub fn prepend_to(&self, content: &str) -> String {
        format!(
            "{}\n\n{REVISED_PROMPT_LABEL}: {}\n\n{content}",
            self.image, self.revised_prompt
        )
    }
}
