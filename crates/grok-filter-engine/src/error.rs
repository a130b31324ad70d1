use thiserror::Error;

const REQUEST_FAILED: &str = "请求失败";
const REQUEST_ERROR: &str = "请求过程中发生错误";
pub(crate) const MISSING_DATA: &str = "返回数据中不包含图像信息";
pub(crate) const NO_IMAGE_DATA: &str = "未能获取到图像数据";

/// Why an image-generation call produced nothing.
///
/// Every variant is recovered inside the filter and surfaced to the host
/// only as a terminal status notification.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("image API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response has no image data")]
    MissingData,

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("no usable image entries in response")]
    NoImageData,
}

impl GenerationError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Text of the terminal notification reported for this failure.
    pub fn notification_text(&self) -> String {
        match self {
            Self::Status { status, body } => format!("{REQUEST_FAILED} ({status}): {body}"),
            Self::MissingData => MISSING_DATA.to_string(),
            Self::NoImageData => NO_IMAGE_DATA.to_string(),
            Self::Transport(_) | Self::Decode(_) | Self::UnexpectedShape(_) => {
                format!("{REQUEST_ERROR}: {self}")
            }
        }
    }
}
