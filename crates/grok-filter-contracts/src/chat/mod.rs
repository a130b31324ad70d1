mod body;
mod image;

pub use body::{ChatBody, ChatMessage};
pub use image::{GeneratedImage, BASE64_IMAGE_PLACEHOLDER, REVISED_PROMPT_LABEL};
