mod system;
mod user;

pub use system::{FilterValves, DEFAULT_API_BASE, IMAGE_GENERATIONS_PATH};
pub use user::{ResponseFormat, UserContext, UserValves, DEFAULT_IMAGE_MODEL, MAX_IMAGES, MIN_IMAGES};
