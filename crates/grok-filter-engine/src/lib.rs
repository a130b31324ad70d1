mod chain;
mod client;
mod error;
mod response;

use async_trait::async_trait;
use grok_filter_contracts::chat::{ChatBody, GeneratedImage};
use grok_filter_contracts::events::{FilterEvent, Notifier};
use grok_filter_contracts::valves::{FilterValves, UserContext};
use tracing::{debug, info, warn};

pub use chain::{FilterChain, PipelineFilter};
pub use client::{build_payload, ImageClient, RawImageResponse};
pub use error::GenerationError;
pub use response::{extract_images, interpret_response};

const PREPARING: &str = "正在准备图像生成请求，请等待...";
const SENDING: &str = "正在发送图像生成请求...";
const GENERATING: &str = "正在生成图片，请等待...";
const NO_MESSAGES: &str = "没有可用于生成图像的消息";

pub const FILTER_NAME: &str = "grok-image";

/// Sends one status event through the host's notifier.
pub async fn emit(notifier: &dyn Notifier, description: &str, done: bool) -> anyhow::Result<()> {
    notifier.notify(FilterEvent::status(description, done)).await
}

/// Chat filter that turns the last message into an image-generation prompt.
#[derive(Debug, Clone)]
pub struct ImageGenerationFilter {
    valves: FilterValves,
    client: ImageClient,
}

impl ImageGenerationFilter {
    pub fn new(valves: FilterValves) -> anyhow::Result<Self> {
        let client = ImageClient::new(&valves)?;
        Ok(Self { valves, client })
    }

    pub fn valves(&self) -> &FilterValves {
        &self.valves
    }

    pub async fn inlet(
        &self,
        body: ChatBody,
        _user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody> {
        emit(notifier, PREPARING, false).await?;
        Ok(body)
    }

    /// Generates images for `prompt`.
    ///
    /// Generation failures are reported through `notifier` and yield an empty
    /// list; only a failing notifier surfaces as `Err`.
    pub async fn request(
        &self,
        prompt: &str,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<Vec<GeneratedImage>> {
        let valves = &user.valves;
        if valves.n != valves.effective_n() {
            warn!(
                requested = valves.n,
                sent = valves.effective_n(),
                "image count outside 1-10; clamped"
            );
        }
        let payload = build_payload(prompt, valves);
        debug!(endpoint = self.client.endpoint(), model = %valves.model, "image generation request");

        emit(notifier, SENDING, false).await?;
        match self.generate(&payload).await {
            Ok(images) => {
                info!(count = images.len(), "image generation succeeded");
                emit(notifier, &success_text(images.len()), true).await?;
                Ok(images)
            }
            Err(err) => {
                warn!(error = %err, status = ?err.status_code(), "image generation failed");
                emit(notifier, &err.notification_text(), true).await?;
                Ok(Vec::new())
            }
        }
    }

    pub async fn outlet(
        &self,
        mut body: ChatBody,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody> {
        emit(notifier, GENERATING, false).await?;
        let Some(prompt) = body.last_message().map(|message| message.content.clone()) else {
            warn!("outlet called with an empty message list");
            emit(notifier, NO_MESSAGES, true).await?;
            return Ok(body);
        };

        let images = self.request(&prompt, user, notifier).await?;
        if let Some(last) = body.last_message_mut() {
            // Each block goes in front of the previous one, so the last image ends up first.
            for image in &images {
                last.content = image.prepend_to(&last.content);
            }
        }
        Ok(body)
    }

    async fn generate(
        &self,
        payload: &serde_json::Value,
    ) -> Result<Vec<GeneratedImage>, GenerationError> {
        let response = self.client.post_generation(payload).await?;
        debug!(status = response.status, bytes = response.body.len(), "image API responded");
        interpret_response(&response)
    }
}

#[async_trait]
impl PipelineFilter for ImageGenerationFilter {
    fn name(&self) -> &str {
        FILTER_NAME
    }

    fn priority(&self) -> i64 {
        self.valves.priority
    }

    async fn inlet(
        &self,
        body: ChatBody,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody> {
        ImageGenerationFilter::inlet(self, body, user, notifier).await
    }

    async fn outlet(
        &self,
        body: ChatBody,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody> {
        ImageGenerationFilter::outlet(self, body, user, notifier).await
    }
}

fn success_text(count: usize) -> String {
    format!("图片生成成功，共{count}张!")
}
