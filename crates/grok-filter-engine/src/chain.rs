use async_trait::async_trait;
use grok_filter_contracts::chat::ChatBody;
use grok_filter_contracts::events::Notifier;
use grok_filter_contracts::valves::UserContext;
use tracing::debug;

/// A filter with inlet/outlet hooks, run by the host in priority order.
#[async_trait]
pub trait PipelineFilter: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i64 {
        0
    }

    async fn inlet(
        &self,
        body: ChatBody,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody>;

    async fn outlet(
        &self,
        body: ChatBody,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody>;
}

/// Filters ordered by ascending priority; ties keep registration order.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn PipelineFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F: PipelineFilter + 'static>(&mut self, filter: F) {
        self.filters.push(Box::new(filter));
        self.filters.sort_by_key(|filter| filter.priority());
    }

    pub fn names(&self) -> Vec<String> {
        self.filters
            .iter()
            .map(|filter| filter.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub async fn run_inlet(
        &self,
        mut body: ChatBody,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody> {
        for filter in &self.filters {
            debug!(filter = filter.name(), "running inlet");
            body = filter.inlet(body, user, notifier).await?;
        }
        Ok(body)
    }

    pub async fn run_outlet(
        &self,
        mut body: ChatBody,
        user: &UserContext,
        notifier: &dyn Notifier,
    ) -> anyhow::Result<ChatBody> {
        for filter in &self.filters {
            debug!(filter = filter.name(), "running outlet");
            body = filter.outlet(body, user, notifier).await?;
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use grok_filter_contracts::chat::{ChatBody, ChatMessage};
    use grok_filter_contracts::events::{Notifier, RecordingNotifier};
    use grok_filter_contracts::valves::UserContext;

    use super::{FilterChain, PipelineFilter};

    struct Tagging {
        name: String,
        priority: i64,
    }

    #[async_trait]
    impl PipelineFilter for Tagging {
        fn name(&self) -> &str {
            self.name.as_str()
        }

        fn priority(&self) -> i64 {
            self.priority
        }

        async fn inlet(
            &self,
            mut body: ChatBody,
            _user: &UserContext,
            _notifier: &dyn Notifier,
        ) -> anyhow::Result<ChatBody> {
            if let Some(last) = body.last_message_mut() {
                last.content.push_str(&format!(">{}", self.name));
            }
            Ok(body)
        }

        async fn outlet(
            &self,
            mut body: ChatBody,
            _user: &UserContext,
            _notifier: &dyn Notifier,
        ) -> anyhow::Result<ChatBody> {
            if let Some(last) = body.last_message_mut() {
                last.content.push_str(&format!("<{}", self.name));
            }
            Ok(body)
        }
    }

    fn tagging(name: &str, priority: i64) -> Tagging {
        Tagging {
            name: name.to_string(),
            priority,
        }
    }

    #[test]
    fn register_orders_by_priority_then_insertion() {
        let mut chain = FilterChain::new();
        chain.register(tagging("late", 10));
        chain.register(tagging("first", -1));
        chain.register(tagging("tie-a", 0));
        chain.register(tagging("tie-b", 0));
        assert_eq!(chain.names(), vec!["first", "tie-a", "tie-b", "late"]);
        assert_eq!(chain.len(), 4);
    }

    #[tokio::test]
    async fn hooks_thread_body_through_each_filter() -> anyhow::Result<()> {
        let mut chain = FilterChain::new();
        chain.register(tagging("b", 2));
        chain.register(tagging("a", 1));
        let notifier = RecordingNotifier::new();
        let user = UserContext::default();

        let body = ChatBody::new(vec![ChatMessage::user("x")]);
        let body = chain.run_inlet(body, &user, &notifier).await?;
        let body = chain.run_outlet(body, &user, &notifier).await?;

        assert_eq!(body.messages[0].content, "x>a>b<a<b");
        Ok(())
    }
}
