//! Webhook URL resolution.

use pieceflow_core::FlowId;

/// Computes the generic webhook URL of a flow.
pub trait WebhookUrlResolver: Send + Sync {
    /// Returns the URL events for `flow_id` are posted to.
    fn webhook_url(&self, flow_id: FlowId) -> String;
}

/// Builds `{base}/v1/webhooks/{flow_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlWebhookResolver {
    base_url: String,
}

impl BaseUrlWebhookResolver {
    /// Creates a resolver; trailing slashes on `base_url` are ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl WebhookUrlResolver for BaseUrlWebhookResolver {
    fn webhook_url(&self, flow_id: FlowId) -> String {
        format!("{}/v1/webhooks/{}", self.base_url, flow_id.as_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_bare_flow_id() {
        let flow_id = FlowId::new();
        let resolver = BaseUrlWebhookResolver::new("https://hooks.example.com/");
        assert_eq!(
            resolver.webhook_url(flow_id),
            format!("https://hooks.example.com/v1/webhooks/{}", flow_id.as_ulid())
        );
    }
}
