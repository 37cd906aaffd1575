//! Forward chat requests to the agent backend

use std::time::Duration;

use super::{ChatError, ChatRequest, ChatResponse};

pub struct ChatProxy {
    client: reqwest::Client,
    upstream: String,
}

impl ChatProxy {
    pub fn new(upstream: &str, timeout_secs: u64) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    timeout_secs,
                    "cannot build chat client, falling back to one without a timeout"
                );
                reqwest::Client::new()
            }
        };
        Self {
            client,
            upstream: upstream.to_string(),
        }
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// POST the request as-is and decode the backend's answer; fields beyond
    /// [`ChatResponse`]'s own are kept in `extra`
    pub async fn forward(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let response = self
            .client
            .post(&self.upstream)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(upstream = %self.upstream, error = %e, "chat upstream unreachable");
                ChatError::Upstream(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(upstream = %self.upstream, %status, "chat upstream returned an error");
            return Err(ChatError::Upstream(format!("upstream returned {}", status)));
        }

        response.json::<ChatResponse>().await.map_err(|e| {
            tracing::warn!(upstream = %self.upstream, error = %e, "chat upstream sent an invalid body");
            ChatError::Upstream(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Serve a fixed chat answer on an ephemeral port, returning its URL
    async fn fake_upstream(answer: Value) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/chat",
            post(move || {
                let answer = answer.clone();
                async move { Json(answer) }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/chat", addr)
    }

    #[tokio::test]
    async fn test_forward_relays_unknown_fields() {
        let url = fake_upstream(json!({
            "response": "Bonjour",
            "thread_id": "t-1",
            "agents_called": ["knowledge_miner"],
            "sources": [{ "title": "IMDS guide" }],
            "confidence": 0.8
        }))
        .await;

        let proxy = ChatProxy::new(&url, 5);
        let reply = proxy
            .forward(&ChatRequest {
                message: "hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(reply.response, "Bonjour");
        assert_eq!(reply.agents_called, vec!["knowledge_miner"]);
        assert_eq!(reply.extra["confidence"], 0.8);

        let relayed = serde_json::to_value(&reply).unwrap();
        assert_eq!(relayed["sources"][0]["title"], "IMDS guide");
        assert_eq!(relayed["thread_id"], "t-1");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_an_upstream_error() {
        // Port 9 on localhost is closed on test machines.
        let proxy = ChatProxy::new("http://127.0.0.1:9/chat", 2);
        assert_eq!(proxy.upstream(), "http://127.0.0.1:9/chat");
        let err = proxy
            .forward(&ChatRequest {
                message: "hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Upstream(_)));
    }
}
