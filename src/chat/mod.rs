//! Chat assistant front: canned keyword routing or a proxy to an agent backend
//!
//! The server only needs [`Assistant::answer`]; which backend answers is
//! decided once from `chat.mode` when the server starts.

pub mod mock;
pub mod proxy;

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::{ChatMode, ChatSettings};

pub use mock::{route, synthesize};
pub use proxy::ChatProxy;

/// Body of `POST /chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub campaign_id: Option<i64>,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub agents_called: Vec<String>,
    #[serde(default)]
    pub iteration_count: i64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Fields an upstream backend adds beyond the ones above, relayed as-is
    #[serde(flatten, default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ChatError {
    #[error("message is required")]
    #[diagnostic(code(sect::chat::empty))]
    EmptyMessage,

    #[error("chat upstream is not configured")]
    #[diagnostic(code(sect::chat::unconfigured), help("set chat.upstream or SECT_CHAT_UPSTREAM"))]
    NotConfigured,

    #[error("chat upstream failed: {0}")]
    #[diagnostic(code(sect::chat::upstream))]
    Upstream(String),
}

/// One agent of the orchestration graph
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Agent {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const AGENTS: &[Agent] = &[
    Agent {
        id: "orchestrator",
        name: "Orchestrateur",
        description: "Coordonne les autres agents",
    },
    Agent {
        id: "knowledge_miner",
        name: "Knowledge Miner",
        description: "Recherche et agrégation de connaissances",
    },
    Agent {
        id: "data_modeler",
        name: "Data Modeler",
        description: "Modélisation des données et workflows",
    },
    Agent {
        id: "campaign_manager",
        name: "Campaign Manager",
        description: "Conception de campagnes et KPI",
    },
    Agent {
        id: "content_generator",
        name: "Content Generator",
        description: "Génération de contenus opérationnels",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub from: &'static str,
    pub to: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// The orchestrator fans out to every agent and to the synthesizer
pub fn agent_graph() -> AgentGraph {
    let mut nodes = vec![GraphNode {
        id: "orchestrator",
        kind: "entry",
    }];
    let mut edges = Vec::new();
    for agent in AGENTS.iter().skip(1) {
        nodes.push(GraphNode {
            id: agent.id,
            kind: "agent",
        });
        edges.push(GraphEdge {
            from: "orchestrator",
            to: agent.id,
        });
    }
    nodes.push(GraphNode {
        id: "synthesizer",
        kind: "output",
    });
    edges.push(GraphEdge {
        from: "orchestrator",
        to: "synthesizer",
    });
    AgentGraph { nodes, edges }
}

/// Chat backend selected from configuration
pub enum Assistant {
    Mock,
    Proxy(ChatProxy),
    /// Proxy mode without an upstream URL; every request fails with 503
    Unconfigured,
}

impl Assistant {
    pub fn from_settings(settings: &ChatSettings) -> Self {
        match (settings.mode, settings.upstream.as_deref()) {
            (ChatMode::Mock, _) => Assistant::Mock,
            (ChatMode::Proxy, Some(url)) => {
                Assistant::Proxy(ChatProxy::new(url, settings.timeout_secs))
            }
            (ChatMode::Proxy, None) => Assistant::Unconfigured,
        }
    }

    pub async fn answer(&self, mut request: ChatRequest) -> Result<ChatResponse, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let thread_id = request
            .thread_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| ulid::Ulid::new().to_string());
        request.thread_id = Some(thread_id.clone());

        match self {
            Assistant::Mock => {
                let agents = route(&request.message);
                let now = Utc::now();
                Ok(ChatResponse {
                    response: synthesize(&request.message, &agents, now),
                    thread_id,
                    iteration_count: agents.len() as i64,
                    agents_called: agents.iter().map(|a| a.to_string()).collect(),
                    errors: Vec::new(),
                    timestamp: now,
                    extra: Default::default(),
                })
            }
            Assistant::Proxy(proxy) => {
                let mut response = proxy.forward(&request).await?;
                if response.thread_id.is_empty() {
                    response.thread_id = thread_id;
                }
                Ok(response)
            }
            Assistant::Unconfigured => Err(ChatError::NotConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: ChatMode, upstream: Option<&str>) -> ChatSettings {
        ChatSettings {
            mode,
            upstream: upstream.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_mock_generates_thread_id() {
        let assistant = Assistant::from_settings(&settings(ChatMode::Mock, None));
        let reply = assistant
            .answer(ChatRequest {
                message: "Prépare une campagne PCF".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(reply.thread_id.len(), 26);
        assert_eq!(
            reply.agents_called,
            vec!["knowledge_miner", "campaign_manager", "content_generator"]
        );
        assert_eq!(reply.iteration_count, 3);
    }

    #[tokio::test]
    async fn test_thread_id_is_kept() {
        let assistant = Assistant::from_settings(&settings(ChatMode::Mock, None));
        let reply = assistant
            .answer(ChatRequest {
                message: "hello".to_string(),
                thread_id: Some("thread-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(reply.thread_id, "thread-1");
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let assistant = Assistant::from_settings(&settings(ChatMode::Mock, None));
        let err = assistant
            .answer(ChatRequest {
                message: "   ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
    }

    #[tokio::test]
    async fn test_proxy_without_upstream() {
        let assistant = Assistant::from_settings(&settings(ChatMode::Proxy, None));
        let err = assistant
            .answer(ChatRequest {
                message: "hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotConfigured));
    }

    #[test]
    fn test_graph_shape() {
        let graph = agent_graph();
        assert_eq!(graph.nodes.len(), 6);
        assert_eq!(graph.edges.len(), 5);
        assert!(graph.edges.iter().all(|e| e.from == "orchestrator"));
        assert_eq!(graph.nodes.last().map(|n| n.kind), Some("output"));
    }
}
