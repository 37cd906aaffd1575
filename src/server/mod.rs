//! HTTP API over the engagement database
//!
//! Handlers lock the database for the duration of one or two statements and
//! never hold the lock across an `.await`.

pub mod auth;
pub mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use axum::routing::{get, post, put};
use axum::Router;
use miette::Diagnostic;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::chat::Assistant;
use crate::core::config::Config;
use crate::core::db::Database;
use crate::core::template::{TemplateError, TemplateRenderer};
use error::{ApiError, ApiResult};

/// Shared application state
pub struct AppState {
    db: Mutex<Database>,
    pub config: Config,
    pub assistant: Assistant,
    pub templates: TemplateRenderer,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Result<Self, TemplateError> {
        Ok(Self {
            db: Mutex::new(db),
            assistant: Assistant::from_settings(&config.chat),
            templates: TemplateRenderer::new()?,
            config,
            start_time: Instant::now(),
        })
    }

    /// Exclusive access to the database
    pub fn db(&self) -> ApiResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }
}

/// Build the router with every endpoint
pub fn router(state: Arc<AppState>) -> Router {
    use handlers::*;

    let cors = state.config.server.cors;
    let mut router = Router::new()
        // Info
        .route("/", get(info::root))
        .route("/health", get(info::health))
        // Suppliers
        .route("/suppliers", get(suppliers::list).post(suppliers::create))
        .route("/suppliers/stats", get(suppliers::stats))
        .route(
            "/suppliers/:id",
            get(suppliers::profile)
                .put(suppliers::update)
                .delete(suppliers::delete),
        )
        .route(
            "/suppliers/:id/contacts",
            get(suppliers::contacts).post(suppliers::add_contact),
        )
        .route(
            "/suppliers/:id/imds",
            get(suppliers::imds_profile).put(suppliers::put_imds_profile),
        )
        .route(
            "/suppliers/:id/pcf",
            get(suppliers::pcf_profile).put(suppliers::put_pcf_profile),
        )
        .route("/suppliers/:id/hub", put(suppliers::put_hub_metadata))
        // Campaigns
        .route("/campaigns", get(campaigns::list).post(campaigns::create))
        .route("/campaigns/stats", get(campaigns::totals))
        .route(
            "/campaigns/:id",
            get(campaigns::get)
                .put(campaigns::update)
                .delete(campaigns::delete),
        )
        .route("/campaigns/:id/stats", get(campaigns::stats))
        .route(
            "/campaigns/:id/suppliers",
            get(campaigns::suppliers).post(campaigns::enroll),
        )
        .route(
            "/campaigns/:id/suppliers/:supplier_id",
            put(campaigns::set_status),
        )
        .route(
            "/campaigns/:id/suppliers/:supplier_id/remind",
            post(campaigns::remind),
        )
        // Submissions
        .route(
            "/imds",
            get(imds::get)
                .post(imds::create)
                .put(imds::update)
                .delete(imds::delete),
        )
        .route(
            "/pcf",
            get(pcf::get)
                .post(pcf::create)
                .put(pcf::update)
                .delete(pcf::delete),
        )
        .route("/pcf/:id/validate", post(pcf::validate))
        .route("/pcf/:id/reject", post(pcf::reject))
        // Supplier portal
        .route(
            "/portal/tokens",
            get(portal::get_tokens)
                .post(portal::issue)
                .delete(portal::revoke),
        )
        .route(
            "/portal/submissions",
            get(portal::get_submissions)
                .post(portal::submit)
                .put(portal::update_submission),
        )
        // Users
        .route(
            "/users",
            get(users::get)
                .post(users::create)
                .put(users::update)
                .delete(users::deactivate),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/overview", get(dashboard::overview))
        .route("/dashboard/activity", get(dashboard::activity))
        .route("/dashboard/emissions/trend", get(dashboard::emissions_trend))
        .route("/dashboard/kpis", get(dashboard::kpis))
        // Chat
        .route("/chat", post(info::chat))
        .route("/agents", get(info::agents))
        .route("/agents/graph", get(info::agent_graph))
        .with_state(state);

    router = router.layer(TraceLayer::new_for_http());

    if cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("invalid bind address '{0}'")]
    #[diagnostic(code(sect::server::bind), help("use host:port, e.g. 127.0.0.1:8000"))]
    InvalidAddress(String),

    #[error("cannot listen on {addr}: {source}")]
    #[diagnostic(code(sect::server::listen))]
    Listen {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    #[diagnostic(code(sect::server::io))]
    Io(#[from] std::io::Error),
}

/// Parse a `host:port` bind address
pub fn parse_bind(bind: &str) -> Result<SocketAddr, ServerError> {
    bind.trim()
        .parse()
        .map_err(|_| ServerError::InvalidAddress(bind.to_string()))
}

/// Serve until Ctrl-C or SIGTERM
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<(), ServerError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Listen { addr, source })?;

    tracing::info!(%addr, "Starting SECT API");
    eprintln!(
        "{} SECT API listening on http://{}",
        console::style("✓").green(),
        addr
    );
    eprintln!("  Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    eprintln!("{} Server stopped", console::style("✓").green());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            eprintln!("\n{} Received Ctrl+C, shutting down gracefully...", console::style("⚡").yellow());
        },
        () = terminate => {
            eprintln!("\n{} Received SIGTERM, shutting down gracefully...", console::style("⚡").yellow());
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind() {
        assert_eq!(parse_bind("127.0.0.1:8000").unwrap().port(), 8000);
        assert!(matches!(
            parse_bind("localhost"),
            Err(ServerError::InvalidAddress(_))
        ));
    }
}
