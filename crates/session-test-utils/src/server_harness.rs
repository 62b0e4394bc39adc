//! Test server harness for E2E testing
//!
//! Provides `TestGrantServer` for spawning real grant service instances in
//! tests.

use grant_service::config::Config;
use grant_service::handlers::AppState;
use grant_service::routes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A grant service running on an ephemeral local port.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_issue_grant() -> Result<()> {
///     let server = TestGrantServer::spawn(test_config()).await?;
///     let response = reqwest::get(server.token_url()).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestGrantServer {
    addr: SocketAddr,
    config: Config,
    handle: JoinHandle<()>,
}

impl TestGrantServer {
    /// Spawn a server with `config`. The configured bind address is ignored
    /// in favour of `127.0.0.1:0`.
    pub async fn spawn(config: Config) -> Result<Self, anyhow::Error> {
        let state = Arc::new(AppState {
            config: config.clone(),
        });

        // The global recorder can only be installed once per process; later
        // servers get a standalone handle.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            handle,
        })
    }

    /// Base URL, e.g. `http://127.0.0.1:54321`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL of the credential endpoint.
    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.url())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestGrantServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
