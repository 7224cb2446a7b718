//! HTTP endpoint for Prometheus scraping and status checks
//!
//! Routes: the metrics path, `/status` (JSON snapshot, when a status handle
//! is attached), `/health` and `/` (help text).

use super::MetricsRegistry;
use crate::engine::BreakStatus;
use crate::resilience::KillSwitch;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 9464);

#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    pub listen_addr: SocketAddr,
    /// Path to serve metrics (default: "/metrics")
    pub metrics_path: String,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR,
            metrics_path: "/metrics".to_string(),
        }
    }
}

impl MetricsServerConfig {
    pub fn with_addr(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
struct Routes {
    registry: Arc<MetricsRegistry>,
    status: Option<BreakStatus>,
    metrics_path: String,
}

pub struct MetricsServer {
    config: MetricsServerConfig,
    registry: Arc<MetricsRegistry>,
    status: Option<BreakStatus>,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            config,
            registry,
            status: None,
        }
    }

    /// Also serve `/status` from this handle
    pub fn with_status(mut self, status: BreakStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Serve until the kill switch fires
    ///
    /// Should be spawned on its own tokio task.
    pub async fn serve(self, kill_switch: KillSwitch) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind metrics server to {}", self.config.listen_addr))?;

        info!(
            "Metrics server listening on http://{}{}",
            self.config.listen_addr, self.config.metrics_path
        );

        let routes = Routes {
            registry: self.registry.clone(),
            status: self.status.clone(),
            metrics_path: self.config.metrics_path.clone(),
        };

        loop {
            let accepted = tokio::select! {
                _ = kill_switch.stopped() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, remote_addr) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let routes = routes.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let routes = routes.clone();
                    async move { Ok::<_, hyper::Error>(route(req.uri().path(), &routes)) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }

        info!("Metrics server stopped");
        Ok(())
    }

    /// Current exposition text, without going through HTTP
    pub fn serve_metrics_once(&self) -> Result<String> {
        encode_metrics(&self.registry)
    }
}

fn route(path: &str, routes: &Routes) -> Response<Full<Bytes>> {
    debug!(path, "Metrics request");

    if path == "/health" || path == "/healthz" {
        return text(StatusCode::OK, "OK".to_string());
    }

    if path == routes.metrics_path {
        return match encode_metrics(&routes.registry) {
            Ok(body) => with_content_type(
                text(StatusCode::OK, body),
                "text/plain; version=0.0.4",
            ),
            Err(e) => {
                error!("Failed to encode metrics: {}", e);
                text(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
            }
        };
    }

    if path == "/status" {
        if let Some(status) = &routes.status {
            return match serde_json::to_string(&status.snapshot()) {
                Ok(body) => with_content_type(text(StatusCode::OK, body), "application/json"),
                Err(e) => text(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)),
            };
        }
    }

    if path == "/" {
        let mut help = format!(
            "Respite break manager\n\nEndpoints:\n  {} - Prometheus metrics\n  /health - Health check\n",
            routes.metrics_path
        );
        if routes.status.is_some() {
            help.push_str("  /status - Current state as JSON\n");
        }
        return text(StatusCode::OK, help);
    }

    warn!("Unknown metrics endpoint requested: {}", path);
    text(StatusCode::NOT_FOUND, "Not Found".to_string())
}

fn text(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
}

fn with_content_type(mut response: Response<Full<Bytes>>, value: &'static str) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(value));
    response
}

fn encode_metrics(registry: &MetricsRegistry) -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = registry.registry().gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;

    String::from_utf8(buffer).context("Invalid UTF-8 in metrics")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::SystemClock;
    use http_body_util::BodyExt;

    fn routes(status: Option<BreakStatus>) -> Routes {
        Routes {
            registry: Arc::new(MetricsRegistry::new().unwrap()),
            status,
            metrics_path: "/metrics".to_string(),
        }
    }

    async fn body(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_metrics_server_config_default() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.listen_addr.port(), 9464);
    }

    #[test]
    fn test_serve_metrics_once() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        let server = MetricsServer::new(MetricsServerConfig::default(), registry.clone());

        registry
            .cycle()
            .breaks_total
            .with_label_values(&["disconnect"])
            .inc();
        registry.system().ticks_total.inc();

        let metrics = server.serve_metrics_once().unwrap();

        assert!(metrics.contains("respite_cycle_breaks_total"));
        assert!(metrics.contains("respite_system_ticks_total"));
        assert!(metrics.contains("TYPE"));
        assert!(metrics.contains("HELP"));
    }

    #[tokio::test]
    async fn test_route_health_and_unknown() {
        let routes = routes(None);

        let health = route("/health", &routes);
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(body(health).await, "OK");

        assert_eq!(route("/nope", &routes).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_route_only_with_handle() {
        assert_eq!(route("/status", &routes(None)).status(), StatusCode::NOT_FOUND);

        let status = BreakStatus::new(Arc::new(SystemClock));
        let response = route("/status", &routes(Some(status)));
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body(response).await).unwrap();
        assert_eq!(json["state"], "WAITING");
        assert_eq!(json["seconds_until_break"], -1);
    }

    #[tokio::test]
    async fn test_serve_stops_on_kill_switch() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        let config = MetricsServerConfig::with_addr("127.0.0.1:0".parse().unwrap());
        let kill_switch = KillSwitch::new();

        let handle = tokio::spawn(MetricsServer::new(config, registry).serve(kill_switch.clone()));
        tokio::task::yield_now().await;
        kill_switch.shutdown("test");

        assert!(handle.await.unwrap().is_ok());
    }
}
