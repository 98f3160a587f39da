//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount one Axum route per compiled rule
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener and stop on the shutdown broadcast
//! - Dispatch requests to the routing context and render the payload

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, RawQuery, State},
    http::HeaderMap,
    routing::on,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::ResponsePayload;
use crate::observability::metrics;
use crate::routing::{to_axum_path, CompiledRoute, RequestInput, RouterContext};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<RouterContext>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving the routes of `context`.
    pub fn new(config: &GatewayConfig, context: Arc<RouterContext>) -> Self {
        let state = AppState { context };
        let router = Self::build_router(config, state);
        Self {
            router,
            config: config.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router: Router<AppState> = Router::new();

        for route in state.context.routes() {
            let path = to_axum_path(&route.rule.path);
            let filter = route.rule.method.filter();
            let route = Arc::clone(route);

            let handler = move |State(state): State<AppState>,
                                Path(path_params): Path<HashMap<String, String>>,
                                RawQuery(query): RawQuery,
                                headers: HeaderMap,
                                body: Bytes| {
                let input = RequestInput {
                    path_params,
                    body,
                    query,
                };
                rule_handler(state, Arc::clone(&route), input, headers)
            };
            router = router.route(&path, on(filter, handler));
        }

        router
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Runs the query set bound to `route` and renders the outcome.
async fn rule_handler(
    state: AppState,
    route: Arc<CompiledRoute>,
    input: RequestInput,
    headers: HeaderMap,
) -> ResponsePayload {
    let start_time = Instant::now();
    let request_id = request_id(&headers).to_string();
    let method = route.rule.method;
    let path = route.rule.path.clone();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        route = %path,
        "Executing rule"
    );

    let result = state.context.execute(route, input).await;

    let outcome = match &result {
        Ok(rows) => {
            tracing::debug!(request_id = %request_id, rows = rows.len(), "Rule succeeded");
            "success"
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                route = %path,
                error_type = e.kind().as_str(),
                error = %e,
                "Rule failed"
            );
            e.kind().as_str()
        }
    };
    metrics::record_request(method.as_str(), &path, outcome, start_time);

    ResponsePayload::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Method, Rule};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rusqlite::Connection;
    use tower::ServiceExt;

    fn server(rules: Vec<Rule>) -> HttpServer {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE test (id INTEGER PRIMARY KEY, body TEXT);
             INSERT INTO test VALUES (3, 'x');",
        )
        .unwrap();
        let context = RouterContext::compile(vec![conn], rules).unwrap();
        HttpServer::new(&GatewayConfig::default(), Arc::new(context))
    }

    fn rule(path: &str, method: Method, query: &str) -> Rule {
        Rule {
            path: path.into(),
            method,
            befores: vec![],
            queries: vec![query.into()],
            afters: vec![],
            transaction: false,
        }
    }

    async fn call(server: &HttpServer, request: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
        let response = server.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, headers, json)
    }

    #[tokio::test]
    async fn test_path_parameter_route() {
        let server = server(vec![rule(
            "/show/:id",
            Method::Get,
            "SELECT * FROM test WHERE id = {{id}}",
        )]);
        let (status, headers, json) = call(
            &server,
            Request::get("/show/3").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(json["success"], true);
        assert_eq!(json["rows"], serde_json::json!([{"id": 3, "body": "x"}]));
    }

    #[tokio::test]
    async fn test_route_without_parameters() {
        let server = server(vec![rule("/all", Method::Get, "SELECT id FROM test")]);
        let (_, _, json) = call(&server, Request::get("/all").body(Body::empty()).unwrap()).await;
        assert_eq!(json["rows"], serde_json::json!([{"id": 3}]));
    }

    #[tokio::test]
    async fn test_catch_all_route() {
        let server = server(vec![rule("/files/*rest", Method::Get, "SELECT {{rest}} AS rest")]);
        let (_, _, json) =
            call(&server, Request::get("/files/a/b").body(Body::empty()).unwrap()).await;
        assert_eq!(json["rows"], serde_json::json!([{"rest": "/a/b"}]));
    }

    #[tokio::test]
    async fn test_method_mismatch() {
        let server = server(vec![rule("/all", Method::Post, "SELECT id FROM test")]);
        let (status, _, _) = call(&server, Request::get("/all").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_failure_payload_is_ok_status() {
        let server = server(vec![rule("/missing", Method::Get, "SELECT {{missing}}")]);
        let (status, _, json) =
            call(&server, Request::get("/missing").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert_eq!(json["errorType"], "UnknownArgError");
        assert_eq!(json["errorDescription"], "unknown argument name: missing");
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let server = server(vec![rule("/all", Method::Get, "SELECT 1 AS one")]);
        let (_, headers, _) = call(
            &server,
            Request::get("/all")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(headers["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_same_path_different_methods() {
        let server = server(vec![
            rule("/item/:id", Method::Get, "SELECT body FROM test WHERE id = {{id}}"),
            rule("/item/:id", Method::Delete, "DELETE FROM test WHERE id = {{id}}"),
        ]);
        let (_, _, json) =
            call(&server, Request::delete("/item/3").body(Body::empty()).unwrap()).await;
        assert_eq!(json["success"], true);
        let (_, _, json) = call(&server, Request::get("/item/3").body(Body::empty()).unwrap()).await;
        assert_eq!(json["rows"], serde_json::json!([]));
    }
}
