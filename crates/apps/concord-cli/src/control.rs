//! HTTP control surface.
//!
//! | route | method | response |
//! |-------|--------|----------|
//! | `/id` | GET | `{"peer": ..., "publisher": ...}` |
//! | `/ping/:peer_id` | GET | `OK` or 404 |
//! | `/status` | GET | `offline`, `online` or `public` |
//! | `/status/:state` | POST | the new status |
//! | `/config/dir` | GET, POST | the directory handle or `nil`; POST body is a handle |
//! | `/config/nat` | GET, POST | `none`, `*` or a multiaddr |
//! | `/manifest` | GET | the signed node manifest |
//!
//! Text responses end with a newline. Errors are `Error: <message>` with the
//! matching status code.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use concord_net::PeerAddressInfo;
use concord_node::{NatConfig, Node};
use concord_types::constants::PING_TIMEOUT;
use concord_types::NodeStatus;
use concord_wire::{manifest_body, Manifest};
use libp2p::PeerId;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// State shared by every control request.
pub struct ControlState {
    node: Arc<Node>,
    config: Mutex<CliConfig>,
    config_path: Option<PathBuf>,
    ping_timeout: Duration,
}

pub type SharedState = Arc<ControlState>;

impl ControlState {
    /// `config_path` is where `POST /config/*` persists the configuration;
    /// `None` keeps changes in memory.
    pub fn new(node: Arc<Node>, config: CliConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            node,
            config: Mutex::new(config),
            config_path,
            ping_timeout: PING_TIMEOUT,
        }
    }

    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.to_string())
    }

    fn not_found(message: impl ToString) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.to_string())
    }

    fn internal(message: impl ToString) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, format!("Error: {}\n", self.message)).into_response()
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build the control router over `state`.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/id", get(handle_id))
        .route("/ping/:peer_id", get(handle_ping))
        .route("/status", get(handle_status))
        .route("/status/:state", post(handle_set_status))
        .route("/config/dir", get(handle_get_dir).post(handle_set_dir))
        .route("/config/nat", get(handle_get_nat).post(handle_set_nat))
        .route("/manifest", get(handle_manifest))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the control surface on `addr` until `shutdown` resolves.
pub async fn serve<F>(state: SharedState, addr: SocketAddr, shutdown: F) -> CliResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::user(format!("failed to bind control surface on {}: {}", addr, e)))?;
    info!("Control surface listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Serialize)]
struct IdResponse {
    peer: String,
    publisher: String,
}

async fn handle_id(State(state): State<SharedState>) -> Json<IdResponse> {
    Json(IdResponse {
        peer: state.node.peer_id().to_string(),
        publisher: state.node.publisher().id().to_string(),
    })
}

async fn handle_ping(
    State(state): State<SharedState>,
    Path(peer_id): Path<String>,
) -> Result<&'static str, ApiError> {
    let peer: PeerId = peer_id.parse().map_err(ApiError::bad_request)?;

    debug!("Control ping to {}", peer);
    state
        .node
        .ping(peer, state.ping_timeout)
        .await
        .map_err(ApiError::not_found)?;

    Ok("OK\n")
}

async fn handle_status(State(state): State<SharedState>) -> String {
    format!("{}\n", state.node.status().await)
}

async fn handle_set_status(
    State(state): State<SharedState>,
    Path(requested): Path<String>,
) -> Result<String, ApiError> {
    let target: NodeStatus = requested.parse().map_err(ApiError::bad_request)?;

    let result = match target {
        NodeStatus::Offline => state.node.go_offline().await,
        NodeStatus::Online => state.node.go_online().await,
        NodeStatus::Public => state.node.go_public().await,
    };
    if let Err(e) = result {
        warn!("Transition to {} failed: {}", target, e);
        return Err(ApiError::internal(e));
    }

    Ok(format!("{}\n", state.node.status().await))
}

async fn handle_get_dir(State(state): State<SharedState>) -> String {
    match state.node.directory() {
        Some(dir) => format!("{}\n", dir.format_handle()),
        None => "nil\n".to_string(),
    }
}

async fn handle_set_dir(
    State(state): State<SharedState>,
    body: String,
) -> Result<&'static str, ApiError> {
    let handle = body.trim();
    let directory = PeerAddressInfo::parse_handle(handle).map_err(ApiError::bad_request)?;

    state.node.set_directory(Some(directory.clone()));

    let mut config = state.config.lock().await;
    config.network.directory = Some(directory.format_handle());
    if let Some(path) = &state.config_path {
        config.save(path).map_err(ApiError::internal)?;
    }

    Ok("OK\n")
}

async fn handle_get_nat(State(state): State<SharedState>) -> String {
    format!("{}\n", state.node.nat())
}

async fn handle_set_nat(
    State(state): State<SharedState>,
    body: String,
) -> Result<&'static str, ApiError> {
    let nat: NatConfig = body.trim().parse().map_err(ApiError::bad_request)?;

    state.node.set_nat(nat.clone());

    let mut config = state.config.lock().await;
    config.network.nat = nat.to_string();
    if let Some(path) = &state.config_path {
        config.save(path).map_err(ApiError::internal)?;
    }

    Ok("OK\n")
}

/// JSON rendering of a signed manifest; the signature is base58.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestResponse {
    entity: String,
    key_id: String,
    body: Option<ManifestBodyResponse>,
    timestamp: i64,
    signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ManifestBodyResponse {
    Node { peer: String, publisher: String },
}

impl From<Manifest> for ManifestResponse {
    fn from(manifest: Manifest) -> Self {
        let body = manifest
            .body
            .and_then(|body| body.body)
            .map(|body| match body {
                manifest_body::Body::Node(node) => ManifestBodyResponse::Node {
                    peer: node.peer,
                    publisher: node.publisher,
                },
            });

        Self {
            entity: manifest.entity,
            key_id: manifest.key_id,
            body,
            timestamp: manifest.timestamp,
            signature: bs58::encode(&manifest.signature).into_string(),
        }
    }
}

async fn handle_manifest(
    State(state): State<SharedState>,
) -> Result<Json<ManifestResponse>, ApiError> {
    let manifest = state
        .node
        .node_manifest()
        .map_err(ApiError::internal)?;
    Ok(Json(manifest.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use concord_node::{verify_manifest, NodeConfig, PublisherIdentity};
    use concord_test_utils::{memory_addr, test_identity, DirectoryStub, MemoryNetwork};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn node_on(network: &MemoryNetwork, directory: Option<PeerAddressInfo>) -> Arc<Node> {
        let mut config = NodeConfig::new().with_listen_address(memory_addr(0));
        if let Some(directory) = directory {
            config = config.with_directory(directory);
        }
        Arc::new(Node::new(
            test_identity(),
            PublisherIdentity::generate(),
            config,
            Arc::new(network.clone()),
        ))
    }

    fn state_for(node: Arc<Node>, config_path: Option<PathBuf>) -> SharedState {
        Arc::new(ControlState::new(node, CliConfig::default(), config_path))
    }

    async fn send(state: &SharedState, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = build_router(Arc::clone(state)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(state: &SharedState, uri: &str) -> (StatusCode, String) {
        send(state, Method::GET, uri, "").await
    }

    async fn post(state: &SharedState, uri: &str, body: &str) -> (StatusCode, String) {
        send(state, Method::POST, uri, body).await
    }

    #[tokio::test]
    async fn test_id() {
        let network = MemoryNetwork::new();
        let node = node_on(&network, None);
        let state = state_for(Arc::clone(&node), None);

        let (status, body) = get(&state, "/id").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["peer"], node.peer_id().to_string());
        assert_eq!(json["publisher"], node.publisher().id());
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let network = MemoryNetwork::new();
        let directory = DirectoryStub::spawn(&network).unwrap();
        let state = state_for(node_on(&network, Some(directory.address_info())), None);

        assert_eq!(get(&state, "/status").await, (StatusCode::OK, "offline\n".to_string()));
        assert_eq!(
            post(&state, "/status/online", "").await,
            (StatusCode::OK, "online\n".to_string())
        );
        assert_eq!(
            post(&state, "/status/public", "").await,
            (StatusCode::OK, "public\n".to_string())
        );
        directory.wait_for_registrations(1).await;

        // No demotion path from public
        assert_eq!(
            post(&state, "/status/online", "").await,
            (StatusCode::OK, "public\n".to_string())
        );
        assert_eq!(
            post(&state, "/status/offline", "").await,
            (StatusCode::OK, "offline\n".to_string())
        );
        assert_eq!(get(&state, "/status").await.1, "offline\n");
    }

    #[tokio::test]
    async fn test_unknown_state_is_bad_request() {
        let network = MemoryNetwork::new();
        let state = state_for(node_on(&network, None), None);

        let (status, body) = post(&state, "/status/private", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: Unrecognized state: private\n");
        assert_eq!(get(&state, "/status").await.1, "offline\n");
    }

    #[tokio::test]
    async fn test_failed_transition_is_internal_error() {
        let network = MemoryNetwork::new();
        let state = state_for(node_on(&network, None), None);

        // No directory configured
        let (status, body) = post(&state, "/status/public", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Error: "));

        network.fail_next_create("port in use");
        let (status, _) = post(&state, "/status/online", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(get(&state, "/status").await.1, "offline\n");
    }

    #[tokio::test]
    async fn test_ping() {
        let network = MemoryNetwork::new();
        let directory = DirectoryStub::spawn(&network).unwrap();

        let target = node_on(&network, Some(directory.address_info()));
        target.go_public().await.unwrap();
        directory.wait_for_registrations(1).await;

        let pinger = node_on(&network, Some(directory.address_info()));
        let state = state_for(Arc::clone(&pinger), None);
        let uri = format!("/ping/{}", target.peer_id());

        // Offline pinger
        let (status, body) = get(&state, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.starts_with("Error: "));

        pinger.go_online().await.unwrap();
        assert_eq!(get(&state, &uri).await, (StatusCode::OK, "OK\n".to_string()));

        // Never registered
        let stranger = test_identity().peer_id();
        let (status, _) = get(&state, &format!("/ping/{}", stranger)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ping_malformed_peer_id() {
        let network = MemoryNetwork::new();
        let state = state_for(node_on(&network, None), None);

        let (status, body) = get(&state, "/ping/not-a-peer").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_config_dir() {
        let network = MemoryNetwork::new();
        let directory = DirectoryStub::spawn(&network).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let node = node_on(&network, None);
        let state = state_for(Arc::clone(&node), Some(path.clone()));

        assert_eq!(get(&state, "/config/dir").await, (StatusCode::OK, "nil\n".to_string()));

        let handle = directory.handle();
        let (status, body) = post(&state, "/config/dir", &format!("  {}\n", handle)).await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "OK\n"));

        assert_eq!(get(&state, "/config/dir").await.1, format!("{}\n", handle));
        assert_eq!(node.directory().map(|d| d.id), Some(directory.peer_id()));

        let saved = CliConfig::load(&path).unwrap();
        assert_eq!(saved.network.directory.as_deref(), Some(handle.as_str()));

        // The new directory is usable right away
        let (status, _) = post(&state, "/status/public", "").await;
        assert_eq!(status, StatusCode::OK);
        directory.wait_for_registrations(1).await;
        node.go_offline().await.unwrap();
    }

    #[tokio::test]
    async fn test_config_dir_rejects_bad_handle() {
        let network = MemoryNetwork::new();
        let node = node_on(&network, None);
        let state = state_for(Arc::clone(&node), None);

        let (status, body) = post(&state, "/config/dir", "/ip4/127.0.0.1/tcp/9000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Error: "));
        assert!(node.directory().is_none());
    }

    #[tokio::test]
    async fn test_config_dir_save_failure() {
        let network = MemoryNetwork::new();
        let directory = DirectoryStub::spawn(&network).unwrap();
        let dir = TempDir::new().unwrap();
        // A directory where the config file should be
        let path = dir.path().to_path_buf();

        let state = state_for(node_on(&network, None), Some(path));
        let (status, _) = post(&state, "/config/dir", &directory.handle()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_config_nat() {
        let network = MemoryNetwork::new();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let node = node_on(&network, None);
        let state = state_for(Arc::clone(&node), Some(path.clone()));

        assert_eq!(get(&state, "/config/nat").await, (StatusCode::OK, "none\n".to_string()));

        assert_eq!(post(&state, "/config/nat", "*\n").await, (StatusCode::OK, "OK\n".to_string()));
        assert_eq!(get(&state, "/config/nat").await.1, "*\n");
        assert_eq!(node.nat(), NatConfig::Auto);

        let manual = "/ip4/203.0.113.7/tcp/9001";
        let (status, _) = post(&state, "/config/nat", manual).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(get(&state, "/config/nat").await.1, format!("{}\n", manual));
        assert_eq!(node.nat(), NatConfig::Manual(manual.parse().unwrap()));

        let saved = CliConfig::load(&path).unwrap();
        assert_eq!(saved.network.nat, manual);
        assert_eq!(saved.nat().unwrap(), node.nat());
    }

    #[tokio::test]
    async fn test_config_nat_rejects_bad_value() {
        let network = MemoryNetwork::new();
        let node = node_on(&network, None);
        let state = state_for(Arc::clone(&node), None);

        let (status, body) = post(&state, "/config/nat", "upnp").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Error: "));
        assert_eq!(node.nat(), NatConfig::None);
        assert_eq!(get(&state, "/config/nat").await.1, "none\n");
    }

    #[tokio::test]
    async fn test_config_nat_save_failure() {
        let network = MemoryNetwork::new();
        let dir = TempDir::new().unwrap();

        let state = state_for(node_on(&network, None), Some(dir.path().to_path_buf()));
        let (status, body) = post(&state, "/config/nat", "none").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_manifest() {
        let network = MemoryNetwork::new();
        let node = node_on(&network, None);
        let state = state_for(Arc::clone(&node), None);

        let (status, body) = get(&state, "/manifest").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let publisher = node.publisher().id();
        assert_eq!(json["entity"], publisher);
        assert_eq!(json["keyId"], publisher);
        assert_eq!(json["body"]["node"]["peer"], node.peer_id().to_string());
        assert_eq!(json["body"]["node"]["publisher"], publisher);

        let signature = bs58::decode(json["signature"].as_str().unwrap())
            .into_vec()
            .unwrap();
        assert_eq!(signature.len(), 64);

        // The JSON view carries the same signature the node would hand out
        let mut manifest = node.node_manifest().unwrap();
        assert!(verify_manifest(&manifest, &node.publisher().verifying_key()).is_ok());
        manifest.signature = signature;
        manifest.timestamp = json["timestamp"].as_i64().unwrap();
        assert!(verify_manifest(&manifest, &node.publisher().verifying_key()).is_ok());
    }
}
