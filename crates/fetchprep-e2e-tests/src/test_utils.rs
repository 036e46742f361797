use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use fetchprep_lib::download::TransferConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;

/// Behavior of one served path on the instrumented test server.
#[derive(Clone, Default)]
pub struct RouteSpec {
    pub body: Vec<u8>,
    /// Honor byte-range requests and advertise `Accept-Ranges: bytes`.
    pub ranges: bool,
    /// Respond 500 to this many requests before serving normally.
    pub fail_first: u32,
    /// Cut the first successful response short after this many bytes,
    /// simulating a connection dropped mid-transfer.
    pub truncate_first_at: Option<usize>,
    /// Fixed status (e.g. 404) returned for every request.
    pub status: Option<u16>,
    /// Hold each request this long before responding.
    pub delay: Option<Duration>,
}

impl RouteSpec {
    pub fn payload(body: Vec<u8>) -> Self {
        Self {
            body,
            ranges: true,
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct ServerState {
    routes: Mutex<HashMap<String, RouteSpec>>,
    hits: Mutex<HashMap<String, u32>>,
    request_times: Mutex<HashMap<String, Vec<Instant>>>,
    request_order: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlightGuard {
    state: Arc<ServerState>,
}

impl InFlightGuard {
    fn enter(state: &Arc<ServerState>) -> Self {
        let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(current, Ordering::SeqCst);
        Self {
            state: state.clone(),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-process HTTP server with per-path fault injection and request
/// accounting, used as the engine's fake transport in tests.
pub struct TestServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

pub async fn start_test_server() -> TestServer {
    let state = Arc::new(ServerState::default());
    let app = Router::new().fallback(handle).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("test server address");
    tracing::debug!(%addr, "test server listening");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    TestServer { addr, state }
}

impl TestServer {
    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, path)).expect("test url")
    }

    pub fn add_route(&self, path: &str, spec: RouteSpec) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), spec);
    }

    pub fn add_payload(&self, path: &str, body: Vec<u8>) {
        self.add_route(path, RouteSpec::payload(body));
    }

    /// Requests seen for a path, including failed and ranged ones.
    pub fn hits(&self, path: &str) -> u32 {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Wall-time gaps between consecutive requests to a path.
    pub fn request_gaps(&self, path: &str) -> Vec<Duration> {
        let times = self.state.request_times.lock().unwrap();
        let Some(times) = times.get(path) else {
            return Vec::new();
        };
        times.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }

    /// Paths in the order their requests arrived.
    pub fn request_order(&self) -> Vec<String> {
        self.state.request_order.lock().unwrap().clone()
    }

    /// High-water mark of concurrently handled requests.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

async fn handle(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let range_start = parse_range_start(request.headers());
    let _guard = InFlightGuard::enter(&state);

    let spec = state.routes.lock().unwrap().get(&path).cloned();
    let Some(spec) = spec else {
        return status_response(StatusCode::NOT_FOUND);
    };

    let hit = {
        let mut hits = state.hits.lock().unwrap();
        let counter = hits.entry(path.clone()).or_insert(0);
        *counter += 1;
        *counter
    };
    state
        .request_times
        .lock()
        .unwrap()
        .entry(path.clone())
        .or_default()
        .push(Instant::now());
    state.request_order.lock().unwrap().push(path);

    if let Some(status) = spec.status {
        return status_response(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        );
    }
    if hit <= spec.fail_first {
        return status_response(StatusCode::INTERNAL_SERVER_ERROR);
    }
    if let Some(delay) = spec.delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(cut_at) = spec.truncate_first_at
        && hit == spec.fail_first + 1
    {
        let prefix = Bytes::from(spec.body[..cut_at.min(spec.body.len())].to_vec());
        let stream = futures::stream::iter(vec![
            Ok::<_, std::io::Error>(prefix),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "simulated mid-body connection loss",
            )),
        ]);
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from_stream(stream))
            .expect("truncated response");
    }

    if spec.ranges
        && let Some(start) = range_start
    {
        let len = spec.body.len() as u64;
        if start >= len {
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{len}"))
                .body(Body::empty())
                .expect("416 response");
        }
        let slice = spec.body[start as usize..].to_vec();
        return Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, len - 1, len),
            )
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(slice))
            .expect("206 response");
    }

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::LAST_MODIFIED, "Thu, 01 Jan 2026 00:00:00 GMT");
    if spec.ranges {
        builder = builder.header(header::ACCEPT_RANGES, "bytes");
    }
    builder
        .body(Body::from(spec.body))
        .expect("200 response")
}

fn status_response(status: StatusCode) -> Response {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .expect("status response")
}

fn parse_range_start(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(header::RANGE)?.to_str().ok()?;
    let suffix = value.strip_prefix("bytes=")?;
    let (start, _) = suffix.split_once('-')?;
    start.parse().ok()
}

/// Engine configuration tuned for fast, display-free test runs.
pub fn test_config() -> TransferConfig {
    TransferConfig {
        max_retries: 3,
        retry_delay: Duration::from_millis(50),
        retry_backoff: 2.0,
        timeout: Duration::from_secs(10),
        chunk_size: 8192,
        show_progress: false,
        max_parallel: 4,
        user_agent: "fetchprep-e2e/0.1".to_string(),
    }
}

/// Deterministic patterned payload of the given size.
pub fn patterned_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("fetchprep=debug,fetchprep_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
