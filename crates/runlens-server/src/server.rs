//! HTTP API: tab data routes, tab tree, data status and processing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as AxumPath, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};

use runlens_state::{
    DownloadState, DownloadStatusTable, FsActivitySource, FsArtifactStore, SessionTable,
};
use runlens_tabs::{
    leaves, register_all, tab_tree, ActivitySource, AthleteId, DataHandler, RouteTable,
    SessionResolver, TabEnv, TabEnvelope, TabError, TabNode, IMAGE_MANIFEST, IMAGE_TAB_TYPE,
};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::jobs::run_processing;

pub const SESSION_COOKIE: &str = "session_token";
const STATUS_PUSH_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct WebState {
    pub forest: Arc<Vec<TabNode>>,
    pub env: Arc<TabEnv>,
    pub sessions: Arc<dyn SessionResolver>,
    pub statuses: Arc<DownloadStatusTable>,
    pub activities: Arc<dyn ActivitySource>,
    jobs: Arc<Mutex<HashSet<AthleteId>>>,
}

impl WebState {
    pub fn new(
        forest: Vec<TabNode>,
        env: TabEnv,
        sessions: Arc<dyn SessionResolver>,
        statuses: Arc<DownloadStatusTable>,
        activities: Arc<dyn ActivitySource>,
    ) -> Self {
        Self {
            forest: Arc::new(forest),
            env: Arc::new(env),
            sessions,
            statuses,
            activities,
            jobs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Open the file-backed stores named by `config`.
    pub fn open(config: &ServerConfig, forest: Vec<TabNode>) -> anyhow::Result<Self> {
        let storage = &config.storage;
        let sessions = SessionTable::open(storage.sessions_file())?;
        let statuses = DownloadStatusTable::open(storage.status_file())?;
        let env = TabEnv::new(
            Arc::new(FsArtifactStore::new(storage.artifacts_dir())),
            storage.scratch_dir(),
        );
        tracing::info!(
            data_dir = %storage.data_dir.display(),
            sessions = sessions.len(),
            "opened RunLens state"
        );
        Ok(Self::new(
            forest,
            env,
            Arc::new(sessions),
            Arc::new(statuses),
            Arc::new(FsActivitySource::new(storage.activities_dir())),
        ))
    }

    /// Claim the processing slot for an athlete. Returns false when a job
    /// is already running.
    pub async fn begin_job(&self, athlete_id: AthleteId) -> bool {
        self.jobs.lock().await.insert(athlete_id)
    }

    pub async fn finish_job(&self, athlete_id: AthleteId) {
        self.jobs.lock().await.remove(&athlete_id);
    }
}

/// Route table that mounts tab handlers on an axum router.
pub struct TabRouteTable {
    router: Router<WebState>,
    paths: HashSet<String>,
}

impl TabRouteTable {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            paths: HashSet::new(),
        }
    }

    pub fn into_router(self) -> Router<WebState> {
        self.router
    }
}

impl Default for TabRouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable for TabRouteTable {
    fn register(&mut self, path: String, handler: DataHandler) -> Result<(), TabError> {
        if !self.paths.insert(path.clone()) {
            return Err(TabError::Configuration(format!("route {path} registered twice")));
        }
        let router = std::mem::take(&mut self.router);
        self.router = router.route(
            &path,
            get(move |State(web): State<WebState>, headers: HeaderMap| {
                let handler = Arc::clone(&handler);
                async move { serve_tab(web, headers, handler).await }
            }),
        );
        Ok(())
    }
}

async fn serve_tab(
    web: WebState,
    headers: HeaderMap,
    handler: DataHandler,
) -> Result<Json<TabEnvelope>, ApiError> {
    let athlete_id = resolve_athlete(&web, &headers)?;
    let envelope = tokio::task::spawn_blocking(move || handler(athlete_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(envelope))
}

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
}

fn resolve_athlete(web: &WebState, headers: &HeaderMap) -> Result<AthleteId, ApiError> {
    let token = session_token(headers).ok_or(ApiError::Unauthorized)?;
    Ok(web.sessions.resolve(&token)?)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid allowed origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

/// Build the full API router. Fails if two tabs share a key.
pub fn build_router(web: WebState, allowed_origins: &[String]) -> Result<Router, TabError> {
    let mut tab_routes = TabRouteTable::new();
    register_all(&web.forest, &mut tab_routes, Arc::clone(&web.env))?;

    Ok(tab_routes
        .into_router()
        .route("/api/health", get(api_health))
        .route("/api/tabs", get(api_tabs))
        .route("/api/data_status", get(api_data_status))
        .route("/api/process", post(api_process))
        .route("/api/images/:key/:file", get(api_image))
        .route("/ws/data_status", get(ws_data_status))
        .layer(cors_layer(allowed_origins))
        .with_state(web))
}

pub async fn run(config: ServerConfig, forest: Vec<TabNode>) -> anyhow::Result<()> {
    let web = WebState::open(&config, forest)?;
    let app = build_router(web, &config.server.allowed_origins)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(
        addr = %config.server.bind_addr,
        origins = ?config.server.allowed_origins,
        "RunLens API listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ── Handlers ────────────────────────────────────────────────────────────────

async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true, "service": "runlens"}))
}

async fn api_tabs(State(web): State<WebState>) -> impl IntoResponse {
    Json(tab_tree(&web.forest))
}

async fn api_data_status(
    State(web): State<WebState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let athlete_id = resolve_athlete(&web, &headers)?;
    Ok(Json(web.statuses.data_status(athlete_id)))
}

async fn api_process(
    State(web): State<WebState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let athlete_id = resolve_athlete(&web, &headers)?;
    if !web.begin_job(athlete_id).await {
        return Err(ApiError::Conflict(athlete_id));
    }
    // pollers must see the run before the 202 goes out
    if let Err(e) = web.statuses.set_state(athlete_id, DownloadState::Downloading, None) {
        web.finish_job(athlete_id).await;
        return Err(ApiError::Internal(e.to_string()));
    }

    let job = web.clone();
    tokio::spawn(async move {
        let worker = job.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            run_processing(
                &worker.forest,
                worker.activities.as_ref(),
                &worker.env,
                &worker.statuses,
                athlete_id,
            )
        })
        .await;
        match outcome {
            Ok(Ok(report)) => tracing::info!(
                athlete = %athlete_id,
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                "processing job finished"
            ),
            Ok(Err(e)) => tracing::warn!(athlete = %athlete_id, error = %e, "processing job failed"),
            Err(e) => {
                tracing::error!(athlete = %athlete_id, error = %e, "processing job panicked");
                let marked = job.statuses.set_state(
                    athlete_id,
                    DownloadState::Failed,
                    Some("processing job panicked".to_string()),
                );
                if let Err(e) = marked {
                    tracing::error!(athlete = %athlete_id, error = %e, "could not record failed job");
                }
            }
        }
        job.finish_job(athlete_id).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"ok": true, "athlete_id": athlete_id})),
    ))
}

fn content_type_for(file: &str) -> &'static str {
    let ext = file.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn api_image(
    State(web): State<WebState>,
    AxumPath((key, file)): AxumPath<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let athlete_id = resolve_athlete(&web, &headers)?;
    let is_image_tab = leaves(&web.forest)
        .iter()
        .any(|t| t.get_type() == IMAGE_TAB_TYPE && t.get_key() == key);
    if !is_image_tab || file == IMAGE_MANIFEST {
        return Err(ApiError::NotFound(format!("{key}/{file}")));
    }

    let bytes = web.env.load_artifact(athlete_id, &key, &file)?;
    Ok((
        [(header::CONTENT_TYPE, content_type_for(&file))],
        Bytes::from(bytes),
    ))
}

async fn ws_data_status(
    ws: WebSocketUpgrade,
    State(web): State<WebState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let athlete_id = resolve_athlete(&web, &headers)?;
    Ok(ws.on_upgrade(move |socket| status_loop(socket, web.statuses, athlete_id)))
}

/// Push the data status every couple of seconds until polling can stop.
async fn status_loop(mut socket: WebSocket, statuses: Arc<DownloadStatusTable>, athlete_id: AthleteId) {
    let mut interval = tokio::time::interval(STATUS_PUSH_INTERVAL);
    loop {
        interval.tick().await;
        let status = statuses.data_status(athlete_id);
        let payload = match serde_json::to_string(&status) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode data status");
                break;
            }
        };

        if socket.send(Message::Text(payload)).await.is_err() {
            break;
        }
        if status.stop_polling {
            let _ = socket.send(Message::Close(None)).await;
            break;
        }
    }
    tracing::debug!(athlete = %athlete_id, "data status stream closed");
}
