//! Development server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    handler::Handler,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;

use kiji_content::{Catalog, ContentError, RuntimeMode, Visibility};
use kiji_site::assets::AssetPipeline;
use kiji_site::{OgError, RenderError, RenderTarget, SiteConfig, SiteRenderer};

use crate::livereload::{livereload_client_script, ReloadHub, ReloadMessage, LIVE_RELOAD_PATH};
use crate::watcher::{FileWatcher, WatchEvent};

const XML: &str = "application/xml";
const SVG: &str = "image/svg+xml";
const FEED_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=21600";

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Content root laid out as `YYYY/MM/<file>`
    pub content_dir: PathBuf,

    /// Directory of static files (images) served as-is, if any
    pub public_dir: Option<PathBuf>,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,

    /// Watch content and reload connected browsers
    pub live_reload: bool,

    /// Site metadata
    pub site: SiteConfig,

    /// Fixed visibility; resolved from the environment per request when unset
    pub visibility: Option<Visibility>,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content/posts"),
            public_dir: None,
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: true,
            live_reload: true,
            site: SiteConfig::default(),
            visibility: None,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}: {1}")]
    AddressError(String, std::net::AddrParseError),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    #[error("Server error: {0}")]
    ServeError(std::io::Error),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),
}

/// Why a page could not be rendered.
#[derive(Debug, thiserror::Error)]
enum PageError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Shared server state.
struct ServerState {
    config: DevServerConfig,
    catalog: Catalog,
    renderer: SiteRenderer,
    reload: ReloadHub,
}

type SharedState = Arc<ServerState>;

impl ServerState {
    fn new(config: DevServerConfig) -> Self {
        let renderer = SiteRenderer::new(
            config.site.clone(),
            RenderTarget::Server {
                live_reload: config.live_reload,
            },
        );

        Self {
            catalog: Catalog::new(&config.content_dir),
            renderer,
            reload: ReloadHub::new(),
            config,
        }
    }

    /// Visibility for the current request.
    fn visibility(&self) -> Visibility {
        self.config
            .visibility
            .unwrap_or_else(|| Visibility::from_env(RuntimeMode::Development))
    }
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server.
    pub async fn start(self) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::AddressError(address.clone(), e))?;

        let state = Arc::new(ServerState::new(self.config.clone()));

        if self.config.live_reload {
            let (watcher, mut rx) = FileWatcher::new(&[self.config.content_dir.clone()])?;

            let state_clone = Arc::clone(&state);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    handle_watch_event(&state_clone, event);
                }
                // Keep watcher alive
                drop(watcher);
            });
        }

        let app = router(state);

        tracing::info!("Starting dev server at http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e))?;

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, app)
            .await
            .map_err(ServerError::ServeError)?;

        Ok(())
    }
}

fn router(state: SharedState) -> Router {
    let routes = Router::new()
        .route("/", get(index_handler))
        .route("/posts/{year}/{month}/{slug}", get(post_handler))
        .route("/tags/{tag}", get(tag_handler))
        .route("/api/rss", get(rss_handler))
        .route("/api/og", get(og_default_handler))
        .route("/api/og/post", get(og_post_handler))
        .route("/sitemap.xml", get(sitemap_index_handler))
        .route("/sitemap/{file}", get(sitemap_handler))
        .route("/robots.txt", get(robots_handler))
        .route("/assets/main.css", get(css_handler))
        .route("/assets/main.js", get(js_handler))
        .route(LIVE_RELOAD_PATH, get(ws_handler))
        .route("/__livereload.js", get(livereload_script_handler));

    let routes = match &state.config.public_dir {
        Some(dir) => routes.fallback_service(
            ServeDir::new(dir).not_found_service(fallback_handler.with_state(Arc::clone(&state))),
        ),
        None => routes.fallback(fallback_handler),
    };

    routes.with_state(state)
}

/// Handle file watch events.
fn handle_watch_event(state: &ServerState, event: WatchEvent) {
    let path = event.path();
    let relative = path.strip_prefix(&state.config.content_dir).unwrap_or(path);

    match &event {
        WatchEvent::PostChanged(_) => tracing::info!("Post changed: {}", relative.display()),
        WatchEvent::PostRemoved(_) => tracing::info!("Post removed: {}", relative.display()),
        WatchEvent::Other(_) => tracing::debug!("Changed: {}", relative.display()),
    }

    state.reload.send(ReloadMessage::Reload {
        path: relative.display().to_string(),
    });
}

async fn index_handler(State(state): State<SharedState>) -> Response {
    page_response(&state, render_home(&state))
}

async fn post_handler(
    State(state): State<SharedState>,
    Path((year, month, slug)): Path<(String, String, String)>,
) -> Response {
    page_response(&state, render_post(&state, &year, &month, &slug))
}

async fn tag_handler(State(state): State<SharedState>, Path(tag): Path<String>) -> Response {
    page_response(&state, render_tag(&state, &tag))
}

async fn fallback_handler(State(state): State<SharedState>) -> Response {
    page_response(&state, Err(PageError::NotFound))
}

fn render_home(state: &ServerState) -> Result<String, PageError> {
    let posts = state.catalog.all_posts_meta(state.visibility())?;
    Ok(state.renderer.home(&posts)?)
}

fn render_post(state: &ServerState, year: &str, month: &str, slug: &str) -> Result<String, PageError> {
    let visibility = state.visibility();

    let post = state
        .catalog
        .post(year, month, slug)?
        .filter(|post| visibility.allows(&post.meta))
        .ok_or(PageError::NotFound)?;

    let others = state.catalog.all_posts_meta(visibility)?;

    Ok(state.renderer.post(&post, &others)?)
}

fn render_tag(state: &ServerState, tag: &str) -> Result<String, PageError> {
    let posts = state.catalog.posts_by_tag(tag, state.visibility())?;
    Ok(state.renderer.tag(tag, &posts)?)
}

/// Turn a page result into a response, rendering the 404 and error pages.
fn page_response(state: &ServerState, result: Result<String, PageError>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(PageError::NotFound) => match state.renderer.not_found() {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => internal_error(e),
        },
        Err(e) => {
            tracing::error!("{}", e);
            match state.renderer.error(&e.to_string()) {
                Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
                Err(e) => internal_error(e),
            }
        }
    }
}

fn internal_error(error: impl std::fmt::Display) -> Response {
    tracing::error!("{}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
}

async fn rss_handler(State(state): State<SharedState>) -> Response {
    match state.catalog.all_posts_meta(state.visibility()) {
        Ok(posts) => (
            [
                (header::CONTENT_TYPE, XML),
                (header::CACHE_CONTROL, FEED_CACHE_CONTROL),
            ],
            state.renderer.rss(&posts, Utc::now()),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn og_default_handler(State(state): State<SharedState>) -> Response {
    match state.renderer.og_default() {
        Ok(svg) => ([(header::CONTENT_TYPE, SVG)], svg).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct OgQuery {
    title: Option<String>,
    date: Option<String>,
}

async fn og_post_handler(State(state): State<SharedState>, Query(query): Query<OgQuery>) -> Response {
    match state
        .renderer
        .og_post(query.title.as_deref(), query.date.as_deref())
    {
        Ok(svg) => ([(header::CONTENT_TYPE, SVG)], svg).into_response(),
        Err(e @ OgError::MissingTitle) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn sitemap_index_handler(State(state): State<SharedState>) -> Response {
    let xml = state
        .catalog
        .all_posts_meta(state.visibility())
        .map_err(PageError::from)
        .and_then(|posts| Ok(state.renderer.sitemap_index(posts.len())?));

    match xml {
        Ok(xml) => ([(header::CONTENT_TYPE, XML)], xml).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn sitemap_handler(State(state): State<SharedState>, Path(file): Path<String>) -> Response {
    let Some(id) = file
        .strip_suffix(".xml")
        .and_then(|id| id.parse::<usize>().ok())
    else {
        return page_response(&state, Err(PageError::NotFound));
    };

    let xml = state
        .catalog
        .all_posts_meta(state.visibility())
        .map_err(PageError::from)
        .and_then(|posts| Ok(state.renderer.sitemap(id, &posts, Utc::now())?));

    match xml {
        Ok(Some(xml)) => ([(header::CONTENT_TYPE, XML)], xml).into_response(),
        Ok(None) => page_response(&state, Err(PageError::NotFound)),
        Err(e) => internal_error(e),
    }
}

async fn robots_handler(State(state): State<SharedState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], state.renderer.robots())
}

async fn css_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], AssetPipeline::css(false))
}

async fn js_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], AssetPipeline::js())
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload messages to one browser until it disconnects.
async fn handle_ws(mut socket: WebSocket, state: SharedState) {
    let mut rx = state.reload.subscribe();

    if send_message(&mut socket, &ReloadMessage::Connected).await.is_err() {
        return;
    }

    loop {
        let msg = match rx.recv().await {
            Ok(msg) => msg,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Live reload client skipped {} messages", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if send_message(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

async fn livereload_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        livereload_client_script(),
    )
}
