//! Viewer HTTP server
//!
//! Serves the log viewer page at `/lg` and `/lg/`. Host applications can merge
//! [`router`] into their own axum app, or run it standalone with [`start`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::html::{render_missing_log, render_page, ViewContext};
use super::source::{FileSource, LogSource, Page, RowStoreSource, SourceKind};
use crate::logging::{Level, Logger};

/// Default number of entries per page
pub const DEFAULT_PER_PAGE: usize = 200;

/// Sources the viewer can read from
pub struct ViewerState {
    file: Option<Arc<dyn LogSource>>,
    rows: Option<Arc<dyn LogSource>>,
    default_per_page: usize,
}

impl ViewerState {
    pub fn new(file: Option<Arc<dyn LogSource>>, rows: Option<Arc<dyn LogSource>>) -> Self {
        Self {
            file,
            rows,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Build the sources from a configured logger's file and row store
    pub fn from_logger(logger: &Logger) -> Self {
        let file = logger
            .log_file_path()
            .map(|path| Arc::new(FileSource::new(path)) as Arc<dyn LogSource>);
        let rows = logger.row_store().map(|store| {
            Arc::new(RowStoreSource::new(store, logger.formatter().clone())) as Arc<dyn LogSource>
        });
        Self::new(file, rows)
    }

    pub fn with_default_per_page(mut self, per_page: usize) -> Self {
        self.default_per_page = per_page.max(1);
        self
    }

    fn source(&self, kind: SourceKind) -> Option<Arc<dyn LogSource>> {
        match kind {
            SourceKind::File => self.file.clone(),
            SourceKind::Db => self.rows.clone(),
        }
    }
}

/// Query parameters accepted by the viewer
#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub per_page: Option<usize>,
    #[serde(default)]
    pub source: Option<SourceKind>,
}

impl ViewerQuery {
    /// Requested minimum level; missing or unknown names fall back to INFO
    pub fn level(&self) -> Level {
        self.level
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or(Level::Info)
    }
}

/// Routes for the viewer, ready to be merged into a host router
pub fn router(state: Arc<ViewerState>) -> Router {
    Router::new()
        .route("/lg", get(viewer_handler))
        .route("/lg/", get(viewer_handler))
        .with_state(state)
}

/// A running standalone viewer
pub struct ServerHandle {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Address the viewer is bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Full URL of the viewer page
    pub fn url(&self) -> String {
        format!("http://{}/lg/", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests to finish
    pub async fn shutdown(self) -> Result<()> {
        // The server task may already be gone, in which case there is nobody to tell
        let _ = self.stop.send(());
        self.task.await??;
        Ok(())
    }
}

/// Serve the viewer on 127.0.0.1 until [`ServerHandle::shutdown`]
///
/// Port 0 binds a free port; read it back with [`ServerHandle::addr`].
pub async fn start(port: u16, state: Arc<ViewerState>) -> Result<ServerHandle> {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await?;
    let addr = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();

    let app = router(state);
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                stopped.await.ok();
                info!("Log viewer stopping");
            })
            .await
    });

    info!("Log viewer at http://{}/lg/", addr);
    Ok(ServerHandle { addr, stop, task })
}

/// GET /lg handler
///
/// Re-reads the selected source on every request.
async fn viewer_handler(
    State(state): State<Arc<ViewerState>>,
    Query(query): Query<ViewerQuery>,
) -> Response {
    let kind = query.source.unwrap_or_default();
    let level = query.level();
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(state.default_per_page);

    debug!(source = kind.as_str(), %level, page, per_page, "Viewer request");

    let source = match state.source(kind) {
        Some(source) if source.is_available() => source,
        _ if kind == SourceKind::File => return Html(render_missing_log()).into_response(),
        _ => return (StatusCode::NOT_FOUND, "No row store configured").into_response(),
    };

    // The scan is blocking file I/O
    let entries = match tokio::task::spawn_blocking(move || source.entries(Some(level))).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("Log scan task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let page = Page::paginate(entries, page, per_page);
    let ctx = ViewContext {
        level,
        source: kind,
        has_row_store: state.rows.is_some(),
    };
    Html(render_page(&page, &ctx)).into_response()
}
