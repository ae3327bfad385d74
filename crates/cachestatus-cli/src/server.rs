//! HTTP server mode: run checks on request, and serve manifests and file
//! lists from local disk for other cache nodes to fetch.

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use cachestatus_core::check::{run_check, CheckConfig};
use cachestatus_core::checksum::HashKind;
use cachestatus_core::config::AppConfig;
use cachestatus_core::filelist;
use cachestatus_core::model::VHost;
use cachestatus_core::worker::CheckOptions;

#[derive(Clone)]
struct AppState {
    cfg: AppConfig,
}

pub async fn serve(port: u16, cfg: AppConfig) -> Result<()> {
    let app = Router::new()
        .route("/cachestatus", get(run_cachestatus))
        .route("/manifest/*path", get(get_local_file).post(put_local_file))
        .route("/filelist/*path", get(get_local_file).post(put_local_file))
        .with_state(AppState { cfg });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("could not listen on port {}", port))?;
    tracing::info!("listening on :{}", port);
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}

/// Query parameters mirror the CLI flags.
#[derive(Debug, Deserialize)]
struct CheckParams {
    filelist: String,
    #[serde(default)]
    createmanifest: Option<String>,
    #[serde(default)]
    server: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    workers: Option<usize>,
    #[serde(default)]
    checksum: Option<String>,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// `version=true` asks for the tool version as a `Version` response header.
fn version_headers(requested: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if requested == Some("true") {
        headers.insert("version", HeaderValue::from_static(env!("CARGO_PKG_VERSION")));
    }
    headers
}

async fn run_cachestatus(
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> (StatusCode, HeaderMap, String) {
    let headers = version_headers(params.version.as_deref());
    match handle_check(&state.cfg, params).await {
        Ok(body) => (StatusCode::OK, headers, body),
        Err(e) => (StatusCode::BAD_REQUEST, headers, format!("{:#}\n", e)),
    }
}

async fn handle_check(cfg: &AppConfig, params: CheckParams) -> Result<String> {
    let hash = match &params.hash {
        Some(name) => HashKind::from_name(name)?,
        None => cfg.hash,
    };

    let vhost = VHost::new(params.filelist, params.hostname.unwrap_or_default());
    let vhost = tokio::task::spawn_blocking(move || -> Result<VHost> {
        let mut vhost = vhost;
        filelist::load_file_list(&mut vhost)?;
        Ok(vhost)
    })
    .await
    .context("file list task")??;

    let check_cfg = CheckConfig {
        server: params.server.unwrap_or_else(|| "localhost".to_string()),
        workers: params.workers.unwrap_or(cfg.workers).max(1),
        options: CheckOptions {
            checksum: params.checksum.as_deref() == Some("true"),
            hash,
            timeouts: cfg.probe_timeouts(),
        },
        manifest_path: params.createmanifest.map(Into::into),
        manifest_queue: cfg.manifest_queue,
    };

    let board = run_check(vhost, &check_cfg).await?;

    // A fully clean manifest-creation run answers with the manifest itself;
    // anything else gets the structured report.
    if let Some(path) = &check_cfg.manifest_path {
        if board.is_clean() {
            return tokio::fs::read_to_string(path)
                .await
                .context("reading manifest back");
        }
    }

    let body = serde_json::to_string_pretty(&board.snapshot())?;
    Ok(body)
}

async fn get_local_file(UrlPath(path): UrlPath<String>) -> (StatusCode, Vec<u8>) {
    let path = format!("/{}", path);
    match tokio::fs::read(&path).await {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::BAD_REQUEST, format!("{}\n", e).into_bytes()),
    }
}

async fn put_local_file(UrlPath(path): UrlPath<String>, body: Bytes) -> (StatusCode, String) {
    let path = format!("/{}", path);
    match tokio::fs::write(&path, &body).await {
        Ok(()) => (StatusCode::OK, String::new()),
        Err(e) => (StatusCode::BAD_REQUEST, format!("{}\n", e)),
    }
}
