//! HTTP front desk for typq checks (made by FontLab https://www.fontlab.com/)
//!
//! `POST /check` runs a profile over paths on the server's disk and answers
//! with the full report. `GET /profiles` lists what can be asked for.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task;
use typq_core::config::{load_catalog, profile_paths_from_env};
use typq_core::profile::ProfileCatalog;
use typq_core::raster::{OutlineRasterizer, Rasterizer};
use typq_core::registry::CheckRegistry;
use typq_core::report::Report;
use typq_core::runner::{RunOptions, Runner, Targets};
use typq_core::status::Severity;

use crate::{prepare_run, DEFAULT_PROFILE};

/// A check run requested over HTTP.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckRequest {
    /// Font files, METADATA.json files or directories on the server
    pub paths: Vec<PathBuf>,
    /// Profile name; `universal` when absent
    pub profile: Option<String>,
    /// Regexes selecting check ids
    pub checkid: Vec<String>,
    /// Regexes removing check ids
    pub exclude_checkid: Vec<String>,
    pub jobs: Option<usize>,
    /// Run without a rasterizer backend
    pub no_rasterizer: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub verdict: Option<Severity>,
    pub summary: BTreeMap<Severity, usize>,
    pub report: Report,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub name: String,
    pub checks: usize,
    /// Why the profile could not be composed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bind `bind` and serve until the process is stopped.
pub async fn serve(bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding HTTP server to {bind}"))?;

    axum::serve(listener, router())
        .await
        .context("serving HTTP")?;
    Ok(())
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/profiles", get(profiles_handler))
        .route("/check", post(check_handler))
}

async fn profiles_handler() -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = task::spawn_blocking(list_profiles)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("task join error: {e}"),
            )
        })?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    Ok(Json(entries))
}

fn list_profiles() -> Result<Vec<ProfileEntry>> {
    let catalog = load_catalog(&profile_paths_from_env()?)?;
    let registry = CheckRegistry::builtin()?;
    Ok(profile_entries(&catalog, &registry))
}

fn profile_entries(catalog: &ProfileCatalog, registry: &CheckRegistry) -> Vec<ProfileEntry> {
    catalog
        .names()
        .map(|name| match catalog.compose(name, registry) {
            Ok(composed) => ProfileEntry {
                name: name.to_string(),
                checks: composed.len(),
                error: None,
            },
            Err(err) => ProfileEntry {
                name: name.to_string(),
                checks: 0,
                error: Some(err.to_string()),
            },
        })
        .collect()
}

async fn check_handler(
    Json(req): Json<CheckRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.paths.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "at least one path is required".to_string(),
        ));
    }

    if matches!(req.jobs, Some(0)) {
        return Err((
            StatusCode::BAD_REQUEST,
            "jobs must be at least 1 when provided".to_string(),
        ));
    }

    let profile = req
        .profile
        .clone()
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
    let files = profile_paths_from_env().map_err(to_bad_request)?;
    let (registry, composed, filter) =
        prepare_run(&profile, &files, &req.checkid, &req.exclude_checkid)
            .map_err(to_bad_request)?;

    let report = task::spawn_blocking(move || {
        let targets = Targets::load(&req.paths, req.jobs)?;
        let rasterizer: Option<Arc<dyn Rasterizer>> = if req.no_rasterizer {
            None
        } else {
            Some(Arc::new(OutlineRasterizer::default()))
        };
        Runner::new(&registry, &composed)
            .with_options(RunOptions {
                jobs: req.jobs,
                filter,
                rasterizer,
            })
            .run(&targets)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("task join error: {e}"),
        )
    })?
    .map_err(to_bad_request)?;

    Ok(Json(CheckResponse {
        verdict: report.verdict(),
        summary: report.summary(),
        report,
    }))
}

fn to_bad_request(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}
