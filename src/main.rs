use std::env;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::redirect::Policy;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

mod anilist;
mod animetosho;
mod error;
mod releases;
#[cfg(test)]
mod testing;
mod view;

use anilist::{AniList, MetadataError, media_id_from_url};
use animetosho::AnimeTosho;
use error::Error;
use view::{RankedRelease, ReleaseList};

#[derive(Clone)]
struct AppState {
    anilist: AniList,
    feed: AnimeTosho,
}

struct Config {
    bind_addr: String,
    anilist_api: String,
    feed_base: String,
}

impl Config {
    fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000"),
            anilist_api: env_or("ANILIST_API", anilist::API_BASE),
            feed_base: env_or("ANIMETOSHO_FEED", animetosho::FEED_BASE),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct ReleaseQuery {
    /// AniList media id
    id: Option<i64>,
    /// AniList page URL, used when `id` is missing
    url: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tosho",
        version = "0.1.0",
        license(
            name = "MIT",
            identifier = "MIT"
        )
    ),
    paths(list_releases, healthcheck),
    components(schemas(ReleaseList, RankedRelease)),
    tags(
        (name = "tosho", description = "Ranked release lookup")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let config = Config::from_env();
    let http = reqwest::Client::builder()
        .redirect(Policy::limited(10))
        .build()
        .unwrap();
    let state = AppState {
        anilist: AniList::with_api_base(http.clone(), config.anilist_api),
        feed: AnimeTosho::with_feed_base(http, config.feed_base),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

fn app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/healthcheck", get(healthcheck).head(healthcheck))
        .route("/releases", get(list_releases))
        .layer(from_fn(request_logging_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[utoipa::path(
    get,
    path = "/releases",
    params(ReleaseQuery),
    responses(
        (status = 200, description = "Ranked, deduplicated releases", body = ReleaseList),
        (status = 400, description = "Missing or invalid id"),
        (status = 404, description = "Anime not found"),
        (status = 502, description = "Upstream error")
    ),
    tag = "tosho"
)]
async fn list_releases(
    State(state): State<AppState>,
    Query(params): Query<ReleaseQuery>,
) -> Result<Json<ReleaseList>, (StatusCode, String)> {
    let id = params
        .id
        .or_else(|| params.url.as_deref().and_then(media_id_from_url))
        .ok_or((
            StatusCode::BAD_REQUEST,
            "an anilist id or url is required".to_string(),
        ))?;

    let list = lookup_releases(&state, id).await.map_err(|err| {
        tracing::warn!(id, error = %err, "release lookup failed");
        (error_status(&err), err.to_string())
    })?;

    Ok(Json(list))
}

#[utoipa::path(
    get,
    path = "/healthcheck",
    responses(
        (status = 200, description = "OK")
    ),
    tag = "tosho"
)]
async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

async fn lookup_releases(state: &AppState, id: i64) -> Result<ReleaseList, Error> {
    let media = state.anilist.get_media_title(id).await?;
    let releases = releases::aggregate(&state.feed, &media).await?;
    Ok(ReleaseList {
        title: media.display().to_string(),
        releases: releases.iter().map(RankedRelease::from).collect(),
    })
}

fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::Metadata(MetadataError::Validation(_)) => StatusCode::BAD_REQUEST,
        Error::Metadata(MetadataError::NotFound(_)) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

async fn request_logging_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path();
    if path == "/healthcheck" {
        return next.run(req).await;
    }

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis(),
        "request"
    );
    response
}
