//! axum integration for the middleware adapter
//!
//! [`compact_assets`] runs a [`CompactMiddleware`] for each request and stores the resulting
//! [`CompactedAssets`] in the request extensions, where handlers pick them up with
//! `Extension<CompactedAssets>`. A failed compaction short-circuits the request with the
//! error's status code.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use axum::{routing::get, Extension, Router};
//! # use compact_core::{middleware::{CompactMiddleware, CompactedAssets}, service::compact_assets};
//! # fn example(middleware: CompactMiddleware) -> Router {
//! async fn page(Extension(assets): Extension<CompactedAssets>) -> String {
//!     assets.js_html()
//! }
//!
//! Router::new().route("/", get(page)).layer(axum::middleware::from_fn_with_state(
//!     Arc::new(middleware),
//!     compact_assets,
//! ))
//! # }
//! ```

use crate::middleware::{CompactMiddleware, CompactedAssets};
use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use std::{path::Path, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub async fn compact_assets(
    State(middleware): State<Arc<CompactMiddleware>>,
    mut request: Request,
    next: Next,
) -> Response {
    match middleware.run().await {
        Ok(assets) => {
            request.extensions_mut().insert(assets);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!("[compact_assets] {} {}: {}", request.method(), request.uri(), e);
            (e.status_code(), e.to_string()).into_response()
        }
    }
}

/// Minimal page embedding the compacted assets of the current request.
pub async fn index_page(Extension(assets): Extension<CompactedAssets>) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n{}\n</head>\n<body></body>\n</html>\n",
        assets.js_html()
    ))
}

/// Router serving `destination` under the compactor's web path and an index page at `/`.
pub fn dev_router(middleware: CompactMiddleware, destination: &Path) -> Router {
    let web_path = middleware.compact().web_path().trim_end_matches('/').to_string();
    let middleware = Arc::new(middleware);

    let pages = Router::new()
        .route("/", get(index_page))
        .layer(from_fn_with_state(middleware, compact_assets));

    let router = if web_path.is_empty() {
        pages.fallback_service(ServeDir::new(destination))
    } else {
        let mount = if web_path.starts_with('/') {
            web_path
        } else {
            format!("/{web_path}")
        };
        pages.nest_service(&mount, ServeDir::new(destination))
    };
    router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
