use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::assets::AssetLoader;

/// Serve the embedded tool page
pub async fn handle_index() -> Response {
    match AssetLoader::web_asset("index.html") {
        Some(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.data).into_response(),
        None => {
            tracing::error!("Embedded index.html is missing");
            (StatusCode::NOT_FOUND, "index page not available").into_response()
        }
    }
}
