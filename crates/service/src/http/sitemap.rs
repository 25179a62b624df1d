//! Sitemap consumers: the human-facing page and the row feed the
//! search-index builder reads. Both come from the same builder and the same
//! exclusion policy; neither filters on its own.

use askama::Template;
use axum::extract::State;
use axum::Json;

use common::sitemap::{self, SitemapRow};

use crate::ServiceState;

#[derive(Template)]
#[template(path = "sitemap.html")]
pub struct SitemapTemplate {
    pub rows: Vec<SitemapRow>,
}

pub async fn page(State(state): State<ServiceState>) -> askama_axum::Response {
    use askama_axum::IntoResponse;
    let snapshot = state.snapshot();
    let template = SitemapTemplate {
        rows: sitemap::build(&snapshot, state.aliases()),
    };
    template.into_response()
}

pub async fn rows(State(state): State<ServiceState>) -> Json<Vec<SitemapRow>> {
    let snapshot = state.snapshot();
    Json(sitemap::build(&snapshot, state.aliases()))
}
