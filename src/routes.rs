use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::renderer::FeedRenderer;
use crate::view::DigestPage;

pub struct AppState {
    pub renderer: Arc<FeedRenderer>,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub page: DigestPage,
    pub refreshing: bool,
}

#[derive(Template)]
#[template(path = "refresh_button.html")]
pub struct RefreshButtonTemplate {
    pub refreshing: bool,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/refresh", post(refresh))
        .route("/refresh/status", get(refresh_status))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let page = state.renderer.page().await;
    let refreshing = state.renderer.is_refreshing().await;

    HtmlTemplate(IndexTemplate { page, refreshing })
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let renderer = state.renderer.clone();
    tokio::spawn(async move {
        let _ = renderer.load_and_render().await;
    });

    HtmlTemplate(RefreshButtonTemplate { refreshing: true })
}

pub async fn refresh_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let refreshing = state.renderer.is_refreshing().await;
    HtmlTemplate(RefreshButtonTemplate { refreshing })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectionConfig;
    use crate::loader::{FeedLoader, FeedLocation};
    use crate::model::Section;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    async fn create_test_app(doc: Option<&str>) -> (Router, Arc<FeedRenderer>, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        if let Some(doc) = doc {
            std::fs::write(file.path(), doc).unwrap();
        }

        let loader = FeedLoader::new(
            FeedLocation::parse(file.path().to_str().unwrap()),
            Duration::from_secs(5),
        )
        .unwrap();
        let layout = vec![
            SectionConfig::new(Section::NewReleases),
            SectionConfig::new(Section::BdReleases),
            SectionConfig {
                key: Section::Tech,
                heading: Some("Cinema Tech".to_string()),
            },
        ];
        let renderer = Arc::new(FeedRenderer::new(loader, &layout));
        if doc.is_some() {
            renderer.load_and_render().await.unwrap();
        }

        let state = Arc::new(AppState {
            renderer: renderer.clone(),
        });
        (router(state), renderer, file)
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    /// Markup of the `<ul>` tagged with the given section key.
    fn section_markup<'a>(body: &'a str, key: &str) -> &'a str {
        let tag = format!("data-section=\"{}\"", key);
        let start = body.find(&tag).unwrap();
        let end = body[start..].find("</ul>").unwrap() + start;
        &body[start..end]
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let (app, _renderer, _file) = create_test_app(None).await;

            let (status, body) = get_body(app, "/health").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
        }
    }

    mod index_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_before_any_load() {
            let (app, _renderer, _file) = create_test_app(None).await;

            let (status, body) = get_body(app, "/").await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("No top stories."));
            assert_eq!(section_markup(&body, "new_releases").matches("No news.").count(), 1);
        }

        #[tokio::test]
        async fn test_index_empty_document() {
            let (app, _renderer, _file) =
                create_test_app(Some(r#"{ "top_stories": [], "new_releases": [] }"#)).await;

            let (_, body) = get_body(app, "/").await;

            assert!(body.contains("No top stories."));
            let list = section_markup(&body, "new_releases");
            assert_eq!(list.matches("<li class=\"news-item\">").count(), 1);
            assert!(list.contains("No news."));
        }

        #[tokio::test]
        async fn test_index_featured_and_secondary() {
            let (app, _renderer, _file) = create_test_app(Some(
                r#"{ "top_stories": [
                    { "title": "A", "url": "u1", "source": "S1", "date": "2024-01-01" },
                    { "title": "B", "url": "u2", "source": "S2", "date": "2024-01-02" }
                ] }"#,
            ))
            .await;

            let (_, body) = get_body(app, "/").await;

            assert!(!body.contains("No top stories."));
            let main = body.find("top-story-main\"").unwrap();
            let side = body.find("top-story-side").unwrap();
            assert!(main < side);
            assert!(body[main..side].contains(">A</a>"));
            assert!(body[side..].contains(">B</a>"));
            assert!(body.contains("— S1｜2024-01-01"));
            assert_eq!(body.matches("class=\"top-story-side\"").count(), 1);
        }

        #[tokio::test]
        async fn test_index_bd_release_date_prefix() {
            let (app, _renderer, _file) = create_test_app(Some(
                r#"{
                    "bd_releases": [
                        { "title": "X", "url": "u3", "source": "S3", "date": "2024-02-01", "release_date": "2024-03-01" }
                    ],
                    "new_releases": [
                        { "title": "Y", "url": "u4", "source": "S4", "date": "2024-02-02", "release_date": "2024-04-01" }
                    ]
                }"#,
            ))
            .await;

            let (_, body) = get_body(app, "/").await;

            let bd = section_markup(&body, "bd_releases");
            assert!(bd.contains("<p class=\"news-item-title\">2024-03-01\u{3000}<a"));

            let releases = section_markup(&body, "new_releases");
            assert!(releases.contains(">Y</a>"));
            assert!(!releases.contains("2024-04-01"));
        }

        #[tokio::test]
        async fn test_index_uses_configured_headings() {
            let (app, _renderer, _file) = create_test_app(Some("{}")).await;

            let (_, body) = get_body(app, "/").await;

            assert!(body.contains("Cinema Tech"));
            assert!(body.contains("Blu-ray &amp; DVD"));
            assert!(!body.contains("data-section=\"festivals\""));
        }

        #[tokio::test]
        async fn test_index_escapes_feed_content() {
            let (app, _renderer, _file) = create_test_app(Some(
                r#"{ "tech": [{ "title": "<script>alert(1)</script>", "url": "u", "source": "S", "date": "d" }] }"#,
            ))
            .await;

            let (_, body) = get_body(app, "/").await;

            assert!(!body.contains("<script>alert(1)</script>"));
            assert!(body.contains("&lt;script&gt;"));
        }

        #[tokio::test]
        async fn test_index_is_stable_across_renders() {
            let (app, renderer, _file) = create_test_app(Some(
                r#"{ "top_stories": [{ "title": "A", "url": "u", "source": "S", "date": "d" }] }"#,
            ))
            .await;

            let (_, first) = get_body(app.clone(), "/").await;
            renderer.load_and_render().await.unwrap();
            let (_, second) = get_body(app, "/").await;

            assert_eq!(first, second);
        }
    }

    mod refresh_tests {
        use super::*;

        #[tokio::test]
        async fn test_refresh_endpoint() {
            let (app, _renderer, _file) = create_test_app(None).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/refresh")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            let body_str = String::from_utf8(body.to_vec()).unwrap();
            assert!(body_str.contains("Refreshing"));
        }

        #[tokio::test]
        async fn test_refresh_status_endpoint() {
            let (app, _renderer, _file) = create_test_app(None).await;

            let (status, body) = get_body(app, "/refresh/status").await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("hx-post=\"/refresh\""));
        }
    }
}
