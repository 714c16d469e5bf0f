//! Static asset serving and per-extension response headers

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use std::convert::Infallible;
use tower::service_fn;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::SiteMode;
use crate::constants::{DEV_CSS_CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL};
use crate::state::StaticRoots;

/// Headers a static response gets, keyed on the request path's extension
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssetHeaders {
    pub content_type: Option<&'static str>,
    pub cache_control: Option<&'static str>,
}

pub fn asset_headers(mode: SiteMode, path: &str) -> AssetHeaders {
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let immutable = Some(IMMUTABLE_CACHE_CONTROL);
    match (mode, ext.as_str()) {
        (_, "svg") => AssetHeaders {
            content_type: Some("image/svg+xml"),
            cache_control: immutable,
        },
        (_, "woff" | "woff2") => AssetHeaders {
            content_type: None,
            cache_control: immutable,
        },
        (SiteMode::Production, "css" | "js") => AssetHeaders {
            content_type: None,
            cache_control: immutable,
        },
        (SiteMode::Development, "css") => AssetHeaders {
            content_type: Some("text/css"),
            cache_control: Some(DEV_CSS_CACHE_CONTROL),
        },
        (SiteMode::Development, "js" | "jsx") => AssetHeaders {
            content_type: Some("application/javascript"),
            cache_control: None,
        },
        (SiteMode::Development, "ts" | "tsx") => AssetHeaders {
            content_type: Some("application/typescript"),
            cache_control: None,
        },
        (SiteMode::Development, "json") => AssetHeaders {
            content_type: Some("application/json"),
            cache_control: None,
        },
        _ => AssetHeaders::default(),
    }
}

/// Middleware applying [`asset_headers`] to successful non-HTML responses.
///
/// HTML is skipped so the SPA fallback for a missing `.js` path is never
/// cached as immutable. Headers a handler already set are kept.
pub async fn apply_asset_headers(
    State(mode): State<SiteMode>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    if !response.status().is_success() {
        return response;
    }
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if is_html {
        return response;
    }

    let wanted = asset_headers(mode, &path);
    let headers = response.headers_mut();
    if let Some(ct) = wanted.content_type {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
    }
    if let Some(cc) = wanted.cache_control {
        if !headers.contains_key(header::CACHE_CONTROL) {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cc));
        }
    }
    response
}

/// Attach the static file fallback for `mode` to a router
pub fn with_static_fallback<S>(router: Router<S>, mode: SiteMode, roots: &StaticRoots) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    match mode {
        SiteMode::Production => {
            // `/` resolves to index.html; unknown paths fall back to it for
            // client-side routing
            let index = roots.dist_dir.join("index.html");
            router.fallback_service(ServeDir::new(&roots.dist_dir).fallback(ServeFile::new(index)))
        }
        SiteMode::Development => {
            let not_found = service_fn(|_req: Request| async {
                Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
            });
            let sources = ServeDir::new(&roots.source_dir).not_found_service(not_found);
            router.fallback_service(ServeDir::new(&roots.public_dir).fallback(sources))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_headers() {
        let h = asset_headers(SiteMode::Production, "/bundle.a1b2c3.js");
        assert_eq!(h.cache_control, Some(IMMUTABLE_CACHE_CONTROL));
        assert_eq!(h.content_type, None);

        let h = asset_headers(SiteMode::Production, "/logo.SVG");
        assert_eq!(h.content_type, Some("image/svg+xml"));

        let h = asset_headers(SiteMode::Production, "/fonts/Inter.woff2");
        assert_eq!(h.cache_control, Some(IMMUTABLE_CACHE_CONTROL));

        assert_eq!(
            asset_headers(SiteMode::Production, "/index.html"),
            AssetHeaders::default()
        );
        assert_eq!(
            asset_headers(SiteMode::Production, "/src/main.tsx"),
            AssetHeaders::default()
        );
    }

    #[test]
    fn test_development_headers() {
        let h = asset_headers(SiteMode::Development, "/styles.css");
        assert_eq!(h.content_type, Some("text/css"));
        assert_eq!(h.cache_control, Some(DEV_CSS_CACHE_CONTROL));

        let h = asset_headers(SiteMode::Development, "/src/main.tsx");
        assert_eq!(h.content_type, Some("application/typescript"));
        assert_eq!(h.cache_control, None);

        let h = asset_headers(SiteMode::Development, "/bundle.js");
        assert_eq!(h.content_type, Some("application/javascript"));
        assert_eq!(h.cache_control, None);
    }

    #[test]
    fn test_extension_only_from_last_segment() {
        assert_eq!(
            asset_headers(SiteMode::Production, "/v1.2/readme"),
            AssetHeaders::default()
        );
        assert_eq!(
            asset_headers(SiteMode::Production, "/avatar/35661279"),
            AssetHeaders::default()
        );
    }
}
