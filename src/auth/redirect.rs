//! Works out where to send a user after they log in.
//!
//! Only same-origin paths are accepted as redirect targets, and the log-in
//! page itself is never a target.

use axum::{extract::Request, http::Uri};
use tracing::{error, warn};

use crate::endpoints;

/// Return the path and query of `raw_url` if it is a safe place to redirect to.
///
/// Absolute URLs, protocol relative URLs (`//evil.example`) and links back to
/// the log-in page are rejected.
pub fn safe_redirect_target(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();

    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return None;
    }

    if uri.path() == endpoints::LOG_IN_VIEW {
        return None;
    }

    Some(path_and_query.to_owned())
}

/// The log-in page URL with `target` attached as the `redirect_url` query parameter.
pub fn log_in_url_with_target(target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", target)]) {
        Ok(query) => format!("{}?{}", endpoints::LOG_IN_VIEW, query),
        Err(error) => {
            error!("Could not encode redirect URL {target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

/// The log-in page URL that brings the user back to where `request` was headed.
///
/// API requests made by htmx are sent back to the page that made the request
/// (the `HX-Current-URL` header). Anything without a usable target falls back
/// to the dashboard.
pub fn log_in_redirect_url(request: &Request) -> String {
    let target = if request.uri().path().starts_with("/api") {
        target_from_hx_current_url(request)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| safe_redirect_target(path_and_query.as_str()))
    };

    let target = target.unwrap_or_else(|| {
        warn!(
            "No usable redirect target for {}, falling back to the dashboard.",
            request.uri()
        );
        endpoints::DASHBOARD_VIEW.to_owned()
    });

    log_in_url_with_target(&target)
}

fn target_from_hx_current_url(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        return None;
    }

    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;

    // HX-Current-URL is a full URL, only the path and query are kept.
    let path_and_query = current_url
        .parse::<Uri>()
        .ok()?
        .path_and_query()?
        .as_str()
        .to_owned();

    safe_redirect_target(&path_and_query)
}
