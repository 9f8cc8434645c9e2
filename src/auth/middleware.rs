//! Authentication middleware that restores the session, extends it, and turns
//! away requests without one.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use serde_json::json;
use time::Duration;

use crate::{
    AppState,
    auth::{Session, redirect::log_in_redirect_url},
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Restore the session from the request's cookies, run the request with the
/// user ID in its extensions, then extend the session on the response.
///
/// `reject` builds the response for requests without a valid session. It is
/// given the log-in page URL that leads back to the requested page.
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    reject: impl Fn(&str) -> Response,
) -> Response {
    let redirect_url = log_in_redirect_url(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Invalid timezone {}. Rejecting request.",
            state.local_timezone
        );
        return reject(&redirect_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Rejecting request.");
            return reject(&redirect_url);
        }
    };

    let session = match Session::restore(&jar) {
        Ok(session) => session,
        Err(error) => {
            tracing::debug!("No valid session for {}: {error}", parts.uri);
            return reject(&redirect_url);
        }
    };

    parts.extensions.insert(session.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let (mut parts, body) = response.into_parts();
    let jar = match Session::extend(jar.clone(), state.cookie_duration, local_offset) {
        Ok(extended_jar) => extended_jar,
        Err(error) => {
            tracing::error!("Error extending session: {error}. Keeping the old cookie.");
            jar
        }
    };

    for (key, value) in jar.into_response().headers().iter() {
        if key == SET_COOKIE {
            parts.headers.append(key, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

/// Middleware for pages. Requests without a valid session are redirected to
/// the log-in page.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware for htmx endpoints. Requests without a valid session get a
/// HTMX redirect to the log-in page.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

/// Middleware for JSON endpoints. Requests without a valid session get a
/// 401 response with a JSON error message.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard_json(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authenticated" })),
        )
            .into_response()
    })
    .await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        extract::{Path, State},
        middleware,
        response::Html,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use axum_test::TestServer;
    use serde_json::json;
    use sha2::Digest;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{
            COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, Session, UserID,
            redirect::log_in_url_with_target,
        },
        endpoints::format_endpoint,
        timezone::get_local_offset,
    };

    use super::{AuthState, auth_guard, auth_guard_hx, auth_guard_json};

    async fn test_handler(Extension(user_id): Extension<UserID>) -> Html<String> {
        Html(format!("<h1>Hello, user {user_id}!</h1>"))
    }

    async fn stub_log_in_route(
        State(state): State<AuthState>,
        Path(user_id): Path<i64>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        let local_offset = get_local_offset(&state.local_timezone).unwrap();

        Session::new(UserID::new(user_id), state.cookie_duration, local_offset)?.start(jar)
    }

    const TEST_LOG_IN_ROUTE_PATH: &str = "/log_in/{user_id}";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_HX_ROUTE: &str = "/api/protected";
    const TEST_JSON_ROUTE: &str = "/api/protected.json";

    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let hash = sha2::Sha512::digest("nafstenoas");
        let state = AuthState {
            cookie_key: Key::from(&hash),
            cookie_duration,
            local_timezone: "Etc/UTC".to_owned(),
        };

        let pages = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));
        let hx = Router::new()
            .route(TEST_HX_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));
        let json = Router::new()
            .route(TEST_JSON_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_guard_json,
            ));

        let app = pages
            .merge(hx)
            .merge(json)
            .route(TEST_LOG_IN_ROUTE_PATH, post(stub_log_in_route))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_cookie() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server
            .post(&format_endpoint(TEST_LOG_IN_ROUTE_PATH, 3))
            .await;
        response.assert_status_ok();
        let session_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(session_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("<h1>Hello, user 3!</h1>");
    }

    #[tokio::test]
    async fn auth_guard_extends_valid_session() {
        let server = get_test_server(Duration::seconds(5));
        let response = server
            .post(&format_endpoint(TEST_LOG_IN_ROUTE_PATH, 1))
            .await;
        response.assert_status_ok();
        let jar = response.cookies();

        // The guard extends by the configured duration, so use a longer one
        // on the second server to observe the expiry moving.
        let longer_server = get_test_server(Duration::minutes(5));
        let response = longer_server.get(TEST_PROTECTED_ROUTE).add_cookies(jar).await;

        response.assert_status_ok();
        let session_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            session_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::minutes(5),
        );
        assert_eq!(session_cookie.secure(), Some(true));
        assert_eq!(session_cookie.http_only(), Some(true));
        assert_eq!(session_cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn no_cookie_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            log_in_url_with_target(TEST_PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn tampered_cookie_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            log_in_url_with_target(TEST_PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn hx_route_uses_hx_redirect() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let current_url = "/dashboard?from=2024-01-01&to=2024-01-31";

        let response = server
            .get(TEST_HX_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            log_in_url_with_target(current_url)
        );
    }

    #[tokio::test]
    async fn json_route_without_session_is_unauthorized() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(TEST_JSON_ROUTE).await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({ "message": "Not authenticated" }));
    }

    #[tokio::test]
    async fn json_route_with_session_succeeds() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let response = server
            .post(&format_endpoint(TEST_LOG_IN_ROUTE_PATH, 2))
            .await;
        let session_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_JSON_ROUTE)
            .add_cookie(session_cookie)
            .await;

        response.assert_status_ok();
    }
}
