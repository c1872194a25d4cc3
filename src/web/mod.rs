pub mod render;

use crate::auth::AuthError;
use crate::handler::BaseHandler;
use crate::observability::{health, metrics as prom_metrics};
use crate::store::{FindMode, Role, StoreError};
use axum::{
    extract::{MatchedPath, Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// HTTP front end wrapping BaseHandler
#[derive(Clone)]
pub struct WebHandler {
    handler: Arc<BaseHandler>,
}

impl WebHandler {
    pub fn new(handler: BaseHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Create the router for the login-gated pages
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/login", get(login_form).post(login))
            .route("/logout", post(logout))
            .route("/users/:user_id", get(user_page).post(user_page))
            .route("/admin", get(admin_page).post(admin_page))
            .route("/health", get(health_check))
            .route("/metrics", get(metrics))
            .route_layer(middleware::from_fn(track_http))
            .with_state(self.handler)
    }
}

#[derive(Debug)]
enum WebError {
    /// Missing session, wrong user or missing role
    Denied(AuthError),
    Internal(String),
}

impl From<AuthError> for WebError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Store(StoreError::Other(msg)) | AuthError::Internal(msg) => {
                WebError::Internal(msg)
            }
            other => WebError::Denied(other),
        }
    }
}

impl From<StoreError> for WebError {
    fn from(e: StoreError) -> Self {
        WebError::Internal(e.to_string())
    }
}

impl From<minijinja::Error> for WebError {
    fn from(e: minijinja::Error) -> Self {
        WebError::Internal(format!("render: {}", e))
    }
}

/// Error page, or plain text if the page itself fails to render
fn error_page(status: StatusCode, message: &str) -> Response {
    match render::error(message) {
        Ok(page) => (status, Html(page)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "error page failed to render");
            (status, message.to_string()).into_response()
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Denied(e) => {
                tracing::debug!(error = %e, "access denied");
                error_page(StatusCode::OK, "Access denied. Please log in.")
            }
            WebError::Internal(msg) => {
                tracing::error!("request failed: {}", msg);
                error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    userid: String,
    #[serde(default)]
    password: String,
}

/// 200 page, or the error page if the template failed
fn html(page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(body) => Html(body).into_response(),
        Err(e) => WebError::from(e).into_response(),
    }
}

/// Append a `Set-Cookie` header when one could be built
fn with_cookie(mut resp: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(value) = cookie {
        resp.headers_mut().append(header::SET_COOKIE, value);
    }
    resp
}

/// GET / - Landing page
async fn index() -> Response {
    html(render::index())
}

/// GET /login - Login form
async fn login_form() -> Response {
    html(render::login(None))
}

/// POST /login - Check credentials and open a session
async fn login(
    State(handler): State<Arc<BaseHandler>>,
    Form(form): Form<LoginForm>,
) -> Response {
    match handler.auth.login(&form.userid, &form.password).await {
        Ok((id, record)) => {
            let location = if record.has_role(Role::Admin) {
                "/admin".to_string()
            } else {
                format!("/users/{}", form.userid)
            };
            with_cookie(
                Redirect::temporary(&location).into_response(),
                handler.cookie.write(&id),
            )
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::debug!(user_id = %form.userid, "login rejected");
            html(render::login(Some("Invalid user ID or password.")))
        }
        Err(e) => {
            tracing::warn!(user_id = %form.userid, error = %e, "login failed");
            html(render::login(Some("Login failed. Please try again.")))
        }
    }
}

/// POST /logout - Delete the session and clear the cookie
async fn logout(State(handler): State<Arc<BaseHandler>>, headers: HeaderMap) -> Response {
    let page = match handler.cookie.read(&headers) {
        Some(id) => match handler.auth.logout(&id).await {
            Ok(()) => render::login(Some("You have been logged out.")),
            Err(e) => {
                tracing::debug!(error = %e, "logout without live session");
                render::login(None)
            }
        },
        None => render::login(None),
    };
    with_cookie(html(page), handler.cookie.clear())
}

/// GET|POST /users/{user_id} - The user's own page
async fn user_page(
    State(handler): State<Arc<BaseHandler>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Html<String>, WebError> {
    let session = handler.cookie.read(&headers);
    handler.auth.check_user_id(session.as_ref(), &user_id).await?;

    let record = handler
        .records
        .find_by_user_id(&user_id, FindMode::First)
        .await?
        .into_iter()
        .next()
        .ok_or(WebError::Denied(AuthError::Store(StoreError::NotFound)))?;

    Ok(Html(render::user(&record)?))
}

/// GET|POST /admin - All users, admins only
async fn admin_page(
    State(handler): State<Arc<BaseHandler>>,
    headers: HeaderMap,
) -> Result<Html<String>, WebError> {
    let session = handler.cookie.read(&headers);
    let current = handler.auth.check_role(session.as_ref(), Role::Admin).await?;

    let mut records = handler.records.find_all().await?;
    records.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

    Ok(Html(render::admin(&current, &records)?))
}

/// GET /health - Store health as JSON
async fn health_check(State(handler): State<Arc<BaseHandler>>) -> Response {
    let status = health::get_health_status(&handler.sessions, &handler.records).await;
    let code = if status.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

/// GET /metrics - Prometheus exposition
async fn metrics() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        prom_metrics::gather_metrics(),
    )
        .into_response()
}

async fn track_http(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let resp = next.run(req).await;

    let status = resp.status().as_u16().to_string();
    prom_metrics::increment_http_request(&method, &endpoint, &status);
    prom_metrics::record_http_duration(
        &method,
        &endpoint,
        &status,
        start.elapsed().as_secs_f64(),
    );
    resp
}
