/// Application state and router builder.
///
/// The state wires the Postgres-backed stores into the three core
/// components (session manager, authorization guard, lifecycle
/// coordinator). Identity is established by a router-level middleware;
/// project-scoped role checks happen inside the handlers, so every
/// privileged operation runs the same pipeline: access token first, role
/// second, business logic last.

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskcamp_shared::auth::authorization::AuthorizationGuard;
use taskcamp_shared::auth::session::SessionManager;
use taskcamp_shared::lifecycle::LifecycleCoordinator;
use taskcamp_shared::mail::{HttpApiMailer, LogMailer, Mailer};
use taskcamp_shared::models::user::UserProfile;
use taskcamp_shared::store::postgres::{
    PgCredentialStore, PgMembershipStore, PgSessionStore, PgWorkspaceStore,
};
use taskcamp_shared::store::{
    CredentialStore, MembershipStore, SessionStore, WorkspaceStore,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// The authenticated caller, injected into request extensions by the
/// access-token middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

/// Shared application state, cloned per request via the `State` extractor
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionManager>,
    pub guard: Arc<AuthorizationGuard>,
    pub lifecycle: Arc<LifecycleCoordinator>,
}

impl AppState {
    /// Builds the state, wiring Postgres stores into the core components.
    pub fn new(db: PgPool, config: Config) -> Self {
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(PgCredentialStore::new(db.clone()));
        let session_store: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(db.clone()));
        let memberships: Arc<dyn MembershipStore> =
            Arc::new(PgMembershipStore::new(db.clone()));
        let workspace: Arc<dyn WorkspaceStore> = Arc::new(PgWorkspaceStore::new(db.clone()));

        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(mail) => Arc::new(HttpApiMailer::new(
                mail.api_url.clone(),
                mail.api_token.clone(),
                mail.sender.clone(),
            )),
            None => Arc::new(LogMailer),
        };

        let sessions = Arc::new(SessionManager::new(
            credentials,
            session_store,
            mailer,
            config.token_settings(),
        ));
        let guard = Arc::new(AuthorizationGuard::new(Arc::clone(&memberships)));
        let lifecycle = Arc::new(LifecycleCoordinator::new(workspace, memberships));

        Self {
            db,
            config: Arc::new(config),
            sessions,
            guard,
            lifecycle,
        }
    }
}

/// Builds the complete router.
///
/// ```text
/// /
/// ├── /health                          # liveness (public)
/// └── /api/v1/
///     ├── /auth/                       # register/login/refresh/... (public)
///     │   └── me, logout, change-password (authenticated)
///     ├── /projects/...                # projects, members (authenticated)
///     ├── /tasks/..., /subtasks/...    # tasks and subtasks (authenticated)
///     └── /notes/...                   # project notes (authenticated)
/// ```
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth endpoints reachable without a session
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/verify-email/:token", get(routes::auth::verify_email))
        .route(
            "/resend-verification",
            post(routes::auth::resend_verification),
        )
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route(
            "/reset-password/:token",
            post(routes::auth::reset_password),
        );

    // Auth endpoints that need an authenticated caller
    let private_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/logout", post(routes::auth::logout))
        .route("/change-password", post(routes::auth::change_password))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            access_token_layer,
        ));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:project_id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:project_id/members",
            get(routes::projects::list_members).post(routes::projects::add_member),
        )
        .route(
            "/:project_id/members/:user_id",
            put(routes::projects::update_member_role).delete(routes::projects::remove_member),
        )
        .route(
            "/:project_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:project_id/notes",
            get(routes::notes::list_notes).post(routes::notes::create_note),
        );

    let task_routes = Router::new()
        .route(
            "/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:task_id/subtasks",
            get(routes::tasks::list_subtasks).post(routes::tasks::create_subtask),
        );

    let subtask_routes = Router::new().route(
        "/:subtask_id",
        put(routes::tasks::update_subtask).delete(routes::tasks::delete_subtask),
    );

    let note_routes = Router::new().route(
        "/:note_id",
        get(routes::notes::get_note)
            .put(routes::notes::update_note)
            .delete(routes::notes::delete_note),
    );

    // Everything project-scoped requires identity first; role checks
    // follow inside each handler.
    let workspace_routes = Router::new()
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/subtasks", subtask_routes)
        .nest("/notes", note_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            access_token_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(private_auth_routes))
        .merge(workspace_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Access-token middleware.
///
/// Resolves the Bearer token into the caller's profile and injects it as
/// [`CurrentUser`]; every project-scoped role check downstream starts from
/// that identity.
async fn access_token_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("expected Bearer token".to_string()))?;

    let profile = state.sessions.authenticate(token).await?;

    req.extensions_mut().insert(CurrentUser(profile));

    Ok(next.run(req).await)
}
