//! FinQuest HTTP API: row-scoped CRUD over SQLite, achievements, the change
//! feed and the LLM advisors.

pub mod error;
pub mod feed;
pub mod routes;
pub mod storage;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post, put},
};
use finquest_advisor::LlmClient;
use finquest_runtime_config::{LlmProvider, ServerConfig};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use error::ApiErr;
use feed::ChangeFeed;
use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub advisor: Advisor,
    pub feed: ChangeFeed,
}

/// Request-time settings derived from [`ServerConfig`].
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            jwt_secret: config.auth.jwt_secret.clone(),
        }
    }
}

/// The LLM gateway client, absent when no API key is configured.
#[derive(Clone, Default)]
pub struct Advisor {
    client: Option<Arc<LlmClient>>,
}

impl Advisor {
    pub fn new(client: Option<LlmClient>) -> Self {
        Self {
            client: client.map(Arc::new),
        }
    }

    pub fn provider(&self) -> Option<LlmProvider> {
        self.client.as_ref().map(|c| c.provider())
    }

    pub fn client(&self) -> Result<Arc<LlmClient>, ApiErr> {
        self.client
            .clone()
            .ok_or_else(|| ApiErr::service_unavailable("AI advisor is not configured"))
    }
}

impl AppState {
    pub fn new(db: Db, config: &ServerConfig, advisor: Advisor) -> Self {
        Self {
            db,
            config: AppConfig::from(config),
            advisor,
            feed: ChangeFeed::new(),
        }
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Advisor {
    fn from_ref(state: &AppState) -> Self {
        state.advisor.clone()
    }
}

impl FromRef<AppState> for ChangeFeed {
    fn from_ref(state: &AppState) -> Self {
        state.feed.clone()
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Meta
        .route("/health", get(routes::health::health))
        .route("/capabilities", get(routes::capabilities::capabilities))
        .route("/auth/me", get(routes::auth::me))
        // Profile
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        // Expenses
        .route(
            "/expenses",
            get(routes::expenses::list_expenses).post(routes::expenses::create_expense),
        )
        .route(
            "/expenses/{id}",
            put(routes::expenses::update_expense).delete(routes::expenses::delete_expense),
        )
        // Goals
        .route(
            "/goals",
            get(routes::goals::list_goals).post(routes::goals::create_goal),
        )
        .route(
            "/goals/{id}",
            put(routes::goals::update_goal).delete(routes::goals::delete_goal),
        )
        // Bills
        .route(
            "/bills",
            get(routes::bills::list_bills).post(routes::bills::create_bill),
        )
        .route("/bills/upcoming", get(routes::bills::upcoming_bills))
        .route(
            "/bills/{id}",
            put(routes::bills::update_bill).delete(routes::bills::delete_bill),
        )
        .route("/bills/{id}/pay", post(routes::bills::pay_bill))
        // Assets & liabilities
        .route(
            "/assets",
            get(routes::assets::list_assets).post(routes::assets::create_asset),
        )
        .route(
            "/assets/{id}",
            put(routes::assets::update_asset).delete(routes::assets::delete_asset),
        )
        .route(
            "/liabilities",
            get(routes::liabilities::list_liabilities).post(routes::liabilities::create_liability),
        )
        .route(
            "/liabilities/{id}",
            put(routes::liabilities::update_liability)
                .delete(routes::liabilities::delete_liability),
        )
        // Categories
        .route(
            "/categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/categories/{id}",
            put(routes::categories::update_category).delete(routes::categories::delete_category),
        )
        // Gamification & dashboard
        .route("/achievements", get(routes::achievements::list_achievements))
        .route(
            "/achievements/evaluate",
            post(routes::achievements::evaluate),
        )
        .route("/stats", get(routes::achievements::stats))
        .route("/summary", get(routes::summary::summary))
        // Realtime
        .route("/changes", get(routes::changes::list_changes))
        // Advisors
        .route("/advisor/budget", post(routes::advisor::budget))
        .route("/advisor/tax", post(routes::advisor::tax))
        .route("/advisor/retirement", post(routes::advisor::retirement))
        .route("/advisor/debt", post(routes::advisor::debt))
        .route("/advisor/net-worth", post(routes::advisor::net_worth))
        .route(
            "/advisor/income-forecast",
            post(routes::advisor::income_forecast),
        )
        .route("/advisor/chat", post(routes::advisor::chat));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
