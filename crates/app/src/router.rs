use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use jobboard_storage::Database;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::AdminTokenValidator;
use crate::{jobs, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    admin_tokens: AdminTokenValidator,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database, admin_token_secret: &[u8]) -> Self {
        Self {
            metrics,
            storage,
            admin_tokens: AdminTokenValidator::new(admin_token_secret),
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn admin_tokens(&self) -> &AdminTokenValidator {
        &self.admin_tokens
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route(
            "/jobs/:id",
            get(jobs::get).patch(jobs::update).delete(jobs::remove),
        )
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::TimeZone;
    use jobboard_core::NewCompany;

    use super::*;
    use crate::auth::mint_token;

    pub const ADMIN_SECRET: &[u8] = b"router-test-secret";

    pub fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn admin_token() -> String {
        mint_token(ADMIN_SECRET, "admin", true, (fixed_now().timestamp() + 3600) as u64)
    }

    pub fn user_token() -> String {
        mint_token(ADMIN_SECRET, "user", false, (fixed_now().timestamp() + 3600) as u64)
    }

    pub async fn setup_state() -> AppState {
        let metrics = telemetry::init_metrics().expect("metrics init");

        let database = Database::connect("sqlite::memory:").await.expect("connect");
        database.run_migrations().await.expect("migrations");
        for handle in ["c1", "c2"] {
            database
                .companies()
                .insert(&NewCompany {
                    handle: handle.to_string(),
                    name: format!("Company {handle}"),
                    description: format!("Desc {handle}"),
                    num_employees: Some(5),
                    logo_url: None,
                })
                .await
                .expect("insert company");
        }

        AppState::new(metrics, database, ADMIN_SECRET).with_clock(Arc::new(fixed_now))
    }
}
