//! `/jobs` handlers.
//!
//! Listing and reading are public; create, update and delete require an
//! admin bearer token.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use metrics::counter;
use serde_json::{json, Value};
use tracing::{error, info};

use jobboard_core::{JobFilter, JobPatch, NewJob, ValidationError};
use jobboard_storage::JobError;

use crate::auth::AdminUser;
use crate::problem::ProblemResponse;
use crate::router::AppState;

type JobResult<T> = Result<T, ProblemResponse>;

/// `POST /jobs` with `{ title, salary?, equity?, companyHandle }`.
pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> JobResult<(StatusCode, Json<Value>)> {
    let Json(new_job) = payload.map_err(|err| rejected_body("create", &err))?;
    new_job.validate().map_err(|err| invalid("create", err))?;

    let job = state
        .storage()
        .jobs()
        .create(&new_job)
        .await
        .map_err(|err| job_problem("create", err))?;

    info!(stage = "jobs", job_id = job.id, title = %job.title, admin = %admin.sub, "job created");
    record("create", StatusCode::CREATED);
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// `GET /jobs?title=&minSalary=&hasEquity=`.
///
/// Unknown query keys are rejected; an empty match is a `200` with an empty list.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<JobFilter>, QueryRejection>,
) -> JobResult<Json<Value>> {
    let Query(filter) = query.map_err(|err| {
        record("list", StatusCode::BAD_REQUEST);
        ProblemResponse::bad_request("invalid_query", err.body_text())
    })?;

    let jobs = state
        .storage()
        .jobs()
        .filter(&filter)
        .await
        .map_err(|err| job_problem("list", err))?;

    record("list", StatusCode::OK);
    Ok(Json(json!({ "jobs": jobs })))
}

/// `GET /jobs/:id`, returning the job with its company embedded.
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> JobResult<Json<Value>> {
    let id = job_id("get", id)?;

    let job = state
        .storage()
        .jobs()
        .get(id)
        .await
        .map_err(|err| job_problem("get", err))?;

    record("get", StatusCode::OK);
    Ok(Json(json!({ "job": job })))
}

/// `PATCH /jobs/:id` with any non-empty subset of `{ title, salary, equity }`.
pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<JobPatch>, JsonRejection>,
) -> JobResult<Json<Value>> {
    let id = job_id("update", id)?;
    let Json(patch) = payload.map_err(|err| rejected_body("update", &err))?;
    patch.validate().map_err(|err| invalid("update", err))?;

    let job = state
        .storage()
        .jobs()
        .update(id, patch)
        .await
        .map_err(|err| job_problem("update", err))?;

    info!(stage = "jobs", job_id = id, admin = %admin.sub, "job updated");
    record("update", StatusCode::OK);
    Ok(Json(json!({ "job": job })))
}

/// `DELETE /jobs/:id`.
pub async fn remove(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<i64>, PathRejection>,
) -> JobResult<Json<Value>> {
    let id = job_id("remove", id)?;

    let title = state
        .storage()
        .jobs()
        .remove(id)
        .await
        .map_err(|err| job_problem("remove", err))?;

    info!(stage = "jobs", job_id = id, %title, admin = %admin.sub, "job deleted");
    record("remove", StatusCode::OK);
    Ok(Json(json!({ "deleted": id })))
}

fn job_id(operation: &'static str, id: Result<Path<i64>, PathRejection>) -> JobResult<i64> {
    id.map(|Path(id)| id).map_err(|err| {
        record(operation, StatusCode::BAD_REQUEST);
        ProblemResponse::bad_request("invalid_id", err.body_text())
    })
}

fn rejected_body(operation: &'static str, err: &JsonRejection) -> ProblemResponse {
    record(operation, StatusCode::BAD_REQUEST);
    ProblemResponse::bad_request("invalid_body", err.body_text())
}

fn invalid(operation: &'static str, err: ValidationError) -> ProblemResponse {
    record(operation, StatusCode::BAD_REQUEST);
    ProblemResponse::bad_request("invalid_body", err.to_string())
}

fn job_problem(operation: &'static str, err: JobError) -> ProblemResponse {
    let problem = match err {
        JobError::DuplicateTitle(title) => {
            ProblemResponse::bad_request("duplicate_job", format!("Duplicate job: {title}"))
        }
        JobError::UnknownCompany(handle) => {
            ProblemResponse::bad_request("unknown_company", format!("No company: {handle}"))
        }
        JobError::EmptyUpdate => ProblemResponse::bad_request("empty_update", "No data to update"),
        JobError::NotFound(id) => {
            ProblemResponse::new(StatusCode::NOT_FOUND, "job_not_found", format!("No job: {id}"))
        }
        JobError::CompanyNotFound(handle) => ProblemResponse::new(
            StatusCode::NOT_FOUND,
            "company_not_found",
            format!("No company: {handle}"),
        ),
        err @ (JobError::Query(_) | JobError::Database(_)) => {
            error!(stage = "jobs", operation, error = %err, "job storage failure");
            ProblemResponse::internal()
        }
    };
    record(operation, problem.status());
    problem
}

fn record(operation: &'static str, status: StatusCode) {
    let result = if status.is_success() {
        "ok"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "server_error"
    };
    counter!("jobs_requests_total", "operation" => operation, "result" => result).increment(1);
}
