use sqlx::{Sqlite, SqlitePool};
use thiserror::Error;
use tracing::debug;

use jobboard_core::{Job, JobDetail, JobFilter, JobListing, JobPatch, NewJob};

use crate::companies::CompanyRepository;
use crate::query::{contains_pattern, PartialUpdate, QueryError, SqlValue, WhereClause};
use crate::{constraint_violation, ConstraintViolation};

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

/// Patch field names mapped to their `jobs` columns. `title_search` holds
/// the lowercased title and always changes together with `title`.
const PATCHABLE_COLUMNS: &[(&str, &str)] = &[
    ("title", "title"),
    ("title_search", "title_search"),
    ("salary", "salary"),
    ("equity", "equity"),
];

/// Repository for job postings.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a job and returns it with its assigned id.
    ///
    /// Title uniqueness and the company reference are enforced by the
    /// table constraints, so concurrent creates cannot both succeed.
    pub async fn create(&self, job: &NewJob) -> Result<Job, JobError> {
        let row = sqlx::query_as::<_, JobRow>(
            "INSERT INTO jobs (title, title_search, salary, equity, company_handle) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id, title, salary, equity, company_handle",
        )
        .bind(&job.title)
        .bind(job.title.to_lowercase())
        .bind(job.salary)
        .bind(job.equity)
        .bind(&job.company_handle)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::Unique) => JobError::DuplicateTitle(job.title.clone()),
            Some(ConstraintViolation::ForeignKey) => {
                JobError::UnknownCompany(job.company_handle.clone())
            }
            None => JobError::Database(err),
        })?;

        Ok(row.into_domain())
    }

    /// Lists every job ordered by title.
    pub async fn find_all(&self) -> Result<Vec<Job>, JobError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(JobRow::into_domain).collect())
    }

    /// Loads a job together with its company.
    ///
    /// A job whose company row has disappeared is reported as
    /// [`JobError::CompanyNotFound`].
    pub async fn get(&self, id: i64) -> Result<JobDetail, JobError> {
        let job = self.fetch(id).await?;

        let company = CompanyRepository::new(self.pool.clone())
            .find(&job.company_handle)
            .await?
            .ok_or_else(|| JobError::CompanyNotFound(job.company_handle.clone()))?;

        Ok(JobDetail::new(job, company))
    }

    async fn fetch(&self, id: i64) -> Result<Job, JobError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(JobError::NotFound(id))?;

        Ok(row.into_domain())
    }

    /// Applies the fields present in `patch` and returns the updated job.
    pub async fn update(&self, id: i64, patch: JobPatch) -> Result<Job, JobError> {
        let new_title = patch.title.clone();
        let mut update = PartialUpdate::build(patch_fields(patch), PATCHABLE_COLUMNS)?;
        let key = update.bind_key(id);
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = {key} RETURNING {JOB_COLUMNS}",
            update.set_clause()
        );

        let row = sqlx::query_as_with::<Sqlite, JobRow, _>(&sql, update.into_arguments())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| match (constraint_violation(&err), new_title) {
                (Some(ConstraintViolation::Unique), Some(title)) => JobError::DuplicateTitle(title),
                _ => JobError::Database(err),
            })?
            .ok_or(JobError::NotFound(id))?;

        Ok(row.into_domain())
    }

    /// Deletes a job and returns its title.
    pub async fn remove(&self, id: i64) -> Result<String, JobError> {
        let title: Option<(String,)> =
            sqlx::query_as("DELETE FROM jobs WHERE id = ?1 RETURNING title")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        title.map(|(title,)| title).ok_or(JobError::NotFound(id))
    }

    /// Lists jobs matching `filter`, joined with their company name.
    pub async fn filter(&self, filter: &JobFilter) -> Result<Vec<JobListing>, JobError> {
        let clause = filter_clause(filter);
        let sql = format!(
            "SELECT j.id, j.title, j.salary, j.equity, j.company_handle, \
                    c.name AS company_name \
               FROM jobs AS j \
               LEFT JOIN companies AS c ON c.handle = j.company_handle{} \
              ORDER BY j.title",
            clause.to_sql()
        );
        debug!(stage = "storage", %sql, params = clause.values().len(), "filtering jobs");

        let rows = sqlx::query_as_with::<Sqlite, JobListingRow, _>(&sql, clause.into_arguments())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(JobListingRow::into_domain).collect())
    }
}

fn patch_fields(patch: JobPatch) -> Vec<(&'static str, SqlValue)> {
    let mut fields = Vec::with_capacity(4);
    if let Some(title) = patch.title {
        fields.push(("title_search", SqlValue::from(title.to_lowercase())));
        fields.push(("title", SqlValue::from(title)));
    }
    if let Some(salary) = patch.salary {
        fields.push(("salary", SqlValue::from(salary)));
    }
    if let Some(equity) = patch.equity {
        fields.push(("equity", SqlValue::from(equity)));
    }
    fields
}

/// Builds the listing predicate. An empty title is ignored, a zero
/// `min_salary` is a real bound, and only `has_equity == Some(true)` filters.
///
/// SQLite `LIKE` only folds ASCII case, so titles are matched against the
/// stored lowercase copy using a lowercased needle.
fn filter_clause(filter: &JobFilter) -> WhereClause {
    let mut clause = WhereClause::new();

    if let Some(title) = filter.title.as_deref().filter(|title| !title.is_empty()) {
        clause.and_bound(contains_pattern(&title.to_lowercase()), |slot| {
            format!("j.title_search LIKE {slot} ESCAPE '\\'")
        });
    }
    if let Some(min_salary) = filter.min_salary {
        clause.and_bound(min_salary, |slot| format!("j.salary >= {slot}"));
    }
    if filter.has_equity == Some(true) {
        clause.and_raw("j.equity > 0");
    }

    clause
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: i64,
    title: String,
    salary: Option<i64>,
    equity: Option<f64>,
    company_handle: String,
}

impl JobRow {
    fn into_domain(self) -> Job {
        Job {
            id: self.id,
            title: self.title,
            salary: self.salary,
            equity: self.equity,
            company_handle: self.company_handle,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JobListingRow {
    id: i64,
    title: String,
    salary: Option<i64>,
    equity: Option<f64>,
    company_handle: String,
    company_name: Option<String>,
}

impl JobListingRow {
    fn into_domain(self) -> JobListing {
        JobListing {
            id: self.id,
            title: self.title,
            salary: self.salary,
            equity: self.equity,
            company_handle: self.company_handle,
            company_name: self.company_name,
        }
    }
}

/// Errors that can occur while reading or mutating jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("duplicate job: {0}")]
    DuplicateTitle(String),
    #[error("no job: {0}")]
    NotFound(i64),
    #[error("no company: {0}")]
    CompanyNotFound(String),
    #[error("company does not exist: {0}")]
    UnknownCompany(String),
    #[error("no data to update")]
    EmptyUpdate,
    #[error("invalid update statement: {0}")]
    Query(QueryError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<QueryError> for JobError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::EmptyUpdate => Self::EmptyUpdate,
            other => Self::Query(other),
        }
    }
}
