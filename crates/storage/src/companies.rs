use sqlx::SqlitePool;
use thiserror::Error;

use jobboard_core::{Company, NewCompany};

use crate::{constraint_violation, ConstraintViolation};

/// Repository for the `companies` table.
///
/// Jobs only read companies; `insert` exists to seed the store.
#[derive(Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a company, failing when the handle or name is already taken.
    pub async fn insert(&self, company: &NewCompany) -> Result<Company, CompanyError> {
        sqlx::query_as::<_, CompanyRow>(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING handle, name, description, num_employees, logo_url",
        )
        .bind(&company.handle)
        .bind(&company.name)
        .bind(&company.description)
        .bind(company.num_employees)
        .bind(&company.logo_url)
        .fetch_one(&self.pool)
        .await
        .map(CompanyRow::into_domain)
        .map_err(|err| match constraint_violation(&err) {
            Some(ConstraintViolation::Unique) => CompanyError::Duplicate(company.handle.clone()),
            _ => CompanyError::Database(err),
        })
    }

    /// Loads a single company by handle.
    pub async fn fetch(&self, handle: &str) -> Result<Company, CompanyError> {
        self.find(handle)
            .await?
            .ok_or_else(|| CompanyError::NotFound(handle.to_string()))
    }

    pub(crate) async fn find(&self, handle: &str) -> Result<Option<Company>, sqlx::Error> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT handle, name, description, num_employees, logo_url \
             FROM companies WHERE handle = ?1",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CompanyRow::into_domain))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    handle: String,
    name: String,
    description: String,
    num_employees: Option<i64>,
    logo_url: Option<String>,
}

impl CompanyRow {
    fn into_domain(self) -> Company {
        Company {
            handle: self.handle,
            name: self.name,
            description: self.description,
            num_employees: self.num_employees,
            logo_url: self.logo_url,
        }
    }
}

/// Errors that can occur while reading or seeding companies.
#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("duplicate company: {0}")]
    Duplicate(String),
    #[error("no company: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    #[tokio::test]
    async fn fetch_returns_seeded_company() {
        let db = setup_db().await;
        let company = db.companies().fetch("c1").await.expect("fetch company");
        assert_eq!(company.name, "Company One");
        assert_eq!(company.num_employees, Some(10));
        assert_eq!(company.logo_url.as_deref(), Some("http://c1.img"));
    }

    #[tokio::test]
    async fn fetch_errors_for_missing_company() {
        let db = setup_db().await;
        let err = db.companies().fetch("nope").await.unwrap_err();
        assert!(matches!(err, CompanyError::NotFound(handle) if handle == "nope"));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_handle() {
        let db = setup_db().await;
        let err = db
            .companies()
            .insert(&NewCompany {
                handle: "c1".to_string(),
                name: "Another Name".to_string(),
                description: String::new(),
                num_employees: None,
                logo_url: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CompanyError::Duplicate(handle) if handle == "c1"));
    }
}
