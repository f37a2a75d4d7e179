use serde::{Deserialize, Serialize};

/// A job posting as persisted in the `jobs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub salary: Option<i64>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// Company record referenced by jobs. Jobs never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i64>,
    pub logo_url: Option<String>,
}

/// Payload used to seed a company row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i64>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// A job together with the full record of its owning company.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: i64,
    pub title: String,
    pub salary: Option<i64>,
    pub equity: Option<f64>,
    pub company_handle: String,
    pub company: Company,
}

impl JobDetail {
    pub fn new(job: Job, company: Company) -> Self {
        Self {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company_handle: job.company_handle,
            company,
        }
    }
}

/// Row returned by filtered listings.
///
/// `company_name` is `None` when the referenced company row is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: i64,
    pub title: String,
    pub salary: Option<i64>,
    pub equity: Option<f64>,
    pub company_handle: String,
    pub company_name: Option<String>,
}

/// Request body for creating a job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i64>,
    #[serde(default)]
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// Sparse set of job fields to change.
///
/// The company handle is not part of the patch; it is fixed at creation.
/// A JSON `null` is treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub salary: Option<i64>,
    #[serde(default)]
    pub equity: Option<f64>,
}

impl JobPatch {
    /// Returns `true` when no field would be changed.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.salary.is_none() && self.equity.is_none()
    }
}

/// Optional criteria narrowing a job listing.
///
/// `has_equity` only filters when it is `Some(true)`; `Some(false)` behaves
/// like an absent criterion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub min_salary: Option<i64>,
    #[serde(default)]
    pub has_equity: Option<bool>,
}

impl JobFilter {
    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    pub fn min_salary(mut self, value: i64) -> Self {
        self.min_salary = Some(value);
        self
    }

    pub fn has_equity(mut self, value: bool) -> Self {
        self.has_equity = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_serializes_with_camel_case_keys() {
        let job = Job {
            id: 7,
            title: "Software Engineer".to_string(),
            salary: Some(80_000),
            equity: Some(0.05),
            company_handle: "c1".to_string(),
        };

        let value = serde_json::to_value(&job).expect("serialize job");
        assert_eq!(
            value,
            json!({
                "id": 7,
                "title": "Software Engineer",
                "salary": 80000,
                "equity": 0.05,
                "companyHandle": "c1"
            })
        );
    }

    #[test]
    fn new_job_rejects_unknown_fields() {
        let err = serde_json::from_value::<NewJob>(json!({
            "title": "Data Analyst",
            "companyHandle": "c2",
            "bonus": 10
        }))
        .expect_err("unknown field should fail");
        assert!(err.to_string().contains("bonus"));
    }

    #[test]
    fn new_job_defaults_optional_numbers() {
        let job: NewJob = serde_json::from_value(json!({
            "title": "Data Analyst",
            "companyHandle": "c2"
        }))
        .expect("minimal body parses");
        assert_eq!(job.salary, None);
        assert_eq!(job.equity, None);
    }

    #[test]
    fn patch_rejects_company_handle() {
        let result = serde_json::from_value::<JobPatch>(json!({ "companyHandle": "c9" }));
        assert!(result.is_err());
    }

    #[test]
    fn patch_with_only_nulls_is_empty() {
        let patch: JobPatch =
            serde_json::from_value(json!({ "salary": null })).expect("null parses");
        assert!(patch.is_empty());
    }

    #[test]
    fn filter_builder_sets_fields() {
        let filter = JobFilter::default()
            .title("eng")
            .min_salary(0)
            .has_equity(true);
        assert_eq!(filter.title.as_deref(), Some("eng"));
        assert_eq!(filter.min_salary, Some(0));
        assert_eq!(filter.has_equity, Some(true));
    }
}
