//! Field-level checks applied to job payloads before they reach the store.
//!
//! The database carries matching `CHECK` constraints; these checks exist so
//! callers get a precise message instead of a constraint failure.

use thiserror::Error;

use crate::types::{JobPatch, NewJob};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("companyHandle must not be empty")]
    EmptyCompanyHandle,
    #[error("salary must be zero or greater (got {0})")]
    NegativeSalary(i64),
    #[error("equity must be between 0 and 1 (got {0})")]
    EquityOutOfRange(f64),
}

impl NewJob {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        if self.company_handle.trim().is_empty() {
            return Err(ValidationError::EmptyCompanyHandle);
        }
        check_salary(self.salary)?;
        check_equity(self.equity)
    }
}

impl JobPatch {
    /// Checks the supplied fields. An empty patch passes here and is
    /// rejected when the update statement is built.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        check_salary(self.salary)?;
        check_equity(self.equity)
    }
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

fn check_salary(salary: Option<i64>) -> Result<(), ValidationError> {
    match salary {
        Some(value) if value < 0 => Err(ValidationError::NegativeSalary(value)),
        _ => Ok(()),
    }
}

fn check_equity(equity: Option<f64>) -> Result<(), ValidationError> {
    match equity {
        Some(value) if !(0.0..=1.0).contains(&value) => {
            Err(ValidationError::EquityOutOfRange(value))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> NewJob {
        NewJob {
            title: "Software Engineer".to_string(),
            salary: Some(80_000),
            equity: Some(0.05),
            company_handle: "c1".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_job() {
        assert_eq!(new_job().validate(), Ok(()));
    }

    #[test]
    fn accepts_boundary_values() {
        let job = NewJob {
            salary: Some(0),
            equity: Some(1.0),
            ..new_job()
        };
        assert_eq!(job.validate(), Ok(()));

        let job = NewJob {
            salary: None,
            equity: Some(0.0),
            ..new_job()
        };
        assert_eq!(job.validate(), Ok(()));
    }

    #[test]
    fn rejects_blank_title() {
        let job = NewJob {
            title: "   ".to_string(),
            ..new_job()
        };
        assert_eq!(job.validate(), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn rejects_blank_company_handle() {
        let job = NewJob {
            company_handle: String::new(),
            ..new_job()
        };
        assert_eq!(job.validate(), Err(ValidationError::EmptyCompanyHandle));
    }

    #[test]
    fn rejects_negative_salary() {
        let job = NewJob {
            salary: Some(-1),
            ..new_job()
        };
        assert_eq!(job.validate(), Err(ValidationError::NegativeSalary(-1)));
    }

    #[test]
    fn rejects_equity_above_one() {
        let patch = JobPatch {
            equity: Some(1.5),
            ..JobPatch::default()
        };
        assert_eq!(patch.validate(), Err(ValidationError::EquityOutOfRange(1.5)));
    }

    #[test]
    fn empty_patch_passes_field_checks() {
        assert_eq!(JobPatch::default().validate(), Ok(()));
    }

    #[test]
    fn patch_rejects_blank_title() {
        let patch = JobPatch {
            title: Some(String::new()),
            ..JobPatch::default()
        };
        assert_eq!(patch.validate(), Err(ValidationError::EmptyTitle));
    }
}
