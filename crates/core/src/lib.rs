//! Domain types shared by the storage layer and the HTTP application.
pub mod types;
pub mod validation;

pub use types::{Company, Job, JobDetail, JobFilter, JobListing, JobPatch, NewCompany, NewJob};
pub use validation::ValidationError;
