pub mod job;
pub mod response;

pub use job::{CandidateJob, EmploymentType, ExperienceLevel, JobStatus, SalaryPeriod};
pub use response::{
    LocalScrapeSummary, ModelScrapeSummary, NotificationSummary, PublishSummary, RunReport,
    SourceReport,
};
