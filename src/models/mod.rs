pub mod job;
pub mod loaders;
pub mod outcome;
pub mod report_state;
pub mod snapshot;
pub mod target;
pub mod violation;

pub use job::{progress_percent, JobId, JobRecord, JobStatus, JobStatusView};
pub use loaders::{FileTargetLoader, StaticTargetLoader, TargetLoader};
pub use outcome::{FailureReason, OutcomeStatus, ReportOutcome};
pub use report_state::ReportState;
pub use snapshot::{Post, ProfileInfo, ProfileSnapshot};
pub use target::Target;
pub use violation::{select_actionable, ReportCategory, ViolationCandidate};
