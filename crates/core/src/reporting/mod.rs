//! Asynchronous report jobs

pub mod chunked;
pub mod decode;
pub mod error;
pub mod job;
pub mod runner;
pub mod service;

pub use chunked::ChunkedTransformer;
pub use decode::{decode_report_body, RowNormalizer};
pub use error::{JobErrorKind, JobPhase, ReportJobError};
pub use job::{JobStatus, PollDecision, RemoteState, ReportJob};
pub use runner::{DownloadedReport, PollOptions, ReportJobRunner};
pub use service::{ReportData, ReportOutcome, ReportService, ReportServiceOptions};
