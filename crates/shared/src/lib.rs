// Public modules
pub mod arxiv;
pub mod config;
pub mod cycle;
pub mod digest;
pub mod interest;
pub mod mailer;
pub mod query;
pub mod schedule;
pub mod wizard;

// Re-export commonly used types
pub use arxiv::{ArxivClient, Paper};
pub use config::{Config, ConfigStore, Credentials};
pub use cycle::{run_query_cycle, CycleOutcome, DigestSender, PaperSource};
pub use digest::render_digest;
pub use interest::{InterestError, InterestFilter, QueryCategory};
pub use mailer::Mailer;
pub use query::build_query;
pub use schedule::{due_for_update, submission_window, SubmissionWindow, DEFAULT_LOOKBACK_DAYS};
pub use wizard::SetupAnswers;
