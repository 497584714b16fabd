pub mod reporter;
pub mod scenario;
pub mod types;

pub use reporter::CheckReporter;
pub use scenario::Scenario;
pub use types::{CheckOutcome, ScenarioSummary};
