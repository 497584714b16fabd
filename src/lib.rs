pub mod assertion;
pub mod error;
pub mod logger;
pub mod runner;
pub mod variable;
pub mod xml;

// Re-export commonly used types
pub use assertion::{evaluate_xpath_variable, validate_json_response, validate_xml_response};
pub use error::{Result, RucheckError};
pub use runner::Scenario;
pub use variable::VariableStore;
