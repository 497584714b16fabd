pub mod config;
pub mod date;
pub mod generator;
pub mod resolver;
pub mod store;
pub mod types;

pub use config::ConfigLoader;
pub use date::{Clock, FixedClock, SystemClock};
pub use resolver::{DIRECTIVE_ORDER, Directive};
pub use store::{VariableStore, normalize_key};
pub use types::{Environment, Settings, VariableConfig};
