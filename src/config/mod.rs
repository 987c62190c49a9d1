//! Configuration loading and validation
//!
//! Configuration is TOML with kebab-case keys; design-value timings default
//! so a minimal file only names the catalog, selectors, schedule,
//! notification target, and database path.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    CatalogConfig, Config, FetchConfig, NotifyConfig, OutputConfig, ScheduleConfig, SelectorConfig,
};
pub use validation::validate;
