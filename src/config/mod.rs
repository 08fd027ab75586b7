//! Rule selection and rule-specific options.

pub mod loader;
pub mod rules;
pub mod schema;

pub use loader::{
    discover, load_from_path, load_from_str, resolve, ConfigError, ConfigSource, LoadedConfig,
    CONFIG_FILE_NAME,
};
pub use rules::{ChainOptions, FieldOptions, Options, RuleSet, RULES};
pub use schema::{RuleSelection, TidyConfig, ValidationError, ValidationIssue};
