//! tidy-csharp: trivia-preserving cleanup of C# sources
//!
//! Sources are parsed with tree-sitter and lowered into a lossless, immutable
//! syntax tree. An ordered registry of rewrite passes runs over that tree;
//! each pass either rewrites it or, in report-only mode, lists what it would
//! change.
//!
//! # Architecture
//!
//! - [`syntax`]: the lossless tree and its rewrite helpers
//! - [`ts`]: tree-sitter frontend and syntax validation
//! - [`semantic`]: symbol model behind the [`SymbolResolver`] seam
//! - [`passes`]: the rewrite rules
//! - [`rename`]: collision- and capture-checked renaming
//! - [`pipeline`]: runs enabled passes, keeping the symbol model fresh
//! - [`host`]: parallel file driver with atomic, encoding-preserving writes
//!
//! # Safety
//!
//! - Rewrites that would introduce syntax errors are discarded
//! - Atomic file writes (tempfile + fsync + rename)
//! - Files changed on disk since they were read are never overwritten
//! - Workspace boundary enforcement
//!
//! # Example
//!
//! ```no_run
//! use tidy_csharp::{parse_unit, LexicalResolver, Mode, Options, Pipeline, RuleSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = parse_unit("class C { int count = 0; }")?;
//! let pipeline = Pipeline::new(&LexicalResolver, Options::with_rules(RuleSet::defaults()));
//! let outcome = pipeline.run(&root, Mode::Apply)?;
//! assert_eq!(outcome.root.text(), "class C { int count; }");
//! # Ok(())
//! # }
//! ```
//!
//! # Debugging
//!
//! Set `RUST_LOG=tidy_csharp=debug` and call [`init_tracing`] to see each
//! pass, its finding count and every symbol model derivation.

pub mod config;
pub mod host;
pub mod passes;
pub mod persist;
pub mod pipeline;
pub mod pool;
pub mod rename;
pub mod report;
pub mod safety;
pub mod semantic;
pub mod syntax;
pub mod ts;

use std::sync::Once;

// Re-exports
pub use config::{
    load_from_path, load_from_str, ConfigError, ConfigSource, LoadedConfig, Options, RuleSet,
    TidyConfig,
};
pub use host::{collect_sources, FileOutcome, FileReport, HostContext, HostError};
pub use persist::{PersistError, SourceFile, TextEncoding, WriteSink};
pub use pipeline::{Mode, Pipeline, PipelineError, PipelineOutcome};
pub use rename::{RenameEngine, RenameError};
pub use report::{Finding, Report};
pub use safety::{SafetyError, WorkspaceGuard};
pub use semantic::{LexicalResolver, SemanticModel, SymbolResolver};
pub use syntax::SyntaxNode;
pub use ts::{parse_unit, TreeSitterError};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`. Does nothing when
/// the variable is unset.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
