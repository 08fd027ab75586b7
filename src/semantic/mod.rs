//! Symbol model for one compilation unit.
//!
//! [`SymbolResolver`] is the seam to whatever computes symbols; the
//! [`LexicalResolver`] shipped here binds names using only the unit itself.

pub mod model;
pub mod names;
pub mod resolver;
pub mod symbol;
pub mod types;

pub use model::SemanticModel;
pub use names::bound_names;
pub use resolver::{LexicalResolver, ResolveError, SymbolResolver};
pub use symbol::{Symbol, SymbolId, SymbolKind, TypeKind};
pub use types::{normalize_type_name, BuiltinType};
