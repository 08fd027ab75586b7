//! Tree-sitter frontend for C# sources.
//!
//! The tree-sitter CST is only an intermediate: [`parse_unit`] lowers it into
//! the lossless [`SyntaxNode`](crate::syntax::SyntaxNode) tree that every
//! pass works on.

pub mod errors;
pub mod lower;
pub mod parser;
pub mod validator;

pub use errors::TreeSitterError;
pub use lower::lower;
pub use parser::{CSharpParser, ErrorNode, ParsedSource};
pub use validator::{validate_rewrite, validate_syntax};

use crate::pool::with_parser;
use crate::syntax::SyntaxNode;

/// Parse a compilation unit, rejecting sources with syntax errors.
pub fn parse_unit(source: &str) -> Result<SyntaxNode, TreeSitterError> {
    with_parser(|parser| {
        let parsed = parser.parse_with_source(source)?;
        validator::check_errors(source, &parsed.error_nodes())?;
        Ok(lower(&parsed.tree, source))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unit_round_trips() {
        let source = "namespace N\n{\n    #region Fields\n    class C { int x; }\n    #endregion\n}\n";
        let unit = parse_unit(source).unwrap();
        assert_eq!(unit.text(), source);
    }

    #[test]
    fn parse_unit_rejects_broken_code() {
        let err = parse_unit("class C { void M( { }").unwrap_err();
        assert!(matches!(
            err,
            TreeSitterError::SyntaxError { .. } | TreeSitterError::MultipleSyntaxErrors { .. }
        ));
    }
}
