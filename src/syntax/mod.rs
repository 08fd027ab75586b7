//! Lossless persistent syntax tree.
//!
//! Every byte of a compilation unit lives either in a token's text or in the
//! trivia around it, so serializing a tree reproduces its source exactly.
//! Nodes are reference counted and never mutated: an edit builds a new root
//! that shares every untouched subtree with the old one.

pub mod kind;
pub mod node;
pub mod position;
pub mod rewrite;
pub mod trivia;

pub use kind::{SyntaxKind, TokenKind};
pub use node::{Descendants, NodePath, Slot, SyntaxElement, SyntaxNode, SyntaxToken, TokenIndex};
pub use position::{LineIndex, LinePosition};
pub use rewrite::{map_tokens, replace_token_text, rewrite_postorder, token_at, token_text_offsets};
pub use trivia::{Trivia, TriviaKind};
