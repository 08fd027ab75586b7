//! Lowering of a tree-sitter CST into the lossless [`SyntaxNode`] tree.
//!
//! Tree-sitter only records byte ranges of grammar nodes; whitespace and
//! comments live in the gaps between them. Lowering first collects the
//! leaves in source order, then distributes every gap as trivia: the part of
//! a gap up to and including the first line break trails the token before
//! it, the rest leads the token after it. An empty end-of-file token carries
//! whatever trails the last real token, so the root always serializes back to
//! the exact source.

use crate::syntax::trivia::{lex_gap, split_trivia, Piece, Trivia, TriviaKind};
use crate::syntax::{Slot, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TokenKind};
use tree_sitter::{Node, Tree};

/// Grammar nodes that become a single token even though they have children.
const ATOMIC_KINDS: &[&str] = &[
    "identifier",
    "implicit_parameter",
    "modifier",
    "predefined_type",
    "integer_literal",
    "real_literal",
    "string_literal",
    "verbatim_string_literal",
    "raw_string_literal",
    "character_literal",
    "boolean_literal",
    "null_literal",
];

struct RawToken {
    kind: TokenKind,
    start: usize,
    end: usize,
}

enum Skeleton {
    Node {
        kind: SyntaxKind,
        slots: Vec<(Option<&'static str>, Skeleton)>,
    },
    Token(usize),
}

struct Lowering<'s> {
    source: &'s str,
    tokens: Vec<RawToken>,
    cursor: usize,
}

/// Lower a parsed tree over `source` into a lossless syntax tree.
pub fn lower(tree: &Tree, source: &str) -> SyntaxNode {
    let mut lowering = Lowering {
        source,
        tokens: Vec::new(),
        cursor: 0,
    };

    let root = tree.root_node();
    let mut slots = lowering.lower_children(root, false);
    lowering.gap_tokens(source.len(), false, &mut slots);
    let eof = lowering.push_token(TokenKind::EndOfFile, source.len(), source.len());
    slots.push((None, Skeleton::Token(eof)));

    let mut tokens = lowering.finish();
    build(SyntaxKind::CompilationUnit, slots, &mut tokens)
}

impl<'s> Lowering<'s> {
    fn lower_children(
        &mut self,
        node: Node<'_>,
        in_string: bool,
    ) -> Vec<(Option<&'static str>, Skeleton)> {
        let mut slots = Vec::new();
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return slots;
        }

        loop {
            let child = cursor.node();
            let field = cursor.field_name();
            self.lower_node(child, field, in_string, &mut slots);
            if !cursor.goto_next_sibling() {
                break;
            }
        }

        slots
    }

    fn lower_node(
        &mut self,
        node: Node<'_>,
        field: Option<&'static str>,
        in_string: bool,
        slots: &mut Vec<(Option<&'static str>, Skeleton)>,
    ) {
        // Comments and single-line directives stay in the gaps and come back
        // as trivia.
        if node.kind() == "comment" || node.start_byte() == node.end_byte() {
            return;
        }
        if node.kind().starts_with("preproc_") && self.is_single_line(node) {
            return;
        }
        if node.start_byte() < self.cursor {
            return;
        }

        if node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind()) {
            self.gap_tokens(node.start_byte(), in_string, slots);
            let text = &self.source[node.start_byte()..node.end_byte()];
            let kind = TokenKind::from_grammar(node.kind(), node.is_named(), text);
            let index = self.push_token(kind, node.start_byte(), node.end_byte());
            slots.push((field, Skeleton::Token(index)));
            return;
        }

        let child_in_string = match node.kind() {
            "interpolated_string_expression" => true,
            "interpolation" => false,
            _ => in_string,
        };
        let children = self.lower_children(node, child_in_string);
        if children.is_empty() {
            return;
        }
        slots.push((
            field,
            Skeleton::Node {
                kind: SyntaxKind::from_grammar(node.kind()),
                slots: children,
            },
        ));
    }

    /// Turn text before `end` that is not trivia into tokens of its own.
    fn gap_tokens(
        &mut self,
        end: usize,
        in_string: bool,
        slots: &mut Vec<(Option<&'static str>, Skeleton)>,
    ) {
        if self.cursor >= end {
            return;
        }
        let start = self.cursor;

        if in_string {
            let index = self.push_token(TokenKind::Other, start, end);
            slots.push((None, Skeleton::Token(index)));
            return;
        }

        let gap = &self.source[start..end];
        for piece in lex_gap(gap, at_line_start(self.source, start)) {
            if let Piece::Text(range) = piece {
                let index =
                    self.push_token(TokenKind::Other, start + range.start, start + range.end);
                slots.push((None, Skeleton::Token(index)));
            }
        }
        self.cursor = end;
    }

    fn is_single_line(&self, node: Node<'_>) -> bool {
        let text = &self.source[node.start_byte()..node.end_byte()];
        !text.trim_end_matches(['\r', '\n']).contains('\n')
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, end: usize) -> usize {
        self.tokens.push(RawToken { kind, start, end });
        self.cursor = end;
        self.tokens.len() - 1
    }

    /// Attach trivia to every raw token.
    fn finish(self) -> Vec<Option<SyntaxToken>> {
        let source = self.source;
        let mut out = Vec::with_capacity(self.tokens.len());
        let first_start = self.tokens.first().map_or(source.len(), |t| t.start);
        let mut leading = split_trivia(&source[..first_start], true);

        for (idx, raw) in self.tokens.iter().enumerate() {
            let next_start = self
                .tokens
                .get(idx + 1)
                .map_or(source.len(), |next| next.start);
            let gap = split_trivia(&source[raw.end..next_start], at_line_start(source, raw.end));
            let (trailing, rest) = split_trailing(gap);
            let token_leading = std::mem::replace(&mut leading, rest);
            out.push(Some(SyntaxToken::with_trivia(
                raw.kind,
                &source[raw.start..raw.end],
                token_leading,
                trailing,
            )));
        }

        out
    }
}

/// Trailing trivia runs up to and including the first line break.
fn split_trailing(mut gap: Vec<Trivia>) -> (Vec<Trivia>, Vec<Trivia>) {
    match gap.iter().position(|t| t.kind() == TriviaKind::EndOfLine) {
        Some(eol) => {
            let rest = gap.split_off(eol + 1);
            (gap, rest)
        }
        None => (gap, Vec::new()),
    }
}

fn at_line_start(source: &str, offset: usize) -> bool {
    source[..offset]
        .rsplit('\n')
        .next()
        .is_none_or(|line| line.chars().all(|c| c == ' ' || c == '\t'))
}

fn build(
    kind: SyntaxKind,
    slots: Vec<(Option<&'static str>, Skeleton)>,
    tokens: &mut [Option<SyntaxToken>],
) -> SyntaxNode {
    let slots = slots
        .into_iter()
        .filter_map(|(field, skeleton)| {
            let element = match skeleton {
                Skeleton::Node { kind, slots } => SyntaxElement::Node(build(kind, slots, tokens)),
                Skeleton::Token(index) => SyntaxElement::Token(tokens.get_mut(index)?.take()?),
            };
            Some(Slot::new(field, element))
        })
        .collect();
    SyntaxNode::new(kind, slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::CSharpParser;

    fn lower_source(source: &str) -> SyntaxNode {
        let mut parser = CSharpParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        lower(&tree, source)
    }

    #[test]
    fn lowering_is_lossless() {
        let source = "// header\nusing System;\n\nclass C\n{\n    /* counter */ int x = 1; // trailing\n\n    void M() { x++; }\n}\n\n";
        assert_eq!(lower_source(source).text(), source);
    }

    #[test]
    fn line_break_trails_the_previous_token() {
        let root = lower_source("class C\n{\n    int x;\n}\n");
        let tokens = root.tokens();
        let open = tokens.iter().find(|t| t.text() == "{").unwrap();
        assert_eq!(open.trailing_trivia(), &[Trivia::end_of_line("\n")]);
        let int = tokens.iter().find(|t| t.text() == "int").unwrap();
        assert_eq!(int.leading_trivia(), &[Trivia::whitespace("    ")]);
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind(), TokenKind::EndOfFile);
        assert!(eof.text().is_empty());
    }

    #[test]
    fn grammar_fields_survive_lowering() {
        let root = lower_source("class Widget { }");
        let class = root
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ClassDeclaration)
            .unwrap();
        assert_eq!(
            class.field("name").map(SyntaxElement::trimmed_text),
            Some("Widget".to_string())
        );
    }

    #[test]
    fn literals_and_modifiers_are_single_tokens() {
        let root = lower_source("class C { private static string s = \"a b\"; }");
        let tokens = root.tokens();
        assert!(tokens
            .iter()
            .any(|t| t.kind() == TokenKind::StringLiteral && t.text() == "\"a b\""));
        assert!(tokens
            .iter()
            .any(|t| t.kind() == TokenKind::Modifier && t.text() == "static"));
    }

    #[test]
    fn empty_source_is_a_lone_end_of_file_token() {
        let root = lower_source("");
        assert_eq!(root.token_count(), 1);
        assert_eq!(root.text(), "");
    }
}
