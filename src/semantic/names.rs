//! Which identifiers a node binds.
//!
//! Shared by the resolver, which turns the names into symbols, and by rename
//! validation, which only needs the set of names bound anywhere in a body.

use crate::semantic::symbol::SymbolKind;
use crate::syntax::{
    Slot, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TokenIndex, TokenKind,
};
use std::collections::HashSet;

/// What kind of name a binding node introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binder {
    Symbol(SymbolKind),
    /// `new { Name = value }`: binds a member of an anonymous type, not a
    /// symbol of the unit.
    AnonymousMember,
}

/// The binder of nodes that introduce names local to a body.
pub(crate) fn binder(kind: SyntaxKind) -> Option<Binder> {
    let binder = match kind {
        SyntaxKind::VariableDeclarator
        | SyntaxKind::CatchDeclaration
        | SyntaxKind::ForEachStatement
        | SyntaxKind::DeclarationExpression
        | SyntaxKind::DeclarationPattern
        | SyntaxKind::VarPattern => Binder::Symbol(SymbolKind::Local),
        SyntaxKind::Parameter | SyntaxKind::LambdaExpression => {
            Binder::Symbol(SymbolKind::Parameter)
        }
        SyntaxKind::TypeParameter => Binder::Symbol(SymbolKind::TypeParameter),
        SyntaxKind::FromClause
        | SyntaxKind::LetClause
        | SyntaxKind::JoinClause
        | SyntaxKind::JoinIntoClause
        | SyntaxKind::QueryContinuation => Binder::Symbol(SymbolKind::RangeVariable),
        SyntaxKind::LabeledStatement => Binder::Symbol(SymbolKind::Label),
        SyntaxKind::LocalFunctionStatement => Binder::Symbol(SymbolKind::Method),
        SyntaxKind::AnonymousObjectCreationExpression
        | SyntaxKind::AnonymousObjectMemberDeclarator
        | SyntaxKind::NameEquals => Binder::AnonymousMember,
        _ => return None,
    };
    Some(binder)
}

/// Identifier tokens `node` binds itself (not through child binding nodes),
/// with their token index given the index of the node's first token.
pub(crate) fn declared_names(node: &SyntaxNode, first: TokenIndex) -> Vec<(TokenIndex, SyntaxToken)> {
    let mut out = Vec::new();
    match node.kind() {
        SyntaxKind::VariableDeclarator => {
            if !push_field(node, first, "name", &mut out) && !node.slots().is_empty() {
                push_slot_identifiers(node, first, 0, &mut out);
            }
        }
        SyntaxKind::Parameter
        | SyntaxKind::CatchDeclaration
        | SyntaxKind::LocalFunctionStatement
        | SyntaxKind::DeclarationExpression => {
            push_field(node, first, "name", &mut out);
        }
        SyntaxKind::TypeParameter => {
            if !push_field(node, first, "name", &mut out) {
                if let Some(slot) = last_identifier_slot(node, |_| true) {
                    push_slot_identifiers(node, first, slot, &mut out);
                }
            }
        }
        SyntaxKind::ForEachStatement => {
            // Without a declared type the left side is an assignable
            // expression, not a new variable.
            if node.field("type").is_some() {
                push_field(node, first, "left", &mut out);
            }
        }
        SyntaxKind::FromClause | SyntaxKind::JoinClause => {
            if !push_field(node, first, "name", &mut out) {
                if let Some(slot) = identifier_before_keyword(node, "in") {
                    push_slot_identifiers(node, first, slot, &mut out);
                }
            }
        }
        SyntaxKind::LetClause
        | SyntaxKind::JoinIntoClause
        | SyntaxKind::QueryContinuation
        | SyntaxKind::LabeledStatement
        | SyntaxKind::NameEquals => {
            if !push_field(node, first, "name", &mut out) && !push_field(node, first, "label", &mut out)
            {
                if let Some(slot) = first_identifier_slot(node) {
                    push_slot_identifiers(node, first, slot, &mut out);
                }
            }
        }
        SyntaxKind::DeclarationPattern => {
            if !push_field(node, first, "name", &mut out) {
                let slot = last_identifier_slot(node, |slot| slot.field() != Some("type"));
                if let Some(slot) = slot.filter(|&s| s + 1 == node.slots().len()) {
                    push_slot_identifiers(node, first, slot, &mut out);
                }
            }
        }
        SyntaxKind::VarPattern => {
            for slot in 0..node.slots().len() {
                push_slot_identifiers(node, first, slot, &mut out);
            }
        }
        SyntaxKind::LambdaExpression => match node.field_index("parameters") {
            Some(slot) => {
                if let SyntaxElement::Token(token) = node.slots()[slot].element() {
                    if token.is_identifier() {
                        out.push((node.slot_token_start(first, slot), token.clone()));
                    }
                }
            }
            None => {
                let arrow = node
                    .slots()
                    .iter()
                    .position(|s| s.element().as_token().is_some_and(|t| t.is_punct("=>")));
                if let Some(arrow) = arrow {
                    let slot = node.slots()[..arrow]
                        .iter()
                        .rposition(|s| s.element().as_token().is_some_and(SyntaxToken::is_identifier));
                    if let Some(slot) = slot {
                        push_slot_identifiers(node, first, slot, &mut out);
                    }
                }
            }
        },
        SyntaxKind::AnonymousObjectCreationExpression | SyntaxKind::AnonymousObjectMemberDeclarator => {
            let slots = node.slots();
            for (slot, window) in slots.windows(2).enumerate() {
                let is_name = window[0]
                    .element()
                    .as_token()
                    .is_some_and(SyntaxToken::is_identifier);
                let then_equals = window[1]
                    .element()
                    .as_token()
                    .is_some_and(|t| t.is_punct("="));
                if is_name && then_equals {
                    push_slot_identifiers(node, first, slot, &mut out);
                }
            }
        }
        _ => {}
    }
    out
}

/// Every name bound anywhere inside `node`: local declarators, parameters,
/// type parameters, catch variables, query range variables, foreach
/// variables, labels, anonymous object members, local functions and pattern
/// designations.
pub fn bound_names(node: &SyntaxNode) -> HashSet<String> {
    let mut names = HashSet::new();
    collect_bound_names(node, TokenIndex(0), &mut names);
    names
}

fn collect_bound_names(node: &SyntaxNode, first: TokenIndex, names: &mut HashSet<String>) {
    if binder(node.kind()).is_some() {
        names.extend(
            declared_names(node, first)
                .into_iter()
                .map(|(_, token)| token.text().to_string()),
        );
    }
    for (slot, element) in node.children().enumerate() {
        if let SyntaxElement::Node(child) = element {
            collect_bound_names(child, node.slot_token_start(first, slot), names);
        }
    }
}

fn push_field(
    node: &SyntaxNode,
    first: TokenIndex,
    field: &str,
    out: &mut Vec<(TokenIndex, SyntaxToken)>,
) -> bool {
    match node.field_index(field) {
        Some(slot) => {
            push_slot_identifiers(node, first, slot, out);
            true
        }
        None => false,
    }
}

/// Identifier tokens of one slot; a designation node contributes all of its
/// identifiers (`var (a, b)`).
fn push_slot_identifiers(
    node: &SyntaxNode,
    first: TokenIndex,
    slot: usize,
    out: &mut Vec<(TokenIndex, SyntaxToken)>,
) {
    let start = node.slot_token_start(first, slot);
    match node.slots()[slot].element() {
        SyntaxElement::Token(token) if token.is_identifier() => out.push((start, token.clone())),
        SyntaxElement::Token(_) => {}
        SyntaxElement::Node(child) => {
            for (offset, token) in child.tokens().into_iter().enumerate() {
                if token.kind() == TokenKind::Identifier {
                    out.push((TokenIndex(start.0 + offset as u32), token));
                }
            }
        }
    }
}

fn first_identifier_slot(node: &SyntaxNode) -> Option<usize> {
    node.slots()
        .iter()
        .position(|s| s.element().as_token().is_some_and(SyntaxToken::is_identifier))
}

fn last_identifier_slot(node: &SyntaxNode, keep: impl Fn(&Slot) -> bool) -> Option<usize> {
    node.slots().iter().rposition(|s| {
        keep(s) && s.element().as_token().is_some_and(SyntaxToken::is_identifier)
    })
}

fn identifier_before_keyword(node: &SyntaxNode, keyword: &str) -> Option<usize> {
    let at = node
        .slots()
        .iter()
        .position(|s| s.element().as_token().is_some_and(|t| t.is_keyword(keyword)))?;
    node.slots()[..at]
        .iter()
        .rposition(|s| s.element().as_token().is_some_and(SyntaxToken::is_identifier))
}
