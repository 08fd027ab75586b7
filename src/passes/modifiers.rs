use crate::passes::{PassContext, PassError, PassOutput};
use crate::report::Finding;
use crate::syntax::{Slot, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TokenKind, Trivia};

const RULE: &str = "remove-private-nested-modifier";

pub fn run(ctx: &PassContext<'_>) -> Result<PassOutput, PassError> {
    let mut findings = Vec::new();
    let root = strip(ctx.root, 0, false, ctx, &mut findings);
    Ok(ctx.output(root, findings))
}

fn strip(
    node: &SyntaxNode,
    offset: usize,
    in_type: bool,
    ctx: &PassContext<'_>,
    findings: &mut Vec<Finding>,
) -> SyntaxNode {
    let is_type = node.kind().is_type_declaration();
    let redundant = if in_type && is_nested_kind(node.kind()) {
        redundant_private(node)
    } else {
        None
    };
    if let Some(idx) = redundant {
        let token = modifier_token(&node.slots()[idx]);
        let at = node.slot_offset(offset, idx) + token.map_or(0, SyntaxToken::leading_len);
        findings.push(ctx.finding(
            RULE,
            node.kind(),
            at,
            "private nested type: 'private' can be removed",
        ));
    }

    let mut changed = false;
    let mut slots = Vec::with_capacity(node.slots().len());

    for (idx, slot) in node.slots().iter().enumerate() {
        match slot.element() {
            SyntaxElement::Node(child) => {
                let child_offset = node.slot_offset(offset, idx);
                let new_child = strip(child, child_offset, in_type || is_type, ctx, findings);
                changed |= !new_child.ptr_eq(child);
                slots.push(slot.with_element(new_child));
            }
            SyntaxElement::Token(_) => slots.push(slot.clone()),
        }
    }

    if let Some(idx) = redundant {
        remove_slot(&mut slots, idx);
        changed = true;
    }

    if changed {
        node.with_slots(slots)
    } else {
        node.clone()
    }
}

fn is_nested_kind(kind: SyntaxKind) -> bool {
    kind.is_type_declaration() && kind != SyntaxKind::DelegateDeclaration
}

/// Slot of a `private` modifier that is the type's only access modifier.
/// `private protected` is a different accessibility and is kept.
fn redundant_private(node: &SyntaxNode) -> Option<usize> {
    let mut private = None;
    for (idx, slot) in node.slots().iter().enumerate() {
        match modifier_token(slot).map(SyntaxToken::text) {
            Some("private") => private = Some(idx),
            Some("protected" | "internal" | "public") => return None,
            _ => {}
        }
    }
    private
}

pub(super) fn modifier_token(slot: &Slot) -> Option<&SyntaxToken> {
    let token = match slot.element() {
        SyntaxElement::Token(token) => token,
        SyntaxElement::Node(node) if node.token_count() == 1 => node.first_token()?,
        SyntaxElement::Node(_) => return None,
    };
    (token.kind() == TokenKind::Modifier).then_some(token)
}

/// Drop a slot, moving its leading trivia onto whatever follows.
fn remove_slot(slots: &mut Vec<Slot>, idx: usize) {
    let removed = slots.remove(idx);
    let leading: Vec<Trivia> = removed
        .element()
        .first_token()
        .map_or_else(Vec::new, |t| t.leading_trivia().to_vec());
    if leading.is_empty() {
        return;
    }
    if let Some(next) = slots.get(idx) {
        let mut merged = leading;
        if let Some(first) = next.element().first_token() {
            merged.extend_from_slice(first.leading_trivia());
        }
        let element = next.element().with_leading_trivia(merged);
        slots[idx] = next.with_element(element);
    }
}
