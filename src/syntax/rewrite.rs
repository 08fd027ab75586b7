//! Generic folds over the persistent tree.
//!
//! Every fold hands its callback the byte offset the node has in the *input*
//! tree, so positions reported while rewriting always refer to the text the
//! pass was given. Subtrees that come back unchanged are shared, not copied.

use crate::syntax::node::{Slot, SyntaxElement, SyntaxNode, SyntaxToken, TokenIndex};
use std::collections::BTreeMap;

/// Post-order rewrite: children are rewritten first, then `f` receives the
/// node with its rewritten children.
pub fn rewrite_postorder<F>(root: &SyntaxNode, f: &mut F) -> SyntaxNode
where
    F: FnMut(SyntaxNode, usize) -> SyntaxNode,
{
    postorder(root, 0, f)
}

fn postorder<F>(node: &SyntaxNode, offset: usize, f: &mut F) -> SyntaxNode
where
    F: FnMut(SyntaxNode, usize) -> SyntaxNode,
{
    let rebuilt = rebuild_children(node, offset, |child, child_offset| {
        postorder(child, child_offset, f)
    });
    f(rebuilt, offset)
}

fn rebuild_children<F>(node: &SyntaxNode, offset: usize, mut f: F) -> SyntaxNode
where
    F: FnMut(&SyntaxNode, usize) -> SyntaxNode,
{
    let mut changed = false;
    let mut slots = Vec::with_capacity(node.slots().len());
    let mut child_offset = offset;

    for slot in node.slots() {
        let element = match slot.element() {
            SyntaxElement::Node(child) => {
                let new_child = f(child, child_offset);
                changed |= !new_child.ptr_eq(child);
                SyntaxElement::Node(new_child)
            }
            SyntaxElement::Token(token) => SyntaxElement::Token(token.clone()),
        };
        child_offset += slot.element().full_len();
        slots.push(slot.with_element(element));
    }

    if changed {
        node.with_slots(slots)
    } else {
        node.clone()
    }
}

/// Byte offset of every token's text (after its leading trivia), indexed by
/// [`TokenIndex`].
pub fn token_text_offsets(root: &SyntaxNode) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(root.token_count() as usize);
    let mut offset = 0;
    for token in root.tokens() {
        offsets.push(offset + token.leading_len());
        offset += token.full_len();
    }
    offsets
}

/// Replace the text of the tokens at the given indices, keeping their trivia.
///
/// Subtrees holding none of the indices are shared with the input.
pub fn replace_token_text(root: &SyntaxNode, texts: &BTreeMap<TokenIndex, String>) -> SyntaxNode {
    if texts.is_empty() {
        return root.clone();
    }
    retext(root, TokenIndex(0), texts)
}

fn retext(node: &SyntaxNode, first: TokenIndex, texts: &BTreeMap<TokenIndex, String>) -> SyntaxNode {
    let end = TokenIndex(first.0 + node.token_count());
    if texts.range(first..end).next().is_none() {
        return node.clone();
    }

    let mut index = first;
    let slots: Vec<Slot> = node
        .slots()
        .iter()
        .map(|slot| {
            let element = match slot.element() {
                SyntaxElement::Node(child) => SyntaxElement::Node(retext(child, index, texts)),
                SyntaxElement::Token(token) => match texts.get(&index) {
                    Some(text) => SyntaxElement::Token(token.with_text(text.clone())),
                    None => SyntaxElement::Token(token.clone()),
                },
            };
            index = TokenIndex(index.0 + slot.element().token_count());
            slot.with_element(element)
        })
        .collect();

    node.with_slots(slots)
}

/// Replace tokens one by one. `f` receives each token with the byte offset
/// of its leading trivia and returns a replacement, or `None` to keep it.
pub fn map_tokens<F>(root: &SyntaxNode, f: &mut F) -> SyntaxNode
where
    F: FnMut(&SyntaxToken, usize) -> Option<SyntaxToken>,
{
    map_node_tokens(root, 0, f)
}

fn map_node_tokens<F>(node: &SyntaxNode, offset: usize, f: &mut F) -> SyntaxNode
where
    F: FnMut(&SyntaxToken, usize) -> Option<SyntaxToken>,
{
    let mut changed = false;
    let mut child_offset = offset;
    let slots: Vec<Slot> = node
        .slots()
        .iter()
        .map(|slot| {
            let element = match slot.element() {
                SyntaxElement::Node(child) => {
                    let new_child = map_node_tokens(child, child_offset, f);
                    changed |= !new_child.ptr_eq(child);
                    SyntaxElement::Node(new_child)
                }
                SyntaxElement::Token(token) => match f(token, child_offset) {
                    Some(replacement) => {
                        changed = true;
                        SyntaxElement::Token(replacement)
                    }
                    None => SyntaxElement::Token(token.clone()),
                },
            };
            child_offset += slot.element().full_len();
            slot.with_element(element)
        })
        .collect();

    if changed {
        node.with_slots(slots)
    } else {
        node.clone()
    }
}

/// Token at a pre-order index.
pub fn token_at(root: &SyntaxNode, index: TokenIndex) -> Option<SyntaxToken> {
    let mut node = root.clone();
    let mut first = 0u32;
    loop {
        let mut next = None;
        for child in node.children() {
            let count = child.token_count();
            if index.0 < first + count {
                match child {
                    SyntaxElement::Token(token) => return Some(token.clone()),
                    SyntaxElement::Node(child_node) => {
                        next = Some(child_node.clone());
                        break;
                    }
                }
            }
            first += count;
        }
        node = next?;
    }
}
