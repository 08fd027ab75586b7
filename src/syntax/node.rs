use crate::syntax::kind::{SyntaxKind, TokenKind};
use crate::syntax::trivia::{trivia_len, Trivia};
use std::fmt;
use std::sync::Arc;

/// Pre-order ordinal of a token within one tree.
///
/// Renames replace token text only, so indices stay valid across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenIndex(pub u32);

/// Child-slot indices leading from a root to one of its nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<u32>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, slot: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(slot as u32);
        Self(steps)
    }

    pub fn steps(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Whether `self` lies inside the subtree rooted at `ancestor`.
    pub fn starts_with(&self, ancestor: &NodePath) -> bool {
        self.0.starts_with(&ancestor.0)
    }
}

/// A leaf: text plus the trivia that surrounds it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SyntaxToken(Arc<TokenData>);

#[derive(PartialEq, Eq, Hash)]
struct TokenData {
    kind: TokenKind,
    text: String,
    leading: Vec<Trivia>,
    trailing: Vec<Trivia>,
}

impl SyntaxToken {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self::with_trivia(kind, text, Vec::new(), Vec::new())
    }

    pub fn with_trivia(
        kind: TokenKind,
        text: impl Into<String>,
        leading: Vec<Trivia>,
        trailing: Vec<Trivia>,
    ) -> Self {
        Self(Arc::new(TokenData {
            kind,
            text: text.into(),
            leading,
            trailing,
        }))
    }

    /// A punctuation token without trivia.
    pub fn punct(text: &str) -> Self {
        Self::new(TokenKind::Punctuation, text)
    }

    pub fn kind(&self) -> TokenKind {
        self.0.kind
    }

    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.0.leading
    }

    pub fn trailing_trivia(&self) -> &[Trivia] {
        &self.0.trailing
    }

    pub fn leading_len(&self) -> usize {
        trivia_len(&self.0.leading)
    }

    pub fn full_len(&self) -> usize {
        self.leading_len() + self.0.text.len() + trivia_len(&self.0.trailing)
    }

    pub fn is_identifier(&self) -> bool {
        self.0.kind == TokenKind::Identifier
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.0.kind == TokenKind::Punctuation && self.0.text == text
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        matches!(self.0.kind, TokenKind::Keyword | TokenKind::Modifier) && self.0.text == text
    }

    pub fn has_comments(&self) -> bool {
        self.trivia().any(|t| t.kind().is_comment())
    }

    pub fn has_structured_trivia(&self) -> bool {
        self.trivia().any(|t| t.kind().is_structured())
    }

    fn trivia(&self) -> impl Iterator<Item = &Trivia> {
        self.0.leading.iter().chain(self.0.trailing.iter())
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self::with_trivia(
            self.0.kind,
            text,
            self.0.leading.clone(),
            self.0.trailing.clone(),
        )
    }

    pub fn with_leading_trivia(&self, leading: Vec<Trivia>) -> Self {
        Self::with_trivia(
            self.0.kind,
            self.0.text.clone(),
            leading,
            self.0.trailing.clone(),
        )
    }

    pub fn with_trailing_trivia(&self, trailing: Vec<Trivia>) -> Self {
        Self::with_trivia(
            self.0.kind,
            self.0.text.clone(),
            self.0.leading.clone(),
            trailing,
        )
    }

    pub fn ptr_eq(&self, other: &SyntaxToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn write_to(&self, out: &mut String) {
        for trivia in &self.0.leading {
            out.push_str(trivia.text());
        }
        out.push_str(&self.0.text);
        for trivia in &self.0.trailing {
            out.push_str(trivia.text());
        }
    }
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.0.kind, self.0.text)
    }
}

impl fmt::Display for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(self.full_len());
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(SyntaxToken),
}

impl SyntaxElement {
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&SyntaxToken> {
        match self {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(_) => None,
        }
    }

    pub fn full_len(&self) -> usize {
        match self {
            SyntaxElement::Node(node) => node.full_len(),
            SyntaxElement::Token(token) => token.full_len(),
        }
    }

    pub fn token_count(&self) -> u32 {
        match self {
            SyntaxElement::Node(node) => node.token_count(),
            SyntaxElement::Token(_) => 1,
        }
    }

    pub fn first_token(&self) -> Option<&SyntaxToken> {
        match self {
            SyntaxElement::Node(node) => node.first_token(),
            SyntaxElement::Token(token) => Some(token),
        }
    }

    pub fn last_token(&self) -> Option<&SyntaxToken> {
        match self {
            SyntaxElement::Node(node) => node.last_token(),
            SyntaxElement::Token(token) => Some(token),
        }
    }

    pub fn is_node(&self, kind: SyntaxKind) -> bool {
        matches!(self, SyntaxElement::Node(node) if node.kind() == kind)
    }

    pub fn has_comments(&self) -> bool {
        match self {
            SyntaxElement::Node(node) => node.has_comments(),
            SyntaxElement::Token(token) => token.has_comments(),
        }
    }

    /// Full text, trivia included.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.full_len());
        self.write_to(&mut out);
        out
    }

    /// Text without the outermost leading and trailing trivia.
    pub fn trimmed_text(&self) -> String {
        match self {
            SyntaxElement::Node(node) => node.trimmed_text(),
            SyntaxElement::Token(token) => token.text().to_string(),
        }
    }

    pub fn with_leading_trivia(&self, leading: Vec<Trivia>) -> Self {
        match self {
            SyntaxElement::Node(node) => SyntaxElement::Node(node.with_leading_trivia(leading)),
            SyntaxElement::Token(token) => {
                SyntaxElement::Token(token.with_leading_trivia(leading))
            }
        }
    }

    pub fn with_trailing_trivia(&self, trailing: Vec<Trivia>) -> Self {
        match self {
            SyntaxElement::Node(node) => SyntaxElement::Node(node.with_trailing_trivia(trailing)),
            SyntaxElement::Token(token) => {
                SyntaxElement::Token(token.with_trailing_trivia(trailing))
            }
        }
    }

    pub fn without_trailing_trivia(&self) -> Self {
        self.with_trailing_trivia(Vec::new())
    }

    fn write_to(&self, out: &mut String) {
        match self {
            SyntaxElement::Node(node) => node.write_to(out),
            SyntaxElement::Token(token) => token.write_to(out),
        }
    }
}

impl From<SyntaxNode> for SyntaxElement {
    fn from(node: SyntaxNode) -> Self {
        SyntaxElement::Node(node)
    }
}

impl From<SyntaxToken> for SyntaxElement {
    fn from(token: SyntaxToken) -> Self {
        SyntaxElement::Token(token)
    }
}

/// A child position of a node, optionally labelled with its grammar field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    field: Option<&'static str>,
    element: SyntaxElement,
}

impl Slot {
    pub fn new(field: Option<&'static str>, element: impl Into<SyntaxElement>) -> Self {
        Self {
            field,
            element: element.into(),
        }
    }

    pub fn unnamed(element: impl Into<SyntaxElement>) -> Self {
        Self::new(None, element)
    }

    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    pub fn element(&self) -> &SyntaxElement {
        &self.element
    }

    pub fn with_element(&self, element: impl Into<SyntaxElement>) -> Self {
        Self::new(self.field, element)
    }
}

/// An interior node. Cloning is cheap; edits produce new nodes that share
/// every untouched child with the original.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SyntaxNode(Arc<NodeData>);

#[derive(PartialEq, Eq, Hash)]
struct NodeData {
    kind: SyntaxKind,
    slots: Vec<Slot>,
    full_len: usize,
    token_count: u32,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, slots: Vec<Slot>) -> Self {
        let full_len = slots.iter().map(|s| s.element.full_len()).sum();
        let token_count = slots.iter().map(|s| s.element.token_count()).sum();
        Self(Arc::new(NodeData {
            kind,
            slots,
            full_len,
            token_count,
        }))
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    pub fn slots(&self) -> &[Slot] {
        &self.0.slots
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = &SyntaxElement> {
        self.0.slots.iter().map(|slot| &slot.element)
    }

    pub fn child_nodes(&self) -> impl DoubleEndedIterator<Item = &SyntaxNode> {
        self.children().filter_map(SyntaxElement::as_node)
    }

    pub fn child_tokens(&self) -> impl Iterator<Item = &SyntaxToken> {
        self.children().filter_map(SyntaxElement::as_token)
    }

    /// First child labelled with the given grammar field.
    pub fn field(&self, name: &str) -> Option<&SyntaxElement> {
        self.0
            .slots
            .iter()
            .find(|slot| slot.field == Some(name))
            .map(|slot| &slot.element)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.0.slots.iter().position(|slot| slot.field == Some(name))
    }

    pub fn full_len(&self) -> usize {
        self.0.full_len
    }

    pub fn token_count(&self) -> u32 {
        self.0.token_count
    }

    pub fn first_token(&self) -> Option<&SyntaxToken> {
        self.children().find_map(SyntaxElement::first_token)
    }

    pub fn last_token(&self) -> Option<&SyntaxToken> {
        self.children().rev().find_map(SyntaxElement::last_token)
    }

    pub fn leading_trivia(&self) -> &[Trivia] {
        match self.first_token() {
            Some(token) => token.leading_trivia(),
            None => &[],
        }
    }

    pub fn trailing_trivia(&self) -> &[Trivia] {
        match self.last_token() {
            Some(token) => token.trailing_trivia(),
            None => &[],
        }
    }

    /// Full text, trivia included.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.full_len());
        self.write_to(&mut out);
        out
    }

    /// Text without the first token's leading and the last token's trailing
    /// trivia.
    pub fn trimmed_text(&self) -> String {
        let text = self.text();
        let start = trivia_len(self.leading_trivia());
        let end = text.len() - trivia_len(self.trailing_trivia());
        if start >= end {
            return String::new();
        }
        text[start..end].to_string()
    }

    /// Tokens in pre-order.
    pub fn tokens(&self) -> Vec<SyntaxToken> {
        let mut out = Vec::with_capacity(self.token_count() as usize);
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens(&self, out: &mut Vec<SyntaxToken>) {
        for child in self.children() {
            match child {
                SyntaxElement::Node(node) => node.collect_tokens(out),
                SyntaxElement::Token(token) => out.push(token.clone()),
            }
        }
    }

    /// This node and every node below it, in pre-order.
    pub fn descendants(&self) -> Descendants {
        Descendants {
            stack: vec![self.clone()],
        }
    }

    pub fn has_comments(&self) -> bool {
        self.tokens().iter().any(SyntaxToken::has_comments)
    }

    pub fn has_structured_trivia(&self) -> bool {
        self.tokens().iter().any(SyntaxToken::has_structured_trivia)
    }

    pub fn ptr_eq(&self, other: &SyntaxNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Same kind, new children.
    pub fn with_slots(&self, slots: Vec<Slot>) -> Self {
        Self::new(self.kind(), slots)
    }

    pub fn replace_slot(&self, index: usize, element: impl Into<SyntaxElement>) -> Self {
        let mut slots = self.0.slots.clone();
        if let Some(slot) = slots.get_mut(index) {
            *slot = slot.with_element(element);
        }
        self.with_slots(slots)
    }

    pub fn with_leading_trivia(&self, leading: Vec<Trivia>) -> Self {
        self.map_first_token(|token| token.with_leading_trivia(leading))
    }

    pub fn with_trailing_trivia(&self, trailing: Vec<Trivia>) -> Self {
        self.map_last_token(|token| token.with_trailing_trivia(trailing))
    }

    pub fn without_trailing_trivia(&self) -> Self {
        self.with_trailing_trivia(Vec::new())
    }

    pub fn map_first_token(&self, f: impl FnOnce(&SyntaxToken) -> SyntaxToken) -> Self {
        let Some(index) = self.0.slots.iter().position(|s| s.element.token_count() > 0) else {
            return self.clone();
        };
        let replaced = match &self.0.slots[index].element {
            SyntaxElement::Node(node) => SyntaxElement::Node(node.map_first_token(f)),
            SyntaxElement::Token(token) => SyntaxElement::Token(f(token)),
        };
        self.replace_slot(index, replaced)
    }

    pub fn map_last_token(&self, f: impl FnOnce(&SyntaxToken) -> SyntaxToken) -> Self {
        let Some(index) = self.0.slots.iter().rposition(|s| s.element.token_count() > 0) else {
            return self.clone();
        };
        let replaced = match &self.0.slots[index].element {
            SyntaxElement::Node(node) => SyntaxElement::Node(node.map_last_token(f)),
            SyntaxElement::Token(token) => SyntaxElement::Token(f(token)),
        };
        self.replace_slot(index, replaced)
    }

    /// Follow a path of slot indices down from this node.
    pub fn node_at(&self, path: &NodePath) -> Option<SyntaxNode> {
        let mut current = self.clone();
        for &step in path.steps() {
            let next = current.0.slots.get(step as usize)?.element.as_node()?.clone();
            current = next;
        }
        Some(current)
    }

    /// Token index of the first token of the child in `slot`, given the
    /// index of this node's own first token.
    pub fn slot_token_start(&self, first: TokenIndex, slot: usize) -> TokenIndex {
        let before: u32 = self.0.slots[..slot.min(self.0.slots.len())]
            .iter()
            .map(|s| s.element.token_count())
            .sum();
        TokenIndex(first.0 + before)
    }

    /// Byte offset of the child in `slot`, given this node's own offset.
    pub fn slot_offset(&self, offset: usize, slot: usize) -> usize {
        offset
            + self.0.slots[..slot.min(self.0.slots.len())]
                .iter()
                .map(|s| s.element.full_len())
                .sum::<usize>()
    }

    fn write_to(&self, out: &mut String) {
        for child in self.children() {
            child.write_to(out);
        }
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.0.kind)
            .field("len", &self.0.full_len)
            .field("tokens", &self.0.token_count)
            .finish()
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Pre-order node iterator.
pub struct Descendants {
    stack: Vec<SyntaxNode>,
}

impl Iterator for Descendants {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        let node = self.stack.pop()?;
        self.stack.extend(node.child_nodes().rev().cloned());
        Some(node)
    }
}
