use crate::semantic::symbol::{Symbol, SymbolId, SymbolKind};
use crate::syntax::{SyntaxNode, TokenIndex};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Symbol information for one tree.
///
/// A model is bound to the exact root it was derived from; asking it about
/// any other tree is a stale-model fault, so callers check
/// [`is_bound_to`](Self::is_bound_to) and re-derive instead.
#[derive(Debug, Clone)]
pub struct SemanticModel {
    pub(super) root: SyntaxNode,
    pub(super) symbols: Vec<Symbol>,
    pub(super) references: HashMap<SymbolId, Vec<TokenIndex>>,
    pub(super) bindings: BTreeMap<TokenIndex, SymbolId>,
    pub(super) members: HashMap<SymbolId, Vec<SymbolId>>,
    pub(super) unresolved_members: HashSet<String>,
    pub(super) argument_names: HashSet<String>,
}

impl SemanticModel {
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn is_bound_to(&self, root: &SyntaxNode) -> bool {
        self.root.ptr_eq(root)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(idx, symbol)| (SymbolId(idx as u32), symbol))
    }

    /// Symbol the identifier at `token` declares or refers to.
    pub fn binding(&self, token: TokenIndex) -> Option<SymbolId> {
        self.bindings.get(&token).copied()
    }

    /// Every bound identifier token with the symbol it binds to.
    pub fn binding_map(&self) -> &BTreeMap<TokenIndex, SymbolId> {
        &self.bindings
    }

    /// Resolved references to `id`, declaration excluded.
    pub fn references(&self, id: SymbolId) -> &[TokenIndex] {
        self.references.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Symbols whose container is `container`.
    pub fn members(&self, container: SymbolId) -> &[SymbolId] {
        self.members.get(&container).map_or(&[], Vec::as_slice)
    }

    pub fn members_named<'a>(
        &'a self,
        container: SymbolId,
        name: &'a str,
    ) -> impl Iterator<Item = SymbolId> + 'a {
        self.members(container)
            .iter()
            .copied()
            .filter(move |&id| self.symbol(id).name == name)
    }

    pub fn parameters(&self, method: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.members_of_kind(method, SymbolKind::Parameter)
    }

    pub fn type_parameters(&self, owner: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.members_of_kind(owner, SymbolKind::TypeParameter)
    }

    fn members_of_kind(&self, container: SymbolId, kind: SymbolKind) -> impl Iterator<Item = SymbolId> + '_ {
        self.members(container)
            .iter()
            .copied()
            .filter(move |&id| self.symbol(id).kind == kind)
    }

    /// Nearest enclosing type of `id`, not counting `id` itself.
    pub fn containing_type(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = self.symbol(id).container;
        while let Some(container) = current {
            if self.symbol(container).kind == SymbolKind::Type {
                return Some(container);
            }
            current = self.symbol(container).container;
        }
        None
    }

    /// Method-like containers of `id` from the innermost outwards, stopping
    /// at the first container that is not a method.
    pub fn enclosing_methods(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut methods = Vec::new();
        let mut current = self.symbol(id).container;
        while let Some(container) = current {
            if self.symbol(container).kind != SymbolKind::Method {
                break;
            }
            methods.push(container);
            current = self.symbol(container).container;
        }
        methods
    }

    /// The outermost method-like symbol that contains `id`.
    pub fn outermost_method(&self, id: SymbolId) -> Option<SymbolId> {
        self.enclosing_methods(id).last().copied()
    }

    /// Outermost method-like symbols: methods, constructors, accessors and
    /// top-level statements, but not the lambdas and local functions nested
    /// inside them.
    pub fn method_roots(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols().filter_map(|(id, symbol)| {
            let nested = symbol
                .container
                .is_some_and(|c| self.symbol(c).kind == SymbolKind::Method);
            (symbol.kind == SymbolKind::Method && !nested).then_some(id)
        })
    }

    /// The declaring node of `id` in the bound tree.
    pub fn syntax(&self, id: SymbolId) -> Option<SyntaxNode> {
        self.root.node_at(&self.symbol(id).syntax)
    }

    /// Whether `name` follows a `.` somewhere without being resolved, such as
    /// `other.name` on a variable of unknown type.
    pub fn is_unresolved_member_name(&self, name: &str) -> bool {
        self.unresolved_members.contains(name)
    }

    /// Whether `name` is used as a named argument (`f(name: 1)`).
    pub fn is_argument_name(&self, name: &str) -> bool {
        self.argument_names.contains(name)
    }
}
