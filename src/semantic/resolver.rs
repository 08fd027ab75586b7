//! Single-unit lexical binder.
//!
//! Declarations are collected in one walk that builds a scope arena; every
//! identifier that is not a declaration is queued together with the scope it
//! appeared in and resolved once the walk is complete, so members and local
//! functions can be used before they are declared.

use crate::semantic::model::SemanticModel;
use crate::semantic::names::{binder, declared_names, Binder};
use crate::semantic::symbol::{Symbol, SymbolId, SymbolKind, TypeKind};
use crate::syntax::{NodePath, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TokenIndex};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("unit contains unparsed source at byte {offset}")]
    UnparsedSource { offset: usize },

    #[error("unit has {count} tokens, more than a model can index")]
    TooLarge { count: usize },
}

/// Derives a [`SemanticModel`] for a tree.
pub trait SymbolResolver: Send + Sync {
    fn resolve(&self, root: &SyntaxNode) -> Result<SemanticModel, ResolveError>;
}

/// Resolver that binds names using the lexical structure of one unit.
///
/// Members of types declared elsewhere are unknown to it; accesses to them
/// are recorded as unresolved member names.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalResolver;

impl SymbolResolver for LexicalResolver {
    #[tracing::instrument(level = "debug", skip_all, fields(tokens = root.token_count()))]
    fn resolve(&self, root: &SyntaxNode) -> Result<SemanticModel, ResolveError> {
        if root.token_count() == u32::MAX {
            return Err(ResolveError::TooLarge {
                count: root.token_count() as usize,
            });
        }

        let mut builder = Builder::new();
        let global = Cx {
            scope: 0,
            container: None,
            parent: SyntaxKind::CompilationUnit,
        };
        builder.visit(root, TokenIndex(0), &NodePath::root(), 0, global)?;
        builder.resolve_pending();

        tracing::debug!(
            symbols = builder.symbols.len(),
            bindings = builder.bindings.len(),
            "resolved unit"
        );
        Ok(builder.finish(root))
    }
}

type ScopeId = usize;

#[derive(Default)]
struct Scope {
    parent: Option<ScopeId>,
    owner: Option<SymbolId>,
    names: HashMap<String, Vec<SymbolId>>,
}

#[derive(Clone, Copy)]
struct Cx {
    scope: ScopeId,
    container: Option<SymbolId>,
    parent: SyntaxKind,
}

enum Lookup {
    /// Plain name, looked up through the scope chain.
    Scope { scope: ScopeId, label: bool },
    /// Member of the type whose scope is given (`this.name`).
    Member { scope: Option<ScopeId> },
    /// Member of whatever the identifier at `left` binds to (`Type.name`).
    Qualified { left: TokenIndex },
}

struct Pending {
    token: TokenIndex,
    name: String,
    lookup: Lookup,
}

struct Builder {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    declarations: HashMap<TokenIndex, SymbolId>,
    bindings: BTreeMap<TokenIndex, SymbolId>,
    references: HashMap<SymbolId, Vec<TokenIndex>>,
    members: HashMap<SymbolId, Vec<SymbolId>>,
    type_scopes: HashMap<SymbolId, ScopeId>,
    skipped: HashSet<TokenIndex>,
    pending: Vec<Pending>,
    unresolved_members: HashSet<String>,
    argument_names: HashSet<String>,
    top_level: Option<(SymbolId, ScopeId)>,
}

impl Builder {
    fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            symbols: Vec::new(),
            declarations: HashMap::new(),
            bindings: BTreeMap::new(),
            references: HashMap::new(),
            members: HashMap::new(),
            type_scopes: HashMap::new(),
            skipped: HashSet::new(),
            pending: Vec::new(),
            unresolved_members: HashSet::new(),
            argument_names: HashSet::new(),
            top_level: None,
        }
    }

    fn finish(self, root: &SyntaxNode) -> SemanticModel {
        SemanticModel {
            root: root.clone(),
            symbols: self.symbols,
            references: self.references,
            bindings: self.bindings,
            members: self.members,
            unresolved_members: self.unresolved_members,
            argument_names: self.argument_names,
        }
    }

    fn push_scope(&mut self, parent: ScopeId, owner: Option<SymbolId>) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            owner,
            names: HashMap::new(),
        });
        self.scopes.len() - 1
    }

    /// Create a symbol, optionally registering its name in `scope`.
    fn add_symbol(&mut self, mut symbol: Symbol, container: Option<SymbolId>, scope: Option<ScopeId>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        symbol.container = container;
        if let Some(token) = symbol.declaration {
            self.declarations.insert(token, id);
            self.bindings.insert(token, id);
        }
        if let Some(scope) = scope {
            self.scopes[scope]
                .names
                .entry(symbol.name.clone())
                .or_default()
                .push(id);
        }
        if let Some(container) = container {
            self.members.entry(container).or_default().push(id);
        }
        self.symbols.push(symbol);
        id
    }

    fn declare(
        &mut self,
        kind: SymbolKind,
        token: (TokenIndex, &SyntaxToken),
        path: &NodePath,
        cx: Cx,
        scope: Option<ScopeId>,
    ) -> SymbolId {
        let mut symbol = Symbol::new(kind, token.1.text(), path.clone());
        symbol.declaration = Some(token.0);
        self.add_symbol(symbol, cx.container, scope)
    }

    /// A symbol without a declaring identifier, such as an operator.
    fn unnamed(&mut self, kind: SymbolKind, name: &str, path: &NodePath, cx: Cx) -> SymbolId {
        self.add_symbol(Symbol::new(kind, name, path.clone()), cx.container, None)
    }

    /// A symbol the source never spells out: lambdas, accessors, top-level
    /// statements and `value`.
    fn implicit(&mut self, kind: SymbolKind, name: &str, path: &NodePath, cx: Cx) -> SymbolId {
        let id = self.unnamed(kind, name, path, cx);
        self.symbols[id.0 as usize].implicit = true;
        id
    }

    fn visit(
        &mut self,
        node: &SyntaxNode,
        first: TokenIndex,
        path: &NodePath,
        offset: usize,
        cx: Cx,
    ) -> Result<(), ResolveError> {
        let inner = match node.kind() {
            SyntaxKind::Error => return Err(ResolveError::UnparsedSource { offset }),
            SyntaxKind::NamespaceDeclaration => {
                let name = node.field("name").map(SyntaxElement::trimmed_text).unwrap_or_default();
                self.skip_field(node, first, "name");
                let id = self.unnamed(SymbolKind::Namespace, &name, path, cx);
                Cx {
                    scope: self.push_scope(cx.scope, Some(id)),
                    container: Some(id),
                    parent: cx.parent,
                }
            }
            SyntaxKind::FileScopedNamespaceDeclaration => {
                self.skip_field(node, first, "name");
                cx
            }
            kind if kind.is_type_declaration() => self.declare_type(node, first, path, cx),
            SyntaxKind::FieldDeclaration | SyntaxKind::EventFieldDeclaration => {
                self.declare_fields(node, first, path, cx);
                cx
            }
            SyntaxKind::EnumMemberDeclaration => {
                if let Some(token) = field_token(node, first, "name") {
                    let id = self.declare(SymbolKind::Field, (token.0, &token.1), path, cx, Some(cx.scope));
                    self.symbols[id.0 as usize].modifiers = vec!["public".into(), "const".into()];
                }
                cx
            }
            SyntaxKind::MethodDeclaration
            | SyntaxKind::ConstructorDeclaration
            | SyntaxKind::DestructorDeclaration
            | SyntaxKind::OperatorDeclaration
            | SyntaxKind::LocalFunctionStatement => self.declare_method(node, first, path, cx),
            SyntaxKind::PropertyDeclaration
            | SyntaxKind::IndexerDeclaration
            | SyntaxKind::EventDeclaration => self.declare_property(node, first, path, cx),
            SyntaxKind::AccessorDeclaration => {
                let name = node
                    .field("name")
                    .map(SyntaxElement::trimmed_text)
                    .or_else(|| {
                        node.child_tokens()
                            .find(|t| ["get", "set", "init", "add", "remove"].contains(&t.text()))
                            .map(|t| t.text().to_string())
                    })
                    .unwrap_or_default();
                let method = self.implicit(SymbolKind::Method, &name, path, cx);
                self.symbols[method.0 as usize].modifiers = modifiers(node);
                let scope = self.push_scope(cx.scope, Some(method));
                let inner = Cx {
                    scope,
                    container: Some(method),
                    parent: cx.parent,
                };
                if name != "get" {
                    let value = self.implicit(SymbolKind::Parameter, "value", path, inner);
                    self.scopes[scope].names.insert("value".into(), vec![value]);
                }
                inner
            }
            SyntaxKind::ArrowExpressionClause
                if matches!(
                    cx.parent,
                    SyntaxKind::PropertyDeclaration | SyntaxKind::IndexerDeclaration
                ) =>
            {
                let getter = self.implicit(SymbolKind::Method, "get", path, cx);
                Cx {
                    scope: self.push_scope(cx.scope, Some(getter)),
                    container: Some(getter),
                    parent: cx.parent,
                }
            }
            SyntaxKind::LambdaExpression | SyntaxKind::AnonymousMethodExpression => {
                let lambda = self.implicit(SymbolKind::Method, "lambda", path, cx);
                let inner = Cx {
                    scope: self.push_scope(cx.scope, Some(lambda)),
                    container: Some(lambda),
                    parent: cx.parent,
                };
                self.declare_local_names(node, first, path, inner);
                inner
            }
            SyntaxKind::GlobalStatement => {
                let (method, scope) = match self.top_level {
                    Some(top) => top,
                    None => {
                        let method = self.implicit(SymbolKind::Method, "<top-level>", &NodePath::root(), cx);
                        let scope = self.push_scope(cx.scope, Some(method));
                        self.top_level = Some((method, scope));
                        (method, scope)
                    }
                };
                Cx {
                    scope,
                    container: Some(method),
                    parent: cx.parent,
                }
            }
            SyntaxKind::Block
            | SyntaxKind::ForStatement
            | SyntaxKind::UsingStatement
            | SyntaxKind::CatchClause
            | SyntaxKind::QueryExpression => Cx {
                scope: self.push_scope(cx.scope, None),
                ..cx
            },
            SyntaxKind::ForEachStatement => {
                let inner = Cx {
                    scope: self.push_scope(cx.scope, None),
                    ..cx
                };
                self.declare_local_names(node, first, path, inner);
                inner
            }
            kind if binder(kind).is_some() => {
                self.declare_local_names(node, first, path, cx);
                cx
            }
            _ => cx,
        };

        self.visit_slots(node, first, path, offset, Cx {
            parent: node.kind(),
            ..inner
        })
    }

    fn visit_slots(
        &mut self,
        node: &SyntaxNode,
        first: TokenIndex,
        path: &NodePath,
        offset: usize,
        cx: Cx,
    ) -> Result<(), ResolveError> {
        let mut index = first;
        let mut child_offset = offset;
        for (slot, element) in node.children().enumerate() {
            match element {
                SyntaxElement::Token(token) => self.token(node, slot, token, index, cx),
                SyntaxElement::Node(child) => {
                    if after_member_dot(node, slot) {
                        self.member_name_node(node, slot, child, index, cx);
                    }
                    if node.kind() == SyntaxKind::InitializerExpression
                        && child.kind() == SyntaxKind::AssignmentExpression
                    {
                        self.initializer_member(child, index);
                    }
                    self.visit(child, index, &path.child(slot), child_offset, cx)?;
                }
            }
            index = TokenIndex(index.0 + element.token_count());
            child_offset += element.full_len();
        }
        Ok(())
    }

    /// Classify an identifier token that is not a declaration.
    fn token(&mut self, node: &SyntaxNode, slot: usize, token: &SyntaxToken, index: TokenIndex, cx: Cx) {
        if !token.is_identifier()
            || self.declarations.contains_key(&index)
            || self.skipped.contains(&index)
        {
            return;
        }
        let name = token.text().to_string();
        let slots = node.slots();
        let next = slots.get(slot + 1).and_then(|s| s.element().as_token());

        if after_member_dot(node, slot) {
            // Namespace and nested type paths are left unbound.
            if node.kind() == SyntaxKind::QualifiedName {
                return;
            }
            let lookup = self.member_lookup(node, slot, index, cx);
            self.pending.push(Pending { token: index, name, lookup });
            return;
        }

        if next.is_some_and(|t| t.is_punct(":"))
            && matches!(node.kind(), SyntaxKind::Argument | SyntaxKind::Subpattern)
        {
            self.argument_names.insert(name);
            return;
        }

        let label = slot > 0
            && slots[slot - 1]
                .element()
                .as_token()
                .is_some_and(|t| t.is_keyword("goto"));
        self.pending.push(Pending {
            token: index,
            name,
            lookup: Lookup::Scope {
                scope: cx.scope,
                label,
            },
        });
    }

    /// `new Widget { Size = 2 }`: `Size` names a member of the created type,
    /// which the lexical model cannot see, so it stays unbound.
    fn initializer_member(&mut self, assignment: &SyntaxNode, first: TokenIndex) {
        let mut index = first;
        for (slot, element) in assignment.children().enumerate() {
            if is_left_operand(assignment, slot) {
                if let Some(token) = element.as_token().filter(|t| t.is_identifier()) {
                    self.skipped.insert(index);
                    self.unresolved_members.insert(token.text().to_string());
                }
                return;
            }
            index = TokenIndex(index.0 + element.token_count());
        }
    }

    /// `x.Method<T>()`: the generic name's identifier is a member name.
    fn member_name_node(&mut self, node: &SyntaxNode, slot: usize, child: &SyntaxNode, index: TokenIndex, cx: Cx) {
        let Some(token) = child.first_token().filter(|t| t.is_identifier()) else {
            return;
        };
        self.skipped.insert(index);
        if node.kind() == SyntaxKind::QualifiedName {
            return;
        }
        let lookup = self.member_lookup(node, slot, index, cx);
        self.pending.push(Pending {
            token: index,
            name: token.text().to_string(),
            lookup,
        });
    }

    fn member_lookup(&self, node: &SyntaxNode, slot: usize, index: TokenIndex, cx: Cx) -> Lookup {
        let Some(left) = slot.checked_sub(2).map(|s| node.slots()[s].element()) else {
            return Lookup::Member { scope: None };
        };
        match left.trimmed_text().as_str() {
            "this" => Lookup::Member {
                scope: self.enclosing_type_scope(cx.scope),
            },
            _ if left.token_count() == 1 && left.first_token().is_some_and(|t| t.is_identifier()) => {
                let dot_and_left = 1 + left.token_count();
                Lookup::Qualified {
                    left: TokenIndex(index.0 - dot_and_left),
                }
            }
            _ => Lookup::Member { scope: None },
        }
    }

    fn enclosing_type_scope(&self, mut scope: ScopeId) -> Option<ScopeId> {
        loop {
            let current = &self.scopes[scope];
            if let Some(owner) = current.owner {
                if self.symbols[owner.0 as usize].kind == SymbolKind::Type {
                    return Some(scope);
                }
            }
            scope = current.parent?;
        }
    }

    fn skip_field(&mut self, node: &SyntaxNode, first: TokenIndex, field: &str) {
        if let Some(slot) = node.field_index(field) {
            let start = node.slot_token_start(first, slot).0;
            let count = node.slots()[slot].element().token_count();
            self.skipped.extend((start..start + count).map(TokenIndex));
        }
    }

    fn declare_type(&mut self, node: &SyntaxNode, first: TokenIndex, path: &NodePath, cx: Cx) -> Cx {
        let type_kind = match node.kind() {
            SyntaxKind::StructDeclaration => TypeKind::Struct,
            SyntaxKind::InterfaceDeclaration => TypeKind::Interface,
            SyntaxKind::RecordDeclaration if node.child_tokens().any(|t| t.is_keyword("struct")) => {
                TypeKind::Struct
            }
            SyntaxKind::RecordDeclaration => TypeKind::Record,
            SyntaxKind::EnumDeclaration => TypeKind::Enum,
            SyntaxKind::DelegateDeclaration => TypeKind::Delegate,
            _ => TypeKind::Class,
        };

        let id = match field_token(node, first, "name") {
            Some((index, token)) => self.declare(SymbolKind::Type, (index, &token), path, cx, Some(cx.scope)),
            None => self.unnamed(SymbolKind::Type, "", path, cx),
        };
        let symbol = &mut self.symbols[id.0 as usize];
        symbol.type_kind = Some(type_kind);
        symbol.modifiers = modifiers(node);

        let scope = self.push_scope(cx.scope, Some(id));
        self.type_scopes.insert(id, scope);
        Cx {
            scope,
            container: Some(id),
            parent: cx.parent,
        }
    }

    fn declare_fields(&mut self, node: &SyntaxNode, first: TokenIndex, path: &NodePath, cx: Cx) {
        let kind = match node.kind() {
            SyntaxKind::EventFieldDeclaration => SymbolKind::Event,
            _ => SymbolKind::Field,
        };
        let modifiers = modifiers(node);
        let Some(slot) = node
            .slots()
            .iter()
            .position(|s| s.element().is_node(SyntaxKind::VariableDeclaration))
        else {
            return;
        };
        let Some(declaration) = node.slots()[slot].element().as_node() else {
            return;
        };
        let declaration_first = node.slot_token_start(first, slot);
        let declaration_path = path.child(slot);
        let type_slot = declaration.field_index("type");
        let declared_type = type_slot.map(|s| declaration.slots()[s].element().trimmed_text());
        let type_token = type_slot.map(|s| declaration.slot_token_start(declaration_first, s));

        for (declarator_slot, element) in declaration.children().enumerate() {
            let Some(declarator) = element.as_node().filter(|n| n.kind() == SyntaxKind::VariableDeclarator) else {
                continue;
            };
            let declarator_first = declaration.slot_token_start(declaration_first, declarator_slot);
            let declarator_path = declaration_path.child(declarator_slot);
            for (index, token) in declared_names(declarator, declarator_first) {
                let id = self.declare(kind, (index, &token), &declarator_path, cx, Some(cx.scope));
                let symbol = &mut self.symbols[id.0 as usize];
                symbol.modifiers = modifiers.clone();
                symbol.declared_type = declared_type.clone();
                symbol.type_token = type_token;
            }
        }
    }

    fn declare_method(&mut self, node: &SyntaxNode, first: TokenIndex, path: &NodePath, cx: Cx) -> Cx {
        // Constructors and destructors are named after their type and never
        // shadow it.
        let registers_name = matches!(
            node.kind(),
            SyntaxKind::MethodDeclaration | SyntaxKind::LocalFunctionStatement
        );
        let id = match field_token(node, first, "name") {
            Some((index, token)) => {
                let scope = registers_name.then_some(cx.scope);
                self.declare(SymbolKind::Method, (index, &token), path, cx, scope)
            }
            None => self.unnamed(SymbolKind::Method, "operator", path, cx),
        };
        self.symbols[id.0 as usize].modifiers = modifiers(node);

        Cx {
            scope: self.push_scope(cx.scope, Some(id)),
            container: Some(id),
            parent: cx.parent,
        }
    }

    fn declare_property(&mut self, node: &SyntaxNode, first: TokenIndex, path: &NodePath, cx: Cx) -> Cx {
        let kind = match node.kind() {
            SyntaxKind::EventDeclaration => SymbolKind::Event,
            _ => SymbolKind::Property,
        };
        let id = match field_token(node, first, "name") {
            Some((index, token)) => self.declare(kind, (index, &token), path, cx, Some(cx.scope)),
            None => self.unnamed(kind, "this[]", path, cx),
        };
        let symbol = &mut self.symbols[id.0 as usize];
        symbol.modifiers = modifiers(node);
        symbol.declared_type = node.field("type").map(SyntaxElement::trimmed_text);

        Cx {
            scope: self.push_scope(cx.scope, Some(id)),
            container: Some(id),
            parent: cx.parent,
        }
    }

    /// Locals, parameters, type parameters, range variables and labels.
    fn declare_local_names(&mut self, node: &SyntaxNode, first: TokenIndex, path: &NodePath, cx: Cx) {
        let Some(binder) = binder(node.kind()) else {
            return;
        };
        for (index, token) in declared_names(node, first) {
            if self.declarations.contains_key(&index) {
                continue;
            }
            match binder {
                Binder::AnonymousMember => {
                    self.skipped.insert(index);
                }
                Binder::Symbol(kind) => {
                    let id = self.declare(kind, (index, &token), path, cx, Some(cx.scope));
                    if matches!(kind, SymbolKind::Local | SymbolKind::Parameter) {
                        let symbol = &mut self.symbols[id.0 as usize];
                        symbol.declared_type = node.field("type").map(SyntaxElement::trimmed_text);
                        symbol.modifiers = modifiers(node);
                    }
                }
            }
        }
    }

    fn resolve_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let (plain, qualified): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|p| matches!(p.lookup, Lookup::Scope { .. }));

        for pending in plain.into_iter().chain(qualified) {
            let found = match pending.lookup {
                Lookup::Scope { scope, label } => self.lookup(scope, &pending.name, label),
                Lookup::Member { scope } => scope.and_then(|s| self.lookup_member(s, &pending.name)),
                Lookup::Qualified { left } => self
                    .bindings
                    .get(&left)
                    .and_then(|owner| self.type_scopes.get(owner))
                    .and_then(|&s| self.lookup_member(s, &pending.name)),
            };
            match found {
                Some(id) => {
                    self.bindings.insert(pending.token, id);
                    self.references.entry(id).or_default().push(pending.token);
                }
                None if !matches!(pending.lookup, Lookup::Scope { .. }) => {
                    self.unresolved_members.insert(pending.name);
                }
                None => {}
            }
        }

        for references in self.references.values_mut() {
            references.sort();
        }
    }

    fn lookup(&self, mut scope: ScopeId, name: &str, label: bool) -> Option<SymbolId> {
        loop {
            let current = &self.scopes[scope];
            let found = current.names.get(name).and_then(|ids| {
                ids.iter().copied().find(|&id| {
                    (self.symbols[id.0 as usize].kind == SymbolKind::Label) == label
                })
            });
            if found.is_some() {
                return found;
            }
            scope = current.parent?;
        }
    }

    fn lookup_member(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope].names.get(name).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|&id| self.symbols[id.0 as usize].kind.is_type_member())
        })
    }
}

/// Identifier token labelled with `field`, with its token index.
fn field_token(node: &SyntaxNode, first: TokenIndex, field: &str) -> Option<(TokenIndex, SyntaxToken)> {
    let slot = node.field_index(field)?;
    let token = node.slots()[slot].element().as_token()?;
    token
        .is_identifier()
        .then(|| (node.slot_token_start(first, slot), token.clone()))
}

fn modifiers(node: &SyntaxNode) -> Vec<String> {
    node.children()
        .filter_map(|element| match element {
            SyntaxElement::Token(token) if token.kind() == crate::syntax::TokenKind::Modifier => {
                Some(token.text().to_string())
            }
            SyntaxElement::Node(child) if child.kind() == SyntaxKind::Other => child
                .first_token()
                .filter(|t| t.kind() == crate::syntax::TokenKind::Modifier && child.token_count() == 1)
                .map(|t| t.text().to_string()),
            _ => None,
        })
        .collect()
}

fn after_member_dot(node: &SyntaxNode, slot: usize) -> bool {
    slot > 0
        && node.slots()[slot - 1]
            .element()
            .as_token()
            .is_some_and(|t| t.is_punct(".") || t.is_punct("->") || t.is_punct("?."))
}

fn is_left_operand(node: &SyntaxNode, slot: usize) -> bool {
    match node.field_index("left") {
        Some(left) => left == slot,
        None => slot == 0,
    }
}
