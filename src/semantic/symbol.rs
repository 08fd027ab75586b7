use crate::syntax::{NodePath, TokenIndex};
use std::fmt;

/// Index of a symbol inside one [`SemanticModel`](super::SemanticModel).
///
/// Ids are assigned in declaration order while walking the tree, so two
/// models derived from trees of the same shape hand out the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Type,
    /// Methods, constructors, accessors, local functions and lambdas.
    Method,
    Field,
    Property,
    Event,
    Parameter,
    Local,
    TypeParameter,
    /// Query range variable (`from x in ...`, `let x = ...`).
    RangeVariable,
    Label,
}

impl SymbolKind {
    /// Members declared directly in a type body.
    pub fn is_type_member(self) -> bool {
        matches!(
            self,
            SymbolKind::Type
                | SymbolKind::Method
                | SymbolKind::Field
                | SymbolKind::Property
                | SymbolKind::Event
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Namespace => "namespace",
            SymbolKind::Type => "type",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Event => "event",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Local => "local",
            SymbolKind::TypeParameter => "type parameter",
            SymbolKind::RangeVariable => "range variable",
            SymbolKind::Label => "label",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Record,
    Enum,
    Delegate,
}

impl TypeKind {
    /// Whether `default` of this type is `null`.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            TypeKind::Class | TypeKind::Interface | TypeKind::Record | TypeKind::Delegate
        )
    }
}

/// A declared entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Declaring type, method or namespace.
    pub container: Option<SymbolId>,
    /// The identifier token naming the symbol; `None` for implicit symbols.
    pub declaration: Option<TokenIndex>,
    /// The declaring node.
    pub syntax: NodePath,
    pub type_kind: Option<TypeKind>,
    pub modifiers: Vec<String>,
    /// Source text of the declared type of a field, local or parameter.
    pub declared_type: Option<String>,
    /// Token index of the first token of the declared type.
    pub type_token: Option<TokenIndex>,
    /// Lambdas, accessors, top-level statements and `value` parameters.
    pub implicit: bool,
}

impl Symbol {
    pub(crate) fn new(kind: SymbolKind, name: impl Into<String>, syntax: NodePath) -> Self {
        Self {
            kind,
            name: name.into(),
            container: None,
            declaration: None,
            syntax,
            type_kind: None,
            modifiers: Vec::new(),
            declared_type: None,
            type_token: None,
            implicit: false,
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn is_const(&self) -> bool {
        self.has_modifier("const")
    }

    /// No access modifier, or `private` alone.
    pub fn is_private(&self) -> bool {
        self.has_modifier("private")
            || !["public", "protected", "internal"]
                .iter()
                .any(|m| self.has_modifier(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accessibility_is_private() {
        let mut field = Symbol::new(SymbolKind::Field, "count", NodePath::root());
        assert!(field.is_private());
        field.modifiers = vec!["private".into(), "protected".into()];
        assert!(field.is_private());
        field.modifiers = vec!["internal".into(), "static".into()];
        assert!(!field.is_private());
    }
}
