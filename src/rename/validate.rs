//! Static checks a proposed name must pass before it is tried.

use crate::semantic::{bound_names, SemanticModel, SymbolId, SymbolKind};
use std::fmt;

/// Reserved C# keywords. Contextual keywords (`var`, `value`, `async`, ...)
/// are legal identifiers and not listed.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Whether `name` is a legal identifier. A leading `@` makes keywords legal.
pub fn is_valid_identifier(name: &str) -> bool {
    let (verbatim, body) = match name.strip_prefix('@') {
        Some(body) => (true, body),
        None => (false, name),
    };
    let mut chars = body.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let legal = (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    legal && (verbatim || !is_keyword(body))
}

/// Why a proposed name was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidIdentifier,
    Keyword,
    /// Another member of the containing type or namespace has the name.
    MemberClash { kind: SymbolKind },
    /// The name equals the containing type's name.
    TypeNameClash,
    /// A sibling type parameter has the name.
    TypeParameterClash,
    /// A parameter or type parameter of an enclosing method has the name.
    ParameterClash,
    /// Some declaration in the enclosing method body binds the name.
    LocalClash,
    /// The old name is accessed through a receiver the model could not
    /// resolve, so not every use can be renamed.
    UnresolvedMemberAccess,
    /// The old name is used as a named argument.
    NamedArgument,
    /// Renaming changed which declaration some identifier binds to.
    Capture,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InvalidIdentifier => write!(f, "not a valid identifier"),
            Rejection::Keyword => write!(f, "reserved keyword"),
            Rejection::MemberClash { kind } => write!(f, "clashes with a {kind} of the same scope"),
            Rejection::TypeNameClash => write!(f, "clashes with the containing type name"),
            Rejection::TypeParameterClash => write!(f, "clashes with a sibling type parameter"),
            Rejection::ParameterClash => {
                write!(f, "clashes with a parameter of an enclosing method")
            }
            Rejection::LocalClash => write!(f, "already bound in the enclosing method"),
            Rejection::UnresolvedMemberAccess => {
                write!(f, "accessed through an unresolved receiver")
            }
            Rejection::NamedArgument => write!(f, "used as a named argument"),
            Rejection::Capture => write!(f, "would change what another identifier refers to"),
        }
    }
}

/// Check `candidate` as a new name for `id` against the symbol's scope chain.
pub fn check_candidate(model: &SemanticModel, id: SymbolId, candidate: &str) -> Result<(), Rejection> {
    if is_keyword(candidate) {
        return Err(Rejection::Keyword);
    }
    if !is_valid_identifier(candidate) {
        return Err(Rejection::InvalidIdentifier);
    }

    let symbol = model.symbol(id);
    let container = symbol.container;
    let in_method = container.is_some_and(|c| model.symbol(c).kind == SymbolKind::Method);

    if symbol.kind == SymbolKind::TypeParameter {
        if let Some(owner) = container {
            if model
                .type_parameters(owner)
                .any(|other| other != id && model.symbol(other).name == candidate)
            {
                return Err(Rejection::TypeParameterClash);
            }
        }
    }

    if in_method {
        check_method_scoped(model, id, candidate)
    } else {
        check_member(model, id, candidate)
    }
}

fn check_member(model: &SemanticModel, id: SymbolId, candidate: &str) -> Result<(), Rejection> {
    let symbol = model.symbol(id);

    if symbol.kind.is_type_member() && model.is_unresolved_member_name(&symbol.name) {
        return Err(Rejection::UnresolvedMemberAccess);
    }

    let Some(container) = symbol.container else {
        // Top-level declarations share the global scope.
        let clash = model
            .symbols()
            .find(|(other, s)| *other != id && s.container.is_none() && s.name == candidate);
        return match clash {
            Some((_, s)) => Err(Rejection::MemberClash { kind: s.kind }),
            None => Ok(()),
        };
    };

    if let Some(other) = model.members_named(container, candidate).find(|&other| other != id) {
        return Err(Rejection::MemberClash {
            kind: model.symbol(other).kind,
        });
    }

    let owner = model.symbol(container);
    if owner.kind == SymbolKind::Type && owner.name == candidate {
        return Err(Rejection::TypeNameClash);
    }
    Ok(())
}

fn check_method_scoped(model: &SemanticModel, id: SymbolId, candidate: &str) -> Result<(), Rejection> {
    let symbol = model.symbol(id);

    if symbol.kind == SymbolKind::Parameter && model.is_argument_name(&symbol.name) {
        return Err(Rejection::NamedArgument);
    }

    for method in model.enclosing_methods(id) {
        let clash = model
            .parameters(method)
            .chain(model.type_parameters(method))
            .any(|other| other != id && model.symbol(other).name == candidate);
        if clash {
            return Err(Rejection::ParameterClash);
        }
    }

    let body = model
        .outermost_method(id)
        .and_then(|method| model.syntax(method));
    if let Some(body) = body {
        if bound_names(&body).contains(candidate) {
            return Err(Rejection::LocalClash);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{LexicalResolver, SymbolResolver};
    use crate::ts::parse_unit;

    fn model(source: &str) -> SemanticModel {
        LexicalResolver.resolve(&parse_unit(source).unwrap()).unwrap()
    }

    fn find(model: &SemanticModel, kind: SymbolKind, name: &str) -> SymbolId {
        model
            .symbols()
            .find(|(_, s)| s.kind == kind && s.name == name)
            .map(|(id, _)| id)
            .unwrap()
    }

    #[test]
    fn identifiers_and_keywords() {
        assert!(is_valid_identifier("count"));
        assert!(is_valid_identifier("_count1"));
        assert!(is_valid_identifier("@class"));
        assert!(!is_valid_identifier("class"));
        assert!(!is_valid_identifier("1count"));
        assert!(!is_valid_identifier(""));
        assert!(is_valid_identifier("var"));
    }

    #[test]
    fn locals_clash_with_any_name_bound_in_the_method() {
        let model = model("class C { void M(int y) { int X = 1; { int z = 2; } } }");
        let x = find(&model, SymbolKind::Local, "X");
        assert_eq!(check_candidate(&model, x, "y"), Err(Rejection::ParameterClash));
        assert_eq!(check_candidate(&model, x, "z"), Err(Rejection::LocalClash));
        assert_eq!(check_candidate(&model, x, "int"), Err(Rejection::Keyword));
        assert_eq!(check_candidate(&model, x, "x"), Ok(()));
    }

    #[test]
    fn members_clash_with_siblings_and_the_type_name() {
        let model = model("class Widget { private int Size; int size() => 0; }");
        let field = find(&model, SymbolKind::Field, "Size");
        assert_eq!(
            check_candidate(&model, field, "size"),
            Err(Rejection::MemberClash {
                kind: SymbolKind::Method
            })
        );
        assert_eq!(check_candidate(&model, field, "Widget"), Err(Rejection::TypeNameClash));
        assert_eq!(check_candidate(&model, field, "_size"), Ok(()));
    }

    #[test]
    fn type_parameters_clash_with_siblings() {
        let model = model("class C { void M<T, U>() { } }");
        let t = find(&model, SymbolKind::TypeParameter, "T");
        assert_eq!(check_candidate(&model, t, "U"), Err(Rejection::TypeParameterClash));
    }

    #[test]
    fn parameters_used_as_named_arguments_are_kept() {
        let model = model("class C { void M(int Count) { } void N() { M(Count: 1); } }");
        let count = find(&model, SymbolKind::Parameter, "Count");
        assert_eq!(check_candidate(&model, count, "count"), Err(Rejection::NamedArgument));
    }
}
