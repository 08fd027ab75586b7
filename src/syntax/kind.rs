use serde::Serialize;

/// Node categories produced by the C# frontend.
///
/// Only the categories the passes and the resolver inspect get their own
/// variant; every other grammar node lowers to [`SyntaxKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyntaxKind {
    CompilationUnit,
    NamespaceDeclaration,
    FileScopedNamespaceDeclaration,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    RecordDeclaration,
    EnumDeclaration,
    DelegateDeclaration,
    DeclarationList,
    EnumMemberDeclarationList,
    EnumMemberDeclaration,
    FieldDeclaration,
    EventFieldDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    EqualsValueClause,
    MethodDeclaration,
    ConstructorDeclaration,
    DestructorDeclaration,
    OperatorDeclaration,
    PropertyDeclaration,
    IndexerDeclaration,
    EventDeclaration,
    AccessorList,
    AccessorDeclaration,
    ArrowExpressionClause,
    LocalFunctionStatement,
    ParameterList,
    Parameter,
    TypeParameterList,
    TypeParameter,
    AttributeList,
    Block,
    GlobalStatement,
    LocalDeclarationStatement,
    ExpressionStatement,
    ForStatement,
    ForEachStatement,
    UsingStatement,
    CatchClause,
    CatchDeclaration,
    SwitchSection,
    LabeledStatement,
    InvocationExpression,
    MemberAccessExpression,
    ConditionalAccessExpression,
    ArgumentList,
    Argument,
    AssignmentExpression,
    LambdaExpression,
    AnonymousMethodExpression,
    ObjectCreationExpression,
    InitializerExpression,
    AnonymousObjectCreationExpression,
    AnonymousObjectMemberDeclarator,
    NameEquals,
    QueryExpression,
    FromClause,
    LetClause,
    JoinClause,
    JoinIntoClause,
    QueryContinuation,
    DeclarationExpression,
    DeclarationPattern,
    VarPattern,
    Subpattern,
    DefaultExpression,
    QualifiedName,
    GenericName,
    NullableType,
    InterpolatedString,
    Interpolation,
    Error,
    Other,
}

impl SyntaxKind {
    /// Map a tree-sitter-c-sharp node kind onto a syntax kind.
    pub fn from_grammar(kind: &str) -> Self {
        match kind {
            "compilation_unit" => SyntaxKind::CompilationUnit,
            "namespace_declaration" => SyntaxKind::NamespaceDeclaration,
            "file_scoped_namespace_declaration" => SyntaxKind::FileScopedNamespaceDeclaration,
            "class_declaration" => SyntaxKind::ClassDeclaration,
            "struct_declaration" => SyntaxKind::StructDeclaration,
            "interface_declaration" => SyntaxKind::InterfaceDeclaration,
            "record_declaration" | "record_struct_declaration" => SyntaxKind::RecordDeclaration,
            "enum_declaration" => SyntaxKind::EnumDeclaration,
            "delegate_declaration" => SyntaxKind::DelegateDeclaration,
            "declaration_list" => SyntaxKind::DeclarationList,
            "enum_member_declaration_list" => SyntaxKind::EnumMemberDeclarationList,
            "enum_member_declaration" => SyntaxKind::EnumMemberDeclaration,
            "field_declaration" => SyntaxKind::FieldDeclaration,
            "event_field_declaration" => SyntaxKind::EventFieldDeclaration,
            "variable_declaration" => SyntaxKind::VariableDeclaration,
            "variable_declarator" => SyntaxKind::VariableDeclarator,
            "equals_value_clause" => SyntaxKind::EqualsValueClause,
            "method_declaration" => SyntaxKind::MethodDeclaration,
            "constructor_declaration" => SyntaxKind::ConstructorDeclaration,
            "destructor_declaration" => SyntaxKind::DestructorDeclaration,
            "operator_declaration" | "conversion_operator_declaration" => {
                SyntaxKind::OperatorDeclaration
            }
            "property_declaration" => SyntaxKind::PropertyDeclaration,
            "indexer_declaration" => SyntaxKind::IndexerDeclaration,
            "event_declaration" => SyntaxKind::EventDeclaration,
            "accessor_list" => SyntaxKind::AccessorList,
            "accessor_declaration" => SyntaxKind::AccessorDeclaration,
            "arrow_expression_clause" => SyntaxKind::ArrowExpressionClause,
            "local_function_statement" => SyntaxKind::LocalFunctionStatement,
            "parameter_list" | "bracketed_parameter_list" => SyntaxKind::ParameterList,
            "parameter" => SyntaxKind::Parameter,
            "type_parameter_list" => SyntaxKind::TypeParameterList,
            "type_parameter" => SyntaxKind::TypeParameter,
            "attribute_list" => SyntaxKind::AttributeList,
            "block" => SyntaxKind::Block,
            "global_statement" => SyntaxKind::GlobalStatement,
            "local_declaration_statement" => SyntaxKind::LocalDeclarationStatement,
            "expression_statement" => SyntaxKind::ExpressionStatement,
            "for_statement" => SyntaxKind::ForStatement,
            "foreach_statement" => SyntaxKind::ForEachStatement,
            "using_statement" => SyntaxKind::UsingStatement,
            "catch_clause" => SyntaxKind::CatchClause,
            "catch_declaration" => SyntaxKind::CatchDeclaration,
            "switch_section" => SyntaxKind::SwitchSection,
            "labeled_statement" => SyntaxKind::LabeledStatement,
            "invocation_expression" => SyntaxKind::InvocationExpression,
            "member_access_expression" => SyntaxKind::MemberAccessExpression,
            "conditional_access_expression" => SyntaxKind::ConditionalAccessExpression,
            "argument_list" => SyntaxKind::ArgumentList,
            "argument" => SyntaxKind::Argument,
            "assignment_expression" => SyntaxKind::AssignmentExpression,
            "lambda_expression" => SyntaxKind::LambdaExpression,
            "anonymous_method_expression" => SyntaxKind::AnonymousMethodExpression,
            "object_creation_expression" => SyntaxKind::ObjectCreationExpression,
            "initializer_expression" => SyntaxKind::InitializerExpression,
            "anonymous_object_creation_expression" => {
                SyntaxKind::AnonymousObjectCreationExpression
            }
            "anonymous_object_member_declarator" => SyntaxKind::AnonymousObjectMemberDeclarator,
            "name_equals" => SyntaxKind::NameEquals,
            "query_expression" => SyntaxKind::QueryExpression,
            "from_clause" => SyntaxKind::FromClause,
            "let_clause" => SyntaxKind::LetClause,
            "join_clause" => SyntaxKind::JoinClause,
            "join_into_clause" => SyntaxKind::JoinIntoClause,
            "query_continuation" => SyntaxKind::QueryContinuation,
            "declaration_expression" => SyntaxKind::DeclarationExpression,
            "declaration_pattern" | "recursive_pattern" => SyntaxKind::DeclarationPattern,
            "var_pattern" => SyntaxKind::VarPattern,
            "subpattern" => SyntaxKind::Subpattern,
            "default_expression" => SyntaxKind::DefaultExpression,
            "qualified_name" => SyntaxKind::QualifiedName,
            "generic_name" => SyntaxKind::GenericName,
            "nullable_type" => SyntaxKind::NullableType,
            "interpolated_string_expression" => SyntaxKind::InterpolatedString,
            "interpolation" => SyntaxKind::Interpolation,
            "ERROR" => SyntaxKind::Error,
            _ => SyntaxKind::Other,
        }
    }

    /// Class, struct, interface, record, enum or delegate declaration.
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::StructDeclaration
                | SyntaxKind::InterfaceDeclaration
                | SyntaxKind::RecordDeclaration
                | SyntaxKind::EnumDeclaration
                | SyntaxKind::DelegateDeclaration
        )
    }

    /// Type declarations whose body can hold fields.
    pub fn has_field_members(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration | SyntaxKind::StructDeclaration | SyntaxKind::RecordDeclaration
        )
    }
}

/// Token categories produced by the C# frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Modifier,
    PredefinedType,
    IntegerLiteral,
    RealLiteral,
    StringLiteral,
    CharacterLiteral,
    BooleanLiteral,
    NullLiteral,
    Punctuation,
    EndOfFile,
    Other,
}

impl TokenKind {
    /// Map a leaf grammar node onto a token kind.
    ///
    /// Anonymous leaves are keywords when they are spelled like a word and
    /// punctuation otherwise.
    pub fn from_grammar(kind: &str, named: bool, text: &str) -> Self {
        match kind {
            "identifier" | "implicit_parameter" => TokenKind::Identifier,
            "modifier" => TokenKind::Modifier,
            "predefined_type" => TokenKind::PredefinedType,
            "integer_literal" => TokenKind::IntegerLiteral,
            "real_literal" => TokenKind::RealLiteral,
            "string_literal" | "verbatim_string_literal" | "raw_string_literal" => {
                TokenKind::StringLiteral
            }
            "character_literal" => TokenKind::CharacterLiteral,
            "boolean_literal" | "true" | "false" => TokenKind::BooleanLiteral,
            "null_literal" | "null" => TokenKind::NullLiteral,
            _ if !named => {
                let word = !text.is_empty()
                    && text.chars().all(|c| c.is_ascii_alphabetic() || c == '_');
                if word {
                    TokenKind::Keyword
                } else {
                    TokenKind::Punctuation
                }
            }
            _ => TokenKind::Other,
        }
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharacterLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::NullLiteral
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_kinds_map_to_variants() {
        assert_eq!(
            SyntaxKind::from_grammar("field_declaration"),
            SyntaxKind::FieldDeclaration
        );
        assert_eq!(
            SyntaxKind::from_grammar("record_struct_declaration"),
            SyntaxKind::RecordDeclaration
        );
        assert_eq!(SyntaxKind::from_grammar("binary_expression"), SyntaxKind::Other);
    }

    #[test]
    fn anonymous_leaves_split_into_keywords_and_punctuation() {
        assert_eq!(TokenKind::from_grammar("class", false, "class"), TokenKind::Keyword);
        assert_eq!(TokenKind::from_grammar(".", false, "."), TokenKind::Punctuation);
        assert_eq!(TokenKind::from_grammar("null", false, "null"), TokenKind::NullLiteral);
        assert_eq!(
            TokenKind::from_grammar("identifier", true, "count"),
            TokenKind::Identifier
        );
    }
}
