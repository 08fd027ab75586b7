use crate::pool::with_parser;
use crate::syntax::LineIndex;
use crate::ts::errors::TreeSitterError;
use crate::ts::parser::ErrorNode;

/// Validate that C# source code has no syntax errors.
///
/// Returns Ok(()) if the code parses without ERROR or MISSING nodes.
pub fn validate_syntax(source: &str) -> Result<(), TreeSitterError> {
    let errors = with_parser(|parser| {
        parser
            .parse_with_source(source)
            .map(|parsed| parsed.error_nodes())
    })??;
    check_errors(source, &errors)
}

/// Validate that a rewrite doesn't introduce syntax errors.
///
/// Errors already present in `original` at the same byte range are tolerated.
pub fn validate_rewrite(original: &str, rewritten: &str) -> Result<(), TreeSitterError> {
    let (original_errors, new_errors) = with_parser(|parser| {
        let before = parser.parse_with_source(original)?.error_nodes();
        let after = parser.parse_with_source(rewritten)?.error_nodes();
        Ok::<_, TreeSitterError>((before, after))
    })??;

    let introduced: Vec<ErrorNode> = new_errors
        .into_iter()
        .filter(|e| {
            !original_errors
                .iter()
                .any(|o| o.byte_start == e.byte_start && o.byte_end == e.byte_end)
        })
        .collect();

    check_errors(rewritten, &introduced)
}

pub(crate) fn check_errors(source: &str, errors: &[ErrorNode]) -> Result<(), TreeSitterError> {
    match errors {
        [] => Ok(()),
        [error] => {
            let position = LineIndex::new(source).position(error.byte_start);
            Err(TreeSitterError::SyntaxError {
                byte_start: error.byte_start,
                byte_end: error.byte_end,
                line: position.line,
                column: position.column,
            })
        }
        errors => Err(TreeSitterError::MultipleSyntaxErrors {
            count: errors.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_valid_syntax() {
        let source = r#"
class Program
{
    static void Main() => System.Console.WriteLine("hello");
}
"#;
        assert!(validate_syntax(source).is_ok());
    }

    #[test]
    fn validate_invalid_syntax_reports_position() {
        let source = "class C\n{\n    int x = ;\n}\n";
        match validate_syntax(source) {
            Err(TreeSitterError::SyntaxError { line, .. }) => assert_eq!(line, 2),
            Err(TreeSitterError::MultipleSyntaxErrors { .. }) => {}
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn rewrite_that_breaks_code_is_rejected() {
        let original = "class C { int x = 1; }";
        let rewritten = "class C { int x = ; }";
        assert!(validate_rewrite(original, rewritten).is_err());
    }

    #[test]
    fn rewrite_of_valid_code_passes() {
        let original = "class C { int x = 0; }";
        let rewritten = "class C { int x; }";
        assert!(validate_rewrite(original, rewritten).is_ok());
    }
}
