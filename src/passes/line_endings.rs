use crate::passes::{PassContext, PassError, PassOutput};
use crate::syntax::{map_tokens, SyntaxKind, Trivia, TriviaKind};

const RULE: &str = "normalize-line-endings";

pub fn run(ctx: &PassContext<'_>) -> Result<PassOutput, PassError> {
    let mut findings = Vec::new();

    let root = map_tokens(ctx.root, &mut |token, offset| {
        let leading_len = token.leading_len();
        let text_len = token.text().len();
        let mut found = false;

        let mut fix = |trivia: &[Trivia], mut at: usize| -> Vec<Trivia> {
            trivia
                .iter()
                .map(|item| {
                    let start = at;
                    at += item.len();
                    if item.kind() == TriviaKind::EndOfLine && item.text() == "\r\n" {
                        found = true;
                        findings.push(ctx.finding(RULE, SyntaxKind::Other, start, "\\r\\n should be \\n"));
                        Trivia::end_of_line("\n")
                    } else {
                        item.clone()
                    }
                })
                .collect()
        };

        let leading = fix(token.leading_trivia(), offset);
        let trailing = fix(token.trailing_trivia(), offset + leading_len + text_len);
        found.then(|| token.with_leading_trivia(leading).with_trailing_trivia(trailing))
    });

    Ok(ctx.output(root, findings))
}
