/// Casing convention a naming rule enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `count`; the first letter after any `_`/`@` prefix is lowercase.
    CamelCase,
    /// `Count`; the first letter after any prefix is uppercase.
    PascalCase,
}

impl NamingPolicy {
    pub fn conforms(self, name: &str) -> bool {
        let (_, rest) = split_prefix(name);
        match rest.chars().next() {
            None => true,
            Some(first) => match self {
                NamingPolicy::CamelCase => !first.is_uppercase(),
                NamingPolicy::PascalCase => !first.is_lowercase(),
            },
        }
    }

    /// Proposed names in order of preference; empty when `name` already
    /// follows the convention.
    pub fn candidates(self, name: &str) -> Vec<String> {
        if self.conforms(name) {
            return Vec::new();
        }
        let (prefix, rest) = split_prefix(name);
        let mut chars = rest.chars();
        let Some(first) = chars.next() else {
            return Vec::new();
        };
        let tail = chars.as_str();

        match self {
            NamingPolicy::CamelCase => {
                let camel = format!("{prefix}{}{tail}", first.to_lowercase());
                let underscored = format!("_{camel}");
                vec![camel, underscored]
            }
            NamingPolicy::PascalCase => {
                vec![format!("{prefix}{}{tail}", first.to_uppercase())]
            }
        }
    }
}

/// Leading run of characters that are not letters (`_`, `@`, digits).
fn split_prefix(name: &str) -> (&str, &str) {
    let at = name
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map_or(name.len(), |(idx, _)| idx);
    name.split_at(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_lowers_the_first_letter_after_the_prefix() {
        assert_eq!(
            NamingPolicy::CamelCase.candidates("Count"),
            vec!["count".to_string(), "_count".to_string()]
        );
        assert_eq!(
            NamingPolicy::CamelCase.candidates("_Items"),
            vec!["_items".to_string(), "__items".to_string()]
        );
        assert_eq!(NamingPolicy::CamelCase.candidates("@Class")[0], "@class");
    }

    #[test]
    fn conforming_names_have_no_candidates() {
        assert!(NamingPolicy::CamelCase.candidates("count").is_empty());
        assert!(NamingPolicy::CamelCase.candidates("_").is_empty());
        assert!(NamingPolicy::PascalCase.candidates("MaxValue").is_empty());
        assert!(NamingPolicy::PascalCase.candidates("MAX").is_empty());
    }

    #[test]
    fn pascal_case_has_a_single_candidate() {
        assert_eq!(
            NamingPolicy::PascalCase.candidates("maxValue"),
            vec!["MaxValue".to_string()]
        );
        assert_eq!(
            NamingPolicy::PascalCase.candidates("_limit"),
            vec!["_Limit".to_string()]
        );
    }
}
