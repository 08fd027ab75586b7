//! Built-in C# types and their zero values.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Bool,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    NInt,
    NUInt,
    Single,
    Double,
    Decimal,
    String,
    Object,
}

/// (keyword, CLR name) for every built-in type.
const BUILTINS: &[(BuiltinType, &str, &str)] = &[
    (BuiltinType::Bool, "bool", "Boolean"),
    (BuiltinType::Char, "char", "Char"),
    (BuiltinType::SByte, "sbyte", "SByte"),
    (BuiltinType::Byte, "byte", "Byte"),
    (BuiltinType::Int16, "short", "Int16"),
    (BuiltinType::UInt16, "ushort", "UInt16"),
    (BuiltinType::Int32, "int", "Int32"),
    (BuiltinType::UInt32, "uint", "UInt32"),
    (BuiltinType::Int64, "long", "Int64"),
    (BuiltinType::UInt64, "ulong", "UInt64"),
    (BuiltinType::NInt, "nint", "IntPtr"),
    (BuiltinType::NUInt, "nuint", "UIntPtr"),
    (BuiltinType::Single, "float", "Single"),
    (BuiltinType::Double, "double", "Double"),
    (BuiltinType::Decimal, "decimal", "Decimal"),
    (BuiltinType::String, "string", "String"),
    (BuiltinType::Object, "object", "Object"),
];

impl BuiltinType {
    /// Look up a type by keyword or by (optionally `System.` or
    /// `global::System.` qualified) CLR name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        let unqualified = name
            .strip_prefix("global::")
            .unwrap_or(&name)
            .strip_prefix("System.");

        BUILTINS.iter().find_map(|&(ty, keyword, clr)| match unqualified {
            Some(rest) => (rest == clr).then_some(ty),
            None => (name == keyword || name == clr).then_some(ty),
        })
    }

    pub fn keyword(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|(ty, _, _)| *ty == self)
            .map_or("object", |(_, keyword, _)| keyword)
    }

    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            BuiltinType::Bool | BuiltinType::Char | BuiltinType::String | BuiltinType::Object
        )
    }

    pub fn is_reference(self) -> bool {
        matches!(self, BuiltinType::String | BuiltinType::Object)
    }
}

/// Canonical spelling of a type: whitespace removed and every built-in type
/// name replaced by its keyword, so `System.Int32` and `int` compare equal.
pub fn normalize_type_name(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut out = String::with_capacity(compact.len());
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        match BuiltinType::from_name(word) {
            Some(ty) => out.push_str(ty.keyword()),
            None => out.push_str(word),
        }
        word.clear();
    };

    for c in compact.chars() {
        if c.is_alphanumeric() || c == '_' || c == '.' || c == ':' || c == '@' {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}

/// Whether a numeric literal spells zero (`0`, `0L`, `0.0`, `0x0`, `0e10`, `0m`).
pub fn is_zero_numeric_literal(text: &str) -> bool {
    let text: String = text.chars().filter(|&c| c != '_').collect();
    let lower = text.to_ascii_lowercase();

    if let Some(digits) = lower
        .strip_prefix("0x")
        .or_else(|| lower.strip_prefix("0b"))
    {
        let digits = digits.trim_end_matches(['u', 'l']);
        return !digits.is_empty() && digits.chars().all(|c| c == '0');
    }

    let body = lower.trim_end_matches(['u', 'l', 'f', 'd', 'm']);
    let mantissa = body.split('e').next().unwrap_or(body);
    mantissa.chars().any(|c| c == '0') && mantissa.chars().all(|c| c == '0' || c == '.')
}

/// Whether a character literal spells `'\0'`.
pub fn is_zero_char_literal(text: &str) -> bool {
    let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) else {
        return false;
    };
    let Some(escape) = inner.strip_prefix('\\') else {
        return false;
    };
    match escape.chars().next() {
        Some('0') => escape.len() == 1,
        Some('u' | 'x' | 'U') => {
            let digits = &escape[1..];
            !digits.is_empty() && digits.chars().all(|c| c == '0')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_and_clr_names_agree() {
        assert_eq!(BuiltinType::from_name("int"), Some(BuiltinType::Int32));
        assert_eq!(BuiltinType::from_name("Int32"), Some(BuiltinType::Int32));
        assert_eq!(BuiltinType::from_name("System.Int32"), Some(BuiltinType::Int32));
        assert_eq!(
            BuiltinType::from_name("global::System.Boolean"),
            Some(BuiltinType::Bool)
        );
        assert_eq!(BuiltinType::from_name("System.int"), None);
        assert_eq!(BuiltinType::from_name("Widget"), None);
    }

    #[test]
    fn normalization_maps_builtins_to_keywords() {
        assert_eq!(normalize_type_name("System.Int32"), "int");
        assert_eq!(normalize_type_name("List< Int32 >"), "List<int>");
        assert_eq!(normalize_type_name("Boolean?"), "bool?");
        assert_eq!(normalize_type_name("Dictionary<string, Widget>"), "Dictionary<string,Widget>");
    }

    #[test]
    fn zero_literals() {
        for zero in ["0", "0L", "0u", "0UL", "0.0", "0.0f", "0m", "0d", "0x0", "0b0", "0e10", "0_0"] {
            assert!(is_zero_numeric_literal(zero), "{zero}");
        }
        for non_zero in ["1", "0.5", "0x10", "10", "1e0", "0x1F"] {
            assert!(!is_zero_numeric_literal(non_zero), "{non_zero}");
        }
        assert!(is_zero_char_literal(r"'\0'"));
        assert!(is_zero_char_literal(r"'\u0000'"));
        assert!(!is_zero_char_literal("'0'"));
        assert!(!is_zero_char_literal(r"'\n'"));
    }
}
