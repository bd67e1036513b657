//! Per-line tokenizer for highlighting

use super::glossary;
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

/// Vocabulary highlighted as keywords
pub const KEYWORDS: &[&str] = &[
    "i1", "i8", "i16", "i32", "i64", "ptr", "declare", "noreturn", "UB", "define", "call", "gep",
    "inbounds", "extractvalue", "assume", "noundef", "const", "alive", "block_id", "offset",
    "poison", "undef", "local", "store", "load", "br", "ret", "label", "align", "switch",
    "signext", "zext", "trunc", "sext", "alloca", "icmp", "fcmp", "phi", "ule", "uge", "ult",
    "ugt", "nsw", "nuw",
];

// Memory descriptors and addresses come first so that `offset=8` is not
// split into the bare `offset` keyword.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        concat!(
            r"(?P<mem>\b(?:block_id|offset)=\d+)",
            r"|(?P<addr>Address=#x[0-9a-fA-F]+)",
            r"|(?P<kw>\b(?:{})\b)",
            r"|(?P<var>%[#_]?[\w.]+)",
            r"|(?P<global>@[_A-Za-z0-9]+)",
            r"|(?P<hex>#x(?P<digits>[0-9a-fA-F]+)(?: ?\((?P<note>[^)]+)\))?)",
        ),
        KEYWORDS.join("|")
    );
    Regex::new(&pattern).expect("token pattern is valid")
});

/// Visual category of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenKind {
    Plain,
    Keyword,
    Variable,
    Global,
    Hex {
        digits: String,
        annotation: Option<String>,
    },
    MemoryDescriptor {
        key: String,
        value: String,
    },
    Address,
}

/// A highlighted slice of a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    #[serde(flatten)]
    pub kind: TokenKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<&'static str>,
}

impl Token {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: TokenKind::Plain,
            hover: None,
        }
    }
}

/// Split a line into highlighted tokens; concatenating the texts gives the line back
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::plain(&line[last..whole.start()]));
        }
        tokens.push(classify(&caps, whole.as_str()));
        last = whole.end();
    }

    if last < line.len() {
        tokens.push(Token::plain(&line[last..]));
    }
    tokens
}

fn classify(caps: &Captures<'_>, text: &str) -> Token {
    let (kind, hover) = if caps.name("mem").is_some() {
        let (key, value) = text.split_once('=').unwrap_or((text, ""));
        (
            TokenKind::MemoryDescriptor {
                key: key.to_string(),
                value: value.to_string(),
            },
            glossary::lookup(key),
        )
    } else if caps.name("addr").is_some() {
        (TokenKind::Address, glossary::lookup("address"))
    } else if caps.name("kw").is_some() {
        (TokenKind::Keyword, glossary::lookup(text))
    } else if caps.name("var").is_some() {
        (TokenKind::Variable, None)
    } else if caps.name("global").is_some() {
        (TokenKind::Global, glossary::symbol_hover(&text[1..]))
    } else {
        let group = |name| caps.name(name).map(|m| m.as_str().to_string());
        (
            TokenKind::Hex {
                digits: group("digits").unwrap_or_default(),
                annotation: group("note"),
            },
            None,
        )
    };

    Token {
        text: text.to_string(),
        kind,
        hover,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<(String, TokenKind)> {
        tokenize(line).into_iter().map(|t| (t.text, t.kind)).collect()
    }

    #[test]
    fn test_add_instruction() {
        let tokens = tokenize("%0 = add i32 %1, %2");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["%0", " = add ", "i32", " ", "%1", ", ", "%2"]);

        assert_eq!(tokens[0].kind, TokenKind::Variable);
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
        assert_eq!(tokens[2].hover, Some("32-bit integer type"));
        assert_eq!(tokens[4].kind, TokenKind::Variable);
        assert_eq!(tokens[6].kind, TokenKind::Variable);
        assert_eq!(tokens[1].kind, TokenKind::Plain);
    }

    #[test]
    fn test_round_trip_text() {
        let line = "  store ptr %x, ptr @_ZN4core9panicking5panic17h1E, align 8 ; block_id=2 offset=16";
        let joined: String = tokenize(line).into_iter().map(|t| t.text).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn test_hex_with_annotation() {
        let tokens = tokenize("i32 %a = #x80000000 (2147483648, -2147483648)");
        let hex = tokens.iter().find(|t| t.text.starts_with("#x")).unwrap();
        assert_eq!(
            hex.kind,
            TokenKind::Hex {
                digits: "80000000".to_string(),
                annotation: Some("2147483648, -2147483648".to_string()),
            }
        );
    }

    #[test]
    fn test_hex_without_annotation() {
        assert_eq!(
            kinds("#xff"),
            vec![(
                "#xff".to_string(),
                TokenKind::Hex {
                    digits: "ff".to_string(),
                    annotation: None
                }
            )]
        );
    }

    #[test]
    fn test_memory_descriptors_and_address() {
        let tokens = tokenize("Block 1 >\tsize: 4\talign: 4\talloc type: 0\talive: true\taddress: 8 block_id=1 offset=0 Address=#x00000008");
        let mem: Vec<&Token> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::MemoryDescriptor { .. }))
            .collect();
        assert_eq!(mem.len(), 2);
        assert_eq!(
            mem[1].kind,
            TokenKind::MemoryDescriptor {
                key: "offset".to_string(),
                value: "0".to_string()
            }
        );
        assert_eq!(mem[1].hover, Some("memory address offset"));

        let addr = tokens.iter().find(|t| t.kind == TokenKind::Address).unwrap();
        assert_eq!(addr.text, "Address=#x00000008");

        let alive = tokens.iter().find(|t| t.text == "alive").unwrap();
        assert_eq!(alive.kind, TokenKind::Keyword);
    }

    #[test]
    fn test_offset_assignment_is_one_descriptor() {
        assert_eq!(
            kinds("offset=8"),
            vec![(
                "offset=8".to_string(),
                TokenKind::MemoryDescriptor {
                    key: "offset".to_string(),
                    value: "8".to_string()
                }
            )]
        );
    }

    #[test]
    fn test_global_mangled_hover() {
        let tokens = tokenize("call void @_ZN4core9panicking5panic17h1E()");
        let global = tokens.iter().find(|t| t.kind == TokenKind::Global).unwrap();
        assert_eq!(global.hover, Some("Rust mangled function name (panic handler)"));

        let tokens = tokenize("define i32 @_Z3addii(i32 %a)");
        let global = tokens.iter().find(|t| t.kind == TokenKind::Global).unwrap();
        assert_eq!(global.hover, Some("C++ mangled function name"));
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        // "return" contains "ret", "alloca_size" contains "alloca"
        let tokens = tokenize("return alloca_size");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Plain));
    }

    #[test]
    fn test_unrecognized_line_is_plain() {
        assert_eq!(kinds("Summary:"), vec![("Summary:".to_string(), TokenKind::Plain)]);
        assert!(tokenize("").is_empty());
    }
}
