//! Lexical classification of Java-family source text
//!
//! Produces a flat list of tagged tokens (comments and literals are kept as single
//! tokens so callers can skip them) and maps identifiers onto the coarse classes an
//! editor highlighter would assign: storage/type names, named constants, and plain
//! variables.

const KEYWORDS: &[&str] = &[
    "abstract", "assert", "break", "case", "catch", "class", "const", "continue", "default",
    "do", "else", "enum", "extends", "final", "finally", "for", "goto", "if", "implements",
    "import", "instanceof", "interface", "native", "new", "package", "private", "protected",
    "public", "record", "return", "static", "strictfp", "super", "switch", "synchronized",
    "this", "throw", "throws", "transient", "try", "var", "volatile", "while", "true",
    "false", "null", "yield", "sealed", "permits",
];

const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_primitive_type(word: &str) -> bool {
    PRIMITIVE_TYPES.contains(&word)
}

pub fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    PrimitiveType,
    Number,
    StringLiteral,
    CharLiteral,
    Comment,
    Punct(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    /// Comments never take part in declaration shapes
    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Comment
    }
}

/// Highlighter-style class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalClass {
    /// Primitive types and capitalized class-like names
    StorageType,
    /// ALL_CAPS identifiers
    NamedConstant,
    Variable,
    Keyword,
    Other,
}

impl LexicalClass {
    /// Whether a token of this class can be the type in `Type name`
    pub fn is_type_like(self) -> bool {
        matches!(self, Self::StorageType | Self::NamedConstant)
    }
}

pub fn classify(token: &Token, source: &str) -> LexicalClass {
    match token.kind {
        TokenKind::PrimitiveType => LexicalClass::StorageType,
        TokenKind::Keyword => LexicalClass::Keyword,
        TokenKind::Identifier => classify_identifier(token.text(source)),
        _ => LexicalClass::Other,
    }
}

fn classify_identifier(word: &str) -> LexicalClass {
    let Some(first) = word.chars().next() else {
        return LexicalClass::Other;
    };
    if !first.is_ascii_uppercase() {
        return LexicalClass::Variable;
    }
    let has_lower = word.chars().any(|c| c.is_ascii_lowercase());
    if has_lower || word.len() == 1 {
        LexicalClass::StorageType
    } else {
        LexicalClass::NamedConstant
    }
}

/// Splits `source` into tokens, dropping whitespace
pub fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let byte = bytes[pos];
        let start = pos;

        let kind = if byte.is_ascii_whitespace() {
            pos += 1;
            continue;
        } else if byte == b'/' && bytes.get(pos + 1) == Some(&b'/') {
            pos = memchr_from(bytes, pos, b'\n').unwrap_or(bytes.len());
            TokenKind::Comment
        } else if byte == b'/' && bytes.get(pos + 1) == Some(&b'*') {
            pos = find_subslice(bytes, pos + 2, b"*/").map_or(bytes.len(), |end| end + 2);
            TokenKind::Comment
        } else if byte == b'"' || byte == b'\'' {
            pos = skip_quoted(bytes, pos, byte);
            if byte == b'"' {
                TokenKind::StringLiteral
            } else {
                TokenKind::CharLiteral
            }
        } else if byte.is_ascii_digit() {
            while pos < bytes.len() && (is_identifier_byte(bytes[pos]) || bytes[pos] == b'.') {
                pos += 1;
            }
            TokenKind::Number
        } else if is_identifier_byte(byte) || byte >= 0x80 {
            while pos < bytes.len() && (is_identifier_byte(bytes[pos]) || bytes[pos] >= 0x80) {
                pos += 1;
            }
            let word = &source[start..pos];
            if is_primitive_type(word) {
                TokenKind::PrimitiveType
            } else if is_keyword(word) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            }
        } else {
            pos += 1;
            TokenKind::Punct(byte as char)
        };

        tokens.push(Token {
            kind,
            start,
            end: pos,
        });
    }

    tokens
}

fn memchr_from(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|idx| from + idx)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|idx| from + idx)
}

fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\n' => return pos,
            b if b == quote => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}
