use std::fmt;

/// One-based source position. Both `line` and `column` start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    Nil,
    Ident(String),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,

    // Arithmetic / bitwise / shift
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,

    // Relational / equality
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,

    // Logical
    AndAnd,
    OrOr,
    Bang,

    // Assignment + compound assignment
    Assign,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,

    // Range
    DotDotDot,

    // Keywords
    KwVar,
    KwLet,
    KwConst,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwForeach,
    KwIn,
    KwFunc,
    KwReturn,
    KwBreak,
    KwContinue,
    KwSwitch,
    KwCase,
    KwDefault,
    KwStruct,
    KwNew,
    KwEnum,
    KwMap,
    KwSet,
    KwArray,
    KwImport,

    Illegal(String),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Char(c) => write!(f, "'{c}'"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => write!(f, "nil"),
            Self::Ident(name) => write!(f, "{name}"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Dot => write!(f, "."),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::Amp => write!(f, "&"),
            Self::Pipe => write!(f, "|"),
            Self::Caret => write!(f, "^"),
            Self::Tilde => write!(f, "~"),
            Self::Shl => write!(f, "<<"),
            Self::Shr => write!(f, ">>"),
            Self::Lt => write!(f, "<"),
            Self::Gt => write!(f, ">"),
            Self::LtEq => write!(f, "<="),
            Self::GtEq => write!(f, ">="),
            Self::EqEq => write!(f, "=="),
            Self::NotEq => write!(f, "!="),
            Self::StrictEq => write!(f, "==="),
            Self::StrictNotEq => write!(f, "!=="),
            Self::AndAnd => write!(f, "&&"),
            Self::OrOr => write!(f, "||"),
            Self::Bang => write!(f, "!"),
            Self::Assign => write!(f, "="),
            Self::PlusEq => write!(f, "+="),
            Self::MinusEq => write!(f, "-="),
            Self::StarEq => write!(f, "*="),
            Self::SlashEq => write!(f, "/="),
            Self::PercentEq => write!(f, "%="),
            Self::AmpEq => write!(f, "&="),
            Self::PipeEq => write!(f, "|="),
            Self::CaretEq => write!(f, "^="),
            Self::ShlEq => write!(f, "<<="),
            Self::ShrEq => write!(f, ">>="),
            Self::DotDotDot => write!(f, "..."),
            Self::KwVar => write!(f, "var"),
            Self::KwLet => write!(f, "let"),
            Self::KwConst => write!(f, "const"),
            Self::KwIf => write!(f, "if"),
            Self::KwElse => write!(f, "else"),
            Self::KwWhile => write!(f, "while"),
            Self::KwFor => write!(f, "for"),
            Self::KwForeach => write!(f, "foreach"),
            Self::KwIn => write!(f, "in"),
            Self::KwFunc => write!(f, "func"),
            Self::KwReturn => write!(f, "return"),
            Self::KwBreak => write!(f, "break"),
            Self::KwContinue => write!(f, "continue"),
            Self::KwSwitch => write!(f, "switch"),
            Self::KwCase => write!(f, "case"),
            Self::KwDefault => write!(f, "default"),
            Self::KwStruct => write!(f, "struct"),
            Self::KwNew => write!(f, "new"),
            Self::KwEnum => write!(f, "enum"),
            Self::KwMap => write!(f, "map"),
            Self::KwSet => write!(f, "set"),
            Self::KwArray => write!(f, "array"),
            Self::KwImport => write!(f, "import"),
            Self::Illegal(s) => write!(f, "illegal {s:?}"),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "var" => TokenKind::KwVar,
        "let" => TokenKind::KwLet,
        "const" => TokenKind::KwConst,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "for" => TokenKind::KwFor,
        "foreach" => TokenKind::KwForeach,
        "in" => TokenKind::KwIn,
        "func" => TokenKind::KwFunc,
        "return" => TokenKind::KwReturn,
        "break" => TokenKind::KwBreak,
        "continue" => TokenKind::KwContinue,
        "switch" => TokenKind::KwSwitch,
        "case" => TokenKind::KwCase,
        "default" => TokenKind::KwDefault,
        "struct" => TokenKind::KwStruct,
        "new" => TokenKind::KwNew,
        "enum" => TokenKind::KwEnum,
        "map" => TokenKind::KwMap,
        "set" => TokenKind::KwSet,
        "array" => TokenKind::KwArray,
        "import" => TokenKind::KwImport,
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        "nil" => TokenKind::Nil,
        _ => return None,
    })
}
