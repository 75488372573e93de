use logos::Logos;
use std::num::ParseIntError;
use std::ops::Range;

/// A raw token with its byte span into the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub span: Range<usize>,
    pub kind: TokenKind,
}

impl Token {
    #[inline(always)]
    pub fn new(span: Range<usize>, kind: TokenKind) -> Self {
        Self { span, kind }
    }
    #[inline(always)]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }
    #[inline(always)]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub enum LexingError {
    InvalidInteger(String),
    #[default]
    UnknownCharacter,
}

impl From<ParseIntError> for LexingError {
    fn from(e: ParseIntError) -> Self {
        LexingError::InvalidInteger(e.to_string())
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexingError)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    /// Instruction boundary; lines are significant in S3.
    #[token("\n")]
    Newline,
    //Quotes are dropped by the callbacks
    #[regex(r#""[^"\n]*""#, |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    #[regex(r"'[^'\n]*'", |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    StringLiteral(String),
    /// A label declaration such as `loop_start:` (colon dropped).
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.]*:", |lex| lex.slice()[..lex.slice().len() - 1].to_string())]
    LabelDecl(String),
    /// Opcode mnemonics (`PUSH`, `JUMP.IF.0`, ...) and label references.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.]*", |lex| lex.slice().to_string())]
    Word(String),
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse())]
    Integer(i64),
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("=")]
    Eq,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::StringLiteral(s) => write!(f, "\"{}\"", s),
            TokenKind::LabelDecl(l) => write!(f, "{}:", l),
            TokenKind::Word(w) => write!(f, "{}", w),
            TokenKind::Integer(i) => write!(f, "{}", i),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Eq => write!(f, "="),
        }
    }
}
