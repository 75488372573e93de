use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::declare_error_type;

declare_error_type! {
    #[error("Tokenize error: {0}")]
    pub enum TokenizeError {
        UnknownCharacter(UnknownCharacterError),
        UnterminatedString(UnterminatedStringError),
        InvalidInteger(InvalidIntegerError),
        UnknownOpcode(UnknownOpcodeError),
        MissingOperand(MissingOperandError),
        UnexpectedOperand(UnexpectedOperandError),
        TrailingTokens(TrailingTokensError),
        DuplicateLabel(DuplicateLabelError),
        UndefinedLabel(UndefinedLabelError),
    }
}

pub type TokenizeResult<T> = Result<T, TokenizeError>;

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(tokenize::unknown_character))]
#[error("unknown character in program")]
pub struct UnknownCharacterError {
    #[label = "this is not part of any S3 token"]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(
    code(tokenize::unterminated_string),
    help("string literals must be closed by a matching quote on the same line")
)]
#[error("unterminated string literal")]
pub struct UnterminatedStringError {
    #[label = "this quote is never closed"]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(tokenize::invalid_integer))]
#[error("invalid integer literal: {reason}")]
pub struct InvalidIntegerError {
    pub reason: String,
    #[label = "does not fit a 64-bit signed integer"]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(tokenize::unknown_opcode))]
#[error("unknown opcode `{opcode}`")]
pub struct UnknownOpcodeError {
    pub opcode: String,
    #[label = "not an S3 instruction"]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(tokenize::missing_operand))]
#[error("`{opcode}` expects {expected}")]
pub struct MissingOperandError {
    pub opcode: &'static str,
    pub expected: &'static str,
    #[label("missing or malformed operand for `{opcode}`")]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(tokenize::unexpected_operand))]
#[error("`{opcode}` expects {expected}, found `{found}`")]
pub struct UnexpectedOperandError {
    pub opcode: &'static str,
    pub expected: &'static str,
    pub found: String,
    #[label("not {expected}")]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(
    code(tokenize::trailing_tokens),
    help("each line holds one instruction or one label declaration")
)]
#[error("unexpected tokens at end of line")]
pub struct TrailingTokensError {
    #[label = "nothing may follow the instruction on this line"]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(code(tokenize::duplicate_label))]
#[error("label `{label}` is declared more than once")]
pub struct DuplicateLabelError {
    pub label: String,
    #[label = "second declaration of this label"]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}

#[derive(Error, Diagnostic, Debug)]
#[diagnostic(
    code(tokenize::undefined_label),
    help("declare the label somewhere in the script as `name:` on its own line")
)]
#[error("jump to undefined label `{label}`")]
pub struct UndefinedLabelError {
    pub label: String,
    #[label = "no such label in this script"]
    pub span: SourceSpan,
    #[source_code]
    pub src: String,
}
