//! The S3 frontend: raw lexing plus the line-oriented stream builder.
//!
//! Source text goes in, a [`Program`] comes out: one flat vector holding
//! opcodes interleaved with their operands, and a label table mapping each
//! declared label to the stream index of the instruction that follows it.
//! Labels are collected during the single pass; every label reference is
//! checked once the pass is done, so forward references are legal and an
//! undefined label is a load-time error.

use crate::s3_frontend::error::{
    DuplicateLabelError, InvalidIntegerError, MissingOperandError, TokenizeError, TokenizeResult,
    TrailingTokensError, UndefinedLabelError, UnexpectedOperandError, UnknownCharacterError,
    UnknownOpcodeError, UnterminatedStringError,
};
use crate::s3_frontend::lexer::token::{LexingError, Token as RawToken, TokenKind};
use crate::s3_frontend::program::{Cmp, Op, Program, Token};
use miette::{SourceOffset, SourceSpan};
use std::ops::Range;

pub mod error;
pub mod lexer;
pub mod program;

/// Tokenizes S3 source text into an executable [`Program`].
pub fn tokenize(source: &str) -> TokenizeResult<Program> {
    let raw = lexer::lex(source).map_err(|(e, span)| lexing_error(source, e, span))?;
    StreamBuilder::new(source).build(&raw)
}

fn to_source_span(range: Range<usize>) -> SourceSpan {
    SourceSpan::new(SourceOffset::from(range.start), range.len())
}

fn lexing_error(source: &str, e: LexingError, span: Range<usize>) -> TokenizeError {
    match e {
        LexingError::InvalidInteger(reason) => TokenizeError::from(InvalidIntegerError {
            reason,
            span: to_source_span(span),
            src: source.to_string(),
        }),
        LexingError::UnknownCharacter => {
            // A bare quote means the literal never closed before the line
            // ended, which deserves a better message than "unknown character".
            if source[span.clone()].starts_with(['"', '\'']) {
                TokenizeError::from(UnterminatedStringError {
                    span: to_source_span(span),
                    src: source.to_string(),
                })
            } else {
                TokenizeError::from(UnknownCharacterError {
                    span: to_source_span(span),
                    src: source.to_string(),
                })
            }
        }
    }
}

struct StreamBuilder<'src> {
    source: &'src str,
    program: Program,
    /// Label references seen so far, validated after the full pass.
    label_refs: Vec<(String, Range<usize>)>,
}

impl<'src> StreamBuilder<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            program: Program::default(),
            label_refs: Vec::new(),
        }
    }

    fn build(mut self, raw: &[RawToken]) -> TokenizeResult<Program> {
        for line in raw.split(|t| t.kind == TokenKind::Newline) {
            if line.is_empty() {
                continue;
            }
            self.line(line)?;
        }
        for (label, span) in &self.label_refs {
            if !self.program.labels.contains_key(label) {
                return Err(UndefinedLabelError {
                    label: label.clone(),
                    span: to_source_span(span.clone()),
                    src: self.source.to_string(),
                }
                .into());
            }
        }
        Ok(self.program)
    }

    fn line(&mut self, line: &[RawToken]) -> TokenizeResult<()> {
        let (first, rest) = line.split_first().expect("caller skips empty lines");
        if let TokenKind::LabelDecl(name) = first.kind() {
            if let Some(extra) = rest.first() {
                return Err(self.trailing_tokens(extra, rest));
            }
            // The label names the position the *next* instruction will occupy.
            let position = self.program.len();
            if self.program.labels.insert(name.clone(), position).is_some() {
                return Err(DuplicateLabelError {
                    label: name.clone(),
                    span: to_source_span(first.span()),
                    src: self.source.to_string(),
                }
                .into());
            }
            return Ok(());
        }
        self.instruction(line)
    }

    /// Emits one instruction (opcode plus operand slots) from `tokens`,
    /// which must cover the rest of the line.
    fn instruction(&mut self, tokens: &[RawToken]) -> TokenizeResult<()> {
        let (first, mut rest) = tokens.split_first().expect("instruction is never empty");
        let op = match first.kind() {
            TokenKind::Word(w) => w.parse::<Op>().map_err(|()| UnknownOpcodeError {
                opcode: w.clone(),
                span: to_source_span(first.span()),
                src: self.source.to_string(),
            })?,
            other => {
                return Err(UnknownOpcodeError {
                    opcode: other.to_string(),
                    span: to_source_span(first.span()),
                    src: self.source.to_string(),
                }
                .into())
            }
        };
        self.program.tokens.push(Token::Op(op));

        match op {
            Op::Push | Op::Wait => {
                let n = self.expect_int(op, first, &mut rest)?;
                self.program.tokens.push(Token::Int(n));
            }
            Op::Print => {
                let s = self.expect_string(op, first, &mut rest)?;
                self.program.tokens.push(Token::Str(s));
            }
            Op::Jump | Op::Goto | Op::JumpIfZero | Op::JumpIfPos => {
                let label = self.expect_label(op, first, &mut rest)?;
                self.program.tokens.push(Token::Label(label));
            }
            Op::Loop => {
                // Target is either a raw stream index or a label.
                match rest.split_first() {
                    Some((t, tail)) => {
                        match t.kind() {
                            TokenKind::Integer(i) => self.program.tokens.push(Token::Int(*i)),
                            TokenKind::Word(w) => {
                                self.label_refs.push((w.clone(), t.span()));
                                self.program.tokens.push(Token::Label(w.clone()));
                            }
                            other => {
                                return Err(self.unexpected_operand(
                                    op,
                                    "a label or stream index target",
                                    other,
                                    t,
                                ))
                            }
                        }
                        rest = tail;
                    }
                    None => {
                        return Err(self.missing_operand(op, "a target and a repeat count", first))
                    }
                }
                let count = self.expect_int(op, first, &mut rest)?;
                self.program.tokens.push(Token::Int(count));
            }
            Op::If => {
                let cmp = match rest.split_first() {
                    Some((t, tail)) => {
                        let cmp = match t.kind() {
                            TokenKind::Gt => Cmp::Gt,
                            TokenKind::Lt => Cmp::Lt,
                            TokenKind::Eq => Cmp::Eq,
                            other => {
                                return Err(self.unexpected_operand(
                                    op,
                                    "a comparison operator (`>`, `<` or `=`)",
                                    other,
                                    t,
                                ))
                            }
                        };
                        rest = tail;
                        cmp
                    }
                    None => {
                        return Err(self.missing_operand(
                            op,
                            "a comparison, a threshold and an instruction",
                            first,
                        ))
                    }
                };
                self.program.tokens.push(Token::Cmp(cmp));
                let threshold = self.expect_int(op, first, &mut rest)?;
                self.program.tokens.push(Token::Int(threshold));
                // The conditional instruction is encoded inline right after,
                // so a taken IF simply falls through into it.
                if rest.is_empty() {
                    return Err(self.missing_operand(op, "an instruction to run when true", first));
                }
                return self.instruction(rest);
            }
            _ => {}
        }

        if let Some(extra) = rest.first() {
            return Err(self.trailing_tokens(extra, rest));
        }
        Ok(())
    }

    fn expect_int(
        &self,
        op: Op,
        at: &RawToken,
        rest: &mut &[RawToken],
    ) -> TokenizeResult<i64> {
        match rest.split_first() {
            Some((t, tail)) => match t.kind() {
                TokenKind::Integer(i) => {
                    *rest = tail;
                    Ok(*i)
                }
                other => Err(self.unexpected_operand(op, "an integer", other, t)),
            },
            None => Err(self.missing_operand(op, "an integer operand", at)),
        }
    }

    fn expect_string(
        &self,
        op: Op,
        at: &RawToken,
        rest: &mut &[RawToken],
    ) -> TokenizeResult<String> {
        match rest.split_first() {
            Some((t, tail)) => match t.kind() {
                TokenKind::StringLiteral(s) => {
                    *rest = tail;
                    Ok(s.clone())
                }
                other => Err(self.unexpected_operand(op, "a quoted string", other, t)),
            },
            None => Err(self.missing_operand(op, "a quoted string operand", at)),
        }
    }

    fn expect_label(
        &mut self,
        op: Op,
        at: &RawToken,
        rest: &mut &[RawToken],
    ) -> TokenizeResult<String> {
        match rest.split_first() {
            Some((t, tail)) => match t.kind() {
                TokenKind::Word(w) => {
                    *rest = tail;
                    self.label_refs.push((w.clone(), t.span()));
                    Ok(w.clone())
                }
                other => Err(self.unexpected_operand(op, "a label name", other, t)),
            },
            None => Err(self.missing_operand(op, "a label operand", at)),
        }
    }

    fn missing_operand(&self, op: Op, expected: &'static str, at: &RawToken) -> TokenizeError {
        MissingOperandError {
            opcode: op.mnemonic(),
            expected,
            span: to_source_span(at.span()),
            src: self.source.to_string(),
        }
        .into()
    }

    fn unexpected_operand(
        &self,
        op: Op,
        expected: &'static str,
        found: &TokenKind,
        at: &RawToken,
    ) -> TokenizeError {
        UnexpectedOperandError {
            opcode: op.mnemonic(),
            expected,
            found: found.to_string(),
            span: to_source_span(at.span()),
            src: self.source.to_string(),
        }
        .into()
    }

    fn trailing_tokens(&self, from: &RawToken, rest: &[RawToken]) -> TokenizeError {
        let end = rest.last().map(|t| t.span().end).unwrap_or(from.span().end);
        TrailingTokensError {
            span: to_source_span(from.span().start..end),
            src: self.source.to_string(),
        }
        .into()
    }
}
