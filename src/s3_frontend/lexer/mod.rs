use crate::s3_frontend::lexer::token::{LexingError, Token, TokenKind};
use logos::Logos;
use std::ops::Range;

pub mod token;

/// Lexes a whole source file into spanned raw tokens.
///
/// Newlines are kept as tokens because S3 is line-oriented: the stream
/// builder needs them to delimit instructions. Comments (`#` to end of
/// line) and blank space are already gone at this level.
pub fn lex(source: &str) -> Result<Vec<Token>, (LexingError, Range<usize>)> {
    TokenKind::lexer(source)
        .spanned()
        .map(|(kind, span)| match kind {
            Ok(kind) => Ok(Token::new(span, kind)),
            Err(e) => Err((e, span)),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::token::TokenKind;
    use super::*;

    #[test]
    fn lex_instruction_lines() {
        let tokens = lex("PUSH -5\nPRINT \"hi there\" # comment\n").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word("PUSH".to_string()),
                TokenKind::Integer(-5),
                TokenKind::Newline,
                TokenKind::Word("PRINT".to_string()),
                TokenKind::StringLiteral("hi there".to_string()),
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn lex_label_and_dotted_mnemonic() {
        let tokens = lex("start:\nJUMP.IF.0 start").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LabelDecl("start".to_string()),
                TokenKind::Newline,
                TokenKind::Word("JUMP.IF.0".to_string()),
                TokenKind::Word("start".to_string()),
            ]
        );
    }

    #[test]
    fn lex_single_quoted_string() {
        let tokens = lex("PRINT 'it is \"quoted\"'").unwrap();
        assert_eq!(
            tokens[1].kind,
            TokenKind::StringLiteral("it is \"quoted\"".to_string())
        );
    }

    #[test]
    fn lex_unterminated_string_is_an_error() {
        assert!(lex("PRINT \"oops\n").is_err());
    }

    #[test]
    fn lex_comment_only_line_is_just_a_newline() {
        let tokens = lex("# just a comment\n").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Newline]);
    }
}
