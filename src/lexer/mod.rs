use logos::Logos;

use crate::ast::{SourceMap, Span};

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    // Grouping and separators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,

    // Unary and step operators
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // Binary operators
    #[token("**")]
    StarStar,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Asr,
    #[token(">>>")]
    Shr,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEq,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("&")]
    Amp,
    #[token("^")]
    Caret,
    #[token("|")]
    Pipe,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // Assignment
    #[token("=")]
    Assign,
    #[token("**=")]
    StarStarEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    AsrEq,
    #[token(">>>=")]
    ShrEq,
    #[token("&=")]
    AmpEq,
    #[token("^=")]
    CaretEq,
    #[token("|=")]
    PipeEq,
    #[token("&&=")]
    AmpAmpEq,
    #[token("||=")]
    PipePipeEq,

    // Literals keep their source text; the value codec decodes them.
    #[regex(r"0[xX][0-9A-Fa-f]+", |lex| lex.slice().to_string())]
    Hex(String),

    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    Int(String),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().to_string())]
    Double(String),

    #[regex(r#""([^"\\]|\\(.|\r|\n))*""#, |lex| lex.slice().to_string())]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Lex source code into a stream of tokens, each with its span.
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let map = SourceMap::new(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = map.span(range.clone());
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let snippet = source[range].to_string();
                return Err(LexError {
                    suggestion: suggest_fix(&snippet),
                    snippet,
                    span,
                });
            }
        }
    }

    Ok(tokens)
}

fn suggest_fix(bad_token: &str) -> Option<String> {
    match bad_token.chars().next() {
        Some('\'') => Some("string literals use double quotes".to_string()),
        Some('"') => Some("this string literal is never closed".to_string()),
        Some('#') => Some("comments use `//` or `/* ... */`".to_string()),
        Some('/') if bad_token.starts_with("/*") => Some("this block comment is never closed".to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unexpected token `{snippet}`")]
pub struct LexError {
    pub snippet: String,
    pub span: Span,
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn lex_assignment() {
        assert_eq!(
            kinds("x = 1 + 2"),
            vec![
                Token::Ident("x".into()),
                Token::Assign,
                Token::Int("1".into()),
                Token::Plus,
                Token::Int("2".into()),
            ]
        );
    }

    #[test]
    fn lex_longest_operator_wins() {
        assert_eq!(kinds(">>>= >>> >> >="), vec![Token::ShrEq, Token::Shr, Token::Asr, Token::GreaterEq]);
        assert_eq!(kinds("**= ** *"), vec![Token::StarStarEq, Token::StarStar, Token::Star]);
        assert_eq!(kinds("&&= && &= &"), vec![Token::AmpAmpEq, Token::AmpAmp, Token::AmpEq, Token::Amp]);
    }

    #[test]
    fn lex_numbers() {
        assert_eq!(kinds("0x1F"), vec![Token::Hex("0x1F".into())]);
        assert_eq!(kinds("42"), vec![Token::Int("42".into())]);
        assert_eq!(kinds("3.25"), vec![Token::Double("3.25".into())]);
        assert_eq!(kinds("1e3"), vec![Token::Double("1e3".into())]);
        assert_eq!(kinds(".5"), vec![Token::Double(".5".into())]);
    }

    #[test]
    fn lex_string_keeps_escapes_raw() {
        let src = r#""a\"b\n""#;
        assert_eq!(kinds(src), vec![Token::Str(src.to_string())]);
    }

    #[test]
    fn lex_comments_ignored() {
        let src = "// leading\na /* inline */ + /** stars **/ b";
        assert_eq!(
            kinds(src),
            vec![Token::Ident("a".into()), Token::Plus, Token::Ident("b".into())]
        );
    }

    #[test]
    fn lex_member_chain() {
        assert_eq!(
            kinds("a.b[0]"),
            vec![
                Token::Ident("a".into()),
                Token::Dot,
                Token::Ident("b".into()),
                Token::LBracket,
                Token::Int("0".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn lex_spans_carry_line_and_column() {
        let tokens = lex("a;\n  bb").unwrap();
        let (tok, span) = &tokens[2];
        assert_eq!(*tok, Token::Ident("bb".into()));
        assert_eq!((span.line, span.column), (2, 2));
        assert_eq!((span.start, span.end), (5, 7));
    }

    #[test]
    fn lex_error_reports_snippet() {
        let err = lex("1 + @").unwrap_err();
        assert_eq!(err.snippet, "@");
        assert_eq!(err.span.column, 4);
        assert_eq!(err.to_string(), "Unexpected token `@`");
    }

    #[test]
    fn lex_error_suggests_double_quotes() {
        let err = lex("'x'").unwrap_err();
        assert!(err.suggestion.unwrap().contains("double quotes"));
    }
}
