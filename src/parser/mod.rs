use std::rc::Rc;

use crate::ast::*;
use crate::lexer::Token;

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
    next_id: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: &'static str,
    pub span: Span,
    pub message: String,
}

type Result<T> = std::result::Result<T, ParseError>;

/// Number of binary precedence levels handled by `parse_binary`; the level
/// after the last one is `**`.
const BINARY_LEVELS: usize = 10;

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<(Token, Span)>) -> Self {
        Parser { source, tokens, pos: 0, next_id: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, s)) => *s,
            None => self.eof_span(),
        }
    }

    fn eof_span(&self) -> Span {
        match self.tokens.last() {
            Some((_, s)) => Span {
                start: s.end,
                end: s.end,
                line: s.line,
                column: s.column + (s.end - s.start) as u32,
            },
            None => Span { start: 0, end: 0, line: 1, column: 0 },
        }
    }

    fn advance(&mut self) -> Span {
        let span = self.peek_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    fn expect(&mut self, expected: &Token) -> Result<Span> {
        match self.peek() {
            Some(tok) if tok == expected => Ok(self.advance()),
            _ => Err(self.unexpected()),
        }
    }

    /// `Unexpected token` error at the current token, or at end of input.
    fn unexpected(&self) -> ParseError {
        let span = self.peek_span();
        let text = match self.tokens.get(self.pos) {
            Some(_) => &self.source[span.start..span.end],
            None => "<EOF>",
        };
        ParseError {
            code: "LE-S001",
            span,
            message: format!("Unexpected token `{text}`"),
        }
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    // ---- Top level ----

    pub fn parse_program(&mut self) -> Result<Program> {
        let body = if self.peek().is_none() {
            None
        } else {
            Some(Rc::new(self.parse_expr()?))
        };
        if self.peek().is_some() {
            return Err(self.unexpected());
        }
        Ok(Program { body, source: Some(self.source.to_string()) })
    }

    // ---- Expressions ----

    fn parse_expr(&mut self) -> Result<Node> {
        self.parse_seq()
    }

    fn parse_seq(&mut self) -> Result<Node> {
        let mut left = self.parse_assign()?;
        while self.peek() == Some(&Token::Semi) {
            let semi = self.advance();
            if !self.can_start_expr() {
                let span = left.span.merge(semi);
                left = Spanned::new(Expr::Term(Box::new(left)), span);
                break;
            }
            let right = self.parse_assign()?;
            let span = left.span.merge(right.span);
            left = Spanned::new(
                Expr::Binary {
                    op: Spanned::new(BinaryOp::Seq, semi),
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn can_start_expr(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Ident(_)
                    | Token::Int(_)
                    | Token::Hex(_)
                    | Token::Double(_)
                    | Token::Str(_)
                    | Token::LParen
                    | Token::LBracket
                    | Token::LBrace
                    | Token::Bang
                    | Token::Tilde
                    | Token::Plus
                    | Token::Minus
                    | Token::PlusPlus
                    | Token::MinusMinus
            )
        )
    }

    fn parse_assign(&mut self) -> Result<Node> {
        let target = self.parse_ternary()?;
        let Some(op) = self.peek().and_then(assign_op) else {
            return Ok(target);
        };
        if !target.is_var() {
            return Err(self.unexpected());
        }
        let op_span = self.advance();
        let value = self.parse_assign()?;
        let span = target.span.merge(value.span);
        Ok(Spanned::new(
            Expr::Assign {
                op: Spanned::new(op, op_span),
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_ternary(&mut self) -> Result<Node> {
        let condition = self.parse_binary(0)?;
        if self.peek() != Some(&Token::Question) {
            return Ok(condition);
        }
        let op = self.advance();
        let then = self.parse_assign()?;
        self.expect(&Token::Colon)?;
        let otherwise = self.parse_assign()?;
        let span = condition.span.merge(otherwise.span);
        Ok(Spanned::new(
            Expr::Ternary {
                op,
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            span,
        ))
    }

    /// Left-associative binary operators, loosest level first.
    fn parse_binary(&mut self, level: usize) -> Result<Node> {
        if level == BINARY_LEVELS {
            return self.parse_power();
        }
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek().and_then(|t| binary_op(level, t)) {
            let op_span = self.advance();
            let right = self.parse_binary(level + 1)?;
            let span = left.span.merge(right.span);
            left = Spanned::new(
                Expr::Binary {
                    op: Spanned::new(op, op_span),
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Node> {
        let base = self.parse_unary()?;
        if self.peek() != Some(&Token::StarStar) {
            return Ok(base);
        }
        let op_span = self.advance();
        let exponent = self.parse_power()?;
        let span = base.span.merge(exponent.span);
        Ok(Spanned::new(
            Expr::Binary {
                op: Spanned::new(BinaryOp::Pow, op_span),
                left: Box::new(base),
                right: Box::new(exponent),
            },
            span,
        ))
    }

    fn parse_unary(&mut self) -> Result<Node> {
        let unary = match self.peek() {
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Tilde) => Some(UnaryOp::Inv),
            Some(Token::Plus) => Some(UnaryOp::Pos),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = unary {
            let op_span = self.advance();
            let operand = self.parse_unary()?;
            let span = op_span.merge(operand.span);
            return Ok(Spanned::new(
                Expr::Unary { op: Spanned::new(op, op_span), operand: Box::new(operand) },
                span,
            ));
        }

        let step = match self.peek() {
            Some(Token::PlusPlus) => Some(StepOp::Inc),
            Some(Token::MinusMinus) => Some(StepOp::Dec),
            _ => None,
        };
        if let Some(op) = step {
            let op_span = self.advance();
            if !matches!(self.peek(), Some(Token::Ident(_))) {
                return Err(self.unexpected());
            }
            let target = self.parse_var()?;
            let span = op_span.merge(target.span);
            return Ok(Spanned::new(
                Expr::Prefix { op: Spanned::new(op, op_span), target: Box::new(target) },
                span,
            ));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Node> {
        if !matches!(self.peek(), Some(Token::Ident(_))) {
            return self.parse_primary();
        }
        let var = self.parse_var()?;
        match self.peek() {
            Some(Token::PlusPlus) | Some(Token::MinusMinus) => {
                let op = if self.peek() == Some(&Token::PlusPlus) { StepOp::Inc } else { StepOp::Dec };
                let op_span = self.advance();
                let span = var.span.merge(op_span);
                Ok(Spanned::new(
                    Expr::Postfix { op: Spanned::new(op, op_span), target: Box::new(var) },
                    span,
                ))
            }
            Some(Token::LParen) => {
                self.advance();
                let (args, close) = self.parse_list(&Token::RParen)?;
                let span = var.span.merge(close);
                let text = self.source[span.start..span.end].to_string();
                Ok(Spanned::new(
                    Expr::Call {
                        callee: Box::new(var),
                        args: args.into_iter().map(Rc::new).collect(),
                        text,
                    },
                    span,
                ))
            }
            _ => Ok(var),
        }
    }

    /// `ID ('.' ID | '[' expr ']')*`
    fn parse_var(&mut self) -> Result<Node> {
        let mut node = match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                let span = self.advance();
                Spanned::new(Expr::Var(name), span)
            }
            _ => return Err(self.unexpected()),
        };
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let Some(Token::Ident(member)) = self.peek().cloned() else {
                        return Err(self.unexpected());
                    };
                    let member_span = self.advance();
                    let span = node.span.merge(member_span);
                    node = Spanned::new(Expr::Member { base: Box::new(node), member }, span);
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let close = self.expect(&Token::RBracket)?;
                    let span = node.span.merge(close);
                    node = Spanned::new(Expr::Index { base: Box::new(node), index: Box::new(index) }, span);
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Node> {
        match self.peek().cloned() {
            Some(Token::Int(text)) => {
                let span = self.advance();
                Ok(Spanned::new(Expr::Int { id: self.next_id(), text }, span))
            }
            Some(Token::Hex(text)) => {
                let span = self.advance();
                Ok(Spanned::new(Expr::Hex { id: self.next_id(), text }, span))
            }
            Some(Token::Double(text)) => {
                let span = self.advance();
                Ok(Spanned::new(Expr::Double { id: self.next_id(), text }, span))
            }
            Some(Token::Str(text)) => {
                let span = self.advance();
                Ok(Spanned::new(Expr::String { id: self.next_id(), text }, span))
            }
            Some(Token::LBracket) => {
                let open = self.advance();
                let (items, close) = self.parse_list(&Token::RBracket)?;
                Ok(Spanned::new(Expr::Array(items), open.merge(close)))
            }
            Some(Token::LBrace) => {
                let open = self.advance();
                let (pairs, close) = self.parse_pairs()?;
                Ok(Spanned::new(Expr::Object(pairs), open.merge(close)))
            }
            Some(Token::LParen) => {
                let open = self.advance();
                let inner = self.parse_expr()?;
                let close = self.expect(&Token::RParen)?;
                Ok(Spanned::new(Expr::Paren(Box::new(inner)), open.merge(close)))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    /// Returns the span of the closing token.
    fn parse_list(&mut self, close: &Token) -> Result<(Vec<Node>, Span)> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(close) {
                return Ok((items, self.advance()));
            }
            items.push(self.parse_expr()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(tok) if tok == close => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_pairs(&mut self) -> Result<(Vec<(String, Node)>, Span)> {
        let mut pairs = Vec::new();
        loop {
            match self.peek().cloned() {
                Some(Token::RBrace) => return Ok((pairs, self.advance())),
                Some(Token::Ident(key)) => {
                    self.advance();
                    self.expect(&Token::Colon)?;
                    let value = self.parse_expr()?;
                    pairs.push((key, value));
                }
                _ => return Err(self.unexpected()),
            }
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RBrace) => {}
                _ => return Err(self.unexpected()),
            }
        }
    }
}

fn binary_op(level: usize, token: &Token) -> Option<BinaryOp> {
    let op = match (level, token) {
        (0, Token::PipePipe) => BinaryOp::Or,
        (1, Token::AmpAmp) => BinaryOp::And,
        (2, Token::Pipe) => BinaryOp::BitOr,
        (3, Token::Caret) => BinaryOp::BitXor,
        (4, Token::Amp) => BinaryOp::BitAnd,
        (5, Token::EqEq) => BinaryOp::Eq,
        (5, Token::NotEq) => BinaryOp::Ne,
        (6, Token::Less) => BinaryOp::Lt,
        (6, Token::LessEq) => BinaryOp::Le,
        (6, Token::Greater) => BinaryOp::Gt,
        (6, Token::GreaterEq) => BinaryOp::Ge,
        (7, Token::Shl) => BinaryOp::Shl,
        (7, Token::Asr) => BinaryOp::Asr,
        (7, Token::Shr) => BinaryOp::Shr,
        (8, Token::Plus) => BinaryOp::Add,
        (8, Token::Minus) => BinaryOp::Sub,
        (9, Token::Star) => BinaryOp::Mul,
        (9, Token::Slash) => BinaryOp::Div,
        (9, Token::Percent) => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn assign_op(token: &Token) -> Option<AssignOp> {
    let op = match token {
        Token::Assign => AssignOp::Assign,
        Token::StarStarEq => AssignOp::Compound(BinaryOp::Pow),
        Token::StarEq => AssignOp::Compound(BinaryOp::Mul),
        Token::SlashEq => AssignOp::Compound(BinaryOp::Div),
        Token::PercentEq => AssignOp::Compound(BinaryOp::Mod),
        Token::PlusEq => AssignOp::Compound(BinaryOp::Add),
        Token::MinusEq => AssignOp::Compound(BinaryOp::Sub),
        Token::ShlEq => AssignOp::Compound(BinaryOp::Shl),
        Token::AsrEq => AssignOp::Compound(BinaryOp::Asr),
        Token::ShrEq => AssignOp::Compound(BinaryOp::Shr),
        Token::AmpEq => AssignOp::Compound(BinaryOp::BitAnd),
        Token::CaretEq => AssignOp::Compound(BinaryOp::BitXor),
        Token::PipeEq => AssignOp::Compound(BinaryOp::BitOr),
        Token::AmpAmpEq => AssignOp::AndAssign,
        Token::PipePipeEq => AssignOp::OrAssign,
        _ => return None,
    };
    Some(op)
}

/// Parse a lexed token stream into a program.
pub fn parse(source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    Parser::new(source, tokens).parse_program()
}
