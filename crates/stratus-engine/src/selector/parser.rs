//! Pratt parser producing an [`Ast`] from a token stream.

use serde_json::Value;
use stratus_core::errors::SelectorError;

use super::ast::{Ast, Comparator};
use super::lexer::{tokenize, Token, PROJECTION_STOP};

/// Parse a query expression.
pub fn parse(query: &str) -> Result<Ast, SelectorError> {
    let tokens = tokenize(query)?;
    let mut parser = Parser {
        query,
        tokens,
        pos: 0,
    };
    let ast = parser.expression(0)?;
    match parser.peek() {
        Token::Eof => Ok(ast),
        other => Err(parser.error(format!("unexpected trailing token {other:?}"))),
    }
}

struct Parser<'q> {
    query: &'q str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        self.tokens
            .get(self.pos + ahead)
            .map(|(_, t)| t)
            .unwrap_or(&Token::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.query.len())
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: String) -> SelectorError {
        SelectorError::Syntax {
            query: self.query.to_string(),
            offset: self.offset(),
            message,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), SelectorError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}, found {:?}", self.peek())))
        }
    }

    fn expression(&mut self, rbp: usize) -> Result<Ast, SelectorError> {
        let token = self.advance();
        let mut left = self.nud(token)?;
        while rbp < self.peek().lbp() {
            let token = self.advance();
            left = self.led(token, left)?;
        }
        Ok(left)
    }

    fn nud(&mut self, token: Token) -> Result<Ast, SelectorError> {
        match token {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => Ok(Ast::Field(name)),
            Token::Literal(value) => Ok(Ast::Literal(value)),
            Token::At => Ok(Ast::Identity),
            Token::Star => {
                let rhs = self.projection_rhs(Token::Star.lbp())?;
                Ok(Ast::Projection {
                    lhs: Box::new(Ast::ObjectValues(Box::new(Ast::Identity))),
                    rhs: Box::new(rhs),
                })
            }
            Token::Flatten => {
                let rhs = self.projection_rhs(Token::Flatten.lbp())?;
                Ok(Ast::Projection {
                    lhs: Box::new(Ast::Flatten(Box::new(Ast::Identity))),
                    rhs: Box::new(rhs),
                })
            }
            Token::Filter => self.filter(Ast::Identity),
            Token::Lbracket => match self.peek() {
                Token::Number(_) | Token::Colon => self.index_or_slice(Ast::Identity),
                Token::Star if *self.peek_at(1) == Token::Rbracket => {
                    self.advance();
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    Ok(Ast::Projection {
                        lhs: Box::new(Ast::Identity),
                        rhs: Box::new(rhs),
                    })
                }
                _ => self.multi_list(),
            },
            Token::Lbrace => self.multi_hash(),
            Token::Lparen => {
                let inner = self.expression(0)?;
                self.expect(Token::Rparen)?;
                Ok(inner)
            }
            Token::Not => {
                let inner = self.expression(Token::Not.lbp())?;
                Ok(Ast::Not(Box::new(inner)))
            }
            Token::Ampersand => {
                let inner = self.expression(0)?;
                Ok(Ast::Expref(Box::new(inner)))
            }
            other => Err(self.error(format!("unexpected token {other:?}"))),
        }
    }

    fn led(&mut self, token: Token, left: Ast) -> Result<Ast, SelectorError> {
        match token {
            Token::Dot => {
                if *self.peek() == Token::Star {
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    return Ok(Ast::Projection {
                        lhs: Box::new(Ast::ObjectValues(Box::new(left))),
                        rhs: Box::new(rhs),
                    });
                }
                let rhs = self.dot_rhs()?;
                Ok(Ast::Subexpr(Box::new(left), Box::new(rhs)))
            }
            Token::Pipe => {
                let rhs = self.expression(Token::Pipe.lbp())?;
                Ok(Ast::Subexpr(Box::new(left), Box::new(rhs)))
            }
            Token::Or => {
                let rhs = self.expression(Token::Or.lbp())?;
                Ok(Ast::Or(Box::new(left), Box::new(rhs)))
            }
            Token::And => {
                let rhs = self.expression(Token::And.lbp())?;
                Ok(Ast::And(Box::new(left), Box::new(rhs)))
            }
            Token::Eq => self.comparison(Comparator::Eq, left),
            Token::Ne => self.comparison(Comparator::Ne, left),
            Token::Lt => self.comparison(Comparator::Lt, left),
            Token::Lte => self.comparison(Comparator::Lte, left),
            Token::Gt => self.comparison(Comparator::Gt, left),
            Token::Gte => self.comparison(Comparator::Gte, left),
            Token::Flatten => {
                let rhs = self.projection_rhs(Token::Flatten.lbp())?;
                Ok(Ast::Projection {
                    lhs: Box::new(Ast::Flatten(Box::new(left))),
                    rhs: Box::new(rhs),
                })
            }
            Token::Filter => self.filter(left),
            Token::Lbracket => match self.peek() {
                Token::Number(_) | Token::Colon => self.index_or_slice(left),
                Token::Star => {
                    self.advance();
                    self.expect(Token::Rbracket)?;
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    Ok(Ast::Projection {
                        lhs: Box::new(left),
                        rhs: Box::new(rhs),
                    })
                }
                other => Err(self.error(format!("unexpected token {other:?} after `[`"))),
            },
            Token::Lparen => {
                let name = match left {
                    Ast::Field(name) => name,
                    _ => return Err(self.error("only identifiers can be called".into())),
                };
                let mut args = Vec::new();
                while *self.peek() != Token::Rparen {
                    args.push(self.expression(0)?);
                    match self.peek() {
                        Token::Comma => {
                            self.advance();
                        }
                        Token::Rparen => {}
                        other => {
                            return Err(self.error(format!("expected `,` or `)`, found {other:?}")))
                        }
                    }
                }
                self.expect(Token::Rparen)?;
                Ok(Ast::Function { name, args })
            }
            other => Err(self.error(format!("unexpected token {other:?}"))),
        }
    }

    fn comparison(&mut self, op: Comparator, left: Ast) -> Result<Ast, SelectorError> {
        let rhs = self.expression(Token::Eq.lbp())?;
        Ok(Ast::Compare {
            op,
            lhs: Box::new(left),
            rhs: Box::new(rhs),
        })
    }

    /// Right-hand side of `.`: an identifier, multi-select, or function call.
    fn dot_rhs(&mut self) -> Result<Ast, SelectorError> {
        match self.peek() {
            Token::Identifier(_) | Token::QuotedIdentifier(_) | Token::Lbrace => {
                self.expression(Token::Dot.lbp())
            }
            Token::Lbracket => {
                self.advance();
                self.multi_list()
            }
            other => Err(self.error(format!("unexpected token {other:?} after `.`"))),
        }
    }

    /// Everything a projection applies to each element.
    fn projection_rhs(&mut self, lbp: usize) -> Result<Ast, SelectorError> {
        let next = self.peek().clone();
        if next.lbp() < PROJECTION_STOP {
            return Ok(Ast::Identity);
        }
        match next {
            Token::Dot => {
                self.advance();
                self.dot_rhs_projected(lbp)
            }
            Token::Lbracket | Token::Filter => self.expression(lbp),
            other => Err(self.error(format!("unexpected token {other:?} in projection"))),
        }
    }

    fn dot_rhs_projected(&mut self, lbp: usize) -> Result<Ast, SelectorError> {
        let first = self.dot_rhs()?;
        let mut left = first;
        while lbp < self.peek().lbp() {
            let token = self.advance();
            left = self.led(token, left)?;
        }
        Ok(left)
    }

    fn filter(&mut self, left: Ast) -> Result<Ast, SelectorError> {
        let predicate = self.expression(0)?;
        self.expect(Token::Rbracket)?;
        let rhs = self.projection_rhs(Token::Filter.lbp())?;
        Ok(Ast::FilterProjection {
            lhs: Box::new(left),
            predicate: Box::new(predicate),
            rhs: Box::new(rhs),
        })
    }

    fn index_or_slice(&mut self, left: Ast) -> Result<Ast, SelectorError> {
        let mut parts: [Option<i64>; 3] = [None, None, None];
        let mut slot = 0;
        loop {
            match self.advance() {
                Token::Number(n) => parts[slot] = Some(n),
                Token::Colon if slot < 2 => slot += 1,
                Token::Rbracket => break,
                other => return Err(self.error(format!("unexpected token {other:?} in index"))),
            }
        }
        if slot == 0 {
            let index = parts[0].ok_or_else(|| self.error("empty index".into()))?;
            return Ok(Ast::Subexpr(Box::new(left), Box::new(Ast::Index(index))));
        }
        if parts[2] == Some(0) {
            return Err(self.error("slice step cannot be 0".into()));
        }
        let slice = Ast::Slice {
            start: parts[0],
            stop: parts[1],
            step: parts[2],
        };
        let rhs = self.projection_rhs(Token::Star.lbp())?;
        Ok(Ast::Projection {
            lhs: Box::new(Ast::Subexpr(Box::new(left), Box::new(slice))),
            rhs: Box::new(rhs),
        })
    }

    fn multi_list(&mut self) -> Result<Ast, SelectorError> {
        let mut items = Vec::new();
        loop {
            items.push(self.expression(0)?);
            match self.advance() {
                Token::Comma => continue,
                Token::Rbracket => break,
                other => return Err(self.error(format!("expected `,` or `]`, found {other:?}"))),
            }
        }
        Ok(Ast::MultiList(items))
    }

    fn multi_hash(&mut self) -> Result<Ast, SelectorError> {
        let mut pairs = Vec::new();
        loop {
            let key = match self.advance() {
                Token::Identifier(k) | Token::QuotedIdentifier(k) => k,
                Token::Literal(Value::String(k)) => k,
                other => return Err(self.error(format!("expected key, found {other:?}"))),
            };
            self.expect(Token::Colon)?;
            let value = self.expression(0)?;
            pairs.push((key, value));
            match self.advance() {
                Token::Comma => continue,
                Token::Rbrace => break,
                other => return Err(self.error(format!("expected `,` or `}}`, found {other:?}"))),
            }
        }
        Ok(Ast::MultiHash(pairs))
    }
}
