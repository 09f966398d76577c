use crate::ast::{BinaryOp, Expression, Statement, UnaryOp};
use crate::frontend::lexer::{Span, Spanned};
use crate::frontend::parser_error::ParserError;
use crate::frontend::token::Token;

/// Recursive-descent parser for venom.
///
/// The parser consumes a stream of lexed `Spanned` tokens and produces a
/// list of top-level statements. Expressions use classic precedence
/// climbing: equality < comparison < term < factor < unary < primary.
///
/// Notes:
/// - Comments are filtered out in `Parser::new`.
/// - `ident = expr;` is an assignment statement; there are no bare
///   expression statements.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Span of the most recently consumed token.
    ///
    /// Used to provide stable source locations for errors that occur after
    /// advancing past the last token or at end-of-file.
    last_span: Option<Span>,
}

impl Parser {
    /// Creates a new parser from lexer output, filtering out comments.
    pub fn new(tokens: Vec<Spanned>) -> Self {
        let tokens: Vec<Spanned> = tokens
            .into_iter()
            .filter(|t| !matches!(t.token, Token::Comment(_)))
            .collect();
        Parser {
            tokens,
            pos: 0,
            last_span: None,
        }
    }

    /// Returns the current token without consuming it.
    fn current(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    /// Advances the token stream by one and returns the consumed token.
    fn advance(&mut self) -> Option<&Spanned> {
        if let Some(s) = self.tokens.get(self.pos) {
            self.last_span = Some(s.span.clone());
        }
        self.pos += 1;
        self.tokens.get(self.pos - 1)
    }

    /// Peeks the current token kind without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    /// Peeks the next token kind without consuming anything.
    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|s| &s.token)
    }

    /// Constructs a `ParserError` at the most relevant location.
    fn error(&self, message: &str) -> ParserError {
        if let Some(spanned) = self.current() {
            ParserError {
                message: message.to_string(),
                line: spanned.span.line,
                col: spanned.span.col,
            }
        } else if let Some(span) = &self.last_span {
            ParserError {
                message: message.to_string(),
                line: span.line,
                col: span.col,
            }
        } else {
            ParserError {
                message: message.to_string(),
                line: 1,
                col: 1,
            }
        }
    }

    /// Consumes the expected token kind or errors.
    fn expect(&mut self, expected: &Token, context: &str) -> Result<(), ParserError> {
        match self.peek() {
            Some(token) if token == expected => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(self.error(&format!(
                "expected {:?} {}, got {:?}",
                expected, context, token
            ))),
            None => Err(self.error(&format!("expected {:?} {}, got EOF", expected, context))),
        }
    }

    /// Consumes an identifier token and returns its name.
    fn expect_ident(&mut self, context: &str) -> Result<String, ParserError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            Some(token) => Err(self.error(&format!(
                "expected identifier {}, got {:?}",
                context, token
            ))),
            None => Err(self.error(&format!("expected identifier {}, got EOF", context))),
        }
    }

    /// Parses a complete venom program: a list of statements up to EOF.
    pub fn parse(&mut self) -> Result<Vec<Statement>, ParserError> {
        let mut statements = Vec::new();

        while let Some(spanned) = self.current() {
            if matches!(spanned.token, Token::Eof) {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        match self.peek() {
            Some(Token::Print) => self.parse_print(),
            Some(Token::Let) => self.parse_let(),
            Some(Token::If) => self.parse_if(),
            Some(Token::LBrace) => self.parse_block(),
            Some(Token::Fn) => self.parse_fn(),
            Some(Token::Return) => self.parse_return(),
            Some(Token::Ident(_)) if self.peek_next() == Some(&Token::Assign) => {
                self.parse_assign()
            }
            Some(token) => Err(self.error(&format!("expected statement, got {:?}", token))),
            None => Err(self.error("expected statement, got EOF")),
        }
    }

    fn parse_print(&mut self) -> Result<Statement, ParserError> {
        self.advance();
        let expr = self.parse_expression()?;
        self.expect(&Token::Semicolon, "after print statement")?;
        Ok(Statement::Print(expr))
    }

    fn parse_let(&mut self) -> Result<Statement, ParserError> {
        self.advance();
        let name = self.expect_ident("after 'let'")?;
        self.expect(&Token::Assign, "after variable name")?;
        let value = self.parse_expression()?;
        self.expect(&Token::Semicolon, "after let statement")?;
        Ok(Statement::Let { name, value })
    }

    fn parse_assign(&mut self) -> Result<Statement, ParserError> {
        let name = self.expect_ident("in assignment")?;
        self.expect(&Token::Assign, "in assignment")?;
        let value = self.parse_expression()?;
        self.expect(&Token::Semicolon, "after assignment")?;
        Ok(Statement::Assign { name, value })
    }

    fn parse_if(&mut self) -> Result<Statement, ParserError> {
        self.advance();
        self.expect(&Token::LParen, "after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RParen, "after if condition")?;

        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.peek() == Some(&Token::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_block(&mut self) -> Result<Statement, ParserError> {
        self.advance();
        let mut statements = Vec::new();

        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.advance();
                    return Ok(Statement::Block(statements));
                }
                Some(Token::Eof) | None => {
                    return Err(self.error("unterminated block (missing '}')"));
                }
                _ => statements.push(self.parse_statement()?),
            }
        }
    }

    fn parse_fn(&mut self) -> Result<Statement, ParserError> {
        self.advance();
        let name = self.expect_ident("after 'fn'")?;
        self.expect(&Token::LParen, "after function name")?;

        let mut params = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                params.push(self.expect_ident("in parameter list")?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "after parameter list")?;

        let body = match self.parse_block()? {
            Statement::Block(statements) => statements,
            _ => unreachable!("parse_block always yields a block"),
        };

        Ok(Statement::Fn { name, params, body })
    }

    fn parse_return(&mut self) -> Result<Statement, ParserError> {
        self.advance();
        let expr = self.parse_expression()?;
        self.expect(&Token::Semicolon, "after return statement")?;
        Ok(Statement::Return(expr))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_comparison()?;

        while let Some(op) = match self.peek() {
            Some(Token::EqEq) => Some(BinaryOp::EqEq),
            Some(Token::NotEq) => Some(BinaryOp::NotEq),
            _ => None,
        } {
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_term()?;

        while let Some(op) = match self.peek() {
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::LtEq) => Some(BinaryOp::LtEq),
            Some(Token::GtEq) => Some(BinaryOp::GtEq),
            _ => None,
        } {
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_factor()?;

        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            Some(Token::Percent) => Some(BinaryOp::Mod),
            _ => None,
        } {
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParserError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Negate),
            Some(Token::Bang) => Some(UnaryOp::Not),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_unary()?;
            return Ok(Expression::Unary {
                op,
                rhs: Box::new(rhs),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, ParserError> {
        let token = match self.current() {
            Some(spanned) => spanned.token.clone(),
            None => return Err(self.error("expected expression, got EOF")),
        };

        match token {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Number(n))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::Str(s))
            }
            Token::True => {
                self.advance();
                Ok(Expression::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::Bool(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Null)
            }
            Token::Ident(name) => {
                self.advance();
                if self.peek() == Some(&Token::LParen) {
                    self.parse_call(name)
                } else {
                    Ok(Expression::Variable(name))
                }
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen, "after grouped expression")?;
                Ok(expr)
            }
            other => Err(self.error(&format!("expected expression, got {:?}", other))),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expression, ParserError> {
        self.expect(&Token::LParen, "in call")?;

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "after call arguments")?;

        Ok(Expression::Call { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn parse(source: &str) -> Vec<Statement> {
        let tokens = Lexer::new(source).tokenize().expect("lexing should succeed");
        Parser::new(tokens).parse().expect("parsing should succeed")
    }

    fn parse_err(source: &str) -> ParserError {
        let tokens = Lexer::new(source).tokenize().expect("lexing should succeed");
        Parser::new(tokens)
            .parse()
            .expect_err("parsing should fail")
    }

    #[test]
    fn test_parse_print() {
        assert_eq!(
            parse("print 42;"),
            vec![Statement::Print(Expression::Number(42.0))]
        );
    }

    #[test]
    fn test_parse_let_and_assign() {
        assert_eq!(
            parse("let x = 1; x = 2;"),
            vec![
                Statement::Let {
                    name: "x".to_string(),
                    value: Expression::Number(1.0),
                },
                Statement::Assign {
                    name: "x".to_string(),
                    value: Expression::Number(2.0),
                },
            ]
        );
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let stmts = parse("print 1 + 2 * 3;");
        let Statement::Print(Expression::Binary { op, lhs, rhs }) = &stmts[0] else {
            panic!("expected print of a binary expression");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert_eq!(**lhs, Expression::Number(1.0));
        assert!(matches!(
            **rhs,
            Expression::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_grouping_overrides_precedence() {
        // (1 + 2) * 3 parses as (1 + 2) * 3
        let stmts = parse("print (1 + 2) * 3;");
        let Statement::Print(Expression::Binary { op, lhs, .. }) = &stmts[0] else {
            panic!("expected print of a binary expression");
        };
        assert_eq!(*op, BinaryOp::Mul);
        assert!(matches!(
            **lhs,
            Expression::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unary_chain() {
        let stmts = parse("print --1;");
        let Statement::Print(Expression::Unary { op, rhs }) = &stmts[0] else {
            panic!("expected unary expression");
        };
        assert_eq!(*op, UnaryOp::Negate);
        assert!(matches!(
            **rhs,
            Expression::Unary {
                op: UnaryOp::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_if_else() {
        let stmts = parse("if (1 < 2) { print 1; } else { print 2; }");
        let Statement::If {
            condition,
            then_branch,
            else_branch,
        } = &stmts[0]
        else {
            panic!("expected if statement");
        };
        assert!(matches!(
            condition,
            Expression::Binary {
                op: BinaryOp::Lt,
                ..
            }
        ));
        assert!(matches!(**then_branch, Statement::Block(_)));
        assert!(else_branch.is_some());
    }

    #[test]
    fn test_parse_if_without_else() {
        let stmts = parse("if (true) { print 1; }");
        let Statement::If { else_branch, .. } = &stmts[0] else {
            panic!("expected if statement");
        };
        assert!(else_branch.is_none());
    }

    #[test]
    fn test_parse_fn_and_call() {
        let stmts = parse("fn add(a, b) { return a + b; } print add(2, 3);");
        let Statement::Fn { name, params, body } = &stmts[0] else {
            panic!("expected fn statement");
        };
        assert_eq!(name, "add");
        assert_eq!(params, &["a".to_string(), "b".to_string()]);
        assert_eq!(body.len(), 1);

        let Statement::Print(Expression::Call { name, args }) = &stmts[1] else {
            panic!("expected call expression");
        };
        assert_eq!(name, "add");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_parse_fn_no_params() {
        let stmts = parse("fn zero() { return 0; }");
        let Statement::Fn { params, .. } = &stmts[0] else {
            panic!("expected fn statement");
        };
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_missing_semicolon() {
        let err = parse_err("print 1");
        assert!(err.message.contains("Semicolon"));
    }

    #[test]
    fn test_parse_unterminated_block() {
        let err = parse_err("{ print 1;");
        assert!(err.message.contains("unterminated block"));
    }

    #[test]
    fn test_parse_bare_expression_rejected() {
        let err = parse_err("1 + 2;");
        assert!(err.message.contains("expected statement"));
    }

    #[test]
    fn test_parse_error_location() {
        let err = parse_err("let x 1;");
        assert_eq!(err.line, 1);
        assert_eq!(err.col, 7);
    }
}
