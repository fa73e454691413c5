use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::ast::{
    ident, BlockStatement, Expression, Ident, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::lexer::{Lexer, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {found} instead")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("no prefix parse function for {0} found")]
    NoPrefixRule(TokenKind),
    #[error("illegal character '{0}'")]
    IllegalCharacter(String),
    #[error("could not parse \"{0}\" as integer")]
    InvalidInteger(String),
}

type ParseResult<T> = Result<T, ParseError>;

/// Binding power of an infix position, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
            TokenKind::LParen | TokenKind::LBracket => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
    Some(match kind {
        TokenKind::Plus => InfixOperator::Plus,
        TokenKind::Minus => InfixOperator::Minus,
        TokenKind::Asterisk => InfixOperator::Asterisk,
        TokenKind::Slash => InfixOperator::Slash,
        TokenKind::Lt => InfixOperator::Lt,
        TokenKind::Gt => InfixOperator::Gt,
        TokenKind::Eq => InfixOperator::Eq,
        TokenKind::NotEq => InfixOperator::NotEq,
        _ => return None,
    })
}

/// Pratt parser over a token stream.
///
/// A failing statement records one error and parsing resumes on the next
/// token, so a single input can report several problems at once.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    peek: Token<'a>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    fn next_token(&mut self) {
        self.current = self.peek;
        self.peek = self.lexer.next_token();
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_is(kind) {
            self.next_token();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: kind,
                found: self.peek.kind,
            })
        }
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.current_is(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(statement) => program.statements.push(statement),
                Err(e) => {
                    debug!(error = %e, "syntax error");
                    self.errors.push(e);
                }
            }
            self.next_token();
        }
        program
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> ParseResult<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = ident(self.current.literal);
        self.expect_peek(TokenKind::Assign)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Statement::Expression(expression))
    }

    fn parse_block_statement(&mut self) -> ParseResult<BlockStatement> {
        let mut block = BlockStatement::default();
        self.next_token();
        while !self.current_is(TokenKind::RBrace) {
            if self.current_is(TokenKind::Eof) {
                return Err(ParseError::UnexpectedToken {
                    expected: TokenKind::RBrace,
                    found: TokenKind::Eof,
                });
            }
            block.statements.push(self.parse_statement()?);
            self.next_token();
        }
        Ok(block)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        let mut left = self.parse_prefix()?;
        while !self.peek_is(TokenKind::Semicolon) && precedence < Precedence::of(self.peek.kind) {
            self.next_token();
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expression> {
        match self.current.kind {
            TokenKind::Ident => Ok(Expression::Identifier(ident(self.current.literal))),
            TokenKind::Int => self
                .current
                .literal
                .parse()
                .map(Expression::Integer)
                .map_err(|_| ParseError::InvalidInteger(self.current.literal.to_string())),
            TokenKind::Str => Ok(Expression::Str(self.current.literal.to_string())),
            TokenKind::True => Ok(Expression::Boolean(true)),
            TokenKind::False => Ok(Expression::Boolean(false)),
            TokenKind::Bang => self.parse_prefix_expression(PrefixOperator::Bang),
            TokenKind::Minus => self.parse_prefix_expression(PrefixOperator::Minus),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::LBracket => Ok(Expression::Array(
                self.parse_expression_list(TokenKind::RBracket)?,
            )),
            TokenKind::Illegal => Err(ParseError::IllegalCharacter(
                self.current.literal.to_string(),
            )),
            kind => Err(ParseError::NoPrefixRule(kind)),
        }
    }

    fn parse_infix(&mut self, left: Expression) -> ParseResult<Expression> {
        match self.current.kind {
            TokenKind::LParen => Ok(Expression::Call {
                function: Box::new(left),
                arguments: self.parse_expression_list(TokenKind::RParen)?,
            }),
            TokenKind::LBracket => {
                self.next_token();
                let index = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RBracket)?;
                Ok(Expression::Index {
                    left: Box::new(left),
                    index: Box::new(index),
                })
            }
            kind => {
                let Some(operator) = infix_operator(kind) else {
                    return Ok(left);
                };
                let precedence = Precedence::of(kind);
                self.next_token();
                let right = self.parse_expression(precedence)?;
                Ok(Expression::Infix {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                })
            }
        }
    }

    fn parse_prefix_expression(&mut self, operator: PrefixOperator) -> ParseResult<Expression> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> ParseResult<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Ok(expression)
    }

    fn parse_if_expression(&mut self) -> ParseResult<Expression> {
        self.expect_peek(TokenKind::LParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::LBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expression> {
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block_statement()?;
        Ok(Expression::Function {
            parameters,
            body: Rc::new(body),
        })
    }

    fn parse_function_parameters(&mut self) -> ParseResult<Vec<Ident>> {
        let mut parameters = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Ok(parameters);
        }

        self.expect_peek(TokenKind::Ident)?;
        parameters.push(ident(self.current.literal));
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            parameters.push(ident(self.current.literal));
        }

        self.expect_peek(TokenKind::RParen)?;
        Ok(parameters)
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }
}

pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(parser.into_errors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_ok(input: &str) -> Program {
        match parse(input) {
            Ok(program) => program,
            Err(errors) => panic!("parser errors for {:?}: {:?}", input, errors),
        }
    }

    fn single_expression(input: &str) -> Expression {
        let mut program = parse_ok(input);
        assert_eq!(program.statements.len(), 1, "{:?}", program.statements);
        match program.statements.remove(0) {
            Statement::Expression(e) => e,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn error_messages(input: &str) -> Vec<String> {
        parse(input)
            .expect_err("expected parser errors")
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn let_statements() {
        let program = parse_ok("let x = 5; let y = true; let foobar = y");
        let rendered: Vec<String> = program.statements.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["let x = 5;", "let y = true;", "let foobar = y;"]
        );
    }

    #[test]
    fn return_statements() {
        let program = parse_ok("return 5; return 10; return add(15);");
        assert_eq!(program.statements.len(), 3);
        assert!(program
            .statements
            .iter()
            .all(|s| matches!(s, Statement::Return(_))));
        assert_eq!(program.to_string(), "return 5;return 10;return add(15);");
    }

    #[test]
    fn literal_expressions() {
        assert_eq!(single_expression("foobar;"), Expression::Identifier(ident("foobar")));
        assert_eq!(single_expression("5;"), Expression::Integer(5));
        assert_eq!(single_expression("false"), Expression::Boolean(false));
        assert_eq!(
            single_expression(r#""hello world";"#),
            Expression::Str("hello world".to_string())
        );
    }

    #[test]
    fn prefix_expressions() {
        assert_eq!(
            single_expression("-15"),
            Expression::Prefix {
                operator: PrefixOperator::Minus,
                right: Box::new(Expression::Integer(15)),
            }
        );
        assert_eq!(single_expression("!true").to_string(), "(!true)");
    }

    #[test]
    fn infix_expressions() {
        let cases = [
            ("5 + 5;", InfixOperator::Plus),
            ("5 - 5;", InfixOperator::Minus),
            ("5 * 5;", InfixOperator::Asterisk),
            ("5 / 5;", InfixOperator::Slash),
            ("5 > 5;", InfixOperator::Gt),
            ("5 < 5;", InfixOperator::Lt),
            ("5 == 5;", InfixOperator::Eq),
            ("5 != 5;", InfixOperator::NotEq),
        ];
        for (input, operator) in cases {
            assert_eq!(
                single_expression(input),
                Expression::Infix {
                    left: Box::new(Expression::Integer(5)),
                    operator,
                    right: Box::new(Expression::Integer(5)),
                },
                "{}",
                input
            );
        }
    }

    #[test]
    fn operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4)((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("3 > 5 == false", "((3 > 5) == false)"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            ),
            (
                "add(a + b + c * d / f + g)",
                "add((((a + b) + ((c * d) / f)) + g))",
            ),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                "((a * ([1, 2, 3, 4][(b * c)])) * d)",
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_ok(input).to_string(), expected, "{}", input);
        }
    }

    #[test]
    fn if_expression() {
        match single_expression("if (x < y) { x }") {
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                assert_eq!(condition.to_string(), "(x < y)");
                assert_eq!(consequence.to_string(), "x");
                assert!(alternative.is_none());
            }
            other => panic!("expected if expression, got {:?}", other),
        }
    }

    #[test]
    fn if_else_expression() {
        match single_expression("if (x < y) { x } else { y; z }") {
            Expression::If { alternative, .. } => {
                let alternative = alternative.expect("missing alternative");
                assert_eq!(alternative.statements.len(), 2);
                assert_eq!(alternative.to_string(), "yz");
            }
            other => panic!("expected if expression, got {:?}", other),
        }
    }

    #[test]
    fn function_literal() {
        match single_expression("fn(x) { x + 2; }") {
            Expression::Function { parameters, body } => {
                assert_eq!(parameters.len(), 1);
                assert_eq!(parameters[0].as_str(), "x");
                assert_eq!(body.to_string(), "(x + 2)");
            }
            other => panic!("expected function literal, got {:?}", other),
        }
    }

    #[test]
    fn function_parameters() {
        let cases: [(&str, &[&str]); 3] = [
            ("fn() {};", &[]),
            ("fn(x) {};", &["x"]),
            ("fn(x, y, z) {};", &["x", "y", "z"]),
        ];
        for (input, expected) in cases {
            match single_expression(input) {
                Expression::Function { parameters, .. } => {
                    let names: Vec<&str> = parameters.iter().map(|p| p.as_str()).collect();
                    assert_eq!(names, expected);
                }
                other => panic!("expected function literal, got {:?}", other),
            }
        }
    }

    #[test]
    fn call_expression() {
        match single_expression("add(1, 2 * 3, 4 + 5);") {
            Expression::Call {
                function,
                arguments,
            } => {
                assert_eq!(*function, Expression::Identifier(ident("add")));
                let rendered: Vec<String> = arguments.iter().map(ToString::to_string).collect();
                assert_eq!(rendered, vec!["1", "(2 * 3)", "(4 + 5)"]);
            }
            other => panic!("expected call expression, got {:?}", other),
        }
    }

    #[test]
    fn array_and_index_expressions() {
        assert_eq!(
            single_expression("[1, 2 * 2, 3 + 3]").to_string(),
            "[1, (2 * 2), (3 + 3)]"
        );
        assert_eq!(single_expression("[]"), Expression::Array(vec![]));
        assert_eq!(
            single_expression("myArray[1 + 1]").to_string(),
            "(myArray[(1 + 1)])"
        );
    }

    #[test]
    fn reports_expected_token_and_keeps_going() {
        assert_eq!(
            error_messages("let = 5; let x 5; let 838383;"),
            vec![
                "expected next token to be IDENT, got = instead",
                "no prefix parse function for = found",
                "expected next token to be =, got INT instead",
                "expected next token to be IDENT, got INT instead",
            ]
        );
    }

    #[test]
    fn reports_missing_closing_delimiters() {
        assert_eq!(
            error_messages("add(1, 2"),
            vec!["expected next token to be ), got EOF instead"]
        );
        assert_eq!(
            error_messages("[1, 2"),
            vec!["expected next token to be ], got EOF instead"]
        );
        assert_eq!(
            error_messages("fn(x) { x"),
            vec!["expected next token to be }, got EOF instead"]
        );
    }

    #[test]
    fn reports_illegal_characters() {
        assert_eq!(error_messages("5 @ 3"), vec!["illegal character '@'"]);
    }

    #[test]
    fn reports_integer_overflow() {
        assert_eq!(
            error_messages("99999999999999999999"),
            vec!["could not parse \"99999999999999999999\" as integer"]
        );
    }

    #[test]
    fn semicolons_are_optional() {
        assert_eq!(parse_ok("let a = 1 let b = 2 a").statements.len(), 3);
    }
}
