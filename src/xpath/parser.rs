//! Recursive-descent parser over [`super::lexer::Token`]s, implementing the
//! standard XPath 1.0 grammar (spec §4.H "Grammar").
//!
//! Grounded in `petty-xpath1::parser`'s precedence-climbing shape (one
//! function per grammar production, lowest precedence first), adapted from
//! `nom` combinators over `&str` to a hand-written token-stream parser,
//! since this crate's lexer (unlike `petty-xpath1`'s) produces a discrete
//! token stream with axis/node-type/function-name already classified.

use super::ast::*;
use super::error::Error;
use super::lexer::{preprocess_abbreviations, Lexer, Token};

pub fn parse(input: &str) -> Result<Expression, Error> {
    let expanded = preprocess_abbreviations(input);
    let mut p = Parser::new(&expanded)?;
    let expr = p.parse_expr()?;
    if p.cur != Token::Eof {
        return Err(Error::TrailingInput(p.lexer.rest().to_string()));
    }
    Ok(expr)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(text);
        let cur = lexer.next_token()?;
        Ok(Parser { lexer, cur })
    }

    fn bump(&mut self) -> Result<Token, Error> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.cur, next))
    }

    fn expect(&mut self, tok: &Token) -> Result<(), Error> {
        if &self.cur == tok {
            self.bump()?;
            Ok(())
        } else {
            Err(Error::UnexpectedToken(format!("{:?}", self.cur)))
        }
    }

    fn parse_expr(&mut self) -> Result<Expression, Error> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_and()?;
        while self.is_keyword("or") {
            self.bump()?;
            let right = self.parse_and()?;
            left = Expression::BinaryOp { left: Box::new(left), op: BinaryOperator::Or, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_equality()?;
        while self.is_keyword("and") {
            self.bump()?;
            let right = self.parse_equality()?;
            left = Expression::BinaryOp { left: Box::new(left), op: BinaryOperator::And, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.cur {
                Token::Eq => BinaryOperator::Equals,
                Token::NotEq => BinaryOperator::NotEquals,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_relational()?;
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match &self.cur {
                Token::Lt => BinaryOperator::LessThan,
                Token::Le => BinaryOperator::LessThanOrEqual,
                Token::Gt => BinaryOperator::GreaterThan,
                Token::Ge => BinaryOperator::GreaterThanOrEqual,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_additive()?;
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.cur {
                Token::Plus => BinaryOperator::Plus,
                Token::Minus => BinaryOperator::Minus,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_multiplicative()?;
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.cur == Token::Star {
                BinaryOperator::Multiply
            } else if self.is_keyword("div") {
                BinaryOperator::Divide
            } else if self.is_keyword("mod") {
                BinaryOperator::Modulo
            } else {
                break;
            };
            self.bump()?;
            let right = self.parse_unary()?;
            left = Expression::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        if self.cur == Token::Minus {
            self.bump()?;
            let expr = self.parse_unary()?;
            return Ok(Expression::UnaryOp { op: UnaryOperator::Minus, expr: Box::new(expr) });
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_path()?;
        while self.cur == Token::Pipe {
            self.bump()?;
            let right = self.parse_path()?;
            left = Expression::BinaryOp { left: Box::new(left), op: BinaryOperator::Union, right: Box::new(right) };
        }
        Ok(left)
    }

    /// `PathExpr` → `LocationPath` | `FilterExpr ("/" RelativeLocationPath)?`
    fn parse_path(&mut self) -> Result<Expression, Error> {
        if self.starts_location_path() {
            return Ok(Expression::LocationPath(self.parse_location_path(None)?));
        }

        let primary = self.parse_primary()?;
        if self.cur == Token::Slash || self.cur == Token::DoubleSlash {
            let path = self.parse_location_path(Some(Box::new(primary)))?;
            return Ok(Expression::LocationPath(path));
        }
        Ok(primary)
    }

    fn starts_location_path(&self) -> bool {
        matches!(self.cur, Token::Slash | Token::DoubleSlash | Token::Axis(_) | Token::At | Token::Star)
            || matches!(&self.cur, Token::Name(_))
            || matches!(self.cur, Token::NodeType(_))
    }

    fn parse_location_path(&mut self, start_point: Option<Box<Expression>>) -> Result<LocationPath, Error> {
        let is_absolute = start_point.is_none() && matches!(self.cur, Token::Slash | Token::DoubleSlash);
        let mut steps = Vec::new();

        if start_point.is_none() {
            if self.cur == Token::DoubleSlash {
                self.bump()?;
                steps.push(Step {
                    axis: Axis::DescendantOrSelf,
                    node_test: NodeTest::NodeType(NodeTypeTest::Node),
                    predicates: vec![],
                });
                steps.push(self.parse_step()?);
            } else if self.cur == Token::Slash {
                self.bump()?;
                if self.starts_step() {
                    steps.push(self.parse_step()?);
                }
            } else {
                steps.push(self.parse_step()?);
            }
        }

        loop {
            if self.cur == Token::DoubleSlash {
                self.bump()?;
                steps.push(Step {
                    axis: Axis::DescendantOrSelf,
                    node_test: NodeTest::NodeType(NodeTypeTest::Node),
                    predicates: vec![],
                });
                steps.push(self.parse_step()?);
            } else if self.cur == Token::Slash {
                self.bump()?;
                steps.push(self.parse_step()?);
            } else {
                break;
            }
        }

        Ok(LocationPath { start_point, is_absolute, steps })
    }

    fn starts_step(&self) -> bool {
        matches!(self.cur, Token::Axis(_) | Token::At | Token::Star | Token::Name(_) | Token::NodeType(_))
    }

    fn parse_step(&mut self) -> Result<Step, Error> {
        let axis = match &self.cur {
            Token::Axis(a) => {
                let a = *a;
                self.bump()?;
                a
            }
            Token::At => {
                self.bump()?;
                Axis::Attribute
            }
            _ => Axis::Child,
        };

        let node_test = self.parse_node_test()?;

        let mut predicates = Vec::new();
        while self.cur == Token::LBracket {
            self.bump()?;
            predicates.push(self.parse_expr()?);
            self.expect(&Token::RBracket)?;
        }

        Ok(Step { axis, node_test, predicates })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, Error> {
        match self.bump()? {
            Token::Star => Ok(NodeTest::Wildcard),
            Token::NodeType(nt) => {
                self.expect(&Token::LParen)?;
                // processing-instruction() takes no argument in this engine.
                self.expect(&Token::RParen)?;
                Ok(NodeTest::NodeType(nt))
            }
            Token::Name(name) => Ok(NodeTest::Name(name)),
            other => Err(Error::UnexpectedToken(format!("{:?}", other))),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        match self.cur.clone() {
            Token::Variable(name) => {
                self.bump()?;
                Ok(Expression::Variable(name))
            }
            Token::Number(n) => {
                self.bump()?;
                Ok(Expression::Number(n))
            }
            Token::Literal(s) => {
                self.bump()?;
                Ok(Expression::Literal(s))
            }
            Token::LParen => {
                self.bump()?;
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::FunctionName(name) => {
                self.bump()?;
                self.expect(&Token::LParen)?;
                let mut args = Vec::new();
                if self.cur != Token::RParen {
                    args.push(self.parse_expr()?);
                    while self.cur == Token::Comma {
                        self.bump()?;
                        args.push(self.parse_expr()?);
                    }
                }
                self.expect(&Token::RParen)?;
                check_arity(&name, args.len())?;
                Ok(Expression::FunctionCall { name, args })
            }
            other => Err(Error::UnexpectedToken(format!("{:?}", other))),
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(&self.cur, Token::Name(n) if n == word)
    }
}

enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

/// Per-function arity constraints (spec §4.I core function table).
fn check_arity(name: &str, got: usize) -> Result<(), Error> {
    let arity = match name {
        "last" | "position" | "true" | "false" => Arity::Exact(0),
        "not" | "boolean" | "round" | "floor" | "ceiling" | "sum" | "count" | "id" | "lang" => Arity::Exact(1),
        "number" | "string-length" | "local-name" | "namespace-uri" | "name" | "normalize-space" | "string" => {
            Arity::Range(0, 1)
        }
        "starts-with" | "contains" | "substring-before" | "substring-after" => Arity::Exact(2),
        "substring" => Arity::Range(2, 3),
        "translate" => Arity::Exact(3),
        "concat" => Arity::AtLeast(2),
        _ => return Err(Error::UnknownFunction(name.to_string())),
    };
    let ok = match arity {
        Arity::Exact(n) => got == n,
        Arity::Range(lo, hi) => got >= lo && got <= hi,
        Arity::AtLeast(n) => got >= n,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::WrongArity { name: name.to_string(), got })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_path() {
        let expr = parse("foo/bar").unwrap();
        match expr {
            Expression::LocationPath(lp) => {
                assert_eq!(lp.steps.len(), 2);
                assert_eq!(lp.steps[0].node_test, NodeTest::Name("foo".to_string()));
            }
            _ => panic!("expected location path"),
        }
    }

    #[test]
    fn parses_absolute_descendant_path() {
        let expr = parse("//a").unwrap();
        match expr {
            Expression::LocationPath(lp) => {
                assert!(lp.is_absolute);
                assert_eq!(lp.steps[0].axis, Axis::DescendantOrSelf);
                assert_eq!(lp.steps[1].node_test, NodeTest::Name("a".to_string()));
            }
            _ => panic!("expected location path"),
        }
    }

    #[test]
    fn parses_predicate_and_attribute_axis() {
        let expr = parse("foo[@id='a']").unwrap();
        match expr {
            Expression::LocationPath(lp) => {
                assert_eq!(lp.steps.len(), 1);
                let pred = &lp.steps[0].predicates[0];
                match pred {
                    Expression::BinaryOp { op: BinaryOperator::Equals, left, .. } => {
                        assert!(matches!(**left, Expression::LocationPath(_)));
                    }
                    _ => panic!("expected equality predicate"),
                }
            }
            _ => panic!("expected location path"),
        }
    }

    #[test]
    fn parses_function_call_and_path_from_it() {
        let expr = parse("id('x')/child::y").unwrap();
        match expr {
            Expression::LocationPath(lp) => {
                assert!(matches!(lp.start_point.as_deref(), Some(Expression::FunctionCall { .. })));
                assert_eq!(lp.steps[0].axis, Axis::Child);
            }
            _ => panic!("expected location path"),
        }
    }

    #[test]
    fn precedence_matches_grammar() {
        let expr = parse("1 + 2 * 3").unwrap();
        match expr {
            Expression::BinaryOp { op: BinaryOperator::Plus, right, .. } => {
                assert!(matches!(*right, Expression::BinaryOp { op: BinaryOperator::Multiply, .. }));
            }
            _ => panic!("expected additive at top"),
        }
    }

    #[test]
    fn parses_variable_path() {
        let expr = parse("$v/foo").unwrap();
        match expr {
            Expression::LocationPath(lp) => {
                assert!(matches!(lp.start_point.as_deref(), Some(Expression::Variable(n)) if n == "v"));
            }
            _ => panic!("expected location path"),
        }
    }
}
