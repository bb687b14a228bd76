//! Condition expression parser.
//!
//! Recursive descent over the token stream, lowest precedence first:
//! `||`, `&&`, equality, relational, unary, postfix access, primary.

use super::lexer::{Root, Token};
use super::{ConditionError, MAX_DEPTH};
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Number, string, boolean or null literal
    Literal(Value),
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `$header`, `$query`, `$path`, `$body`
    Root(Root),
    /// `target.name` or `target[key]`
    Member { target: Box<Expr>, key: Box<Expr> },
    /// `target.contains(arg)` and friends
    Call {
        target: Box<Expr>,
        helper: Helper,
        arg: Box<Expr>,
    },
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Helper methods callable on sequences and strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    Contains,
    ContainsAll,
    IndexOf,
}

impl Helper {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(Helper::Contains),
            "containsAll" => Some(Helper::ContainsAll),
            "indexOf" => Some(Helper::IndexOf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        Some(tok)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ConditionError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}")))
        }
    }

    fn error(&self, message: &str) -> ConditionError {
        match self.peek() {
            Some(tok) => ConditionError::Syntax(format!("{message}, found {tok:?}")),
            None => ConditionError::Syntax(format!("{message}, found end of expression")),
        }
    }

    fn enter(&mut self) -> Result<(), ConditionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ConditionError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parse the whole token stream as one expression.
    pub fn parse(mut self) -> Result<Expr, ConditionError> {
        if self.tokens.is_empty() {
            return Err(ConditionError::Syntax("empty expression".to_string()));
        }
        let node = self.parse_nested()?;
        if self.peek().is_some() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(node.expr)
    }

    fn parse_nested(&mut self) -> Result<Node, ConditionError> {
        self.enter()?;
        let node = self.parse_or();
        self.leave();
        node
    }

    fn parse_or(&mut self) -> Result<Node, ConditionError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Node::binary(left, right, Expr::Or)?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node, ConditionError> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::And) {
            let right = self.parse_equality()?;
            left = Node::binary(left, right, Expr::And)?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Node, ConditionError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                Some(Token::StrictEq) => CompareOp::StrictEq,
                Some(Token::StrictNotEq) => CompareOp::StrictNotEq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Node::compare(op, left, right)?;
        }
    }

    fn parse_relational(&mut self) -> Result<Node, ConditionError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Node::compare(op, left, right)?;
        }
    }

    fn parse_unary(&mut self) -> Result<Node, ConditionError> {
        let wrap: fn(Box<Expr>) -> Expr = match self.peek() {
            Some(Token::Not) => Expr::Not,
            Some(Token::Minus) => Expr::Neg,
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        self.enter()?;
        let inner = self.parse_unary();
        self.leave();
        let inner = inner?;
        Ok(Node {
            height: grow(inner.height)?,
            expr: wrap(Box::new(inner.expr)),
        })
    }

    fn parse_postfix(&mut self) -> Result<Node, ConditionError> {
        let mut node = self.parse_primary()?;

        loop {
            if self.eat(&Token::Dot) {
                let name = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return Err(self.error("expected property name after '.'"));
                    }
                };
                if self.peek() == Some(&Token::LParen) {
                    node = self.parse_call(node, &name)?;
                } else {
                    let key = Node::leaf(Expr::Literal(Value::String(name)));
                    node = Node::member(node, key)?;
                }
            } else if self.eat(&Token::LBracket) {
                let key = self.parse_nested()?;
                self.expect(&Token::RBracket)?;
                node = Node::member(node, key)?;
            } else {
                return Ok(node);
            }
        }
    }

    fn parse_call(&mut self, target: Node, name: &str) -> Result<Node, ConditionError> {
        let helper = Helper::from_name(name)
            .ok_or_else(|| ConditionError::Syntax(format!("unknown helper '{name}'")))?;
        self.expect(&Token::LParen)?;
        let arg = self.parse_nested()?;
        self.expect(&Token::RParen)?;
        Ok(Node {
            height: grow(target.height.max(arg.height))?,
            expr: Expr::Call {
                target: Box::new(target.expr),
                helper,
                arg: Box::new(arg.expr),
            },
        })
    }

    fn parse_primary(&mut self) -> Result<Node, ConditionError> {
        let Some(tok) = self.advance() else {
            return Err(self.error("expected a value"));
        };

        let literal = match tok {
            Token::Number(text) => number_literal(&text)?,
            Token::Str(s) => Value::String(s),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Null => Value::Null,
            Token::Root(root) => return Ok(Node::leaf(Expr::Root(root))),
            Token::LParen => {
                let inner = self.parse_nested()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Token::LBracket => return self.parse_list(),
            Token::Ident(name) => {
                return Err(ConditionError::Syntax(format!(
                    "unknown identifier '{name}', properties must start from a $ scope"
                )))
            }
            other => {
                self.pos -= 1;
                return Err(self.error(&format!("unexpected {other:?}")));
            }
        };
        Ok(Node::leaf(Expr::Literal(literal)))
    }

    fn parse_list(&mut self) -> Result<Node, ConditionError> {
        let mut items = Vec::new();
        let mut height = 0;
        if !self.eat(&Token::RBracket) {
            loop {
                let item = self.parse_nested()?;
                height = height.max(item.height);
                items.push(item.expr);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RBracket)?;
                break;
            }
        }
        Ok(Node {
            height: grow(height)?,
            expr: Expr::List(items),
        })
    }
}

/// A parsed expression and the height of its tree.
///
/// Left-deep chains and groups nested inside chains all add height, so
/// bounding it bounds the recursion of the interpreter.
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }

    fn binary(
        left: Node,
        right: Node,
        join: fn(Box<Expr>, Box<Expr>) -> Expr,
    ) -> Result<Self, ConditionError> {
        Ok(Self {
            height: grow(left.height.max(right.height))?,
            expr: join(Box::new(left.expr), Box::new(right.expr)),
        })
    }

    fn compare(op: CompareOp, left: Node, right: Node) -> Result<Self, ConditionError> {
        Ok(Self {
            height: grow(left.height.max(right.height))?,
            expr: Expr::Compare {
                op,
                left: Box::new(left.expr),
                right: Box::new(right.expr),
            },
        })
    }

    fn member(target: Node, key: Node) -> Result<Self, ConditionError> {
        Ok(Self {
            height: grow(target.height.max(key.height))?,
            expr: Expr::Member {
                target: Box::new(target.expr),
                key: Box::new(key.expr),
            },
        })
    }
}

/// Height of a parent over a child of height `child`.
fn grow(child: usize) -> Result<usize, ConditionError> {
    let height = child + 1;
    if height > MAX_DEPTH {
        return Err(ConditionError::TooDeep(MAX_DEPTH));
    }
    Ok(height)
}

fn number_literal(text: &str) -> Result<Value, ConditionError> {
    if !text.contains('.') {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Number(n.into()));
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ConditionError::Syntax(format!("invalid number '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::super::lexer::Lexer;
    use super::*;

    fn parse(input: &str) -> Result<Expr, ConditionError> {
        Parser::new(Lexer::new(input).tokenize()?).parse()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("$path.a == '1' || $path.b == '2' && $path.c == '3'").unwrap();
        // && binds tighter than ||
        assert!(matches!(expr, Expr::Or(_, ref right) if matches!(**right, Expr::And(_, _))));
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        let expr = parse("($path.a == '1' || $path.b == '2') && $path.c == '3'").unwrap();
        assert!(matches!(expr, Expr::And(ref left, _) if matches!(**left, Expr::Or(_, _))));
    }

    #[test]
    fn test_member_chain() {
        let expr = parse("$body.addresses['work']").unwrap();
        let Expr::Member { target, key } = expr else {
            panic!("expected member access");
        };
        assert_eq!(*key, Expr::Literal(Value::String("work".into())));
        assert!(matches!(*target, Expr::Member { .. }));
    }

    #[test]
    fn test_helper_call() {
        let expr = parse("$body.ids.containsAll(['1', '2'])").unwrap();
        assert!(matches!(
            expr,
            Expr::Call {
                helper: Helper::ContainsAll,
                ..
            }
        ));
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(
            parse("75").unwrap(),
            Expr::Literal(Value::Number(75.into()))
        );
        assert_eq!(
            parse("-0.32").unwrap(),
            Expr::Neg(Box::new(Expr::Literal(serde_json::json!(0.32))))
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("").is_err());
        assert!(parse("$body.").is_err());
        assert!(parse("$body.x ==").is_err());
        assert!(parse("($body.x == 1").is_err());
        assert!(parse("$body.x == 1)").is_err());
        assert!(parse("$body.x.foo(1)").is_err());
        assert!(parse("$body.x.contains()").is_err());
        assert!(parse("$body.x.contains(1, 2)").is_err());
        assert!(parse("name == 'x'").is_err());
    }

    #[test]
    fn test_depth_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(matches!(parse(&deep), Err(ConditionError::TooDeep(_))));

        let negations = format!("{}true", "!".repeat(200));
        assert!(matches!(parse(&negations), Err(ConditionError::TooDeep(_))));

        let chain = format!("$body{}", ".a".repeat(200));
        assert!(matches!(parse(&chain), Err(ConditionError::TooDeep(_))));

        let comparisons = format!("1{}", " == 1".repeat(200));
        assert!(matches!(parse(&comparisons), Err(ConditionError::TooDeep(_))));
    }

    #[test]
    fn test_chains_nested_in_groups_are_bounded() {
        // each group holds a 60-link chain whose first operand is the previous group
        let mut expr = "1".to_string();
        while expr.len() < 3800 {
            expr = format!("({}{})", expr, "<1".repeat(60));
        }
        assert!(matches!(parse(&expr), Err(ConditionError::TooDeep(_))));

        let shallow = format!("({}){}", "1<1", "<1".repeat(40));
        assert!(parse(&shallow).is_ok());

        let wide = vec!["$body.a == 1"; 80].join(" && ");
        assert!(matches!(parse(&wide), Err(ConditionError::TooDeep(_))));
    }
}
