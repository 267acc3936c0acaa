//! 参考表达式求值器
//!
//! 支持的语法：
//! - 点号路径：`command.type`、`data.0.value`（缺失字段求值为 `null`）
//! - 字面量：`'text'` / `"text"`、数字、`true` / `false`、`null`
//! - 比较：`== != < <= > >=`
//! - 逻辑：`&& || !`，以及等价的 `and or not`
//! - 括号分组
//!
//! 解析结果按表达式文本缓存，同一路由的过滤表达式只解析一次；
//! 缓存达到上限后整体清空。`!` 与括号的嵌套深度不超过 [`MAX_NESTING`]。
//!
use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use eventroute_domain::error::{RoutingError, RoutingResult};
use eventroute_domain::eventing::{Document, ExpressionEvaluator};
use serde_json::{Number, Value};

/// 单个表达式允许的最大嵌套层数
pub const MAX_NESTING: usize = 128;

/// 默认缓存的表达式条数
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

pub struct SimpleExpressionEvaluator {
    cache: DashMap<String, Arc<Expr>>,
    capacity: usize,
}

impl Default for SimpleExpressionEvaluator {
    fn default() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl SimpleExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    fn compile(&self, expression: &str) -> RoutingResult<Arc<Expr>> {
        if let Some(hit) = self.cache.get(expression) {
            return Ok(hit.value().clone());
        }
        let parsed = Parser::parse(expression)
            .map(Arc::new)
            .map_err(|reason| RoutingError::evaluation(expression, reason))?;
        if self.cache.len() >= self.capacity {
            self.cache.clear();
        }
        self.cache.insert(expression.to_string(), parsed.clone());
        Ok(parsed)
    }
}

#[async_trait]
impl ExpressionEvaluator for SimpleExpressionEvaluator {
    async fn evaluate(&self, expression: &str, document: &Document) -> RoutingResult<Value> {
        let expr = self.compile(expression)?;
        expr.eval(document)
            .map_err(|reason| RoutingError::evaluation(expression, reason))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Not(Box<Expr>),
    All(Vec<Expr>),
    Any(Vec<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, doc: &Document) -> Result<Value, String> {
        match self {
            Self::Literal(v) => Ok(v.clone()),
            Self::Path(keys) => Ok(lookup(doc, keys).cloned().unwrap_or(Value::Null)),
            Self::Not(inner) => Ok(Value::Bool(!inner.eval_bool(doc)?)),
            // 短路求值
            Self::All(terms) => {
                for term in terms {
                    if !term.eval_bool(doc)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Self::Any(terms) => {
                for term in terms {
                    if term.eval_bool(doc)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Self::Compare(op, l, r) => {
                let (l, r) = (l.eval(doc)?, r.eval(doc)?);
                compare(*op, &l, &r).map(Value::Bool)
            }
        }
    }

    fn eval_bool(&self, doc: &Document) -> Result<bool, String> {
        match self.eval(doc)? {
            Value::Bool(b) => Ok(b),
            other => Err(format!("expected boolean operand, got {other}")),
        }
    }
}

fn lookup<'a>(doc: &'a Document, keys: &[String]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    rest.iter().try_fold(doc.get(first)?, |v, k| match v {
        Value::Object(map) => map.get(k),
        Value::Array(items) => k.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> Result<bool, String> {
    let ordering = match (l, r) {
        (Value::Number(a), Value::Number(b)) => as_f64(a).partial_cmp(&as_f64(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    };

    match op {
        CmpOp::Eq => Ok(ordering.map_or(l == r, Ordering::is_eq)),
        CmpOp::Ne => Ok(ordering.map_or(l != r, Ordering::is_ne)),
        _ => {
            let ord = match (l, r, ordering) {
                (Value::Number(_), Value::Number(_), Some(o))
                | (Value::String(_), Value::String(_), Some(o)) => o,
                _ => return Err(format!("cannot order {l} and {r}")),
            };
            Ok(match op {
                CmpOp::Lt => ord.is_lt(),
                CmpOp::Le => ord.is_le(),
                CmpOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            })
        }
    }
}

fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(Number),
    LParen,
    RParen,
    And,
    Or,
    Not,
    Cmp(CmpOp),
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, String> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|(_, c)| *c);

    while let Some(&(offset, c)) = chars.get(i) {
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push((offset, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((offset, Token::RParen));
                i += 1;
            }
            '&' | '|' => {
                if peek(i + 1) != Some(c) {
                    return Err(format!("expected '{c}{c}' at offset {offset}"));
                }
                tokens.push((offset, if c == '&' { Token::And } else { Token::Or }));
                i += 2;
            }
            '=' | '!' | '<' | '>' => {
                let eq = peek(i + 1) == Some('=');
                let token = match (c, eq) {
                    ('=', true) => Token::Cmp(CmpOp::Eq),
                    ('=', false) => return Err(format!("unexpected '=' at offset {offset}, use '=='")),
                    ('!', true) => Token::Cmp(CmpOp::Ne),
                    ('!', false) => Token::Not,
                    ('<', true) => Token::Cmp(CmpOp::Le),
                    ('<', false) => Token::Cmp(CmpOp::Lt),
                    ('>', true) => Token::Cmp(CmpOp::Ge),
                    _ => Token::Cmp(CmpOp::Gt),
                };
                tokens.push((offset, token));
                i += if eq { 2 } else { 1 };
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match peek(i) {
                        None => return Err(format!("unterminated string at offset {offset}")),
                        Some('\\') => {
                            let escaped = peek(i + 1)
                                .ok_or_else(|| format!("unterminated string at offset {offset}"))?;
                            text.push(escaped);
                            i += 2;
                        }
                        Some(ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            text.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push((offset, Token::Str(text)));
            }
            c if c.is_ascii_digit() || (c == '-' && peek(i + 1).is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while peek(i).is_some_and(|n| n.is_ascii_digit() || matches!(n, '.' | 'e' | 'E')) {
                    i += 1;
                }
                let end = chars.get(i).map_or(src.len(), |(o, _)| *o);
                let raw = &src[chars[start].0..end];
                let number: Number = serde_json::from_str(raw)
                    .map_err(|_| format!("invalid number '{raw}' at offset {offset}"))?;
                tokens.push((offset, Token::Num(number)));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while peek(i).is_some_and(|n| n.is_alphanumeric() || matches!(n, '_' | '$' | '.')) {
                    i += 1;
                }
                let end = chars.get(i).map_or(src.len(), |(o, _)| *o);
                let word = &src[chars[start].0..end];
                let token = match word {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(word.to_string()),
                };
                tokens.push((offset, token));
            }
            other => return Err(format!("unexpected character '{other}' at offset {offset}")),
        }
    }

    Ok(tokens)
}

/// 递归下降：or > and > not > comparison > primary
///
/// `&&` / `||` 链展开为扁平列表，只有 `!` 与括号会加深语法树。
struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn parse(src: &str) -> Result<Expr, String> {
        let tokens = tokenize(src)?;
        if tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        let mut parser = Self {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.or()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some((offset, token)) => Err(format!("unexpected {token:?} at offset {offset}")),
        }
    }

    fn next_if(&mut self, want: &Token) -> bool {
        if self.tokens.get(self.pos).is_some_and(|(_, t)| t == want) {
            self.pos += 1;
            return true;
        }
        false
    }

    /// 进入一层嵌套；超过上限时报错而不是继续递归
    fn nested<T>(
        &mut self,
        offset: usize,
        parse: impl FnOnce(&mut Self) -> Result<T, String>,
    ) -> Result<T, String> {
        if self.depth >= MAX_NESTING {
            return Err(format!(
                "expression nested deeper than {MAX_NESTING} levels at offset {offset}"
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.and()?];
        while self.next_if(&Token::Or) {
            terms.push(self.and()?);
        }
        Ok(match terms.len() {
            1 => terms.swap_remove(0),
            _ => Expr::Any(terms),
        })
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.not()?];
        while self.next_if(&Token::And) {
            terms.push(self.not()?);
        }
        Ok(match terms.len() {
            1 => terms.swap_remove(0),
            _ => Expr::All(terms),
        })
    }

    fn not(&mut self) -> Result<Expr, String> {
        if let Some((offset, Token::Not)) = self.tokens.get(self.pos) {
            let offset = *offset;
            self.pos += 1;
            return self.nested(offset, |p| Ok(Expr::Not(Box::new(p.not()?))));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let left = self.primary()?;
        if let Some((_, Token::Cmp(op))) = self.tokens.get(self.pos) {
            let op = *op;
            self.pos += 1;
            let right = self.primary()?;
            return Ok(Expr::Compare(op, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let Some((offset, token)) = self.tokens.get(self.pos).cloned() else {
            return Err("unexpected end of expression".to_string());
        };
        self.pos += 1;
        match token {
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Num(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Ident(word) => Ok(match word.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                _ => path(&word, offset)?,
            }),
            Token::LParen => {
                let inner = self.nested(offset, Self::or)?;
                if !self.next_if(&Token::RParen) {
                    return Err(format!("missing ')' for '(' at offset {offset}"));
                }
                Ok(inner)
            }
            other => Err(format!("unexpected {other:?} at offset {offset}")),
        }
    }
}

fn path(word: &str, offset: usize) -> Result<Expr, String> {
    let keys: Vec<String> = word.split('.').map(str::to_string).collect();
    if keys.iter().any(String::is_empty) {
        return Err(format!("invalid path '{word}' at offset {offset}"));
    }
    Ok(Expr::Path(keys))
}
