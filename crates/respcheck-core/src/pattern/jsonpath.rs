//! Minimal JSONPath evaluator for the pattern strategies
//!
//! Supported: `$`, `.name`, `.*`, `..name`, `..*`, `['name']`, `[0]`, `[-1]`,
//! `[*]`, `[1:3]`, `[0,2]`, `['a','b']`, and filters `[?(@.field)]` /
//! `[?(@.field <op> literal)]` with `== != < <= > >=`.

use serde_json::Value;

use super::PatternError;
use crate::json::values_equal;

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Wildcard,
    Index(i64),
    Slice { start: Option<i64>, end: Option<i64> },
    Union(Vec<Selector>),
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    recursive: bool,
    selector: Selector,
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
struct Filter {
    path: Vec<String>,
    condition: Option<(CmpOp, Value)>,
}

/// A compiled JSONPath expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Compile an expression.
    ///
    /// # Errors
    ///
    /// [`PatternError::NotJsonPath`] if it does not start with `$`,
    /// [`PatternError::InvalidJsonPath`] on syntax errors.
    pub fn parse(expression: &str) -> Result<Self, PatternError> {
        if !expression.starts_with('$') {
            return Err(PatternError::NotJsonPath);
        }
        let segments = Parser::new(expression).parse()?;
        Ok(Self {
            source: expression.to_string(),
            segments,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every node selected by the expression.
    #[must_use]
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for segment in &self.segments {
            let mut next = Vec::new();
            for node in current {
                if segment.recursive {
                    let mut nodes = Vec::new();
                    descendants(node, &mut nodes);
                    for n in nodes {
                        apply(&segment.selector, n, &mut next);
                    }
                } else {
                    apply(&segment.selector, node, &mut next);
                }
            }
            current = next;
        }
        current
    }
}

fn descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Object(map) => map.values().for_each(|v| descendants(v, out)),
        Value::Array(items) => items.iter().for_each(|v| descendants(v, out)),
        _ => {}
    }
}

fn children(node: &Value) -> Vec<&Value> {
    match node {
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    }
}

fn normalize_index(idx: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if idx < 0 { len + idx } else { idx };
    (0..len).contains(&resolved).then(|| usize::try_from(resolved).ok()).flatten()
}

fn apply<'a>(selector: &Selector, node: &'a Value, out: &mut Vec<&'a Value>) {
    match selector {
        Selector::Name(name) => {
            if let Some(v) = node.as_object().and_then(|m| m.get(name)) {
                out.push(v);
            }
        }
        Selector::Wildcard => out.extend(children(node)),
        Selector::Index(idx) => {
            if let Some(items) = node.as_array() {
                if let Some(v) = normalize_index(*idx, items.len()).and_then(|i| items.get(i)) {
                    out.push(v);
                }
            }
        }
        Selector::Slice { start, end } => {
            if let Some(items) = node.as_array() {
                let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
                let clamp = |v: i64| if v < 0 { (len + v).max(0) } else { v.min(len) };
                let from = start.map_or(0, clamp);
                let to = end.map_or(len, clamp);
                for i in from..to {
                    if let Some(v) = usize::try_from(i).ok().and_then(|i| items.get(i)) {
                        out.push(v);
                    }
                }
            }
        }
        Selector::Union(parts) => {
            for part in parts {
                apply(part, node, out);
            }
        }
        Selector::Filter(filter) => {
            out.extend(children(node).into_iter().filter(|child| filter.accepts(child)));
        }
    }
}

impl Filter {
    fn accepts(&self, node: &Value) -> bool {
        let mut current = node;
        for key in &self.path {
            match current.as_object().and_then(|m| m.get(key)) {
                Some(v) => current = v,
                None => return false,
            }
        }
        let Some((op, literal)) = &self.condition else {
            return true;
        };
        match op {
            CmpOp::Eq => values_equal(current, literal),
            CmpOp::Ne => !values_equal(current, literal),
            CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
                let ordering = match (current, literal) {
                    (Value::Number(a), Value::Number(b)) => {
                        a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b))
                    }
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    _ => None,
                };
                ordering.is_some_and(|o| match op {
                    CmpOp::Lt => o.is_lt(),
                    CmpOp::Le => o.is_le(),
                    CmpOp::Gt => o.is_gt(),
                    _ => o.is_ge(),
                })
            }
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(expression: &str) -> Self {
        Self {
            chars: expression.chars().collect(),
            // Skip the leading `$`
            pos: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> PatternError {
        PatternError::InvalidJsonPath {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn expect(&mut self, c: char) -> Result<(), PatternError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>, PatternError> {
        let mut segments = Vec::new();
        while let Some(c) = self.peek() {
            let segment = if self.starts_with("..") {
                self.pos += 2;
                let selector = match self.peek() {
                    Some('[') => self.bracket()?,
                    Some('*') => {
                        self.pos += 1;
                        Selector::Wildcard
                    }
                    _ => Selector::Name(self.name()?),
                };
                Segment {
                    recursive: true,
                    selector,
                }
            } else if c == '.' {
                self.pos += 1;
                let selector = if self.peek() == Some('*') {
                    self.pos += 1;
                    Selector::Wildcard
                } else {
                    Selector::Name(self.name()?)
                };
                Segment {
                    recursive: false,
                    selector,
                }
            } else if c == '[' {
                Segment {
                    recursive: false,
                    selector: self.bracket()?,
                }
            } else {
                return Err(self.error(format!("unexpected '{c}'")));
            };
            segments.push(segment);
        }
        Ok(segments)
    }

    fn name(&mut self) -> Result<String, PatternError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '.' && c != '[') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected member name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn quoted(&mut self) -> Result<String, PatternError> {
        let Some(quote) = self.peek().filter(|c| *c == '\'' || *c == '"') else {
            return Err(self.error("expected quoted name"));
        };
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.expect(quote)?;
        Ok(text)
    }

    fn bracket(&mut self) -> Result<Selector, PatternError> {
        self.expect('[')?;
        self.skip_ws();
        let selector = match self.peek() {
            Some('*') => {
                self.pos += 1;
                Selector::Wildcard
            }
            Some('?') => {
                self.pos += 1;
                Selector::Filter(self.filter()?)
            }
            Some('\'' | '"') => {
                let mut names = vec![Selector::Name(self.quoted()?)];
                self.skip_ws();
                while self.peek() == Some(',') {
                    self.pos += 1;
                    self.skip_ws();
                    names.push(Selector::Name(self.quoted()?));
                    self.skip_ws();
                }
                if names.len() == 1 {
                    names.remove(0)
                } else {
                    Selector::Union(names)
                }
            }
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ']') {
                    self.pos += 1;
                }
                let inner: String = self.chars[start..self.pos].iter().collect();
                self.index_expr(inner.trim())?
            }
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(selector)
    }

    fn index_expr(&self, inner: &str) -> Result<Selector, PatternError> {
        let parse_int = |s: &str| -> Result<Option<i64>, PatternError> {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| self.error(format!("invalid index '{s}'")))
        };

        if let Some((from, to)) = inner.split_once(':') {
            return Ok(Selector::Slice {
                start: parse_int(from)?,
                end: parse_int(to)?,
            });
        }
        if inner.contains(',') {
            let parts = inner
                .split(',')
                .map(|p| {
                    parse_int(p)?
                        .map(Selector::Index)
                        .ok_or_else(|| self.error("empty union member"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Selector::Union(parts));
        }
        parse_int(inner)?
            .map(Selector::Index)
            .ok_or_else(|| self.error("empty brackets"))
    }

    /// `(@.a.b)` or `(@.a.b <op> literal)`, positioned after `?`.
    fn filter(&mut self) -> Result<Filter, PatternError> {
        self.expect('(')?;
        let start = self.pos;
        let mut depth = 1;
        let mut quote: Option<char> = None;
        while let Some(c) = self.peek() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, '(') => depth += 1,
                (None, ')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        let inner: String = self.chars[start..self.pos].iter().collect();
        self.expect(')')?;
        self.filter_expr(inner.trim())
    }

    fn filter_expr(&self, inner: &str) -> Result<Filter, PatternError> {
        let Some(body) = inner.strip_prefix('@') else {
            return Err(self.error("filter must start with '@'"));
        };

        let (lhs, condition) = match body.find(['=', '!', '<', '>']) {
            None => (body, None),
            Some(at) => {
                let rest = &body[at..];
                let (op, len) = if rest.starts_with("==") {
                    (CmpOp::Eq, 2)
                } else if rest.starts_with("!=") {
                    (CmpOp::Ne, 2)
                } else if rest.starts_with("<=") {
                    (CmpOp::Le, 2)
                } else if rest.starts_with(">=") {
                    (CmpOp::Ge, 2)
                } else if rest.starts_with('<') {
                    (CmpOp::Lt, 1)
                } else if rest.starts_with('>') {
                    (CmpOp::Gt, 1)
                } else {
                    return Err(self.error("unknown filter operator"));
                };
                let literal = parse_literal(rest[len..].trim())
                    .ok_or_else(|| self.error("invalid filter literal"))?;
                (&body[..at], Some((op, literal)))
            }
        };

        let path = lhs
            .trim()
            .split('.')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Filter { path, condition })
    }
}

fn parse_literal(text: &str) -> Option<Value> {
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return Some(Value::String(text[1..text.len() - 1].to_string()));
    }
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "store": {
                "book": [
                    {"title": "A", "price": 8, "tags": ["x"]},
                    {"title": "B", "price": 12},
                    {"title": "C", "price": 30, "isbn": "123"}
                ],
                "bicycle": {"color": "red", "price": 19}
            },
            "profile-data": {"imsi": ["001"]}
        })
    }

    fn select(expr: &str) -> Vec<Value> {
        let data = doc();
        JsonPath::parse(expr)
            .unwrap()
            .select(&data)
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn root_selects_document() {
        assert_eq!(select("$"), vec![doc()]);
    }

    #[test]
    fn dotted_names() {
        assert_eq!(select("$.store.bicycle.color"), vec![json!("red")]);
        assert_eq!(select("$.profile-data.imsi[0]"), vec![json!("001")]);
    }

    #[test]
    fn quoted_bracket_names() {
        assert_eq!(select("$['store']['bicycle']['color']"), vec![json!("red")]);
        assert_eq!(select("$.store.bicycle['color','price']").len(), 2);
    }

    #[test]
    fn wildcards() {
        assert_eq!(select("$.store.book[*].title"), vec![json!("A"), json!("B"), json!("C")]);
        assert_eq!(select("$.store.bicycle.*").len(), 2);
    }

    #[test]
    fn indices_and_slices() {
        assert_eq!(select("$.store.book[-1].title"), vec![json!("C")]);
        assert_eq!(select("$.store.book[0,2].title"), vec![json!("A"), json!("C")]);
        assert_eq!(select("$.store.book[1:].title"), vec![json!("B"), json!("C")]);
        assert_eq!(select("$.store.book[:1].title"), vec![json!("A")]);
        assert!(select("$.store.book[7]").is_empty());
    }

    #[test]
    fn recursive_descent() {
        assert_eq!(select("$..price").len(), 4);
        assert_eq!(select("$..isbn"), vec![json!("123")]);
    }

    #[test]
    fn filters() {
        assert_eq!(select("$.store.book[?(@.isbn)].title"), vec![json!("C")]);
        assert_eq!(select("$.store.book[?(@.price < 10)].title"), vec![json!("A")]);
        assert_eq!(select("$.store.book[?(@.title == 'B')].price"), vec![json!(12)]);
        assert_eq!(select("$..book[?(@.price >= 12)]").len(), 2);
        assert_eq!(select("$.store.book[?(@.title != \"A\")]").len(), 2);
    }

    #[test]
    fn missing_paths_select_nothing() {
        assert!(select("$.nope.deeper").is_empty());
        assert!(select("$.store.bicycle[0]").is_empty());
    }

    #[test]
    fn parse_errors() {
        assert_eq!(JsonPath::parse("store.book"), Err(PatternError::NotJsonPath));
        assert!(matches!(
            JsonPath::parse("$.store[abc]"),
            Err(PatternError::InvalidJsonPath { .. })
        ));
        assert!(matches!(
            JsonPath::parse("$.store["),
            Err(PatternError::InvalidJsonPath { .. })
        ));
        assert!(matches!(
            JsonPath::parse("$.a[?(x == 1)]"),
            Err(PatternError::InvalidJsonPath { .. })
        ));
        assert!(matches!(
            JsonPath::parse("$."),
            Err(PatternError::InvalidJsonPath { .. })
        ));
    }
}
