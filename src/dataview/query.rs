//! Parser for the supported DQL subset.
//!
//! ```text
//! LIST | TABLE field[, field...] | TASK
//!   [FROM "folder" | FROM #tag]
//!   [WHERE field [op literal]]        op: = != > < >= <=
//!   [SORT field [ASC | DESC]]
//!   [LIMIT n]
//! ```
//!
//! Keywords are case-insensitive. Clauses may appear on one line or many.

use serde_json::Value;

use super::QueryError;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    List,
    Table(Vec<String>),
    Task,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Table(_) => "table",
            Self::Task => "task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    All,
    Folder(String),
    Tag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "=" | "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            _ => None,
        }
    }
}

/// `WHERE field` (truthiness) or `WHERE field op literal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub comparison: Option<(CompareOp, Value)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub kind: QueryKind,
    pub source: Source,
    pub condition: Option<Condition>,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Op(String),
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == ',' {
            chars.next();
            tokens.push(Token::Comma);
        } else if c == '"' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => {
                        if let Some(escaped) = chars.next() {
                            s.push(escaped);
                        }
                    }
                    Some(other) => s.push(other),
                    None => return Err(QueryError::Parse("unterminated string literal".into())),
                }
            }
            tokens.push(Token::Str(s));
        } else if "=!<>".contains(c) {
            let mut op = String::new();
            while let Some(&next) = chars.peek() {
                if "=!<>".contains(next) {
                    op.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Op(op));
        } else {
            let mut word = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() || next == ',' || next == '"' || "=!<>".contains(next) {
                    break;
                }
                word.push(next);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }
    Ok(tokens)
}

fn is_keyword(token: Option<&Token>, keyword: &str) -> bool {
    matches!(token, Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
}

fn is_clause_keyword(token: Option<&Token>) -> bool {
    ["FROM", "WHERE", "SORT", "LIMIT"]
        .iter()
        .any(|k| is_keyword(token, k))
}

fn literal(token: Token) -> Value {
    match token {
        Token::Str(s) => Value::String(s),
        Token::Word(w) => serde_json::from_str(&w).unwrap_or(Value::String(w)),
        Token::Op(o) => Value::String(o),
        Token::Comma => Value::String(",".into()),
    }
}

type Tokens = std::iter::Peekable<std::vec::IntoIter<Token>>;

fn expect_word(tokens: &mut Tokens, what: &str) -> Result<String, QueryError> {
    match tokens.next() {
        Some(Token::Word(w)) => Ok(w),
        Some(other) => Err(QueryError::Parse(format!("expected {what}, found {other:?}"))),
        None => Err(QueryError::Parse(format!("expected {what}, found end of query"))),
    }
}

/// Parse a query string.
pub fn parse(source: &str) -> Result<Query, QueryError> {
    let mut tokens = tokenize(source)?.into_iter().peekable();

    let head = match tokens.next() {
        Some(Token::Word(w)) => w.to_ascii_uppercase(),
        _ => return Err(QueryError::Parse("empty query".into())),
    };

    let kind = match head.as_str() {
        "LIST" => QueryKind::List,
        "TASK" => QueryKind::Task,
        "TABLE" => {
            let mut fields = Vec::new();
            while tokens.peek().is_some() && !is_clause_keyword(tokens.peek()) {
                fields.push(expect_word(&mut tokens, "a field name")?);
                if matches!(tokens.peek(), Some(Token::Comma)) {
                    tokens.next();
                }
            }
            QueryKind::Table(fields)
        }
        "CALENDAR" => {
            return Err(QueryError::Unsupported(
                "CALENDAR queries are not supported".into(),
            ))
        }
        other => {
            return Err(QueryError::Parse(format!(
                "unknown query type: {other}. Expected LIST, TABLE or TASK"
            )))
        }
    };

    let mut query = Query {
        kind,
        source: Source::All,
        condition: None,
        sort: None,
        limit: None,
    };

    while let Some(token) = tokens.next() {
        let Token::Word(keyword) = token else {
            return Err(QueryError::Parse(format!("unexpected token {token:?}")));
        };

        match keyword.to_ascii_uppercase().as_str() {
            "FROM" => {
                query.source = match tokens.next() {
                    Some(Token::Str(folder)) => Source::Folder(folder.trim_matches('/').to_string()),
                    Some(Token::Word(tag)) if tag.starts_with('#') && tag.len() > 1 => {
                        Source::Tag(tag[1..].to_string())
                    }
                    _ => {
                        return Err(QueryError::Parse(
                            "FROM expects a quoted folder or a #tag".into(),
                        ))
                    }
                };
            }
            "WHERE" => {
                let field = expect_word(&mut tokens, "a field name after WHERE")?;
                let comparison = match tokens.next_if(|t| matches!(t, Token::Op(_))) {
                    Some(Token::Op(op)) => {
                        let op = CompareOp::parse(&op)
                            .ok_or_else(|| QueryError::Parse(format!("unknown operator: {op}")))?;
                        let value = tokens.next().map(literal).ok_or_else(|| {
                            QueryError::Parse("expected a value after the operator".into())
                        })?;
                        Some((op, value))
                    }
                    _ => None,
                };
                query.condition = Some(Condition { field, comparison });
            }
            "SORT" => {
                let field = expect_word(&mut tokens, "a field name after SORT")?;
                let descending = if is_keyword(tokens.peek(), "DESC") {
                    tokens.next();
                    true
                } else {
                    if is_keyword(tokens.peek(), "ASC") {
                        tokens.next();
                    }
                    false
                };
                query.sort = Some(Sort { field, descending });
            }
            "LIMIT" => {
                let n = expect_word(&mut tokens, "a number after LIMIT")?;
                query.limit = Some(
                    n.parse()
                        .map_err(|_| QueryError::Parse(format!("invalid LIMIT: {n}")))?,
                );
            }
            other => {
                return Err(QueryError::Parse(format!("unexpected keyword: {other}")));
            }
        }
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_table_query() {
        let q = parse(
            "TABLE status, due\nFROM \"projects/\"\nWHERE priority >= 2\nSORT due DESC\nLIMIT 5",
        )
        .unwrap();
        assert_eq!(q.kind, QueryKind::Table(vec!["status".into(), "due".into()]));
        assert_eq!(q.source, Source::Folder("projects".into()));
        assert_eq!(
            q.condition,
            Some(Condition {
                field: "priority".into(),
                comparison: Some((CompareOp::Ge, json!(2))),
            })
        );
        assert_eq!(
            q.sort,
            Some(Sort {
                field: "due".into(),
                descending: true,
            })
        );
        assert_eq!(q.limit, Some(5));
    }

    #[test]
    fn parses_list_from_tag_with_truthy_where() {
        let q = parse("list from #book where finished").unwrap();
        assert_eq!(q.kind, QueryKind::List);
        assert_eq!(q.source, Source::Tag("book".into()));
        assert_eq!(q.condition.unwrap().comparison, None);
    }

    #[test]
    fn string_literals_keep_spaces() {
        let q = parse(r#"TASK WHERE owner = "Ann Lee""#).unwrap();
        assert_eq!(
            q.condition.unwrap().comparison,
            Some((CompareOp::Eq, json!("Ann Lee")))
        );
    }

    #[test]
    fn rejects_bad_queries() {
        assert!(matches!(parse(""), Err(QueryError::Parse(_))));
        assert!(matches!(parse("SELECT *"), Err(QueryError::Parse(_))));
        assert!(matches!(parse("CALENDAR due"), Err(QueryError::Unsupported(_))));
        assert!(parse("LIST FROM").is_err());
        assert!(parse("LIST LIMIT many").is_err());
        assert!(parse("LIST WHERE a =").is_err());
        assert!(parse("LIST WHERE a =~ 3").is_err());
        assert!(parse("LIST FROM \"open").is_err());
    }
}
