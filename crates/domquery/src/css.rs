//! Simple selector lists.
//!
//! Supports comma-separated compound selectors built from `tag`, `*`,
//! `#id`, `.class`, `[attr]` and `[attr=value]`. Combinators and
//! pseudo-classes are rejected.

use crate::dom::{NodeId, Tree};
use crate::result::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    HasAttr(String),
    AttrEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    /// `None` for `*` or an omitted tag
    tag: Option<String>,
    conditions: Vec<Condition>,
}

impl Compound {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(element) = tree.element(node) else {
            return false;
        };
        if self.tag.as_ref().is_some_and(|tag| *tag != element.tag) {
            return false;
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => element.attr("id") == Some(id.as_str()),
            Condition::Class(class) => element
                .attr("class")
                .is_some_and(|value| value.split_whitespace().any(|c| c == class)),
            Condition::HasAttr(name) => element.attr(name).is_some(),
            Condition::AttrEquals(name, value) => element.attr(name) == Some(value.as_str()),
        })
    }
}

/// A parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    compounds: Vec<Compound>,
}

impl SelectorList {
    /// Parse a selector list such as `input, textarea` or `button.primary[type=submit]`
    pub fn parse(selector: &str) -> QueryResult<Self> {
        let invalid = |message: &str| QueryError::Selector {
            selector: selector.to_string(),
            message: message.to_string(),
        };
        let compounds = selector
            .split(',')
            .map(|part| parse_compound(part.trim()).map_err(|message| invalid(&message)))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Self { compounds })
    }

    /// Whether the node matches any selector in the list
    pub(crate) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.compounds
            .iter()
            .any(|compound| compound.matches(tree, node))
    }

    /// Whether this list is the universal selector `*`
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.compounds
            .iter()
            .any(|compound| compound.tag.is_none() && compound.conditions.is_empty())
    }
}

fn parse_compound(part: &str) -> Result<Compound, String> {
    if part.is_empty() {
        return Err("empty selector".to_string());
    }
    let mut chars = part.char_indices().peekable();
    let mut tag = None;
    let mut conditions = Vec::new();

    let ident_end = |start: usize| {
        part[start..]
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .map_or(part.len(), |i| start + i)
    };

    while let Some((i, c)) = chars.next() {
        match c {
            '*' if i == 0 => {}
            c if i == 0 && c.is_alphabetic() => {
                let end = ident_end(i);
                tag = Some(part[i..end].to_ascii_lowercase());
                skip_to(&mut chars, end);
            }
            '#' | '.' => {
                let end = ident_end(i + 1);
                if end == i + 1 {
                    return Err(format!("expected a name after '{c}'"));
                }
                let name = part[i + 1..end].to_string();
                conditions.push(if c == '#' {
                    Condition::Id(name)
                } else {
                    Condition::Class(name)
                });
                skip_to(&mut chars, end);
            }
            '[' => {
                let close = part[i..]
                    .find(']')
                    .map(|offset| i + offset)
                    .ok_or("unterminated attribute selector")?;
                let inner = &part[i + 1..close];
                let condition = match inner.split_once('=') {
                    Some((name, value)) => Condition::AttrEquals(
                        name.trim().to_ascii_lowercase(),
                        value.trim().trim_matches(|q: char| q == '"' || q == '\'').to_string(),
                    ),
                    None => Condition::HasAttr(inner.trim().to_ascii_lowercase()),
                };
                conditions.push(condition);
                skip_to(&mut chars, close + 1);
            }
            other => return Err(format!("unsupported character '{other}'")),
        }
    }

    Ok(Compound { tag, conditions })
}

fn skip_to(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, end: usize) {
    while chars.peek().is_some_and(|(i, _)| *i < end) {
        chars.next();
    }
}
