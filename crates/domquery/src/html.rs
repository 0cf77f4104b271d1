//! Forgiving HTML fragment parser for test fixtures.
//!
//! Handles elements, quoted/unquoted/boolean attributes, text, void and
//! self-closing elements, raw-text `script`/`style`, comments, doctype and a
//! handful of character entities. Start tags apply HTML's implied end tags:
//! a new `<li>` closes the open `<li>`, `<option>` closes `<option>`, a
//! block start tag closes an open `<p>`, and likewise for `dt`/`dd`,
//! `optgroup` and table rows and cells. Remaining unclosed elements are
//! closed at the end of input; a stray end tag closes back to its nearest
//! matching open element.

use crate::dom::{NodeData, NodeId, Tree};
use crate::result::{QueryError, QueryResult};

pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Start tags that close an open `<p>`
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Open elements a start tag closes, and the open elements that end the search
struct ImpliedEnd {
    closes: &'static [&'static str],
    stops_at: &'static [&'static str],
}

fn implied_end(tag: &str) -> Option<ImpliedEnd> {
    let (closes, stops_at): (&'static [&'static str], &'static [&'static str]) = match tag {
        "li" => (&["li"], &["ul", "ol", "menu", "table", "td", "th", "template"]),
        "dt" | "dd" => (&["dt", "dd"], &["dl", "table", "td", "th", "template"]),
        "option" => (&["option"], &["select", "datalist", "optgroup"]),
        "optgroup" => (&["option", "optgroup"], &["select", "datalist"]),
        "tr" => (&["tr", "td", "th"], &["table", "thead", "tbody", "tfoot"]),
        "td" | "th" => (&["td", "th"], &["tr", "table"]),
        "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot", "tr", "td", "th"], &["table"]),
        _ if CLOSES_PARAGRAPH.contains(&tag) => {
            (&["p"], &["button", "table", "td", "th", "caption", "template"])
        }
        _ => return None,
    };
    Some(ImpliedEnd { closes, stops_at })
}

/// Parsed node, not yet attached to a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
}

struct OpenElement {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Fragment>,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

/// Parse an HTML fragment into detached nodes
pub(crate) fn parse_fragment(src: &str) -> QueryResult<Vec<Fragment>> {
    Parser { src, pos: 0 }.parse()
}

/// Attach parsed nodes under `parent`
pub(crate) fn build(tree: &mut Tree, parent: NodeId, fragment: Vec<Fragment>) {
    for node in fragment {
        match node {
            Fragment::Text(text) => {
                tree.create(Some(parent), NodeData::Text(text));
            }
            Fragment::Element {
                tag,
                attrs,
                children,
            } => {
                let id = tree.create_element(Some(parent), &tag);
                if let Some(element) = tree.element_mut(id) {
                    element.attrs = attrs;
                }
                build(tree, id, children);
            }
        }
    }
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Html {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn parse(mut self) -> QueryResult<Vec<Fragment>> {
        let mut stack: Vec<OpenElement> = vec![OpenElement {
            tag: String::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }];

        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                let end = rest
                    .find("-->")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += end + 3;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| self.error("unterminated declaration"))?;
                self.pos += end + 1;
            } else if rest.starts_with("</") {
                let tag = self.end_tag()?;
                close_until(&mut stack, &tag);
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let (tag, attrs, self_closing) = self.start_tag()?;
                close_implied(&mut stack, &tag);
                if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
                    push_child(
                        &mut stack,
                        Fragment::Element {
                            tag,
                            attrs,
                            children: Vec::new(),
                        },
                    );
                } else if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                    let text = self.raw_text(&tag)?;
                    let children = if text.is_empty() {
                        Vec::new()
                    } else {
                        vec![Fragment::Text(text)]
                    };
                    push_child(
                        &mut stack,
                        Fragment::Element {
                            tag,
                            attrs,
                            children,
                        },
                    );
                } else {
                    stack.push(OpenElement {
                        tag,
                        attrs,
                        children: Vec::new(),
                    });
                }
            } else {
                let end = rest
                    .char_indices()
                    .skip(1)
                    .find(|&(_, c)| c == '<')
                    .map_or(rest.len(), |(i, _)| i);
                push_child(&mut stack, Fragment::Text(decode_entities(&rest[..end])));
                self.pos += end;
            }
        }

        while stack.len() > 1 {
            pop_into_parent(&mut stack);
        }
        Ok(stack.pop().map(|root| root.children).unwrap_or_default())
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '='))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_ascii_lowercase()
    }

    fn start_tag(&mut self) -> QueryResult<(String, Vec<(String, String)>, bool)> {
        let start = self.pos;
        self.pos += 1;
        let tag = self.name();
        let mut attrs: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                self.pos = start;
                return Err(self.error(format!("unterminated start tag <{tag}")));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((tag, attrs, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((tag, attrs, false));
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let name = self.name();
            if name.is_empty() {
                return Err(self.error(format!("malformed attribute in <{tag}>")));
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()?
            } else {
                String::new()
            };
            if !attrs.iter().any(|(existing, _)| *existing == name) {
                attrs.push((name, value));
            }
        }
    }

    fn attribute_value(&mut self) -> QueryResult<String> {
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|c| matches!(c, '"' | '\'')) {
            let end = rest[1..]
                .find(quote)
                .ok_or_else(|| self.error("unterminated attribute value"))?;
            self.pos += end + 2;
            Ok(decode_entities(&rest[1..=end]))
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            self.pos += end;
            Ok(decode_entities(&rest[..end]))
        }
    }

    fn end_tag(&mut self) -> QueryResult<String> {
        self.pos += 2;
        let tag = self.name();
        let end = self
            .rest()
            .find('>')
            .ok_or_else(|| self.error(format!("unterminated end tag </{tag}")))?;
        self.pos += end + 1;
        Ok(tag)
    }

    fn raw_text(&mut self, tag: &str) -> QueryResult<String> {
        let close = format!("</{tag}");
        let rest = self.rest();
        let end = rest
            .to_ascii_lowercase()
            .find(&close)
            .ok_or_else(|| self.error(format!("unterminated <{tag}> element")))?;
        let text = rest[..end].to_string();
        self.pos += end;
        let _ = self.end_tag()?;
        Ok(text)
    }
}

fn push_child(stack: &mut [OpenElement], node: Fragment) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn pop_into_parent(stack: &mut Vec<OpenElement>) {
    if let Some(open) = stack.pop() {
        push_child(
            stack,
            Fragment::Element {
                tag: open.tag,
                attrs: open.attrs,
                children: open.children,
            },
        );
    }
}

/// Close the outermost open element `tag` implicitly ends, and everything
/// opened inside it
fn close_implied(stack: &mut Vec<OpenElement>, tag: &str) {
    let Some(rule) = implied_end(tag) else {
        return;
    };
    let mut depth = None;
    for (index, open) in stack.iter().enumerate().skip(1).rev() {
        if rule.stops_at.contains(&open.tag.as_str()) {
            break;
        }
        if rule.closes.contains(&open.tag.as_str()) {
            depth = Some(index);
        }
    }
    if let Some(depth) = depth {
        while stack.len() > depth {
            pop_into_parent(stack);
        }
    }
}

fn close_until(stack: &mut Vec<OpenElement>, tag: &str) {
    let Some(depth) = stack.iter().skip(1).rposition(|open| open.tag == tag) else {
        return;
    };
    while stack.len() > depth + 1 {
        pop_into_parent(stack);
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
