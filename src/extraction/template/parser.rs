//! XML query template parser.
//!
//! Parsing happens in two passes: `quick-xml` events are folded into a small
//! element tree, then the tree is converted into a [`QueryTemplate`]. Group
//! conditions are kept on every fragment so that disabled branches can be
//! pruned before any placeholder is substituted.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{
    ColumnKind, FromItem, GroupCondition, JoinKeyword, OrderItem, QueryKind, QueryTemplate,
    SelectItem, TextItem, WhereNode,
};
use crate::extraction::error::{TemplateError, TemplateResult};
use crate::sql::SortDir;

/// Generic XML element.
#[derive(Debug, Clone, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated direct text content, one line per source line, trimmed.
    fn text(&self) -> String {
        let raw: String = self
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect();
        normalize_text(&raw)
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }
}

/// Trim every line and join them with a single space.
fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a template document.
pub fn parse_template(id: &str, xml: &str) -> TemplateResult<QueryTemplate> {
    let root = parse_tree(id, xml)?;
    build_template(id, &root)
}

fn parse_tree(id: &str, xml: &str) -> TemplateResult<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| TemplateError::malformed(id, e))?;

        match event {
            Event::Start(start) => stack.push(start_element(id, &start)?),
            Event::Empty(start) => {
                let element = start_element(id, &start)?;
                attach(id, &mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| TemplateError::malformed(id, "unbalanced closing tag"))?;
                attach(id, &mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| TemplateError::malformed(id, e))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| TemplateError::malformed(id, e))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TemplateError::malformed(id, "unexpected end of document"));
    }
    root.ok_or_else(|| TemplateError::malformed(id, "empty document"))
}

fn start_element(id: &str, start: &BytesStart<'_>) -> TemplateResult<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_lowercase();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| TemplateError::malformed(id, e))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| TemplateError::malformed(id, e))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    id: &str,
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> TemplateResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(TemplateError::malformed(id, "multiple root elements")),
    }
    Ok(())
}

fn build_template(id: &str, root: &Element) -> TemplateResult<QueryTemplate> {
    if root.name != "query" {
        return Err(TemplateError::malformed(
            id,
            format!("expected <query> root element, found <{}>", root.name),
        ));
    }

    let kind = match root.attribute("type").map(str::to_lowercase).as_deref() {
        None | Some("select") => QueryKind::Select,
        Some("create") => {
            let table = root
                .attribute("table")
                .ok_or_else(|| TemplateError::malformed(id, "create query without table attribute"))?;
            QueryKind::Create {
                table: table.to_string(),
            }
        }
        Some(other) => {
            return Err(TemplateError::malformed(id, format!("unknown query type '{other}'")))
        }
    };

    let distinct = root
        .attribute("option")
        .map(|option| option.eq_ignore_ascii_case("DISTINCT"))
        .unwrap_or(false);

    let mut template = QueryTemplate {
        id: id.to_string(),
        name: root.attribute("name").unwrap_or(id).to_string(),
        kind,
        distinct,
        selects: Vec::new(),
        from: Vec::new(),
        filter: None,
        group_by: Vec::new(),
        order_by: Vec::new(),
    };

    for element in root.elements() {
        let group = group_of(element);
        match element.name.as_str() {
            "select" => {
                let alias = element
                    .attribute("alias")
                    .ok_or_else(|| TemplateError::malformed(id, "<select> without alias"))?;
                let kind = match element.attribute("type") {
                    Some(kind) => ColumnKind::parse(kind).ok_or_else(|| {
                        TemplateError::malformed(id, format!("unknown column type '{kind}'"))
                    })?,
                    None => ColumnKind::Text,
                };
                template.selects.push(SelectItem {
                    alias: alias.to_uppercase(),
                    expression: non_empty_text(id, element)?,
                    kind,
                    group,
                });
            }
            "from" => {
                let join = element
                    .attribute("join")
                    .map(|join| join.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                template.from.push(FromItem {
                    text: non_empty_text(id, element)?,
                    alias: element.attribute("alias").map(str::to_string),
                    join,
                    group,
                });
            }
            "where" => {
                if template.filter.is_some() {
                    return Err(TemplateError::malformed(id, "more than one top-level <where>"));
                }
                template.filter = Some(build_where(id, element)?);
            }
            "groupby" => template.group_by.push(TextItem {
                text: non_empty_text(id, element)?,
                group,
            }),
            "orderby" => {
                let direction = match element.attribute("direction") {
                    Some(direction) => SortDir::parse(direction).ok_or_else(|| {
                        TemplateError::malformed(id, format!("unknown direction '{direction}'"))
                    })?,
                    None => SortDir::Asc,
                };
                template.order_by.push(OrderItem {
                    text: non_empty_text(id, element)?,
                    direction,
                    group,
                });
            }
            other => {
                return Err(TemplateError::malformed(id, format!("unexpected element <{other}>")))
            }
        }
    }

    if template.selects.is_empty() {
        return Err(TemplateError::malformed(id, "query without <select>"));
    }
    if !template.from.iter().any(|item| !item.join) {
        return Err(TemplateError::malformed(id, "query without <from>"));
    }

    Ok(template)
}

fn build_where(id: &str, element: &Element) -> TemplateResult<WhereNode> {
    let operator = match element.attribute("operator") {
        Some(operator) => JoinKeyword::parse(operator).ok_or_else(|| {
            TemplateError::malformed(id, format!("unknown where operator '{operator}'"))
        })?,
        None => JoinKeyword::And,
    };

    let mut children = Vec::new();
    for child in element.elements() {
        if child.name != "where" {
            return Err(TemplateError::malformed(
                id,
                format!("unexpected element <{}> inside <where>", child.name),
            ));
        }
        children.push(build_where(id, child)?);
    }

    Ok(WhereNode {
        operator,
        group: group_of(element),
        text: element.text(),
        children,
    })
}

fn group_of(element: &Element) -> Option<GroupCondition> {
    element.attribute("group").and_then(GroupCondition::parse)
}

fn non_empty_text(id: &str, element: &Element) -> TemplateResult<String> {
    let text = element.text();
    if text.is_empty() {
        return Err(TemplateError::malformed(
            id,
            format!("empty <{}> element", element.name),
        ));
    }
    Ok(text)
}
