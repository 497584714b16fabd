use crate::error::{Result, RucheckError};
use crate::xml::node::{XmlAttribute, XmlElement, XmlNode};
use sxd_document::Package;
use sxd_document::dom::{Attribute, ChildOfElement, ChildOfRoot, Element, Root};
use sxd_document::parser;

/// 解析 XML 文本
pub fn parse_package(xml: &str) -> Result<Package> {
    parser::parse(xml).map_err(|err| RucheckError::XmlParse(format!("{:?}", err)))
}

/// 解析 XML 文本并返回根元素的独立副本
pub fn parse_element(xml: &str) -> Result<XmlElement> {
    let package = parse_package(xml)?;
    let document = package.as_document();
    document_element(document.root())
        .map(to_element)
        .ok_or_else(|| RucheckError::XmlParse("document has no root element".to_string()))
}

pub(crate) fn document_element(root: Root<'_>) -> Option<Element<'_>> {
    root.children().into_iter().find_map(|child| match child {
        ChildOfRoot::Element(element) => Some(element),
        _ => None,
    })
}

pub(crate) fn child_elements(element: Element<'_>) -> Vec<Element<'_>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(child) => Some(child),
            _ => None,
        })
        .collect()
}

/// 文档中书写的限定名（`prefix:local`）
fn prefixed(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

pub(crate) fn to_attribute(attribute: Attribute<'_>) -> XmlAttribute {
    XmlAttribute::new(
        prefixed(attribute.preferred_prefix(), attribute.name().local_part()),
        attribute.value(),
    )
}

/// 把 DOM 元素复制为独立的元素树
///
/// 相邻文本合并为一个节点，纯空白文本、注释、处理指令不进入节点模型。
pub(crate) fn to_element(element: Element<'_>) -> XmlElement {
    let mut owned = XmlElement::new(prefixed(
        element.preferred_prefix(),
        element.name().local_part(),
    ));
    owned.attributes = element.attributes().into_iter().map(to_attribute).collect();

    let mut pending = String::new();
    for child in element.children() {
        match child {
            ChildOfElement::Element(child) => {
                flush_text(&mut owned, &mut pending);
                owned.children.push(XmlNode::Element(to_element(child)));
            }
            ChildOfElement::Text(text) => pending.push_str(text.text()),
            _ => {}
        }
    }
    flush_text(&mut owned, &mut pending);
    owned
}

fn flush_text(element: &mut XmlElement, pending: &mut String) {
    let text = std::mem::take(pending);
    if !text.trim().is_empty() {
        element.children.push(XmlNode::Text(text));
    }
}
