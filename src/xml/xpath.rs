//! XPath 1.0 选择器
//!
//! 求值交给 sxd-xpath，这里只负责编译、注册文档里用到的命名空间前缀，
//! 以及把结果节点复制成 [`XmlNode`]。结果按文档顺序排列且不重复。
//! 不带前缀的名称测试只匹配无命名空间的节点。

use crate::error::{Result, RucheckError};
use crate::xml::node::XmlNode;
use crate::xml::parse::{child_elements, document_element, parse_package, to_attribute, to_element};
use std::fmt;
use sxd_document::dom::Document;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};

/// 在 XML 文本上执行选择器，返回匹配的节点副本
pub fn select_nodes(xml: &str, selector: &str) -> Result<Vec<XmlNode>> {
    let xpath = XPath::compile(selector)?;
    let package = parse_package(xml)?;
    xpath.select(&package.as_document())
}

/// 编译后的选择器
pub struct XPath {
    source: String,
    compiled: sxd_xpath::XPath,
}

impl fmt::Debug for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("XPath").field(&self.source).finish()
    }
}

impl XPath {
    pub fn compile(selector: &str) -> Result<Self> {
        let compiled = Factory::new()
            .build(selector)
            .map_err(|err| invalid(selector, format!("{:?}", err)))?
            .ok_or_else(|| invalid(selector, "empty expression"))?;

        Ok(Self {
            source: selector.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn select(&self, document: &Document<'_>) -> Result<Vec<XmlNode>> {
        let mut context = Context::new();
        for (prefix, uri) in namespace_prefixes(document) {
            context.set_namespace(&prefix, &uri);
        }

        let value = self
            .compiled
            .evaluate(&context, document.root())
            .map_err(|err| invalid(&self.source, format!("{:?}", err)))?;

        match value {
            Value::Nodeset(nodes) => Ok(nodes
                .document_order()
                .into_iter()
                .filter_map(to_node)
                .collect()),
            _ => Err(invalid(&self.source, "expression does not select nodes")),
        }
    }
}

fn invalid(selector: &str, reason: impl Into<String>) -> RucheckError {
    RucheckError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.into(),
    }
}

/// 文档中元素和属性实际使用的前缀，同名前缀取第一次出现的绑定
fn namespace_prefixes(document: &Document<'_>) -> Vec<(String, String)> {
    let mut prefixes: Vec<(String, String)> = Vec::new();
    let mut record = |prefix: Option<&str>, uri: Option<&str>| {
        if let (Some(prefix), Some(uri)) = (prefix, uri) {
            if !prefixes.iter().any(|(known, _)| known == prefix) {
                prefixes.push((prefix.to_string(), uri.to_string()));
            }
        }
    };

    let mut pending: Vec<_> = document_element(document.root()).into_iter().collect();
    while let Some(element) = pending.pop() {
        record(element.preferred_prefix(), element.name().namespace_uri());
        for attribute in element.attributes() {
            record(attribute.preferred_prefix(), attribute.name().namespace_uri());
        }
        pending.extend(child_elements(element));
    }

    prefixes
}

/// 元素、属性和非空白文本转为独立节点，文档节点取其根元素
fn to_node(node: Node<'_>) -> Option<XmlNode> {
    match node {
        Node::Root(root) => {
            document_element(root).map(|element| XmlNode::Element(to_element(element)))
        }
        Node::Element(element) => Some(XmlNode::Element(to_element(element))),
        Node::Attribute(attribute) => Some(XmlNode::Attribute(to_attribute(attribute))),
        Node::Text(text) => {
            let text = text.text();
            (!text.trim().is_empty()).then(|| XmlNode::Text(text.to_string()))
        }
        _ => None,
    }
}
