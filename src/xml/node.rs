use std::fmt;

/// 属性（名称保留文档中的前缀写法，如 `xsi:nil`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// 去掉前缀后的本地名
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }
}

/// 元素节点，子节点按文档顺序保存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(XmlAttribute::new(name, value));
        self
    }

    pub fn with_child(mut self, child: impl Into<XmlNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(XmlNode::Text(text.into()))
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// 是否至少有一个元素子节点
    pub fn has_element_children(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, XmlNode::Element(_)))
    }

    pub fn inner_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.collect_text(out),
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Attribute(_) => {}
            }
        }
    }

    pub fn outer_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attribute in &self.attributes {
            out.push(' ');
            out.push_str(&attribute.name);
            out.push_str("=\"");
            out.push_str(&escape(&attribute.value, true));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str(" />");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_xml(out),
                XmlNode::Text(text) => out.push_str(&escape(text, false)),
                XmlNode::Attribute(_) => {}
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// 节点：元素、文本，或路径查询选中的属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Attribute(XmlAttribute),
}

impl XmlNode {
    /// 节点名，文本节点为 `#text`
    pub fn name(&self) -> &str {
        match self {
            XmlNode::Element(element) => &element.name,
            XmlNode::Text(_) => "#text",
            XmlNode::Attribute(attribute) => &attribute.name,
        }
    }

    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn has_element_children(&self) -> bool {
        self.as_element()
            .is_some_and(XmlElement::has_element_children)
    }

    pub fn inner_text(&self) -> String {
        match self {
            XmlNode::Element(element) => element.inner_text(),
            XmlNode::Text(text) => text.clone(),
            XmlNode::Attribute(attribute) => attribute.value.clone(),
        }
    }

    pub fn outer_xml(&self) -> String {
        match self {
            XmlNode::Element(element) => element.outer_xml(),
            XmlNode::Text(text) => escape(text, false),
            XmlNode::Attribute(attribute) => {
                format!("{}=\"{}\"", attribute.name, escape(&attribute.value, true))
            }
        }
    }
}

impl From<XmlElement> for XmlNode {
    fn from(element: XmlElement) -> Self {
        XmlNode::Element(element)
    }
}

impl fmt::Display for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.outer_xml())
    }
}

pub(crate) fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn escape(text: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
