use crate::xml::node::{XmlAttribute, XmlElement, XmlNode, local_part};
use std::fmt;

/// 相似性比较选项
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// 比较文本前去掉首尾空白
    pub ignore_whitespace: bool,
    /// 不参与比较的属性（按本地名）
    pub ignored_attributes: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_whitespace: true,
            ignored_attributes: vec!["nil".to_string()],
        }
    }
}

impl DiffOptions {
    fn keeps(&self, attribute: &XmlAttribute) -> bool {
        !self
            .ignored_attributes
            .iter()
            .any(|ignored| ignored == attribute.local_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    ElementName,
    NodeType,
    TextValue,
    AttributeValue,
    MissingAttribute,
    UnexpectedAttribute,
    MissingChild,
    UnexpectedChild,
}

impl DifferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElementName => "element name",
            Self::NodeType => "node type",
            Self::TextValue => "text value",
            Self::AttributeValue => "attribute value",
            Self::MissingAttribute => "attribute",
            Self::UnexpectedAttribute => "no attribute",
            Self::MissingChild => "child node",
            Self::UnexpectedChild => "no child node",
        }
    }
}

/// 单个差异，`path` 指向期望侧的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub kind: DifferenceKind,
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} '{}' but was '{}' - at {}",
            self.kind.as_str(),
            self.expected,
            self.actual,
            self.path
        )
    }
}

/// 比较结果
#[derive(Debug, Clone, Default)]
pub struct Diff {
    differences: Vec<Difference>,
}

impl Diff {
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for difference in &self.differences {
            writeln!(f, "{}", difference)?;
        }
        Ok(())
    }
}

/// 比较实际元素与期望元素
pub fn compare(actual: &XmlElement, expected: &XmlElement, options: &DiffOptions) -> Diff {
    let mut diff = Diff::default();
    let path = format!("/{}[1]", expected.name);
    compare_elements(actual, expected, &path, options, &mut diff.differences);
    diff
}

/// 比较任意两个节点，文本与属性节点按值比较
pub fn compare_node(actual: &XmlNode, expected: &XmlNode, options: &DiffOptions) -> Diff {
    let mut diff = Diff::default();
    let path = match expected {
        XmlNode::Attribute(attribute) => format!("/@{}", attribute.name),
        _ => child_path("", std::slice::from_ref(expected), 0),
    };
    compare_nodes(actual, expected, &path, options, &mut diff.differences);
    diff
}

/// 两棵子树是否相似
pub fn is_similar(actual: &XmlElement, expected: &XmlElement, options: &DiffOptions) -> bool {
    !compare(actual, expected, options).has_differences()
}

/// 两个节点是否相似
pub fn is_similar_node(actual: &XmlNode, expected: &XmlNode, options: &DiffOptions) -> bool {
    !compare_node(actual, expected, options).has_differences()
}

fn compare_elements(
    actual: &XmlElement,
    expected: &XmlElement,
    path: &str,
    options: &DiffOptions,
    out: &mut Vec<Difference>,
) {
    if actual.local_name() != expected.local_name() {
        out.push(Difference {
            kind: DifferenceKind::ElementName,
            path: path.to_string(),
            expected: expected.name.clone(),
            actual: actual.name.clone(),
        });
        return;
    }

    compare_attributes(actual, expected, path, options, out);

    let shared = actual.children.len().min(expected.children.len());
    for index in 0..shared {
        let child_path = child_path(path, &expected.children, index);
        compare_nodes(
            &actual.children[index],
            &expected.children[index],
            &child_path,
            options,
            out,
        );
    }
    for (index, missing) in expected.children.iter().enumerate().skip(shared) {
        out.push(Difference {
            kind: DifferenceKind::MissingChild,
            path: child_path(path, &expected.children, index),
            expected: missing.outer_xml(),
            actual: String::new(),
        });
    }
    for (index, extra) in actual.children.iter().enumerate().skip(shared) {
        out.push(Difference {
            kind: DifferenceKind::UnexpectedChild,
            path: child_path(path, &actual.children, index),
            expected: String::new(),
            actual: extra.outer_xml(),
        });
    }
}

fn compare_attributes(
    actual: &XmlElement,
    expected: &XmlElement,
    path: &str,
    options: &DiffOptions,
    out: &mut Vec<Difference>,
) {
    let find = |attributes: &[XmlAttribute], name: &str| {
        attributes
            .iter()
            .find(|attribute| attribute.local_name() == name)
            .cloned()
    };

    for wanted in expected.attributes.iter().filter(|a| options.keeps(a)) {
        let attribute_path = format!("{}/@{}", path, wanted.name);
        match find(&actual.attributes, wanted.local_name()) {
            Some(found) if found.value != wanted.value => out.push(Difference {
                kind: DifferenceKind::AttributeValue,
                path: attribute_path,
                expected: wanted.value.clone(),
                actual: found.value,
            }),
            Some(_) => {}
            None => out.push(Difference {
                kind: DifferenceKind::MissingAttribute,
                path: attribute_path,
                expected: wanted.name.clone(),
                actual: String::new(),
            }),
        }
    }

    for extra in actual.attributes.iter().filter(|a| options.keeps(a)) {
        if find(&expected.attributes, extra.local_name()).is_none() {
            out.push(Difference {
                kind: DifferenceKind::UnexpectedAttribute,
                path: format!("{}/@{}", path, extra.name),
                expected: String::new(),
                actual: extra.name.clone(),
            });
        }
    }
}

fn compare_nodes(
    actual: &XmlNode,
    expected: &XmlNode,
    path: &str,
    options: &DiffOptions,
    out: &mut Vec<Difference>,
) {
    match (actual, expected) {
        (XmlNode::Element(a), XmlNode::Element(e)) => compare_elements(a, e, path, options, out),
        (XmlNode::Text(a), XmlNode::Text(e)) => {
            let (a, e) = if options.ignore_whitespace {
                (a.trim(), e.trim())
            } else {
                (a.as_str(), e.as_str())
            };
            if a != e {
                out.push(Difference {
                    kind: DifferenceKind::TextValue,
                    path: path.to_string(),
                    expected: e.to_string(),
                    actual: a.to_string(),
                });
            }
        }
        (XmlNode::Attribute(a), XmlNode::Attribute(e)) => {
            if a.local_name() != e.local_name() {
                out.push(Difference {
                    kind: DifferenceKind::MissingAttribute,
                    path: path.to_string(),
                    expected: e.name.clone(),
                    actual: a.name.clone(),
                });
            } else if a.value != e.value {
                out.push(Difference {
                    kind: DifferenceKind::AttributeValue,
                    path: path.to_string(),
                    expected: e.value.clone(),
                    actual: a.value.clone(),
                });
            }
        }
        _ => out.push(Difference {
            kind: DifferenceKind::NodeType,
            path: path.to_string(),
            expected: expected.outer_xml(),
            actual: actual.outer_xml(),
        }),
    }
}

fn child_path(parent: &str, siblings: &[XmlNode], index: usize) -> String {
    let name = siblings[index].name();
    let position = siblings[..index]
        .iter()
        .filter(|sibling| local_part(sibling.name()) == local_part(name))
        .count()
        + 1;
    match siblings[index] {
        XmlNode::Text(_) => format!("{}/text()[{}]", parent, position),
        _ => format!("{}/{}[{}]", parent, name, position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse::parse_element;

    fn diff(actual: &str, expected: &str) -> Diff {
        compare(
            &parse_element(actual).unwrap(),
            &parse_element(expected).unwrap(),
            &DiffOptions::default(),
        )
    }

    #[test]
    fn test_identical_ignoring_whitespace() {
        let result = diff(
            "<a>\n  <b>  false</b>\n  <c>1</c>\n</a>",
            "<a><b>false</b><c>1</c></a>",
        );
        assert!(!result.has_differences(), "{}", result);
    }

    #[test]
    fn test_nil_attribute_ignored() {
        let result = diff(
            r#"<a xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><d xsi:nil="true" /></a>"#,
            "<a><d /></a>",
        );
        assert!(!result.has_differences(), "{}", result);
    }

    #[test]
    fn test_text_difference() {
        let result = diff("<a><b>1</b></a>", "<a><b>2</b></a>");
        assert_eq!(result.differences().len(), 1);
        let difference = &result.differences()[0];
        assert_eq!(difference.kind, DifferenceKind::TextValue);
        assert_eq!(difference.path, "/a[1]/b[1]/text()[1]");
        assert_eq!(difference.expected, "2");
        assert_eq!(difference.actual, "1");
    }

    #[test]
    fn test_attribute_differences() {
        let result = diff(r#"<a x="1" y="2" />"#, r#"<a x="3" z="4" />"#);
        let kinds: Vec<_> = result.differences().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DifferenceKind::AttributeValue,
                DifferenceKind::MissingAttribute,
                DifferenceKind::UnexpectedAttribute
            ]
        );
    }

    #[test]
    fn test_child_count_differences() {
        let result = diff("<a><b>1</b><c>2</c></a>", "<a><b>1</b></a>");
        assert_eq!(result.differences()[0].kind, DifferenceKind::UnexpectedChild);

        let result = diff("<a><b>1</b></a>", "<a><b>1</b><b>2</b></a>");
        assert_eq!(result.differences()[0].kind, DifferenceKind::MissingChild);
        assert_eq!(result.differences()[0].path, "/a[1]/b[2]");
    }

    #[test]
    fn test_element_name_and_node_type() {
        let result = diff("<a><b>1</b></a>", "<a><c>1</c></a>");
        assert_eq!(result.differences()[0].kind, DifferenceKind::ElementName);

        let result = diff("<a>text</a>", "<a><b /></a>");
        assert_eq!(result.differences()[0].kind, DifferenceKind::NodeType);
    }

    #[test]
    fn test_display_lists_differences() {
        let result = diff("<a><b>1</b></a>", "<a><b>2</b></a>");
        assert_eq!(
            result.to_string(),
            "Expected text value '2' but was '1' - at /a[1]/b[1]/text()[1]\n"
        );
    }

    #[test]
    fn test_compare_text_and_attribute_nodes() {
        let options = DiffOptions::default();
        assert!(is_similar_node(
            &XmlNode::Text(" 42 ".into()),
            &XmlNode::Text("42".into()),
            &options
        ));

        let result = compare_node(
            &XmlNode::Attribute(XmlAttribute::new("id", "1")),
            &XmlNode::Attribute(XmlAttribute::new("id", "2")),
            &options,
        );
        assert_eq!(result.differences()[0].kind, DifferenceKind::AttributeValue);
        assert_eq!(result.differences()[0].path, "/@id");

        let result = compare_node(
            &XmlNode::Text("1".into()),
            &XmlNode::from(XmlElement::new("b")),
            &options,
        );
        assert_eq!(result.differences()[0].kind, DifferenceKind::NodeType);
        assert_eq!(result.differences()[0].path, "/b[1]");
    }
}
