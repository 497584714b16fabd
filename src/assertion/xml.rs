use crate::assertion::parser::classify;
use crate::assertion::types::{Dialect, Operator};
use crate::error::{Result, RucheckError};
use crate::xml::diff::{Diff, DiffOptions, compare, compare_node, is_similar_node};
use crate::xml::node::{XmlAttribute, XmlElement, XmlNode};
use crate::xml::parse::parse_element;
use crate::xml::xpath::select_nodes;
use tracing::debug;

fn evaluate(actual_xml: &str, selector: &str) -> Result<Vec<XmlNode>> {
    let nodes = select_nodes(actual_xml, selector)?;
    debug!(selector, nodes = nodes.len(), "xpath evaluated");
    Ok(nodes)
}

fn no_value(selector: &str, expectation: &str) -> String {
    format!(
        "Xpath expression {}\n did not retrieve any value\nbut expected {}\n",
        selector, expectation
    )
}

/// 校验 XPath 查询结果
///
/// 通过时返回空字符串，不通过时返回诊断信息。文档或选择器无效时返回错误。
pub fn validate_xml_response(actual_xml: &str, selector: &str, expectation: &str) -> Result<String> {
    let operator = classify(expectation, Dialect::Xml)?;
    if let Operator::Negate(inner) = &operator {
        let message = if validate_xml_response(actual_xml, selector, inner)?.is_empty() {
            format!(
                "Result of xpath expression \n{}\nshould not match\n{}",
                selector, inner
            )
        } else {
            String::new()
        };
        return Ok(message);
    }

    let nodes = evaluate(actual_xml, selector)?;
    let first = nodes.first();

    let message = match operator {
        Operator::Empty => match first {
            Some(node) if !node.inner_text().is_empty() => format!(
                "Result of xpath expression \n{}\nshould be empty but was\n{}",
                selector,
                node.outer_xml()
            ),
            _ => String::new(),
        },
        Operator::NotEmpty => {
            if first.is_none_or(|node| node.inner_text().is_empty()) {
                format!("Result of xpath expression \n{}\nshould not be empty", selector)
            } else {
                String::new()
            }
        }
        Operator::Blank => match first {
            Some(node) if !node.inner_text().trim().is_empty() => format!(
                "Result of xpath expression \n{}\nshould be blank but was\n{}",
                selector,
                node.outer_xml()
            ),
            _ => String::new(),
        },
        Operator::NotBlank => {
            if first.is_none_or(|node| node.inner_text().trim().is_empty()) {
                format!("Result of xpath expression \n{}\nshould not be blank", selector)
            } else {
                String::new()
            }
        }
        Operator::Contains(values) => match first {
            None => no_value(selector, expectation),
            Some(node) => {
                let outer_xml = node.outer_xml();
                if values.split('|').any(|value| outer_xml.contains(value)) {
                    String::new()
                } else {
                    format!(
                        "Xpath expression {}\n with result {}\ndid not contain any value from\n{}",
                        selector, outer_xml, expectation
                    )
                }
            }
        },
        Operator::Count(count) => {
            if nodes.len() == count {
                String::new()
            } else {
                format!(
                    "Xpath expression\n{}\nreturned a wrong number of results",
                    selector
                )
            }
        }
        Operator::Equals => match first {
            None => no_value(selector, expectation),
            Some(node) => {
                let diff = compare_structure(node, expectation)?;
                if diff.has_differences() {
                    format!(
                        "Xpath expression \n{}\nwith result\n{}\ndoes not match value\n{}\n in response \n{}\n and differences are \n{}\n",
                        selector,
                        node.outer_xml(),
                        expectation,
                        actual_xml,
                        diff
                    )
                } else {
                    String::new()
                }
            }
        },
        Operator::Negate(_) => String::new(),
    };

    Ok(message)
}

/// 把期望值与实际节点做结构比较
///
/// 元素节点：期望值不以 `<tag>` 开头时用实际节点的标签包裹后解析；
/// 期望中含子元素时先过滤实际节点中多余的子节点。
/// 文本与属性节点直接比较值。
pub fn compare_structure(actual: &XmlNode, expectation: &str) -> Result<Diff> {
    let options = DiffOptions::default();

    let element = match actual {
        XmlNode::Element(element) => element,
        XmlNode::Text(_) => {
            return Ok(compare_node(actual, &XmlNode::Text(expectation.to_string()), &options));
        }
        XmlNode::Attribute(attribute) => {
            let expected = XmlAttribute::new(attribute.name.clone(), expectation);
            return Ok(compare_node(actual, &XmlNode::Attribute(expected), &options));
        }
    };

    let tag = &element.name;
    let expected_xml = if expectation.starts_with(&format!("<{}>", tag)) {
        expectation.to_string()
    } else {
        format!("<{0}>{1}</{0}>", tag, expectation)
    };
    let expected = parse_element(&expected_xml)?;

    let (filtered, expected) = filter_extra_elements(element, &expected, &options);
    Ok(compare(&filtered, &expected, &options))
}

/// 按 (节点名, 原始位置) 排序子节点，返回新元素
pub fn canonical_order(element: &XmlElement) -> XmlElement {
    let mut ordered = element.clone();
    // 稳定排序，同名节点保持原始顺序
    ordered.children.sort_by(|a, b| a.name().cmp(b.name()));
    ordered
}

/// 去掉实际元素中期望里没有的子节点
///
/// 只在期望含子元素时生效。两侧按规范顺序排列后双指针遍历：
/// 名称相同且相似则两侧前进，否则丢弃实际侧的当前节点。
/// 返回过滤后的实际元素和排序后的期望元素。
pub fn filter_extra_elements(
    actual: &XmlElement,
    expected: &XmlElement,
    options: &DiffOptions,
) -> (XmlElement, XmlElement) {
    if !expected.has_element_children() {
        return (actual.clone(), expected.clone());
    }

    let mut actual = canonical_order(actual);
    let expected = canonical_order(expected);

    let mut kept = Vec::with_capacity(expected.children.len());
    let mut wanted = expected.children.iter().peekable();
    for child in std::mem::take(&mut actual.children) {
        let Some(next) = wanted.peek() else {
            break;
        };
        if child.name() == next.name() && is_similar_node(&child, next, options) {
            kept.push(child);
            wanted.next();
        } else {
            debug!(dropped = %child, "unexpected child filtered");
        }
    }

    actual.children = kept;
    (actual, expected)
}

/// 从 XML 中取变量值
///
/// 第一个节点含子元素时取其完整标记，否则取其文本。
pub fn evaluate_xpath_variable(xml: &str, selector: &str) -> Result<String> {
    let nodes = evaluate(xml, selector)?;
    let first = nodes
        .first()
        .ok_or_else(|| RucheckError::SelectorMiss(selector.to_string()))?;

    if first.has_element_children() {
        Ok(first.outer_xml())
    } else {
        Ok(first.inner_text())
    }
}
