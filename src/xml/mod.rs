//! XML 文档模型、XPath 选择与相似性比较
pub mod diff;
pub mod node;
pub mod parse;
pub mod xpath;

pub use diff::{Diff, DiffOptions, Difference, DifferenceKind, compare, compare_node, is_similar};
pub use node::{XmlAttribute, XmlElement, XmlNode};
pub use parse::{parse_element, parse_package};
pub use xpath::{XPath, select_nodes};
