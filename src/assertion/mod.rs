//! 断言模块 - 按期望值中的运算符校验 JSON/XML 查询结果
mod extractor;
mod json;
mod parser;
mod types;
mod xml;

pub use extractor::{PathSegment, extract_json_value, parse_json_path};
pub use json::validate_json_response;
pub use parser::classify;
pub use types::{Dialect, OPERATOR_ORDER, Operator, OperatorRule};
pub use xml::{
    canonical_order, compare_structure, evaluate_xpath_variable, filter_extra_elements,
    validate_xml_response,
};
