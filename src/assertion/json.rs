use crate::assertion::parser::classify;
use crate::assertion::types::{Dialect, Operator};
use crate::error::Result;

/// 校验 JSON 路径查询的结果
///
/// `actual` 为 None 表示路径不存在或值为 null。
/// 通过时返回空字符串，不通过时返回诊断信息。
pub fn validate_json_response(actual: Option<&str>, expectation: &str) -> Result<String> {
    let shown = actual.unwrap_or("");

    let message = match classify(expectation, Dialect::Json)? {
        Operator::Negate(inner) => {
            if validate_json_response(actual, &inner)?.is_empty() {
                format!(
                    "Result of json path expression\n{}\nshould not match\n{}",
                    shown, inner
                )
            } else {
                String::new()
            }
        }
        Operator::Empty => {
            if is_empty(actual) {
                String::new()
            } else {
                format!(
                    "Result of json path expression should be empty but was\n{}",
                    shown
                )
            }
        }
        Operator::NotEmpty => {
            if is_empty(actual) {
                "Result of json path expression should not be empty".to_string()
            } else {
                String::new()
            }
        }
        Operator::Blank => {
            if is_blank(actual) {
                String::new()
            } else {
                format!(
                    "Result of json path expression should be blank but was\n{}",
                    shown
                )
            }
        }
        Operator::NotBlank => {
            if is_blank(actual) {
                "Result of json path expression should not be blank".to_string()
            } else {
                String::new()
            }
        }
        Operator::Contains(value) => {
            if actual.is_some_and(|text| text.contains(value.as_str())) {
                String::new()
            } else {
                format!(
                    "Result of json path expression\n{}\ndoes not contain\n{}",
                    shown, value
                )
            }
        }
        // classify 不会为 JSON 产生 Count
        Operator::Count(_) | Operator::Equals => {
            let wanted = (expectation != "null").then_some(expectation);
            if wanted == actual {
                String::new()
            } else {
                format!(
                    "Result of json path expression\n{}\nshould be equal to\n{}",
                    shown, expectation
                )
            }
        }
    };

    Ok(message)
}

fn is_empty(actual: Option<&str>) -> bool {
    actual.is_none_or(str::is_empty)
}

fn is_blank(actual: Option<&str>) -> bool {
    actual.is_none_or(|text| text.trim().is_empty())
}
