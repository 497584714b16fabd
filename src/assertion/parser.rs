use crate::assertion::types::{Dialect, OPERATOR_ORDER, Operator, OperatorRule};
use crate::error::{Result, RucheckError};
use tracing::debug;

/// 识别期望值中的运算符
///
/// 按 [`OPERATOR_ORDER`] 依次尝试（不区分大小写），都不匹配时为 [`Operator::Equals`]。
/// 仅 `~count` 的数字无法解析时返回错误。
///
/// - `#flip#<a>1</a>` / `~notequals("abc")` → 取反
/// - `empty` / `notempty`
/// - `~blank`（或全空白）/ `~notblank`
/// - `~contains(abc)`
/// - `~count(2)`（仅 XML）
pub fn classify(expectation: &str, dialect: Dialect) -> Result<Operator> {
    for rule in OPERATOR_ORDER {
        if !rule.applies_to(dialect) {
            continue;
        }
        let Some(caps) = rule.pattern().captures(expectation) else {
            continue;
        };
        let group = |index| caps.get(index).map_or("", |m| m.as_str()).to_string();

        let operator = match rule {
            OperatorRule::Flip | OperatorRule::NotEquals => Operator::Negate(group(1)),
            OperatorRule::Empty => Operator::Empty,
            OperatorRule::NotEmpty => Operator::NotEmpty,
            OperatorRule::Blank => Operator::Blank,
            OperatorRule::NotBlank => Operator::NotBlank,
            OperatorRule::Contains => Operator::Contains(group(1)),
            OperatorRule::Count => {
                let count = group(1).trim().parse().map_err(|_| {
                    RucheckError::InvalidExpectation(format!(
                        "Invalid count in ~count expression {}",
                        expectation
                    ))
                })?;
                Operator::Count(count)
            }
        };
        debug!(?dialect, %operator, "expectation classified");
        return Ok(operator);
    }

    Ok(Operator::Equals)
}
