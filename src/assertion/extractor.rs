use crate::error::{Result, RucheckError};
use serde_json::Value;

/// JSON 路径片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// 解析 JSON 路径
///
/// 支持的格式：
/// - `$` 整个文档
/// - `$.user.name` / `user.name`
/// - `$['user']["name"]`
/// - `$.items[0].id`
pub fn parse_json_path(path: &str) -> Result<Vec<PathSegment>> {
    let invalid = |reason: &str| RucheckError::InvalidSelector {
        selector: path.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = path.trim();
    let rest = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let chars: Vec<char> = rest.chars().collect();
    let mut segments = Vec::new();
    let mut i = 0;

    // 不带 `$` 的路径允许直接以键名开头
    let mut expect_key = !trimmed.starts_with('$');

    while i < chars.len() {
        match chars[i] {
            '.' if !expect_key => {
                expect_key = true;
                i += 1;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| invalid("unclosed bracket"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                let inner = inner.trim();
                let quoted = ['\'', '"'].iter().find_map(|&quote| {
                    inner
                        .strip_prefix(quote)
                        .and_then(|s| s.strip_suffix(quote))
                });
                let segment = match quoted {
                    Some(key) => PathSegment::Key(key.to_string()),
                    None => PathSegment::Index(
                        inner
                            .parse()
                            .map_err(|_| invalid("bracket must hold an index or a quoted name"))?,
                    ),
                };
                segments.push(segment);
                expect_key = false;
                i = close + 1;
            }
            _ if expect_key => {
                let end = chars[i..]
                    .iter()
                    .position(|&c| c == '.' || c == '[')
                    .map_or(chars.len(), |offset| i + offset);
                let key: String = chars[i..end].iter().collect();
                if key.is_empty() {
                    return Err(invalid("empty name"));
                }
                segments.push(PathSegment::Key(key));
                expect_key = false;
                i = end;
            }
            c => return Err(invalid(&format!("unexpected character '{}'", c))),
        }
    }

    if expect_key && !chars.is_empty() {
        return Err(invalid("path ends with '.'"));
    }
    Ok(segments)
}

/// 按路径取值
///
/// 缺失或为 null 时返回 None；字符串去掉引号，其他值为紧凑 JSON 文本。
pub fn extract_json_value(body: &str, path: &str) -> Result<Option<String>> {
    let segments = parse_json_path(path)?;
    let json_value: Value = serde_json::from_str(body)?;

    let mut current = &json_value;
    for segment in &segments {
        let next = match segment {
            PathSegment::Key(key) => current.get(key.as_str()),
            PathSegment::Index(index) => current.get(*index),
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }

    Ok(json_value_to_string(current))
}

fn json_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
