use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// 被校验的响应类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Json,
    Xml,
}

/// 期望值中可识别的运算符前缀
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorRule {
    /// `#flip#expectation`
    Flip,
    /// `~notequals("expectation")`
    NotEquals,
    /// `empty...`
    Empty,
    /// `notempty...`
    NotEmpty,
    /// `~blank...` 或全空白
    Blank,
    /// `~notblank...`
    NotBlank,
    /// `~contains(value)`
    Contains,
    /// `~count(n)`，仅 XML
    Count,
}

/// 运算符的匹配顺序，第一个匹配的规则生效
pub const OPERATOR_ORDER: [OperatorRule; 8] = [
    OperatorRule::Flip,
    OperatorRule::NotEquals,
    OperatorRule::Empty,
    OperatorRule::NotEmpty,
    OperatorRule::Blank,
    OperatorRule::NotBlank,
    OperatorRule::Contains,
    OperatorRule::Count,
];

impl OperatorRule {
    pub fn source(&self) -> &'static str {
        match self {
            Self::Flip => r"(?i)^#flip#(.*)$",
            Self::NotEquals => r#"(?i)^~notequals\(\s*"(.*)"\s*\)\s*$"#,
            Self::Empty => r"(?i)^empty.*$",
            Self::NotEmpty => r"(?i)^notempty.*$",
            Self::Blank => r"(?i)^~blank.*$|^\s*$",
            Self::NotBlank => r"(?i)^~notblank.*$",
            Self::Contains => r"(?i)^~contains\((.*)\)$",
            Self::Count => r"(?i)^~count\(\s*(\d.*)\s*\)$",
        }
    }

    pub fn pattern(&self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            OPERATOR_ORDER
                .iter()
                .map(|rule| Regex::new(rule.source()).unwrap())
                .collect()
        });
        &patterns[*self as usize]
    }

    /// `~count` 只对 XML 节点集有意义
    pub fn applies_to(&self, dialect: Dialect) -> bool {
        !matches!((self, dialect), (Self::Count, Dialect::Json))
    }
}

/// 期望值的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// 内层期望不成立时通过
    Negate(String),
    Empty,
    NotEmpty,
    Blank,
    NotBlank,
    /// JSON 为子串；XML 为 `|` 分隔的候选值，任一命中即可
    Contains(String),
    Count(usize),
    /// 无运算符：JSON 相等比较，XML 结构比较
    Equals,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Negate(inner) => write!(f, "not({})", inner),
            Operator::Empty => write!(f, "empty"),
            Operator::NotEmpty => write!(f, "not empty"),
            Operator::Blank => write!(f, "blank"),
            Operator::NotBlank => write!(f, "not blank"),
            Operator::Contains(value) => write!(f, "contains({})", value),
            Operator::Count(count) => write!(f, "count({})", count),
            Operator::Equals => write!(f, "equals"),
        }
    }
}
