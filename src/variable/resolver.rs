//! 替换引擎
//!
//! 指令按 [`DIRECTIVE_ORDER`] 的顺序逐条应用，每条规则从左到右替换文本中的全部匹配；
//! 一轮中只要有规则命中就从头再来一轮，直到某一轮没有任何匹配为止。
//! 替换结果本身可以包含新的指令（例如 `~getkey` 生成的值被后面的 `{name}` 引用）。

use crate::error::{Result, RucheckError};
use crate::variable::date::{DEFAULT_DATE_FORMAT, DateShift, format_datetime};
use crate::variable::generator::{generate_key_value, random_mask, randomize};
use crate::variable::store::{VariableStore, normalize_key};
use chrono::TimeDelta;
use regex::{Captures, Match, Regex};
use std::sync::OnceLock;
use tracing::{debug, info, trace};

/// 替换指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `~getkey(name, format)`
    GetKey,
    /// `~concat[[ ... ]]`
    Concat,
    /// `~today+1{yyyy-MM-dd}` 等日期函数
    DateShift,
    /// `#getdate(delta)`
    GetDate,
    /// `#gettime(code)`
    GetTime,
    /// `~random{mask}`
    Random,
    /// `~randomize{alpha,numeric}`
    Randomize,
    /// `~substring({var}, start)`
    SubstringFrom,
    /// `~substring({var}, start, length)`
    SubstringRange,
    /// `{name}`
    Lookup,
    /// `~replace(text, "from", "to")`
    Replace,
}

/// 指令的应用顺序
pub const DIRECTIVE_ORDER: [Directive; 11] = [
    Directive::GetKey,
    Directive::Concat,
    Directive::DateShift,
    Directive::GetDate,
    Directive::GetTime,
    Directive::Random,
    Directive::Randomize,
    Directive::SubstringFrom,
    Directive::SubstringRange,
    Directive::Lookup,
    Directive::Replace,
];

impl Directive {
    /// 指令的匹配模式
    pub fn source(&self) -> &'static str {
        match self {
            Self::GetKey => r"(?i)~getkey\(([^,]*),(.*?)\)",
            Self::Concat => r"(?i)~concat\[\[(.*)\]\]",
            Self::DateShift => concat!(
                r"(?i)~(dw|lastmonthw|lastweekw|lastyearw|mw|nextmonthw|nextweekw|nextyearw|",
                r"thisyearw|todayw|tomorroww|yesterdayw|yw|workingdays|d|lastmonth|lastweek|",
                r"lastyear|m|nextmonth|nextweek|nextyear|thisyear|today|tomorrow|yesterday|y)",
                r"([+-]?\d+)?(\{(.*?)\})?"
            ),
            Self::GetDate => r"(?i)#getdate\(\s*([+-]?\d+)\s*\)",
            Self::GetTime => r"(?i)#gettime\((.*)\)",
            Self::Random => r"(?i)~random\{([^{}]*)\}",
            Self::Randomize => r"(?i)~randomize\{(\d+)(\s*,\s*(\d+))?[^}]*\}",
            Self::SubstringFrom => r"(?i)~substring\s*\(\s*(\{[^}]*\})\s*,\s*(\d+)\s*\)",
            Self::SubstringRange => {
                r"(?i)~substring\s*\(\s*(\{[^}]*\})\s*,\s*(\d+)\s*,\s*(\d+)\s*\)"
            }
            // 变量名区分大小写地匹配，查找时统一转小写
            Self::Lookup => r"(\{[^:{}]*\})",
            Self::Replace => r#"(?i)~replace\s*\(\s*([^~]*)\s*,\s*"(.*)"\s*,\s*"(.*)"\s*\)"#,
        }
    }

    pub fn pattern(&self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            DIRECTIVE_ORDER
                .iter()
                .map(|directive| Regex::new(directive.source()).unwrap())
                .collect()
        });
        &patterns[*self as usize]
    }
}

fn time_format_pattern() -> &'static Regex {
    static TIME_FORMAT: OnceLock<Regex> = OnceLock::new();
    TIME_FORMAT.get_or_init(|| Regex::new(r#"(?i)text\(now\(\).*?"(.*?)""#).unwrap())
}

impl VariableStore {
    /// 把文本中的全部指令替换为具体值
    ///
    /// 任一指令出错（未定义变量、无法解析的数字、缺少格式）都会中止整个替换。
    pub fn substitute(&mut self, text: &str) -> Result<String> {
        let mut current = text.to_string();

        for pass in 1..=self.max_passes {
            let mut fired = false;
            for directive in DIRECTIVE_ORDER {
                if let Some(rewritten) = self.apply_rule(directive, &current)? {
                    current = rewritten;
                    fired = true;
                }
            }
            if !fired {
                trace!(passes = pass, "substitution settled");
                return Ok(current);
            }
        }

        Err(RucheckError::RewriteLimit {
            passes: self.max_passes,
        })
    }

    /// 单条规则的一次扫描，没有匹配时返回 None
    fn apply_rule(&mut self, directive: Directive, text: &str) -> Result<Option<String>> {
        let pattern = directive.pattern();
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        let mut fired = false;

        for caps in pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let value = self.expand(directive, &caps)?;
            debug!(?directive, matched = whole.as_str(), value = %value, "directive applied");
            output.push_str(&text[last..whole.start()]);
            output.push_str(&value);
            last = whole.end();
            fired = true;
        }

        if !fired {
            return Ok(None);
        }
        output.push_str(&text[last..]);
        Ok(Some(output))
    }

    fn expand(&mut self, directive: Directive, caps: &Captures<'_>) -> Result<String> {
        match directive {
            Directive::GetKey => {
                let key = normalize_key(&caps[1]);
                let format = caps[2].replace(',', "");
                let value = generate_key_value(&mut self.rng, &format, self.clock.now());
                info!(key = %key, value = %value, "generated key");
                self.variables.insert(key, value.clone());
                Ok(value)
            }
            Directive::Concat => self.concat(&caps[1]),
            Directive::DateShift => {
                let delta = parse_delta(caps.get(2))?;
                let format = caps
                    .get(4)
                    .map(|m| m.as_str().trim())
                    .filter(|format| !format.is_empty())
                    .unwrap_or(DEFAULT_DATE_FORMAT);
                self.shift_date(&caps[1], delta, format)
            }
            Directive::GetDate => {
                let delta = parse_delta(caps.get(1))?;
                self.shift_date("today", delta, DEFAULT_DATE_FORMAT)
            }
            Directive::GetTime => {
                let now = self.clock.now();
                // 参数里出现 "-1" 就回拨一小时，其余参数一律视为当前时间
                let time = if caps[1].contains("-1") {
                    now - TimeDelta::hours(1)
                } else {
                    now
                };
                Ok(time.format("%H:%M:%S").to_string())
            }
            Directive::Random => Ok(random_mask(&mut self.rng, &caps[1])),
            Directive::Randomize => {
                let alpha = parse_count(&caps[1])?;
                let numeric = caps.get(3).map(|m| parse_count(m.as_str())).transpose()?;
                Ok(randomize(&mut self.rng, alpha, numeric))
            }
            Directive::SubstringFrom => {
                let start = parse_count(&caps[2])?;
                substring(&caps[1], self.lookup(&caps[1])?, start, None)
            }
            Directive::SubstringRange => {
                let start = parse_count(&caps[2])?;
                let length = parse_count(&caps[3])?;
                substring(&caps[1], self.lookup(&caps[1])?, start, Some(length))
            }
            Directive::Lookup => self.lookup(&caps[1]).map(str::to_string),
            Directive::Replace => {
                if caps[2].is_empty() {
                    return Err(RucheckError::MalformedDirective(format!(
                        "empty search text in {}",
                        &caps[0]
                    )));
                }
                Ok(caps[1].replace(&caps[2], &caps[3]))
            }
        }
    }

    fn lookup(&self, key: &str) -> Result<&str> {
        let key = normalize_key(key);
        self.variables
            .get(&key)
            .map(String::as_str)
            .ok_or(RucheckError::UndefinedVariable(key))
    }

    fn shift_date(&self, name: &str, delta: i64, format: &str) -> Result<String> {
        let shift = DateShift::find(name).ok_or_else(|| {
            RucheckError::MalformedDirective(format!("unknown date function {}", name))
        })?;
        let date = shift.apply(self.clock.now(), delta).ok_or_else(|| {
            RucheckError::MalformedDirective(format!("date out of range for {}{:+}", name, delta))
        })?;
        Ok(format_datetime(date, format))
    }

    /// `~concat[[...]]`：`+`/`&` 连接的字面量与 `text(now(), "格式")`
    fn concat(&self, expression: &str) -> Result<String> {
        let expression = expression.replace('&', "+");
        let mut result = String::new();

        for term in expression.split('+') {
            if term.to_lowercase().contains("text(now()") {
                let caps = time_format_pattern().captures(term).ok_or_else(|| {
                    RucheckError::MalformedDirective(format!(
                        "missing format in text(now() expression {}",
                        term.trim()
                    ))
                })?;
                let format = caps[1].replace('Y', "y").replace('D', "d");
                result.push_str(&format_datetime(self.clock.now(), &format));
            } else {
                result.push_str(&term.replace('"', ""));
            }
        }

        Ok(result)
    }
}

fn parse_delta(delta: Option<Match<'_>>) -> Result<i64> {
    match delta {
        None => Ok(0),
        Some(m) => m.as_str().parse::<i32>().map(i64::from).map_err(|_| {
            RucheckError::MalformedDirective(format!(
                "unparsable index {} in date expression",
                m.as_str()
            ))
        }),
    }
}

fn parse_count(text: &str) -> Result<usize> {
    text.trim()
        .parse()
        .map_err(|_| RucheckError::MalformedDirective(format!("unparsable number {}", text)))
}

/// 按字符位置截取，越界视为指令错误
fn substring(key: &str, value: &str, start: usize, length: Option<usize>) -> Result<String> {
    let total = value.chars().count();
    let end = match length {
        Some(length) => start.checked_add(length),
        None => Some(total),
    };
    match end {
        Some(end) if start <= total && end <= total => {
            Ok(value.chars().skip(start).take(end - start).collect())
        }
        _ => Err(RucheckError::MalformedDirective(format!(
            "substring range out of bounds for {} (length {})",
            key.to_lowercase(),
            total
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::date::FixedClock;
    use chrono::{TimeZone, Utc};

    /// 2024-05-15（周三）14:05:09 UTC
    fn store() -> VariableStore {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 14, 5, 9).unwrap();
        VariableStore::new().with_clock(FixedClock(now)).with_seed(42)
    }

    #[test]
    fn test_directive_order_is_fixed() {
        assert_eq!(
            DIRECTIVE_ORDER,
            [
                Directive::GetKey,
                Directive::Concat,
                Directive::DateShift,
                Directive::GetDate,
                Directive::GetTime,
                Directive::Random,
                Directive::Randomize,
                Directive::SubstringFrom,
                Directive::SubstringRange,
                Directive::Lookup,
                Directive::Replace,
            ]
        );
        for (index, directive) in DIRECTIVE_ORDER.iter().enumerate() {
            assert_eq!(*directive as usize, index);
        }
    }

    #[test]
    fn test_all_patterns_compile() {
        for directive in DIRECTIVE_ORDER {
            assert!(directive.pattern().as_str() == directive.source());
        }
    }

    #[test]
    fn test_plain_text_unchanged() {
        let mut store = store();
        let text = r#"{"name": "value", "list": [1, 2]}"#;
        assert_eq!(store.substitute(text).unwrap(), text);
    }

    #[test]
    fn test_lookup() {
        let mut store = store();
        store.store_variable("PolicyId", "P-100");
        assert_eq!(
            store.substitute("<id>{policyid}</id><id>{POLICYID}</id>").unwrap(),
            "<id>P-100</id><id>P-100</id>"
        );
    }

    #[test]
    fn test_lookup_undefined() {
        let mut store = store();
        let err = store.substitute("id={missing}").unwrap_err();
        assert!(matches!(err, RucheckError::UndefinedVariable(key) if key == "{missing}"));
    }

    #[test]
    fn test_date_shifts() {
        let mut store = store();
        assert_eq!(store.substitute("~today").unwrap(), "05/15/2024");
        assert_eq!(store.substitute("~TODAY+1").unwrap(), "05/16/2024");
        assert_eq!(store.substitute("~yesterday{yyyy-MM-dd}").unwrap(), "2024-05-14");
        assert_eq!(store.substitute("~d-15{ dd.MM.yy }").unwrap(), "30.04.24");
        assert_eq!(store.substitute("~lastmonth{MM/yyyy}").unwrap(), "04/2024");
        assert_eq!(store.substitute("~nextyear{yyyy}").unwrap(), "2025");
        assert_eq!(store.substitute("~workingdays+3").unwrap(), "05/20/2024");
        assert_eq!(store.substitute("~workingdays-3{dd}").unwrap(), "10");
        assert_eq!(store.substitute("from ~todayw+3 to ~dw+4").unwrap(), "from 05/20/2024 to 05/20/2024");
    }

    #[test]
    fn test_date_shift_delta_overflow() {
        let mut store = store();
        let err = store.substitute("~today+99999999999").unwrap_err();
        assert!(matches!(err, RucheckError::MalformedDirective(_)));
    }

    #[test]
    fn test_getdate_and_gettime() {
        let mut store = store();
        assert_eq!(store.substitute("#getdate(-1)").unwrap(), "05/14/2024");
        assert_eq!(store.substitute("#getdate( 2 )").unwrap(), "05/17/2024");
        assert_eq!(store.substitute("#gettime(now)").unwrap(), "14:05:09");
        assert_eq!(store.substitute("#gettime(-1)").unwrap(), "13:05:09");
        // 只识别 "-1"，其余偏移不生效
        assert_eq!(store.substitute("#gettime(-2)").unwrap(), "14:05:09");
        assert_eq!(store.substitute("#gettime(x-10)").unwrap(), "13:05:09");
    }

    #[test]
    fn test_concat() {
        let mut store = store();
        assert_eq!(
            store
                .substitute(r#"~concat[["ID-" & text(now(), "YYYYMMDD") + "-X"]]"#)
                .unwrap(),
            "ID-20240515-X"
        );
    }

    #[test]
    fn test_concat_missing_format() {
        let mut store = store();
        let err = store.substitute("~concat[[text(now())]]").unwrap_err();
        assert!(matches!(err, RucheckError::MalformedDirective(_)));
    }

    #[test]
    fn test_random_directives() {
        let mut store = store();
        let value = store.substitute("~random{AA-999}").unwrap();
        assert_eq!(value.len(), 6);
        assert!(value[..2].chars().all(|c| c.is_ascii_uppercase()));

        let value = store.substitute("~randomize{5}").unwrap();
        assert_eq!(value.len(), 5);
        assert!(value.chars().all(|c| c.is_ascii_alphabetic()));

        let value = store.substitute("~randomize{2, 3}").unwrap();
        assert_eq!(value.len(), 5);
        assert!(value[2..].chars().all(|c| c.is_ascii_digit()));

        let value = store.substitute("~randomize{0,10}").unwrap();
        assert_eq!(value.len(), 10);
        for start in [0, 3, 6] {
            assert_ne!(&value[start..start + 1], "0");
        }
    }

    #[test]
    fn test_getkey_stores_value() {
        let mut store = store();
        let body = store
            .substitute("<ref>~getkey(Ref,AAA-NNNN)</ref><copy>{ref}</copy>")
            .unwrap();
        let stored = store.get("ref").unwrap().to_string();
        assert_eq!(stored.len(), 8);
        assert_eq!(&stored[3..4], "-");
        assert_eq!(body, format!("<ref>{}</ref><copy>{}</copy>", stored, stored));
    }

    #[test]
    fn test_substring() {
        let mut store = store();
        store.store_variable("number", "ABC12345");
        assert_eq!(store.substitute("~substring({NUMBER}, 3)").unwrap(), "12345");
        assert_eq!(store.substitute("~substring( {number} ,0,3 )").unwrap(), "ABC");

        let err = store.substitute("~substring({number}, 5, 9)").unwrap_err();
        assert!(matches!(err, RucheckError::MalformedDirective(_)));

        let err = store.substitute("~substring({other}, 1)").unwrap_err();
        assert!(matches!(err, RucheckError::UndefinedVariable(_)));
    }

    #[test]
    fn test_replace_runs_after_lookup() {
        let mut store = store();
        store.store_variable("phone", "555-123-4567");
        assert_eq!(
            store.substitute(r#"~replace({phone}, "-", "")"#).unwrap(),
            "5551234567"
        );
    }

    #[test]
    fn test_replace_empty_search_is_error() {
        let mut store = store();
        let err = store.substitute(r#"~replace(abc, "", "x")"#).unwrap_err();
        assert!(matches!(err, RucheckError::MalformedDirective(_)));
    }

    #[test]
    fn test_output_feeding_later_directive() {
        let mut store = store();
        store.store_variable("when", "~today+1");
        assert_eq!(store.substitute("{when}").unwrap(), "05/16/2024");
    }

    #[test]
    fn test_substitute_idempotent_after_fixpoint() {
        let mut store = store();
        store.store_variable("name", "Alice");
        let once = store.substitute("Hello {name}, today is ~today").unwrap();
        let twice = store.substitute(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_self_referencing_variable_hits_limit() {
        let mut store = store().with_max_passes(5);
        store.store_variable("loop", "{loop}");
        let err = store.substitute("{loop}").unwrap_err();
        assert!(matches!(err, RucheckError::RewriteLimit { passes: 5 }));
    }
}
