use chrono::{DateTime, Months, Utc};
use rand::Rng;

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
/// 数字串首位使用的字符集
pub const LEADING_DIGITS: &str = "123456789";

/// `~getkey` 中生成随机历史日期的特殊格式
pub const TIMESTAMP_KEY_FORMAT: &str = "NNNN-NN-NNTNN:NN:NN";

/// 随机日期距今的年数范围
const TIMESTAMP_YEARS_BACK: std::ops::RangeInclusive<u32> = 21..=30;

/// `~getkey` 格式中的字符类
pub fn key_charset(class: char) -> Option<&'static str> {
    match class {
        'A' => Some(UPPERCASE),
        'a' => Some(LOWERCASE),
        'N' => Some(DIGITS),
        _ => None,
    }
}

pub fn random_char<R: Rng + ?Sized>(rng: &mut R, charset: &str) -> char {
    let bytes = charset.as_bytes();
    char::from(bytes[rng.random_range(0..bytes.len())])
}

/// 指定长度的随机字母串（大小写混合）
pub fn random_letters<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length).map(|_| random_char(rng, LETTERS)).collect()
}

/// 指定长度的随机数字串，首位不为 0
pub fn random_digits<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|i| random_char(rng, if i == 0 { LEADING_DIGITS } else { DIGITS }))
        .collect()
}

/// `~random{mask}`：逐字符展开掩码
///
/// 数字按位置替换（连续数字的第一位不为 0），字母替换为同大小写的随机字母，
/// 其余字符原样保留。
pub fn random_mask<R: Rng + ?Sized>(rng: &mut R, mask: &str) -> String {
    let mut previous_is_digit = false;
    mask.chars()
        .map(|c| {
            let next = if c.is_ascii_digit() {
                random_char(rng, if previous_is_digit { DIGITS } else { LEADING_DIGITS })
            } else if c.is_lowercase() {
                random_char(rng, LOWERCASE)
            } else if c.is_uppercase() {
                random_char(rng, UPPERCASE)
            } else {
                c
            };
            previous_is_digit = c.is_ascii_digit();
            next
        })
        .collect()
}

/// `~randomize{alpha[,numeric]}`
///
/// `{0,10}` 固定生成 3+3+4 三段数字，每段首位不为 0。
pub fn randomize<R: Rng + ?Sized>(rng: &mut R, alpha: usize, numeric: Option<usize>) -> String {
    match numeric {
        None => random_letters(rng, alpha),
        Some(10) if alpha == 0 => {
            let mut value = random_digits(rng, 3);
            value.push_str(&random_digits(rng, 3));
            value.push_str(&random_digits(rng, 4));
            value
        }
        Some(numeric) => {
            let mut value = random_letters(rng, alpha);
            value.push_str(&random_digits(rng, numeric));
            value
        }
    }
}

/// 去掉格式中的 XML 实体
pub fn strip_entities(format: &str) -> String {
    format
        .replace("&amp;", "")
        .replace("&lt;", "")
        .replace("&gt;", "")
}

/// `~getkey` 的取值：按字符类生成，特殊格式生成 21~30 年前的某天零点
pub fn generate_key_value<R: Rng + ?Sized>(rng: &mut R, format: &str, now: DateTime<Utc>) -> String {
    let format = strip_entities(format);
    if format == TIMESTAMP_KEY_FORMAT {
        let years = rng.random_range(TIMESTAMP_YEARS_BACK);
        let date = now
            .date_naive()
            .checked_sub_months(Months::new(years * 12))
            .unwrap_or_else(|| now.date_naive());
        return date.format("%Y-%m-%dT00:00:00").to_string();
    }

    format
        .chars()
        .map(|c| key_charset(c).map_or(c, |charset| random_char(rng, charset)))
        .collect()
}
