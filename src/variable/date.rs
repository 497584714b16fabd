use chrono::{DateTime, Datelike, Months, TimeDelta, Timelike, Utc, Weekday};
use std::fmt;

/// 未指定格式时的日期格式
pub const DEFAULT_DATE_FORMAT: &str = "MM/dd/yyyy";

/// 时间来源，测试中可替换为固定时间
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统 UTC 时间
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时间
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 日期偏移基准，指令中的 delta 叠加在基准值上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Days(i64),
    Months(i64),
    Years(i64),
    WorkingDays,
}

/// 命名日期函数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateShift {
    pub name: &'static str,
    pub offset: Offset,
    /// 结果落在周末时顺延到下一个工作日
    pub weekday_only: bool,
}

const fn shift(name: &'static str, offset: Offset, weekday_only: bool) -> DateShift {
    DateShift {
        name,
        offset,
        weekday_only,
    }
}

pub const DATE_SHIFTS: &[DateShift] = &[
    shift("d", Offset::Days(0), false),
    shift("dw", Offset::Days(0), true),
    shift("today", Offset::Days(0), false),
    shift("todayw", Offset::Days(0), true),
    shift("tomorrow", Offset::Days(1), false),
    shift("tomorroww", Offset::Days(1), true),
    shift("yesterday", Offset::Days(-1), false),
    shift("yesterdayw", Offset::Days(-1), true),
    shift("lastweek", Offset::Months(-7), false),
    shift("lastweekw", Offset::Days(-7), true),
    shift("nextweek", Offset::Months(7), false),
    shift("nextweekw", Offset::Days(7), true),
    shift("m", Offset::Months(0), false),
    shift("mw", Offset::Months(0), true),
    shift("lastmonth", Offset::Months(-1), false),
    shift("lastmonthw", Offset::Months(-1), true),
    shift("nextmonth", Offset::Months(1), false),
    shift("nextmonthw", Offset::Months(1), true),
    shift("y", Offset::Years(0), false),
    shift("yw", Offset::Years(0), true),
    shift("thisyear", Offset::Years(0), false),
    shift("thisyearw", Offset::Years(0), true),
    shift("lastyear", Offset::Years(-1), false),
    shift("lastyearw", Offset::Years(-1), true),
    shift("nextyear", Offset::Years(1), false),
    shift("nextyearw", Offset::Years(1), true),
    shift("workingdays", Offset::WorkingDays, false),
];

/// 向后推进一个工作日的步长，按周一到周日索引
pub const WORKING_DAY_INCREMENTS: [i64; 7] = [1, 1, 1, 1, 3, 2, 1];

/// 向前回退一个工作日的步长，按周一到周日索引
pub const WORKING_DAY_DECREMENTS: [i64; 7] = [3, 1, 1, 1, 1, 1, 2];

impl DateShift {
    /// 按名称查找（不区分大小写）
    pub fn find(name: &str) -> Option<&'static DateShift> {
        DATE_SHIFTS
            .iter()
            .find(|shift| shift.name.eq_ignore_ascii_case(name))
    }

    /// 溢出时返回 None
    pub fn apply(&self, now: DateTime<Utc>, delta: i64) -> Option<DateTime<Utc>> {
        let shifted = match self.offset {
            Offset::Days(base) => add_days(now, base.checked_add(delta)?),
            Offset::Months(base) => add_months(now, base.checked_add(delta)?),
            Offset::Years(base) => add_months(now, base.checked_add(delta)?.checked_mul(12)?),
            Offset::WorkingDays => add_working_days(now, delta),
        }?;

        if self.weekday_only {
            next_weekday(shifted)
        } else {
            Some(shifted)
        }
    }
}

pub fn add_days(date: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    date.checked_add_signed(TimeDelta::try_days(days)?)
}

/// 月份超出目标月天数时取该月最后一天
pub fn add_months(date: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(count)
    } else {
        date.checked_sub_months(count)
    }
}

pub fn is_weekend(date: &DateTime<Utc>) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 周末顺延到周一，工作日原样返回
pub fn next_weekday(mut date: DateTime<Utc>) -> Option<DateTime<Utc>> {
    while is_weekend(&date) {
        date = add_days(date, 1)?;
    }
    Some(date)
}

/// 按工作日步长表逐日推进或回退
pub fn add_working_days(mut date: DateTime<Utc>, delta: i64) -> Option<DateTime<Utc>> {
    let table = if delta >= 0 {
        &WORKING_DAY_INCREMENTS
    } else {
        &WORKING_DAY_DECREMENTS
    };
    for _ in 0..delta.unsigned_abs() {
        let step = table[date.weekday().num_days_from_monday() as usize];
        date = add_days(date, if delta >= 0 { step } else { -step })?;
    }
    Some(date)
}

/// 按作者习惯的格式串渲染时间
///
/// 支持 `yyyy`/`yy`、`M`/`MM`/`MMM`/`MMMM`、`d`/`dd`/`ddd`/`dddd`、
/// `H`/`HH`、`h`/`hh`、`m`/`mm`、`s`/`ss`、`f`..`fffffff`、`t`/`tt`，
/// 单双引号包裹的原样文本和 `\` 转义，其余字符原样输出。
pub fn format_datetime(date: DateTime<Utc>, pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' || c == '"' {
            let end = chars[i + 1..]
                .iter()
                .position(|&q| q == c)
                .map_or(chars.len(), |offset| i + 1 + offset);
            out.extend(&chars[i + 1..end]);
            i = end + 1;
            continue;
        }
        if c == '\\' {
            if let Some(&escaped) = chars.get(i + 1) {
                out.push(escaped);
            }
            i += 2;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        match c {
            'y' => match run {
                1 => out.push_str(&(date.year() % 100).to_string()),
                2 => out.push_str(&format!("{:02}", date.year() % 100)),
                _ => out.push_str(&format!("{:0width$}", date.year(), width = run)),
            },
            'M' => match run {
                1 => out.push_str(&date.month().to_string()),
                2 => out.push_str(&format!("{:02}", date.month())),
                3 => out.push_str(&date.format("%b").to_string()),
                _ => out.push_str(&date.format("%B").to_string()),
            },
            'd' => match run {
                1 => out.push_str(&date.day().to_string()),
                2 => out.push_str(&format!("{:02}", date.day())),
                3 => out.push_str(&date.format("%a").to_string()),
                _ => out.push_str(&date.format("%A").to_string()),
            },
            'H' => out.push_str(&pad(date.hour(), run)),
            'h' => out.push_str(&pad(date.hour12().1, run)),
            'm' => out.push_str(&pad(date.minute(), run)),
            's' => out.push_str(&pad(date.second(), run)),
            'f' => {
                let digits = run.min(9);
                let nanos = format!("{:09}", date.nanosecond() % 1_000_000_000);
                out.push_str(&nanos[..digits]);
            }
            't' => {
                let marker = if date.hour12().0 { "PM" } else { "AM" };
                out.push_str(if run == 1 { &marker[..1] } else { marker });
            }
            _ => out.extend(std::iter::repeat_n(c, run)),
        }
        i += run;
    }

    out
}

fn pad(value: u32, run: usize) -> String {
    if run == 1 {
        value.to_string()
    } else {
        format!("{:02}", value)
    }
}
