use chrono::{DateTime, TimeZone, Utc};
use rucheck::variable::date::{WORKING_DAY_DECREMENTS, WORKING_DAY_INCREMENTS, add_working_days};
use rucheck::variable::{FixedClock, VariableStore};
use rucheck::RucheckError;

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 30, 0).unwrap()
}

fn store_at(now: DateTime<Utc>) -> VariableStore {
    VariableStore::new().with_clock(FixedClock(now)).with_seed(2024)
}

#[test]
fn test_every_stored_variable_round_trips() {
    let mut store = store_at(at(2024, 5, 13));
    let pairs = [
        ("PolicyNumber", "PN-0001"),
        ("{Agent}", "Jane Roe"),
        ("zip", "60601"),
        ("empty", ""),
    ];
    for (key, value) in pairs {
        store.store_variable(key, value);
    }

    for (key, value) in pairs {
        let bare = key.trim_matches(|c| c == '{' || c == '}');
        for spelling in [bare.to_string(), bare.to_uppercase(), bare.to_lowercase()] {
            let text = format!("{{{}}}", spelling);
            assert_eq!(store.substitute(&text).unwrap(), value, "{}", text);
        }
    }
}

#[test]
fn test_substitute_is_idempotent_once_settled() {
    let mut store = store_at(at(2024, 5, 13));
    store.store_variable("name", "Ann");

    let template = r#"<req id="~randomize{3,4}" ref="~getkey(ref,AAA-NNN)">
  <who>{name}</who><again>{ref}</again>
  <when>~nextmonth{yyyy-MM}</when><at>#gettime(now)</at>
  <code>~random{AA-99}</code>
</req>"#;
    let once = store.substitute(template).unwrap();
    let twice = store.substitute(&once).unwrap();
    assert_eq!(once, twice);
    assert!(once.contains("<who>Ann</who>"));
    assert!(once.contains("<when>2024-06</when>"));
    assert!(once.contains("<at>10:30:00</at>"));
}

#[test]
fn test_working_day_tables() {
    // 周一到周日
    assert_eq!(WORKING_DAY_INCREMENTS, [1, 1, 1, 1, 3, 2, 1]);
    assert_eq!(WORKING_DAY_DECREMENTS, [3, 1, 1, 1, 1, 1, 2]);

    let monday = at(2024, 5, 13);
    assert_eq!(add_working_days(monday, 0), Some(monday));

    let friday = at(2024, 5, 17);
    assert_eq!(add_working_days(friday, 1), Some(at(2024, 5, 20)));
    assert_eq!(add_working_days(monday, -1), Some(at(2024, 5, 10)));

    let saturday = at(2024, 5, 18);
    assert_eq!(add_working_days(saturday, 1), Some(at(2024, 5, 20)));
    assert_eq!(add_working_days(saturday, -1), Some(at(2024, 5, 17)));
}

#[test]
fn test_working_days_directive() {
    let mut store = store_at(at(2024, 5, 13));
    assert_eq!(store.substitute("~workingdays").unwrap(), "05/13/2024");
    assert_eq!(store.substitute("~workingdays+0").unwrap(), "05/13/2024");
    assert_eq!(store.substitute("~workingdays+5").unwrap(), "05/20/2024");

    let mut store = store_at(at(2024, 5, 20));
    assert_eq!(store.substitute("~workingdays-5").unwrap(), "05/13/2024");
}

#[test]
fn test_weekday_variants_skip_weekends() {
    // 2024-05-17 是周五
    let mut store = store_at(at(2024, 5, 17));
    assert_eq!(store.substitute("~tomorrow").unwrap(), "05/18/2024");
    assert_eq!(store.substitute("~tomorroww").unwrap(), "05/20/2024");
    assert_eq!(store.substitute("~lastweekw{yyyy-MM-dd}").unwrap(), "2024-05-10");
    assert_eq!(store.substitute("~nextweekw+1").unwrap(), "05/27/2024");
}

#[test]
fn test_lastweek_and_nextweek_shift_months() {
    let mut store = store_at(at(2024, 5, 15));
    assert_eq!(store.substitute("~lastweek").unwrap(), "10/15/2023");
    assert_eq!(store.substitute("~nextweek").unwrap(), "12/15/2024");
    assert_eq!(store.substitute("~nextweek-7{yyyy-MM-dd}").unwrap(), "2024-05-15");
    assert_eq!(store.substitute("~lastweekw").unwrap(), "05/08/2024");
}

#[test]
fn test_month_and_year_shifts_clamp() {
    let mut store = store_at(at(2024, 1, 31));
    assert_eq!(store.substitute("~nextmonth").unwrap(), "02/29/2024");
    assert_eq!(store.substitute("~m+3{dd MMM yyyy}").unwrap(), "30 Apr 2024");
    assert_eq!(store.substitute("~lastyear{yyyy}").unwrap(), "2023");
    assert_eq!(store.substitute("~thisyear+2{yy}").unwrap(), "26");
}

#[test]
fn test_randomize_phone_shape() {
    let mut store = store_at(at(2024, 5, 13));
    for _ in 0..200 {
        let value = store.substitute("~randomize{0,10}").unwrap();
        assert_eq!(value.len(), 10, "{}", value);
        assert!(value.chars().all(|c| c.is_ascii_digit()), "{}", value);
        for start in [0, 3, 6] {
            assert_ne!(&value[start..start + 1], "0", "{}", value);
        }
    }
}

#[test]
fn test_directive_errors_abort() {
    let mut store = store_at(at(2024, 5, 13));

    let err = store.substitute("<a>~today</a><b>{nope}</b>").unwrap_err();
    assert!(matches!(err, RucheckError::UndefinedVariable(ref key) if key == "{nope}"));

    let err = store.substitute("~randomize{99999999999999999999999}").unwrap_err();
    assert!(matches!(err, RucheckError::MalformedDirective(_)));
}

#[test]
fn test_json_body_is_left_alone() {
    let mut store = store_at(at(2024, 5, 13));
    store.store_variable("id", "42");
    let body = r#"{"policy": {"id": "{id}", "date": "~today{yyyy-MM-dd}"}}"#;
    assert_eq!(
        store.substitute(body).unwrap(),
        r#"{"policy": {"id": "42", "date": "2024-05-13"}}"#
    );
}

#[test]
fn test_pathological_chain_terminates() {
    let mut store = store_at(at(2024, 5, 13)).with_max_passes(8);
    store.store_variable("a", "{b}");
    store.store_variable("b", "{a}");
    let err = store.substitute("{a}").unwrap_err();
    assert!(matches!(err, RucheckError::RewriteLimit { passes: 8 }));
}
