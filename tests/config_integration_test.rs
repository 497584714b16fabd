use rucheck::variable::{ConfigLoader, FixedClock};
use chrono::{TimeZone, Utc};
use std::fs;
use tempfile::TempDir;

/// 测试从实际配置文件加载变量
#[test]
fn test_load_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join(ConfigLoader::CONFIG_FILE);

    let config_content = r#"
[settings]
max_passes = 10

[environments.dev]
customer_id = "C-100"
state = "IL"

[environments.qa]
customer_id = "C-200"
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = ConfigLoader::load_from_path(&config_path).unwrap();
    assert_eq!(config.settings.max_passes, 10);
    assert!(config.environments.contains_key("dev"));
    assert!(config.environments.contains_key("qa"));
}

/// 环境变量进入变量存储后可被指令引用
#[test]
fn test_environment_feeds_substitution() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join(ConfigLoader::CONFIG_FILE);
    fs::write(
        &config_path,
        r#"
[settings]
max_passes = 4

[environments.dev]
Customer_Id = "C-100"
start = "~today+2{yyyy-MM-dd}"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_path(&config_path).unwrap();
    let cli_vars = vec![("state".to_string(), "WI".to_string())];
    let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
    let mut store = ConfigLoader::build_store(&config, Some("dev"), &cli_vars)
        .unwrap()
        .with_clock(FixedClock(now));

    assert_eq!(store.max_passes(), 4);
    assert_eq!(
        store
            .substitute("<c>{customer_id}</c><s>{STATE}</s><d>{start}</d>")
            .unwrap(),
        "<c>C-100</c><s>WI</s><d>2024-01-12</d>"
    );
}

/// 配置文件按目录向上查找
#[test]
fn test_find_config_in_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("features").join("policy");
    fs::create_dir_all(&nested).unwrap();
    fs::write(temp_dir.path().join(ConfigLoader::CONFIG_FILE), "[environments.dev]\n").unwrap();

    let found = ConfigLoader::find_upwards(&nested).unwrap();
    let config = ConfigLoader::load_from_path(found).unwrap();
    assert!(config.get_environment("dev").is_some());
}
