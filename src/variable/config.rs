use crate::error::{Result, RucheckError};
use crate::variable::store::VariableStore;
use crate::variable::types::VariableConfig;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    pub const CONFIG_FILE: &'static str = "rucheck.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<VariableConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RucheckError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: VariableConfig = toml::from_str(&content).map_err(|e| {
            RucheckError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), environments = config.environments.len(), "config loaded");
        Ok(config)
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录及其父目录
    /// 2. 用户配置目录 ~/.config/rucheck/
    pub fn find_and_load() -> Result<Option<VariableConfig>> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(path).map(Some),
            None => Ok(None),
        }
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(current) = std::env::current_dir() {
            if let Some(path) = Self::find_upwards(&current) {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?
            .join(".config")
            .join("rucheck")
            .join(Self::CONFIG_FILE);
        path.exists().then_some(path)
    }

    /// 从 start 开始逐级向上查找配置文件
    pub fn find_upwards(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// 构建变量存储
    /// env_name: 环境名称（如 "dev", "qa"）
    /// cli_vars: CLI 传入的变量覆盖（--var key=value）
    pub fn build_store(
        config: &VariableConfig,
        env_name: Option<&str>,
        cli_vars: &[(String, String)],
    ) -> Result<VariableStore> {
        let mut store = VariableStore::new().with_max_passes(config.settings.max_passes);

        if let Some(name) = env_name {
            let env = config.get_environment(name).ok_or_else(|| {
                RucheckError::Config(format!("environment '{}' not found", name))
            })?;
            for (key, value) in &env.variables {
                store.store_variable(key, &Self::resolve_env_vars(value));
            }
        }

        // CLI 覆盖优先级最高
        for (key, value) in cli_vars {
            store.store_variable(key, value);
        }

        Ok(store)
    }

    /// 解析 CLI 变量参数 "key=value"
    pub fn parse_cli_var(s: &str) -> Option<(String, String)> {
        s.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    }

    /// 替换 `${VAR}` 为进程环境变量，未设置的保持原样
    pub fn resolve_env_vars(text: &str) -> String {
        static ENV_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = ENV_REGEX.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

        re.replace_all(text, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_from_path() {
        let config_content = r#"
[settings]
max_passes = 8

[environments.dev]
customer_id = "12345"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = ConfigLoader::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.settings.max_passes, 8);
        assert!(config.get_environment("dev").is_some());
    }

    #[test]
    fn test_load_invalid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[environments.dev\n").unwrap();
        temp_file.flush().unwrap();

        let err = ConfigLoader::load_from_path(temp_file.path()).unwrap_err();
        assert!(matches!(err, RucheckError::Config(_)));

        let err = ConfigLoader::load_from_path("/nonexistent/rucheck.toml").unwrap_err();
        assert!(matches!(err, RucheckError::Config(_)));
    }

    #[test]
    fn test_find_upwards() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.path().join(ConfigLoader::CONFIG_FILE), "").unwrap();

        let found = ConfigLoader::find_upwards(&nested).unwrap();
        assert_eq!(found, root.path().join(ConfigLoader::CONFIG_FILE));
    }

    #[test]
    fn test_build_store() {
        let config_content = r#"
[environments.dev]
Customer_Id = "12345"
token = "dev-token"
"#;
        let config: VariableConfig = toml::from_str(config_content).unwrap();

        let store = ConfigLoader::build_store(&config, Some("dev"), &[]).unwrap();
        assert_eq!(store.get("customer_id"), Some("12345"));
        assert_eq!(store.get("{TOKEN}"), Some("dev-token"));

        // CLI 覆盖
        let cli_vars = vec![("token".to_string(), "custom-token".to_string())];
        let store = ConfigLoader::build_store(&config, Some("dev"), &cli_vars).unwrap();
        assert_eq!(store.get("token"), Some("custom-token"));

        let store = ConfigLoader::build_store(&config, None, &cli_vars).unwrap();
        assert_eq!(store.len(), 1);

        let err = ConfigLoader::build_store(&config, Some("prod"), &[]).unwrap_err();
        assert!(matches!(err, RucheckError::Config(_)));
    }

    #[test]
    fn test_parse_cli_var() {
        assert_eq!(
            ConfigLoader::parse_cli_var("key=value"),
            Some(("key".to_string(), "value".to_string()))
        );
        assert_eq!(
            ConfigLoader::parse_cli_var("filter=a=b"),
            Some(("filter".to_string(), "a=b".to_string()))
        );
        assert_eq!(ConfigLoader::parse_cli_var("invalid"), None);
    }

    #[test]
    fn test_resolve_env_vars() {
        unsafe {
            std::env::set_var("RUCHECK_TEST_VAR", "test_value");
        }

        assert_eq!(
            ConfigLoader::resolve_env_vars("Value: ${RUCHECK_TEST_VAR}"),
            "Value: test_value"
        );
        assert_eq!(
            ConfigLoader::resolve_env_vars("${RUCHECK_UNSET_VAR}"),
            "${RUCHECK_UNSET_VAR}"
        );

        unsafe {
            std::env::remove_var("RUCHECK_TEST_VAR");
        }
    }
}
