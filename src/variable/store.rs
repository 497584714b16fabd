use crate::variable::date::{Clock, SystemClock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// 替换循环的默认最大轮数
pub const DEFAULT_MAX_PASSES: usize = 64;

/// 规范化变量名：转小写，缺少的花括号补齐
///
/// `Name` → `{name}`，`{Name}` → `{name}`
pub fn normalize_key(key: &str) -> String {
    let key = key.to_lowercase();
    let mut normalized = String::with_capacity(key.len() + 2);
    if !key.starts_with('{') {
        normalized.push('{');
    }
    normalized.push_str(&key);
    if !key.ends_with('}') {
        normalized.push('}');
    }
    normalized
}

/// 单个场景的变量存储
///
/// 同时持有替换引擎需要的时间来源和随机源，场景结束时整体丢弃。
#[derive(Debug)]
pub struct VariableStore {
    pub(crate) variables: HashMap<String, String>,
    pub(crate) rng: StdRng,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) max_passes: usize,
}

impl VariableStore {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            rng: StdRng::from_os_rng(),
            clock: Box::new(SystemClock),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// 替换时间来源
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// 使用固定种子，生成结果可复现
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// 写入变量（覆盖同名变量）
    pub fn store_variable(&mut self, key: &str, value: &str) {
        self.variables.insert(normalize_key(key), value.to_string());
    }

    /// 读取变量，大小写不敏感
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(&normalize_key(key))
    }

    /// 批量写入
    pub fn extend<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.variables.insert(normalize_key(key.as_ref()), value.into());
        }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}
