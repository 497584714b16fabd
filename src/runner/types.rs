use crate::assertion::Dialect;
use std::time::Duration;

/// 单条检查的结果
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// 检查序号（从 1 开始）
    pub check_number: usize,

    /// 响应类型
    pub dialect: Dialect,

    /// JSON 路径或 XPath
    pub selector: String,

    /// 替换前的期望值
    pub expectation: String,

    /// 替换后实际参与比较的期望值
    pub resolved: String,

    /// 是否通过
    pub passed: bool,

    /// 诊断信息（未通过时）
    pub message: Option<String>,

    /// 执行耗时
    pub duration: Duration,
}

impl CheckOutcome {
    pub fn new(
        check_number: usize,
        dialect: Dialect,
        selector: &str,
        expectation: &str,
        resolved: String,
        diagnostic: String,
        duration: Duration,
    ) -> Self {
        let passed = diagnostic.is_empty();
        Self {
            check_number,
            dialect,
            selector: selector.to_string(),
            expectation: expectation.to_string(),
            resolved,
            passed,
            message: (!passed).then_some(diagnostic),
            duration,
        }
    }
}

/// 场景摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_duration: Duration,
}

impl ScenarioSummary {
    pub fn from_outcomes(outcomes: &[CheckOutcome]) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let total_duration = outcomes.iter().map(|o| o.duration).sum();

        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            total_duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}
