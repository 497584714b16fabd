use crate::Result;
use crate::assertion::{
    Dialect, evaluate_xpath_variable, extract_json_value, validate_json_response,
    validate_xml_response,
};
use crate::runner::types::{CheckOutcome, ScenarioSummary};
use crate::variable::VariableStore;
use std::time::Instant;
use tracing::{debug, warn};

/// 一个测试场景：共享一份变量存储，依次执行检查并收集结果
#[derive(Debug)]
pub struct Scenario {
    store: VariableStore,
    outcomes: Vec<CheckOutcome>,
}

impl Scenario {
    pub fn new(store: VariableStore) -> Self {
        Self {
            store,
            outcomes: Vec::new(),
        }
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    /// 替换请求体或其他模板文本
    pub fn substitute(&mut self, text: &str) -> Result<String> {
        self.store.substitute(text)
    }

    /// 按 JSON 路径取值并校验
    pub fn check_json(&mut self, body: &str, path: &str, expectation: &str) -> Result<&CheckOutcome> {
        let start = Instant::now();
        let actual = extract_json_value(body, path)?;
        let resolved = self.store.substitute(expectation)?;
        let diagnostic = validate_json_response(actual.as_deref(), &resolved)?;
        Ok(self.record(Dialect::Json, path, expectation, resolved, diagnostic, start))
    }

    /// 按 XPath 取节点并校验
    pub fn check_xml(&mut self, xml: &str, selector: &str, expectation: &str) -> Result<&CheckOutcome> {
        let start = Instant::now();
        let resolved = self.store.substitute(expectation)?;
        let diagnostic = validate_xml_response(xml, selector, &resolved)?;
        Ok(self.record(Dialect::Xml, selector, expectation, resolved, diagnostic, start))
    }

    /// 把 JSON 路径的值存为变量，缺失或 null 时存空串
    pub fn store_json_value(&mut self, body: &str, path: &str, name: &str) -> Result<Option<String>> {
        let value = extract_json_value(body, path)?;
        self.store
            .store_variable(name, value.as_deref().unwrap_or_default());
        debug!(name, path, "json value stored");
        Ok(value)
    }

    /// 把 XPath 的值存为变量
    pub fn store_xml_value(&mut self, xml: &str, selector: &str, name: &str) -> Result<String> {
        let value = evaluate_xpath_variable(xml, selector)?;
        self.store.store_variable(name, &value);
        debug!(name, selector, "xml value stored");
        Ok(value)
    }

    fn record(
        &mut self,
        dialect: Dialect,
        selector: &str,
        expectation: &str,
        resolved: String,
        diagnostic: String,
        start: Instant,
    ) -> &CheckOutcome {
        let outcome = CheckOutcome::new(
            self.outcomes.len() + 1,
            dialect,
            selector,
            expectation,
            resolved,
            diagnostic,
            start.elapsed(),
        );
        if let Some(message) = &outcome.message {
            warn!(selector, message = %message, "check failed");
        }
        self.outcomes.push(outcome);
        &self.outcomes[self.outcomes.len() - 1]
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary::from_outcomes(&self.outcomes)
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.passed)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new(VariableStore::new())
    }
}
