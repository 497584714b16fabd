use crate::assertion::Dialect;
use crate::runner::types::{CheckOutcome, ScenarioSummary};
use colored::Colorize;

pub struct CheckReporter {
    verbose: bool,
}

impl CheckReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// 单条结果的标题行（不含颜色）
    pub fn headline(outcome: &CheckOutcome) -> String {
        let kind = match outcome.dialect {
            Dialect::Json => "json",
            Dialect::Xml => "xml",
        };
        format!(
            "[{}] {} {} => {}",
            outcome.check_number, kind, outcome.selector, outcome.expectation
        )
    }

    /// 打印单条检查结果
    pub fn print_outcome(&self, outcome: &CheckOutcome) {
        let symbol = if outcome.passed {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            " {} {} ({}ms)",
            symbol,
            Self::headline(outcome),
            outcome.duration.as_millis()
        );

        // 期望值经过替换时显示替换结果
        if self.verbose && outcome.resolved != outcome.expectation {
            println!("   {}: {}", "Resolved".cyan(), outcome.resolved);
        }

        if let Some(message) = &outcome.message {
            for line in message.lines() {
                println!("   {}", line.red());
            }
            println!();
        }
    }

    /// 打印摘要
    pub fn print_summary(&self, summary: &ScenarioSummary) {
        println!("\n{}", "━".repeat(50));
        println!("{}", "Summary".bold());
        println!("{}", "━".repeat(50));

        if summary.failed == 0 {
            println!(
                "  {}: {} passed, {} total",
                "Checks".bold(),
                summary.passed.to_string().green(),
                summary.total
            );
        } else {
            println!(
                "  {}: {} passed, {} failed, {} total",
                "Checks".bold(),
                summary.passed.to_string().green(),
                summary.failed.to_string().red(),
                summary.total
            );
        }

        println!(
            "  {}: {:.3}s",
            "Duration".bold(),
            summary.total_duration.as_secs_f64()
        );
        println!();
    }
}

impl Default for CheckReporter {
    fn default() -> Self {
        Self::new(false)
    }
}
