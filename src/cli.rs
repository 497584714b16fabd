use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rucheck::assertion::evaluate_xpath_variable;
use rucheck::runner::{CheckReporter, Scenario};
use rucheck::variable::{ConfigLoader, VariableConfig};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 使用配置文件中的环境（如 dev、qa）
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// 变量覆盖，可重复（--var key=value）
    #[arg(long = "var", value_name = "KEY=VALUE", global = true)]
    pub vars: Vec<String>,

    /// 配置文件路径，默认向上查找 rucheck.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 固定随机种子
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// 显示替换后的期望值
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 替换文本中的指令并输出
    Subst {
        /// 文本，或 @文件路径
        input: String,
    },
    /// 按 JSON 路径校验响应
    Json {
        /// 响应体，或 @文件路径
        body: String,
        path: String,
        expectation: String,
    },
    /// 按 XPath 校验响应
    Xml {
        /// 响应体，或 @文件路径
        body: String,
        selector: String,
        expectation: String,
    },
    /// 按 XPath 取值
    Extract {
        /// 响应体，或 @文件路径
        body: String,
        selector: String,
        /// 以变量形式输出
        #[arg(long, value_name = "NAME")]
        store: Option<String>,
    },
}

/// `@path` 读取文件内容，其余原样返回
pub fn read_input(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path)),
        None => Ok(arg.to_string()),
    }
}

fn load_config(cli: &Cli) -> Result<VariableConfig> {
    let config = match &cli.config {
        Some(path) => Some(ConfigLoader::load_from_path(path)?),
        None => ConfigLoader::find_and_load()?,
    };
    Ok(config.unwrap_or_default())
}

fn build_scenario(cli: &Cli) -> Result<Scenario> {
    let config = load_config(cli)?;

    let mut cli_vars = Vec::with_capacity(cli.vars.len());
    for var in &cli.vars {
        match ConfigLoader::parse_cli_var(var) {
            Some(pair) => cli_vars.push(pair),
            None => bail!("Invalid --var '{}', expected key=value", var),
        }
    }

    let mut store = ConfigLoader::build_store(&config, cli.env.as_deref(), &cli_vars)?;
    if let Some(seed) = cli.seed {
        store = store.with_seed(seed);
    }
    Ok(Scenario::new(store))
}

/// 执行命令，返回检查是否通过
pub fn run(cli: Cli) -> Result<bool> {
    let mut scenario = build_scenario(&cli)?;
    let reporter = CheckReporter::new(cli.verbose);

    match &cli.command {
        Commands::Subst { input } => {
            let text = read_input(input)?;
            println!("{}", scenario.substitute(&text)?);
            Ok(true)
        }
        Commands::Json {
            body,
            path,
            expectation,
        } => {
            let body = read_input(body)?;
            let passed = {
                let outcome = scenario.check_json(&body, path, expectation)?;
                reporter.print_outcome(outcome);
                outcome.passed
            };
            if cli.verbose {
                reporter.print_summary(&scenario.summary());
            }
            Ok(passed)
        }
        Commands::Xml {
            body,
            selector,
            expectation,
        } => {
            let body = read_input(body)?;
            let passed = {
                let outcome = scenario.check_xml(&body, selector, expectation)?;
                reporter.print_outcome(outcome);
                outcome.passed
            };
            if cli.verbose {
                reporter.print_summary(&scenario.summary());
            }
            Ok(passed)
        }
        Commands::Extract {
            body,
            selector,
            store,
        } => {
            let body = read_input(body)?;
            match store {
                Some(name) => {
                    let value = scenario.store_xml_value(&body, selector, name)?;
                    println!("{} = {}", rucheck::variable::normalize_key(name).cyan(), value);
                }
                None => println!("{}", evaluate_xpath_variable(&body, selector)?),
            }
            Ok(true)
        }
    }
}

/// 打印错误并给出退出码
pub fn report_error(err: &anyhow::Error) -> i32 {
    warn!(error = %err, "command failed");
    eprintln!("{}: {:#}", "Error".red().bold(), err);
    2
}
