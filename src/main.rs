mod cli;

use clap::Parser;
use cli::Cli;

fn main() {
    // 初始化日志系统
    rucheck::logger::init_logger();

    let cli = Cli::parse();
    let code = match cli::run(cli) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => cli::report_error(&err),
    };
    std::process::exit(code);
}
