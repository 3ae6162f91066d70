use anyhow::Result;
use clap::{Parser, Subcommand};

use sheetlinker::config::{StaticConfig, get_config, init_config_from};
use sheetlinker::runtime::modes::run_server;
use sheetlinker::system::init_logging;

#[derive(Parser, Debug)]
#[command(name = "sheetlinker", version, about = "URL shortener with a Google Sheets mirror")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a sample configuration with every default filled in
    ConfigGen,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::ConfigGen) = cli.command {
        println!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    dotenvy::dotenv().ok();
    init_config_from(&cli.config);

    // guard 需要存活到进程结束
    let _log_guard = init_logging(&get_config())?;

    run_server().await
}
