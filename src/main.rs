use clap::Parser;
use nc2series::cli::{Cli, execute};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(e) = execute(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
