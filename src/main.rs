use clap::Parser;

use woodworm::cmd::Cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = cli.command.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
