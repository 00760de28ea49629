use clap::Parser;
use pagemark_cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Starting pagemark-replay on {}", cli.script.display());

    match pagemark_cli::run(&cli.script, &cli.out_dir) {
        Ok(written) => {
            for path in written {
                log::info!("Wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Replay failed: {e}");
            ExitCode::FAILURE
        }
    }
}
