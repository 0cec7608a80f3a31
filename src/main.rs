use clap::Parser;
use mini_sql::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let failures = cli.run()?;
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
