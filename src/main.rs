use afkwatch::cli::run_cli;
use anyhow::Result;

fn main() -> Result<()> {
    run_cli()
}
