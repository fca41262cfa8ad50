use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use barrel_cli::{demo, dump};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble the hailstone benchmark and write one init file per memory plane"
)]
struct Opts {
    /// Directory for the generated .mem files
    #[arg(short, long, default_value = "out")]
    out_dir: PathBuf,
    /// Print a JSON geometry/symbol report to stdout
    #[arg(long)]
    report: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let asm = demo::build()?;
    let set = asm.export()?;

    fs::create_dir_all(&opts.out_dir)?;
    for path in dump::write_all(&opts.out_dir, &set)? {
        tracing::info!(path = %path.display(), "wrote");
    }

    if opts.report {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &dump::report(&asm))?;
        println!();
    }
    Ok(())
}
