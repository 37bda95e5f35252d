//! The `gomirror` binary: create a virtual GOPATH for a Go module
//! workspace.

mod output;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use gomirror::Options;

#[derive(Parser)]
#[command(name = "gomirror")]
#[command(version)]
#[command(
    about = "Create a 'virtual' GOPATH at the specified directory",
    long_about = "Create a 'virtual' GOPATH at the specified directory.\n\
                  Has to be run from within a Go module.\n\n\
                  gomirror sets up a GOPATH folder structure, ensuring that any \
                  tool accustomed to the traditional layout keeps functioning \
                  against a module-based workspace."
)]
struct Cli {
    /// Directory to create the virtual GOPATH in
    dir: PathBuf,

    /// Whether to skip mirroring modules as src
    #[arg(long)]
    skip_go_src: bool,

    /// Whether to skip mirroring $GOBIN
    #[arg(long)]
    skip_go_bin: bool,

    /// Whether to skip mirroring $GOPATH/pkg
    #[arg(long)]
    skip_go_pkg: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        output::report_error(&err.to_string());
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = Options {
        skip_go_src: cli.skip_go_src,
        skip_go_bin: cli.skip_go_bin,
        skip_go_pkg: cli.skip_go_pkg,
    };

    gomirror::mirror(&cli.dir, options)?;
    Ok(())
}
