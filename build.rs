//! Build script for generating the `bricksweep` man pages.
//!
//! The packaging pipeline expects the man pages to be available from the
//! build output directory, so we generate them using clap-mangen here.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::{SweepCli, UpdateCli};

fn render(command: clap::Command, out_dir: &Path, file_name: &str) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    Man::new(command).render(&mut buffer)?;
    let mut file = File::create(out_dir.join(file_name))?;
    file.write_all(&buffer)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir =
        PathBuf::from(env::var_os("OUT_DIR").ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
        })?);

    render(SweepCli::command(), &out_dir, "bricksweep.1")?;
    render(UpdateCli::command(), &out_dir, "bricksweep-update.1")?;

    Ok(())
}
