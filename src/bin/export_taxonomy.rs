//! Taxonomy export utility.
//!
//! Writes the bundled symptom taxonomy as a versioned JSON data file that
//! `HEADWAY_TAXONOMY_PATH` can point at.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin export_taxonomy -- [--out <path>] [--force]
//! ```
//!
//! Without `--out` the file is printed to stdout.

use anyhow::{bail, Context, Result};
use headway::Taxonomy;

const USAGE: &str = "Usage: export_taxonomy [--out <path>] [--force]";

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut out_path: Option<std::path::PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => {
                let p = args.next().unwrap_or_default();
                if p.is_empty() {
                    eprintln!("{USAGE}");
                    std::process::exit(2);
                }
                out_path = Some(std::path::PathBuf::from(p));
            }
            "--force" => force = true,
            "-h" | "--help" => {
                println!("{USAGE}\n\nWrites the bundled symptom taxonomy (JSON) to <path>, or stdout.");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown arg: {arg}\n{USAGE}");
                std::process::exit(2);
            }
        }
    }

    let taxonomy = Taxonomy::builtin();
    let json = taxonomy.to_json_pretty()?;

    let Some(out_path) = out_path else {
        println!("{json}");
        return Ok(());
    };

    if out_path.exists() && !force {
        bail!("Refusing to overwrite existing file {:?}. Use --force.", out_path);
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }

    std::fs::write(&out_path, format!("{json}\n"))
        .with_context(|| format!("Failed to write {:?}", out_path))?;

    eprintln!(
        "Wrote taxonomy v{} ({} symptoms) to {:?}",
        taxonomy.version(),
        taxonomy.len(),
        out_path
    );
    Ok(())
}
