//! STAP command line driver
//!
//! Usage: `stap <input.dat> [output.out] [--json]`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use log::info;

use stap_fem::prelude::*;

struct Args {
    input: PathBuf,
    output: PathBuf,
    json: bool,
}

fn usage() {
    eprintln!("usage: stap <input.dat> [output.out] [--json]");
}

fn parse_args() -> Result<Args> {
    let mut json = false;
    let mut paths = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            path => paths.push(PathBuf::from(path)),
        }
    }

    let (input, output) = match paths.as_slice() {
        [input] => (input.clone(), input.with_extension("out")),
        [input, output] => (input.clone(), output.clone()),
        _ => bail!("expected an input file and an optional output file"),
    };
    Ok(Args {
        input,
        output,
        json,
    })
}

fn run(args: &Args) -> Result<()> {
    let mut domain = Domain::from_dat_file(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let options = AnalysisOptions::default()
        .with_mode(domain.mode)
        .with_logging();
    let results = domain.analyze(options).context("analysis failed")?;

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut writer = ReportWriter::new(BufWriter::new(file));
    writer
        .write_report(&domain, &results)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    writer
        .into_inner()
        .flush()
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("Report written to {}", args.output.display());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}");
            usage();
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
