//! Standalone Logic 2 capture dump tool
//!
//! Walks a Logic 2 export with the wait engine and prints every emitted
//! window as a JSON line on stdout. Matches are logged at info level.
//!
//! Usage:
//!   dump_windows <export_dir|digital.csv> [--config <config.toml>] [--pattern <ch:cond,...>] [--skip <count>] [--limit <matches>]
//!
//! Example:
//!   RUST_LOG=info dump_windows capture/ --pattern 0:r --limit 100

use anyhow::{bail, Context, Result};
use logic2_input::{InputConfig, JsonLinesSink, Logic2Input, PinEvaluator, PinPattern, WaitCondition};
use std::env;
use std::fs;
use std::io::{self, BufWriter};
use std::path::PathBuf;

struct Options {
    export: PathBuf,
    config: Option<PathBuf>,
    pattern: Option<PinPattern>,
    skip: Option<u64>,
    limit: Option<usize>,
}

fn parse_args() -> Result<Options> {
    let mut args = env::args().skip(1);
    let export = match args.next() {
        Some(path) => PathBuf::from(path),
        None => bail!("Usage: dump_windows <export_dir|digital.csv> [--config <file>] [--pattern <ch:cond,...>] [--skip <count>] [--limit <matches>]"),
    };

    let mut options = Options {
        export,
        config: None,
        pattern: None,
        skip: None,
        limit: None,
    };

    while let Some(flag) = args.next() {
        let value = args
            .next()
            .with_context(|| format!("Missing value for {}", flag))?;
        match flag.as_str() {
            "--config" => options.config = Some(PathBuf::from(value)),
            "--pattern" => options.pattern = Some(value.parse()?),
            "--skip" => options.skip = Some(value.parse().context("Invalid skip count")?),
            "--limit" => options.limit = Some(value.parse().context("Invalid limit")?),
            other => bail!("Unknown option: {}", other),
        }
    }

    Ok(options)
}

fn load_config(path: Option<&PathBuf>) -> Result<InputConfig> {
    let Some(path) = path else {
        return Ok(InputConfig::new());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args()?;
    let config = load_config(options.config.as_ref())?;

    let mut conditions = Vec::new();
    if let Some(pattern) = options.pattern {
        conditions.push(WaitCondition::pattern(pattern));
    }
    if let Some(skip) = options.skip {
        conditions.push(WaitCondition::skip(skip));
    }

    let sink = JsonLinesSink::new(BufWriter::new(io::stdout().lock()));
    let mut input: Logic2Input<PinEvaluator, _> =
        Logic2Input::open(&options.export, &config, PinEvaluator, sink)
            .with_context(|| format!("Failed to open export: {:?}", options.export))?;

    log::info!(
        "{} channels: {:?}",
        input.channel_count(),
        input.logic_channels()
    );

    let mut matches = 0usize;
    loop {
        if options.limit.is_some_and(|limit| matches >= limit) {
            break;
        }
        match input.wait(&conditions) {
            Ok(levels) => {
                matches += 1;
                log::info!("match at sample {}: {:?}", input.samplenum(), levels);
            }
            Err(e) if e.is_end_of_stream() => break,
            Err(e) => return Err(e.into()),
        }
    }

    let written = input.sink().written();
    log::info!("{} matches, {} windows", matches, written);
    Ok(())
}
