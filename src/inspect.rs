use std::io::Write as _;

use anyhow::Context as _;

use crate::cli::ParseArgs;
use crate::formats::ParsedFragment;
use crate::parser::ParseEngine;

pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("read fragment: {}", args.file))?;
    let parsed = parse_source(&html, args.engine)?;
    tracing::debug!(
        engine = args.engine.as_str(),
        blocks = parsed.blocks.len(),
        "parsed fragment"
    );

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &parsed).context("serialize parsed fragment")?;
    writeln!(stdout)?;
    Ok(())
}

pub fn parse_source(html: &str, engine: ParseEngine) -> anyhow::Result<ParsedFragment> {
    engine
        .parse(html)
        .with_context(|| format!("parse with {} engine", engine.as_str()))
}
