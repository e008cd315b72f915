use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::cli::{BenchArgs, BenchEngine};
use crate::parser::ParseEngine;

const DEFAULT_DIR: &str = "guide";

#[derive(Debug, Clone, PartialEq)]
pub struct FileTiming {
    pub path: PathBuf,
    pub engine: ParseEngine,
    pub mean: Duration,
}

pub fn run(args: BenchArgs) -> anyhow::Result<()> {
    let files = load_files(&args.files)?;
    if files.is_empty() {
        anyhow::bail!("no .html files to benchmark (looked in ./{DEFAULT_DIR})");
    }
    let engines: &[ParseEngine] = match args.engine {
        BenchEngine::Selector => &[ParseEngine::Selector],
        BenchEngine::Tree => &[ParseEngine::Tree],
        BenchEngine::All => &ParseEngine::ALL,
    };
    let iterations = args.iterations.max(1);
    tracing::info!(files = files.len(), iterations, "benchmark parse engines");

    let mut stdout = std::io::stdout().lock();
    let mut totals = vec![Duration::ZERO; engines.len()];
    for path in &files {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("read fragment: {}", path.display()))?;
        if engines.len() > 1 {
            warn_on_disagreement(path, &html, engines);
        }

        for (engine, total) in engines.iter().zip(totals.iter_mut()) {
            let timing = bench_source(path, &html, *engine, iterations);
            *total += timing.mean;
            writeln!(
                stdout,
                "{}\t{}\t{:.3} ms/iter",
                path.display(),
                engine.as_str(),
                millis(timing.mean)
            )?;
        }
    }

    if let [first, second] = totals.as_slice()
        && !second.is_zero()
    {
        writeln!(
            stdout,
            "speedup {} vs {}: {:.2}x",
            engines[1].as_str(),
            engines[0].as_str(),
            first.as_secs_f64() / second.as_secs_f64()
        )?;
    }
    stdout.flush()?;
    Ok(())
}

/// Files named directly, `*.html` inside named directories, or `./guide/*.html`.
pub fn load_files(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        let dir = Path::new(DEFAULT_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        return html_files_in(dir);
    }

    let mut out = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            out.extend(html_files_in(path)?);
        } else {
            out.push(path.to_path_buf());
        }
    }
    Ok(out)
}

fn html_files_in(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read dir: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Mean wall time of `engine` over `iterations` parses of `html`.
pub fn bench_source(path: &Path, html: &str, engine: ParseEngine, iterations: u32) -> FileTiming {
    let iterations = iterations.max(1);
    let started_at = Instant::now();
    for _ in 0..iterations {
        let _ = std::hint::black_box(engine.parse(std::hint::black_box(html)));
    }
    FileTiming {
        path: path.to_path_buf(),
        engine,
        mean: started_at.elapsed() / iterations,
    }
}

fn warn_on_disagreement(path: &Path, html: &str, engines: &[ParseEngine]) {
    let Some((first, rest)) = engines.split_first() else {
        return;
    };
    let expected = first.parse(html);
    for engine in rest {
        if engine.parse(html) != expected {
            tracing::warn!(
                path = %path.display(),
                left = first.as_str(),
                right = engine.as_str(),
                "parse engines disagree"
            );
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
