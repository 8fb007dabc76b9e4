use compute::aggregate;
use data::Kind;
use fetch::{default_sources, Fetch, HttpFetcher};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};
use write::write_accumulator;

mod compute;
mod data;
mod fetch;
mod read;
mod write;

const OUTPUT_FILE: &str = "global_data.csv";

/// Merges `sources` into `dir/global_data.csv`, replacing whatever was there.
fn run<F: Fetch, S: AsRef<str>>(
    fetcher: &F,
    sources: &[(Kind, S)],
    dir: &Path,
) -> Result<(), anyhow::Error> {
    let accumulator = aggregate(fetcher, sources)?;

    // Only now that everything merged do we touch the disk: write next to the
    // target and rename over it, so a failure never leaves a half-written file.
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write_accumulator(&mut tmp, &accumulator)?;
    tmp.persist(dir.join(OUTPUT_FILE))?;
    tracing::info!(rows = accumulator.len(), file = OUTPUT_FILE, "merged");
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let fetcher = HttpFetcher::new()?;
    run(&fetcher, &default_sources(), &std::env::current_dir()?)
}
