//! exposition-scout: binary entrypoint.
//! Reads listing JSON files (one object or an array per file, or stdin when
//! no path is given) and prints one JSON judgement per listing on stdout.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use exposition_scout::{
    build_collaborators, format_exposition, EngineConfig, ExpositionEngine, ExpositionJudgement,
    ListingObservation,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr so stdout stays machine-readable.
/// `EXPOSITION_LOG_FORMAT=json` switches to JSON log lines.
fn enable_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("exposition=info,warn"));

    let json = std::env::var("EXPOSITION_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListingFile {
    Many(Vec<ListingObservation>),
    One(Box<ListingObservation>),
}

#[derive(Serialize)]
struct Output<'a> {
    source: &'a str,
    #[serde(flatten)]
    judgement: &'a ExpositionJudgement,
    display: String,
}

fn parse_listings(raw: &str, origin: &str) -> Result<Vec<ListingObservation>> {
    let parsed: ListingFile =
        serde_json::from_str(raw).with_context(|| format!("parsing listings from {origin}"))?;
    Ok(match parsed {
        ListingFile::Many(v) => v,
        ListingFile::One(l) => vec![*l],
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev (OPENAI_API_KEY, EXPOSITION_CONFIG_PATH, RUST_LOG).
    let _ = dotenvy::dotenv();
    enable_tracing();

    let config = EngineConfig::load_default().context("loading exposition config")?;
    let collaborators = build_collaborators(&config);
    let engine = ExpositionEngine::new(config, collaborators);

    let paths: Vec<String> = std::env::args().skip(1).collect();
    let mut inputs = Vec::new();
    if paths.is_empty() {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("reading listings from stdin")?;
        inputs.push(("-".to_string(), raw));
    } else {
        for p in paths {
            let raw = std::fs::read_to_string(Path::new(&p))
                .with_context(|| format!("reading listings from {p}"))?;
            inputs.push((p, raw));
        }
    }

    for (origin, raw) in inputs {
        for listing in parse_listings(&raw, &origin)? {
            let judgement = engine.evaluate(&listing).await;
            let out = Output {
                source: &origin,
                judgement: &judgement,
                display: format_exposition(&judgement, &listing).to_string(),
            };
            println!("{}", serde_json::to_string(&out)?);
        }
    }
    Ok(())
}
