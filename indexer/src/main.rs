use anyhow::Result;
use clap::{Parser, Subcommand};
use docsearch::collect::collect_locale;
use docsearch::persist::{save_all, IndexPaths};
use docsearch::{build_index, Document, SearchConfig, SiteConfig};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the documentation search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from JSON/JSONL documents (`{"id": ..., "fields": {...}}`)
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Search config JSON; defaults are used when omitted
        #[arg(long)]
        config: Option<String>,
    },
    /// Build one index per locale from a site config and its markdown pages
    BuildSite {
        /// Site config JSON (locales with themeConfig nav/sidebar, search)
        #[arg(long)]
        site: String,
        /// Root directory of the markdown pages
        #[arg(long)]
        docs: String,
        /// Output directory; each locale goes to <output>/<locale>
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, config } => {
            let config = match config {
                Some(path) => SearchConfig::from_json_file(path)?,
                None => SearchConfig::default(),
            };
            let docs = read_documents(Path::new(&input))?;
            write_index(docs, &config, Path::new(&output))
        }
        Commands::BuildSite { site, docs, output } => build_site(&site, &docs, &output),
    }
}

fn build_site(site: &str, docs_root: &str, output: &str) -> Result<()> {
    let site = SiteConfig::from_json_file(site)?;
    if site.locales.is_empty() {
        tracing::warn!("site config has no locales, nothing to index");
    }
    for (code, locale) in &site.locales {
        if locale.pages().is_empty() {
            tracing::warn!(locale = %code, "locale has no internal nav or sidebar links");
        }
        let docs = collect_locale(locale, Path::new(docs_root))?;
        let out = Path::new(output).join(code);
        tracing::info!(locale = %code, num_docs = docs.len(), "indexing locale");
        write_index(docs, &site.search, &out)?;
    }
    Ok(())
}

fn write_index(docs: Vec<Document>, config: &SearchConfig, output: &Path) -> Result<()> {
    let index = build_index(docs, config)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let meta = save_all(&IndexPaths::new(output), &index, &created_at)?;
    tracing::info!(output = %output.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index build complete");
    Ok(())
}

/// Gather documents from a file or every `.json`/`.jsonl` file under a directory,
/// in path order so rebuilds see the same insertion order.
fn read_documents(input: &Path) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input.display());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    tracing::info!(num_docs = docs.len(), "read documents");
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        docs.push(serde_json::from_str(&line)?);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping file that is neither a document nor an array"),
    }
    Ok(())
}
