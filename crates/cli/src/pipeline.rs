use crate::config::AppConfig;
use anyhow::{Context, Result};
use relmap_frontend::extract_project;
use relmap_graph::{FileFacts, KnowledgeGraph, KnowledgeStore};
use std::path::Path;

/// Facts from a JSON array written by an external front-end
pub fn read_facts(path: &Path) -> Result<Vec<FileFacts>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid facts file {}", path.display()))
}

/// Facts of every Go file below `root`; unreadable files are logged and left out
pub fn scan_facts(root: &Path, config: &AppConfig) -> Result<Vec<FileFacts>> {
    let extraction = extract_project(root, &config.frontend)
        .with_context(|| format!("Failed to extract {}", root.display()))?;
    for (path, err) in &extraction.failures {
        log::warn!("Skipping {}: {err}", path.display());
    }
    Ok(extraction.facts)
}

/// Ingest every file, then merge
pub fn build_graph(files: Vec<FileFacts>, config: &AppConfig) -> KnowledgeGraph {
    let mut store = KnowledgeStore::new();
    let mut ingested = 0;

    for facts in files {
        let path = facts.path.clone();
        match store.add_file(facts) {
            Ok(_) => ingested += 1,
            Err(e) => log::warn!("Skipping {path}: {e}"),
        }
    }

    log::info!(
        "Ingested {ingested} files into {} packages",
        store.packages().count()
    );
    store.merge(&config.graph)
}

/// Graph from `--facts` when given, otherwise from the Go sources under `root`
pub fn load_graph(root: &Path, facts: Option<&Path>, config: &AppConfig) -> Result<KnowledgeGraph> {
    let files = match facts {
        Some(path) => read_facts(path)?,
        None => scan_facts(root, config)?,
    };
    Ok(build_graph(files, config))
}
