//! # relmap frontend
//!
//! Turns Go source trees into [`relmap_graph::FileFacts`].
//!
//! ```text
//! root dir ──> FileScanner (ignore walk) ──> *.go ──> GoExtractor (tree-sitter) ──> FileFacts
//! ```
//!
//! A file that cannot be read or parsed is reported back with its cause and
//! left out; it never stops the rest of the tree from being extracted.

mod config;
mod error;
mod go;
mod scanner;

pub use config::FrontendConfig;
pub use error::{FrontendError, Result};
pub use go::GoExtractor;
pub use scanner::FileScanner;

use relmap_graph::FileFacts;
use std::path::{Path, PathBuf};

/// Facts of every file that extracted cleanly, plus the files that did not
#[derive(Debug, Default)]
pub struct Extraction {
    pub facts: Vec<FileFacts>,
    pub failures: Vec<(PathBuf, FrontendError)>,
}

/// Scan `root` and extract every Go source below it
pub fn extract_project(root: &Path, config: &FrontendConfig) -> Result<Extraction> {
    let scanner = FileScanner::new(root, config.clone());
    let mut extractor = GoExtractor::new(config.clone())?;
    let mut extraction = Extraction::default();

    for path in scanner.scan() {
        match extractor.extract_file(root, &path) {
            Ok(facts) => extraction.facts.push(facts),
            Err(e) => extraction.failures.push((path, e)),
        }
    }

    log::info!(
        "Extracted {} files ({} failed)",
        extraction.facts.len(),
        extraction.failures.len()
    );
    Ok(extraction)
}
