use crate::config::FrontendConfig;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Scanner for finding Go source files in a project
pub struct FileScanner {
    root: PathBuf,
    config: FrontendConfig,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>, config: FrontendConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan directory for Go sources (.gitignore aware), sorted by path
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let skip_dirs = self.config.skip_dirs.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true) // hidden directories hold no sources
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .max_depth(Some(self.config.max_depth))
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && Self::is_skipped_dir(entry.path(), &skip_dirs))
        });

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !self.is_go_source(path) {
                        continue;
                    }

                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > self.config.max_file_bytes {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                self.config.max_file_bytes
                            );
                            continue;
                        }
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        log::info!("Found {} Go source files", files.len());
        files
    }

    fn is_skipped_dir(path: &Path, skip_dirs: &[String]) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| skip_dirs.iter().any(|skipped| skipped == name))
    }

    fn is_go_source(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        if !name.ends_with(".go") {
            return false;
        }
        if let Some(suffix) = self
            .config
            .skip_suffixes
            .iter()
            .find(|suffix| name.ends_with(suffix.as_str()))
        {
            log::debug!("Skipping {} ({suffix})", path.display());
            return false;
        }
        true
    }
}
