use crate::render::Renderer;
use anyhow::{Context, Result};
use relmap_graph::{DotGraph, SymbolId};
use std::fs;
use std::path::{Path, PathBuf};

/// Which draw produced a DOT file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Struct,
    Callee,
    Caller,
}

impl GraphKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Callee => "function",
            Self::Caller => "caller",
        }
    }
}

/// Writes DOT files (and rendered images) under `<output>/<project>/`
pub struct OutputDir {
    dir: PathBuf,
}

impl OutputDir {
    pub fn new(output: &Path, project: &str) -> Self {
        Self {
            dir: output.join(project),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// `struct_a_Service`, `function_main__run`, ...
    pub fn file_stem(kind: GraphKind, id: &SymbolId) -> String {
        format!("{}_{}", kind.prefix(), id.to_string().replace('/', "_"))
    }

    /// Write the DOT text, then the rendered image next to it when asked
    pub fn write_graph(
        &self,
        kind: GraphKind,
        id: &SymbolId,
        dot: &DotGraph,
        renderer: Option<&dyn Renderer>,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let stem = Self::file_stem(kind, id);
        let dot_path = self.dir.join(format!("{stem}.dot"));
        let text = dot.render();
        fs::write(&dot_path, &text)
            .with_context(|| format!("Failed to write {}", dot_path.display()))?;
        log::info!("Wrote {}", dot_path.display());

        let mut written = vec![dot_path];
        if let Some(renderer) = renderer {
            let image = renderer
                .render(&text)
                .with_context(|| format!("Failed to render {stem}"))?;
            let image_path = self.dir.join(format!("{stem}.{}", renderer.extension()));
            fs::write(&image_path, image)
                .with_context(|| format!("Failed to write {}", image_path.display()))?;
            log::info!("Wrote {}", image_path.display());
            written.push(image_path);
        }

        Ok(written)
    }
}

/// Directory name of the analysed project
pub fn project_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct EchoRenderer;

    impl Renderer for EchoRenderer {
        fn render(&self, dot: &str) -> Result<Vec<u8>> {
            Ok(dot.to_uppercase().into_bytes())
        }

        fn extension(&self) -> &str {
            "txt"
        }
    }

    #[test]
    fn file_stems_flatten_identities() {
        assert_eq!(
            OutputDir::file_stem(GraphKind::Struct, &SymbolId::type_id("a", "Service")),
            "struct_a_Service"
        );
        assert_eq!(
            OutputDir::file_stem(GraphKind::Callee, &SymbolId::function("main", "", "run")),
            "function_main__run"
        );
        assert_eq!(
            OutputDir::file_stem(GraphKind::Caller, &SymbolId::function("db", "Conn", "Query")),
            "caller_db_Conn_Query"
        );
    }

    #[test]
    fn writes_dot_and_rendered_image() {
        let temp = tempdir().unwrap();
        let out = OutputDir::new(temp.path(), "demo");
        let id = SymbolId::type_id("a", "Service");
        let mut dot = DotGraph::new();
        dot.add_node(&id, "Service");

        let written = out
            .write_graph(GraphKind::Struct, &id, &dot, Some(&EchoRenderer))
            .unwrap();

        assert_eq!(
            written,
            vec![
                temp.path().join("demo").join("struct_a_Service.dot"),
                temp.path().join("demo").join("struct_a_Service.txt"),
            ]
        );
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), dot.render());
        assert!(fs::read_to_string(&written[1])
            .unwrap()
            .starts_with("DIGRAPH {"));
    }

    #[test]
    fn project_name_falls_back_for_missing_roots() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("shop");
        fs::create_dir_all(&root).unwrap();

        assert_eq!(project_name(&root), "shop");
        assert_eq!(project_name(&temp.path().join("missing")), "project");
    }
}
