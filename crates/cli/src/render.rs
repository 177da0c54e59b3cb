use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

/// Turns DOT text into image bytes
pub trait Renderer {
    fn render(&self, dot: &str) -> Result<Vec<u8>>;

    /// File extension of the rendered output
    fn extension(&self) -> &str;
}

/// Renders through the Graphviz `dot` executable
pub struct GraphvizRenderer {
    program: String,
    format: String,
}

impl GraphvizRenderer {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            program: "dot".to_string(),
            format: format.into(),
        }
    }

    /// Use another Graphviz layout program (`neato`, `fdp`, ...)
    #[must_use]
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Renderer for GraphvizRenderer {
    fn render(&self, dot: &str) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.program);
        command.arg(format!("-T{}", self.format));
        let output = run_piped(command, dot.as_bytes())
            .with_context(|| format!("Failed to run {}", self.program))?;

        log::debug!(
            "Rendered {} bytes of DOT into {} bytes of {}",
            dot.len(),
            output.len(),
            self.format
        );
        Ok(output)
    }

    fn extension(&self) -> &str {
        &self.format
    }
}

/// Runs `command` with `input` on stdin and returns its stdout.
///
/// Stdin is fed from its own thread while stdout and stderr are drained, so
/// a child that writes before it has read all input cannot block on a full
/// pipe.
fn run_piped(mut command: Command, input: &[u8]) -> Result<Vec<u8>> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to start")?;
    let mut stdin = child.stdin.take().context("Stdin unavailable")?;

    let (fed, output) = thread::scope(|scope| {
        let feeder = scope.spawn(move || stdin.write_all(input));
        let output = child.wait_with_output();
        (feeder.join(), output)
    });

    let output = output.context("Failed to wait")?;
    if !output.status.success() {
        anyhow::bail!(
            "exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    match fed {
        Ok(result) => result.context("Failed to write input")?,
        Err(_) => anyhow::bail!("Input writer panicked"),
    }

    Ok(output.stdout)
}
