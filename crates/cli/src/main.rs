use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use relmap_graph::{KnowledgeGraph, SymbolId};
use std::io;
use std::path::{Path, PathBuf};

mod config;
mod output;
mod pipeline;
mod render;

use config::AppConfig;
use output::{project_name, GraphKind, OutputDir};
use render::{GraphvizRenderer, Renderer};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "relmap")]
#[command(about = "Relationship maps of Go source trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ingest a JSON array of file facts instead of parsing Go sources
    #[arg(long, global = true)]
    facts: Option<PathBuf>,

    /// Directory receiving `<project>/*.dot`
    #[arg(long, global = true, default_value = "relmap-out")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw the field-reference graph of a struct
    Struct(DrawArgs),

    /// Draw the functions a function calls
    Callee(DrawArgs),

    /// Draw the functions calling a function
    Caller(DrawArgs),

    /// Print source snippets reachable from a symbol as JSON
    Snippets(SnippetArgs),

    /// Print every package's symbols and their methods as JSON
    Report(RootArgs),

    /// Print sorted function, struct and interface identities as JSON
    Symbols(RootArgs),
}

#[derive(Args)]
struct RootArgs {
    /// Project directory (defaults to current directory)
    #[arg(default_value = ".")]
    root: PathBuf,
}

#[derive(Args)]
struct DrawArgs {
    /// Project directory
    root: PathBuf,

    /// Identity: `package/Name` or `package/Receiver/Name`
    identity: String,

    /// Traversal depth (defaults to `dot.default_depth`)
    #[arg(long, short = 'd')]
    depth: Option<usize>,

    /// Also render an image with Graphviz (`png`, `svg`, ...)
    #[arg(long)]
    render: Option<String>,

    /// Only follow relations into these packages (repeatable; overrides
    /// `dot.focus_packages`)
    #[arg(long = "package", short = 'p')]
    packages: Vec<String>,
}

#[derive(Args)]
struct SnippetArgs {
    /// Project directory
    root: PathBuf,

    /// Identity: `package/Name` or `package/Receiver/Name`
    identity: String,

    /// Relation to follow
    #[arg(long, value_enum, default_value = "callee")]
    direction: Direction,
}

#[derive(Copy, Clone, ValueEnum)]
enum Direction {
    Callee,
    Caller,
    Struct,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::load(cli.config.as_deref())?;
    let facts = cli.facts.as_deref();

    match cli.command {
        Commands::Struct(args) => run_draw(GraphKind::Struct, args, facts, &cli.output, &config)?,
        Commands::Callee(args) => run_draw(GraphKind::Callee, args, facts, &cli.output, &config)?,
        Commands::Caller(args) => run_draw(GraphKind::Caller, args, facts, &cli.output, &config)?,
        Commands::Snippets(args) => run_snippets(args, facts, &config)?,
        Commands::Report(args) => {
            let graph = pipeline::load_graph(&args.root, facts, &config)?;
            print_stdout(&serde_json::to_string_pretty(&graph.relation_report())?)?;
        }
        Commands::Symbols(args) => {
            let graph = pipeline::load_graph(&args.root, facts, &config)?;
            print_stdout(&serde_json::to_string_pretty(&graph.symbol_index())?)?;
        }
    }

    Ok(())
}

fn parse_identity(raw: &str) -> Result<SymbolId> {
    raw.parse()
        .with_context(|| format!("Invalid identity {raw:?}"))
}

fn warn_if_unknown(graph: &KnowledgeGraph, id: &SymbolId) {
    if graph.store().entity(id).is_none() {
        log::warn!("Unknown symbol {id}: output will be empty");
    }
}

fn run_draw(
    kind: GraphKind,
    args: DrawArgs,
    facts: Option<&Path>,
    output: &Path,
    config: &AppConfig,
) -> Result<()> {
    let id = parse_identity(&args.identity)?;
    let mut config = config.clone();
    if !args.packages.is_empty() {
        config.graph.dot.focus_packages = args.packages;
    }
    let graph = pipeline::load_graph(&args.root, facts, &config)?;
    warn_if_unknown(&graph, &id);

    let depth = args.depth.unwrap_or(graph.dot_config().default_depth);
    let dot = match kind {
        GraphKind::Struct => graph.draw_struct_graph(&id, depth),
        GraphKind::Callee => graph.draw_callee_graph(&id, depth),
        GraphKind::Caller => graph.draw_caller_graph(&id, depth),
    };

    let renderer = args.render.map(GraphvizRenderer::new);
    let out = OutputDir::new(output, &project_name(&args.root));
    let written = out.write_graph(
        kind,
        &id,
        &dot,
        renderer.as_ref().map(|r| r as &dyn Renderer),
    )?;

    for path in written {
        print_stdout(&path.display().to_string())?;
    }
    Ok(())
}

fn run_snippets(args: SnippetArgs, facts: Option<&Path>, config: &AppConfig) -> Result<()> {
    let id = parse_identity(&args.identity)?;
    let graph = pipeline::load_graph(&args.root, facts, config)?;
    warn_if_unknown(&graph, &id);

    let snippets = match args.direction {
        Direction::Callee => graph.collect_callee_snippets(&id),
        Direction::Caller => graph.collect_caller_snippets(&id),
        Direction::Struct => graph.collect_struct_snippets(&id),
    };
    print_stdout(&serde_json::to_string_pretty(&snippets)?)
}
