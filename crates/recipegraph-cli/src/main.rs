use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use recipegraph_agents::RecipePipeline;
use recipegraph_core::{ConfigManager, LoggingConfig, RecipeGraphConfig, RecipeSession};
use recipegraph_graph::{DependencyGraph, GraphBuilder};
use recipegraph_parser::{RuleBasedAnalyzer, SentenceContextBuilder, TextAnalyzer};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

#[derive(Parser)]
#[command(name = "recipegraph")]
#[command(about = "RecipeGraph - Extract ingredients, equipment and cooking actions from recipes", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (pretty, json)
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Config file to use instead of the discovered one
    #[arg(short, long, global = true, env = "RECIPEGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run entity extraction and dependency linking on a recipe file
    Analyze {
        /// Recipe text file
        file: PathBuf,

        /// Stop after entity extraction
        #[arg(long)]
        skip_linking: bool,

        /// Write the session snapshot to this path ("auto" picks a timestamped name)
        #[arg(long)]
        save: Option<String>,
    },

    /// Print the numbered sentences of a recipe
    Sentences {
        /// Recipe text file
        file: PathBuf,
    },

    /// Print cooking verbs found by the lexicon
    Verbs {
        /// Recipe text file
        file: PathBuf,
    },

    /// Build the dependency graph from a saved session
    Graph {
        /// Session JSON written by `analyze --save`
        session: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_mgr = match &cli.config {
        Some(path) => ConfigManager::load_from_path(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    let config = config_mgr.config();
    init_tracing(&config.logging);

    match cli.command {
        Commands::Analyze {
            file,
            skip_linking,
            save,
        } => handle_analyze(config, &file, skip_linking, save.as_deref(), cli.format).await,
        Commands::Sentences { file } => handle_sentences(&file, cli.format),
        Commands::Verbs { file } => handle_verbs(&file, cli.format),
        Commands::Graph { session } => handle_graph(config, &session, cli.format),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if logging.format == "pretty" {
        let subscriber = Registry::default()
            .with(env_filter)
            .with(fmt_layer.pretty());
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = Registry::default()
            .with(env_filter)
            .with(fmt_layer.compact());
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

fn read_recipe(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipe file {}", path.display()))
}

fn started_analyzer() -> Result<RuleBasedAnalyzer> {
    RuleBasedAnalyzer::started().context("Failed to start text analyzer")
}

async fn handle_analyze(
    config: &RecipeGraphConfig,
    file: &Path,
    skip_linking: bool,
    save: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let text = read_recipe(file)?;
    let pipeline =
        RecipePipeline::from_config(config).context("Failed to set up the extraction pipeline")?;

    let session = if skip_linking {
        pipeline.extract(&text).await
    } else {
        pipeline
            .analyze(&text)
            .await
            .context("Dependency linking could not run")?
    };
    let graph = GraphBuilder::from_config(&config.graph).build(&session);

    if let Some(target) = save {
        let path = snapshot_path(target);
        let snapshot = serde_json::to_string_pretty(&session.snapshot())?;
        std::fs::write(&path, snapshot)
            .with_context(|| format!("Failed to write session to {}", path.display()))?;
        info!("Session saved to {}", path.display());
    }

    match format {
        OutputFormat::Json => {
            let output = json!({
                "session": session.snapshot(),
                "graph": graph.to_json()?,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Pretty => {
            print_session(&session);
            print_graph_summary(&graph);
        }
    }
    Ok(())
}

fn snapshot_path(target: &str) -> PathBuf {
    if target == "auto" {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        PathBuf::from(format!("recipe-session-{stamp}.json"))
    } else {
        PathBuf::from(target)
    }
}

fn handle_sentences(file: &Path, format: OutputFormat) -> Result<()> {
    let text = read_recipe(file)?;
    let analyzer = Arc::new(started_analyzer()?);
    let context = SentenceContextBuilder::new(analyzer.clone())
        .build(&text)
        .context("Sentence segmentation failed")?;
    analyzer.shutdown();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&context)?),
        OutputFormat::Pretty => {
            println!("{}", "Sentences".green().bold());
            for (index, sentence) in context.iter() {
                println!("  {} {}", format!("[{index}]").cyan(), sentence);
            }
        }
    }
    Ok(())
}

fn handle_verbs(file: &Path, format: OutputFormat) -> Result<()> {
    let text = read_recipe(file)?;
    let analyzer = started_analyzer()?;
    let mentions = analyzer
        .cooking_verbs(&text)
        .context("Verb detection failed")?;
    analyzer.shutdown();

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = mentions
                .iter()
                .map(|m| {
                    json!({
                        "verb": m.verb,
                        "lemma": m.lemma,
                        "sentence_index": m.sentence_index,
                        "sentence": m.sentence,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Pretty => {
            if mentions.is_empty() {
                println!("{}", "No cooking verbs found.".yellow());
            }
            for mention in &mentions {
                println!(
                    "  {} ({}) in sentence {}: {}",
                    mention.verb.cyan(),
                    mention.lemma,
                    mention.sentence_index,
                    mention.sentence.dimmed()
                );
            }
        }
    }
    Ok(())
}

fn handle_graph(config: &RecipeGraphConfig, session_path: &Path, format: OutputFormat) -> Result<()> {
    let raw = std::fs::read_to_string(session_path)
        .with_context(|| format!("Failed to read session file {}", session_path.display()))?;
    let session: RecipeSession =
        serde_json::from_str(&raw).context("Session file is not a valid session snapshot")?;
    let graph = GraphBuilder::from_config(&config.graph).build(&session);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&graph.to_json()?)?),
        OutputFormat::Pretty => print_graph_summary(&graph),
    }
    Ok(())
}

fn print_session(session: &RecipeSession) {
    println!(
        "{} {}",
        "State:".bold(),
        session.parsing_state().to_string().cyan()
    );
    if let Some(reason) = session.fatal_error() {
        println!("{} {}", "Error:".red().bold(), reason);
    }
    println!("\n{}", "Ingredients".green().bold());
    println!("{}", session.format_ingredients_for_display());
    println!("\n{}", "Equipment".green().bold());
    println!("{}", session.format_equipment_for_display());
    println!("\n{}", "Basic actions".green().bold());
    println!("{}", session.format_basic_actions_for_display());
    println!("\n{}", "Actions".green().bold());
    println!("{}", session.format_actions_for_display());
}

fn print_graph_summary(graph: &DependencyGraph) {
    println!("\n{}", graph.title.blue().bold());
    if graph.is_placeholder() {
        for annotation in &graph.annotations {
            println!("  {}", annotation.text.yellow());
        }
        return;
    }
    for group in graph.node_groups() {
        let names: Vec<&str> = group.nodes.iter().map(|n| n.name.as_str()).collect();
        println!(
            "  {} {} ({}): {}",
            group.name.bold(),
            format!("[{}]", group.symbol).dimmed(),
            group.nodes.len(),
            names.join(", ")
        );
    }
    for group in graph.edge_groups() {
        println!("  {:?}: {} edges", group.kind, group.segments.len());
    }
}
