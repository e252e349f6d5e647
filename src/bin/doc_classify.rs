//! Document Classification CLI
//!
//! Loads the configured taxonomy and ontology, then classifies documents or
//! inspects the loaded class graphs.
//!
//! # Usage
//!
//! ```bash
//! # Classify a text file (reads stdin if no file given)
//! doc_classify classify --file contrato.txt --metadata meta.json --mode precise
//!
//! # Taxonomy / ontology statistics
//! doc_classify stats --format json
//!
//! # Ad-hoc graph pattern over the ontology
//! doc_classify query '?c rdfs:subClassOf tf:Prestamo . ?c rdfs:label ?label'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use doc_classifier::classification::Explanation;
use doc_classifier::{
    ClassificationMode, ClassificationOrchestrator, ClassificationResult, ClassifierConfig,
    DocumentMetadata, OrchestratorBuilder, RuleBasedClassifier,
};

#[derive(Parser)]
#[command(name = "doc_classify")]
#[command(version)]
#[command(about = "Classify documents against the document taxonomy and ontology")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to DOC_CLASSIFIER_CONFIG resolution)
    #[arg(long, short, global = true, env = "DOC_CLASSIFIER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one document
    Classify {
        /// Text file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// JSON object with the document metadata
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// fast, ml, precise or intelligent
        #[arg(long, default_value = "intelligent")]
        mode: ClassificationMode,

        /// Also print keyword evidence
        #[arg(long)]
        explain: bool,

        /// Back the ML phase with the keyword rules when it is unsure
        #[arg(long)]
        rule_fallback: bool,
    },

    /// Show taxonomy and ontology statistics
    Stats,

    /// Evaluate a basic graph pattern over the ontology
    Query { pattern: String },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    let result = tokio::runtime::Runtime::new()
        .context("Failed to start tokio runtime")
        .and_then(|rt| rt.block_on(run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if format == OutputFormat::Text {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            } else {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::resolve()?,
    };

    let rule_fallback = matches!(cli.command, Commands::Classify { rule_fallback: true, .. });
    let mut builder =
        OrchestratorBuilder::new(Arc::new(RuleBasedClassifier::default())).config(config);
    if rule_fallback {
        builder = builder.with_rule_fallback();
    }
    let orchestrator = builder.build()?;

    match cli.command {
        Commands::Classify {
            file,
            metadata,
            mode,
            explain,
            ..
        } => cmd_classify(&orchestrator, file, metadata, mode, explain, cli.format).await,
        Commands::Stats => cmd_stats(&orchestrator, cli.format),
        Commands::Query { pattern } => cmd_query(&orchestrator, &pattern, cli.format),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

async fn cmd_classify(
    orchestrator: &ClassificationOrchestrator,
    file: Option<PathBuf>,
    metadata: Option<PathBuf>,
    mode: ClassificationMode,
    explain: bool,
    format: OutputFormat,
) -> Result<()> {
    let text = read_input(file)?;

    let metadata = match metadata {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid metadata JSON in {}", path.display()))?;
            DocumentMetadata::from_json(value)
        }
        None => DocumentMetadata::new(),
    };

    let result = orchestrator.classify(&text, &metadata, mode).await;
    let explanation = explain.then(|| orchestrator.explain(&result, &text));

    match format {
        OutputFormat::Text => print_result(&result, explanation.as_ref()),
        _ => {
            let output = match &explanation {
                Some(explanation) => {
                    serde_json::json!({ "result": result, "explanation": explanation })
                }
                None => serde_json::to_value(&result)?,
            };
            print_json(&output, format)?;
        }
    }

    Ok(())
}

fn cmd_stats(orchestrator: &ClassificationOrchestrator, format: OutputFormat) -> Result<()> {
    let taxonomy = orchestrator.taxonomy().get_statistics();
    let ontology = orchestrator.ontology().get_statistics();

    match format {
        OutputFormat::Text => {
            println!("{}", "Taxonomy".bold());
            println!("  classes:    {}", taxonomy.total_classes);
            println!("  leaves:     {}", taxonomy.leaf_classes);
            println!("  sensitive:  {}", taxonomy.sensitive_classes);
            println!("  max depth:  {}", taxonomy.max_depth);
            for (risk, count) in &taxonomy.classes_by_risk {
                println!("  {:<11} {}", format!("{}:", risk), count);
            }
            println!("{}", "Ontology".bold());
            println!("  triples:    {}", ontology.total_triples);
            println!("  classes:    {}", ontology.total_classes);
            println!("  object properties:   {}", ontology.total_object_properties);
            println!("  datatype properties: {}", ontology.total_datatype_properties);
        }
        _ => print_json(
            &serde_json::json!({ "taxonomy": taxonomy, "ontology": ontology }),
            format,
        )?,
    }

    Ok(())
}

fn cmd_query(
    orchestrator: &ClassificationOrchestrator,
    pattern: &str,
    format: OutputFormat,
) -> Result<()> {
    let rows = orchestrator.ontology().query(pattern)?;

    match format {
        OutputFormat::Text => {
            println!("{} {} solution(s)", "OK".green(), rows.len());
            for row in &rows {
                let cells: Vec<String> = row.iter().map(|(k, v)| format!("?{}={}", k, v)).collect();
                println!("  {}", cells.join("  "));
            }
        }
        _ => print_json(&rows, format)?,
    }

    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_result(result: &ClassificationResult, explanation: Option<&Explanation>) {
    let status = if result.is_unclassified() {
        "UNCLASSIFIED".yellow().bold()
    } else {
        "OK".green().bold()
    };
    println!(
        "{} {} ({}) confidence {:.3} via {}",
        status, result.class_id, result.label, result.confidence, result.method
    );

    let phases: Vec<&str> = result.phases_used.iter().map(|p| p.as_str()).collect();
    println!("  mode:   {}  phases: {}", result.classification_mode, phases.join(" -> "));

    if let Some(path) = &result.taxonomy_path {
        println!("  path:   {}", path);
    }
    if let (Some(category), Some(confidence)) = (&result.ml_category, result.ml_confidence) {
        println!("  ml:     {} ({:.3})", category, confidence);
    }
    if let Some(class) = &result.ontology_class {
        println!(
            "  ontology: {} ({:.3})",
            class,
            result.ontology_confidence.unwrap_or_default()
        );
    }
    if let Some(risk) = result.inferred_risk_level {
        println!("  risk:   {}", risk);
    }
    if let Some(validation) = &result.metadata_validation {
        if validation.is_valid {
            println!("  metadata: {}", "valid".green());
        } else {
            println!("  metadata: {}", "invalid".red());
            for error in &validation.errors {
                println!("    - {}", error);
            }
        }
    }
    for failure in &result.phase_errors {
        println!("  {} {}: {}", "phase failed".red(), failure.phase, failure.message);
    }

    if let Some(explanation) = explanation {
        println!("  evidence:");
        for evidence in &explanation.evidence {
            println!("    [{}] …{}…", evidence.keyword.bold(), evidence.excerpt);
        }
    }
}

fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let out = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    };
    println!("{}", out);
    Ok(())
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
