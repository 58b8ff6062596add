use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use orthoscope::app::App;
use orthoscope::compose::CallFilter;
use orthoscope::config::{ConfigLoader, default_index_dir};
use orthoscope::domain::{EntityId, GeneId, TaxonId};
use orthoscope::error::OrthoError;
use orthoscope::output::JsonOutput;
use orthoscope::store::{IndexStore, read_json};

#[derive(Parser)]
#[command(name = "orthoscope")]
#[command(about = "Nested-set orthology index and multi-species comparison scopes")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Ingest orthology trees and publish the index")]
    Ingest(IngestArgs),
    #[command(about = "List genes orthologous to a gene at a taxonomic level")]
    Orthologs(OrthologArgs),
    #[command(about = "Check whether two entities are comparable at a taxon")]
    Comparable(ComparableArgs),
    #[command(about = "Resolve a multi-species call filter to a query scope")]
    Scope(ScopeArgs),
}

#[derive(Args)]
struct IngestArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    out: Option<String>,
}

#[derive(Args)]
struct OrthologArgs {
    gene: String,

    #[arg(long)]
    taxon: String,

    #[arg(long)]
    index: Option<String>,
}

#[derive(Args)]
struct ComparableArgs {
    entity_a: String,
    entity_b: String,

    #[arg(long)]
    taxon: String,

    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct ScopeArgs {
    #[arg(long)]
    filter: String,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    index: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<OrthoError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &OrthoError) -> u8 {
    match error {
        OrthoError::MissingConfig
        | OrthoError::ConfigRead(_)
        | OrthoError::IndexNotFound(_)
        | OrthoError::UnknownTaxon(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => run_ingest(args),
        Commands::Orthologs(args) => run_orthologs(args),
        Commands::Comparable(args) => run_comparable(args),
        Commands::Scope(args) => run_scope(args),
    }
}

fn run_ingest(args: IngestArgs) -> miette::Result<()> {
    let mut config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    if let Some(out) = args.out {
        config.index_dir = out.into();
    }
    let app = App::new(IndexStore::new(config.index_dir.clone()));
    let result = app.ingest(&config).into_diagnostic()?;
    JsonOutput::print_ingest(&result).into_diagnostic()?;
    Ok(())
}

fn run_orthologs(args: OrthologArgs) -> miette::Result<()> {
    let gene = args.gene.parse::<GeneId>().into_diagnostic()?;
    let taxon = args.taxon.parse::<TaxonId>().into_diagnostic()?;
    let index_dir = args
        .index
        .map(Into::into)
        .unwrap_or_else(default_index_dir);
    let app = App::new(IndexStore::new(index_dir));
    let result = app.orthologs(gene, taxon).into_diagnostic()?;
    JsonOutput::print_orthologs(&result).into_diagnostic()?;
    Ok(())
}

fn run_comparable(args: ComparableArgs) -> miette::Result<()> {
    let entity_a = args.entity_a.parse::<EntityId>().into_diagnostic()?;
    let entity_b = args.entity_b.parse::<EntityId>().into_diagnostic()?;
    let taxon = args.taxon.parse::<TaxonId>().into_diagnostic()?;
    let config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    let app = App::new(IndexStore::new(config.index_dir.clone()));
    let result = app
        .comparable(&config, entity_a, entity_b, taxon)
        .into_diagnostic()?;
    JsonOutput::print_comparable(&result).into_diagnostic()?;
    Ok(())
}

fn run_scope(args: ScopeArgs) -> miette::Result<()> {
    let mut config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    if let Some(index) = args.index {
        config.index_dir = index.into();
    }
    let filter: CallFilter = read_json(camino::Utf8Path::new(&args.filter)).into_diagnostic()?;
    let app = App::new(IndexStore::new(config.index_dir.clone()));
    let result = app.scope(&config, &filter).into_diagnostic()?;
    JsonOutput::print_scope(&result).into_diagnostic()?;
    Ok(())
}
