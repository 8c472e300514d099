use anyhow::{Context, Result};
use clap::Parser;
use factor_prune::cli::{Cli, OutputFormat, TieMode};
use factor_prune::correlation_graph::StrongCorrelationGraph;
use factor_prune::csv_output::CsvOutput;
use factor_prune::json_output::JsonOutput;
use factor_prune::selection::{
    run_context, AnalysisContext, ContextReport, FirstByName, PromptResolver, RecordedDecisions,
    RejectTies, SelectionConfig, TieResolver,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Resolver consulted when no recorded decision matches a tie
fn fallback_resolver(mode: TieMode) -> Box<dyn TieResolver> {
    match mode {
        TieMode::Prompt => Box::new(PromptResolver::stdio()),
        TieMode::FirstByName => Box::new(FirstByName),
        TieMode::Fail => Box::new(RejectTies),
    }
}

/// Contexts to run: every configured one, or those named with --context
fn select_contexts<'a>(
    config: &'a SelectionConfig,
    requested: &[String],
) -> Result<Vec<&'a AnalysisContext>> {
    if requested.is_empty() {
        return Ok(config.contexts.iter().collect());
    }

    requested
        .iter()
        .map(|name| {
            config.context(name).ok_or_else(|| {
                let known: Vec<&str> = config.contexts.iter().map(|c| c.name.as_str()).collect();
                anyhow::anyhow!(
                    "Unknown context '{}'. Configured contexts: {}",
                    name,
                    known.join(", ")
                )
            })
        })
        .collect()
}

fn print_reports(reports: &[ContextReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text: Vec<String> = reports.iter().map(|r| r.to_report_string()).collect();
            print!("{}", text.join("\n"));
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            for report in reports {
                output.add_context(report);
            }
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            let mut output = CsvOutput::new();
            for report in reports {
                output.add_context(report);
            }
            print!("{}", output.to_csv());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = match args.config_path() {
        Some(path) => SelectionConfig::from_toml(path)?,
        None => SelectionConfig::default_study()?,
    };
    let contexts = select_contexts(&config, &args.contexts)?;
    if contexts.is_empty() {
        anyhow::bail!("No analysis context configured. Add a [[context]] section to the config.");
    }

    let inputs = args.load_inputs()?;
    let graph = StrongCorrelationGraph::build(&inputs, &config.thresholds)
        .context("Failed to build strong-correlation graph")?;

    let mut reports = Vec::with_capacity(contexts.len());
    for context in contexts {
        let mut resolver = RecordedDecisions::new(
            config.decisions_for(&context.name),
            fallback_resolver(args.ties),
        );
        let report = run_context(&graph, context, &config.weights, &mut resolver)
            .with_context(|| format!("Pruning failed for context '{}'", context.name))?;
        reports.push(report);
    }

    print_reports(&reports, args.format)
}
