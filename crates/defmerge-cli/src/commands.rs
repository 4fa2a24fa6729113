use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use defmerge_diff::{diff_documents, DiffLine, DocumentDiff, SectionChange};
use defmerge_merge::{
    CollectionReport, MergeEngine, MergeOutcome, MergeReport, MergeTarget, RenameReason,
};
use defmerge_store::{DocumentStore, FsDocumentStore, StoreError};
use defmerge_types::{AnalysisDocument, AnalysisId, Definition};

use crate::cli::*;
use crate::config::load_config;

type Engine = MergeEngine<FsDocumentStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), &cli.overrides)?;
    let store = FsDocumentStore::open(&cli.store)
        .with_context(|| format!("opening store {}", cli.store.display()))?;
    let engine = MergeEngine::new(store, config);

    match cli.command {
        Command::Create(args) => cmd_create(&engine, &args, &cli.format),
        Command::Update(args) => cmd_update(&engine, &args, &cli.format),
        Command::Plan(args) => cmd_plan(&engine, &args.mode, &cli.format),
        Command::Preview(args) => cmd_preview(&engine, &args.mode, args.context, &cli.format),
        Command::List => cmd_list(engine.store(), &cli.format),
    }
}

fn cmd_create(engine: &Engine, args: &CreateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (first, second, target) = create_inputs(args)?;
    let outcome = engine.create_merge(&first, &second, &target)?;
    print_outcome(&outcome, "Published", format)
}

fn cmd_update(engine: &Engine, args: &UpdateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (source, target) = update_inputs(engine, args)?;
    let outcome = engine.update_merge(&source, &target)?;
    print_outcome(&outcome, "Updated", format)
}

fn cmd_plan(engine: &Engine, mode: &MergeMode, format: &OutputFormat) -> anyhow::Result<()> {
    let outcome = plan(engine, mode)?;
    print_outcome(&outcome, "Planned", format)
}

fn cmd_preview(
    engine: &Engine,
    mode: &MergeMode,
    context: usize,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let outcome = plan(engine, mode)?;
    let current = match engine.store().fetch(&outcome.target.id) {
        Ok(doc) => doc,
        Err(StoreError::NotFound(_)) => AnalysisDocument::from_definition(Definition::default()),
        Err(e) => return Err(e.into()),
    };
    let diff = diff_documents(&current, &outcome.to_document(), context)?;

    match format {
        OutputFormat::Json => {
            let out = json!({
                "target": outcome.target.id.as_str(),
                "report": outcome.report,
                "diff": diff,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => print_diff(&outcome.target.id, &diff),
    }
    Ok(())
}

fn cmd_list(store: &FsDocumentStore, format: &OutputFormat) -> anyhow::Result<()> {
    let ids = store.list()?;
    match format {
        OutputFormat::Json => {
            let ids: Vec<&str> = ids.iter().map(AnalysisId::as_str).collect();
            println!("{}", serde_json::to_string_pretty(&ids)?);
        }
        OutputFormat::Text => {
            if ids.is_empty() {
                println!("{}", "No documents.".dimmed());
            }
            for id in &ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn plan(engine: &Engine, mode: &MergeMode) -> anyhow::Result<MergeOutcome> {
    let outcome = match mode {
        MergeMode::Create(args) => {
            let (first, second, target) = create_inputs(args)?;
            engine.plan_create(&first, &second, &target)?
        }
        MergeMode::Update(args) => {
            let (source, target) = update_inputs(engine, args)?;
            engine.plan_update(&source, &target)?
        }
    };
    Ok(outcome)
}

fn create_inputs(args: &CreateArgs) -> anyhow::Result<(AnalysisId, AnalysisId, MergeTarget)> {
    Ok((
        parse_id(&args.first)?,
        parse_id(&args.second)?,
        MergeTarget::new(parse_id(&args.target_id)?, args.target_name.clone()),
    ))
}

fn update_inputs(engine: &Engine, args: &UpdateArgs) -> anyhow::Result<(AnalysisId, MergeTarget)> {
    let target_id = parse_id(&args.target_id)?;
    let name = match &args.target_name {
        Some(name) => name.clone(),
        None => engine
            .store()
            .fetch(&target_id)?
            .name
            .unwrap_or_else(|| target_id.to_string()),
    };
    Ok((parse_id(&args.source)?, MergeTarget::new(target_id, name)))
}

fn parse_id(raw: &str) -> anyhow::Result<AnalysisId> {
    AnalysisId::parse(raw).with_context(|| format!("invalid document id {raw:?}"))
}

fn print_outcome(outcome: &MergeOutcome, verb: &str, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let out = json!({
                "target": outcome.target.id.as_str(),
                "name": outcome.target.name,
                "theme_arn": outcome.theme_arn,
                "report": outcome.report,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "{} {} {} ({})",
                "✓".green().bold(),
                verb,
                outcome.target.id.as_str().bold(),
                outcome.target.name
            );
            print_report(&outcome.report);
        }
    }
    Ok(())
}

fn print_report(report: &MergeReport) {
    if report.plan.is_empty() {
        println!("  Aliases: {}", "no renames".dimmed());
    } else {
        println!(
            "  Aliases: {} renamed, {} references rewritten",
            report.plan.len().to_string().bold(),
            report.aliases_rewritten
        );
        for rename in report.plan.renames() {
            let why = match &rename.reason {
                RenameReason::SharedDataSet { data_set_arn } => format!("same dataset {data_set_arn}"),
                RenameReason::AliasClash { incoming_arn, .. } => format!("clash, now {incoming_arn}"),
            };
            println!(
                "    {} → {}  {}",
                rename.from.yellow(),
                rename.to.green(),
                why.dimmed()
            );
        }
    }
    let rows: [(&str, &CollectionReport); 6] = [
        ("Datasets", &report.data_sets),
        ("Parameters", &report.parameters),
        ("Sheets", &report.sheets),
        ("Filter groups", &report.filter_groups),
        ("Calculated fields", &report.calculated_fields),
        ("Column configurations", &report.column_configurations),
    ];
    for (label, counts) in rows {
        println!(
            "  {label}: {} appended, {} skipped",
            counts.appended.to_string().green(),
            counts.skipped
        );
    }
}

fn print_diff(id: &AnalysisId, diff: &DocumentDiff) {
    if diff.is_empty() {
        println!("No changes to {}.", id.as_str().bold());
        return;
    }
    println!("Changes to {}:", id.as_str().bold());
    for change in &diff.sections {
        match change {
            SectionChange::Added { key, items } => {
                println!("  {} {}{}", "added".green(), key, count_suffix(*items))
            }
            SectionChange::Removed { key, items } => {
                println!("  {} {}{}", "removed".red(), key, count_suffix(*items))
            }
            SectionChange::Modified {
                key,
                old_items: Some(old),
                new_items: Some(new),
            } => println!("  {} {} ({old} → {new} items)", "modified".yellow(), key),
            SectionChange::Modified { key, .. } => println!("  {} {}", "modified".yellow(), key),
        }
    }
    println!();
    for hunk in &diff.lines.hunks {
        println!("{}", hunk.header().cyan());
        for line in &hunk.lines {
            match line {
                DiffLine::Context(text) => println!(" {text}"),
                DiffLine::Added(text) => println!("{}", format!("+{text}").green()),
                DiffLine::Removed(text) => println!("{}", format!("-{text}").red()),
            }
        }
    }
    println!(
        "\n{} additions, {} deletions",
        diff.lines.additions().to_string().green(),
        diff.lines.deletions().to_string().red()
    );
}

fn count_suffix(items: Option<usize>) -> String {
    items.map(|n| format!(" ({n} items)")).unwrap_or_default()
}
