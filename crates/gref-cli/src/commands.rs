use std::path::PathBuf;

use colored::Colorize;
use gref_remote::{ConfigSource, GitSource, GitSourceOptions, RefSpecSource, Remote, RemoteError};
use gref_spec::{Direction, RefSpec};
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Parse(args) => cmd_parse(args, &format),
        Command::Match(args) => cmd_match(args, &format),
        Command::List(args) => cmd_list(args, &format),
        Command::Map(args) => cmd_map(args, &format),
    }
}

fn direction(push: bool) -> Direction {
    if push { Direction::Push } else { Direction::Fetch }
}

fn open_source(args: &SourceArgs) -> anyhow::Result<Box<dyn RefSpecSource>> {
    if let Some(path) = &args.config {
        return Ok(Box::new(ConfigSource::load(path)?));
    }
    let path = args.repo.clone().unwrap_or_else(|| PathBuf::from("."));
    let source = GitSource::open(&path)?
        .with_options(GitSourceOptions { allow_from_url: args.allow_url });
    Ok(Box::new(source))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_parse(args: ParseArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let spec = RefSpec::parse(&args.spec, direction(args.push))?;
    match format {
        OutputFormat::Json => print_json(&spec),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), spec.to_string().bold());
            println!("  Direction:   {}", spec.direction().to_string().cyan());
            println!("  Source:      {}", spec.source().yellow());
            if spec.has_destination() {
                println!("  Destination: {}", spec.destination().yellow());
            } else {
                println!("  Destination: {}", "(none)".dimmed());
            }
            println!("  Force:       {}", spec.is_force());
            println!("  Wildcard:    {}", spec.is_wildcard());
            Ok(())
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct MatchRow {
    reference: String,
    matches: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
}

fn match_rows(spec: &RefSpec, refs: &[String]) -> Vec<MatchRow> {
    refs.iter()
        .map(|reference| MatchRow {
            reference: reference.clone(),
            matches: spec.matches(reference),
            destination: spec.transform(reference).ok(),
        })
        .collect()
}

fn cmd_match(args: MatchArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let spec = RefSpec::parse(&args.spec, direction(args.push))?;
    let rows = match_rows(&spec, &args.refs);
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            for row in &rows {
                match &row.destination {
                    Some(dst) if !dst.is_empty() => println!("{} {} → {}", "✓".green(), row.reference, dst.yellow()),
                    Some(_) => println!("{} {} {}", "✓".green(), row.reference, "(not stored)".dimmed()),
                    None => println!("{} {}", "✗".red(), row.reference.dimmed()),
                }
            }
            Ok(())
        }
    }
}

fn cmd_list(args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let source = open_source(&args.source)?;
    let remote = Remote::new(source.as_ref(), args.remote);
    let specs = remote.refspecs().enumerate()?;
    match format {
        OutputFormat::Json => print_json(&specs.to_vec()),
        OutputFormat::Text => {
            if specs.is_empty() {
                println!("No refspecs configured for {}.", remote.name().bold());
            }
            for spec in &specs {
                println!("{:<5} {}", spec.direction().to_string().cyan(), spec);
            }
            Ok(())
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct MappingRow {
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refspec: Option<String>,
    force: bool,
}

fn mapping_rows(remote: &Remote<'_>, direction: Direction, refs: &[String]) -> Result<Vec<MappingRow>, RemoteError> {
    let refspecs = remote.refspecs();
    let mut rows = Vec::with_capacity(refs.len());
    for reference in refs {
        let row = match refspecs.matching_refspec(direction, reference)? {
            Some(spec) => MappingRow {
                reference: reference.clone(),
                destination: Some(spec.transform(reference)?),
                refspec: Some(spec.to_string()),
                force: spec.is_force(),
            },
            None => MappingRow {
                reference: reference.clone(),
                destination: None,
                refspec: None,
                force: false,
            },
        };
        rows.push(row);
    }
    Ok(rows)
}

fn cmd_map(args: MapArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let source = open_source(&args.source)?;
    let remote = Remote::new(source.as_ref(), args.remote);
    let rows = mapping_rows(&remote, direction(args.push), &args.refs)?;
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            for row in &rows {
                match (&row.destination, &row.refspec) {
                    (Some(dst), Some(spec)) => {
                        let force = if row.force { " (forced)".magenta().to_string() } else { String::new() };
                        println!("{} → {}{}  {}", row.reference, dst.yellow(), force, spec.dimmed());
                    }
                    _ => println!("{} {}", row.reference, "no mapping".red()),
                }
            }
            Ok(())
        }
    }
}
