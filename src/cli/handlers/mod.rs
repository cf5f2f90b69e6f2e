use std::fs;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::cli::settings::Settings;
use crate::io::profile_io;
use crate::io::test_file::TestFileError;
use crate::ops::merge::order_batch;
use crate::ops::sync::{self, SyncReport};
use crate::parse::scan;
use crate::render;
use crate::source::{FetchScope, IssueSource, JsonFileSource};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    match cli.command {
        Commands::Sync(args) => cmd_sync(args, json),
        Commands::Scan(args) => cmd_scan(args, json),
        Commands::Profiles(args) => cmd_profiles(args, json),
        Commands::Render(args) => cmd_render(args, json),
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

fn cmd_sync(args: SyncArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_args(args)?;
    let registry = profile_io::build_registry(settings.profiles_file.as_deref())?;
    let source = settings.build_source()?;
    let scopes = settings.scopes();

    let report = sync::run(&settings.request(&scopes), source.as_ref(), &registry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_sync_summary(&report);
    }
    Ok(())
}

fn print_sync_summary(report: &SyncReport) {
    let file = report.file.display();
    if report.fetched == 0 {
        println!("no issues fetched; {} left unchanged", file);
        return;
    }
    for key in &report.updated {
        println!("updated   {}", key);
    }
    for key in &report.inserted {
        println!("inserted  {}", key);
    }
    for key in &report.skipped {
        println!("skipped   {} (duplicate)", key);
    }
    if report.written {
        println!("wrote {}", file);
    } else if report.dry_run && report.changed {
        println!("dry run: {} would change", file);
    } else {
        println!("{} is up to date", file);
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

fn cmd_scan(args: ScanArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.file).map_err(|e| TestFileError::Read {
        path: args.file.clone(),
        source: e,
    })?;
    let state = scan(&text);
    let output = scan_to_json(&args.file.display().to_string(), &state);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("imports:");
    if output.imports.is_empty() {
        println!("  (none)");
    }
    for line in &output.imports {
        println!("  {}", line);
    }
    println!("blocks:");
    if output.blocks.is_empty() {
        println!("  (none)");
    }
    for block in &output.blocks {
        println!("  {:<12} lines {}-{}", block.key, block.start_line, block.end_line);
    }
    match output.marker_line {
        Some(line) => println!("marker: line {}", line),
        None => println!("marker: (none)"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

fn cmd_profiles(args: ProfilesArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = profile_io::build_registry(args.profiles.as_deref())?;
    let profiles: Vec<ProfileJson> = registry.iter().map(profile_to_json).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    for profile in &profiles {
        let hooks = if profile.hooks.is_empty() {
            String::new()
        } else {
            format!("  hooks: {}", profile.hooks.join(", "))
        };
        println!(
            "{:<8} timeout {}ms, retries {}{}",
            profile.name, profile.timeout, profile.retries, hooks
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

fn cmd_render(args: RenderArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = profile_io::build_registry(args.profiles.as_deref())?;
    // Fail on an unknown profile before reading any issues
    render::resolve_profile(&registry, &args.profile)?;

    let all = FetchScope {
        project: None,
        board: None,
    };
    let issues = JsonFileSource::new(args.issues).fetch_issues(&all)?;

    let mut rendered = Vec::new();
    for issue in order_batch(&issues) {
        let block = render::format(issue, &args.profile, &registry)?;
        rendered.push(rendered_to_json(issue, block));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        let blocks: Vec<&str> = rendered.iter().map(|r| r.block.as_str()).collect();
        println!("{}", blocks.join("\n\n"));
    }
    Ok(())
}
