mod commands;
mod logging;
mod progress;
mod prompt;
mod report;

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::process;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use console::Term;
use dotenv::dotenv;
use indicatif::HumanBytes;
use media_sweep_core::config::{self, ScanConfig};
use media_sweep_core::{
    AppConfig, AssetId, Error as CoreError, FsLibrary, MediaStore, ProcessOutcome, ScanEngine,
    ScanStats, Session,
};
use progress::CliReporter;
use prompt::{parse_ranks, prompt_confirm, prompt_line, StdinPicker};
use tracing::{error, info};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Scan { limit, csv }) => run_scan(&config, limit, csv.as_deref()),
        Some(Commands::Sweep {
            export,
            delete,
            yes,
        }) => run_sweep(&config, export, delete, yes),
        Some(Commands::Thumbnail { rank, output, size }) => {
            run_thumbnail(&config, rank, &output, size)
        }
        Some(Commands::PrintConfig) => toml::to_string_pretty(&config)
            .map(|rendered| println!("{}", rendered))
            .map_err(Into::into),
        None => Cli::command().print_long_help().map_err(Into::into),
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => config::load_configuration_from(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => config::load_configuration()?,
    };
    Ok(config)
}

fn open_library(config: &AppConfig) -> Result<FsLibrary> {
    let library = FsLibrary::open(&config.library_root)?
        .with_ignore_patterns(&config.ignore_patterns);
    info!("Library root: {}", library.root().display());
    Ok(library)
}

fn run_scan(config: &AppConfig, limit: Option<usize>, csv: Option<&Path>) -> Result<()> {
    let library = open_library(config)?;
    let mut scan_config = ScanConfig::from(config);
    if let Some(limit) = limit {
        scan_config.max_results = limit;
    }

    let engine = ScanEngine::new(Arc::new(library), scan_config);
    let reporter = CliReporter::new();
    let result = engine.scan(&reporter)?;

    println!();
    report::print_inventory(&result.inventory);
    report::print_scan_stats(&result.stats);

    if let Some(path) = csv {
        report::write_csv(&result.inventory, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote ranked list to {}", path.display());
    }

    Ok(())
}

fn run_sweep(
    config: &AppConfig,
    export: Option<String>,
    delete: Option<String>,
    yes: bool,
) -> Result<()> {
    let library = Arc::new(open_library(config)?);
    let mut session =
        Session::from_config(library.clone(), config, Some(Box::new(StdinPicker)))
            .with_reporter(Arc::new(CliReporter::new()));

    let stats = scan_with_session(&mut session)?;
    println!();
    report::print_inventory(session.inventory());
    report::print_scan_stats(&stats);
    if session.inventory().is_empty() {
        println!("Nothing to sweep.");
        return Ok(());
    }

    let export = match export {
        Some(list) => list,
        None => prompt_line("Ranks to export (e.g. 1,3-5, blank for none): ")?,
    };
    let delete = match delete {
        Some(list) => list,
        None => prompt_line("Ranks to delete (e.g. 2,7, blank for none): ")?,
    };

    let listed = session.inventory().len();
    for rank in parse_ranks(&export, listed)? {
        let id = id_for_rank(&session, rank)?;
        session.toggle_export_selection(id)?;
    }
    for rank in parse_ranks(&delete, listed)? {
        let id = id_for_rank(&session, rank)?;
        session.toggle_delete_selection(id)?;
    }

    let exporting = session.export_selection().len();
    let deleting = session.delete_selection().len();
    if exporting == 0 && deleting == 0 {
        println!("Nothing selected.");
        return Ok(());
    }

    println!(
        "Export {} assets ({}) to {}",
        format!("{}", exporting).cyan(),
        HumanBytes(session.pending_export_size()),
        config.export_dir
    );
    println!(
        "Delete {} assets, freeing {}",
        format!("{}", deleting).red(),
        HumanBytes(session.total_pending_size())
    );

    if !yes && !prompt_confirm("Proceed?", Some(false))? {
        println!("Aborted.");
        return Ok(());
    }

    let outcome = process_with_session(&mut session)?;
    println!();
    report::print_outcome(&outcome);
    report::print_leftover_staging(&library.leftover_staging());

    if !outcome.is_success() {
        bail!("sweep finished with failures");
    }
    Ok(())
}

fn scan_with_session(session: &mut Session) -> Result<ScanStats> {
    let slot: Rc<RefCell<Option<CoreError>>> = Rc::new(RefCell::new(None));
    let failure = Rc::clone(&slot);
    session.start_scan(move |result| {
        if let Err(e) = result {
            *failure.borrow_mut() = Some(e);
        }
    })?;

    let term = Term::stdout();
    term.hide_cursor()?;
    let bar = progress::fraction_bar();
    let polled = loop {
        match session.pump(POLL_INTERVAL) {
            Ok(true) => {
                bar.set_position((session.progress() * progress::FRACTION_STEPS as f64) as u64)
            }
            Ok(false) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    bar.finish_and_clear();
    term.show_cursor()?;
    polled?;

    if let Some(e) = slot.borrow_mut().take() {
        return Err(e.into());
    }
    session
        .last_scan_stats()
        .cloned()
        .ok_or_else(|| anyhow!("scan finished without publishing results"))
}

fn process_with_session(session: &mut Session) -> Result<ProcessOutcome> {
    let slot: Rc<RefCell<Option<ProcessOutcome>>> = Rc::new(RefCell::new(None));
    let received = Rc::clone(&slot);
    session.process_selections(move |result| {
        if let Ok(outcome) = result {
            *received.borrow_mut() = Some(outcome);
        }
    })?;
    session.run_until_idle()?;

    let outcome = slot.borrow_mut().take();
    outcome.ok_or_else(|| anyhow!("sweep finished without an outcome"))
}

fn id_for_rank(session: &Session, rank: usize) -> Result<AssetId> {
    session
        .inventory()
        .by_rank(rank)
        .map(|ranked| ranked.id())
        .ok_or_else(|| {
            anyhow!(
                "No asset at rank {} ({} listed)",
                rank,
                session.inventory().len()
            )
        })
}

fn run_thumbnail(config: &AppConfig, rank: usize, output: &Path, size: Option<u32>) -> Result<()> {
    let library = Arc::new(open_library(config)?);
    let engine = ScanEngine::new(library.clone(), ScanConfig::from(config));
    let result = engine.scan(&CliReporter::new())?;

    let ranked = result
        .inventory
        .by_rank(rank)
        .ok_or_else(|| {
            anyhow!(
                "No asset at rank {} ({} listed)",
                rank,
                result.inventory.len()
            )
        })?;
    let edge = size.unwrap_or(config.thumbnail_size);
    let Some(png) = library.fetch_thumbnail(&ranked.asset, edge)? else {
        bail!("No thumbnail available for {}", ranked.file_name());
    };

    fs::write(output, png).with_context(|| format!("writing {}", output.display()))?;
    println!(
        "Wrote {}px thumbnail of {} to {}",
        edge,
        ranked.file_name().bold(),
        output.display()
    );
    Ok(())
}
