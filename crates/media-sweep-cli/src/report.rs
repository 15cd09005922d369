use colored::*;
use console::style;
use indicatif::{HumanBytes, HumanCount, HumanDuration};
use media_sweep_core::{DeleteOutcome, ExportOutcome, ProcessOutcome, RankedInventory, ScanStats};
use std::path::{Path, PathBuf};

pub fn print_inventory(inventory: &RankedInventory) {
    println!(
        "{}  {}  {}  {}",
        format!("{:>4}", "#").bold(),
        format!("{:<5}", "Kind").bold(),
        format!("{:>10}", "Size").bold(),
        "Name".bold()
    );
    for (index, ranked) in inventory.iter().enumerate() {
        let size = format!("{:>10}", HumanBytes(ranked.size_bytes).to_string());
        let resources = ranked.asset.resources.len();
        let extra = if resources > 1 {
            format!(" (+{} resources)", resources - 1).dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "{:>4}  {:<5}  {}  {}{}",
            index + 1,
            ranked.kind().to_string(),
            size.green(),
            ranked.file_name(),
            extra
        );
    }
    println!(
        "{} assets, {} total",
        style(HumanCount(inventory.len() as u64)).bold().green(),
        style(HumanBytes(inventory.total_size())).bold().green(),
    );
}

pub fn print_scan_stats(stats: &ScanStats) {
    println!(
        "Counted {} entries in {} collections in {}, scanned in {}",
        format!("{}", stats.visited).cyan(),
        format!("{}", stats.collections).cyan(),
        HumanDuration(stats.count_duration),
        HumanDuration(stats.scan_duration),
    );
    println!(
        "{} unique assets, {} repeats across collections, {} scanned",
        format!("{}", stats.unique).green(),
        format!("{}", stats.duplicates).yellow(),
        HumanBytes(stats.total_bytes),
    );
}

pub fn write_csv(inventory: &RankedInventory, path: &Path) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["rank", "id", "kind", "file_name", "size_bytes", "total_bytes"])?;
    for (index, ranked) in inventory.iter().enumerate() {
        wtr.write_record([
            (index + 1).to_string(),
            ranked.id().to_string(),
            ranked.kind().to_string(),
            ranked.file_name().to_string(),
            ranked.size_bytes.to_string(),
            ranked.asset.total_size().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_outcome(outcome: &ProcessOutcome) {
    for item in &outcome.export.items {
        match &item.outcome {
            ExportOutcome::Saved(path) => println!(
                "  {} {} -> {}",
                "saved".green(),
                item.file_name,
                path.display()
            ),
            ExportOutcome::Failed(e) => {
                println!("  {} {}: {}", "failed".red(), item.file_name, e)
            }
            ExportOutcome::Cancelled => println!("  {} {}", "skipped".yellow(), item.file_name),
        }
    }

    match &outcome.delete {
        DeleteOutcome::Skipped => {}
        DeleteOutcome::Deleted(ids) => {
            println!("{} {} assets", "Deleted".green().bold(), ids.len())
        }
        DeleteOutcome::Failed(e) => {
            println!("{} {}", "Nothing was deleted:".red().bold(), e)
        }
    }
}

/// Staging directories that still hold deleted files after a sweep.
pub fn print_leftover_staging(dirs: &[PathBuf]) {
    for dir in dirs {
        println!(
            "{} {} (remove it by hand to reclaim the space)",
            "Deleted files left in".yellow().bold(),
            dir.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_sweep_core::library::models::AssetResource;
    use media_sweep_core::scanner::rank;
    use media_sweep_core::{Asset, AssetId, MediaKind};
    use tempfile::tempdir;

    #[test]
    fn test_csv_lists_ranked_rows() {
        let entries = vec![
            (
                Asset::new(
                    AssetId::new(1),
                    MediaKind::Image,
                    vec![AssetResource::new("small.jpg", 10)],
                ),
                10,
            ),
            (
                Asset::new(
                    AssetId::new(2),
                    MediaKind::Video,
                    vec![AssetResource::new("big.mov", 90)],
                ),
                90,
            ),
        ];
        let inventory = rank(entries, 10);
        let dir = tempdir().unwrap();
        let path = dir.path().join("ranked.csv");

        write_csv(&inventory, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][2], "video");
        assert_eq!(&rows[0][3], "big.mov");
        assert_eq!(&rows[1][4], "10");
    }
}
