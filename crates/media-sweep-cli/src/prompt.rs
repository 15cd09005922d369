use anyhow::{bail, Context, Result};
use media_sweep_core::DestinationPicker;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

/// One trimmed line from stdin. EOF reads as an empty line.
pub fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Parse a rank list such as `"1, 3-5"` into 1-based ranks, first mention
/// first. A blank list selects nothing. Ranges are clipped to `listed`; a
/// single rank or range start past it is an error.
pub fn parse_ranks(list: &str, listed: usize) -> Result<Vec<usize>> {
    let mut seen = vec![false; listed + 1];
    let mut ranks = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_rank(start)?, parse_rank(end)?),
            None => {
                let rank = parse_rank(part)?;
                (rank, rank)
            }
        };
        if start > end {
            bail!("Invalid rank range '{}'", part);
        }
        if start > listed {
            bail!("No asset at rank {} ({} listed)", start, listed);
        }
        for rank in start..=end.min(listed) {
            if !seen[rank] {
                seen[rank] = true;
                ranks.push(rank);
            }
        }
    }
    Ok(ranks)
}

fn parse_rank(text: &str) -> Result<usize> {
    let rank: usize = text
        .trim()
        .parse()
        .with_context(|| format!("Invalid rank '{}'", text.trim()))?;
    if rank == 0 {
        bail!("Ranks start at 1");
    }
    Ok(rank)
}

/// Asks on stdin where each exported video should go.
///
/// A directory answer keeps the suggested file name, a path without an
/// extension gets the video's one, and an empty answer cancels the item.
pub struct StdinPicker;

impl DestinationPicker for StdinPicker {
    fn pick_destination(&self, suggested_name: &str, extension: &str) -> Option<PathBuf> {
        let prompt = format!(
            "\nSave video as (directory or file, blank to skip) [{}]: ",
            suggested_name
        );
        let answer = match prompt_line(&prompt) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Could not read destination: {}", e);
                return None;
            }
        };
        resolve_destination(&answer, suggested_name, extension)
    }
}

fn resolve_destination(answer: &str, suggested_name: &str, extension: &str) -> Option<PathBuf> {
    if answer.is_empty() {
        return None;
    }
    let mut path = PathBuf::from(answer);
    if path.is_dir() {
        path.push(suggested_name);
    } else if path.extension().is_none() {
        path.set_extension(extension);
    }
    Some(path)
}
