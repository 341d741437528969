//! `polidiff` — semantic diff CLI (spec.md §6 "diff tool").
//!
//! Diffs two loaded policies over a requested kind selection and exits
//! nonzero iff the total differences across those kinds is positive, per
//! `libpoldiff`'s own CLI convention.

use clap::Parser;
use policy_core::{diff_policies, DiffKind, PolicyEngineConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "polidiff", about = "Semantically diff two SELinux-family policies")]
struct Args {
    /// Original policy (P1).
    original: PathBuf,

    /// Modified policy (P2).
    modified: PathBuf,

    /// Diff kinds to report (see `--list`). Defaults to every kind.
    #[arg(short, long = "kind")]
    kinds: Vec<String>,

    /// List every diffable kind name and exit.
    #[arg(long)]
    list: bool,

    /// Emit the diff as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    policy_cli::init_tracing();
    let args = Args::parse();

    if args.list {
        for kind in DiffKind::ALL {
            println!("{}", kind.name());
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(total_differences) => {
            if total_differences > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<usize> {
    let config = PolicyEngineConfig::reference_policy_defaults();
    let left = policy_cli::load_policy_file(&args.original, config.clone())?;
    let right = policy_cli::load_policy_file(&args.modified, config)?;

    let selected: Vec<DiffKind> = if args.kinds.is_empty() {
        DiffKind::ALL.to_vec()
    } else {
        args.kinds
            .iter()
            .map(|name| DiffKind::from_name(name).ok_or_else(|| anyhow::anyhow!("unknown diff kind '{name}'")))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let report = diff_policies(&left, &right);
    let diffs: Vec<_> = report.diffs.iter().filter(|d| selected.contains(&d.kind)).collect();

    let total: usize = selected
        .iter()
        .map(|kind| {
            let stats = report.get_stats(*kind);
            stats.added + stats.removed + stats.modified + stats.added_type + stats.removed_type
        })
        .sum();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diffs)?);
    } else {
        for diff in &diffs {
            println!("[{:?}/{:?}] {}", diff.kind, diff.form, diff.payload);
        }
        println!("--- {total} total differences across {} kind(s) ---", selected.len());
    }

    Ok(total)
}
