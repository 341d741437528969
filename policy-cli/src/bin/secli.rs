//! `secli` — analysis CLI (spec.md §6 "Analysis CLI / report").
//!
//! Loads one policy, runs a selection of registered `policy_core::analysis`
//! modules against it in dependency order, and prints each module's items
//! and proofs. Exit code is nonzero iff any selected module reported a
//! nonempty result, matching `sechecker`'s own exit-code convention.

use clap::Parser;
use policy_core::analysis::{AnalysisKind, AnalysisOptions, AnalysisRegistry};
use policy_core::PolicyEngineConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "secli", about = "Run structural analyses against a loaded SELinux-family policy")]
struct Args {
    /// Path to a policy source file (text `.conf`/`.te`, or a compiled
    /// `policydb` header-only recognized, not decoded).
    policy: PathBuf,

    /// Analysis module names to run (see `--list` for the full set).
    /// Defaults to every registered module.
    #[arg(short, long = "module")]
    modules: Vec<String>,

    /// List every registered module name and exit.
    #[arg(long)]
    list: bool,

    /// Attribute name the "find domains" analysis treats as a domain
    /// marker.
    #[arg(long, default_value = "domain")]
    domain_attribute: String,

    /// Emit results as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    policy_cli::init_tracing();
    let args = Args::parse();

    if args.list {
        for kind in AnalysisKind::ALL {
            println!("{}", kind.name());
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(found_items) => {
            if found_items {
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

fn run(args: &Args) -> anyhow::Result<bool> {
    let mut config = PolicyEngineConfig::reference_policy_defaults();
    config.domain_attribute = args.domain_attribute.clone();
    config.validate()?;

    let policy = policy_cli::load_policy_file(&args.policy, config)?;

    let selected: Vec<AnalysisKind> = if args.modules.is_empty() {
        AnalysisKind::ALL.to_vec()
    } else {
        args.modules
            .iter()
            .map(|name| {
                AnalysisKind::from_name(name).ok_or_else(|| anyhow::anyhow!("unknown analysis module '{name}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let opts = AnalysisOptions::default();
    let results = AnalysisRegistry::run(&policy, &selected, &opts)?;

    // Only report the modules the caller actually asked for; dependencies
    // pulled in transitively (e.g. `unused_role`'s) still ran, but printing
    // them unasked would surprise a caller who selected one module by name.
    let mut requested_names: Vec<&'static str> = selected.iter().map(|k| k.name()).collect();
    requested_names.sort_unstable();
    requested_names.dedup();

    let mut any_items = false;
    if args.json {
        let mut out = serde_json::Map::new();
        for name in &requested_names {
            if let Some(result) = results.get(name) {
                any_items |= !result.is_empty();
                out.insert((*name).to_string(), serde_json::to_value(result)?);
            }
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for name in &requested_names {
            let Some(result) = results.get(name) else { continue };
            any_items |= !result.is_empty();
            println!("=== {} ({}) ===", result.test_name, result.item_kind);
            if result.is_empty() {
                println!("  (no items)");
                continue;
            }
            for item in &result.items {
                println!("  {}", item.object);
                for proof in &item.proofs {
                    println!("    [{}] {}", proof.severity, proof.text);
                }
            }
        }
    }

    Ok(any_items)
}
