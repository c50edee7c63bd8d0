//! `tether plan` command
//!
//! Prints the installs and links a bootstrap would perform.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;

use crate::cli::PlanArgs;
use crate::commands::load_workspace;
use tether::ops::{plan_bootstrap, BootstrapOptions, BootstrapPlan};
use tether::resolver::DiskInstallState;

pub fn execute(args: PlanArgs, root: Option<PathBuf>) -> Result<()> {
    let ws = load_workspace(root)?;

    let opts = BootstrapOptions {
        strategy: args.strategy.strategy,
        ignore: args.strategy.ignore,
        ..BootstrapOptions::default()
    };
    let plan = plan_bootstrap(&ws, &opts, &DiskInstallState)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&plan))?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn plan_json(plan: &BootstrapPlan<'_>) -> serde_json::Value {
    let installs: serde_json::Map<String, serde_json::Value> = plan
        .installs
        .targets()
        .map(|(target, specs)| {
            let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
            (target.to_string(), json!(specs))
        })
        .collect();

    let packages: Vec<serde_json::Value> = plan
        .packages
        .iter()
        .map(|p| {
            json!({
                "name": p.package.name(),
                "strategy": p.strategy.to_string(),
                "links": p.actions.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "installs": installs,
        "common": plan.installs.common_ranges(),
        "warnings": plan.installs.warnings(),
        "mismatches": plan.mismatches().collect::<Vec<_>>(),
        "packages": packages,
        "root_links": plan.root_links.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
    })
}

fn print_plan(plan: &BootstrapPlan<'_>) {
    if plan.installs.is_empty() {
        println!("Nothing to install");
    } else {
        println!("Installs:");
        for (target, specs) in plan.installs.targets() {
            let specs: Vec<String> = specs.iter().map(|s| s.to_string()).collect();
            println!("  {}: {}", target, specs.join(" "));
        }
    }

    for pkg_plan in &plan.packages {
        println!("{} ({})", pkg_plan.package.name(), pkg_plan.strategy);
        for action in &pkg_plan.actions {
            println!("  {}", action);
        }
    }

    if !plan.root_links.is_empty() {
        println!("<root>");
        for action in &plan.root_links {
            println!("  {}", action);
        }
    }
}
