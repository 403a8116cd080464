//! Config commands (show, path, init)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{money, print_json};
use mita_core::{
    default_config_path, CategoryAllocation, EngineConfig, IncomeTier, DEFAULT_CONFIG,
};

/// The override file in effect: `--config` if given, else the default location
pub fn resolve_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    config_path.map(Path::to_path_buf).or_else(default_config_path)
}

pub fn cmd_config_show(config_path: Option<&Path>, json: bool) -> Result<()> {
    let path = resolve_config_path(config_path);
    let config = EngineConfig::load(config_path).context("Failed to load engine config")?;
    let source = match path {
        Some(ref p) if p.exists() => p.display().to_string(),
        _ => "built-in defaults".to_string(),
    };

    if json {
        let weights: BTreeMap<&str, &CategoryAllocation> = config
            .weights
            .iter()
            .map(|(tier, table)| (tier.as_str(), table))
            .collect();
        return print_json(&serde_json::json!({
            "source": source,
            "tiers": {
                "lower_middle": config.tiers.lower_middle,
                "middle": config.tiers.middle,
                "upper_middle": config.tiers.upper_middle,
                "high": config.tiers.high,
            },
            "weights": weights,
            "velocity": {
                "period_days": config.velocity.period_days,
                "over_threshold": config.velocity.over_threshold,
                "severe_threshold": config.velocity.severe_threshold,
                "under_threshold": config.velocity.under_threshold,
                "recommendation_buffer": config.velocity.recommendation_buffer,
            },
            "redistribution": {
                "surplus_cap": config.redistribution.surplus_cap,
            },
            "location": {
                "high_cost": config.location.high_cost,
                "low_cost": config.location.low_cost,
            },
            "collaborators": {
                "timeout_secs": config.collaborators.timeout.as_secs(),
            },
        }));
    }

    println!();
    println!("⚙️  MITA Engine Configuration");
    println!("   Source: {}", source);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Income tiers (monthly):");
    println!("     low            < {}", money(config.tiers.lower_middle));
    println!("     lower_middle  >= {}", money(config.tiers.lower_middle));
    println!("     middle        >= {}", money(config.tiers.middle));
    println!("     upper_middle  >= {}", money(config.tiers.upper_middle));
    println!("     high          >= {}", money(config.tiers.high));

    println!();
    println!("   Weights:");
    for tier in IncomeTier::all() {
        if let Some(table) = config.weights_for(*tier) {
            let parts: Vec<String> = table
                .iter()
                .map(|(category, w)| format!("{} {:.0}%", category, w * 100.0))
                .collect();
            println!("     {:<14} {}", tier.as_str(), parts.join(", "));
        }
    }

    let v = &config.velocity;
    println!();
    println!(
        "   Velocity: period {} days, over > {}, severe > {}, under < {}, buffer ×{}",
        v.period_days, v.over_threshold, v.severe_threshold, v.under_threshold, v.recommendation_buffer
    );
    println!(
        "   Redistribution: up to {:.0}% of a surplus per transfer",
        config.redistribution.surplus_cap * 100.0
    );
    println!(
        "   Collaborator timeout: {}s",
        config.collaborators.timeout.as_secs()
    );
    println!();
    Ok(())
}

pub fn cmd_config_path(config_path: Option<&Path>) -> Result<()> {
    match resolve_config_path(config_path) {
        Some(path) => {
            let status = if path.exists() { "exists" } else { "not created" };
            println!("{} ({})", path.display(), status);
        }
        None => println!("No config directory available on this platform"),
    }
    Ok(())
}

/// Write the built-in config to the override path, returning where it went
pub fn run_config_init(config_path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = resolve_config_path(config_path)
        .context("No config directory available; pass --config <path>")?;

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn cmd_config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = run_config_init(config_path, force)?;
    println!("✅ Wrote default configuration to {}", path.display());
    println!("   Edit it, then check with: mita config show");
    Ok(())
}
