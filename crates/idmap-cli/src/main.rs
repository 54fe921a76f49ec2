//! Command-line interface for inspecting idmap identity resolution.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idmap_core::config::env_vars;
use idmap_core::{
    CredentialResolver, HookSummary, NumericCredential, PolicyConfig, PolicyRegistry,
};
use serde::Serialize;

/// idmap - map process credentials to textual identities.
#[derive(Parser, Debug)]
#[command(name = "idmap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Plugin search location (repeatable). Replaces the configured locations.
    #[arg(long = "policy-path", global = true)]
    policy_paths: Vec<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the identity of the current process.
    Whoami,
    /// Map a uid/gid pair to a textual credential.
    ToTextual {
        /// Numeric user id.
        #[arg(long)]
        uid: u32,
        /// Numeric group id.
        #[arg(long)]
        gid: u32,
    },
    /// Map a user id and group id to numeric ids.
    ToNumeric {
        /// User id.
        user: String,
        /// Group id.
        group: String,
    },
    /// Show scanned locations, loaded plugins and active hooks.
    Plugins,
}

#[derive(Serialize)]
struct PluginReport {
    locations: Vec<PathBuf>,
    plugins: Vec<PathBuf>,
    hooks: HookSummary,
}

fn init_logging(verbose: bool) {
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "idmap={level},idmap_core={level}",
            level = default_level
        ))
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }
}

fn load_config(policy_paths: Vec<PathBuf>) -> PolicyConfig {
    if policy_paths.is_empty() {
        return PolicyConfig::from_env();
    }
    policy_paths.into_iter().fold(
        PolicyConfig {
            search_locations: Vec::new(),
        },
        PolicyConfig::with_search_location,
    )
}

fn print<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn print_plugins(registry: &PolicyRegistry, json: bool) -> Result<()> {
    let report = PluginReport {
        locations: registry.locations().to_vec(),
        plugins: registry
            .plugins()
            .iter()
            .map(|p| p.path().to_path_buf())
            .collect(),
        hooks: registry.hooks().describe(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Search locations:");
    for location in &report.locations {
        println!("  {}", location.display());
    }
    println!("Loaded plugins: {}", report.plugins.len());
    for plugin in &report.plugins {
        println!("  {}", plugin.display());
    }
    let describe = |origin: &Option<idmap_core::HookOrigin>| match origin {
        Some(origin) => origin.to_string(),
        None => "native".to_string(),
    };
    println!("numeric -> textual: {}", describe(&report.hooks.numeric_to_textual));
    println!("textual -> numeric: {}", describe(&report.hooks.textual_to_numeric));
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.policy_paths);
    let registry = Arc::new(PolicyRegistry::from_config(&config));
    let resolver = CredentialResolver::new(registry.clone());

    match args.command {
        Command::Whoami => {
            let credential = resolver
                .resolve_current_user()
                .context("Failed to resolve the current user")?;
            print(&credential, args.json)
        }
        Command::ToTextual { uid, gid } => {
            let numeric = NumericCredential::new(uid, gid);
            let credential = resolver
                .resolve_numeric_to_textual(numeric)
                .with_context(|| format!("Failed to resolve {}", numeric))?;
            print(&credential, args.json)
        }
        Command::ToNumeric { user, group } => {
            let numeric = resolver
                .resolve_textual_to_numeric(&user, &group)
                .with_context(|| format!("Failed to resolve {}/{}", user, group))?;
            print(&numeric, args.json)
        }
        Command::Plugins => print_plugins(&registry, args.json),
    }
}
