//! `config` subcommands.

use anyhow::Result;

use allowguard_config::{ResolvedConfig, ShowFormat};

use crate::config_bridge;
use crate::theme::Theme;

/// Print the effective configuration.
pub(crate) fn show(resolved: &ResolvedConfig, format: ShowFormat) -> Result<()> {
    print!("{}", resolved.render(format)?);
    Ok(())
}

/// Validate the configuration end to end and summarise what each context
/// would run with.
pub(crate) fn check(resolved: &ResolvedConfig) -> Result<()> {
    let config = &resolved.config;
    config_bridge::classifier(config)?;
    let settings = config_bridge::runtime_settings(config);

    println!("{}", Theme::header("Configuration"));
    if resolved.loaded_files.is_empty() {
        println!("{}", Theme::field("files", Theme::dimmed("defaults only")));
    }
    for file in &resolved.loaded_files {
        println!("{}", Theme::field("file", file));
    }
    println!(
        "{}",
        Theme::field("blacklisted addresses", config.blacklist.addresses.len())
    );
    println!(
        "{}",
        Theme::field("marketplace contracts", config.contracts.marketplaces.len())
    );
    println!(
        "{}",
        Theme::field("permit contracts", config.contracts.permits.len())
    );

    println!("{}", Theme::header("Page"));
    let delays: Vec<String> = settings
        .interceptor
        .retry_delays
        .iter()
        .map(|d| format!("{}ms", d.as_millis()))
        .collect();
    println!("{}", Theme::field("install retries", delays.join(", ")));
    match settings.interceptor.decision_timeout {
        Some(limit) => println!(
            "{}",
            Theme::field(
                "decision timeout",
                format!(
                    "{}ms, then {}",
                    limit.as_millis(),
                    if settings.interceptor.timeout_fallback.is_allowed() {
                        "allow"
                    } else {
                        "block"
                    }
                )
            )
        ),
        None => println!("{}", Theme::field("decision timeout", "none")),
    }

    println!("{}", Theme::header("Bridge"));
    println!(
        "{}",
        Theme::field("max pending", settings.bridge.max_pending)
    );
    println!(
        "{}",
        Theme::field(
            "confirmation phrase",
            format!("\"{}\"", settings.bridge.confirmation_phrase)
        )
    );

    println!("{}", Theme::header("Background"));
    match settings.ledger.ttl {
        Some(ttl) => println!(
            "{}",
            Theme::field("pending ttl", format!("{}s", ttl.as_secs()))
        ),
        None => println!("{}", Theme::field("pending ttl", "none")),
    }

    println!();
    println!("{}", Theme::success("Configuration is valid"));
    Ok(())
}
