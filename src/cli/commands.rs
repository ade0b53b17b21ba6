//! Non-interactive subcommands.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::funnel::{
    Channel, GoalTemplate, HandoffAction, MessageParts, Timeframe, build_message, resolve_handoff,
};

/// Load configuration from the given path or the default locations, then validate it
pub(crate) fn load_config(path: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

/// Write a default config file to ~/.leadfunnel/config.toml
pub(crate) fn cmd_init(force: bool) -> Result<()> {
    let path = Config::system_config_path().context("Could not determine config directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "Configuration already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    Config::default().save(&path)?;

    println!("✅ Configuration initialized at: {}", path.display());
    println!("   Set backend.base_url and clinic.contact before running the funnel.");
    Ok(())
}

/// Print the effective configuration
pub(crate) fn cmd_config(config: &Config, show_secrets: bool) -> Result<()> {
    println!("{}", render_config(config, show_secrets)?);
    Ok(())
}

fn render_config(config: &Config, show_secrets: bool) -> Result<String> {
    let mut out = toml::to_string_pretty(config).context("Failed to serialize config")?;

    if show_secrets && let Some(key) = &config.backend.api_key {
        out.push_str(&format!("\n# backend.api_key = \"{}\"\n", key.expose_secret()));
    }
    Ok(out)
}

/// Answers the `link` subcommand turns into a handoff message
#[derive(Debug, Default)]
pub(crate) struct LinkAnswers {
    pub context: String,
    pub timeframe: Option<Timeframe>,
    pub goal: Option<GoalTemplate>,
    pub details: String,
    pub lead_id: Option<String>,
}

pub(crate) fn cmd_link(config: &Config, channel: Channel, answers: &LinkAnswers) -> Result<()> {
    println!("{}", render_link(config, channel, answers)?);
    Ok(())
}

fn render_link(config: &Config, channel: Channel, answers: &LinkAnswers) -> Result<String> {
    let message = build_message(&MessageParts {
        lead_id: answers.lead_id.as_deref(),
        page_context: &answers.context,
        timeframe: answers.timeframe,
        goal: answers.goal,
        extra_details: &answers.details,
    });

    let handoff = resolve_handoff(
        channel,
        &config.clinic.contact,
        &config.clinic.name,
        message,
    )
    .with_context(|| format!("Cannot build {} link", channel.label()))?;

    tracing::debug!(channel = channel.as_str(), "Built handoff link");

    let first = match &handoff.action {
        HandoffAction::Open { url, .. } => url.clone(),
        HandoffAction::PlatformReply => format!(
            "{} will text you from its messaging platform; no link to open.",
            config.clinic.name
        ),
    };
    Ok(format!("{}\n\n{}", first, handoff.message))
}
