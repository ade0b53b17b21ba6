//! CLI Module
//!
//! Command-line interface for leadfunnel using Clap v4.

mod commands;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::funnel::{Channel, GoalTemplate, Timeframe};

/// leadfunnel - guided lead capture for clinics, in the terminal
#[derive(Parser, Debug)]
#[command(name = "leadfunnel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (writes log files to ~/.leadfunnel/logs/)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the funnel in the terminal (default)
    Run {
        /// Procedure or category the visitor came from, e.g. "Dental implants"
        #[arg(long)]
        context: Option<String>,

        /// Preselected category slug
        #[arg(long)]
        category: Option<String>,

        /// Use the in-memory lead service (code is always 123456)
        #[arg(long)]
        demo: bool,

        /// Show the handoff link instead of opening it
        #[arg(long)]
        no_open: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration
    Config {
        /// Show the API key instead of redacting it
        #[arg(short, long)]
        show_secrets: bool,
    },

    /// Print the handoff message and link for a set of answers
    Link {
        /// whatsapp, sms or email
        #[arg(long)]
        channel: Channel,

        #[arg(long, default_value = "")]
        context: String,

        /// asap, within_3_months, within_6_months, within_year, researching
        #[arg(long)]
        timeframe: Option<Timeframe>,

        /// price_quote, treatment_plan, compare_options, ask_question
        #[arg(long)]
        goal: Option<GoalTemplate>,

        #[arg(long, default_value = "")]
        details: String,

        /// Lead reference to include in the message
        #[arg(long)]
        lead_id: Option<String>,
    },
}

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        None => ui::cmd_run(&config, cli.debug, ui::RunOptions::default()).await,
        Some(Commands::Run {
            context,
            category,
            demo,
            no_open,
        }) => {
            let options = ui::RunOptions {
                context,
                category,
                demo,
                no_open,
            };
            ui::cmd_run(&config, cli.debug, options).await
        }
        Some(Commands::Init { force }) => {
            crate::logging::init(&config.logging, cli.debug)?;
            commands::cmd_init(force)
        }
        Some(Commands::Config { show_secrets }) => {
            crate::logging::init(&config.logging, cli.debug)?;
            commands::cmd_config(&config, show_secrets)
        }
        Some(Commands::Link {
            channel,
            context,
            timeframe,
            goal,
            details,
            lead_id,
        }) => {
            crate::logging::init(&config.logging, cli.debug)?;
            let answers = commands::LinkAnswers {
                context,
                timeframe,
                goal,
                details,
                lead_id,
            };
            commands::cmd_link(&config, channel, &answers)
        }
    }
}
