//! Interactive funnel command.

use std::sync::Arc;

use anyhow::Result;

use crate::backend::{HttpBackend, InMemoryBackend, LeadBackend};
use crate::config::Config;
use crate::funnel::{
    FunnelSeed, HandoffAction, LeadFunnel, Navigator, RecordingNavigator, SystemNavigator,
};
use crate::geo::GeoHint;
use crate::tui::{self, FunnelApp};

/// Code the in-memory lead service accepts in demo mode
const DEMO_CODE: &str = "123456";

/// Flags of `leadfunnel run`
#[derive(Debug, Default)]
pub(crate) struct RunOptions {
    pub context: Option<String>,
    pub category: Option<String>,
    pub demo: bool,
    pub no_open: bool,
}

/// Run the funnel TUI until the visitor finishes or quits
pub(crate) async fn cmd_run(config: &Config, debug: bool, options: RunOptions) -> Result<()> {
    // Logs go to files only; stderr belongs to the terminal UI
    let _log_guard = crate::logging::init_tui(&config.logging, debug)?;

    let backend: Arc<dyn LeadBackend> = if options.demo {
        tracing::info!("Running with the in-memory lead service");
        Arc::new(InMemoryBackend::new().with_fixed_code(DEMO_CODE))
    } else {
        Arc::new(HttpBackend::from_config(&config.backend)?)
    };

    let navigator = navigator(options.no_open);
    let geo = GeoHint::detect(config.funnel.country_override.as_deref());

    let mut seed = FunnelSeed::new(options.context.unwrap_or_default());
    if let Some(slug) = options.category {
        seed = seed.with_category(slug);
    }

    let funnel = Arc::new(LeadFunnel::new(
        seed,
        geo,
        backend,
        config.clinic.clone(),
        navigator,
    ));

    let mut app = FunnelApp::new(
        Arc::clone(&funnel),
        &config.funnel.default_country,
        config.funnel.resend_cooldown_secs,
    );
    if options.demo {
        app = app.with_demo_code(DEMO_CODE);
    }

    tui::run(app).await?;

    let state = funnel.state();
    if state.is_completed()
        && let Some(handoff) = state.handoff
    {
        match handoff.action {
            HandoffAction::Open { url, .. } => println!("{}", url),
            HandoffAction::PlatformReply => println!(
                "{} will text you shortly from its messaging platform.",
                config.clinic.name
            ),
        }
    }

    Ok(())
}

fn navigator(no_open: bool) -> Arc<dyn Navigator> {
    if no_open {
        return Arc::new(RecordingNavigator::new());
    }
    match SystemNavigator::detect() {
        Ok(navigator) => Arc::new(navigator),
        Err(e) => {
            tracing::warn!("No URL opener found, links will only be printed: {}", e);
            Arc::new(RecordingNavigator::new())
        }
    }
}
