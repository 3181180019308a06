use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config;
use crate::data::{self, ItemSource};
use crate::hackernews::{self, Category};
use crate::logging;
use crate::ui;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Browse the bundled offline data instead of the live API.
    pub demo: bool,
    /// Overrides `feed.default_category`.
    pub category: Option<Category>,
}

pub fn run(options: RunOptions) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    if let Err(err) = logging::init(&cfg.log) {
        eprintln!("warning: logging disabled: {err:?}");
    }

    let source: Arc<dyn ItemSource> = if options.demo {
        Arc::new(data::demo_source())
    } else {
        let client = hackernews::Client::new(hackernews::ClientConfig {
            user_agent: cfg.api.user_agent.clone(),
            base_url: cfg.api.base_url.clone(),
            search_url: cfg.api.search_url.clone(),
            timeout: cfg.api.timeout,
            http_client: None,
        })
        .context("build hackernews client")?;
        Arc::new(client)
    };

    let category = options.category.unwrap_or(cfg.feed.default_category);
    info!(demo = options.demo, category = ?category, "starting clonernews");

    let status_message = if options.demo {
        "Offline demo data.".to_string()
    } else {
        format!("Config: {}", friendly_path(config::default_path().as_ref()))
    };

    let mut model = ui::Model::new(ui::Options {
        source,
        config: cfg,
        category,
        status_message,
    });
    model.run()
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/clonernews/config.yaml".to_string()
    }
}
