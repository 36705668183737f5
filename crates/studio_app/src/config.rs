use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use studio_core::{OriginConfig, QueryParams, SessionConfig};
use studio_engine::{ClientSettings, OriginPool};
use url::Url;

use crate::cli::{Cli, RunArgs};
use crate::persistence::resolve_access_key;

/// Everything a session needs, resolved once at startup.
#[derive(Debug)]
pub struct StudioConfig {
    pub params: QueryParams,
    pub origins: Arc<OriginPool>,
    pub access_key: Option<String>,
    pub client: ClientSettings,
    pub session: SessionConfig,
    pub download_dir: Option<PathBuf>,
}

impl StudioConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let run = match &cli.command {
            crate::cli::Command::Run(run) => Some(run),
            crate::cli::Command::Health => None,
        };
        let page = page_with_overrides(
            &cli.page_url,
            &[
                ("api", cli.api.as_deref()),
                ("key", cli.key.as_deref()),
                ("tool", run.and_then(|run| run.tool.as_deref())),
            ],
        )?;
        let params = QueryParams::from_page(&page);

        let mut origin_config = OriginConfig::default();
        if let Some(backup) = &cli.backup_origin {
            origin_config.backup_origin = backup.clone();
        }
        let origins = Arc::new(OriginPool::from_page(&page, &origin_config));
        let access_key = resolve_access_key(&cli.state_dir, params.key.as_deref());

        Ok(Self {
            params,
            origins,
            access_key,
            client: client_settings(run),
            session: session_config(run),
            download_dir: run.and_then(|run| run.download_dir.clone()),
        })
    }
}

/// Parses the page URL and sets the given query parameters, replacing any
/// existing values of the same name.
pub fn page_with_overrides(raw: &str, overrides: &[(&str, Option<&str>)]) -> Result<Url> {
    let mut page = Url::parse(raw).with_context(|| format!("invalid page url {raw:?}"))?;
    let active: Vec<(&str, &str)> = overrides
        .iter()
        .filter_map(|(name, value)| value.map(|value| (*name, value)))
        .collect();
    if active.is_empty() {
        return Ok(page);
    }

    let kept: Vec<(String, String)> = page
        .query_pairs()
        .filter(|(name, _)| !active.iter().any(|(overridden, _)| name == overridden))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    {
        let mut query = page.query_pairs_mut();
        query.clear();
        for (name, value) in &kept {
            query.append_pair(name, value);
        }
        for (name, value) in &active {
            query.append_pair(name, value);
        }
    }
    Ok(page)
}

fn client_settings(run: Option<&RunArgs>) -> ClientSettings {
    ClientSettings {
        request_timeout: run
            .and_then(|run| run.request_timeout_secs)
            .map(Duration::from_secs),
        ..ClientSettings::default()
    }
}

fn session_config(run: Option<&RunArgs>) -> SessionConfig {
    match run {
        Some(run) => SessionConfig {
            poll_interval: Duration::from_millis(run.poll_interval_ms),
            max_not_ready_polls: run.max_not_ready_polls,
        },
        None => SessionConfig::default(),
    }
}
