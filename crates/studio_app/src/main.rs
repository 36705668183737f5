use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::LevelFilter;
use studio_app::cli::{Cli, Command, RunArgs};
use studio_app::downloads::download_artifacts;
use studio_app::logging;
use studio_app::{Session, StudioConfig, TerminalRenderer};
use studio_core::{Payload, StatusState};
use studio_engine::{JobApi, ReqwestJobApi};
use studio_logging::{studio_error, studio_info, ORIGIN_TARGET};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            studio_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = StudioConfig::from_cli(cli)?;
    studio_info!(
        target: ORIGIN_TARGET,
        "Primary origin {} (backup {})",
        config.origins.primary(),
        config.origins.backup().unwrap_or("none")
    );
    let api = Arc::new(
        ReqwestJobApi::new(
            config.client.clone(),
            Arc::clone(&config.origins),
            config.access_key.clone(),
        )
        .map_err(|err| anyhow!("building HTTP client: {err}"))?,
    );

    match &cli.command {
        Command::Run(args) => run_job(&config, api, args),
        Command::Health => check_health(&api),
    }
}

fn run_job(config: &StudioConfig, api: Arc<ReqwestJobApi>, args: &RunArgs) -> Result<ExitCode> {
    let tool = config
        .params
        .tool
        .clone()
        .context("no tool selected; pass --tool or add ?tool= to the page url")?;
    let payload: Payload = args.fields.iter().cloned().collect();

    let job_api: Arc<dyn JobApi> = api.clone();
    let mut session = Session::new(
        job_api,
        Arc::clone(&config.origins),
        config.session.clone(),
        TerminalRenderer::new(io::stdout()),
    );
    session.select_tool(tool.clone());
    let view = session.run_job(tool, payload)?;

    if let Some(dir) = &config.download_dir {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("starting download runtime")?;
        let saved = runtime.block_on(download_artifacts(&api, &view, dir))?;
        for path in saved {
            println!("saved {}", path.display());
        }
    }

    Ok(if view.status == StatusState::Succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check_health(api: &ReqwestJobApi) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    let reply = runtime
        .block_on(api.health())
        .map_err(|err| anyhow!("health check failed: {err}"))?;

    println!(
        "{} HTTP {} via {}",
        if reply.is_success() { "ok" } else { "unhealthy" },
        reply.status,
        api.origins().active()
    );
    let body = String::from_utf8_lossy(&reply.body);
    if !body.trim().is_empty() {
        println!("{}", body.trim());
    }
    Ok(if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
