//! `dash-client` — CLI entry point: argument parsing, logging init, MPD
//! retrieval, and wiring of the transport multiplexer / adaptation engine /
//! pipeline driver described by the core crates.

mod all_mode;
mod cli;
mod logging;
mod manifest_loader;
mod transport_select;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dash_mpd::MpdModel;
use dash_pipeline::{JumpScenario, PipelineDriver, RunConfig};
use tracing::{error, info};

use crate::cli::{Args, Playback};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let http_client = reqwest::Client::new();
    let (parsed, manifest_url) = manifest_loader::load(&http_client, &args.mpd).await?;

    // Segment numbers start at 1: slot 1 is every representation's
    // initialization segment, media segments follow contiguously.
    const INDEX_START: u64 = 1;
    let model = MpdModel::new(
        parsed.representations,
        &parsed.base_url,
        INDEX_START,
        parsed.playback_duration,
    )
    .context("building segment index from parsed MPD")?;

    if args.list {
        print_representations(&model);
        return Ok(());
    }

    let transport = transport_select::from_args(&args);

    if args.playback == Playback::All {
        info!("starting parallel download-only playback across all representations");
        let totals = all_mode::run(&model, transport, &args.download_dir).await?;
        if !args.download {
            let _ = std::fs::remove_dir_all(&args.download_dir);
        }
        for (bitrate, total_bytes) in totals {
            info!(bitrate, total_bytes, "representation download complete");
        }
        return Ok(());
    }

    let policy = args
        .playback
        .as_policy_kind()
        .expect("All is handled above; Basic/Sara/Netflix always map to a PolicyKind");

    let jump_scenario = if args.jump {
        let raw = args
            .jump_scenario
            .as_deref()
            .context("--JUMP requires --JUMP_SCENARIO")?;
        Some(JumpScenario::parse(raw)?)
    } else {
        None
    };

    let config = RunConfig {
        manifest_url,
        policy,
        transport,
        segment_limit: args.segment_limit,
        download_dir: args.download_dir,
        keep_downloads: args.download,
        jump_scenario,
        report_path: args.report,
    };

    let driver = PipelineDriver::new(config, model).await?;
    let cancel = driver.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C, winding the run down");
            cancel.cancel();
        }
    });

    let report = driver.run().await?;
    info!(
        segments = report.segments.len(),
        up_shifts = report.up_shifts,
        down_shifts = report.down_shifts,
        "run complete"
    );

    Ok(())
}

fn print_representations(model: &MpdModel) {
    println!("Available bitrates (bits/sec):");
    for bitrate in model.bitrates_sorted_asc() {
        println!("  {bitrate}");
    }
}
