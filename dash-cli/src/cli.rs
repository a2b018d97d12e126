use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Adaptive-bitrate client for HTTP Adaptive Streaming over MPEG-DASH.
///
/// Drives one playback run end to end: fetches the MPD, then repeatedly
/// picks a representation for the next segment, fetches it through the
/// selected transport, and feeds it to the playback buffer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// URL (http/https) or local path of the MPD manifest.
    #[arg(long = "MPD", value_name = "URL")]
    pub mpd: String,

    /// List the manifest's available bitrates and exit without playback.
    #[arg(long = "LIST")]
    pub list: bool,

    /// Adaptation policy that drives bitrate selection.
    #[arg(long = "PLAYBACK", value_enum, default_value_t = Playback::Basic)]
    pub playback: Playback,

    /// Cap the number of segments fetched.
    #[arg(long = "SEGMENT_LIMIT", value_name = "N")]
    pub segment_limit: Option<u64>,

    /// Keep downloaded segments after the run (default: delete the run directory on exit).
    #[arg(long = "DOWNLOAD")]
    pub download: bool,

    /// Fetch segments through the QUIC helper-process transport.
    #[arg(long = "QUIC", conflicts_with = "curl")]
    pub quic: bool,

    /// Fetch segments through the generic HTTP helper-process transport.
    #[arg(long = "CURL", conflicts_with = "quic")]
    pub curl: bool,

    /// Origin authority the QUIC helper should address directly, preserving
    /// the original host for the server-side cache. Required with --QUIC.
    #[arg(long = "HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Enable the seek schedule given by --JUMP_SCENARIO.
    #[arg(long = "JUMP")]
    pub jump: bool,

    /// A comma-separated `at_seconds->to_seconds` seek schedule, ordered by
    /// `at_seconds`, e.g. `40->10,90->120`.
    #[arg(long = "JUMP_SCENARIO", value_name = "SCENARIO")]
    pub jump_scenario: Option<String>,

    /// Path to the helper binary for --QUIC/--CURL. Defaults to
    /// `quic_client` or `LibCurlCppConsole` respectively.
    #[arg(long, value_name = "PATH")]
    pub helper_bin: Option<String>,

    /// Directory downloaded segments are written under.
    #[arg(long, value_name = "DIR", default_value = "dash_run")]
    pub download_dir: PathBuf,

    /// Write the per-run JSON report to this path, updated after every segment.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Verbose (debug-level) logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Mirrors spec `--PLAYBACK {basic|sara|netflix|all}`. `All` is not one of
/// the three ABR policies: it selects the parallel, download-only fan-out
/// that lives outside the adaptation/playback core (see `all_mode`).
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "lowercase")]
pub enum Playback {
    Basic,
    Sara,
    Netflix,
    All,
}

impl Playback {
    pub fn as_policy_kind(self) -> Option<dash_abr::PolicyKind> {
        match self {
            Playback::Basic => Some(dash_abr::PolicyKind::Basic),
            Playback::Sara => Some(dash_abr::PolicyKind::Sara),
            Playback::Netflix => Some(dash_abr::PolicyKind::Netflix),
            Playback::All => None,
        }
    }
}
