use std::path::PathBuf;

use dash_abr::PolicyKind;
use dash_transport::TransportKind;
use url::Url;

use crate::jump::JumpScenario;

/// Immutable record of one run's parameters, built once from parsed CLI
/// arguments and threaded through the driver by reference rather than
/// mutated in place.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub manifest_url: Url,
    pub policy: PolicyKind,
    pub transport: TransportKind,
    pub segment_limit: Option<u64>,
    pub download_dir: PathBuf,
    pub keep_downloads: bool,
    pub jump_scenario: Option<JumpScenario>,
    pub report_path: Option<PathBuf>,
}
