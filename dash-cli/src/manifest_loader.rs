//! Turns the `--MPD` argument into parsed representations.
//!
//! MPD retrieval/parsing is an external collaborator as far as the
//! adaptation core is concerned (spec `# 1`); this module is that
//! collaborator's concrete instance for the CLI, built on `dash_mpd`'s
//! on-demand-profile XML reader.

use anyhow::{Context, Result};
use dash_mpd::manifest::ParsedManifest;
use tracing::info;
use url::Url;

/// Fetch and parse the manifest at `mpd_arg`, which may be an `http(s)://`
/// URL or a local filesystem path. Returns the parsed manifest alongside
/// the manifest's own resolved location (distinct from `ParsedManifest`'s
/// `base_url`, which segment URLs are resolved against).
pub async fn load(client: &reqwest::Client, mpd_arg: &str) -> Result<(ParsedManifest, Url)> {
    let (xml, manifest_url) = if mpd_arg.starts_with("http://") || mpd_arg.starts_with("https://") {
        let url = Url::parse(mpd_arg).with_context(|| format!("invalid MPD URL `{mpd_arg}`"))?;
        info!(%url, "downloading MPD manifest");
        let response = client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("fetching MPD manifest `{url}`"))?
            .error_for_status()
            .with_context(|| format!("MPD manifest `{url}` returned an error status"))?;
        let xml = response.text().await.context("reading MPD manifest body")?;
        (xml, url)
    } else {
        let path = std::fs::canonicalize(mpd_arg)
            .with_context(|| format!("MPD path `{mpd_arg}` does not exist"))?;
        info!(path = %path.display(), "reading local MPD manifest");
        let xml = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading MPD file `{}`", path.display()))?;
        let url = Url::from_file_path(&path)
            .map_err(|()| anyhow::anyhow!("MPD path `{}` is not a valid file URL", path.display()))?;
        (xml, url)
    };

    let parsed = dash_mpd::manifest::read_mpd_xml(&xml, &manifest_url)
        .with_context(|| format!("parsing MPD manifest `{manifest_url}`"))?;
    Ok((parsed, manifest_url))
}
