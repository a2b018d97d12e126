//! A deliberately thin MPD XML reader for the on-demand profile.
//!
//! MPD parsing is an external collaborator as far as the adaptation
//! core is concerned (see [`crate::model`]), but something has to turn
//! a manifest URL into [`Representation`] values for the CLI to be
//! runnable end to end. This reader only understands the on-demand
//! profile: a flat `BaseURL`, `Period/AdaptationSet/Representation`
//! nesting, and an explicit `SegmentList` of `SegmentURL` elements. It
//! does not understand `SegmentTemplate`, `SegmentTimeline`, live
//! manifests, or multi-period timelines.

use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

use crate::error::MpdError;
use crate::model::Representation;

/// Result of reading a manifest: the representations found, the base
/// URL segment URLs are resolved against, and the period's nominal
/// playback duration in seconds (0.0 if absent).
pub struct ParsedManifest {
    pub representations: Vec<Representation>,
    pub base_url: Url,
    pub playback_duration: f64,
}

/// Parse an on-demand-profile MPD document.
///
/// `manifest_url` anchors a relative `BaseURL` (or stands in for it
/// when the document has none).
pub fn read_mpd_xml(xml: &str, manifest_url: &Url) -> Result<ParsedManifest, MpdError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut base_url = manifest_url.clone();
    let mut playback_duration = 0.0f64;
    let mut representations = Vec::new();

    let mut current: Option<PartialRepresentation> = None;
    let mut in_segment_list = false;
    let mut reading_base_url = false;

    while let Ok(event) = reader.read_event_into(&mut buf) {
        match event {
            Event::Eof => break,
            Event::Start(ref tag) | Event::Empty(ref tag) => {
                let name = tag.name().to_owned();
                let local = local_name(name.as_ref());
                match local {
                    "Period" => {
                        for attr in tag.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"duration" {
                                let value = attr.unescape_value()?;
                                playback_duration = parse_iso8601_duration(&value);
                            }
                        }
                    }
                    "Representation" => {
                        let mut bandwidth = None;
                        for attr in tag.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"bandwidth" {
                                bandwidth = attr.unescape_value()?.parse::<u64>().ok();
                            }
                        }
                        let bandwidth = bandwidth.ok_or_else(|| MpdError::Malformed {
                            reason: "Representation missing bandwidth attribute".to_string(),
                        })?;
                        current = Some(PartialRepresentation::new(bandwidth));
                    }
                    "SegmentList" => {
                        in_segment_list = true;
                        if let Some(rep) = current.as_mut() {
                            for attr in tag.attributes() {
                                let attr = attr?;
                                if attr.key.as_ref() == b"duration" {
                                    let value = attr.unescape_value()?;
                                    rep.segment_duration = value.parse::<f64>().unwrap_or(0.0);
                                }
                            }
                        }
                    }
                    "Initialization" if in_segment_list => {
                        if let Some(rep) = current.as_mut() {
                            for attr in tag.attributes() {
                                let attr = attr?;
                                if attr.key.as_ref() == b"sourceURL" {
                                    rep.initialization_url = attr.unescape_value()?.to_string();
                                }
                            }
                        }
                    }
                    "SegmentURL" if in_segment_list => {
                        if let Some(rep) = current.as_mut() {
                            let mut media = None;
                            let mut size = 0u64;
                            for attr in tag.attributes() {
                                let attr = attr?;
                                match attr.key.as_ref() {
                                    b"media" => media = Some(attr.unescape_value()?.to_string()),
                                    b"mediaRange" => size = parse_range_size(&attr.unescape_value()?),
                                    _ => {}
                                }
                            }
                            if let Some(media) = media {
                                rep.media_urls.push(media);
                                rep.segment_sizes.push(size);
                            }
                        }
                    }
                    "BaseURL" => reading_base_url = true,
                    _ => {}
                }
            }
            Event::Text(text) => {
                if reading_base_url {
                    let value = text.unescape()?;
                    base_url = resolve_base(&base_url, value.trim())?;
                    reading_base_url = false;
                }
            }
            Event::End(ref tag) => {
                let name = tag.name().to_owned();
                match local_name(name.as_ref()) {
                    "SegmentList" => in_segment_list = false,
                    "Representation" => {
                        if let Some(rep) = current.take() {
                            representations.push(rep.finish()?);
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if representations.is_empty() {
        return Err(MpdError::NoRepresentations);
    }

    tracing::debug!(
        representations = representations.len(),
        base_url = %base_url,
        playback_duration,
        "parsed on-demand MPD manifest"
    );

    Ok(ParsedManifest {
        representations,
        base_url,
        playback_duration,
    })
}

struct PartialRepresentation {
    bandwidth: u64,
    initialization_url: String,
    media_urls: Vec<String>,
    segment_sizes: Vec<u64>,
    segment_duration: f64,
}

impl PartialRepresentation {
    fn new(bandwidth: u64) -> Self {
        Self {
            bandwidth,
            initialization_url: String::new(),
            media_urls: Vec::new(),
            segment_sizes: Vec::new(),
            segment_duration: 0.0,
        }
    }

    fn finish(self) -> Result<Representation, MpdError> {
        if self.initialization_url.is_empty() {
            return Err(MpdError::Malformed {
                reason: format!(
                    "representation {} has no Initialization sourceURL",
                    self.bandwidth
                ),
            });
        }
        Ok(Representation {
            bandwidth: self.bandwidth,
            initialization_url: self.initialization_url,
            media_urls: self.media_urls,
            segment_sizes: self.segment_sizes,
            segment_duration: self.segment_duration,
        })
    }
}

fn local_name(qname: &[u8]) -> &str {
    let s = std::str::from_utf8(qname).unwrap_or("");
    s.rsplit(':').next().unwrap_or(s)
}

fn resolve_base(current: &Url, raw: &str) -> Result<Url, MpdError> {
    match Url::parse(raw) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            current.join(raw).map_err(|source| MpdError::InvalidUrl {
                input: raw.to_string(),
                source,
            })
        }
        Err(source) => Err(MpdError::InvalidUrl {
            input: raw.to_string(),
            source,
        }),
    }
}

/// Byte range like `"0-999"` -> size 1000. Malformed ranges report 0.
fn parse_range_size(range: &str) -> u64 {
    let mut parts = range.splitn(2, '-');
    let start = parts.next().and_then(|p| p.parse::<u64>().ok());
    let end = parts.next().and_then(|p| p.parse::<u64>().ok());
    match (start, end) {
        (Some(start), Some(end)) if end >= start => end - start + 1,
        _ => 0,
    }
}

/// Minimal `PTxHxMxS` parser; only the fields this reader actually emits.
fn parse_iso8601_duration(value: &str) -> f64 {
    let value = value.strip_prefix('P').unwrap_or(value);
    let value = value.strip_prefix('T').unwrap_or(value);
    let mut total = 0.0f64;
    let mut number = String::new();
    for ch in value.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
            continue;
        }
        let amount: f64 = number.parse().unwrap_or(0.0);
        number.clear();
        total += match ch {
            'H' => amount * 3600.0,
            'M' => amount * 60.0,
            'S' => amount,
            _ => 0.0,
        };
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
        <MPD>
          <BaseURL>https://cdn.example.com/video/</BaseURL>
          <Period duration="PT12S">
            <AdaptationSet>
              <Representation bandwidth="500000">
                <SegmentList duration="4">
                  <Initialization sourceURL="init-$Bandwidth$.mp4"/>
                  <SegmentURL media="seg-1.m4s" mediaRange="0-999"/>
                  <SegmentURL media="seg-2.m4s" mediaRange="1000-2099"/>
                </SegmentList>
              </Representation>
              <Representation bandwidth="1000000">
                <SegmentList duration="4">
                  <Initialization sourceURL="init-$Bandwidth$.mp4"/>
                  <SegmentURL media="seg-1.m4s" mediaRange="0-1999"/>
                  <SegmentURL media="seg-2.m4s" mediaRange="2000-4099"/>
                </SegmentList>
              </Representation>
            </AdaptationSet>
          </Period>
        </MPD>"#;

    #[test]
    fn reads_on_demand_profile_manifest() {
        let manifest_url = Url::parse("https://cdn.example.com/video/stream.mpd").unwrap();
        let parsed = read_mpd_xml(SAMPLE, &manifest_url).unwrap();

        assert_eq!(parsed.base_url.as_str(), "https://cdn.example.com/video/");
        assert_eq!(parsed.playback_duration, 12.0);
        assert_eq!(parsed.representations.len(), 2);

        let low = parsed
            .representations
            .iter()
            .find(|rep| rep.bandwidth == 500_000)
            .unwrap();
        assert_eq!(low.initialization_url, "init-$Bandwidth$.mp4");
        assert_eq!(low.media_urls, vec!["seg-1.m4s", "seg-2.m4s"]);
        assert_eq!(low.segment_sizes, vec![1000, 1100]);
        assert_eq!(low.segment_duration, 4.0);
    }

    #[test]
    fn rejects_representation_without_initialization() {
        let xml = r#"<MPD><Period><AdaptationSet>
            <Representation bandwidth="1">
              <SegmentList duration="4">
                <SegmentURL media="seg-1.m4s" mediaRange="0-9"/>
              </SegmentList>
            </Representation>
        </AdaptationSet></Period></MPD>"#;
        let manifest_url = Url::parse("https://cdn.example.com/stream.mpd").unwrap();
        let err = read_mpd_xml(xml, &manifest_url).unwrap_err();
        assert!(matches!(err, MpdError::Malformed { .. }));
    }
}
