//! Turns `--QUIC`/`--CURL`/`--HOST`/`--helper-bin` into a [`TransportKind`].

use dash_transport::{HelperKind, TransportKind};

use crate::cli::Args;

/// Default helper binary names, matching the original client's
/// process-name identification (`quic_client`, `LibCurlCppConsole`).
const DEFAULT_QUIC_BINARY: &str = "quic_client";
const DEFAULT_CURL_BINARY: &str = "LibCurlCppConsole";

pub fn from_args(args: &Args) -> TransportKind {
    if args.quic {
        TransportKind::Helper {
            kind: HelperKind::Quic,
            binary: args
                .helper_bin
                .clone()
                .unwrap_or_else(|| DEFAULT_QUIC_BINARY.to_string()),
            args: Vec::new(),
            host: args.host.clone(),
        }
    } else if args.curl {
        TransportKind::Helper {
            kind: HelperKind::Curl,
            binary: args
                .helper_bin
                .clone()
                .unwrap_or_else(|| DEFAULT_CURL_BINARY.to_string()),
            args: Vec::new(),
            host: None,
        }
    } else {
        TransportKind::Http
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["dash-client", "--MPD", "https://cdn.example.com/s.mpd"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_to_builtin_http() {
        let args = parse(&[]);
        assert!(matches!(from_args(&args), TransportKind::Http));
    }

    #[test]
    fn quic_flag_selects_quic_helper_with_default_binary() {
        let args = parse(&["--QUIC", "--HOST", "origin.example.com"]);
        match from_args(&args) {
            TransportKind::Helper { kind, binary, host, .. } => {
                assert_eq!(kind, HelperKind::Quic);
                assert_eq!(binary, DEFAULT_QUIC_BINARY);
                assert_eq!(host.as_deref(), Some("origin.example.com"));
            }
            TransportKind::Http => panic!("expected helper transport"),
        }
    }

    #[test]
    fn curl_flag_selects_curl_helper_with_default_binary() {
        let args = parse(&["--CURL"]);
        match from_args(&args) {
            TransportKind::Helper { kind, binary, .. } => {
                assert_eq!(kind, HelperKind::Curl);
                assert_eq!(binary, DEFAULT_CURL_BINARY);
            }
            TransportKind::Http => panic!("expected helper transport"),
        }
    }
}
