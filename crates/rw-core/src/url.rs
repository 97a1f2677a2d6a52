//! Host resolution for request URLs.
//!
//! Bundles are gated on the request host. Callers that already know the host
//! pass it through; otherwise it is derived here, once per request.

use ::url::{ParseError, Url};

use crate::error::RewriteError;

/// Derive the lowercased host of `url`.
///
/// An explicit non-default port stays part of the host (`example.com:8080`),
/// so a bare-host target does not cover it. A URL without a host (`mailto:`,
/// or a relative reference such as `/path`) resolves to the empty string,
/// which no target matches.
pub fn resolve_host(url: &str) -> Result<String, RewriteError> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(ParseError::RelativeUrlWithoutBase) => return Ok(String::new()),
        Err(source) => {
            return Err(RewriteError::InvalidUrl {
                url: url.to_string(),
                source,
            })
        }
    };

    let host = match parsed.host_str() {
        Some(host) => host.to_ascii_lowercase(),
        None => return Ok(String::new()),
    };

    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Use `host` when the caller supplied one, otherwise derive it from `url`.
pub(crate) fn host_or_resolve(url: &str, host: Option<&str>) -> Result<String, RewriteError> {
    match host {
        Some(host) if !host.is_empty() => Ok(host.to_ascii_lowercase()),
        _ => resolve_host(url),
    }
}
