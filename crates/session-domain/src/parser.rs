//! Multi-server connection-string parser.
//!
//! Accepts `scheme://host[:port][?database=N&prefix=STR]` segments separated
//! by commas. Parsing is lenient at the list level: a segment that cannot be
//! read is logged and skipped so the remaining servers stay usable.

use std::collections::BTreeMap;

use url::{Host, Url, form_urlencoded};

use crate::error::ParseError;
use crate::{DEFAULT_DATABASE, DEFAULT_PORT, DEFAULT_PREFIX, ServerEndpoint};

/// Scheme assumed for segments written without one
const FALLBACK_SCHEME: &str = "tcp://";

/// Schemes with a known default port. The URL parser hides an explicit
/// default port for these, so they are read as `tcp://` instead.
const SPECIAL_SCHEMES: &[&str] = &["http", "https", "ws", "wss", "ftp", "file"];

/// Parse every segment of `raw`, dropping the malformed ones.
pub(crate) fn parse_server_list(raw: &str) -> Vec<ServerEndpoint> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| match parse_segment(segment) {
            Ok(endpoint) => Some(endpoint),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed session server entry");
                None
            }
        })
        .collect()
}

/// Parse one server segment into a fully-resolved descriptor.
///
/// # Errors
///
/// Returns [`ParseError`] when the segment is not a URL, has no host, or
/// carries a query pair that cannot be read.
pub fn parse_segment(segment: &str) -> Result<ServerEndpoint, ParseError> {
    let url = parse_url(segment)?;

    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    };
    if host.is_empty() {
        return Err(ParseError::MissingHost {
            segment: segment.to_string(),
        });
    }

    let mut options = parse_query(segment, url.query().unwrap_or_default())?;

    let database = match options.remove("database") {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidDatabase {
                segment: segment.to_string(),
                value,
            })?,
        None => DEFAULT_DATABASE,
    };
    let prefix = options
        .remove("prefix")
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

    Ok(ServerEndpoint {
        host,
        port: url.port().unwrap_or(DEFAULT_PORT),
        database,
        prefix,
        options,
    })
}

/// Read `segment` as a URL, treating a scheme-less segment as a bare host.
fn parse_url(segment: &str) -> Result<Url, ParseError> {
    let invalid = |source| ParseError::InvalidUrl {
        segment: segment.to_string(),
        source,
    };

    match Url::parse(segment) {
        // `h1:111` reads as scheme "h1" with path "111"
        Ok(url) if url.host().is_none() && !segment.contains("://") => {
            Url::parse(&format!("{FALLBACK_SCHEME}{segment}")).map_err(invalid)
        }
        Ok(url) if SPECIAL_SCHEMES.contains(&url.scheme()) => {
            let rest = segment.split_once("://").map_or(segment, |(_, rest)| rest);
            Url::parse(&format!("{FALLBACK_SCHEME}{rest}")).map_err(invalid)
        }
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("{FALLBACK_SCHEME}{segment}")).map_err(invalid)
        }
        Err(e) => Err(invalid(e)),
    }
}

/// Split the query into percent-decoded fields. Every non-empty pair must
/// carry an `=`.
fn parse_query(segment: &str, query: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let mut fields = BTreeMap::new();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        if !pair.contains('=') {
            return Err(ParseError::MalformedQueryPair {
                segment: segment.to_string(),
                pair: pair.to_string(),
            });
        }
        for (key, value) in form_urlencoded::parse(pair.as_bytes()) {
            fields.insert(key.into_owned(), value.into_owned());
        }
    }

    Ok(fields)
}
