// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses and validates the WebSocket connect URL the injected client script
//! opens: `/?elmWatchVersion=X.Y.Z&targetName=...&elmCompiledTimestamp=...`

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectUrl {
    pub elm_watch_version: String,
    pub target_name: String,
    pub compiled_timestamp: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectUrlError {
    #[error("missing query string")]
    MissingQuery,
    #[error("missing required parameter: {name}")]
    MissingParameter { name: &'static str },
    #[error("elmCompiledTimestamp is not a valid number: {value}")]
    InvalidTimestamp { value: String },
}

/// Parses the path+query portion of an HTTP upgrade request, e.g.
/// `/?elmWatchVersion=1.0.0&targetName=main&elmCompiledTimestamp=123`.
pub fn parse(path_and_query: &str) -> Result<ConnectUrl, ConnectUrlError> {
    let query = path_and_query
        .split_once('?')
        .map(|(_, q)| q)
        .ok_or(ConnectUrlError::MissingQuery)?;

    let mut elm_watch_version = None;
    let mut target_name = None;
    let mut compiled_timestamp = None;

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else { continue };
        let value = percent_decode(value);
        match key {
            "elmWatchVersion" => elm_watch_version = Some(value),
            "targetName" => target_name = Some(value),
            "elmCompiledTimestamp" => compiled_timestamp = Some(value),
            _ => {}
        }
    }

    let elm_watch_version =
        elm_watch_version.ok_or(ConnectUrlError::MissingParameter { name: "elmWatchVersion" })?;
    let target_name =
        target_name.ok_or(ConnectUrlError::MissingParameter { name: "targetName" })?;
    let compiled_timestamp_raw = compiled_timestamp
        .ok_or(ConnectUrlError::MissingParameter { name: "elmCompiledTimestamp" })?;
    let compiled_timestamp = compiled_timestamp_raw
        .parse::<u64>()
        .map_err(|_| ConnectUrlError::InvalidTimestamp { value: compiled_timestamp_raw })?;

    Ok(ConnectUrl { elm_watch_version, target_name, compiled_timestamp })
}

/// Minimal percent-decoding; connect URLs only ever carry ASCII identifiers
/// and digits, so a full UTF-8-aware decoder isn't needed here.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        if bytes[i] == b'+' {
            out.push(b' ');
        } else {
            out.push(bytes[i]);
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_connect_url() {
        let result =
            parse("/?elmWatchVersion=1.0.0&targetName=main&elmCompiledTimestamp=1234").unwrap();
        assert_eq!(
            result,
            ConnectUrl {
                elm_watch_version: "1.0.0".to_string(),
                target_name: "main".to_string(),
                compiled_timestamp: 1234,
            }
        );
    }

    #[test]
    fn percent_encoded_target_names_decode() {
        let result =
            parse("/?elmWatchVersion=1.0.0&targetName=my%20app&elmCompiledTimestamp=0").unwrap();
        assert_eq!(result.target_name, "my app");
    }

    #[test]
    fn missing_parameter_is_reported_by_name() {
        let err = parse("/?elmWatchVersion=1.0.0&elmCompiledTimestamp=0").unwrap_err();
        assert_eq!(err, ConnectUrlError::MissingParameter { name: "targetName" });
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let err =
            parse("/?elmWatchVersion=1.0.0&targetName=main&elmCompiledTimestamp=abc").unwrap_err();
        assert_eq!(err, ConnectUrlError::InvalidTimestamp { value: "abc".to_string() });
    }
}
