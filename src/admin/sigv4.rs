//! AWS Signature Version 4 request signing for the admin API.
//!
//! Signing is a pure function of the request parts, the credentials, and a
//! timestamp, so it can be checked against published vectors:
//!
//! ```text
//! CanonicalRequest = METHOD \n URI \n QUERY \n HEADERS \n\n SIGNED \n PAYLOAD_HASH
//! StringToSign     = AWS4-HMAC-SHA256 \n TIMESTAMP \n SCOPE \n hex(sha256(CanonicalRequest))
//! Signature        = hex(hmac(SigningKey, StringToSign))
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};

use crate::core::errors::{Result, VgwError};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name used in the credential scope.
pub const SERVICE: &str = "s3";

/// Unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through, everything else is encoded.
pub const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

type HmacSha256 = Hmac<Sha256>;

/// Long-lived admin key pair plus the region it signs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    pub access: String,
    pub secret: String,
    pub region: String,
}

/// Request parts covered by the signature.
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    pub method: &'a str,
    /// Path as sent on the wire, e.g. `/photos`.
    pub path: &'a str,
    /// Already-encoded query string without the leading `?`.
    pub query: &'a str,
    /// `Host` header value (includes a non-default port).
    pub host: &'a str,
    pub payload_hash: &'a str,
}

/// Headers to attach to the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
}

/// Sign `parts` at `now` with `credentials`.
///
/// Signed headers are `host`, `x-amz-content-sha256`, and `x-amz-date`.
pub fn sign(
    parts: &RequestParts<'_>,
    credentials: &SigningCredentials,
    now: DateTime<Utc>,
) -> Result<SignedRequest> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let headers = [
        ("host", parts.host),
        ("x-amz-content-sha256", parts.payload_hash),
        ("x-amz-date", amz_date.as_str()),
    ];
    let signed_headers = ["host", "x-amz-content-sha256", "x-amz-date"];

    let canonical = build_canonical_request(
        parts.method,
        parts.path,
        parts.query,
        &headers,
        &signed_headers,
        parts.payload_hash,
    );
    let scope = format!("{date}/{}/{SERVICE}/aws4_request", credentials.region);
    let string_to_sign = build_string_to_sign(&amz_date, &scope, &hash_payload(canonical.as_bytes()));
    let key = derive_signing_key(&credentials.secret, &date, &credentials.region, SERVICE)?;
    let signature = compute_signature(&key, &string_to_sign)?;

    Ok(SignedRequest {
        authorization: format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
            credentials.access,
            build_signed_headers_string(&signed_headers),
        ),
        amz_date,
        content_sha256: parts.payload_hash.to_string(),
    })
}

#[must_use]
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    query_string: &str,
    headers: &[(&str, &str)],
    signed_headers: &[&str],
    payload_hash: &str,
) -> String {
    let canonical_uri = build_canonical_uri(uri);
    let canonical_query = build_canonical_query_string(query_string);
    let canonical_headers = build_canonical_headers(headers, signed_headers);
    let signed = build_signed_headers_string(signed_headers);
    format!("{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed}\n{payload_hash}")
}

/// Encode each path segment; `/` separators are kept and an empty path becomes `/`.
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Sort `k=v` pairs. A bare key (`?policy`) canonicalizes to `policy=`.
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], signed_headers: &[&str]) -> String {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        map.entry(name.to_lowercase())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .filter_map(|name| map.get(*name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted.join(";")
}

#[must_use]
pub fn build_string_to_sign(timestamp: &str, scope: &str, canonical_request_hash: &str) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{scope}\n{canonical_request_hash}")
}

/// `HMAC("AWS4"+secret, date) -> region -> service -> "aws4_request"`
pub fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let date_key = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let region_key = hmac_sha256(&date_key, region.as_bytes())?;
    let service_key = hmac_sha256(&region_key, service.as_bytes())?;
    hmac_sha256(&service_key, b"aws4_request")
}

pub fn compute_signature(signing_key: &[u8], data: &str) -> Result<String> {
    Ok(hex::encode(hmac_sha256(signing_key, data.as_bytes())?))
}

/// Hex SHA-256, the `x-amz-content-sha256` value.
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|error| VgwError::Transport {
        details: format!("request signing failed: {error}"),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
