//! OKX request signing
//!
//! Every aggregator call carries four authentication headers. The signature
//! is `Base64(HMAC-SHA256(secret, timestamp + METHOD + path + "?" + query))`
//! where `query` is the exact string appended to the request URL. POST
//! requests sign the body in place of the query.

use crate::config::ApiCredentials;
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header names
pub mod headers {
    pub const ACCESS_KEY: &str = "OK-ACCESS-KEY";
    pub const ACCESS_SIGN: &str = "OK-ACCESS-SIGN";
    pub const ACCESS_TIMESTAMP: &str = "OK-ACCESS-TIMESTAMP";
    pub const ACCESS_PASSPHRASE: &str = "OK-ACCESS-PASSPHRASE";
    pub const ACCESS_PROJECT: &str = "OK-ACCESS-PROJECT";
    pub const CONTENT_TYPE: &str = "Content-Type";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Everything that went into one signature
///
/// Built fresh for every request; never reused across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequestContext {
    pub timestamp: String,
    pub method: HttpMethod,
    pub path: String,
    pub query_string: String,
    pub signature: String,
}

impl SignedRequestContext {
    /// Authentication headers for this request
    pub fn headers(&self, credentials: &ApiCredentials) -> Vec<(&'static str, String)> {
        vec![
            (headers::ACCESS_KEY, credentials.api_key().to_string()),
            (headers::ACCESS_SIGN, self.signature.clone()),
            (headers::ACCESS_TIMESTAMP, self.timestamp.clone()),
            (headers::ACCESS_PASSPHRASE, credentials.passphrase().to_string()),
            (headers::ACCESS_PROJECT, credentials.project_id().to_string()),
            (headers::CONTENT_TYPE, "application/json".to_string()),
        ]
    }
}

/// ISO-8601 UTC timestamp with millisecond precision
pub fn timestamp_now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// URL-encode query parameters sorted by key
///
/// The result is used verbatim both in the signature and on the wire.
pub fn encode_query(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in sorted {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// The string that gets signed
pub fn prehash(
    timestamp: &str,
    method: HttpMethod,
    path: &str,
    query_string: &str,
    body: Option<&str>,
) -> String {
    match (method, body) {
        (HttpMethod::Post, Some(body)) => {
            format!("{}{}{}{}", timestamp, method.as_str(), path, body)
        }
        _ if query_string.is_empty() => format!("{}{}{}", timestamp, method.as_str(), path),
        _ => format!(
            "{}{}{}?{}",
            timestamp,
            method.as_str(),
            path,
            query_string
        ),
    }
}

fn hmac_sha256_base64(secret: &str, message: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::InvalidInput(format!("Invalid HMAC key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Sign a request with the current time
pub fn sign_request(
    credentials: &ApiCredentials,
    method: HttpMethod,
    path: &str,
    query_string: &str,
    body: Option<&str>,
) -> Result<SignedRequestContext> {
    sign_with_timestamp(
        credentials,
        &timestamp_now(),
        method,
        path,
        query_string,
        body,
    )
}

/// Sign a request with a caller-provided timestamp (deterministic)
pub fn sign_with_timestamp(
    credentials: &ApiCredentials,
    timestamp: &str,
    method: HttpMethod,
    path: &str,
    query_string: &str,
    body: Option<&str>,
) -> Result<SignedRequestContext> {
    let message = prehash(timestamp, method, path, query_string, body);
    let signature = hmac_sha256_base64(credentials.secret_key(), &message)?;

    Ok(SignedRequestContext {
        timestamp: timestamp.to_string(),
        method,
        path: path.to_string(),
        query_string: query_string.to_string(),
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(secret: &str) -> ApiCredentials {
        ApiCredentials::new("key", secret, "pass", "project").unwrap()
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        let encoded = hmac_sha256_base64("Jefe", "what do ya want for nothing?").unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        let expected: [u8; 32] = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
            0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
            0x64, 0xec, 0x38, 0x43,
        ];
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let creds = credentials("secret");
        let ts = "2024-01-01T00:00:00.000Z";
        let a = sign_with_timestamp(&creds, ts, HttpMethod::Get, "/api/v5/dex/aggregator/quote", "amount=1", None)
            .unwrap();
        let b = sign_with_timestamp(&creds, ts, HttpMethod::Get, "/api/v5/dex/aggregator/quote", "amount=1", None)
            .unwrap();
        assert_eq!(a, b);

        let later = sign_with_timestamp(
            &creds,
            "2024-01-01T00:00:00.001Z",
            HttpMethod::Get,
            "/api/v5/dex/aggregator/quote",
            "amount=1",
            None,
        )
        .unwrap();
        assert_ne!(a.signature, later.signature);

        let other_secret = sign_with_timestamp(
            &credentials("other"),
            ts,
            HttpMethod::Get,
            "/api/v5/dex/aggregator/quote",
            "amount=1",
            None,
        )
        .unwrap();
        assert_ne!(a.signature, other_secret.signature);
    }

    #[test]
    fn test_signature_matches_prehash() {
        let creds = credentials("secret");
        let ctx = sign_with_timestamp(
            &creds,
            "2024-01-01T00:00:00.000Z",
            HttpMethod::Get,
            "/api/v5/dex/aggregator/quote",
            "amount=1&chainId=501",
            None,
        )
        .unwrap();
        let expected = hmac_sha256_base64(
            "secret",
            "2024-01-01T00:00:00.000ZGET/api/v5/dex/aggregator/quote?amount=1&chainId=501",
        )
        .unwrap();
        assert_eq!(ctx.signature, expected);
        assert_eq!(STANDARD.decode(&ctx.signature).unwrap().len(), 32);
    }

    #[test]
    fn test_prehash_variants() {
        assert_eq!(
            prehash("T", HttpMethod::Get, "/p", "", None),
            "TGET/p"
        );
        assert_eq!(
            prehash("T", HttpMethod::Get, "/p", "a=1", None),
            "TGET/p?a=1"
        );
        assert_eq!(
            prehash("T", HttpMethod::Post, "/p", "", Some("{\"a\":1}")),
            "TPOST/p{\"a\":1}"
        );
    }

    #[test]
    fn test_encode_query_sorts_and_escapes() {
        let query = encode_query(&[
            ("toTokenAddress", "B".to_string()),
            ("amount", "100".to_string()),
            ("chainId", "501".to_string()),
            ("note", "a b&c".to_string()),
        ]);
        assert_eq!(query, "amount=100&chainId=501&note=a+b%26c&toTokenAddress=B");
        assert_eq!(encode_query(&[]), "");
    }

    #[test]
    fn test_headers() {
        let creds = credentials("secret");
        let ctx = sign_with_timestamp(&creds, "T", HttpMethod::Get, "/p", "", None).unwrap();
        let hdrs = ctx.headers(&creds);
        let get = |name: &str| {
            hdrs.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get(headers::ACCESS_KEY), "key");
        assert_eq!(get(headers::ACCESS_PASSPHRASE), "pass");
        assert_eq!(get(headers::ACCESS_PROJECT), "project");
        assert_eq!(get(headers::ACCESS_TIMESTAMP), "T");
        assert_eq!(get(headers::ACCESS_SIGN), ctx.signature);
        assert_eq!(get(headers::CONTENT_TYPE), "application/json");
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
