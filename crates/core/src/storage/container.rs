//! Blob container management over the Blob service REST API.
//!
//! OpenDAL exposes objects only, so creating the target container is a single
//! signed `PUT {endpoint}/{container}?restype=container` request.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderValue};
use reqwest::{Request, StatusCode, Url};
use sha2::Sha256;
use tracing::{debug, info};

use super::config::BlobConnection;
use super::error::StorageError;

/// Blob service API version sent with every request.
pub const API_VERSION: &str = "2021-08-06";

/// Standard headers, in the order their values appear in the string-to-sign.
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

type HmacSha256 = Hmac<Sha256>;

/// Client for container-level operations on one storage account.
#[derive(Debug, Clone)]
pub struct ContainerClient {
    http: reqwest::Client,
    connection: BlobConnection,
}

impl ContainerClient {
    /// Create a client for `connection`.
    #[must_use]
    pub fn new(connection: BlobConnection) -> Self {
        Self {
            http: reqwest::Client::new(),
            connection,
        }
    }

    /// Create the container unless it already exists.
    ///
    /// Returns `true` when the container was created by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the service answers
    /// with anything other than `201 Created` or `409 Conflict`.
    pub async fn create_if_not_exists(&self) -> Result<bool, StorageError> {
        let request = self.create_request(Utc::now())?;
        let response = self.http.execute(request).await?;

        match response.status() {
            StatusCode::CREATED => {
                info!(container = %self.connection.container, "Created blob container");
                Ok(true)
            }
            StatusCode::CONFLICT => {
                debug!(container = %self.connection.container, "Blob container already exists");
                Ok(false)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StorageError::operation(format!(
                    "failed to create container '{}': {status} {body}",
                    self.connection.container
                )))
            }
        }
    }

    /// Signed, bodiless Create Container request dated `at`.
    fn create_request(&self, at: DateTime<Utc>) -> Result<Request, StorageError> {
        let mut request = self
            .http
            .put(self.container_url()?)
            .header("x-ms-date", http_date(at))
            .header("x-ms-version", API_VERSION)
            .header(CONTENT_LENGTH, "0")
            .build()?;
        self.authorize(&mut request)?;
        Ok(request)
    }

    /// Add a SharedKey `Authorization` header computed from the request as it
    /// will be sent.
    fn authorize(&self, request: &mut Request) -> Result<(), StorageError> {
        let signature = sign(
            &self.connection.account_key,
            &string_to_sign(request, &self.connection.account_name),
        )?;
        let value = HeaderValue::from_str(&format!(
            "SharedKey {}:{signature}",
            self.connection.account_name
        ))
        .map_err(|e| StorageError::configuration(format!("invalid authorization header: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// `{blob_endpoint}/{container}?restype=container`.
    fn container_url(&self) -> Result<Url, StorageError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.connection.blob_endpoint, self.connection.container
        ))
        .map_err(|e| StorageError::configuration(format!("invalid blob endpoint: {e}")))?;
        url.query_pairs_mut().append_pair("restype", "container");
        Ok(url)
    }
}

/// RFC 1123 date in the form the service expects for `x-ms-date`.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// SharedKey string-to-sign for the Blob service, built from the headers and
/// URL of `request`.
///
/// A `Content-Length` of `0` occupies an empty slot, as required since API
/// version 2015-02-21.
#[must_use]
pub fn string_to_sign(request: &Request, account_name: &str) -> String {
    let headers = request.headers();
    let mut out = format!("{}\n", request.method());

    for name in SIGNED_HEADERS {
        let value = header_value(headers, name);
        if !(name == "content-length" && value == "0") {
            out.push_str(value);
        }
        out.push('\n');
    }

    let ms_headers: BTreeMap<&str, &str> = headers
        .keys()
        .map(reqwest::header::HeaderName::as_str)
        .filter(|name| name.starts_with("x-ms-"))
        .map(|name| (name, header_value(headers, name)))
        .collect();
    for (name, value) in ms_headers {
        out.push_str(&format!("{name}:{value}\n"));
    }

    out.push_str(&format!("/{account_name}{}", request.url().path()));

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in request.url().query_pairs() {
        params
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }
    for (name, mut values) in params {
        values.sort();
        out.push_str(&format!("\n{name}:{}", values.join(",")));
    }

    out
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map_or("", str::trim)
}

/// Base64 HMAC-SHA256 of `string_to_sign` keyed with the decoded account key.
///
/// # Errors
///
/// Returns a configuration error if the account key is not valid base64.
pub fn sign(account_key: &str, string_to_sign: &str) -> Result<String, StorageError> {
    let key = STANDARD
        .decode(account_key)
        .map_err(|e| StorageError::configuration(format!("account key is not base64: {e}")))?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| StorageError::configuration(format!("invalid account key: {e}")))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const AZURITE_KEY: &str = "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    fn azurite() -> BlobConnection {
        BlobConnection::parse(
            &format!(
                "DefaultEndpointsProtocol=http;AccountName=devstoreaccount1;AccountKey={AZURITE_KEY};BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1;"
            ),
            "documents",
        )
        .expect("valid connection string")
    }

    #[test]
    fn test_http_date_format() {
        assert_eq!(http_date(at()), "Mon, 06 Jan 2025 12:00:00 GMT");
    }

    #[test]
    fn test_container_url_keeps_endpoint_path() {
        let client = ContainerClient::new(azurite());
        let url = client.container_url().expect("valid url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/documents?restype=container"
        );
        assert_eq!(url.path(), "/devstoreaccount1/documents");
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn test_create_request_signs_what_it_sends() {
        let client = ContainerClient::new(azurite());
        let request = client.create_request(at()).expect("request");

        assert_eq!(*request.method(), reqwest::Method::PUT);
        assert_eq!(request.headers()[CONTENT_LENGTH], "0");
        assert_eq!(
            string_to_sign(&request, "devstoreaccount1"),
            format!(
                "PUT\n{}x-ms-date:Mon, 06 Jan 2025 12:00:00 GMT\nx-ms-version:2021-08-06\n/devstoreaccount1/devstoreaccount1/documents\nrestype:container",
                "\n".repeat(11)
            )
        );
        assert_eq!(
            request.headers()[AUTHORIZATION],
            "SharedKey devstoreaccount1:2mcm26hYhWamw4T3a0bKdLdVfXuJtVZYIhKXeKGhYKQ="
        );
    }

    #[test]
    fn test_standard_headers_fill_their_slots() {
        let request = reqwest::Client::new()
            .put("http://127.0.0.1:10000/acme/contracts/a.txt")
            .header(CONTENT_LENGTH, "5")
            .header("Content-Type", "text/plain")
            .header("Range", "bytes=0-4")
            .build()
            .expect("request");

        let s = string_to_sign(&request, "acme");
        let lines: Vec<&str> = s.split('\n').collect();
        assert_eq!(lines[0], "PUT");
        assert_eq!(lines[3], "5");
        assert_eq!(lines[5], "text/plain");
        assert_eq!(lines[11], "bytes=0-4");
        assert_eq!(lines[12], "/acme/acme/contracts/a.txt");
    }

    #[test]
    fn test_ms_headers_and_query_are_canonicalized() {
        let request = reqwest::Client::new()
            .get("http://127.0.0.1:10000/acme/contracts?restype=container&Comp=list")
            .header("x-ms-version", API_VERSION)
            .header("X-MS-Date", "Mon, 06 Jan 2025 12:00:00 GMT")
            .header("x-ms-client-request-id", " abc ")
            .build()
            .expect("request");

        let s = string_to_sign(&request, "acme");
        assert!(s.ends_with(
            "x-ms-client-request-id:abc\nx-ms-date:Mon, 06 Jan 2025 12:00:00 GMT\nx-ms-version:2021-08-06\n/acme/acme/contracts\ncomp:list\nrestype:container"
        ));
    }

    #[test]
    fn test_sign_matches_rfc4231_vector() {
        // RFC 4231 test case 2: key "Jefe" (base64 "SmVmZQ==").
        let signature = sign("SmVmZQ==", "what do ya want for nothing?").expect("valid key");
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn test_sign_rejects_non_base64_key() {
        let err = sign("not base64!", "PUT").unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }
}
