//! The admin API seam and its signed, blocking HTTP implementation.

#![allow(missing_docs)]

use std::sync::Arc;

use chrono::Utc;
use percent_encoding::utf8_percent_encode;
use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::debug;

use crate::accounts::User;
use crate::admin::sigv4::{self, RequestParts, SigningCredentials, URI_ENCODE_SET};
use crate::admin::xml::{self, ApiBucket};
use crate::core::config::GatewayConfig;
use crate::core::errors::{Result, VgwError};

/// Administrative operations against the gateway. One round trip per call.
pub trait AdminApi: Send + Sync {
    fn create_user(&self, user: &User) -> Result<()>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, access: &str) -> Result<()>;
    fn change_bucket_owner(&self, bucket: &str, owner: &str) -> Result<()>;
    fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()>;
    fn delete_bucket_policy(&self, bucket: &str) -> Result<()>;
    /// Raw policy document. A bucket without one fails with a 404 API error.
    fn get_bucket_policy(&self, bucket: &str) -> Result<String>;
    fn delete_bucket(&self, bucket: &str) -> Result<()>;
    fn list_buckets(&self) -> Result<Vec<ApiBucket>>;
    /// Owner ID from the bucket ACL; empty when the ACL names none.
    fn get_bucket_owner(&self, bucket: &str) -> Result<String>;
}

impl<T: AdminApi + ?Sized> AdminApi for Arc<T> {
    fn create_user(&self, user: &User) -> Result<()> {
        (**self).create_user(user)
    }
    fn update_user(&self, user: &User) -> Result<()> {
        (**self).update_user(user)
    }
    fn delete_user(&self, access: &str) -> Result<()> {
        (**self).delete_user(access)
    }
    fn change_bucket_owner(&self, bucket: &str, owner: &str) -> Result<()> {
        (**self).change_bucket_owner(bucket, owner)
    }
    fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        (**self).set_bucket_policy(bucket, policy)
    }
    fn delete_bucket_policy(&self, bucket: &str) -> Result<()> {
        (**self).delete_bucket_policy(bucket)
    }
    fn get_bucket_policy(&self, bucket: &str) -> Result<String> {
        (**self).get_bucket_policy(bucket)
    }
    fn delete_bucket(&self, bucket: &str) -> Result<()> {
        (**self).delete_bucket(bucket)
    }
    fn list_buckets(&self) -> Result<Vec<ApiBucket>> {
        (**self).list_buckets()
    }
    fn get_bucket_owner(&self, bucket: &str) -> Result<String> {
        (**self).get_bucket_owner(bucket)
    }
}

/// SigV4-signed client for the gateway admin surface.
pub struct AdminClient {
    http: Client,
    endpoint: String,
    credentials: SigningCredentials,
}

impl AdminClient {
    /// Build a client with the configured timeout. No request is sent.
    pub fn new(gateway: &GatewayConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(gateway.request_timeout())
            .build()?;
        Ok(Self {
            http,
            endpoint: gateway.endpoint_url.trim_end_matches('/').to_string(),
            credentials: SigningCredentials {
                access: gateway.admin_access.clone(),
                secret: gateway.admin_secret.clone(),
                region: gateway.region.clone(),
            },
        })
    }

    /// Sign and send one request, returning the body of a successful response.
    fn send(&self, method: Method, path: &str, query: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let url = build_url(&self.endpoint, path, query)?;
        let host = host_header(&url)?;
        let payload_hash = sigv4::hash_payload(&body);
        let parts = RequestParts {
            method: method.as_str(),
            path: url.path(),
            query: url.query().unwrap_or(""),
            host: &host,
            payload_hash: &payload_hash,
        };
        let signed = sigv4::sign(&parts, &self.credentials, Utc::now())?;

        debug!(method = %method, path = url.path(), "admin request");
        let response = self
            .http
            .request(method.clone(), url.clone())
            .header("x-amz-content-sha256", &signed.content_sha256)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(body)
            .send()?;

        let status = response.status().as_u16();
        let bytes = response.bytes()?.to_vec();
        debug!(method = %method, path = url.path(), status, "admin response");
        if status >= 400 {
            return Err(VgwError::Api {
                status,
                body: String::from_utf8_lossy(&bytes).to_string(),
            });
        }
        Ok(bytes)
    }
}

impl AdminApi for AdminClient {
    fn create_user(&self, user: &User) -> Result<()> {
        self.send(Method::PATCH, "/create-user", "", xml::encode_account(user)?)?;
        Ok(())
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let query = encode_query(&[("access", &user.access)]);
        self.send(Method::PATCH, "/update-user", &query, xml::encode_account(user)?)?;
        Ok(())
    }

    fn delete_user(&self, access: &str) -> Result<()> {
        let query = encode_query(&[("access", access)]);
        self.send(Method::PATCH, "/delete-user", &query, Vec::new())?;
        Ok(())
    }

    fn change_bucket_owner(&self, bucket: &str, owner: &str) -> Result<()> {
        let query = encode_query(&[("bucket", bucket), ("owner", owner)]);
        self.send(Method::PATCH, "/change-bucket-owner/", &query, Vec::new())?;
        Ok(())
    }

    fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.send(Method::PUT, &bucket_path(bucket), "policy", policy.as_bytes().to_vec())?;
        Ok(())
    }

    fn delete_bucket_policy(&self, bucket: &str) -> Result<()> {
        self.send(Method::DELETE, &bucket_path(bucket), "policy", Vec::new())?;
        Ok(())
    }

    fn get_bucket_policy(&self, bucket: &str) -> Result<String> {
        let body = self.send(Method::GET, &bucket_path(bucket), "policy", Vec::new())?;
        Ok(String::from_utf8_lossy(&body).to_string())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.send(Method::DELETE, &bucket_path(bucket), "", Vec::new())?;
        Ok(())
    }

    fn list_buckets(&self) -> Result<Vec<ApiBucket>> {
        let body = self.send(Method::GET, "/", "", Vec::new())?;
        xml::decode_bucket_list(&body)
    }

    fn get_bucket_owner(&self, bucket: &str) -> Result<String> {
        let body = self.send(Method::GET, &bucket_path(bucket), "acl", Vec::new())?;
        xml::decode_acl_owner(&body)
    }
}

fn bucket_path(bucket: &str) -> String {
    format!("/{}", utf8_percent_encode(bucket, URI_ENCODE_SET))
}

/// `k=v&k=v` with values percent-encoded.
#[must_use]
pub fn encode_query(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, URI_ENCODE_SET)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Join the endpoint with a path and optional query.
pub fn build_url(endpoint: &str, path: &str, query: &str) -> Result<Url> {
    let raw = if query.is_empty() {
        format!("{endpoint}{path}")
    } else {
        format!("{endpoint}{path}?{query}")
    };
    Url::parse(&raw).map_err(|error| VgwError::InvalidConfig {
        details: format!("cannot build request URL {raw:?}: {error}"),
    })
}

/// `host[:port]` as reqwest will send it; default ports are omitted.
fn host_header(url: &Url) -> Result<String> {
    let host = url.host_str().ok_or_else(|| VgwError::InvalidConfig {
        details: format!("endpoint has no host: {url}"),
    })?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;

    #[derive(Debug)]
    struct Captured {
        request_line: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Serve exactly one HTTP request with a canned response.
    fn one_shot_server(status: u16, reply: &'static str) -> (String, JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((k, v)) = line.split_once(':') {
                    headers.push((k.trim().to_string(), v.trim().to_string()));
                }
            }
            let length = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .map_or(0, |(_, v)| v.parse::<usize>().unwrap());
            let mut body = vec![0u8; length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            )
            .unwrap();
            Captured {
                request_line: request_line.trim_end().to_string(),
                headers,
                body,
            }
        });
        (endpoint, handle)
    }

    fn client_for(endpoint: &str) -> AdminClient {
        AdminClient::new(&GatewayConfig {
            endpoint_url: endpoint.to_string(),
            admin_access: "admin".into(),
            admin_secret: "secret".into(),
            region: "us-east-1".into(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn create_user_sends_signed_account_xml() {
        let (endpoint, server) = one_shot_server(200, "");
        let user = User {
            access: "alice".into(),
            secret: "pw".into(),
            role: "user".into(),
            ..User::default()
        };
        client_for(&endpoint).create_user(&user).unwrap();
        let captured = server.join().unwrap();

        assert_eq!(captured.request_line, "PATCH /create-user HTTP/1.1");
        let body = String::from_utf8(captured.body.clone()).unwrap();
        assert!(body.starts_with("<Account><Access>alice</Access>"), "{body}");
        assert_eq!(
            captured.header("x-amz-content-sha256"),
            Some(sigv4::hash_payload(body.as_bytes()).as_str())
        );
        let auth = captured.header("authorization").unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=admin/"), "{auth}");
        assert!(auth.contains("/us-east-1/s3/aws4_request"), "{auth}");
    }

    #[test]
    fn error_status_surfaces_status_and_body() {
        let (endpoint, server) = one_shot_server(
            404,
            "<Error><Code>NoSuchBucketPolicy</Code></Error>",
        );
        let err = client_for(&endpoint).get_bucket_policy("photos").unwrap_err();
        let captured = server.join().unwrap();

        assert_eq!(captured.request_line, "GET /photos?policy HTTP/1.1");
        assert_eq!(
            captured.header("x-amz-content-sha256"),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert!(matches!(err, VgwError::Api { status: 404, .. }));
        assert!(err.is_policy_not_found());
    }

    #[test]
    fn policy_failures_keep_status_and_body() {
        let (endpoint, server) = one_shot_server(403, "AccessDenied");
        let err = client_for(&endpoint)
            .set_bucket_policy("photos", "{}")
            .unwrap_err();
        let captured = server.join().unwrap();
        assert_eq!(captured.request_line, "PUT /photos?policy HTTP/1.1");
        assert_eq!(captured.body, b"{}");
        assert!(
            matches!(&err, VgwError::Api { status: 403, body } if body == "AccessDenied"),
            "{err:?}"
        );
    }

    #[test]
    fn change_owner_encodes_query() {
        let (endpoint, server) = one_shot_server(200, "");
        client_for(&endpoint)
            .change_bucket_owner("b1", "bob smith")
            .unwrap();
        let captured = server.join().unwrap();
        assert_eq!(
            captured.request_line,
            "PATCH /change-bucket-owner/?bucket=b1&owner=bob%20smith HTTP/1.1"
        );
    }

    #[test]
    fn list_buckets_parses_xml() {
        let (endpoint, server) = one_shot_server(
            200,
            "<ListAllMyBucketsResult><Buckets><Bucket><Name>alpha</Name><Owner>bob</Owner></Bucket></Buckets></ListAllMyBucketsResult>",
        );
        let buckets = client_for(&endpoint).list_buckets().unwrap();
        let captured = server.join().unwrap();
        assert_eq!(captured.request_line, "GET / HTTP/1.1");
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].owner, "bob");
    }

    #[test]
    fn acl_owner_lookup() {
        let (endpoint, server) = one_shot_server(
            200,
            "<AccessControlPolicy><Owner><ID>carol</ID></Owner></AccessControlPolicy>",
        );
        assert_eq!(client_for(&endpoint).get_bucket_owner("beta").unwrap(), "carol");
        assert_eq!(server.join().unwrap().request_line, "GET /beta?acl HTTP/1.1");
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let err = client_for(&endpoint).delete_user("alice").unwrap_err();
        assert!(matches!(err, VgwError::Transport { .. }), "{err}");
    }

    #[test]
    fn host_header_keeps_non_default_port() {
        let url = build_url("http://gw.local:7070", "/", "").unwrap();
        assert_eq!(host_header(&url).unwrap(), "gw.local:7070");
        let url = build_url("https://gw.local", "/b", "acl").unwrap();
        assert_eq!(host_header(&url).unwrap(), "gw.local");
        assert_eq!(url.query(), Some("acl"));
    }
}
