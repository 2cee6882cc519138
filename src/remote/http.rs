use super::{Account, Analysis, RemoteError, RemoteService};
use crate::tracking::manifest::Manifest;
use crate::utils::archive::Archive;
use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Blocking HTTP client for the analysis service REST API
#[derive(Clone)]
pub struct HttpRemote {
    /// Shared connection pool
    client: Client,
    /// API root without trailing slash
    base_url: String,
    /// Bearer credential
    api_key: String,
}

impl std::fmt::Debug for HttpRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemote")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ManifestResponse {
    #[serde(default)]
    manifest: Manifest,
}

#[derive(Serialize)]
struct CreateProjectRequest<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectResponse {
    project_id: String,
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    files: &'a [String],
}

impl HttpRemote {
    /// Build a client for `base_url` authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("patchwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// The API root requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send an authenticated request and reject non-success statuses
    fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| RemoteError::from_transport(operation, &e))?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "Remote responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(RemoteError::from_status(operation, status.as_u16(), &body))
    }

    /// Send and decode a JSON body
    fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        self.send(operation, request)?
            .json()
            .map_err(|e| RemoteError::InvalidResponse(format!("{operation}: {e}")))
    }

    /// Multipart form carrying an archive and its manifest
    fn archive_form(
        operation: &str,
        archive: &Archive,
        manifest: &Manifest,
    ) -> Result<multipart::Form, RemoteError> {
        let manifest_json = serde_json::to_string(manifest)
            .map_err(|e| RemoteError::InvalidResponse(format!("{operation}: encoding manifest: {e}")))?;
        let part = multipart::Part::bytes(archive.bytes.clone())
            .file_name("patch.zip")
            .mime_str("application/zip")
            .map_err(|e| RemoteError::from_transport(operation, &e))?;

        Ok(multipart::Form::new()
            .part("archive", part)
            .text("manifest", manifest_json))
    }
}

impl RemoteService for HttpRemote {
    fn whoami(&self) -> Result<Account, RemoteError> {
        self.send_json("Verify API key", self.client.get(self.url("me")))
    }

    fn create_project(&self, name: &str) -> Result<String, RemoteError> {
        let request = self
            .client
            .post(self.url("projects"))
            .json(&CreateProjectRequest { name });
        let response: CreateProjectResponse = self.send_json("Create project", request)?;
        info!(project_id = %response.project_id, "Created remote project");
        Ok(response.project_id)
    }

    fn upload_project(
        &self,
        project_id: &str,
        archive: &Archive,
        manifest: &Manifest,
    ) -> Result<(), RemoteError> {
        let operation = "Upload project";
        let form = Self::archive_form(operation, archive, manifest)?;
        let request = self
            .client
            .post(self.url(&format!("projects/{project_id}/upload")))
            .multipart(form);
        self.send(operation, request)?;
        info!(files = manifest.len(), bytes = archive.len(), "Uploaded project snapshot");
        Ok(())
    }

    fn fetch_manifest(&self, project_id: &str) -> Result<Manifest, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("projects/{project_id}/manifest")));
        let response: ManifestResponse = self.send_json("Fetch remote manifest", request)?;
        debug!(files = response.manifest.len(), "Fetched remote manifest");
        Ok(response.manifest)
    }

    fn upload_patch(
        &self,
        project_id: &str,
        archive: &Archive,
        manifest: &Manifest,
    ) -> Result<(), RemoteError> {
        let operation = "Upload patch";
        let form = Self::archive_form(operation, archive, manifest)?;
        let request = self
            .client
            .post(self.url(&format!("projects/{project_id}/patch")))
            .multipart(form);
        self.send(operation, request)?;
        info!(files = manifest.len(), bytes = archive.len(), "Uploaded patch");
        Ok(())
    }

    fn start_analysis(&self, project_id: &str, files: &[String]) -> Result<Analysis, RemoteError> {
        let request = self
            .client
            .post(self.url(&format!("projects/{project_id}/analyses")))
            .json(&AnalysisRequest { files });
        self.send_json("Start analysis", request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer exactly one request with `status` and `body`, returning the raw request
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (url, handle)
    }

    fn client(url: &str) -> HttpRemote {
        HttpRemote::new(url, "secret-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let remote = client("https://api.example.com/v1/");
        assert_eq!(remote.base_url(), "https://api.example.com/v1");
        assert_eq!(remote.url("/me"), "https://api.example.com/v1/me");
        assert!(!format!("{remote:?}").contains("secret-key"));
    }

    #[test]
    fn test_fetch_manifest_parses_and_authenticates() {
        let (url, server) = serve_once("200 OK", r#"{"manifest":{"src/index.js":"abc"}}"#);

        let manifest = client(&url).fetch_manifest("proj-1").unwrap();
        assert_eq!(manifest.get("src/index.js"), Some("abc"));

        let request = server.join().unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /projects/proj-1/manifest "));
        assert!(request.contains("authorization: bearer secret-key"));
    }

    #[test]
    fn test_missing_manifest_field_is_empty() {
        let (url, server) = serve_once("200 OK", "{}");
        assert!(client(&url).fetch_manifest("p").unwrap().is_empty());
        server.join().unwrap();
    }

    #[test]
    fn test_unauthorized_is_authentication_error() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#);

        let err = client(&url).fetch_manifest("p").unwrap_err();
        assert!(matches!(err, RemoteError::Authentication(_)));
        assert!(!err.should_retry());
        server.join().unwrap();
    }

    #[test]
    fn test_garbage_body_is_invalid_response() {
        let (url, server) = serve_once("200 OK", "not json");
        let err = client(&url).whoami().unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
        server.join().unwrap();
    }

    #[test]
    fn test_start_analysis_sends_files() {
        let (url, server) = serve_once(
            "201 Created",
            r#"{"analysisId":"a-1","resultsUrl":"https://app.example.com/a-1"}"#,
        );

        let analysis = client(&url)
            .start_analysis("p", &["src/a.ts".to_string()])
            .unwrap();
        assert_eq!(analysis.analysis_id, "a-1");
        assert_eq!(analysis.results_url, "https://app.example.com/a-1");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /projects/p/analyses "));
        assert!(request.contains(r#"{"files":["src/a.ts"]}"#));
    }

    #[test]
    fn test_connection_refused_is_network_error() {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = client(&format!("http://127.0.0.1:{port}"))
            .fetch_manifest("p")
            .unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
        assert!(err.should_retry());
    }
}
