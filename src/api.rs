// API client module: a small blocking HTTP client for the generation
// server's REST endpoints (prompt submission, queue, history, uploads).
// One instance owns one connection pool and one client id; open a separate
// instance per in-flight request if calls need to overlap.

use crate::config::ClientConfig;
use crate::error::{ClientError, ErrorBody, Result};
use crate::workflow::WorkflowGraph;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

/// Out-of-band secrets forwarded to the server in `extra_data`. The server
/// hands them to nodes that call paid partner APIs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key_comfy_org: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Credentials {
            api_key_comfy_org: api_key.into(),
        }
    }

    /// First 20 characters of the key followed by "...", for display.
    pub fn masked(&self) -> String {
        let prefix: String = self.api_key_comfy_org.chars().take(20).collect();
        format!("{}...", prefix)
    }
}

/// Body of `POST /prompt`.
#[derive(Serialize, Debug)]
pub struct SubmissionRequest<'a> {
    pub prompt: &'a WorkflowGraph,
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Credentials>,
}

/// Successful answer to a submission. `node_errors` is usually an empty
/// object; the server fills it when some output nodes failed validation but
/// others could still be queued.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    #[serde(rename = "prompt_id", default)]
    pub request_id: Option<String>,
    /// Position in the queue.
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub node_errors: Option<Map<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct QueueState {
    #[serde(default)]
    pub queue_running: Vec<Value>,
    #[serde(default)]
    pub queue_pending: Vec<Value>,
}

/// Execution history keyed by prompt id.
pub type HistoryRecord = Map<String, Value>;

/// Where the server stored an uploaded image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub name: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    base: Url,
    client_id: String,
    api_key: Option<String>,
}

impl ApiClient {
    /// Build a client for the server described by `config`. A fresh client
    /// id is generated for every instance.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let base_url = config.base_url();
        let base = Url::parse(&base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidConfig(format!("bad server address {}", base_url)))?;
        Ok(ApiClient {
            client,
            base_url,
            base,
            client_id: uuid::Uuid::new_v4().to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Create an ApiClient configured from `COMFY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token scoping server-side progress notifications to this client.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Credentials for a submission: the per-call ones if given, else the
    /// configured API key.
    pub fn credentials(&self, explicit: Option<&Credentials>) -> Option<Credentials> {
        explicit
            .cloned()
            .or_else(|| self.api_key.as_deref().map(Credentials::new))
    }

    pub fn build_request<'a>(
        &'a self,
        graph: &'a WorkflowGraph,
        credentials: Option<&Credentials>,
    ) -> SubmissionRequest<'a> {
        SubmissionRequest {
            prompt: graph,
            client_id: &self.client_id,
            extra_data: self.credentials(credentials),
        }
    }

    /// Queue a workflow for execution by POSTing it to /prompt.
    pub fn submit(
        &self,
        graph: &WorkflowGraph,
        credentials: Option<&Credentials>,
    ) -> Result<SubmissionResult> {
        let url = self.endpoint(&["prompt"]);
        let body = self.build_request(graph, credentials);
        debug!(%url, nodes = graph.len(), client_id = %self.client_id, "submitting workflow");
        let res = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()?;
        let result: SubmissionResult = read_json(res)?;
        if let Some(id) = &result.request_id {
            info!(prompt_id = %id, "workflow queued");
        }
        Ok(result)
    }

    pub fn get_queue(&self) -> Result<QueueState> {
        self.get_json(&["queue"])
    }

    /// Execution history, for every prompt or just `request_id`.
    pub fn get_history(&self, request_id: Option<&str>) -> Result<HistoryRecord> {
        match request_id {
            Some(id) => self.get_json(&["history", id]),
            None => self.get_json(&["history"]),
        }
    }

    pub fn history_url(&self, request_id: &str) -> String {
        self.endpoint(&["history", request_id]).to_string()
    }

    pub fn system_stats(&self) -> Result<Value> {
        self.get_json(&["system_stats"])
    }

    /// True when /system_stats answers 200. Transport failures count as
    /// unreachable.
    pub fn check_connectivity(&self) -> bool {
        let url = self.endpoint(&["system_stats"]);
        match self.client.get(url.clone()).send() {
            Ok(res) => res.status() == StatusCode::OK,
            Err(e) => {
                debug!(%url, error = %e, "server unreachable");
                false
            }
        }
    }

    /// Upload an image using multipart/form-data. The file is read fully
    /// before anything is sent, so a missing file never reaches the network.
    pub fn upload_image(
        &self,
        file_path: &Path,
        subfolder: Option<&str>,
        overwrite: bool,
    ) -> Result<UploadResult> {
        let bytes = std::fs::read(file_path).map_err(|source| ClientError::LocalFile {
            path: file_path.to_path_buf(),
            source,
        })?;
        let file_name = file_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image.png")
            .to_string();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;
        let mut form = multipart::Form::new().part("image", part);
        if let Some(subfolder) = subfolder {
            form = form.text("subfolder", subfolder.to_string());
        }
        if overwrite {
            form = form.text("overwrite", "true");
        }

        let url = self.endpoint(&["upload", "image"]);
        debug!(%url, path = %file_path.display(), "uploading image");
        let res = self.client.post(url).multipart(form).send()?;
        read_json(res)
    }

    /// Server URL for `segments`, each one percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        debug!(%url, "GET");
        let res = self.client.get(url).send()?;
        read_json(res)
    }
}

/// Turn a response into `T`: non-200 becomes `Server` with the body kept
/// as JSON or text, and a 200 whose body does not parse becomes
/// `MalformedResponse` with the raw text.
fn read_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    let text = res.text()?;
    if status != StatusCode::OK {
        warn!(%status, "request rejected");
        return Err(ClientError::Server {
            status,
            body: ErrorBody::parse(text),
        });
    }
    serde_json::from_str(&text).map_err(|e| {
        warn!(%status, error = %e, "response is not the expected JSON");
        ClientError::MalformedResponse { status, body: text }
    })
}
