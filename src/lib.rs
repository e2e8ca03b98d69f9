// Library root
// -----------
// The binary (`main.rs`) drives these modules from an interactive menu.
//
// Module responsibilities:
// - `workflow`: the node graph submitted to the server.
// - `config`: server address, timeout and API key.
// - `api`: blocking HTTP client for submit / queue / history / upload.
// - `error`: what can go wrong talking to the server.
// - `demo`: a ready-made two-node workflow.
// - `ui`: terminal menu flows that delegate to `api`.
pub mod api;
pub mod config;
pub mod demo;
pub mod error;
pub mod ui;
pub mod workflow;

pub use api::{ApiClient, Credentials, SubmissionResult};
pub use config::ClientConfig;
pub use error::{ClientError, ErrorBody};
pub use workflow::{InputValue, NodeRef, NodeSpec, WorkflowGraph};
