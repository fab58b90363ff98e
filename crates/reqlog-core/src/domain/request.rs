//! Request context passed to the writer on every save.
//!
//! Holds what the framework knows about the request (metadata, parameters,
//! debug mode) and the start-of-request snapshot used by diagnostics.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata about the HTTP request being logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestInfo {
    pub ip: String,
    pub method: String,
    pub host: String,
    pub uri: String,
    /// Application (module) name
    pub app: String,
    pub controller: String,
    pub action: String,
    /// Query string parameters
    pub get: BTreeMap<String, serde_json::Value>,
    /// Body parameters
    pub post: BTreeMap<String, serde_json::Value>,
}

impl RequestInfo {
    pub fn new(
        ip: impl Into<String>,
        method: impl Into<String>,
        host: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            method: method.into(),
            host: host.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Set the routing identifiers.
    pub fn with_route(
        mut self,
        app: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        self.app = app.into();
        self.controller = controller.into();
        self.action = action.into();
        self
    }

    /// `app/controller/action`, the key matched against `action_filters`.
    pub fn route(&self) -> String {
        format!("{}/{}/{}", self.app, self.controller, self.action)
    }

    pub fn has_params(&self) -> bool {
        !self.get.is_empty() || !self.post.is_empty()
    }
}

/// Per-request state supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub request: RequestInfo,
    /// Framework debug mode; enables diagnostics on the primary flush
    pub debug: bool,
    /// Running from the command line rather than serving HTTP
    pub cli: bool,
    /// When the request started
    pub begin_time: DateTime<Local>,
    /// Resident memory (bytes) when the request started
    pub begin_memory: u64,
}

impl RequestContext {
    pub fn new(request: RequestInfo, begin_time: DateTime<Local>) -> Self {
        Self {
            request,
            debug: false,
            cli: false,
            begin_time,
            begin_memory: 0,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_cli(mut self, cli: bool) -> Self {
        self.cli = cli;
        self
    }

    pub fn with_begin_memory(mut self, bytes: u64) -> Self {
        self.begin_memory = bytes;
        self
    }
}
