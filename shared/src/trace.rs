//! `TraceEvent`: the payload produced by the tracee event source.
//!
//! This is the only payload whose identifying fields the engine inspects,
//! to classify it as host or container activity. Conversion into an
//! [`Event`] envelope lives here so that every producer stamps the same
//! headers.

use serde::{Deserialize, Serialize};

use crate::constants::{TRACEE_CONTENT_TYPE, TRACEE_SOURCE};
use crate::protocol::{Event, EventHeaders, Origin, Payload};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArgMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Argument {
    #[serde(flatten)]
    pub meta: ArgMeta,
    pub value: serde_json::Value,
}

impl Argument {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            meta: ArgMeta { name: name.into(), arg_type: String::new() },
            value: value.into(),
        }
    }
}

/// One kernel-observed event as emitted by tracee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceEvent {
    pub timestamp: i64,
    pub processor_id: i32,
    pub process_id: i32,
    pub thread_id: i32,
    pub parent_process_id: i32,
    pub host_process_id: i32,
    pub host_thread_id: i32,
    pub host_parent_process_id: i32,
    pub user_id: i32,
    pub mount_namespace: u32,
    pub pid_namespace: u32,
    pub process_name: String,
    pub host_name: String,
    pub container_id: String,
    pub event_id: i32,
    pub event_name: String,
    pub return_value: i64,
    pub args: Vec<Argument>,
}

impl TraceEvent {
    /// Host unless the event carries a container id, and even then a process
    /// that is its own parent at the host level stays on the host.
    pub fn origin(&self) -> Origin {
        if self.container_id.is_empty() || self.is_host_self_parent() {
            Origin::Host
        } else {
            Origin::Container
        }
    }

    fn is_host_self_parent(&self) -> bool {
        self.host_process_id != 0 && self.host_process_id == self.host_parent_process_id
    }

    pub fn arg(&self, name: &str) -> Option<&serde_json::Value> {
        self.args.iter().find(|a| a.meta.name == name).map(|a| &a.value)
    }
}

impl From<TraceEvent> for Event {
    fn from(ev: TraceEvent) -> Self {
        let headers = EventHeaders {
            source: TRACEE_SOURCE.into(),
            name: ev.event_name.clone(),
            origin: Some(ev.origin()),
            content_type: TRACEE_CONTENT_TYPE.into(),
        };
        Event { headers, payload: Payload::new(ev) }
    }
}
