//! In-memory CloudStack that understands the snapshot commands.
//!
//! Answers use CloudStack's JSON shapes and error texts, including the
//! asynchronous job protocol, so the full request pipeline can run without a
//! management server.

use crate::backend::CloudStackTransport;
use crate::command::BackendCommand;
use crate::error::{Ec2Error, Result};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

const ERROR_PARAM: u32 = 431;
const ERROR_UNSUPPORTED: u32 = 432;
const ACCOUNT: &str = "admin";

#[derive(Debug, Clone)]
struct Volume {
    name: String,
    volume_type: String,
}

/// State change a job applies once it completes successfully.
#[derive(Debug)]
enum Change {
    InsertSnapshot { id: String, snapshot: Value },
    RemoveSnapshot(String),
}

#[derive(Debug)]
struct Job {
    pending_polls: u32,
    result: Value,
    failed: bool,
    change: Change,
}

#[derive(Debug, Default)]
struct State {
    volumes: BTreeMap<String, Volume>,
    snapshots: BTreeMap<String, Value>,
    jobs: HashMap<String, Job>,
    executed: Vec<BackendCommand>,
}

#[derive(Debug, Default)]
pub struct InMemoryCloudStack {
    state: Mutex<State>,
    job_latency: u32,
}

impl InMemoryCloudStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `queryAsyncJobResult` calls that answer "pending" before a
    /// job completes.
    pub fn with_job_latency(mut self, polls: u32) -> Self {
        self.job_latency = polls;
        self
    }

    pub fn with_volume(self, id: &str, name: &str) -> Self {
        self.lock().volumes.insert(
            id.to_string(),
            Volume {
                name: name.to_string(),
                volume_type: "DATADISK".to_string(),
            },
        );
        self
    }

    /// Commands executed so far, in order.
    pub fn executed(&self) -> Vec<BackendCommand> {
        self.lock().executed.clone()
    }

    pub fn snapshot_ids(&self) -> Vec<String> {
        self.lock().snapshots.keys().cloned().collect()
    }

    /// Make every pending job finish as failed with `errortext`; their
    /// snapshot changes are never applied.
    pub fn fail_jobs_with(&self, errortext: &str) -> Result<()> {
        let mut state = self.lock();
        if state.jobs.is_empty() {
            return Err(Ec2Error::Backend("no pending jobs to fail".into()));
        }
        for job in state.jobs.values_mut() {
            job.failed = true;
            job.result = json!({"errorcode": 530, "errortext": errortext});
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation is a single insert or remove, so poisoning leaves no partial state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn create_snapshot(&self, state: &mut State, command: &BackendCommand) -> Value {
        let volume_id = command.param("volumeid").unwrap_or_default();
        let Some(volume) = state.volumes.get(volume_id).cloned() else {
            return error_response(
                "createsnapshotresponse",
                ERROR_PARAM,
                &invalid_value("createsnapshot", "volumeid", volume_id),
            );
        };

        let id = Uuid::new_v4().to_string();
        let created = Utc::now().format("%Y-%m-%dT%H:%M:%S%z").to_string();
        let snapshot = json!({
            "id": &id,
            "account": ACCOUNT,
            "snapshottype": "MANUAL",
            "volumeid": volume_id,
            "volumename": &volume.name,
            "volumetype": &volume.volume_type,
            "created": created,
            "name": format!("{}_{}", volume.name, Utc::now().format("%Y%m%d%H%M%S")),
            "intervaltype": "MANUAL",
            "state": "BackedUp",
        });
        let change = Change::InsertSnapshot {
            id: id.clone(),
            snapshot: snapshot.clone(),
        };

        let job_id = self.start_job(state, json!({ "snapshot": snapshot }), change);
        json!({"createsnapshotresponse": {"id": id, "jobid": job_id}})
    }

    fn delete_snapshot(&self, state: &mut State, command: &BackendCommand) -> Value {
        let id = command.param("id").unwrap_or_default();
        if !state.snapshots.contains_key(id) {
            return error_response(
                "deletesnapshotresponse",
                ERROR_PARAM,
                &invalid_value("deletesnapshot", "id", id),
            );
        }

        let change = Change::RemoveSnapshot(id.to_string());
        let job_id = self.start_job(state, json!({ "success": true }), change);
        json!({"deletesnapshotresponse": {"jobid": job_id}})
    }

    fn list_snapshots(&self, state: &State, command: &BackendCommand) -> Value {
        let matching: Vec<Value> = match command.param("id") {
            Some(id) => state.snapshots.get(id).cloned().into_iter().collect(),
            None => state.snapshots.values().cloned().collect(),
        };

        // CloudStack omits both keys when nothing matches.
        if matching.is_empty() {
            return json!({"listsnapshotsresponse": {}});
        }
        json!({"listsnapshotsresponse": {"count": matching.len(), "snapshot": matching}})
    }

    fn query_job(&self, state: &mut State, command: &BackendCommand) -> Value {
        let job_id = command.param("jobid").unwrap_or_default().to_string();
        let Some(mut job) = state.jobs.remove(&job_id) else {
            return error_response(
                "queryasyncjobresultresponse",
                ERROR_PARAM,
                &invalid_value("queryasyncjobresult", "jobid", &job_id),
            );
        };

        if job.pending_polls > 0 {
            job.pending_polls -= 1;
            state.jobs.insert(job_id.clone(), job);
            return json!({"queryasyncjobresultresponse": {"jobid": job_id, "jobstatus": 0}});
        }

        let status = if job.failed { 2 } else { 1 };
        if !job.failed {
            match job.change {
                Change::InsertSnapshot { id, snapshot } => {
                    state.snapshots.insert(id, snapshot);
                }
                Change::RemoveSnapshot(id) => {
                    state.snapshots.remove(&id);
                }
            }
        }
        json!({"queryasyncjobresultresponse": {
            "jobid": job_id,
            "jobstatus": status,
            "jobresult": job.result,
        }})
    }

    fn start_job(&self, state: &mut State, result: Value, change: Change) -> String {
        let job_id = Uuid::new_v4().to_string();
        state.jobs.insert(
            job_id.clone(),
            Job {
                pending_polls: self.job_latency,
                result,
                failed: false,
                change,
            },
        );
        job_id
    }
}

#[async_trait::async_trait]
impl CloudStackTransport for InMemoryCloudStack {
    async fn execute(&self, command: &BackendCommand) -> Result<Value> {
        let mut state = self.lock();
        state.executed.push(command.clone());
        debug!(command = command.command(), "In-memory CloudStack executing command");

        let answer = match command.command() {
            "createSnapshot" => self.create_snapshot(&mut state, command),
            "deleteSnapshot" => self.delete_snapshot(&mut state, command),
            "listSnapshots" => self.list_snapshots(&state, command),
            "queryAsyncJobResult" => self.query_job(&mut state, command),
            other => error_response(
                &format!("{}response", other.to_lowercase()),
                ERROR_UNSUPPORTED,
                "The given command does not exist or it is not available for user",
            ),
        };
        Ok(answer)
    }
}

fn invalid_value(api: &str, param: &str, value: &str) -> String {
    format!(
        "Unable to execute API command {api} due to invalid value. \
         Invalid parameter {param} value={value} due to incorrect long value format, \
         or entity does not exist or due to incorrect parameter annotation for the field in api cmd class."
    )
}

fn error_response(key: &str, code: u32, text: &str) -> Value {
    let mut outer = serde_json::Map::new();
    outer.insert(
        key.to_string(),
        json!({"uuidList": [], "errorcode": code, "errortext": text}),
    );
    Value::Object(outer)
}
