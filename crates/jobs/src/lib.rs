//! Disk-backed protocol for long running jobs that run in their own process.
//!
//! Every job gets a session directory under a shared root. The submitting side
//! writes `job_params.json` and later reads the `status` and `completed`
//! files the worker process writes; it asks the worker to stop by creating an
//! `abort` file. All files are replaced atomically so a reader never sees a
//! half written message.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const PARAMS_FILE: &str = "job_params.json";
pub const STATUS_FILE: &str = "status";
pub const COMPLETED_FILE: &str = "completed";
pub const ABORT_FILE: &str = "abort";

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("malformed status message: {0:?}")]
    MalformedStatus(String),
    #[error("job session not found: {0}")]
    SessionNotFound(String),
    #[error("job monitor stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, JobError>;

/// Progress line a worker writes: `"step frame length elapsed"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub step: u32,
    pub frame: i64,
    pub length: i64,
    /// Seconds since the job started
    pub elapsed: f64,
}

impl StatusMessage {
    pub fn parse(msg: &str) -> Result<Self> {
        let malformed = || JobError::MalformedStatus(msg.to_string());
        let parts: Vec<&str> = msg.split_whitespace().collect();
        let [step, frame, length, elapsed] = parts.as_slice() else {
            return Err(malformed());
        };
        Ok(Self {
            step: step.parse().map_err(|_| malformed())?,
            frame: frame.parse().map_err(|_| malformed())?,
            length: length.parse().map_err(|_| malformed())?,
            elapsed: elapsed.parse().map_err(|_| malformed())?,
        })
    }

    /// Fraction of frames done, 0.0 when the length is unknown.
    pub fn progress(&self) -> f32 {
        if self.length <= 0 {
            return 0.0;
        }
        (self.frame as f32 / self.length as f32).clamp(0.0, 1.0)
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.step, self.frame, self.length, self.elapsed)
    }
}

/// Writes `contents` next to `path` and renames it into place.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
    fs::write(&temp_path, contents)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Submitting side of the protocol.
#[derive(Debug, Clone)]
pub struct JobSessions {
    root: PathBuf,
}

impl JobSessions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    fn existing_session_dir(&self, session_id: &str) -> Result<PathBuf> {
        let dir = self.session_dir(session_id);
        if !dir.is_dir() {
            return Err(JobError::SessionNotFound(session_id.to_string()));
        }
        Ok(dir)
    }

    /// Creates a session directory holding the job parameters and returns
    /// its id.
    pub fn submit<P: Serialize>(&self, params: &P) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let dir = self.session_dir(&session_id);
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_vec_pretty(params)?;
        write_atomic(&dir.join(PARAMS_FILE), &json)?;
        info!(session = %session_id, "job submitted");
        Ok(session_id)
    }

    /// Starts the worker process with the session directory as its last
    /// argument.
    pub fn launch<S: AsRef<OsStr>>(&self, session_id: &str, program: S, args: &[S]) -> Result<Child> {
        let dir = self.existing_session_dir(session_id)?;
        let child = Command::new(program.as_ref()).args(args).arg(&dir).spawn()?;
        info!(session = %session_id, pid = child.id(), "job process launched");
        Ok(child)
    }

    /// Latest status the worker wrote, `None` before the first one.
    pub fn poll_status(&self, session_id: &str) -> Result<Option<StatusMessage>> {
        let dir = self.existing_session_dir(session_id)?;
        match fs::read_to_string(dir.join(STATUS_FILE)) {
            Ok(msg) => StatusMessage::parse(&msg).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_complete(&self, session_id: &str) -> bool {
        self.session_dir(session_id).join(COMPLETED_FILE).exists()
    }

    pub fn is_aborted(&self, session_id: &str) -> bool {
        self.session_dir(session_id).join(ABORT_FILE).exists()
    }

    /// Asks the worker to stop. The worker sees it on its next
    /// `abort_requested` check.
    pub fn abort(&self, session_id: &str) -> Result<()> {
        let dir = self.existing_session_dir(session_id)?;
        write_atomic(&dir.join(ABORT_FILE), b"##abort")?;
        info!(session = %session_id, "job abort requested");
        Ok(())
    }

    /// Removes status, completion and abort messages so the session can be
    /// run again.
    pub fn clear_flag_files(&self, session_id: &str) -> Result<()> {
        let dir = self.existing_session_dir(session_id)?;
        for name in [COMPLETED_FILE, STATUS_FILE, ABORT_FILE] {
            remove_if_exists(&dir.join(name))?;
        }
        Ok(())
    }

    pub fn remove_session(&self, session_id: &str) -> Result<()> {
        let dir = self.existing_session_dir(session_id)?;
        fs::remove_dir_all(dir)?;
        debug!(session = %session_id, "job session removed");
        Ok(())
    }
}

/// Worker side of the protocol, opened on one session directory.
#[derive(Debug, Clone)]
pub struct JobReporter {
    dir: PathBuf,
}

impl JobReporter {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(JobError::SessionNotFound(dir.display().to_string()));
        }
        Ok(Self { dir })
    }

    pub fn session_dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_params<P: DeserializeOwned>(&self) -> Result<P> {
        let json = fs::read_to_string(self.dir.join(PARAMS_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn write_status(&self, status: &StatusMessage) -> Result<()> {
        write_atomic(&self.dir.join(STATUS_FILE), status.to_string().as_bytes())
    }

    pub fn write_completed(&self) -> Result<()> {
        write_atomic(&self.dir.join(COMPLETED_FILE), b"##completed##")
    }

    pub fn abort_requested(&self) -> bool {
        self.dir.join(ABORT_FILE).exists()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Progress(StatusMessage),
    Done,
    Aborted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMonitorConfig {
    pub poll_interval_ms: u64,
}

impl Default for JobMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

/// Polls watched sessions on a background thread and reports changes.
///
/// A session leaves the watch set once it completes, is aborted or its
/// status cannot be read.
pub struct JobMonitor {
    watched: Arc<Mutex<HashSet<String>>>,
    tx_stop: Option<Sender<()>>,
    rx_events: Receiver<JobEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl JobMonitor {
    pub fn start(sessions: JobSessions, config: JobMonitorConfig) -> Self {
        let (tx_stop, rx_stop) = unbounded::<()>();
        let (tx_events, rx_events) = unbounded::<JobEvent>();
        let watched = Arc::new(Mutex::new(HashSet::new()));
        let interval = Duration::from_millis(config.poll_interval_ms.max(1));

        let worker = {
            let watched = watched.clone();
            thread::spawn(move || {
                let mut last: HashMap<String, StatusMessage> = HashMap::new();
                loop {
                    crossbeam_channel::select! {
                        recv(rx_stop) -> _ => break,
                        default(interval) => {
                            if !poll_watched(&sessions, &watched, &mut last, &tx_events) {
                                break;
                            }
                        }
                    }
                }
                debug!("job monitor exiting");
            })
        };

        Self {
            watched,
            tx_stop: Some(tx_stop),
            rx_events,
            worker: Some(worker),
        }
    }

    pub fn watch(&self, session_id: impl Into<String>) {
        self.watched.lock().insert(session_id.into());
    }

    pub fn unwatch(&self, session_id: &str) {
        self.watched.lock().remove(session_id);
    }

    pub fn is_watching(&self, session_id: &str) -> bool {
        self.watched.lock().contains(session_id)
    }

    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.rx_events
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_event(&self, timeout: Duration) -> Result<Option<JobEvent>> {
        match self.rx_events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(JobError::Stopped),
        }
    }

    pub fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.tx_stop.take() {
            let _ = tx.send(());
        }
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| JobError::Stopped),
            None => Ok(()),
        }
    }
}

impl Drop for JobMonitor {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// One polling round. Returns false once nobody listens for events.
fn poll_watched(
    sessions: &JobSessions,
    watched: &Mutex<HashSet<String>>,
    last: &mut HashMap<String, StatusMessage>,
    tx_events: &Sender<JobEvent>,
) -> bool {
    let ids: Vec<String> = watched.lock().iter().cloned().collect();
    for id in ids {
        let (status, finished) = if sessions.is_complete(&id) {
            (Some(JobStatus::Done), true)
        } else if sessions.is_aborted(&id) {
            (Some(JobStatus::Aborted), true)
        } else {
            match sessions.poll_status(&id) {
                Ok(Some(msg)) if last.get(&id) != Some(&msg) => {
                    last.insert(id.clone(), msg.clone());
                    (Some(JobStatus::Progress(msg)), false)
                }
                Ok(_) => (None, false),
                Err(e) => {
                    warn!(session = %id, error = %e, "job status unreadable");
                    (Some(JobStatus::Failed(e.to_string())), true)
                }
            }
        };

        if finished {
            watched.lock().remove(&id);
            last.remove(&id);
        }
        if let Some(status) = status {
            if tx_events.send(JobEvent { id, status }).is_err() {
                return false;
            }
        }
    }
    true
}
