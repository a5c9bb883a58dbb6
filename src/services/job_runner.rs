//! Background job runner service
//!
//! Runs shell commands on a background thread and hands the result back
//! through a channel that the UI polls on every tick.

use regex::Regex;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, LazyLock, Mutex};
use std::thread;

/// Regex to match ANSI escape codes
static ANSI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap());

/// Strip ANSI escape codes from a string
pub fn strip_ansi_codes(s: &str) -> String {
    ANSI_REGEX.replace_all(s, "").to_string()
}

/// Result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Short description of a failure for display
    pub fn failure_message(&self) -> String {
        let stderr = strip_ansi_codes(self.stderr.trim());
        let status = match self.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "was terminated".to_string(),
        };
        if stderr.is_empty() {
            format!("Command {}", status)
        } else {
            format!("Command {}: {}", status, stderr)
        }
    }
}

enum JobMessage {
    Finished(JobOutcome),
    Error(String),
}

/// Process handle shared with the job thread so the UI can kill it
#[derive(Default)]
struct ProcessHandle {
    child: Mutex<Option<Child>>,
    cancelled: AtomicBool,
}

impl ProcessHandle {
    /// Keep the child unless the job was cancelled before it started
    fn attach(&self, mut child: Child) -> bool {
        let Ok(mut slot) = self.child.lock() else {
            return false;
        };
        if self.cancelled.load(Ordering::SeqCst) {
            let _ = child.kill();
            let _ = child.wait();
            return false;
        }
        *slot = Some(child);
        true
    }

    /// Take the child back once its output is read; `None` if it was killed
    fn detach(&self) -> Option<Child> {
        if self.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        self.child.lock().ok()?.take()
    }

    fn kill(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let child = self.child.lock().ok().and_then(|mut slot| slot.take());
        if let Some(mut child) = child {
            if let Err(e) = child.kill() {
                tracing::warn!("Failed to kill job: {}", e);
            }
            let _ = child.wait();
        }
    }
}

struct BackgroundJob {
    receiver: Receiver<JobMessage>,
    process: Arc<ProcessHandle>,
}

/// Job runner service for executing one command at a time
#[derive(Default)]
pub struct JobRunner {
    job: Option<BackgroundJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self { job: None }
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    /// Spawn a command, replacing any job still in flight
    pub fn spawn(&mut self, command: &str, stdin: Option<String>) {
        self.clear();

        let (tx, rx) = mpsc::channel();
        let command = command.to_string();
        let process = Arc::new(ProcessHandle::default());
        let thread_process = Arc::clone(&process);

        thread::spawn(move || {
            Self::run_command(&command, stdin, &thread_process, tx);
        });

        self.job = Some(BackgroundJob {
            receiver: rx,
            process,
        });
    }

    /// Poll the current job; returns its outcome once, when it finishes
    pub fn poll(&mut self) -> Option<Result<JobOutcome, String>> {
        let job = self.job.as_ref()?;

        let result = match job.receiver.try_recv() {
            Ok(JobMessage::Finished(outcome)) => Ok(outcome),
            Ok(JobMessage::Error(err)) => Err(err),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err("Job ended without a result".to_string()),
        };

        self.job = None;
        Some(result)
    }

    /// Kill the current job's process; its result is discarded
    pub fn clear(&mut self) {
        if let Some(job) = self.job.take() {
            job.process.kill();
        }
    }

    /// Run a shell command and send its result through the channel
    fn run_command(
        command: &str,
        stdin: Option<String>,
        process: &ProcessHandle,
        tx: Sender<JobMessage>,
    ) {
        #[cfg(target_os = "windows")]
        let mut cmd = {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        };

        #[cfg(not(target_os = "windows"))]
        let mut cmd = {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };

        let result = cmd
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match result {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(JobMessage::Error(e.to_string()));
                return;
            }
        };

        let stdin_pipe = child.stdin.take();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        if !process.attach(child) {
            return;
        }

        if let (Some(input), Some(mut pipe)) = (stdin, stdin_pipe) {
            if let Err(e) = pipe.write_all(input.as_bytes()) {
                tracing::warn!("Failed to write job stdin: {}", e);
            }
        }

        // stderr is drained on its own thread so a chatty command cannot block on it
        let stderr_handle = stderr_pipe.map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let mut stdout = String::new();
        if let Some(mut pipe) = stdout_pipe {
            if let Err(e) = pipe.read_to_string(&mut stdout) {
                let _ = tx.send(JobMessage::Error(e.to_string()));
                return;
            }
        }

        let stderr = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let Some(mut child) = process.detach() else {
            return;
        };
        let exit_code = child.wait().ok().and_then(|s| s.code());

        let _ = tx.send(JobMessage::Finished(JobOutcome {
            exit_code,
            stdout,
            stderr,
        }));
    }
}
