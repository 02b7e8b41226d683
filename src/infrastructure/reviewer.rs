//! Reviewer boundary.
//!
//! The reviewer is an external text-completion collaborator. Everything it
//! returns is opaque commentary; every failure is turned into a reported
//! outcome so that one bad pair never stops the others.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::application::ImpactMap;
use crate::domain::snapshot::Snapshot;
use crate::ports::{ImpactReviewer, ReviewRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Reviewed { commentary: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    pub changed_file: String,
    pub impacted_file: String,
    pub outcome: ReviewOutcome,
}

/// Ask `reviewer` about every (changed, impacted) pair whose files both exist
/// in `snapshot`. Pairs are visited in impact-map order.
pub fn review_impacts(
    reviewer: &dyn ImpactReviewer,
    impact_map: &ImpactMap,
    snapshot: &Snapshot,
) -> Vec<ReviewRecord> {
    let files = snapshot.files_by_name();
    let mut records = Vec::new();

    for (changed_file, impacted_files) in impact_map {
        let Some(changed) = files.get(changed_file) else {
            continue;
        };
        for impacted_file in impacted_files {
            let Some(impacted) = files.get(impacted_file) else {
                continue;
            };

            info!(changed = %changed_file, impacted = %impacted_file, "requesting review");
            let request = ReviewRequest {
                changed_file,
                changed_text: &changed.text,
                impacted_file,
                impacted_text: &impacted.text,
            };
            let outcome = match reviewer.review(&request) {
                Ok(commentary) => ReviewOutcome::Reviewed {
                    commentary: commentary.trim().to_string(),
                },
                Err(e) => {
                    warn!(changed = %changed_file, impacted = %impacted_file, error = %e, "review failed");
                    ReviewOutcome::Failed {
                        message: format!("{:#}", e),
                    }
                }
            };

            records.push(ReviewRecord {
                changed_file: changed_file.clone(),
                impacted_file: impacted_file.clone(),
                outcome,
            });
        }
    }

    records
}

/// Prompt sent to a reviewer for one file pair.
pub fn review_prompt(request: &ReviewRequest<'_>) -> String {
    format!(
        "You are a PL/I code analysis expert.\n\n\
         A change has been made in the following file ({changed}):\n\n\
         --- Changed Code Start ---\n{changed_text}\n--- Changed Code End ---\n\n\
         Below is the content of a potentially affected file ({impacted}):\n\n\
         --- Target File Start ---\n{impacted_text}\n--- Target File End ---\n\n\
         Based on the change, does this affect the logic, data flow, or behavior in {impacted}? \
         If yes, where and why? Reply briefly.\n",
        changed = request.changed_file,
        changed_text = request.changed_text,
        impacted = request.impacted_file,
        impacted_text = request.impacted_text,
    )
}

/// Default bound on one review.
pub const DEFAULT_REVIEW_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs an external command per review: the prompt goes to stdin and stdout
/// is the commentary. Any completion CLI can sit behind it.
///
/// stdin is fed from its own thread while stdout and stderr are drained, so a
/// reviewer that answers while still reading cannot fill a pipe and stall.
/// A reviewer still running at the deadline is killed.
pub struct CommandReviewer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandReviewer {
    /// Split a command line on whitespace. `None` for an empty line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            timeout: DEFAULT_REVIEW_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ImpactReviewer for CommandReviewer {
    fn review(&self, request: &ReviewRequest<'_>) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start reviewer '{}'", self.program))?;

        let prompt = review_prompt(request);
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || -> io::Result<()> {
            match stdin {
                Some(mut stdin) => stdin.write_all(prompt.as_bytes()),
                None => Ok(()),
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait().context("Failed to wait for reviewer")? {
                break status;
            }
            if Instant::now() >= deadline {
                // Pipes close with the child, which releases the helper threads
                let _ = child.kill();
                let _ = child.wait();
                anyhow::bail!("reviewer timed out after {:.1?}", self.timeout);
            }
            thread::sleep(POLL_INTERVAL);
        };

        // A reviewer may answer without reading the whole prompt
        if let Ok(Err(e)) = writer.join() {
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(e).context("Failed to send prompt to reviewer");
            }
        }
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            anyhow::bail!("reviewer exited with {}: {}", status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}
