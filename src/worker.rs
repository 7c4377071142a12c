//! Background synthesis jobs
//!
//! Each accepted submission runs on its own worker thread so the window
//! never blocks on the model. A job always reports back exactly once
//! through the dispatcher's channel, whether synthesis succeeded, returned
//! an error, or the worker panicked, so the UI can close its progress
//! indicator on every path.
//!
//! Jobs are keyed by output path: while one job is writing a given file,
//! a second submission that would write the same file is refused instead
//! of racing it.

use crate::submission::Submission;
use crate::synth::{Device, Language, ModelLoader};
use crate::Result;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Identifier handed out for every dispatched job
pub type JobId = u64;

/// Called from the worker thread after an outcome has been queued
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Model parameters applied to every job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelSettings {
    pub language: Language,
    pub device: Device,
}

/// How a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The file was written
    Completed { id: JobId, path: PathBuf },

    /// Loading or synthesis failed; nothing is guaranteed about the file
    Failed { id: JobId, path: PathBuf, error: String },
}

impl JobOutcome {
    pub fn id(&self) -> JobId {
        match self {
            JobOutcome::Completed { id, .. } | JobOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            JobOutcome::Completed { path, .. } | JobOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

/// Reasons a submission is not dispatched
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Already synthesizing {}", .0.display())]
    Busy(PathBuf),

    #[error("Failed to start worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Output paths with a job currently writing them
type InFlight = Arc<Mutex<HashSet<PathBuf>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashSet<PathBuf>> {
    // A worker that panicked while holding the lock left the set intact
    in_flight.lock().unwrap_or_else(|e| e.into_inner())
}

/// Releases a job's output path when the worker thread ends
struct PathReservation {
    in_flight: InFlight,
    path: PathBuf,
}

impl Drop for PathReservation {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.path);
    }
}

/// Starts synthesis jobs and collects their outcomes
pub struct Dispatcher {
    loader: Arc<dyn ModelLoader>,
    settings: ModelSettings,
    in_flight: InFlight,
    outcome_tx: Sender<JobOutcome>,
    outcome_rx: Receiver<JobOutcome>,
    notifier: Option<Notifier>,
    next_id: JobId,
}

impl Dispatcher {
    pub fn new(loader: Arc<dyn ModelLoader>, settings: ModelSettings) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        Self {
            loader,
            settings,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            outcome_tx,
            outcome_rx,
            notifier: None,
            next_id: 1,
        }
    }

    /// Register a callback run whenever a job finishes (e.g. to repaint)
    pub fn set_notifier(&mut self, notifier: Notifier) {
        self.notifier = Some(notifier);
    }

    pub fn settings(&self) -> ModelSettings {
        self.settings
    }

    /// Number of jobs still running
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Start a job for `submission` on a new worker thread
    ///
    /// Returns as soon as the thread is running. Refuses the submission if
    /// another job is already writing the same output path.
    pub fn dispatch(&mut self, submission: Submission) -> std::result::Result<JobId, DispatchError> {
        let path = submission.output_path();

        if !lock(&self.in_flight).insert(path.clone()) {
            warn!("Refusing duplicate job for {}", path.display());
            return Err(DispatchError::Busy(path));
        }
        let reservation = PathReservation {
            in_flight: Arc::clone(&self.in_flight),
            path: path.clone(),
        };

        let id = self.next_id;
        self.next_id += 1;

        let loader = Arc::clone(&self.loader);
        let settings = self.settings;
        let tx = self.outcome_tx.clone();
        let notifier = self.notifier.clone();

        info!("Dispatching job {} -> {}", id, path.display());
        let spawned = thread::Builder::new()
            .name(format!("synth-{}", id))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_job(loader.as_ref(), settings, &submission)
                }));

                let outcome = match result {
                    Ok(Ok(())) => {
                        info!("Job {} finished: {}", id, path.display());
                        JobOutcome::Completed { id, path }
                    }
                    Ok(Err(e)) => {
                        error!("Job {} failed: {}", id, e);
                        JobOutcome::Failed {
                            id,
                            path,
                            error: e.to_string(),
                        }
                    }
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        error!("Job {} panicked: {}", id, message);
                        JobOutcome::Failed {
                            id,
                            path,
                            error: format!("Synthesis worker crashed: {}", message),
                        }
                    }
                };

                // Free the path before reporting so a resubmit is accepted
                drop(reservation);

                if tx.send(outcome).is_err() {
                    debug!("Job {} finished after dispatcher was dropped", id);
                }
                if let Some(notify) = notifier {
                    notify();
                }
            });

        match spawned {
            Ok(_) => Ok(id),
            Err(e) => {
                error!("Failed to spawn worker for job {}: {}", id, e);
                Err(DispatchError::Spawn(e))
            }
        }
    }

    /// Next finished job, if any, without blocking
    pub fn try_recv(&self) -> Option<JobOutcome> {
        self.outcome_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next finished job
    pub fn recv_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Load a fresh model and synthesize one submission
fn run_job(loader: &dyn ModelLoader, settings: ModelSettings, submission: &Submission) -> Result<()> {
    let path = submission.output_path();
    debug!(
        "Synthesizing {} chars at speed {} to {}",
        submission.text.chars().count(),
        submission.speed,
        path.display()
    );

    let mut loaded = loader.load(settings.language, settings.device)?;
    let speaker_id = loaded.speaker_id(settings.language.speaker_label())?;

    loaded
        .model
        .tts_to_file(&submission.text, speaker_id, &path, submission.speed.multiplier())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::Speed;
    use crate::synth::{LoadedModel, SpeakerMap, VoiceModel};
    use crate::HablaError;
    use std::path::Path;

    struct NoSpeakerLoader;

    impl ModelLoader for NoSpeakerLoader {
        fn load(&self, _: Language, _: Device) -> Result<LoadedModel> {
            struct Unused;
            impl VoiceModel for Unused {
                fn name(&self) -> &str {
                    "unused"
                }
                fn tts_to_file(&mut self, _: &str, _: usize, _: &Path, _: f32) -> Result<()> {
                    Err(HablaError::Synthesis("should not be called".into()))
                }
            }
            Ok(LoadedModel {
                model: Box::new(Unused),
                speakers: SpeakerMap::new(),
            })
        }
    }

    #[test]
    fn test_missing_speaker_fails_job() {
        let mut dispatcher = Dispatcher::new(Arc::new(NoSpeakerLoader), ModelSettings::default());
        let submission = Submission::new("Hola", std::env::temp_dir(), Speed::DEFAULT);

        let id = dispatcher.dispatch(submission).unwrap();
        let outcome = dispatcher
            .recv_timeout(Duration::from_secs(5))
            .expect("job should report");

        assert_eq!(outcome.id(), id);
        match outcome {
            JobOutcome::Failed { error, .. } => assert!(error.contains("Speaker 'ES'")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned.as_ref()), "bang");
        let other: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
