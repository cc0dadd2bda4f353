use crate::audio::{default_sink, AudioSink, PlaybackOutcome};
use crate::config::AppConfig;
use crate::session::state::{PlaybackState, SessionEvent};
use crate::speech::{
    CancelToken, EngineChoice, EngineStatus, GoogleBackend, PiperBackend, SynthesisBackend,
    SynthesisRequest, SynthesizedAudio,
};
use crate::{Result, SpeakError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Handle on the synthesis/playback job that is currently in flight
#[derive(Clone, Debug)]
struct Job {
    id: Uuid,
    cancel: CancelToken,
}

impl Job {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel: CancelToken::new(),
        }
    }
}

/// Mutable session data, guarded by a single lock
struct Session {
    state: PlaybackState,
    selected: Option<EngineChoice>,
    statuses: HashMap<EngineChoice, EngineStatus>,
    audio_available: bool,
    job: Option<Job>,
}

impl Session {
    /// Engines usable for playback, in picker order
    fn available(&self) -> Vec<EngineChoice> {
        if !self.audio_available {
            return Vec::new();
        }
        EngineChoice::ALL
            .into_iter()
            .filter(|engine| self.status(*engine).is_available())
            .collect()
    }

    fn status(&self, engine: EngineChoice) -> EngineStatus {
        self.statuses
            .get(&engine)
            .copied()
            .unwrap_or(EngineStatus::NotInstalled)
    }

    /// The job is still the one the user asked for last
    fn is_current(&self, job: &Job) -> bool {
        !job.cancel.is_cancelled() && self.job.as_ref().is_some_and(|current| current.id == job.id)
    }
}

/// Lock order: `device` before `session`.
///
/// `device` serializes every `sink.start`/`sink.stop`, so a job that was
/// stopped can never reach the sink afterwards. `session` is never held
/// across a sink call, so `state()` does not wait on the audio device.
struct Shared {
    device: Mutex<()>,
    session: Mutex<Session>,
    backends: HashMap<EngineChoice, Arc<dyn SynthesisBackend>>,
    sink: Arc<dyn AudioSink>,
    event_tx: Sender<SessionEvent>,
}

impl Shared {
    fn transition(&self, session: &mut Session, next: PlaybackState) {
        debug!("Playback state: {} -> {}", session.state, next);
        session.state = next.clone();
        let _ = self.event_tx.send(SessionEvent::StateChanged(next));
    }

    /// Cancel the current job and move to `Stopped`
    ///
    /// The caller holds `device` and releases the sink once `session` is
    /// unlocked.
    fn cancel_current(&self, session: &mut Session) {
        if let Some(job) = session.job.take() {
            info!("Cancelling job {}", job.id);
            job.cancel.cancel();
        }
        self.transition(session, PlaybackState::Stopped);
    }

    fn fail(&self, session: &mut Session, err: SpeakError) {
        error!("Playback failed: {}", err);
        session.job = None;
        self.transition(session, PlaybackState::Failed(err.reason()));
        let _ = self.event_tx.send(SessionEvent::Error(err));
    }

    /// Worker body: synthesize, then hand the audio to the sink
    fn run_job(&self, job: Job, backend: Arc<dyn SynthesisBackend>, request: SynthesisRequest) {
        let result = synthesize_guarded(backend.as_ref(), &request, &job.cancel);

        let device = self.device.lock();
        let mut session = self.session.lock();
        if !session.is_current(&job) {
            debug!("Discarding result of cancelled job {}", job.id);
            return;
        }

        let audio = match result {
            Ok(audio) => audio,
            Err(e) => {
                self.fail(&mut session, e);
                return;
            }
        };

        info!(
            "Job {} synthesized {:.2}s of audio with {}",
            job.id,
            audio.duration_secs(),
            backend.name()
        );
        drop(session);

        // Only stop() and play() change the current job, and both need `device`
        let started = self.sink.start(audio);
        let mut session = self.session.lock();
        drop(device);

        match started {
            Ok(done) => {
                self.transition(&mut session, PlaybackState::Playing);
                drop(session);
                self.await_completion(job, done);
            }
            Err(e) => self.fail(&mut session, e),
        }
    }

    fn await_completion(&self, job: Job, done: Receiver<PlaybackOutcome>) {
        let outcome = done.recv().unwrap_or_else(|_| {
            PlaybackOutcome::Failed("audio player stopped unexpectedly".to_string())
        });

        let mut session = self.session.lock();
        if !session.is_current(&job) {
            debug!("Job {} ended after being superseded", job.id);
            return;
        }

        match outcome {
            PlaybackOutcome::Finished => {
                info!("Job {} finished", job.id);
                session.job = None;
                self.transition(&mut session, PlaybackState::Idle);
            }
            PlaybackOutcome::Stopped => {
                session.job = None;
                self.transition(&mut session, PlaybackState::Stopped);
            }
            PlaybackOutcome::Failed(message) => {
                self.fail(&mut session, SpeakError::PlaybackDeviceError(message));
            }
        }
    }
}

/// Run the backend, turning a panic into a synthesis error
fn synthesize_guarded(
    backend: &dyn SynthesisBackend,
    request: &SynthesisRequest,
    cancel: &CancelToken,
) -> Result<SynthesizedAudio> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| backend.synthesize(request, cancel)));
    outcome.unwrap_or_else(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!("{} panicked: {}", backend.name(), detail);
        Err(SpeakError::SynthesisError(format!("{} crashed: {}", backend.name(), detail)))
    })
}

/// Playback session controller
///
/// Owns the engine selection and the play/stop lifecycle. One job is in
/// flight at a time; synthesis and playback run on a worker thread and
/// report back through `SessionEvent`s.
pub struct PlaybackController {
    shared: Arc<Shared>,
    event_rx: Receiver<SessionEvent>,
}

impl PlaybackController {
    /// Create a controller over the given backends and probe them once
    pub fn new(backends: Vec<Arc<dyn SynthesisBackend>>, sink: Arc<dyn AudioSink>) -> Self {
        let (event_tx, event_rx) = unbounded();

        let backends = backends
            .into_iter()
            .map(|backend| (backend.engine(), backend))
            .collect();

        let controller = Self {
            shared: Arc::new(Shared {
                device: Mutex::new(()),
                session: Mutex::new(Session {
                    state: PlaybackState::Idle,
                    selected: None,
                    statuses: HashMap::new(),
                    audio_available: false,
                    job: None,
                }),
                backends,
                sink,
                event_tx,
            }),
            event_rx,
        };

        controller.check_available_engines();
        controller
    }

    /// Build the real backends and audio output from settings
    pub fn from_config(config: &AppConfig) -> Self {
        let backends: Vec<Arc<dyn SynthesisBackend>> = vec![
            Arc::new(GoogleBackend::new(config.google_config())),
            Arc::new(PiperBackend::new(config.piper_config())),
        ];

        let controller = Self::new(backends, default_sink());

        if let Err(e) = controller.select_engine(config.engine) {
            warn!("Configured engine {} unavailable: {}", config.engine, e);
        }

        controller
    }

    /// Probe both backends and the audio output and refresh the cache
    ///
    /// Makes no network calls and does not load voice models.
    pub fn check_available_engines(&self) -> Vec<EngineChoice> {
        let audio_available = self.shared.sink.is_available();
        if !audio_available {
            warn!("No audio output device found");
        }

        let statuses: HashMap<EngineChoice, EngineStatus> = EngineChoice::ALL
            .into_iter()
            .map(|engine| {
                let status = self
                    .shared
                    .backends
                    .get(&engine)
                    .map(|backend| backend.probe())
                    .unwrap_or(EngineStatus::NotInstalled);
                debug!("Engine {} probed as {:?}", engine, status);
                (engine, status)
            })
            .collect();

        let mut session = self.shared.session.lock();
        session.statuses = statuses;
        session.audio_available = audio_available;

        let available = session.available();
        let selection_valid = session
            .selected
            .is_some_and(|selected| available.contains(&selected));
        if !selection_valid {
            session.selected = default_selection(&available);
        }

        info!(
            "Available engines: {:?}, selected: {:?}",
            available, session.selected
        );
        available
    }

    /// Choose the engine for the next `play`
    pub fn select_engine(&self, choice: EngineChoice) -> Result<()> {
        let mut session = self.shared.session.lock();
        if !session.available().contains(&choice) {
            return Err(SpeakError::EngineUnavailable(choice));
        }
        if session.selected != Some(choice) {
            info!("Selected engine: {}", choice.display_name());
        }
        session.selected = Some(choice);
        Ok(())
    }

    /// Synthesize and play a request, replacing whatever is in flight
    ///
    /// Returns the id of the new job once it is `Synthesizing`.
    pub fn play(&self, request: SynthesisRequest) -> Result<Uuid> {
        let device = self.shared.device.lock();
        let mut session = self.shared.session.lock();

        let available = session.available();
        if available.is_empty() {
            warn!("Play refused: no engine available");
            return Err(SpeakError::NoEngineAvailable);
        }
        request.validate()?;
        if !available.contains(&request.engine) {
            return Err(SpeakError::EngineUnavailable(request.engine));
        }

        let backend = self
            .shared
            .backends
            .get(&request.engine)
            .cloned()
            .ok_or(SpeakError::EngineUnavailable(request.engine))?;

        if session.state.is_busy() {
            self.shared.cancel_current(&mut session);
            MutexGuard::unlocked(&mut session, || self.shared.sink.stop());
        }

        let job = Job::new();
        info!(
            "Job {} started: {} chars with {} at {:.1}x",
            job.id,
            request.text.chars().count(),
            backend.name(),
            request.speed
        );
        session.job = Some(job.clone());
        self.shared.transition(&mut session, PlaybackState::Synthesizing);
        drop(session);
        drop(device);

        let id = job.id;
        let shared = Arc::clone(&self.shared);
        let worker_job = job.clone();
        let spawned = thread::Builder::new()
            .name("synthesis".to_string())
            .spawn(move || shared.run_job(worker_job, backend, request));

        if let Err(e) = spawned {
            let err = SpeakError::ChannelError(format!("Failed to spawn synthesis worker: {}", e));
            let mut session = self.shared.session.lock();
            if session.is_current(&job) {
                self.shared.fail(&mut session, err.clone());
            }
            return Err(err);
        }

        Ok(id)
    }

    /// Cancel the current job; no-op when nothing is in flight
    ///
    /// The audio device is released before this returns.
    pub fn stop(&self) {
        let _device = self.shared.device.lock();
        let mut session = self.shared.session.lock();
        if !session.state.is_busy() {
            debug!("Stop ignored in state {}", session.state);
            return;
        }
        self.shared.cancel_current(&mut session);
        drop(session);
        self.shared.sink.stop();
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.session.lock().state.clone()
    }

    pub fn selected_engine(&self) -> Option<EngineChoice> {
        self.shared.session.lock().selected
    }

    /// Cached result of the last `check_available_engines`
    pub fn available_engines(&self) -> Vec<EngineChoice> {
        self.shared.session.lock().available()
    }

    pub fn engine_status(&self, engine: EngineChoice) -> EngineStatus {
        self.shared.session.lock().status(engine)
    }

    pub fn audio_available(&self) -> bool {
        self.shared.session.lock().audio_available
    }

    /// Next pending event, if any (non-blocking)
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Online first, otherwise whatever is available
fn default_selection(available: &[EngineChoice]) -> Option<EngineChoice> {
    if available.contains(&EngineChoice::OnlineService) {
        Some(EngineChoice::OnlineService)
    } else {
        available.first().copied()
    }
}
