//! Scripted collaborators for driving `PlaybackController` in tests

#![allow(dead_code)]

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use unispeak::audio::{AudioSink, PlaybackOutcome};
use unispeak::session::{PlaybackController, PlaybackState, SessionEvent};
use unispeak::speech::{
    CancelToken, EngineChoice, EngineStatus, SynthesisBackend, SynthesisRequest, SynthesizedAudio,
};
use unispeak::{Result, SpeakError};

/// Upper bound for anything a test waits on
pub const WAIT: Duration = Duration::from_secs(5);

/// Backend that returns canned audio or a canned error
///
/// Work is split into `chunks` units; each one waits on the gate (if any)
/// and the cancel token is checked before every unit.
pub struct ScriptedBackend {
    engine: EngineChoice,
    status: EngineStatus,
    failure: Option<SpeakError>,
    panics: bool,
    chunks: usize,
    gate: Option<Receiver<()>>,
    calls: AtomicUsize,
    chunks_done: AtomicUsize,
    returned: AtomicUsize,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl ScriptedBackend {
    pub fn ready(engine: EngineChoice) -> Self {
        Self {
            engine,
            status: EngineStatus::Ready,
            failure: None,
            panics: false,
            chunks: 1,
            gate: None,
            calls: AtomicUsize::new(0),
            chunks_done: AtomicUsize::new(0),
            returned: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Panic inside `synthesize`
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn with_chunks(mut self, chunks: usize) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn with_status(mut self, status: EngineStatus) -> Self {
        self.status = status;
        self
    }

    pub fn failing(mut self, err: SpeakError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Block every synthesis until the returned sender fires
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = bounded(8);
        self.gate = Some(rx);
        (self, tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SynthesisRequest> {
        self.requests.lock().last().cloned()
    }

    /// Units of work completed across all calls
    pub fn chunks_done(&self) -> usize {
        self.chunks_done.load(Ordering::SeqCst)
    }

    /// Calls that have returned, successfully or not
    pub fn returned(&self) -> usize {
        self.returned.load(Ordering::SeqCst)
    }
}

impl ScriptedBackend {
    fn run_chunks(&self, cancel: &CancelToken) -> Result<SynthesizedAudio> {
        for _ in 0..self.chunks {
            cancel.check()?;
            if let Some(gate) = &self.gate {
                let _ = gate.recv_timeout(WAIT);
            }
            self.chunks_done.fetch_add(1, Ordering::SeqCst);
        }

        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(SynthesizedAudio::mono(vec![0.1; 2205], 22050)),
        }
    }
}

impl SynthesisBackend for ScriptedBackend {
    fn engine(&self) -> EngineChoice {
        self.engine
    }

    fn probe(&self) -> EngineStatus {
        self.status
    }

    fn synthesize(&self, request: &SynthesisRequest, cancel: &CancelToken) -> Result<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if self.panics {
            panic!("voice crashed on input");
        }

        let result = self.run_chunks(cancel);
        self.returned.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Sink that "plays" until the test calls `finish`
pub struct ScriptedSink {
    available: bool,
    fail_start: bool,
    start_gate: Option<Receiver<()>>,
    active: Mutex<Option<Sender<PlaybackOutcome>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self {
            available: true,
            fail_start: false,
            start_gate: None,
            active: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::new()
        }
    }

    /// Block every `start` until the returned sender fires, like a slow device open
    pub fn gated_start() -> (Self, Sender<()>) {
        let (tx, rx) = bounded(8);
        let sink = Self {
            start_gate: Some(rx),
            ..Self::new()
        };
        (sink, tx)
    }

    /// Complete the current playback
    pub fn finish(&self) {
        if let Some(done) = self.active.lock().take() {
            let _ = done.send(PlaybackOutcome::Finished);
        }
    }

    /// Report a device failure for the current playback
    pub fn break_device(&self, message: &str) {
        if let Some(done) = self.active.lock().take() {
            let _ = done.send(PlaybackOutcome::Failed(message.to_string()));
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.lock().is_some()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AudioSink for ScriptedSink {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&self, _audio: SynthesizedAudio) -> Result<Receiver<PlaybackOutcome>> {
        if self.fail_start {
            return Err(SpeakError::PlaybackDeviceError("device busy".to_string()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.start_gate {
            let _ = gate.recv_timeout(WAIT);
        }

        let (tx, rx) = bounded(1);
        if let Some(previous) = self.active.lock().replace(tx) {
            let _ = previous.send(PlaybackOutcome::Stopped);
        }
        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(done) = self.active.lock().take() {
            let _ = done.send(PlaybackOutcome::Stopped);
        }
    }
}

/// Controller over the given backends and sink
pub fn controller(
    backends: &[Arc<ScriptedBackend>],
    sink: &Arc<ScriptedSink>,
) -> PlaybackController {
    let backends: Vec<Arc<dyn SynthesisBackend>> = backends
        .iter()
        .map(|b| Arc::clone(b) as Arc<dyn SynthesisBackend>)
        .collect();
    PlaybackController::new(backends, Arc::clone(sink) as Arc<dyn AudioSink>)
}

/// Both engines ready, plus a working sink
pub fn both_ready() -> (
    PlaybackController,
    Arc<ScriptedBackend>,
    Arc<ScriptedBackend>,
    Arc<ScriptedSink>,
) {
    let online = Arc::new(ScriptedBackend::ready(EngineChoice::OnlineService));
    let offline = Arc::new(ScriptedBackend::ready(EngineChoice::OfflineService));
    let sink = Arc::new(ScriptedSink::new());
    let controller = controller(&[online.clone(), offline.clone()], &sink);
    (controller, online, offline, sink)
}

/// Poll until the controller reaches `expected` or the wait runs out
pub fn wait_for_state(controller: &PlaybackController, expected: &PlaybackState) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if &controller.state() == expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Poll until `condition` holds or the wait runs out
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Collect state transitions until `last` is seen
pub fn states_until(controller: &PlaybackController, last: &PlaybackState) -> Vec<PlaybackState> {
    let mut states = Vec::new();
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        match controller.recv_event_timeout(Duration::from_millis(50)) {
            Some(SessionEvent::StateChanged(state)) => {
                let done = &state == last;
                states.push(state);
                if done {
                    break;
                }
            }
            Some(SessionEvent::Error(_)) | None => {}
        }
    }
    states
}

/// Drain and return every pending event
pub fn drain_events(controller: &PlaybackController) -> Vec<SessionEvent> {
    std::iter::from_fn(|| controller.try_recv_event()).collect()
}
