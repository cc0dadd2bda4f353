use crate::audio::{probe_output_device, AudioSink, PlaybackOutcome};
use crate::speech::SynthesizedAudio;
use crate::{Result, SpeakError};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the player thread checks for the end of playback
const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum PlayerCommand {
    Play {
        audio: SynthesizedAudio,
        opened: Sender<Result<()>>,
        done: Sender<PlaybackOutcome>,
    },
    Stop {
        ack: Sender<()>,
    },
    Shutdown,
}

/// A playback in progress; dropping it closes the device
struct ActivePlayback {
    sink: Sink,
    _stream: OutputStream,
    done: Sender<PlaybackOutcome>,
}

impl ActivePlayback {
    fn open(audio: SynthesizedAudio, done: Sender<PlaybackOutcome>) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| {
            SpeakError::PlaybackDeviceError(format!("Failed to open output stream: {}", e))
        })?;

        let sink = Sink::try_new(&handle)
            .map_err(|e| SpeakError::PlaybackDeviceError(format!("Failed to create sink: {}", e)))?;

        debug!(
            "Playing {:.2}s of audio ({} Hz, {} ch)",
            audio.duration_secs(),
            audio.sample_rate,
            audio.channels
        );
        sink.append(SamplesBuffer::new(audio.channels, audio.sample_rate, audio.samples));

        Ok(Self {
            sink,
            _stream: stream,
            done,
        })
    }

    fn end(self, outcome: PlaybackOutcome) {
        self.sink.stop();
        let _ = self.done.send(outcome);
    }
}

/// rodio-backed sink
///
/// rodio's output stream cannot leave the thread that opened it, so a player
/// thread owns it and is driven through a command channel.
pub struct RodioOutput {
    command_tx: Sender<PlayerCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RodioOutput {
    /// Spawn the player thread
    pub fn new() -> Result<Self> {
        let (command_tx, command_rx) = bounded(8);

        let worker = thread::Builder::new()
            .name("audio-player".to_string())
            .spawn(move || run_player(command_rx))
            .map_err(|e| SpeakError::PlaybackDeviceError(format!("Failed to spawn player: {}", e)))?;

        Ok(Self {
            command_tx,
            worker: Mutex::new(Some(worker)),
        })
    }
}

fn run_player(command_rx: Receiver<PlayerCommand>) {
    info!("Audio player thread starting");
    let mut active: Option<ActivePlayback> = None;

    loop {
        match command_rx.recv_timeout(POLL_INTERVAL) {
            Ok(PlayerCommand::Play { audio, opened, done }) => {
                if let Some(previous) = active.take() {
                    previous.end(PlaybackOutcome::Stopped);
                }
                match ActivePlayback::open(audio, done) {
                    Ok(playback) => {
                        active = Some(playback);
                        let _ = opened.send(Ok(()));
                    }
                    Err(e) => {
                        error!("{}", e);
                        let _ = opened.send(Err(e));
                    }
                }
            }

            Ok(PlayerCommand::Stop { ack }) => {
                if let Some(previous) = active.take() {
                    previous.end(PlaybackOutcome::Stopped);
                    info!("Stopped audio playback");
                }
                let _ = ack.send(());
            }

            Ok(PlayerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(previous) = active.take() {
                    previous.end(PlaybackOutcome::Stopped);
                }
                break;
            }

            Err(RecvTimeoutError::Timeout) => {}
        }

        if active.as_ref().is_some_and(|playback| playback.sink.empty()) {
            if let Some(finished) = active.take() {
                debug!("Playback finished");
                finished.end(PlaybackOutcome::Finished);
            }
        }
    }

    info!("Audio player thread stopped");
}

impl AudioSink for RodioOutput {
    fn is_available(&self) -> bool {
        probe_output_device().is_some()
    }

    fn start(&self, audio: SynthesizedAudio) -> Result<Receiver<PlaybackOutcome>> {
        let (opened_tx, opened_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);

        self.command_tx
            .send(PlayerCommand::Play {
                audio,
                opened: opened_tx,
                done: done_tx,
            })
            .map_err(|e| SpeakError::ChannelError(format!("Failed to reach player: {}", e)))?;

        opened_rx
            .recv()
            .map_err(|e| SpeakError::ChannelError(format!("Player went away: {}", e)))??;

        Ok(done_rx)
    }

    fn stop(&self) {
        let (ack_tx, ack_rx) = bounded(1);
        if self.command_tx.send(PlayerCommand::Stop { ack: ack_tx }).is_err() {
            warn!("Audio player is not running");
            return;
        }
        let _ = ack_rx.recv();
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        let _ = self.command_tx.send(PlayerCommand::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}
