//! rodio-backed media element for native hosts
//!
//! Plays local files (plain paths or `file://` URLs) through the default
//! output device. The output stream is not `Send`, so it lives on a
//! dedicated audio thread; the `RodioElement` handle forwards commands to
//! it over a channel. The thread emits `TimeUpdate` on a fixed cadence and
//! `Ended` when the sink drains, mirroring how a platform audio element
//! reports.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::media::{MediaElement, MediaEvent, MediaEventSender};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug)]
enum Command {
    SetSource(String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    SetMuted(bool),
    Detach,
    Shutdown,
}

/// Handle to the audio thread; implements `MediaElement` for the session
pub struct RodioElement {
    tx: mpsc::Sender<Command>,
}

impl RodioElement {
    /// Spawn the audio thread on the default output device
    pub fn spawn(events: MediaEventSender) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || run_audio_thread(rx, events));
        Self { tx }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::error!("audio thread is gone, command dropped");
        }
    }
}

impl Drop for RodioElement {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

impl MediaElement for RodioElement {
    fn set_source(&mut self, url: &str) {
        self.send(Command::SetSource(url.to_string()));
    }

    fn request_play(&mut self) {
        self.send(Command::Play);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn seek(&mut self, position_s: f64) {
        self.send(Command::Seek(position_s));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(Command::SetVolume(volume));
    }

    fn set_muted(&mut self, muted: bool) {
        self.send(Command::SetMuted(muted));
    }

    fn detach(&mut self) {
        self.send(Command::Detach);
    }
}

/// State owned by the audio thread
struct AudioThread {
    // Kept alive for the life of the thread; dropping it silences the mixer.
    _stream: OutputStream,
    mixer: Mixer,
    sink: Option<Sink>,
    events: MediaEventSender,
    /// Current source, kept so a seek after the sink drained can rebuild it
    source_url: Option<String>,
    volume: f32,
    muted: bool,
    ended_sent: bool,
}

fn run_audio_thread(rx: mpsc::Receiver<Command>, events: MediaEventSender) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "failed to open audio output");
            let _ = events.send(MediaEvent::Error {
                message: format!("failed to open audio output: {}", e),
            });
            return;
        }
    };
    let mixer = stream.mixer().clone();
    let mut thread = AudioThread {
        _stream: stream,
        mixer,
        sink: None,
        events,
        source_url: None,
        volume: 1.0,
        muted: false,
        ended_sent: false,
    };

    loop {
        match rx.recv_timeout(TICK_INTERVAL) {
            Ok(Command::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Ok(command) => thread.handle(command),
            Err(mpsc::RecvTimeoutError::Timeout) => thread.tick(),
        }
    }
    tracing::debug!("audio thread stopped");
}

impl AudioThread {
    fn handle(&mut self, command: Command) {
        match command {
            Command::SetSource(url) => self.set_source(&url),
            Command::Play => {
                if let Some(sink) = &self.sink {
                    sink.play();
                    self.send(MediaEvent::Play);
                }
            }
            Command::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                    self.send(MediaEvent::Pause);
                }
            }
            Command::Seek(position_s) => self.seek(position_s),
            Command::SetVolume(volume) => {
                self.volume = volume;
                self.apply_volume();
            }
            Command::SetMuted(muted) => {
                self.muted = muted;
                self.apply_volume();
            }
            Command::Detach => {
                if let Some(sink) = self.sink.take() {
                    sink.stop();
                }
                self.source_url = None;
                self.ended_sent = false;
            }
            Command::Shutdown => unreachable!("handled by the thread loop"),
        }
    }

    /// Report progress and detect the natural end of the source
    fn tick(&mut self) {
        let Some(sink) = &self.sink else { return };
        if sink.empty() {
            if !self.ended_sent {
                self.ended_sent = true;
                self.send(MediaEvent::Ended);
            }
            return;
        }
        if !sink.is_paused() {
            self.send(MediaEvent::TimeUpdate {
                position_s: sink.get_pos().as_secs_f64(),
            });
        }
    }

    fn set_source(&mut self, url: &str) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.ended_sent = false;

        match self.open_source(url) {
            Ok(duration) => {
                self.source_url = Some(url.to_string());
                self.send(MediaEvent::LoadedMetadata {
                    duration_s: duration.as_secs_f64(),
                });
                // A decoded local file is immediately playable.
                self.send(MediaEvent::CanPlay);
            }
            Err(message) => {
                self.source_url = None;
                tracing::error!(url, error = %message, "rodio source load failed");
                self.send(MediaEvent::Error { message });
            }
        }
    }

    fn open_source(&mut self, url: &str) -> Result<Duration, String> {
        let path = resolve_path(url);
        let file =
            File::open(&path).map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("failed to decode audio: {}", e))?;
        let duration = source.total_duration().unwrap_or(Duration::ZERO);

        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(self.effective_volume());
        sink.append(source);
        sink.pause();
        self.sink = Some(sink);
        Ok(duration)
    }

    fn seek(&mut self, position_s: f64) {
        // A drained sink has nothing left to seek in; rebuild it from the
        // current source (paused) so the seek lands on playable audio.
        if self.sink.as_ref().is_none_or(|sink| sink.empty()) {
            let Some(url) = self.source_url.clone() else { return };
            if let Err(message) = self.open_source(&url) {
                tracing::error!(url, error = %message, "rodio source reload failed");
                self.send(MediaEvent::Error { message });
                return;
            }
        }
        let Some(sink) = &self.sink else { return };
        let target = Duration::from_secs_f64(position_s.max(0.0));
        if let Err(e) = sink.try_seek(target) {
            tracing::warn!(position_s, error = %e, "seek not supported for this source");
            return;
        }
        self.ended_sent = false;
        self.send(MediaEvent::TimeUpdate {
            position_s: target.as_secs_f64(),
        });
    }

    fn apply_volume(&self) {
        if let Some(sink) = &self.sink {
            sink.set_volume(self.effective_volume());
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn send(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }
}

fn resolve_path(url: &str) -> PathBuf {
    match url.strip_prefix("file://") {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(url),
    }
}
