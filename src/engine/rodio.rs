// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    error::Error,
    fmt,
    fs::File,
    io::BufReader,
    sync::{mpsc, Arc, Mutex},
    thread,
    time::Duration,
};

use tokio::sync::mpsc::Sender;
use tracing::{error, info, span, warn, Level};

use crate::playsync::CancelHandle;

use super::PlaybackState;

/// How often the worker checks for drained playback and refreshes the
/// reported position.
const WORKER_TICK: Duration = Duration::from_millis(50);

/// Commands handed to the worker thread that owns the output stream.
enum Command {
    Load(String),
    Play,
    Pause,
    Seek(Duration),
    Release,
}

/// A playback engine backed by rodio. The output stream and sink are not
/// sendable across threads, so a dedicated worker owns them and the engine
/// talks to it over a command channel.
pub struct Engine {
    name: String,
    commands: Mutex<mpsc::Sender<Command>>,
    position: Arc<Mutex<Duration>>,
    subscribers: Arc<Mutex<Vec<Sender<PlaybackState>>>>,
    cancel_handle: CancelHandle,
}

impl Engine {
    /// Gets the engine for the system output, spinning up its worker. Fails
    /// if the output stream can't be opened.
    pub fn get(name: &str) -> Result<Engine, Box<dyn Error>> {
        let (commands_tx, commands_rx) = mpsc::channel::<Command>();
        let (started_tx, started_rx) = mpsc::channel::<Result<(), String>>();

        let position = Arc::new(Mutex::new(Duration::ZERO));
        let subscribers: Arc<Mutex<Vec<Sender<PlaybackState>>>> =
            Arc::new(Mutex::new(Vec::new()));
        let cancel_handle = CancelHandle::new();

        {
            let position = position.clone();
            let subscribers = subscribers.clone();
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || {
                Engine::run_worker(commands_rx, started_tx, position, subscribers, cancel_handle)
            });
        }

        started_rx.recv()??;
        info!(device = name, "Playback engine started.");

        Ok(Engine {
            name: name.to_string(),
            commands: Mutex::new(commands_tx),
            position,
            subscribers,
            cancel_handle,
        })
    }

    fn send(&self, command: Command) -> Result<(), Box<dyn Error>> {
        self.commands
            .lock()
            .expect("unable to get command lock")
            .send(command)
            .map_err(|_| "playback engine worker is gone".into())
    }

    fn notify(subscribers: &Arc<Mutex<Vec<Sender<PlaybackState>>>>, state: PlaybackState) {
        let subscribers = subscribers.lock().expect("unable to get subscribers lock");
        for subscriber in subscribers.iter() {
            if subscriber.blocking_send(state).is_err() {
                warn!(state = %state, "Subscriber went away, dropping state report.");
            }
        }
    }

    /// The worker loop. Owns the output stream and the sink for the loaded
    /// excerpt, reports Buffering/Ready/Ended to subscribers, and keeps the
    /// shared position fresh.
    fn run_worker(
        commands: mpsc::Receiver<Command>,
        started_tx: mpsc::Sender<Result<(), String>>,
        position: Arc<Mutex<Duration>>,
        subscribers: Arc<Mutex<Vec<Sender<PlaybackState>>>>,
        cancel_handle: CancelHandle,
    ) {
        let span = span!(Level::INFO, "rodio engine");
        let _enter = span.enter();

        let stream = match rodio::OutputStreamBuilder::open_default_stream() {
            Ok(stream) => {
                let _ = started_tx.send(Ok(()));
                stream
            }
            Err(e) => {
                let _ = started_tx.send(Err(format!("error opening output stream: {}", e)));
                return;
            }
        };

        let mut sink: Option<rodio::Sink> = None;
        // True until a load succeeds and again once the sink drains, so Ended
        // is reported exactly once per excerpt.
        let mut drained = true;

        loop {
            if cancel_handle.is_cancelled() {
                return;
            }

            match commands.recv_timeout(WORKER_TICK) {
                Ok(Command::Load(uri)) => {
                    Engine::notify(&subscribers, PlaybackState::Buffering);

                    if let Some(old) = sink.take() {
                        old.stop();
                    }

                    match File::open(&uri)
                        .map_err(|e| e.to_string())
                        .and_then(|file| {
                            rodio::Decoder::new(BufReader::new(file)).map_err(|e| e.to_string())
                        }) {
                        Ok(source) => {
                            let new_sink = rodio::Sink::connect_new(stream.mixer());
                            new_sink.pause();
                            new_sink.append(source);
                            sink = Some(new_sink);
                            drained = false;
                            *position.lock().expect("unable to get position lock") =
                                Duration::ZERO;

                            info!(uri = uri, "Excerpt loaded.");
                            Engine::notify(&subscribers, PlaybackState::Ready);
                        }
                        Err(e) => {
                            error!(uri = uri, err = e, "Error loading excerpt.");
                            Engine::notify(&subscribers, PlaybackState::Idle);
                        }
                    }
                }
                Ok(Command::Play) => {
                    if let Some(sink) = &sink {
                        sink.play();
                    }
                }
                Ok(Command::Pause) => {
                    if let Some(sink) = &sink {
                        sink.pause();
                    }
                }
                Ok(Command::Seek(seek_position)) => {
                    if let Some(sink) = &sink {
                        if let Err(e) = sink.try_seek(seek_position) {
                            warn!(err = format!("{}", e), "Error seeking in excerpt.");
                        }
                    }
                }
                Ok(Command::Release) => {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    drained = true;
                    *position.lock().expect("unable to get position lock") = Duration::ZERO;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => return,
            }

            if let Some(current) = &sink {
                *position.lock().expect("unable to get position lock") = current.get_pos();
                if !drained && current.empty() {
                    drained = true;
                    Engine::notify(&subscribers, PlaybackState::Ended);
                }
            }
        }
    }
}

impl super::Engine for Engine {
    fn load(&self, uri: &str) -> Result<(), Box<dyn Error>> {
        self.send(Command::Load(uri.to_string()))
    }

    fn play(&self) -> Result<(), Box<dyn Error>> {
        self.send(Command::Play)
    }

    fn pause(&self) -> Result<(), Box<dyn Error>> {
        self.send(Command::Pause)
    }

    fn seek(&self, position: Duration) -> Result<(), Box<dyn Error>> {
        self.send(Command::Seek(position))
    }

    fn position(&self) -> Duration {
        *self.position.lock().expect("unable to get position lock")
    }

    fn subscribe(&self, sender: Sender<PlaybackState>) {
        self.subscribers
            .lock()
            .expect("unable to get subscribers lock")
            .push(sender);
    }

    fn release(&self) {
        // The worker drops the sink; releasing with no excerpt loaded is a
        // no-op there, so this stays idempotent.
        if self.send(Command::Release).is_err() {
            warn!("Playback engine worker already stopped.");
        }
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Engine>, Box<dyn Error>> {
        Err("not a mock engine".into())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel_handle.cancel();
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rodio)", self.name)
    }
}
