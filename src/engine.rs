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
use std::{error::Error, fmt, sync::Arc, time::Duration};

use tokio::sync::mpsc::Sender;

use crate::config;

pub mod mock;
pub mod rodio;

/// The transport state of a playback engine. Engines report the raw states
/// (Idle, Buffering, Ready, Ended); the bridge resolves Ready into Playing or
/// Paused using its autoplay intention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Buffering,
    Ready,
    Playing,
    Paused,
    Ended,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Buffering => write!(f, "buffering"),
            PlaybackState::Ready => write!(f, "ready"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Ended => write!(f, "ended"),
        }
    }
}

/// A playback engine that can decode and render one audio excerpt at a time.
/// Engines may run their own decode/buffer workers internally; those surface
/// only through the subscription channel.
pub trait Engine: fmt::Display + Send + Sync {
    /// Loads the excerpt at the given URI, replacing any prior excerpt.
    fn load(&self, uri: &str) -> Result<(), Box<dyn Error>>;

    /// Starts or resumes playback of the loaded excerpt.
    fn play(&self) -> Result<(), Box<dyn Error>>;

    /// Pauses playback of the loaded excerpt.
    fn pause(&self) -> Result<(), Box<dyn Error>>;

    /// Seeks within the loaded excerpt.
    fn seek(&self, position: Duration) -> Result<(), Box<dyn Error>>;

    /// Returns the playback position within the loaded excerpt.
    fn position(&self) -> Duration;

    /// Subscribes to state reports from the engine.
    fn subscribe(&self, sender: Sender<PlaybackState>);

    /// Releases the engine's playback resources. Idempotent.
    fn release(&self);

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Engine>, Box<dyn Error>>;
}

/// Gets an engine for the configured device name.
pub fn get_engine(config: Option<config::Engine>) -> Result<Arc<dyn Engine>, Box<dyn Error>> {
    let config = match config {
        Some(config) => config,
        None => return Err("there must be a playback engine specified".into()),
    };

    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Engine::get(device)));
    };

    Ok(Arc::new(rodio::Engine::get(device)?))
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use tokio::sync::mpsc;

    use crate::config;

    use super::{get_engine, mock, Engine as _, PlaybackState};

    #[test]
    fn test_get_engine_requires_config() {
        assert!(get_engine(None).is_err());
    }

    #[test]
    fn test_get_engine_selects_mock_by_prefix() -> Result<(), Box<dyn Error>> {
        let engine = get_engine(Some(config::Engine::new("mock-device")))?;
        engine.to_mock()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_engine_reports_to_subscribers() {
        let engine = mock::Engine::get("mock-engine");
        let (state_tx, mut state_rx) = mpsc::channel(4);
        engine.subscribe(state_tx);

        engine.report(PlaybackState::Buffering);
        engine.report(PlaybackState::Ready);
        assert_eq!(Some(PlaybackState::Buffering), state_rx.recv().await);
        assert_eq!(Some(PlaybackState::Ready), state_rx.recv().await);
    }
}
