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
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::mpsc::Sender;

use super::PlaybackState;

/// A mock engine. Doesn't actually play anything; records every call so tests
/// can assert on the exact transport traffic.
#[derive(Clone)]
pub struct Engine {
    name: String,
    loads: Arc<Mutex<Vec<String>>>,
    plays: Arc<Mutex<u32>>,
    pauses: Arc<Mutex<u32>>,
    seeks: Arc<Mutex<Vec<Duration>>>,
    releases: Arc<Mutex<u32>>,
    position: Arc<Mutex<Duration>>,
    subscribers: Arc<Mutex<Vec<Sender<PlaybackState>>>>,
}

impl Engine {
    /// Gets the given mock engine.
    pub fn get(name: &str) -> Engine {
        Engine {
            name: name.to_string(),
            loads: Arc::new(Mutex::new(Vec::new())),
            plays: Arc::new(Mutex::new(0)),
            pauses: Arc::new(Mutex::new(0)),
            seeks: Arc::new(Mutex::new(Vec::new())),
            releases: Arc::new(Mutex::new(0)),
            position: Arc::new(Mutex::new(Duration::ZERO)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reports a state to every subscriber, as the real engine's worker would.
    pub fn report(&self, state: PlaybackState) {
        let subscribers = self
            .subscribers
            .lock()
            .expect("unable to get subscribers lock");
        for subscriber in subscribers.iter() {
            subscriber.try_send(state).expect("error sending state");
        }
    }

    /// Sets the position the engine will report.
    pub fn set_position(&self, position: Duration) {
        *self.position.lock().expect("unable to get position lock") = position;
    }

    /// Gets the URIs loaded so far.
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().expect("unable to get loads lock").clone()
    }

    /// Gets the number of play calls.
    pub fn plays(&self) -> u32 {
        *self.plays.lock().expect("unable to get plays lock")
    }

    /// Gets the number of pause calls.
    pub fn pauses(&self) -> u32 {
        *self.pauses.lock().expect("unable to get pauses lock")
    }

    /// Gets the positions seeked to so far.
    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().expect("unable to get seeks lock").clone()
    }

    /// Gets the number of release calls.
    pub fn releases(&self) -> u32 {
        *self.releases.lock().expect("unable to get releases lock")
    }
}

impl super::Engine for Engine {
    fn load(&self, uri: &str) -> Result<(), Box<dyn Error>> {
        self.loads
            .lock()
            .expect("unable to get loads lock")
            .push(uri.to_string());
        Ok(())
    }

    fn play(&self) -> Result<(), Box<dyn Error>> {
        *self.plays.lock().expect("unable to get plays lock") += 1;
        Ok(())
    }

    fn pause(&self) -> Result<(), Box<dyn Error>> {
        *self.pauses.lock().expect("unable to get pauses lock") += 1;
        Ok(())
    }

    fn seek(&self, position: Duration) -> Result<(), Box<dyn Error>> {
        self.seeks
            .lock()
            .expect("unable to get seeks lock")
            .push(position);
        Ok(())
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
        *self.releases.lock().expect("unable to get releases lock") += 1;
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Engine>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
