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
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Persistent storage for the current and high score.
pub trait Store: Send + Sync {
    /// Gets the current score.
    fn current(&self) -> u32;

    /// Sets the current score.
    fn set_current(&self, score: u32) -> Result<(), Box<dyn Error>>;

    /// Gets the high score.
    fn high(&self) -> u32;

    /// Sets the high score.
    fn set_high(&self, score: u32) -> Result<(), Box<dyn Error>>;
}

/// The persisted score values.
#[derive(Default, Deserialize, Serialize)]
struct State {
    /// The current score.
    current: u32,
    /// The high score.
    high: u32,
}

/// A score store backed by a YAML file. Reads are served from memory; every
/// write rewrites the file.
pub struct FileStore {
    /// The path to the score file.
    path: PathBuf,
    /// The cached score values.
    state: Mutex<State>,
}

impl FileStore {
    /// Opens the store, reading any previously persisted scores.
    pub fn open(path: &Path) -> Result<FileStore, Box<dyn Error>> {
        let state = if path.exists() {
            serde_yml::from_str(&fs::read_to_string(path)?)?
        } else {
            State::default()
        };

        Ok(FileStore {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &State) -> Result<(), Box<dyn Error>> {
        fs::write(&self.path, serde_yml::to_string(state)?)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn current(&self) -> u32 {
        self.state.lock().expect("unable to get state lock").current
    }

    fn set_current(&self, score: u32) -> Result<(), Box<dyn Error>> {
        let mut state = self.state.lock().expect("unable to get state lock");
        state.current = score;
        self.persist(&state)
    }

    fn high(&self) -> u32 {
        self.state.lock().expect("unable to get state lock").high
    }

    fn set_high(&self, score: u32) -> Result<(), Box<dyn Error>> {
        let mut state = self.state.lock().expect("unable to get state lock");
        state.high = score;
        self.persist(&state)
    }
}

/// An in-memory score store.
#[derive(Default)]
pub struct MemoryStore {
    /// The score values.
    state: Mutex<State>,
}

impl Store for MemoryStore {
    fn current(&self) -> u32 {
        self.state.lock().expect("unable to get state lock").current
    }

    fn set_current(&self, score: u32) -> Result<(), Box<dyn Error>> {
        self.state.lock().expect("unable to get state lock").current = score;
        Ok(())
    }

    fn high(&self) -> u32 {
        self.state.lock().expect("unable to get state lock").high
    }

    fn set_high(&self, score: u32) -> Result<(), Box<dyn Error>> {
        self.state.lock().expect("unable to get state lock").high = score;
        Ok(())
    }
}

/// Applies the score update rules on top of a store. The high score only ever
/// moves up.
#[derive(Clone)]
pub struct Tracker {
    /// The backing store.
    store: Arc<dyn Store>,
}

impl Tracker {
    /// Creates a new tracker backed by the given store.
    pub fn new(store: Arc<dyn Store>) -> Tracker {
        Tracker { store }
    }

    /// Records a correct answer and returns the new current score.
    pub fn record_correct(&self) -> Result<u32, Box<dyn Error>> {
        let current = self.store.current() + 1;
        self.store.set_current(current)?;

        if current > self.store.high() {
            info!(score = current, "New high score.");
            self.store.set_high(current)?;
        }

        Ok(current)
    }

    /// Starts a new game. The high score survives.
    pub fn reset_current(&self) -> Result<(), Box<dyn Error>> {
        self.store.set_current(0)
    }

    /// Gets the current score.
    pub fn current(&self) -> u32 {
        self.store.current()
    }

    /// Gets the high score.
    pub fn high(&self) -> u32 {
        self.store.high()
    }
}
