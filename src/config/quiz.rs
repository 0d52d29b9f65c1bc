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
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use crate::session::DEFAULT_REVEAL_DELAY;

use super::engine::Engine;
use super::error::ConfigError;

const DEFAULT_SURFACE: &str = "console";

/// A YAML representation of the quiz configuration.
#[derive(Deserialize)]
pub struct Quiz {
    /// The path to the sample catalog.
    samples: String,
    /// The path to the score file.
    scores: String,
    /// The playback engine to use.
    engine: Engine,
    /// The control surface to use.
    surface: Option<String>,
    /// Controls how long the revealed answer stays up before the next round.
    reveal_delay: Option<String>,
}

impl Quiz {
    /// Parses a quiz configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Quiz, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Quiz>()?)
    }

    /// Returns the path to the sample catalog.
    pub fn samples(&self) -> PathBuf {
        PathBuf::from(&self.samples)
    }

    /// Returns the path to the score file.
    pub fn scores(&self) -> PathBuf {
        PathBuf::from(&self.scores)
    }

    /// Returns the engine configuration.
    pub fn engine(&self) -> Engine {
        self.engine.clone()
    }

    /// Returns the surface from the configuration.
    pub fn surface(&self) -> &str {
        self.surface.as_deref().unwrap_or(DEFAULT_SURFACE)
    }

    /// Returns the reveal delay from the configuration.
    pub fn reveal_delay(&self) -> Result<Duration, Box<dyn Error>> {
        match &self.reveal_delay {
            Some(reveal_delay) => Ok(DurationString::from_string(reveal_delay.clone())?.into()),
            None => Ok(DEFAULT_REVEAL_DELAY),
        }
    }
}
