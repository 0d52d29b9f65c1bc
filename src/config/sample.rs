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
use serde::Deserialize;

use crate::catalog;

/// A YAML representation of a sample definition.
#[derive(Deserialize)]
pub(super) struct Sample {
    /// The sample ID.
    id: u32,
    /// The composer of the piece.
    composer: String,
    /// The title of the piece.
    title: String,
    /// The audio excerpt for this sample.
    uri: String,
    /// The artwork reference for the composer.
    art: String,
}

impl Sample {
    /// Converts the YAML representation into a catalog sample.
    pub(super) fn to_sample(&self) -> catalog::Sample {
        catalog::Sample::new(self.id, &self.composer, &self.title, &self.uri, &self.art)
    }
}
