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
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Identifies a sample in the catalog.
pub type SampleId = u32;

/// A quiz sample: one playable excerpt plus the metadata needed to present
/// and reveal it.
pub struct Sample {
    /// The sample ID.
    id: SampleId,
    /// The composer of the piece.
    composer: String,
    /// The title of the piece.
    title: String,
    /// The URI of the audio excerpt.
    uri: String,
    /// A reference to the composer artwork.
    art: String,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(id: SampleId, composer: &str, title: &str, uri: &str, art: &str) -> Sample {
        Sample {
            id,
            composer: composer.to_string(),
            title: title.to_string(),
            uri: uri.to_string(),
            art: art.to_string(),
        }
    }

    /// Gets the sample ID.
    pub fn id(&self) -> SampleId {
        self.id
    }

    /// Gets the composer of the piece.
    pub fn composer(&self) -> &str {
        &self.composer
    }

    /// Gets the title of the piece.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Gets the URI of the audio excerpt.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Gets the artwork reference for the composer.
    pub fn art(&self) -> &str {
        &self.art
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.id, self.composer, self.title)
    }
}

/// A read-only registry of the samples available to the quiz.
pub struct Catalog {
    /// A mapping of the samples in the catalog.
    samples: HashMap<SampleId, Arc<Sample>>,
}

impl Catalog {
    /// Creates a new sample catalog.
    pub fn new(samples: HashMap<SampleId, Arc<Sample>>) -> Catalog {
        Catalog { samples }
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the number of samples in the catalog.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns the IDs of every sample in the catalog.
    pub fn all_ids(&self) -> BTreeSet<SampleId> {
        self.samples.keys().copied().collect()
    }

    /// Gets a sample from the catalog.
    pub fn get(&self, id: SampleId) -> Option<Arc<Sample>> {
        self.samples.get(&id).map(Arc::clone)
    }

    /// Gets the artwork reference for the composer of the given sample.
    pub fn composer_art(&self, id: SampleId) -> Option<String> {
        self.samples.get(&id).map(|sample| sample.art.clone())
    }

    /// Returns a list of the samples in the catalog, sorted by ID.
    pub fn sorted_list(&self) -> Vec<Arc<Sample>> {
        let mut sorted_samples: Vec<Arc<Sample>> = self.samples.values().cloned().collect();
        sorted_samples.sort_by_key(|sample| sample.id);
        sorted_samples
    }
}
