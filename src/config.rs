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
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::{Catalog, Sample, SampleId};
use crate::input::Driver as _;
use crate::{bridge, input, scores, session};

mod engine;
mod error;
mod quiz;
mod sample;

pub use self::engine::Engine;
pub use self::error::ConfigError;
pub use self::quiz::Quiz;

/// Parses a sample catalog from a multi-document YAML file.
pub fn parse_catalog(file: &PathBuf) -> Result<Catalog, Box<dyn Error>> {
    let mut samples: HashMap<SampleId, Arc<Sample>> = HashMap::new();

    for document in serde_yml::Deserializer::from_str(&fs::read_to_string(file)?) {
        let sample = match sample::Sample::deserialize(document) {
            Ok(sample) => sample.to_sample(),
            Err(e) => return Err(format!("error parsing file {}: {}", file.display(), e).into()),
        };

        if samples.insert(sample.id(), Arc::new(sample)).is_some() {
            return Err(format!("duplicate sample ID in {}", file.display()).into());
        }
    }

    Ok(Catalog::new(samples))
}

/// Initializes a quiz session from the given config file and returns the
/// handle of its running loop: catalog, score store, playback engine,
/// control surface, bridge, and the console input driver, all wired into
/// the session's event channel.
pub fn init_session(config_path: &PathBuf) -> Result<JoinHandle<session::Session>, Box<dyn Error>> {
    let quiz = Quiz::deserialize(config_path)?;

    let catalog = Arc::new(parse_catalog(&quiz.samples())?);
    let store: Arc<dyn scores::Store> = Arc::new(scores::FileStore::open(&quiz.scores())?);
    let tracker = scores::Tracker::new(store);

    let engine = crate::engine::get_engine(Some(quiz.engine()))?;
    let surface = crate::surface::get_surface(quiz.surface());
    let context = crate::surface::Context::new(surface.clone());

    let (events_tx, events_rx) = mpsc::channel(session::EVENT_CHANNEL_SIZE);

    // Engine state reports feed the session loop.
    let (engine_tx, mut engine_rx) = mpsc::channel(session::EVENT_CHANNEL_SIZE);
    engine.subscribe(engine_tx);
    {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            while let Some(state) = engine_rx.recv().await {
                if events_tx.send(session::Event::Engine(state)).await.is_err() {
                    return;
                }
            }
        });
    }

    // So do actions issued on the control surface.
    let (actions_tx, mut actions_rx) = mpsc::channel(session::EVENT_CHANNEL_SIZE);
    surface.watch_actions(actions_tx)?;
    {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            while let Some(action) = actions_rx.recv().await {
                if events_tx
                    .send(session::Event::Action(action))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        });
    }

    // And the console: answers, transport commands, quit.
    input::console::Driver::new().monitor_events(events_tx.clone());

    let bridge = bridge::Bridge::new(engine, context);
    let mut session = session::Session::new(
        catalog,
        tracker,
        bridge,
        quiz.reveal_delay()?,
        events_tx,
        StdRng::from_entropy(),
    );
    session.start(None)?;

    Ok(tokio::spawn(session.run(events_rx)))
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{parse_catalog, Quiz};

    #[test]
    fn test_parse_catalog() -> Result<(), Box<dyn Error>> {
        let catalog = parse_catalog(&PathBuf::from("assets/samples.yaml"))?;

        assert_eq!(5, catalog.len());
        let sample = catalog.get(1).expect("expected sample 1");
        assert_eq!("Johannes Brahms", sample.composer());
        assert_eq!("Hungarian Dance No. 5", sample.title());
        assert_eq!("assets/excerpts/hungarian_dance_no_5.mp3", sample.uri());
        assert_eq!("brahms", sample.art());
        Ok(())
    }

    #[test]
    fn test_quiz_config() -> Result<(), Box<dyn Error>> {
        let quiz = Quiz::deserialize(&PathBuf::from("assets/quiz.yaml"))?;

        assert_eq!(PathBuf::from("assets/samples.yaml"), quiz.samples());
        assert_eq!(PathBuf::from("assets/scores.yaml"), quiz.scores());
        assert_eq!("default", quiz.engine().device());
        assert_eq!("console", quiz.surface());
        assert_eq!(Duration::from_millis(2000), quiz.reveal_delay()?);
        Ok(())
    }
}
