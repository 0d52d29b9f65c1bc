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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use crate::session::Event;
use crate::surface::Action;

const PLAY: &str = "play";
const PAUSE: &str = "pause";
const RESTART: &str = "restart";
const QUIT: &str = "quit";

/// A driver that takes candidate selections and transport commands from the
/// terminal.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Answer (1-4) or command ({}, {}, {}, {}): ",
            PLAY, PAUSE, RESTART, QUIT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        reader.read_line(&mut input)?;

        let input = input.trim().to_lowercase();
        let event = match input.as_str() {
            PLAY => Some(Event::Action(Action::Play)),
            PAUSE => Some(Event::Action(Action::Pause)),
            RESTART => Some(Event::Action(Action::SkipToPrevious)),
            QUIT => Some(Event::Shutdown),
            _ => match input.parse::<usize>() {
                // Candidate slots are shown 1-indexed.
                Ok(choice) if (1..=4).contains(&choice) => {
                    Some(Event::Answer { slot: choice - 1 })
                }
                _ => {
                    warn!(input = input, "Unrecognized input");
                    None
                }
            },
        };

        if let Some(event) = event {
            events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        }
        Ok(())
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "console driver");
            let _enter = span.enter();

            info!("Console driver started.");

            loop {
                Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())?;
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use crate::session::Event;
    use crate::surface::Action;

    use super::{Driver, PAUSE, PLAY, QUIT, RESTART};

    fn get_event(input: &str) -> Result<Option<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader_bytes = input.as_bytes();
        let reader = BufReader::new(reader_bytes);

        let writer_bytes: Vec<u8> = vec![0; 255];
        let writer = BufWriter::new(writer_bytes);
        Driver::monitor_io(&sender, reader, writer)?;

        // Force the sender to close.
        drop(sender);
        Ok(receiver.blocking_recv())
    }

    #[test]
    fn test_console_events() -> Result<(), io::Error> {
        assert!(matches!(
            get_event(PLAY)?.unwrap(),
            Event::Action(Action::Play)
        ));
        assert!(matches!(
            get_event(PAUSE)?.unwrap(),
            Event::Action(Action::Pause)
        ));
        assert!(matches!(
            get_event(RESTART)?.unwrap(),
            Event::Action(Action::SkipToPrevious)
        ));
        assert!(matches!(get_event(QUIT)?.unwrap(), Event::Shutdown));
        assert!(matches!(
            get_event("1")?.unwrap(),
            Event::Answer { slot: 0 }
        ));
        assert!(matches!(
            get_event("4")?.unwrap(),
            Event::Answer { slot: 3 }
        ));
        assert!(get_event("5")?.is_none());
        assert!(get_event("unrecognized")?.is_none());
        assert!(get_event("0")?.is_none());
        Ok(())
    }
}
