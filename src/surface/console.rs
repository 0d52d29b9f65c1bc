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
    io::{self, Write},
    sync::Mutex,
};

use tokio::sync::mpsc::Sender;

use super::{Action, Transport};
use crate::util::duration_minutes_seconds;

/// A control surface rendered on the terminal. Its action side is fed by the
/// console input driver rather than a reader of its own, so watching actions
/// holds no state here.
pub struct Surface {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Surface {
    /// Creates a console surface writing to stdout.
    pub fn new() -> Surface {
        Surface::with_writer(Box::new(io::stdout()))
    }

    /// Creates a console surface with an injected writer.
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Surface {
        Surface {
            writer: Mutex::new(writer),
        }
    }
}

impl super::Surface for Surface {
    fn publish(&self, transport: Transport) -> Result<(), Box<dyn Error>> {
        let actions: Vec<String> = transport
            .actions
            .iter()
            .map(|action| format!("{:?}", action))
            .collect();

        let mut writer = self.writer.lock().expect("unable to get writer lock");
        writeln!(
            writer,
            "[{} @ {}] ({})",
            transport.state,
            duration_minutes_seconds(transport.position),
            actions.join(", "),
        )?;
        writer.flush()?;
        Ok(())
    }

    fn watch_actions(&self, _: Sender<Action>) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn stop_watch_actions(&self) {}

    fn set_active(&self, _: bool) {}

    fn clear(&self) {}
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "console")
    }
}
