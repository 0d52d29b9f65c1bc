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
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tokio::sync::mpsc::Sender;

use super::{Action, Transport};

/// A mock surface. Records everything published to it and lets tests inject
/// transport actions.
#[derive(Clone)]
pub struct Surface {
    name: String,
    active: Arc<AtomicBool>,
    published: Arc<Mutex<Vec<Transport>>>,
    activations: Arc<Mutex<u32>>,
    deactivations: Arc<Mutex<u32>>,
    clears: Arc<Mutex<u32>>,
    actions_tx: Arc<Mutex<Option<Sender<Action>>>>,
}

impl Surface {
    /// Gets the given mock surface.
    pub fn get(name: &str) -> Surface {
        Surface {
            name: name.to_string(),
            active: Arc::new(AtomicBool::new(false)),
            published: Arc::new(Mutex::new(Vec::new())),
            activations: Arc::new(Mutex::new(0)),
            deactivations: Arc::new(Mutex::new(0)),
            clears: Arc::new(Mutex::new(0)),
            actions_tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects an action as if the user had tapped the surface.
    pub fn mock_action(&self, action: Action) {
        let actions_tx = self.actions_tx.lock().expect("unable to get actions lock");
        actions_tx
            .as_ref()
            .expect("no action watcher registered")
            .try_send(action)
            .expect("error sending action");
    }

    /// Returns true if the surface is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Gets every transport published so far.
    pub fn published(&self) -> Vec<Transport> {
        self.published
            .lock()
            .expect("unable to get published lock")
            .clone()
    }

    /// Gets the most recently published transport.
    pub fn last_published(&self) -> Option<Transport> {
        self.published
            .lock()
            .expect("unable to get published lock")
            .last()
            .cloned()
    }

    /// Gets the number of activations.
    pub fn activations(&self) -> u32 {
        *self
            .activations
            .lock()
            .expect("unable to get activations lock")
    }

    /// Gets the number of deactivations.
    pub fn deactivations(&self) -> u32 {
        *self
            .deactivations
            .lock()
            .expect("unable to get deactivations lock")
    }

    /// Gets the number of clear calls.
    pub fn clears(&self) -> u32 {
        *self.clears.lock().expect("unable to get clears lock")
    }
}

impl super::Surface for Surface {
    fn publish(&self, transport: Transport) -> Result<(), Box<dyn Error>> {
        self.published
            .lock()
            .expect("unable to get published lock")
            .push(transport);
        Ok(())
    }

    fn watch_actions(&self, sender: Sender<Action>) -> Result<(), Box<dyn Error>> {
        let mut actions_tx = self.actions_tx.lock().expect("unable to get actions lock");
        if actions_tx.is_some() {
            return Err("Already watching actions.".into());
        }
        *actions_tx = Some(sender);
        Ok(())
    }

    fn stop_watch_actions(&self) {
        *self.actions_tx.lock().expect("unable to get actions lock") = None;
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
        if active {
            *self
                .activations
                .lock()
                .expect("unable to get activations lock") += 1;
        } else {
            *self
                .deactivations
                .lock()
                .expect("unable to get deactivations lock") += 1;
        }
    }

    fn clear(&self) {
        *self.clears.lock().expect("unable to get clears lock") += 1;
        self.published
            .lock()
            .expect("unable to get published lock")
            .clear();
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
