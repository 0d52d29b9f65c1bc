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
use tracing::info;

use crate::engine::PlaybackState;

pub mod console;
pub mod mock;

/// A transport action issued from the control surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Play,
    Pause,
    SkipToPrevious,
}

/// The transport snapshot published to the control surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Transport {
    /// The resolved playback state.
    pub state: PlaybackState,
    /// The actions the surface should offer.
    pub actions: Vec<Action>,
    /// The playback position within the excerpt.
    pub position: Duration,
}

/// An external transport control panel that mirrors playback state and can
/// command it.
pub trait Surface: fmt::Display + Send + Sync {
    /// Publishes a transport snapshot to the surface.
    fn publish(&self, transport: Transport) -> Result<(), Box<dyn Error>>;

    /// Watches the surface for transport actions and sends them to the given
    /// sender.
    fn watch_actions(&self, sender: Sender<Action>) -> Result<(), Box<dyn Error>>;

    /// Stops watching actions.
    fn stop_watch_actions(&self);

    /// Activates or deactivates the surface.
    fn set_active(&self, active: bool);

    /// Clears any pending published state.
    fn clear(&self);
}

/// The process-wide control surface, passed around explicitly. At most one
/// session holds it active: acquiring an already-active context reuses it,
/// and release is idempotent.
pub struct Context {
    surface: Arc<dyn Surface>,
    active: bool,
}

impl Context {
    /// Creates an inactive context around the given surface.
    pub fn new(surface: Arc<dyn Surface>) -> Context {
        Context {
            surface,
            active: false,
        }
    }

    /// Gets the surface.
    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    /// Returns true if the surface is held active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activates the surface, reusing it if it is already active.
    pub fn acquire(&mut self) {
        if self.active {
            return;
        }
        self.surface.set_active(true);
        self.active = true;
        info!(surface = %self.surface, "Control surface acquired.");
    }

    /// Deactivates the surface and clears its published state. A no-op when
    /// the surface is already inactive.
    pub fn release(&mut self) {
        if !self.active {
            return;
        }
        self.surface.stop_watch_actions();
        self.surface.set_active(false);
        self.surface.clear();
        self.active = false;
        info!(surface = %self.surface, "Control surface released.");
    }
}

/// Gets a surface with the given name.
pub fn get_surface(name: &str) -> Arc<dyn Surface> {
    if name.starts_with("mock") {
        return Arc::new(mock::Surface::get(name));
    };

    Arc::new(console::Surface::new())
}
