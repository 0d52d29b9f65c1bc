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
use std::{sync::Arc, time::Duration};

use tracing::{debug, info, span, warn, Level, Span};

use crate::catalog::Sample;
use crate::engine::{self, PlaybackState};
use crate::surface::{self, Action, Transport};

/// Drives the playback engine for the active round and mirrors its transport
/// state onto the external control surface. Engine trouble is logged and
/// never escalated: the round stays valid even if audio never plays.
pub struct Bridge {
    /// The playback engine.
    engine: Arc<dyn engine::Engine>,
    /// The control surface context, acquired for the session's lifetime.
    context: surface::Context,
    /// Whether playback should resume once the engine reports Ready.
    autoplay: bool,
    /// The last state mirrored from the engine.
    mirror: PlaybackState,
    /// Set once the bridge has been torn down.
    torn_down: bool,
    /// The logging span.
    span: Span,
}

impl Bridge {
    /// Creates a new bridge over the given engine and surface context.
    pub fn new(engine: Arc<dyn engine::Engine>, context: surface::Context) -> Bridge {
        Bridge {
            engine,
            context,
            autoplay: false,
            mirror: PlaybackState::Idle,
            torn_down: false,
            span: span!(Level::INFO, "bridge"),
        }
    }

    /// Gets the last state mirrored from the engine.
    pub fn mirror(&self) -> PlaybackState {
        self.mirror
    }

    /// Starts playback for a round: acquires the surface if needed, loads the
    /// round's excerpt, and plays it with autoplay intention set.
    pub fn begin_round(&mut self, sample: &Sample) {
        let _enter = self.span.enter();

        self.context.acquire();
        self.torn_down = false;

        info!(sample = %sample, "Starting round playback.");
        if let Err(e) = self.engine.load(sample.uri()) {
            warn!(err = e.as_ref(), "Error loading excerpt, round continues.");
        }
        self.autoplay = true;
        if let Err(e) = self.engine.play() {
            warn!(err = e.as_ref(), "Error starting playback, round continues.");
        }
    }

    /// Handles a state report from the engine.
    pub fn on_engine_state(&mut self, state: PlaybackState) {
        let _enter = self.span.enter();

        if self.torn_down {
            debug!(state = %state, "Ignoring engine state after teardown.");
            return;
        }

        match state {
            PlaybackState::Idle | PlaybackState::Buffering => {
                debug!(state = %state, "Engine not ready.");
                self.mirror = state;
            }
            PlaybackState::Ended => {
                // The last published transport stays intact.
                info!("Excerpt finished.");
                self.mirror = PlaybackState::Ended;
            }
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused => {
                self.mirror = if self.autoplay {
                    PlaybackState::Playing
                } else {
                    PlaybackState::Paused
                };
                self.publish();
            }
        }
    }

    /// Handles a transport action issued from the control surface.
    pub fn on_action(&mut self, action: Action) {
        let _enter = self.span.enter();

        if self.torn_down {
            debug!(action = ?action, "Ignoring surface action after teardown.");
            return;
        }

        match action {
            Action::Play => {
                if let Err(e) = self.engine.play() {
                    warn!(err = e.as_ref(), "Error resuming playback.");
                }
                self.autoplay = true;
                self.mirror = PlaybackState::Playing;
                self.publish();
            }
            Action::Pause => {
                if let Err(e) = self.engine.pause() {
                    warn!(err = e.as_ref(), "Error pausing playback.");
                }
                self.autoplay = false;
                self.mirror = PlaybackState::Paused;
                self.publish();
            }
            Action::SkipToPrevious => {
                // Replays the current round's excerpt; never navigates
                // rounds, and the playback state is left as is.
                if let Err(e) = self.engine.seek(Duration::ZERO) {
                    warn!(err = e.as_ref(), "Error restarting excerpt.");
                }
            }
        }
    }

    /// Releases the round's playback resources. The surface stays active
    /// between rounds.
    pub fn end_round(&mut self) {
        let _enter = self.span.enter();

        self.engine.release();
        self.autoplay = false;
        self.mirror = PlaybackState::Idle;
    }

    /// Tears the bridge down: ends the round and releases the surface.
    /// Idempotent.
    pub fn teardown(&mut self) {
        let _enter = self.span.enter();

        if self.torn_down {
            return;
        }
        self.torn_down = true;
        drop(_enter);

        self.end_round();
        let _enter = self.span.enter();
        self.context.release();
        info!("Bridge torn down.");
    }

    fn publish(&self) {
        let transport = Transport {
            state: self.mirror,
            actions: vec![Action::Play, Action::Pause, Action::SkipToPrevious],
            position: self.engine.position(),
        };
        if let Err(e) = self.context.surface().publish(transport) {
            warn!(err = e.as_ref(), "Error publishing transport state.");
        }
    }
}
