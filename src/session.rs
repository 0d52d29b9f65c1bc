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
use std::{collections::BTreeSet, sync::Arc, time::Duration};

use rand::rngs::StdRng;
use tokio::{
    sync::mpsc::{Receiver, Sender},
    task::JoinHandle,
};
use tracing::{debug, error, info, span, warn, Level, Span};

use crate::bridge::Bridge;
use crate::catalog::{Catalog, Sample, SampleId};
use crate::engine::PlaybackState;
use crate::question::{self, Outcome, Question};
use crate::scores::Tracker;
use crate::surface::Action;

/// How long the revealed answer stays on screen before the next round.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(2000);

/// The size of the session event channel.
pub const EVENT_CHANNEL_SIZE: usize = 16;

/// The phase of the quiz session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No round has started yet.
    NewGame,
    /// A question is live and candidate selections are accepted.
    QuestionActive,
    /// The answer has been revealed; selections are rejected until the next
    /// round.
    AnswerRevealed,
    /// The pool is shrinking and the next question is being drawn.
    RoundTransition,
    /// Terminal. Playback and surface resources have been released.
    GameOver,
}

/// Events feeding the session loop.
#[derive(Debug)]
pub enum Event {
    /// The user selected the candidate in the given slot.
    Answer { slot: usize },
    /// The control surface issued a transport action.
    Action(Action),
    /// The playback engine reported a state.
    Engine(PlaybackState),
    /// The reveal timer for the given round fired.
    Advance { round: u64 },
    /// The user quit.
    Shutdown,
}

/// The explicit remaining-pool payload for a continuing game. Scores are
/// always reloaded from the store, never carried here.
pub struct Handoff {
    /// The not-yet-asked sample IDs.
    pub pool: BTreeSet<SampleId>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("sample {0} not found in the catalog")]
    SampleNotFound(SampleId),
}

/// The quiz session: owns the pool, the active question, and the phase, and
/// is the only mutator of any of them. All event sources funnel into one
/// channel consumed by `run`.
pub struct Session {
    /// The sample catalog.
    catalog: Arc<Catalog>,
    /// The score tracker.
    tracker: Tracker,
    /// The playback bridge.
    bridge: Bridge,
    /// Sends events back into the session loop, used by the reveal timer.
    events_tx: Sender<Event>,
    /// How long the reveal lasts before the round transition.
    reveal_delay: Duration,
    /// The random source for question generation.
    rng: StdRng,
    /// The current phase.
    phase: Phase,
    /// The not-yet-asked sample IDs.
    pool: BTreeSet<SampleId>,
    /// The active question, if any.
    question: Option<Question>,
    /// The revealed correct sample, if any.
    revealed: Option<Arc<Sample>>,
    /// The current round number, starting at 1. Guards against stale reveal
    /// timers.
    round: u64,
    /// The number of completed rounds.
    rounds_completed: u64,
    /// The pending reveal timer, aborted on teardown.
    advance: Option<JoinHandle<()>>,
    /// The logging span.
    span: Span,
}

impl Session {
    /// Creates a new session. Nothing happens until `start` is called.
    pub fn new(
        catalog: Arc<Catalog>,
        tracker: Tracker,
        bridge: Bridge,
        reveal_delay: Duration,
        events_tx: Sender<Event>,
        rng: StdRng,
    ) -> Session {
        Session {
            catalog,
            tracker,
            bridge,
            events_tx,
            reveal_delay,
            rng,
            phase: Phase::NewGame,
            pool: BTreeSet::new(),
            question: None,
            revealed: None,
            round: 0,
            rounds_completed: 0,
            advance: None,
            span: span!(Level::INFO, "session"),
        }
    }

    /// Gets the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Gets the score tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Gets the remaining pool.
    pub fn pool(&self) -> &BTreeSet<SampleId> {
        &self.pool
    }

    /// Gets the active question.
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Gets the revealed correct sample.
    pub fn revealed(&self) -> Option<&Arc<Sample>> {
        self.revealed.as_ref()
    }

    /// Gets the current round number.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Gets the number of completed rounds.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    /// Starts the game. With no handoff this is a new game over the full
    /// catalog; with one it continues from the supplied pool, reloading
    /// scores from the store. If the chosen correct sample is missing from
    /// the catalog, initialization aborts with no state mutated.
    pub fn start(&mut self, handoff: Option<Handoff>) -> Result<(), SessionError> {
        let _enter = self.span.clone().entered();

        let (pool, new_game) = match handoff {
            None => (self.catalog.all_ids(), true),
            Some(handoff) => (handoff.pool, false),
        };

        match question::generate(&pool, &mut self.rng) {
            Outcome::EndOfGame => {
                if new_game {
                    self.reset_scores();
                }
                self.pool = pool;
                self.game_over();
                Ok(())
            }
            Outcome::Question(question) => {
                let correct = question.correct();
                let sample = self
                    .catalog
                    .get(correct)
                    .ok_or(SessionError::SampleNotFound(correct))?;

                if new_game {
                    self.reset_scores();
                }
                info!(
                    current = self.tracker.current(),
                    high = self.tracker.high(),
                    pool = pool.len(),
                    new_game,
                    "Session starting."
                );
                self.pool = pool;
                self.activate(question, sample);
                Ok(())
            }
        }
    }

    /// Runs the session loop until game over or shutdown, then returns the
    /// finished session.
    pub async fn run(mut self, mut events_rx: Receiver<Event>) -> Session {
        // The span guard must not be held across an await, so each
        // dispatch enters it on its own.
        self.span.in_scope(|| info!("Session loop started."));

        while self.phase != Phase::GameOver {
            match events_rx.recv().await {
                Some(event) => {
                    self.span
                        .in_scope(|| debug!(event = ?event, "Received event."));
                    self.handle_event(event);
                }
                None => {
                    self.span
                        .in_scope(|| info!("All event sources closed, session closing."));
                    self.teardown();
                    break;
                }
            }
        }

        self.span.in_scope(|| info!("Session loop finished."));
        self
    }

    /// Dispatches one event. Only ever called from the session loop (or
    /// directly in tests), so every transition is serialized.
    pub fn handle_event(&mut self, event: Event) {
        let _enter = self.span.clone().entered();

        match event {
            Event::Answer { slot } => self.on_answer(slot),
            Event::Action(action) => self.bridge.on_action(action),
            Event::Engine(state) => self.bridge.on_engine_state(state),
            Event::Advance { round } => self.on_advance(round),
            Event::Shutdown => self.teardown(),
        }
    }

    /// Tears the session down from any phase: the reveal timer is cancelled
    /// before playback resources go away so it can never touch them.
    pub fn teardown(&mut self) {
        let _enter = self.span.clone().entered();

        self.cancel_advance();
        self.bridge.teardown();
        if self.phase != Phase::GameOver {
            info!(phase = ?self.phase, "Session torn down.");
            self.phase = Phase::GameOver;
        }
    }

    /// Makes the given question the active round.
    fn activate(&mut self, question: Question, sample: Arc<Sample>) {
        self.round += 1;
        info!(
            round = self.round,
            candidates = ?question.candidates(),
            "Question ready."
        );

        self.bridge.begin_round(&sample);
        self.question = Some(question);
        self.revealed = None;
        self.phase = Phase::QuestionActive;
    }

    fn on_answer(&mut self, slot: usize) {
        if self.phase != Phase::QuestionActive {
            // Selections queued before the reveal disabled input still land
            // here; the phase check rejects them so score and pool change at
            // most once per round.
            info!(slot, phase = ?self.phase, "Ignoring selection outside the active question.");
            return;
        }
        let Some(question) = &self.question else {
            return;
        };
        let Some(selected) = question.candidate(slot) else {
            warn!(slot, "Ignoring out-of-range candidate slot.");
            return;
        };

        let correct = question.correct();
        self.phase = Phase::AnswerRevealed;

        if selected == correct {
            match self.tracker.record_correct() {
                Ok(current) => info!(score = current, "Correct answer."),
                Err(e) => error!(err = e.as_ref(), "Error recording score."),
            }
        } else {
            info!(selected, correct, "Wrong answer.");
        }

        let art = self.catalog.composer_art(correct);
        match self.catalog.get(correct) {
            Some(sample) => {
                info!(
                    composer = sample.composer(),
                    title = sample.title(),
                    art = art.as_deref().unwrap_or(""),
                    "Revealing answer."
                );
                self.revealed = Some(sample);
            }
            None => warn!(sample = correct, "No catalog entry to reveal."),
        }

        self.schedule_advance();
    }

    fn on_advance(&mut self, round: u64) {
        if self.phase != Phase::AnswerRevealed || round != self.round {
            debug!(round, current_round = self.round, "Ignoring stale advance.");
            return;
        }

        self.phase = Phase::RoundTransition;
        let Some(question) = self.question.take() else {
            return;
        };

        // Exactly the correct ID leaves the pool, whichever candidate the
        // user picked.
        self.pool.remove(&question.correct());
        self.rounds_completed += 1;
        self.revealed = None;
        self.bridge.end_round();

        match question::generate(&self.pool, &mut self.rng) {
            Outcome::EndOfGame => self.game_over(),
            Outcome::Question(next) => match self.catalog.get(next.correct()) {
                Some(sample) => self.activate(next, sample),
                None => {
                    // The catalog is immutable, so this can only mean the
                    // game was started from a pool that was never valid.
                    error!(sample = next.correct(), "Sample missing mid-game.");
                    self.game_over();
                }
            },
        }
    }

    fn game_over(&mut self) {
        info!(
            score = self.tracker.current(),
            high = self.tracker.high(),
            rounds = self.rounds_completed,
            "Game over."
        );
        self.cancel_advance();
        self.question = None;
        self.revealed = None;
        self.phase = Phase::GameOver;
        self.bridge.teardown();
    }

    fn reset_scores(&mut self) {
        if let Err(e) = self.tracker.reset_current() {
            error!(err = e.as_ref(), "Error resetting current score.");
        }
    }

    fn schedule_advance(&mut self) {
        self.cancel_advance();

        let events_tx = self.events_tx.clone();
        let round = self.round;
        let delay = self.reveal_delay;
        self.advance = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events_tx.send(Event::Advance { round }).await.is_err() {
                debug!(round, "Session gone before the reveal timer fired.");
            }
        }));
    }

    fn cancel_advance(&mut self) {
        if let Some(advance) = self.advance.take() {
            advance.abort();
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        collections::{BTreeSet, HashMap},
        error::Error,
        sync::Arc,
        time::Duration,
    };

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::sync::mpsc::{self, Receiver};

    use crate::bridge::Bridge;
    use crate::catalog::{Catalog, Sample, SampleId};
    use crate::engine::mock as mock_engine;
    use crate::scores::{MemoryStore, Store, Tracker};
    use crate::session::SessionError;
    use crate::surface::{mock as mock_surface, Context};
    use crate::test::eventually;

    use super::{Event, Handoff, Phase, Session};

    struct Fixture {
        session: Session,
        events_rx: Receiver<Event>,
        store: Arc<MemoryStore>,
        engine: Arc<mock_engine::Engine>,
        surface: Arc<mock_surface::Surface>,
    }

    fn new_fixture(ids: &[SampleId], seed: u64, reveal_delay: Duration) -> Fixture {
        let mut samples: HashMap<SampleId, Arc<Sample>> = HashMap::new();
        for id in ids {
            samples.insert(
                *id,
                Arc::new(Sample::new(
                    *id,
                    &format!("Composer {}", id),
                    &format!("Title {}", id),
                    &format!("assets/sample-{}.mp3", id),
                    &format!("art-{}", id),
                )),
            );
        }

        let store = Arc::new(MemoryStore::default());
        let engine = Arc::new(mock_engine::Engine::get("mock-engine"));
        let surface = Arc::new(mock_surface::Surface::get("mock-surface"));
        let bridge = Bridge::new(engine.clone(), Context::new(surface.clone()));
        let (events_tx, events_rx) = mpsc::channel(super::EVENT_CHANNEL_SIZE);

        let session = Session::new(
            Arc::new(Catalog::new(samples)),
            Tracker::new(store.clone()),
            bridge,
            reveal_delay,
            events_tx,
            StdRng::seed_from_u64(seed),
        );

        Fixture {
            session,
            events_rx,
            store,
            engine,
            surface,
        }
    }

    /// The slot holding the correct answer of the active question.
    fn correct_slot(session: &Session) -> usize {
        let question = session.question().expect("expected an active question");
        question
            .candidates()
            .iter()
            .position(|id| *id == question.correct())
            .expect("correct answer must be a candidate")
    }

    /// A slot holding a wrong answer of the active question.
    fn wrong_slot(session: &Session) -> usize {
        let question = session.question().expect("expected an active question");
        question
            .candidates()
            .iter()
            .position(|id| *id != question.correct())
            .expect("expected a distractor")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_game_all_correct() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3, 4, 5], 11, Duration::from_millis(5));
        let session = &mut fixture.session;

        session.start(None)?;
        assert_eq!(Phase::QuestionActive, session.phase());
        assert_eq!(5, session.pool().len());

        for round in 1..=4u64 {
            assert_eq!(round, session.round());
            let slot = correct_slot(session);
            session.handle_event(Event::Answer { slot });
            assert_eq!(Phase::AnswerRevealed, session.phase());
            assert!(session.revealed().is_some());

            session.handle_event(Event::Advance { round });
        }

        assert_eq!(Phase::GameOver, session.phase());
        assert_eq!(4, session.rounds_completed());
        assert_eq!(1, session.pool().len());
        assert_eq!(4, fixture.store.current());
        assert_eq!(4, fixture.store.high());
        assert!(session.question().is_none());
        assert!(!fixture.surface.is_active());
        assert_eq!(4, fixture.engine.loads().len());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_wrong_answer_still_removes_correct_id() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3], 3, Duration::from_millis(5));
        let session = &mut fixture.session;

        session.start(None)?;
        let question = session.question().expect("expected a question").clone();
        let slot = wrong_slot(session);
        let picked = question.candidate(slot).expect("expected a candidate");

        session.handle_event(Event::Answer { slot });
        assert_eq!(Phase::AnswerRevealed, session.phase());
        assert_eq!(0, fixture.store.current());

        session.handle_event(Event::Advance { round: 1 });
        assert!(!session.pool().contains(&question.correct()));
        assert!(session.pool().contains(&picked));
        assert_eq!(2, session.pool().len());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_answer_revealed_rejects_queued_input() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3, 4], 9, Duration::from_millis(5));
        let session = &mut fixture.session;

        session.start(None)?;
        let slot = correct_slot(session);
        let pool_before = session.pool().clone();

        session.handle_event(Event::Answer { slot });
        assert_eq!(1, fixture.store.current());

        // Selections that were already queued when the reveal happened must
        // not score again or touch the pool.
        for queued_slot in 0..4 {
            session.handle_event(Event::Answer { slot: queued_slot });
        }
        assert_eq!(1, fixture.store.current());
        assert_eq!(pool_before, *session.pool());
        assert_eq!(Phase::AnswerRevealed, session.phase());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stale_advance_ignored() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3], 5, Duration::from_millis(5));
        let session = &mut fixture.session;

        session.start(None)?;
        session.handle_event(Event::Answer {
            slot: correct_slot(session),
        });

        // An advance for a round other than the current one is stale.
        session.handle_event(Event::Advance { round: 7 });
        assert_eq!(Phase::AnswerRevealed, session.phase());
        assert_eq!(3, session.pool().len());

        session.handle_event(Event::Advance { round: 1 });
        assert_eq!(Phase::QuestionActive, session.phase());
        assert_eq!(2, session.pool().len());
        Ok(())
    }

    #[test]
    fn test_small_pool_ends_game_without_question() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3], 1, Duration::from_millis(5));
        let session = &mut fixture.session;

        let pool: BTreeSet<SampleId> = [2].into_iter().collect();
        session.start(Some(Handoff { pool }))?;

        assert_eq!(Phase::GameOver, session.phase());
        assert!(session.question().is_none());
        assert!(fixture.engine.loads().is_empty());
        Ok(())
    }

    #[test]
    fn test_continuing_game_reloads_scores_from_store() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3, 4], 2, Duration::from_millis(5));
        fixture.store.set_current(2)?;
        fixture.store.set_high(5)?;

        let pool: BTreeSet<SampleId> = [1, 2, 3].into_iter().collect();
        fixture.session.start(Some(Handoff { pool }))?;

        // The store is the source of truth for a continuing game.
        assert_eq!(Phase::QuestionActive, fixture.session.phase());
        assert_eq!(2, fixture.store.current());
        assert_eq!(5, fixture.store.high());
        Ok(())
    }

    #[test]
    fn test_new_game_resets_current_score() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3, 4], 2, Duration::from_millis(5));
        fixture.store.set_current(2)?;
        fixture.store.set_high(5)?;

        fixture.session.start(None)?;
        assert_eq!(0, fixture.store.current());
        assert_eq!(5, fixture.store.high());
        Ok(())
    }

    #[test]
    fn test_missing_sample_aborts_initialization() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2], 4, Duration::from_millis(5));
        fixture.store.set_current(3)?;

        let pool: BTreeSet<SampleId> = [8, 9].into_iter().collect();
        let result = fixture.session.start(Some(Handoff { pool }));

        assert!(matches!(result, Err(SessionError::SampleNotFound(_))));
        // No state was mutated and playback never started.
        assert_eq!(Phase::NewGame, fixture.session.phase());
        assert!(fixture.session.pool().is_empty());
        assert_eq!(3, fixture.store.current());
        assert!(fixture.engine.loads().is_empty());
        assert!(!fixture.surface.is_active());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reveal_timer_advances_round() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3, 4, 5], 8, Duration::from_millis(20));

        fixture.session.start(None)?;
        let slot = correct_slot(&fixture.session);

        let events_tx = fixture.session.events_tx.clone();
        let handle = tokio::spawn(fixture.session.run(fixture.events_rx));

        events_tx.send(Event::Answer { slot }).await?;
        let store = fixture.store.clone();
        eventually(|| store.current() == 1, "Answer never scored");

        // The timer fires on its own and moves the game to the next round.
        let engine = fixture.engine.clone();
        eventually(|| engine.loads().len() == 2, "Next round never started");

        events_tx.send(Event::Shutdown).await?;
        let session = handle.await?;
        assert_eq!(Phase::GameOver, session.phase());
        assert_eq!(1, session.rounds_completed());
        assert_eq!(4, session.pool().len());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_teardown_cancels_pending_reveal_timer() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3, 4, 5], 8, Duration::from_millis(300));

        fixture.session.start(None)?;
        let slot = correct_slot(&fixture.session);

        let events_tx = fixture.session.events_tx.clone();
        let handle = tokio::spawn(fixture.session.run(fixture.events_rx));

        events_tx.send(Event::Answer { slot }).await?;
        let store = fixture.store.clone();
        eventually(|| store.current() == 1, "Answer never scored");

        // Quit while the reveal timer is still pending.
        events_tx.send(Event::Shutdown).await?;
        let session = handle.await?;
        assert_eq!(Phase::GameOver, session.phase());
        assert_eq!(1, fixture.engine.releases());
        assert_eq!(1, fixture.surface.deactivations());

        // The timer never fires: well past the delay, nothing has touched
        // the released resources and the pool never shrank.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(1, fixture.engine.releases());
        assert_eq!(1, fixture.engine.loads().len());
        assert_eq!(5, session.pool().len());
        assert_eq!(0, session.rounds_completed());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_surface_actions_reach_the_engine() -> Result<(), Box<dyn Error>> {
        let mut fixture = new_fixture(&[1, 2, 3], 6, Duration::from_millis(5));
        let session = &mut fixture.session;

        session.start(None)?;
        session.handle_event(Event::Engine(crate::engine::PlaybackState::Ready));
        session.handle_event(Event::Action(crate::surface::Action::Pause));

        assert_eq!(1, fixture.engine.pauses());
        let published = fixture
            .surface
            .last_published()
            .expect("expected a transport");
        assert_eq!(crate::engine::PlaybackState::Paused, published.state);
        Ok(())
    }
}
