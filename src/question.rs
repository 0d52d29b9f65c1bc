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
use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::SampleId;

/// The maximum number of candidates presented per question.
pub const MAX_CANDIDATES: usize = 4;

/// A single quiz question: candidates in presentation order, one of them
/// correct. Selections are resolved by slot index.
#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    /// The candidate samples, in presentation order.
    candidates: Vec<SampleId>,
    /// The correct answer.
    correct: SampleId,
}

impl Question {
    /// Gets the candidates in presentation order.
    pub fn candidates(&self) -> &[SampleId] {
        &self.candidates
    }

    /// Gets the candidate in the given slot, if any.
    pub fn candidate(&self, slot: usize) -> Option<SampleId> {
        self.candidates.get(slot).copied()
    }

    /// Gets the correct answer.
    pub fn correct(&self) -> SampleId {
        self.correct
    }
}

/// The outcome of drawing a question from the remaining pool.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The next question to present.
    Question(Question),
    /// The pool has no distractor left, so the game is over.
    EndOfGame,
}

/// Draws the next question from the pool: up to four distinct candidates in
/// shuffled order, with one of them marked correct uniformly at random. Pools
/// with fewer than two samples end the game.
pub fn generate(pool: &BTreeSet<SampleId>, rng: &mut impl Rng) -> Outcome {
    if pool.len() < 2 {
        return Outcome::EndOfGame;
    }

    let mut candidates: Vec<SampleId> = pool.iter().copied().collect();
    candidates.shuffle(rng);
    candidates.truncate(MAX_CANDIDATES);
    let correct = candidates[rng.gen_range(0..candidates.len())];

    Outcome::Question(Question {
        candidates,
        correct,
    })
}

#[cfg(test)]
mod test {
    use std::cmp;
    use std::collections::BTreeSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{generate, Outcome, MAX_CANDIDATES};
    use crate::catalog::SampleId;

    #[test]
    fn test_generate_bounds() {
        for seed in 0..50 {
            for size in 2..=8u32 {
                let pool: BTreeSet<SampleId> = (1..=size).collect();
                let mut rng = StdRng::seed_from_u64(seed);

                match generate(&pool, &mut rng) {
                    Outcome::Question(question) => {
                        let candidates = question.candidates();
                        assert_eq!(cmp::min(MAX_CANDIDATES, size as usize), candidates.len());

                        let distinct: BTreeSet<SampleId> = candidates.iter().copied().collect();
                        assert_eq!(
                            candidates.len(),
                            distinct.len(),
                            "candidates must be distinct"
                        );
                        assert!(distinct.is_subset(&pool), "candidates must come from the pool");
                        assert!(
                            candidates.contains(&question.correct()),
                            "correct answer must be a candidate"
                        );
                    }
                    Outcome::EndOfGame => {
                        panic!("expected a question for pool size {}", size)
                    }
                }
            }
        }
    }

    #[test]
    fn test_generate_end_of_game() {
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(Outcome::EndOfGame, generate(&BTreeSet::new(), &mut rng));

        let pool: BTreeSet<SampleId> = [7].into_iter().collect();
        assert_eq!(Outcome::EndOfGame, generate(&pool, &mut rng));
    }

    #[test]
    fn test_generate_deterministic() {
        let pool: BTreeSet<SampleId> = (1..=10).collect();

        let first = generate(&pool, &mut StdRng::seed_from_u64(7));
        let second = generate(&pool, &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_slots() {
        let pool: BTreeSet<SampleId> = (1..=6).collect();
        let mut rng = StdRng::seed_from_u64(3);

        match generate(&pool, &mut rng) {
            Outcome::Question(question) => {
                for (slot, id) in question.candidates().iter().enumerate() {
                    assert_eq!(Some(*id), question.candidate(slot));
                }
                assert_eq!(None, question.candidate(MAX_CANDIDATES));
            }
            Outcome::EndOfGame => panic!("expected a question"),
        }
    }
}
