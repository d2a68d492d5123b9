use std::time::Duration;

use rand::Rng;

use crate::catalog::{Collection, Frame};
use crate::clock::{Clock, SystemClock};
use crate::error::{IndexKind, PuzzleError, RestoreError};
use crate::shuffle::{is_permutation, shuffle_display_order};
use crate::snapshot::{SessionSnapshot, SESSION_SNAPSHOT_VERSION};
use crate::stats::{SessionStats, StatsSnapshot, Verification};

pub const DEFAULT_GUESS_POSITION: usize = 0;

/// Slot `i` shows the frame whose canonical index is `display_order[i]`; a
/// slot is correct when the guessed position equals that index.
#[derive(Clone, Debug)]
pub struct PuzzleSession<T, C = SystemClock> {
    collection: Collection<T>,
    display_order: Vec<usize>,
    guess: Vec<usize>,
    verification: Option<Verification>,
    verification_stale: bool,
    stats: SessionStats,
    clock: C,
}

impl<T> PuzzleSession<T, SystemClock> {
    pub fn start<R: Rng + ?Sized>(
        collection: Collection<T>,
        rng: &mut R,
    ) -> Result<Self, PuzzleError> {
        Self::start_with_clock(collection, rng, SystemClock::new())
    }
}

impl<T, C: Clock> PuzzleSession<T, C> {
    pub fn start_with_clock<R: Rng + ?Sized>(
        collection: Collection<T>,
        rng: &mut R,
        clock: C,
    ) -> Result<Self, PuzzleError> {
        ensure_not_empty(&collection)?;
        let display_order = shuffle_display_order(collection.len(), rng);
        Ok(Self::assemble(collection, display_order, clock))
    }

    pub fn with_display_order(
        collection: Collection<T>,
        display_order: Vec<usize>,
        clock: C,
    ) -> Result<Self, PuzzleError> {
        ensure_not_empty(&collection)?;
        if display_order.len() != collection.len() {
            return Err(PuzzleError::InvalidInput(format!(
                "display order has {} slots but the collection has {} frames",
                display_order.len(),
                collection.len()
            )));
        }
        if !is_permutation(&display_order) {
            return Err(PuzzleError::InvalidInput(
                "display order is not a permutation".to_string(),
            ));
        }
        Ok(Self::assemble(collection, display_order, clock))
    }

    fn assemble(collection: Collection<T>, display_order: Vec<usize>, clock: C) -> Self {
        let total = display_order.len();
        let stats = SessionStats::new(clock.now_ms());
        Self {
            collection,
            display_order,
            guess: vec![DEFAULT_GUESS_POSITION; total],
            verification: None,
            verification_stale: false,
            stats,
            clock,
        }
    }

    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let total = self.collection.len();
        self.display_order = shuffle_display_order(total, rng);
        self.guess = vec![DEFAULT_GUESS_POSITION; total];
        self.verification = None;
        self.verification_stale = false;
        self.stats = SessionStats::new(self.clock.now_ms());
    }

    /// Returns whether the slot changed. A stored verification is kept but
    /// flagged stale when it does.
    pub fn set_guess(&mut self, slot: usize, position: usize) -> Result<bool, PuzzleError> {
        let total = self.frame_count();
        if slot >= total {
            return Err(PuzzleError::out_of_range(IndexKind::Slot, slot, total));
        }
        if position >= total {
            return Err(PuzzleError::out_of_range(IndexKind::Position, position, total));
        }
        let current = &mut self.guess[slot];
        if *current == position {
            return Ok(false);
        }
        *current = position;
        self.mark_stale();
        Ok(true)
    }

    pub fn set_guesses(&mut self, positions: &[usize]) -> Result<bool, PuzzleError> {
        let total = self.frame_count();
        if positions.len() != total {
            return Err(PuzzleError::InvalidInput(format!(
                "expected {} positions, got {}",
                total,
                positions.len()
            )));
        }
        if let Some(&position) = positions.iter().find(|&&position| position >= total) {
            return Err(PuzzleError::out_of_range(IndexKind::Position, position, total));
        }
        if self.guess == positions {
            return Ok(false);
        }
        self.guess.copy_from_slice(positions);
        self.mark_stale();
        Ok(true)
    }

    fn mark_stale(&mut self) {
        if self.verification.is_some() {
            self.verification_stale = true;
        }
    }

    /// Scores the current guess. Every call counts as an attempt, even when
    /// the guess has not changed since the previous one.
    pub fn verify(&mut self) -> Verification {
        let verification = Verification::from_results(score(&self.guess, &self.display_order));
        self.stats.record(verification.correct_count);
        self.verification = Some(verification.clone());
        self.verification_stale = false;
        verification
    }

    pub fn stats(&self) -> StatsSnapshot {
        let elapsed_ms = self.clock.now_ms().saturating_sub(self.stats.started_at_ms);
        StatsSnapshot {
            attempts: self.stats.attempts,
            elapsed: Duration::from_millis(elapsed_ms),
            average: self.stats.average(),
            best_score: self.stats.best_score,
            total_correct: self.stats.total_correct,
            frame_count: self.frame_count(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.display_order.len()
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub fn display_order(&self) -> &[usize] {
        &self.display_order
    }

    pub fn guess(&self) -> &[usize] {
        &self.guess
    }

    pub fn verification(&self) -> Option<&Verification> {
        self.verification.as_ref()
    }

    pub fn is_verification_stale(&self) -> bool {
        self.verification_stale
    }

    pub fn is_solved(&self) -> bool {
        !self.verification_stale
            && self
                .verification
                .as_ref()
                .map(Verification::is_complete)
                .unwrap_or(false)
    }

    pub fn slot_frame(&self, slot: usize) -> Option<&Frame<T>> {
        let canonical = *self.display_order.get(slot)?;
        self.collection.frame(canonical)
    }

    pub fn slot_frames(&self) -> impl Iterator<Item = &Frame<T>> + '_ {
        self.display_order
            .iter()
            .filter_map(|&canonical| self.collection.frame(canonical))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SESSION_SNAPSHOT_VERSION,
            collection: self.collection.name().to_string(),
            display_order: to_u32_vec(&self.display_order),
            guess: to_u32_vec(&self.guess),
            verification: self
                .verification
                .as_ref()
                .map(|verification| verification.results.clone()),
            verification_stale: self.verification_stale,
            attempts: self.stats.attempts,
            total_correct: self.stats.total_correct,
            best_score: u32::try_from(self.stats.best_score).unwrap_or(u32::MAX),
            started_at_ms: self.stats.started_at_ms,
        }
    }

    pub fn restore(
        collection: Collection<T>,
        snapshot: &SessionSnapshot,
        clock: C,
    ) -> Result<Self, RestoreError> {
        if snapshot.version != SESSION_SNAPSHOT_VERSION {
            return Err(RestoreError::Version {
                found: snapshot.version,
                expected: SESSION_SNAPSHOT_VERSION,
            });
        }
        if snapshot.collection != collection.name() {
            return Err(RestoreError::Collection {
                found: snapshot.collection.clone(),
                expected: collection.name().to_string(),
            });
        }
        let total = collection.len();
        if total == 0 || snapshot.display_order.len() != total {
            return Err(RestoreError::FrameCount {
                found: snapshot.display_order.len(),
                expected: total,
            });
        }
        if snapshot.guess.len() != total {
            return Err(RestoreError::Corrupt("guess length"));
        }
        let display_order = from_u32_vec(&snapshot.display_order);
        if !is_permutation(&display_order) {
            return Err(RestoreError::Corrupt("display order is not a permutation"));
        }
        let guess = from_u32_vec(&snapshot.guess);
        if guess.iter().any(|&position| position >= total) {
            return Err(RestoreError::Corrupt("guess position out of range"));
        }
        let verification = match &snapshot.verification {
            Some(results) if results.len() != total => {
                return Err(RestoreError::Corrupt("verification length"));
            }
            Some(results) => Some(Verification::from_results(results.clone())),
            None => None,
        };
        let best_score = snapshot.best_score as usize;
        if best_score > total
            || snapshot.total_correct > u64::from(snapshot.attempts) * total as u64
        {
            return Err(RestoreError::Corrupt("scores exceed frame count"));
        }
        if snapshot.attempts == 0 && (verification.is_some() || best_score > 0) {
            return Err(RestoreError::Corrupt("result recorded without an attempt"));
        }
        let verification_stale = snapshot.verification_stale && verification.is_some();
        if let Some(verification) = &verification {
            if verification.correct_count > best_score {
                return Err(RestoreError::Corrupt("last result beats best score"));
            }
            if !verification_stale && verification.results != score(&guess, &display_order) {
                return Err(RestoreError::Corrupt("result does not match guess"));
            }
        }
        Ok(Self {
            collection,
            display_order,
            guess,
            verification,
            verification_stale,
            stats: SessionStats {
                attempts: snapshot.attempts,
                total_correct: snapshot.total_correct,
                best_score,
                started_at_ms: snapshot.started_at_ms,
            },
            clock,
        })
    }
}

fn ensure_not_empty<T>(collection: &Collection<T>) -> Result<(), PuzzleError> {
    if collection.is_empty() {
        return Err(PuzzleError::InvalidInput(format!(
            "no frames found for '{}'",
            collection.name()
        )));
    }
    Ok(())
}

fn score(guess: &[usize], display_order: &[usize]) -> Vec<bool> {
    guess
        .iter()
        .zip(display_order)
        .map(|(guess, actual)| guess == actual)
        .collect()
}

fn to_u32_vec(values: &[usize]) -> Vec<u32> {
    values
        .iter()
        .map(|&value| u32::try_from(value).unwrap_or(u32::MAX))
        .collect()
}

fn from_u32_vec(values: &[u32]) -> Vec<usize> {
    values.iter().map(|&value| value as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn session_with_order(order: &[usize]) -> (PuzzleSession<char, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000);
        let images = "abcdefghij".chars().take(order.len()).collect();
        let collection = Collection::from_images("movie", images);
        let session = PuzzleSession::with_display_order(collection, order.to_vec(), clock.clone())
            .expect("session");
        (session, clock)
    }

    #[test]
    fn new_puzzle_defaults_every_slot_to_zero() {
        let (session, _clock) = session_with_order(&[2, 0, 3, 1]);
        assert_eq!(session.guess(), &[0, 0, 0, 0]);
        assert!(session.verification().is_none());
        assert!(!session.is_verification_stale());
        let stats = session.stats();
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.best_score, 0);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.frame_count, 4);
    }

    #[test]
    fn slot_frame_follows_display_order() {
        let (session, _clock) = session_with_order(&[2, 0, 3, 1]);
        let shown: Vec<char> = session.slot_frames().map(|frame| frame.image).collect();
        assert_eq!(shown, vec!['c', 'a', 'd', 'b']);
        assert_eq!(session.slot_frame(0).map(|frame| frame.index), Some(2));
        assert!(session.slot_frame(4).is_none());
    }

    #[test]
    fn set_guess_reports_changes_and_marks_result_stale() {
        let (mut session, _clock) = session_with_order(&[2, 0, 3, 1]);
        assert_eq!(session.set_guess(0, 0), Ok(false));
        assert!(!session.is_verification_stale());
        assert_eq!(session.set_guess(0, 2), Ok(true));
        assert!(!session.is_verification_stale());

        let before = session.verify();
        assert_eq!(before.results, vec![true, true, false, false]);
        assert_eq!(before.correct_count, 2);
        assert_eq!(session.set_guess(1, 3), Ok(true));
        assert!(session.is_verification_stale());
        assert_eq!(session.verification(), Some(&before));

        session.verify();
        assert!(!session.is_verification_stale());
    }

    #[test]
    fn set_guess_rejects_out_of_range() {
        let (mut session, _clock) = session_with_order(&[2, 0, 3, 1]);
        assert_eq!(
            session.set_guess(5, 0),
            Err(PuzzleError::IndexOutOfRange {
                kind: IndexKind::Slot,
                index: 5,
                len: 4
            })
        );
        assert_eq!(
            session.set_guess(0, 4),
            Err(PuzzleError::IndexOutOfRange {
                kind: IndexKind::Position,
                index: 4,
                len: 4
            })
        );
        assert_eq!(session.guess(), &[0, 0, 0, 0]);
    }

    #[test]
    fn set_guesses_is_all_or_nothing() {
        let (mut session, _clock) = session_with_order(&[2, 0, 3, 1]);
        assert!(matches!(
            session.set_guesses(&[1, 2, 3]),
            Err(PuzzleError::InvalidInput(_))
        ));
        assert!(matches!(
            session.set_guesses(&[1, 2, 3, 9]),
            Err(PuzzleError::IndexOutOfRange { index: 9, .. })
        ));
        assert_eq!(session.guess(), &[0, 0, 0, 0]);
        assert_eq!(session.set_guesses(&[2, 0, 3, 1]), Ok(true));
        assert_eq!(session.set_guesses(&[2, 0, 3, 1]), Ok(false));
        assert!(session.verify().is_complete());
        assert!(session.is_solved());
    }

    #[test]
    fn verify_counts_every_call_as_an_attempt() {
        let (mut session, _clock) = session_with_order(&[2, 0, 3, 1]);
        session.set_guesses(&[2, 0, 1, 1]).expect("guess");
        let first = session.verify();
        let second = session.verify();
        assert_eq!(first, second);
        assert_eq!(first.results, vec![true, true, false, true]);
        let stats = session.stats();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.total_correct, 6);
        assert_eq!(stats.best_score, 3);
        assert!((stats.average - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stale_result_is_not_solved() {
        let (mut session, _clock) = session_with_order(&[1, 0]);
        session.set_guesses(&[1, 0]).expect("guess");
        assert!(session.verify().is_complete());
        assert!(session.is_solved());
        session.set_guess(0, 0).expect("guess");
        assert!(!session.is_solved());
    }

    #[test]
    fn restart_resets_everything_but_the_collection() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let (mut session, clock) = session_with_order(&[2, 0, 3, 1]);
        session.set_guesses(&[2, 0, 3, 1]).expect("guess");
        session.verify();
        clock.advance(30_000);
        session.restart(&mut StdRng::seed_from_u64(9));
        assert!(is_permutation(session.display_order()));
        assert_eq!(session.guess(), &[0, 0, 0, 0]);
        assert!(session.verification().is_none());
        let stats = session.stats();
        assert_eq!(stats.attempts, 0);
        assert_eq!(stats.best_score, 0);
        assert_eq!(stats.elapsed, Duration::ZERO);
        assert_eq!(session.collection().name(), "movie");
    }

    #[test]
    fn with_display_order_validates_input() {
        let clock = ManualClock::new(0);
        let collection = Collection::from_images("movie", vec![1, 2, 3]);
        assert!(matches!(
            PuzzleSession::with_display_order(collection.clone(), vec![0, 1], clock.clone()),
            Err(PuzzleError::InvalidInput(_))
        ));
        assert!(matches!(
            PuzzleSession::with_display_order(collection, vec![0, 1, 1], clock.clone()),
            Err(PuzzleError::InvalidInput(_))
        ));
        let empty: Collection<u8> = Collection::from_images("empty", Vec::new());
        assert!(matches!(
            PuzzleSession::with_display_order(empty, Vec::new(), clock),
            Err(PuzzleError::InvalidInput(_))
        ));
    }

    #[test]
    fn snapshot_restores_full_state() {
        let (mut session, clock) = session_with_order(&[2, 0, 3, 1]);
        session.set_guesses(&[2, 1, 3, 0]).expect("guess");
        session.verify();
        session.set_guess(1, 0).expect("guess");
        clock.advance(5_000);

        let snapshot = session.snapshot();
        let bytes = snapshot.to_bytes().expect("encode");
        let decoded = SessionSnapshot::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, snapshot);

        let collection = session.collection().clone();
        let restored = PuzzleSession::restore(collection, &decoded, clock.clone()).expect("restore");
        assert_eq!(restored.display_order(), session.display_order());
        assert_eq!(restored.guess(), session.guess());
        assert_eq!(restored.verification(), session.verification());
        assert!(restored.is_verification_stale());
        assert_eq!(restored.stats(), session.stats());
    }

    #[test]
    fn restore_rejects_mismatches() {
        let (session, clock) = session_with_order(&[2, 0, 3, 1]);
        let snapshot = session.snapshot();

        let other = Collection::from_images("other", vec!['a', 'b', 'c', 'd']);
        assert!(matches!(
            PuzzleSession::restore(other, &snapshot, clock.clone()),
            Err(RestoreError::Collection { .. })
        ));

        let shorter = Collection::from_images("movie", vec!['a', 'b', 'c']);
        assert!(matches!(
            PuzzleSession::restore(shorter, &snapshot, clock.clone()),
            Err(RestoreError::FrameCount {
                found: 4,
                expected: 3
            })
        ));

        let mut old = snapshot.clone();
        old.version = SESSION_SNAPSHOT_VERSION + 1;
        assert!(matches!(
            PuzzleSession::restore(session.collection().clone(), &old, clock.clone()),
            Err(RestoreError::Version { .. })
        ));

        let mut broken = snapshot;
        broken.display_order = vec![0, 0, 1, 2];
        assert!(matches!(
            PuzzleSession::restore(session.collection().clone(), &broken, clock),
            Err(RestoreError::Corrupt(_))
        ));
    }

    #[test]
    fn restore_rejects_results_that_disagree_with_the_guess() {
        let (mut session, clock) = session_with_order(&[2, 0, 3, 1]);
        let fresh = session.snapshot();

        let mut unearned = fresh.clone();
        unearned.verification = Some(vec![true; 4]);
        assert!(matches!(
            PuzzleSession::restore(session.collection().clone(), &unearned, clock.clone()),
            Err(RestoreError::Corrupt(_))
        ));

        let mut best_without_attempt = fresh;
        best_without_attempt.best_score = 2;
        assert!(matches!(
            PuzzleSession::restore(
                session.collection().clone(),
                &best_without_attempt,
                clock.clone()
            ),
            Err(RestoreError::Corrupt(_))
        ));

        session.verify();
        let checked = session.snapshot();
        let mut forged = checked.clone();
        forged.verification = Some(vec![true; 4]);
        forged.best_score = 4;
        assert!(matches!(
            PuzzleSession::restore(session.collection().clone(), &forged, clock.clone()),
            Err(RestoreError::Corrupt(_))
        ));

        let mut stale = forged;
        stale.verification_stale = true;
        let restored = PuzzleSession::restore(session.collection().clone(), &stale, clock.clone())
            .expect("stale results are not rescored");
        assert!(!restored.is_solved());

        let restored =
            PuzzleSession::restore(session.collection().clone(), &checked, clock).expect("restore");
        assert_eq!(restored.verification(), session.verification());
    }
}
