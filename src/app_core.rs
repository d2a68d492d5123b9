use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::local_snapshot::{
    apply_session_snapshot, clear_local_snapshot, load_local_snapshot, save_local_snapshot,
};
use shotorder_core::{
    CatalogSource, ImageSource, MovieCatalogEntry, PuzzleSession, SessionSnapshot, StatsSnapshot,
};

pub(crate) type AppSubscriber = Rc<dyn Fn()>;
pub(crate) type WebSession = PuzzleSession<&'static str>;

pub(crate) struct AppCore {
    state: RefCell<AppState>,
    subscribers: Rc<RefCell<Vec<AppSubscriber>>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotStatus {
    Unchecked,
    Correct,
    Incorrect,
}

impl SlotStatus {
    pub(crate) fn color(self) -> &'static str {
        match self {
            SlotStatus::Unchecked => "transparent",
            SlotStatus::Correct => "#acc18a",
            SlotStatus::Incorrect => "#ff5666",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SlotView {
    pub(crate) src: &'static str,
    /// 0-based position the player assigned to this slot.
    pub(crate) guess: usize,
    pub(crate) status: SlotStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GameSnapshot {
    pub(crate) label: &'static str,
    pub(crate) slug: &'static str,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) slots: Vec<SlotView>,
    pub(crate) stats: StatsSnapshot,
    /// `(correct, total)` of the last check, if any.
    pub(crate) last_check: Option<(usize, usize)>,
    pub(crate) stale: bool,
    pub(crate) solved: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AppSnapshot {
    pub(crate) movies: &'static [MovieCatalogEntry],
    pub(crate) game: Option<GameSnapshot>,
    pub(crate) error: Option<String>,
}

struct ActiveGame {
    entry: &'static MovieCatalogEntry,
    session: WebSession,
}

struct AppState {
    catalog: CatalogSource,
    game: Option<ActiveGame>,
    rng: StdRng,
    error: Option<String>,
}

pub(crate) struct AppSubscription {
    subscriber: AppSubscriber,
    subscribers: Rc<RefCell<Vec<AppSubscriber>>>,
}

impl Drop for AppSubscription {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}

impl AppCore {
    pub(crate) fn new(seed: u64) -> Rc<Self> {
        Self::with_catalog(CatalogSource::default(), seed)
    }

    pub(crate) fn with_catalog(catalog: CatalogSource, seed: u64) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(AppState {
                catalog,
                game: None,
                rng: StdRng::seed_from_u64(seed),
                error: None,
            }),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub(crate) fn subscribe(&self, subscriber: AppSubscriber) -> AppSubscription {
        self.subscribers.borrow_mut().push(subscriber.clone());
        AppSubscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    fn notify(&self) {
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            (subscriber)();
        }
    }

    /// Persists the active session, or clears storage when there is none.
    fn persist(&self) {
        match self.session_snapshot() {
            Some(snapshot) => save_local_snapshot(&snapshot),
            None => clear_local_snapshot(),
        }
    }

    fn commit(&self) {
        self.persist();
        self.notify();
    }

    pub(crate) fn snapshot(&self) -> AppSnapshot {
        let state = self.state.borrow();
        AppSnapshot {
            movies: state.catalog.entries(),
            game: state.game.as_ref().map(build_game_snapshot),
            error: state.error.clone(),
        }
    }

    pub(crate) fn session_snapshot(&self) -> Option<SessionSnapshot> {
        let state = self.state.borrow();
        state.game.as_ref().map(|game| game.session.snapshot())
    }

    /// Resumes the session saved in local storage, if it still matches the
    /// catalog.
    pub(crate) fn restore_local(&self) -> bool {
        let Some(snapshot) = load_local_snapshot() else {
            return false;
        };
        let catalog = self.state.borrow().catalog;
        if apply_session_snapshot(&snapshot, self, catalog).is_applied() {
            self.notify();
            true
        } else {
            clear_local_snapshot();
            false
        }
    }

    pub(crate) fn resume(&self, entry: &'static MovieCatalogEntry, session: WebSession) {
        let mut state = self.state.borrow_mut();
        state.error = None;
        state.game = Some(ActiveGame { entry, session });
    }

    pub(crate) fn select_movie(&self, slug: &str) {
        {
            let mut state = self.state.borrow_mut();
            let catalog = state.catalog;
            let loaded = catalog
                .load_collection(slug)
                .map_err(|err| err.to_string())
                .and_then(|collection| {
                    let entry = catalog
                        .entry(slug)
                        .ok_or_else(|| format!("unknown movie: {slug}"))?;
                    let session = PuzzleSession::start(collection, &mut state.rng)
                        .map_err(|err| format!("{}: {err}", entry.label))?;
                    Ok(ActiveGame { entry, session })
                });
            match loaded {
                Ok(game) => {
                    log_event("movie selected", game.entry.slug);
                    state.error = None;
                    state.game = Some(game);
                }
                Err(message) => {
                    log_event("movie selection failed", &message);
                    state.error = Some(message);
                }
            }
        }
        self.commit();
    }

    pub(crate) fn change_movie(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.game.is_none() && state.error.is_none() {
                return;
            }
            state.game = None;
            state.error = None;
        }
        self.commit();
    }

    pub(crate) fn restart(&self) {
        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let Some(game) = state.game.as_mut() else {
                return;
            };
            game.session.restart(&mut state.rng);
            log_event("puzzle restarted", game.entry.slug);
        }
        self.commit();
    }

    pub(crate) fn set_guess(&self, slot: usize, position: usize) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let Some(game) = state.game.as_mut() else {
                return;
            };
            match game.session.set_guess(slot, position) {
                Ok(changed) => changed,
                Err(err) => {
                    log_event("guess rejected", &err.to_string());
                    false
                }
            }
        };
        if changed {
            self.commit();
        }
    }

    pub(crate) fn verify(&self) {
        {
            let mut state = self.state.borrow_mut();
            let Some(game) = state.game.as_mut() else {
                return;
            };
            let verification = game.session.verify();
            log_event("order checked", &verification.progress_label());
        }
        self.commit();
    }

    /// Re-renders subscribers so the elapsed time advances.
    pub(crate) fn tick(&self) {
        if self.state.borrow().game.is_some() {
            self.notify();
        }
    }
}

fn build_game_snapshot(game: &ActiveGame) -> GameSnapshot {
    let session = &game.session;
    let verification = session.verification();
    let slots = session
        .slot_frames()
        .zip(session.guess())
        .enumerate()
        .map(|(slot, (frame, &guess))| {
            let status = match verification.and_then(|v| v.results.get(slot)) {
                Some(true) => SlotStatus::Correct,
                Some(false) => SlotStatus::Incorrect,
                None => SlotStatus::Unchecked,
            };
            SlotView {
                src: frame.image,
                guess,
                status,
            }
        })
        .collect();
    GameSnapshot {
        label: game.entry.label,
        slug: game.entry.slug,
        width: game.entry.width,
        height: game.entry.height,
        slots,
        stats: session.stats(),
        last_check: verification.map(|v| (v.correct_count, v.total())),
        stale: session.is_verification_stale(),
        solved: session.is_solved(),
    }
}

fn log_event(event: &str, detail: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        gloo::console::log!(event, detail);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (event, detail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const FRAMES: &[&str] = &[
        "img/a/plan_1.jpg",
        "img/a/plan_2.jpg",
        "img/a/plan_3.jpg",
        "img/a/plan_4.jpg",
    ];
    const ENTRIES: &[MovieCatalogEntry] = &[
        MovieCatalogEntry {
            label: "Alpha",
            slug: "alpha",
            dir: "img/a",
            frames: FRAMES,
            width: 320,
            height: 180,
        },
        MovieCatalogEntry {
            label: "Blank",
            slug: "blank",
            dir: "img/blank",
            frames: &[],
            width: 320,
            height: 180,
        },
    ];

    fn core() -> Rc<AppCore> {
        AppCore::with_catalog(CatalogSource::new(ENTRIES), 7)
    }

    fn counter(core: &AppCore) -> (Rc<Cell<u32>>, AppSubscription) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let subscription = core.subscribe(Rc::new(move || seen.set(seen.get() + 1)));
        (count, subscription)
    }

    fn solve(core: &AppCore) {
        let game = core.snapshot().game.expect("game");
        let answer: Vec<usize> = game
            .slots
            .iter()
            .map(|slot| {
                FRAMES
                    .iter()
                    .position(|src| *src == slot.src)
                    .expect("known frame")
            })
            .collect();
        for (slot, position) in answer.into_iter().enumerate() {
            core.set_guess(slot, position);
        }
    }

    #[test]
    fn selecting_a_movie_starts_a_game() {
        let core = core();
        let (count, _subscription) = counter(&core);
        assert!(core.snapshot().game.is_none());
        core.select_movie("alpha");
        let snapshot = core.snapshot();
        let game = snapshot.game.expect("game");
        assert_eq!(game.label, "Alpha");
        assert_eq!(game.slots.len(), 4);
        assert!(game.slots.iter().all(|slot| slot.guess == 0));
        assert!(game.slots.iter().all(|slot| slot.status == SlotStatus::Unchecked));
        assert_eq!(game.last_check, None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn empty_or_unknown_movies_report_errors() {
        let core = core();
        core.select_movie("blank");
        let snapshot = core.snapshot();
        assert!(snapshot.game.is_none());
        assert!(snapshot.error.is_some());

        core.select_movie("missing");
        assert_eq!(
            core.snapshot().error.as_deref(),
            Some("unknown movie: missing")
        );

        core.change_movie();
        assert!(core.snapshot().error.is_none());
    }

    #[test]
    fn checking_marks_slots_and_updates_stats() {
        let core = core();
        core.select_movie("alpha");
        solve(&core);
        core.verify();
        let game = core.snapshot().game.expect("game");
        assert!(game.solved);
        assert_eq!(game.last_check, Some((4, 4)));
        assert!(game.slots.iter().all(|slot| slot.status == SlotStatus::Correct));
        assert_eq!(game.stats.attempts, 1);
        assert_eq!(game.stats.best_label(), "4/4");
        assert!(!game.stale);
    }

    #[test]
    fn moving_a_slider_after_a_check_marks_results_stale() {
        let core = core();
        core.select_movie("alpha");
        core.verify();
        let (count, _subscription) = counter(&core);
        core.set_guess(0, 0);
        assert_eq!(count.get(), 0, "unchanged guess does not notify");
        core.set_guess(0, 3);
        let game = core.snapshot().game.expect("game");
        assert!(game.stale);
        assert_eq!(game.slots[0].guess, 3);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn out_of_range_guesses_are_ignored() {
        let core = core();
        core.select_movie("alpha");
        let before = core.snapshot().game.expect("game");
        core.set_guess(9, 0);
        core.set_guess(0, 9);
        let after = core.snapshot().game.expect("game");
        assert_eq!(after.slots, before.slots);
        assert!(!after.stale);
    }

    #[test]
    fn restart_and_change_movie() {
        let core = core();
        core.select_movie("alpha");
        core.verify();
        core.restart();
        let game = core.snapshot().game.expect("game");
        assert_eq!(game.stats.attempts, 0);
        assert_eq!(game.last_check, None);

        core.change_movie();
        assert!(core.snapshot().game.is_none());
    }

    #[test]
    fn dropped_subscriptions_stop_receiving() {
        let core = core();
        let (count, subscription) = counter(&core);
        core.select_movie("alpha");
        drop(subscription);
        core.tick();
        core.verify();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn tick_only_notifies_during_a_game() {
        let core = core();
        let (count, _subscription) = counter(&core);
        core.tick();
        assert_eq!(count.get(), 0);
        core.select_movie("alpha");
        core.tick();
        assert_eq!(count.get(), 2);
    }
}
