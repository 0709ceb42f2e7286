//! Run lifecycle
//!
//! The session owns at most one `GameState`. It builds courses, forwards
//! fixed steps and render frames, turns run events into scores and best
//! records, and holds the single timer in the game: the reload after a fall.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::audio::AudioSink;
use crate::best_scores::BestScores;
use crate::consts::SIM_DT;
use crate::error::{MapError, StorageError};
use crate::persistence::Storage;
use crate::scoring::{Grade, score};
use crate::settings::Settings;
use crate::sim::{
    Canvas, Difficulty, GameEvent, GameState, RunPhase, TickInput, render_tick, select, tick,
};
use crate::tuning::Tuning;

/// Result of clearing a course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearReport {
    pub difficulty: Difficulty,
    pub elapsed_ms: f64,
    pub score: u32,
    pub grade: Grade,
    /// Best score for the tier after this clear
    pub best: u32,
    pub new_record: bool,
}

/// Things the UI reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        difficulty: Difficulty,
        layout: &'static str,
    },
    Cleared(ClearReport),
    Failed,
    /// The post-fall reload fired
    Reloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduledAction {
    /// Back to Idle, or replay the fallen course with `restart_on_fail`
    Reload { difficulty: Difficulty, seed: u64 },
}

/// One-shot action due at a timestamp; never cancelled once set
#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due_ms: f64,
    action: ScheduledAction,
}

struct Run {
    state: GameState,
    started_ms: f64,
    /// Clock frozen at the clear
    cleared_ms: Option<f64>,
}

pub struct SessionController<S: Storage> {
    settings: Settings,
    tuning: Tuning,
    canvas: Canvas,
    best: BestScores<S>,
    run: Option<Run>,
    scheduled: Option<Scheduled>,
}

impl<S: Storage> SessionController<S> {
    pub fn new(settings: Settings, tuning: Tuning, canvas: Canvas, storage: S) -> Self {
        Self {
            settings,
            tuning,
            canvas,
            best: BestScores::new(storage),
            run: None,
            scheduled: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Change settings and persist them; applies from the next run on
    pub fn update_settings(
        &mut self,
        change: impl FnOnce(&mut Settings),
    ) -> Result<(), StorageError> {
        change(&mut self.settings);
        self.settings.save(self.best.storage_mut())
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// New courses are laid out for `canvas`; a running one keeps its size
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    pub fn best_scores(&self) -> &BestScores<S> {
        &self.best
    }

    /// Forget the records of every tier
    pub fn clear_best_scores(&mut self) {
        for difficulty in Difficulty::ALL {
            self.best.clear(difficulty);
        }
        info!("Best scores cleared");
    }

    pub fn phase(&self) -> RunPhase {
        self.run.as_ref().map_or(RunPhase::Idle, |run| run.state.phase)
    }

    pub fn state(&self) -> Option<&GameState> {
        self.run.as_ref().map(|run| &run.state)
    }

    pub fn state_mut(&mut self) -> Option<&mut GameState> {
        self.run.as_mut().map(|run| &mut run.state)
    }

    /// Whether a reload is waiting to fire
    pub fn reload_pending(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Run clock in milliseconds, stopped once the course is cleared
    pub fn elapsed_ms(&self, now_ms: f64) -> Option<f64> {
        self.run
            .as_ref()
            .map(|run| run.cleared_ms.unwrap_or(now_ms) - run.started_ms)
    }

    /// Tear down any current run, then build and start a new one
    pub fn start(
        &mut self,
        difficulty: Difficulty,
        seed: u64,
        now_ms: f64,
    ) -> Result<SessionEvent, MapError> {
        self.reset();

        let layout = select(difficulty, seed, self.canvas)?;
        let state = GameState::new(
            layout,
            seed,
            self.tuning.clone(),
            self.settings.feedback_options(&self.tuning),
            self.settings.max_particles(),
        );
        info!(
            "Starting {} run on '{}' (seed {})",
            difficulty, state.layout_name, seed
        );

        let event = SessionEvent::Started {
            difficulty,
            layout: state.layout_name,
        };
        self.run = Some(Run {
            state,
            started_ms: now_ms,
            cleared_ms: None,
        });
        Ok(event)
    }

    /// `start` with a tier name from the UI
    pub fn start_mode(
        &mut self,
        mode: &str,
        seed: u64,
        now_ms: f64,
    ) -> Result<SessionEvent, MapError> {
        self.start(mode.parse()?, seed, now_ms)
    }

    /// Drop the current run; back to Idle
    ///
    /// A reload scheduled by a fall stays pending and still fires.
    pub fn reset(&mut self) {
        if self.run.take().is_some() {
            info!("Run torn down");
        }
    }

    /// One fixed physics step
    pub fn step(&mut self, input: &TickInput, now_ms: f64) -> Vec<SessionEvent> {
        let Some(run) = self.run.as_mut() else {
            return Vec::new();
        };
        tick(&mut run.state, input, SIM_DT);

        let mut events = Vec::new();
        for event in run.state.take_events() {
            match event {
                GameEvent::Cleared => {
                    run.cleared_ms = Some(now_ms);
                    let report = report_clear(
                        &mut self.best,
                        run.state.difficulty,
                        now_ms - run.started_ms,
                    );
                    events.push(SessionEvent::Cleared(report));
                }
                GameEvent::Fell => {
                    if self.scheduled.is_none() {
                        self.scheduled = Some(Scheduled {
                            due_ms: now_ms + self.tuning.fail_reset_delay_ms,
                            action: ScheduledAction::Reload {
                                difficulty: run.state.difficulty,
                                seed: run.state.seed,
                            },
                        });
                    }
                    events.push(SessionEvent::Failed);
                }
            }
        }
        events
    }

    /// Fire the scheduled reload once it is due
    pub fn poll(&mut self, now_ms: f64) -> Option<SessionEvent> {
        if !self.scheduled.is_some_and(|s| now_ms >= s.due_ms) {
            return None;
        }
        let scheduled = self.scheduled.take()?;

        match scheduled.action {
            ScheduledAction::Reload { difficulty, seed } => {
                self.reset();
                if self.settings.restart_on_fail {
                    if let Err(e) = self.start(difficulty, seed, now_ms) {
                        warn!("Could not restart after fall: {}", e);
                    }
                }
                Some(SessionEvent::Reloaded)
            }
        }
    }

    /// One display frame of feedback and effects
    pub fn render(&mut self, now_ms: f64, audio: &mut dyn AudioSink) {
        if let Some(run) = self.run.as_mut() {
            render_tick(&mut run.state, now_ms, audio);
        }
    }
}

fn report_clear<S: Storage>(
    best: &mut BestScores<S>,
    difficulty: Difficulty,
    elapsed_ms: f64,
) -> ClearReport {
    let score = score(elapsed_ms);
    let previous = best.get(difficulty);
    let new_record = match best.record(difficulty, score) {
        Ok(is_record) => is_record,
        Err(e) => {
            warn!("Could not save best score: {}", e);
            false
        }
    };
    info!(
        "Cleared {} in {:.2}s: score {} ({})",
        difficulty,
        elapsed_ms / 1000.0,
        score,
        Grade::for_score(score)
    );

    ClearReport {
        difficulty,
        elapsed_ms,
        score,
        grade: Grade::for_score(score),
        best: previous.map_or(score, |p| p.max(score)),
        new_record,
    }
}
