//! Per-session simulation context.

use std::fmt;

use crate::config::TuningSet;

/// Largest timestep the integrators accept. Longer frames are clamped.
pub const MAX_DT: f32 = 0.1;

/// Top-level simulation mode.
///
/// Selects which of vehicle dynamics or locomotion runs and which entity the
/// camera follows. Only the interaction resolver changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// On foot in the open world.
    #[default]
    Walking,
    /// Driving the occupied vehicle.
    Driving,
    /// On foot inside a house interior.
    Indoor,
}

impl Mode {
    /// Lowercase name shown in the HUD.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Walking => "walking",
            Mode::Driving => "driving",
            Mode::Indoor => "indoor",
        }
    }

    /// Whether locomotion owns the player this tick.
    pub fn is_on_foot(self) -> bool {
        matches!(self, Mode::Walking | Mode::Indoor)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared by every component for one running session.
///
/// Passed by reference into each update; there is no global instance.
#[derive(Debug, Clone)]
pub struct SimContext {
    mode: Mode,
    dt: f32,
    elapsed: f64,
    tick: u64,
    /// Active tuning tables.
    pub tuning: TuningSet,
}

impl SimContext {
    /// Create a context in walking mode.
    pub fn new(tuning: TuningSet) -> Self {
        Self {
            mode: Mode::Walking,
            dt: 0.0,
            elapsed: 0.0,
            tick: 0,
            tuning,
        }
    }

    /// Start a tick: clamp the raw frame delta into `[0, MAX_DT]` and advance
    /// the clocks. Returns the clamped delta.
    pub fn begin_tick(&mut self, raw_dt: f32) -> f32 {
        let dt = if raw_dt.is_finite() {
            raw_dt.clamp(0.0, MAX_DT)
        } else {
            0.0
        };
        if dt < raw_dt {
            tracing::trace!(raw_dt, dt, "clamped frame delta");
        }
        self.dt = dt;
        self.elapsed += f64::from(dt);
        self.tick += 1;
        dt
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Clamped delta of the current tick.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Simulated seconds since the session started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of ticks started.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Mode writes are restricted to the interaction resolver.
    pub(crate) fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            tracing::info!(from = %self.mode, to = %mode, "mode changed");
            self.mode = mode;
        }
    }
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new(TuningSet::default())
    }
}
