/// How the delay and sound timers are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerMode {
    /// Decrement at 60 Hz of real (or host-supplied logical) time.
    #[default]
    WallClock,
    /// Decrement once per executed step, as early hosts did.
    PerStep,
}

/// Behaviour toggles for instructions whose semantics differ between
/// historical interpreters. All off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quirks {
    /// 8XY6 / 8XYE shift VY into VX instead of shifting VX in place.
    pub shift_uses_vy: bool,
    /// 8XY1 / 8XY2 / 8XY3 zero VF afterwards.
    pub logic_resets_vf: bool,
    /// BNNN jumps to XNN + VX instead of NNN + V0.
    pub jump_uses_vx: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub timer_mode: TimerMode,
    pub quirks: Quirks,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Config {
    pub fn timer_mode(mut self, mode: TimerMode) -> Self {
        self.timer_mode = mode;
        self
    }

    pub fn quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
