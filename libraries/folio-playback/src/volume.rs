//! Volume control
//!
//! Linear level in `[0, 1]` as the media resource expects it, plus a mute
//! flag that silences output without losing the level.

/// Volume controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    /// Volume level (0.0-1.0)
    level: f64,

    /// Mute state (preserves volume level)
    muted: bool,
}

/// Level used when none is configured
pub const DEFAULT_VOLUME: f64 = 0.7;

impl Volume {
    /// Create new volume controller, clamping `level` into range
    pub fn new(level: f64) -> Self {
        let mut volume = Self {
            level: DEFAULT_VOLUME,
            muted: false,
        };
        volume.set_level(level);
        volume
    }

    /// Set volume level, clamped to `[0, 1]`
    ///
    /// NaN is ignored. Returns the stored level.
    pub fn set_level(&mut self, level: f64) -> f64 {
        if !level.is_nan() {
            self.level = level.clamp(0.0, 1.0);
        }
        self.level
    }

    /// Get current volume level (0.0-1.0)
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level to hand to the media resource (0 while muted)
    pub fn output(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}
