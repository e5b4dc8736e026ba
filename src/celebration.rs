/// How loudly the presentation layer may celebrate a result.
///
/// This is advice only; the engine never plays effects itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CelebrationLevel {
    #[default]
    None,
    Standard,
    Grand,
}

/// Reactions under this earn the bigger celebration
pub const GRAND_THRESHOLD_SECS: f64 = 0.180;

impl CelebrationLevel {
    pub fn for_result(reaction_secs: f64, is_new_best: bool, is_elite: bool) -> Self {
        if reaction_secs <= 0.0 || !(is_new_best || is_elite) {
            CelebrationLevel::None
        } else if reaction_secs < GRAND_THRESHOLD_SECS {
            CelebrationLevel::Grand
        } else {
            CelebrationLevel::Standard
        }
    }

    /// Suggested confetti particle count
    pub fn particle_count(&self) -> u32 {
        match self {
            CelebrationLevel::None => 0,
            CelebrationLevel::Standard => 200,
            CelebrationLevel::Grand => 400,
        }
    }

    /// Suggested spread angle in degrees
    pub fn spread_degrees(&self) -> u32 {
        match self {
            CelebrationLevel::None => 0,
            CelebrationLevel::Standard => 80,
            CelebrationLevel::Grand => 120,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, CelebrationLevel::None)
    }
}
