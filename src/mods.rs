use std::fmt;

use serde::{Deserialize, Serialize};

/// Gameplay modifier selection for a score.
///
/// Rate-changing mods are expressed through [`rate`] directly (1.5 for
/// DT, 0.75 for HT). Hidden, Flashlight and NoFail are accepted and kept
/// so callers can round-trip them, but the model does not use them yet.
///
/// [`rate`]: Modifiers::rate
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub rate: f64,

    /// Use the lazer judgement set for slider parts.
    pub lazer: bool,

    pub hardrock: bool,
    pub easy: bool,

    pub hidden: bool,
    pub flashlight: bool,

    pub no_fail: bool,
    pub spun_out: bool,
}

impl Modifiers {
    pub const DOUBLE_TIME_RATE: f64 = 1.5;
    pub const HALF_TIME_RATE: f64 = 0.75;
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            rate: 1.0,
            lazer: false,
            hardrock: false,
            easy: false,
            hidden: false,
            flashlight: false,
            no_fail: false,
            spun_out: false,
        }
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut any = false;

        if self.rate > 1.0 {
            write!(f, "DT({:.2})", self.rate)?;
            any = true;
        } else if self.rate < 1.0 {
            write!(f, "HT({:.2})", self.rate)?;
            any = true;
        }

        for (enabled, acronym) in [
            (self.easy, "EZ"),
            (self.hardrock, "HR"),
            (self.hidden, "HD"),
            (self.flashlight, "FL"),
            (self.no_fail, "NF"),
            (self.spun_out, "SO"),
        ] {
            if enabled {
                f.write_str(acronym)?;
                any = true;
            }
        }

        if !any {
            f.write_str("NM")?;
        }

        Ok(())
    }
}
