//! Smart notify policy
//!
//! Decides whether a finished build is worth announcing. With smart notify
//! off every build is announced; with it on, a streak of green builds stays
//! quiet.

use serde::{Deserialize, Serialize};

use crate::build::BuildResult;

/// Per-job smart notify setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmartNotifyMode {
    /// Defer to the global default
    #[default]
    Global,
    Enabled,
    Disabled,
}

impl SmartNotifyMode {
    /// Case-insensitive; anything other than `enabled`/`disabled` (including
    /// unset) defers to the global default.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("enabled") => SmartNotifyMode::Enabled,
            Some("disabled") => SmartNotifyMode::Disabled,
            _ => SmartNotifyMode::Global,
        }
    }

    /// Effective on/off given the global default
    pub fn resolve(self, global_default: bool) -> bool {
        match self {
            SmartNotifyMode::Enabled => true,
            SmartNotifyMode::Disabled => false,
            SmartNotifyMode::Global => global_default,
        }
    }
}

/// How the current result is compared against the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartNotifyVariant {
    /// Notify unless both previous and current are SUCCESS
    #[default]
    SuccessStreak,
    /// Notify whenever the result differs from the previous one
    ResultChange,
}

/// Whether a notification should fire for this build.
///
/// A missing previous build always notifies. Callers map an unassigned
/// result to `BuildResult::Success` before getting here.
pub fn should_notify(
    mode: SmartNotifyMode,
    global_default: bool,
    variant: SmartNotifyVariant,
    current: &BuildResult,
    previous: Option<&BuildResult>,
) -> bool {
    if !mode.resolve(global_default) {
        return true;
    }

    let Some(previous) = previous else {
        return true;
    };

    match variant {
        SmartNotifyVariant::SuccessStreak => !current.is_success() || !previous.is_success(),
        SmartNotifyVariant::ResultChange => current != previous,
    }
}
