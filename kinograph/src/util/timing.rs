use std::borrow::Cow;
use std::time::Instant;

use log::Level;

/// Logs how long a scope took when dropped.
pub struct ScopedTimer {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
}

impl ScopedTimer {
    pub fn with_level(label: impl Into<Cow<'static, str>>, level: Level) -> ScopedTimer {
        ScopedTimer {
            label: label.into(),
            level,
            start: Instant::now(),
        }
    }

    pub fn info(label: impl Into<Cow<'static, str>>) -> ScopedTimer {
        ScopedTimer::with_level(label, Level::Info)
    }

    pub fn debug(label: impl Into<Cow<'static, str>>) -> ScopedTimer {
        ScopedTimer::with_level(label, Level::Debug)
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::log!(
            self.level,
            "{} took {} ms",
            self.label,
            self.start.elapsed().as_millis()
        );
    }
}
