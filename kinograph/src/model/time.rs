use std::cmp::Ordering;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point in time expressed as a value counted at a rate, typically a frame
/// number at a frame rate. Rates must be positive and finite.
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct RationalTime {
    value: f64,
    rate: f64,
}

impl RationalTime {
    pub fn new(value: f64, rate: f64) -> RationalTime {
        RationalTime { value, rate }
    }

    pub fn from_seconds(seconds: f64) -> RationalTime {
        RationalTime {
            value: seconds,
            rate: 1.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn to_seconds(&self) -> f64 {
        self.value / self.rate
    }

    /// The same point in time counted at a different rate.
    pub fn rescaled_to(&self, rate: f64) -> RationalTime {
        RationalTime {
            value: self.value * (rate / self.rate),
            rate,
        }
    }

    /// The frame number containing this time, at this time's own rate.
    pub fn to_frames(&self) -> i64 {
        self.value.floor() as i64
    }
}

impl Default for RationalTime {
    fn default() -> RationalTime {
        RationalTime {
            value: 0.0,
            rate: 1.0,
        }
    }
}

// Binary arithmetic keeps the finer of the two rates so no precision is
// lost rescaling the other operand.
impl Add for RationalTime {
    type Output = RationalTime;

    fn add(self, rhs: RationalTime) -> RationalTime {
        if self.rate < rhs.rate {
            RationalTime {
                value: self.value * (rhs.rate / self.rate) + rhs.value,
                rate: rhs.rate,
            }
        } else {
            RationalTime {
                value: rhs.value * (self.rate / rhs.rate) + self.value,
                rate: self.rate,
            }
        }
    }
}

impl Sub for RationalTime {
    type Output = RationalTime;

    fn sub(self, rhs: RationalTime) -> RationalTime {
        if self.rate < rhs.rate {
            RationalTime {
                value: self.value * (rhs.rate / self.rate) - rhs.value,
                rate: rhs.rate,
            }
        } else {
            RationalTime {
                value: self.value - rhs.value * (self.rate / rhs.rate),
                rate: self.rate,
            }
        }
    }
}

impl PartialEq for RationalTime {
    fn eq(&self, other: &RationalTime) -> bool {
        self.value * other.rate == other.value * self.rate
    }
}

impl PartialOrd for RationalTime {
    fn partial_cmp(&self, other: &RationalTime) -> Option<Ordering> {
        (self.value * other.rate).partial_cmp(&(other.value * self.rate))
    }
}

/// A half-open range of time: `[start_time, start_time + duration)`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    start_time: RationalTime,
    duration: RationalTime,
}

impl TimeRange {
    pub fn new(start_time: RationalTime, duration: RationalTime) -> TimeRange {
        TimeRange {
            start_time,
            duration,
        }
    }

    pub fn start_time(&self) -> RationalTime {
        self.start_time
    }

    pub fn duration(&self) -> RationalTime {
        self.duration
    }

    pub fn end_time_exclusive(&self) -> RationalTime {
        self.start_time + self.duration
    }

    pub fn contains(&self, time: RationalTime) -> bool {
        time >= self.start_time && time < self.end_time_exclusive()
    }
}
