use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Time {
    /// Time since the previous frame.
    pub elapsed: Duration,
    /// Time since the session started.
    pub total: Duration,
}

impl Time {
    pub fn new(elapsed: Duration, total: Duration) -> Self {
        Self { elapsed, total }
    }

    pub fn delta_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// The time of the next frame, `elapsed` after this one.
    pub fn next(&self, elapsed: Duration) -> Time {
        Time {
            elapsed,
            total: self.total + elapsed,
        }
    }
}
