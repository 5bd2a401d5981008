//! IdGenerator port - ID creation behind a trait for deterministic tests.

use ulid::Ulid;

use crate::domain::{JobId, TaskId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn job_id(&self) -> JobId;
    fn task_id(&self) -> TaskId;
}

/// ULID generator. Takes its timestamp from the injected Clock, so a fixed
/// clock yields IDs with a fixed time component (the random part still
/// guarantees uniqueness).
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn job_id(&self) -> JobId {
        JobId::from(self.next())
    }

    fn task_id(&self) -> TaskId {
        TaskId::from(self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn generated_ids_are_unique() {
        let ids = UlidGenerator::new(SystemClock);
        let a = ids.job_id();
        let b = ids.job_id();
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_clock_pins_the_timestamp_part() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let ids = UlidGenerator::new(FixedClock::new(at));

        let a = ids.task_id();
        let b = ids.task_id();
        assert_ne!(a, b);
        assert_eq!(a.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
        assert_eq!(b.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
    }
}
