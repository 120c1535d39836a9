//! Blind controller
//!
//! One per covering. Owns the position model, the motion driver and the
//! sensor reconciler, and serializes everything through `&mut self`: the
//! owner (one firmware task, or a test) is the single control loop.
//!
//! ```text
//!   set_target_position ──► MotionDriver ──► MotorLines
//!                                │
//!   poll / next_wakeup ──────────┤ ticks, deadline
//!                                ▼
//!                          PositionModel ──► PositionStore, Observer
//!                                ▲
//!   get_target_position ──► Reconciler ◄── EndStop (closed, open)
//! ```

use crate::config::{BlindConfig, ConfigError};
use crate::motion::{Direction, MotionDriver, MotionState, Request};
use crate::position::{PositionModel, MAX_POSITION};
use crate::sync::{Correction, Reconciler};
use crate::traits::{EndStop, MotorLines, Observer, PositionStore};

/// Controller construction or operation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlindError<E> {
    /// Rejected configuration
    Config(ConfigError),
    /// Motor line or sensor I/O failure
    Io(E),
}

impl<E> From<ConfigError> for BlindError<E> {
    fn from(e: ConfigError) -> Self {
        BlindError::Config(e)
    }
}

/// Result of a target read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetReading {
    /// Reported target position
    pub position: u8,
    /// Correction applied before reporting, if any
    pub correction: Option<Correction>,
}

/// Position estimation and motion control for one covering
pub struct BlindController<L, S, P, O> {
    model: PositionModel<P, O>,
    driver: MotionDriver<L>,
    reconciler: Reconciler<S>,
}

impl<L, S, P, O> BlindController<L, S, P, O>
where
    L: MotorLines,
    S: EndStop<Error = L::Error>,
    P: PositionStore,
    O: Observer,
{
    /// Validate the config, seed the position from the store and release
    /// both motor lines
    pub fn new(
        config: &BlindConfig,
        lines: L,
        closed: Option<S>,
        open: Option<S>,
        store: P,
        observer: O,
    ) -> Result<Self, BlindError<L::Error>> {
        config.validate()?;

        let mut driver = MotionDriver::new(lines, config.calibration);
        driver.release().map_err(BlindError::Io)?;

        Ok(Self {
            model: PositionModel::new(config.name.clone(), store, observer),
            driver,
            reconciler: Reconciler::new(closed, open),
        })
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    /// Current estimated position
    pub fn current_position(&self) -> u8 {
        self.model.current()
    }

    pub fn motion_state(&self) -> MotionState {
        self.model.motion_state()
    }

    /// Direction of the running drive pulse, if any
    pub fn direction(&self) -> Option<Direction> {
        self.driver.direction()
    }

    /// Reconcile against the end stops and report the target
    ///
    /// A correction moves both current and target to the corrected value,
    /// persists it and notifies.
    pub fn get_target_position(&mut self) -> Result<TargetReading, L::Error> {
        let correction = self.reconciler.check(self.model.current())?;

        if let Some(c) = correction {
            let position = c.position();
            self.model.set_target(position);
            self.model.set_position(position);
        }

        Ok(TargetReading {
            position: self.model.target(),
            correction,
        })
    }

    /// Request a new target, clamped to 100
    pub fn set_target_position(&mut self, position: u8, now_ms: u64) -> Result<Request, L::Error> {
        let position = position.min(MAX_POSITION);
        self.driver.request(&mut self.model, position, now_ms)
    }

    /// Run due ticks and the completion deadline; true if motion completed
    pub fn poll(&mut self, now_ms: u64) -> Result<bool, L::Error> {
        self.driver.poll(&mut self.model, now_ms)
    }

    /// Instant of the next deferred work item, `None` when stopped
    pub fn next_wakeup(&self) -> Option<u64> {
        self.driver.next_wakeup()
    }

    /// Stop now and settle on the target
    pub fn finalize(&mut self) -> Result<(), L::Error> {
        self.driver.finalize(&mut self.model)
    }

    /// Release both lines now, leaving the estimate where it is
    pub fn halt(&mut self) -> Result<(), L::Error> {
        let moving = self.model.motion_state().is_moving();
        self.driver.release()?;
        if moving {
            self.model.set_target(self.model.current());
            self.model.set_motion_state(MotionState::Stopped);
        }
        Ok(())
    }

    pub fn lines(&self) -> &L {
        self.driver.lines()
    }

    pub fn store(&self) -> &P {
        self.model.store()
    }

    pub fn observer(&self) -> &O {
        self.model.observer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, MemoryStore, MockEndStop, MockLines, Recorder};
    use proptest::prelude::*;

    type Blind = BlindController<MockLines, MockEndStop, MemoryStore, Recorder>;

    fn config(up_ms: u32, down_ms: u32) -> BlindConfig {
        BlindConfig::new("living", 2, 3, up_ms, down_ms).unwrap()
    }

    fn blind(stored: Option<i32>, closed: Option<bool>, open: Option<bool>) -> Blind {
        let store = match stored {
            Some(v) => MemoryStore::with("living", v),
            None => MemoryStore::default(),
        };
        BlindController::new(
            &config(10000, 10000),
            MockLines::default(),
            closed.map(MockEndStop::new),
            open.map(MockEndStop::new),
            store,
            Recorder::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_construction_releases_lines() {
        let b = blind(None, None, None);
        assert_eq!(
            b.lines().writes,
            vec![(Direction::Up, false), (Direction::Down, false)]
        );
        assert_eq!(b.current_position(), 0);
        assert_eq!(b.motion_state(), MotionState::Stopped);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config(10000, 10000);
        bad.pin_down = bad.pin_up;
        let result: Result<Blind, _> = BlindController::new(
            &bad,
            MockLines::default(),
            None,
            None,
            MemoryStore::default(),
            Recorder::default(),
        );
        assert!(matches!(
            result,
            Err(BlindError::Config(ConfigError::DuplicatePin(2)))
        ));

        let mut bad = config(10000, 10000);
        bad.calibration.duration_up_ms = 0;
        let result: Result<Blind, _> = BlindController::new(
            &bad,
            MockLines::default(),
            None,
            None,
            MemoryStore::default(),
            Recorder::default(),
        );
        assert!(matches!(
            result,
            Err(BlindError::Config(ConfigError::ZeroDuration(Direction::Up)))
        ));
    }

    #[test]
    fn test_scenario_full_open() {
        let mut b = blind(Some(0), None, None);

        match b.set_target_position(100, 0).unwrap() {
            Request::Moving(plan) => assert_eq!(plan.duration_ms, 10000),
            Request::Unchanged => panic!("expected motion"),
        }
        assert_eq!(b.motion_state(), MotionState::Increasing);

        b.poll(10000).unwrap();
        assert_eq!(b.current_position(), 100);
        assert_eq!(b.motion_state(), MotionState::Stopped);
        assert_eq!(b.store().get("living"), Some(100));
    }

    #[test]
    fn test_scenario_reversal() {
        let mut b = BlindController::new(
            &config(10000, 9000),
            MockLines::default(),
            None::<MockEndStop>,
            None,
            MemoryStore::default(),
            Recorder::default(),
        )
        .unwrap();

        b.set_target_position(100, 0).unwrap();
        b.poll(4000).unwrap();
        assert_eq!(b.current_position(), 40);

        match b.set_target_position(0, 4000).unwrap() {
            Request::Moving(plan) => {
                assert_eq!(plan.direction, Direction::Down);
                assert!(plan.reversed);
                // 40% of the down travel, not 100%
                assert_eq!(plan.duration_ms, 3600);
            }
            Request::Unchanged => panic!("expected motion"),
        }
        assert!(!b.lines().up);
        assert!(b.lines().down);
        assert!(!b.lines().overlapped);
    }

    #[test]
    fn test_scenario_stale_position_corrected() {
        let mut b = blind(Some(30), Some(true), None);
        assert_eq!(b.current_position(), 30);

        let reading = b.get_target_position().unwrap();
        assert_eq!(reading.position, 0);
        assert_eq!(reading.correction, Some(Correction::Closed));
        assert_eq!(b.current_position(), 0);
        assert_eq!(b.store().get("living"), Some(0));
        assert_eq!(b.observer().events, vec![Event::Position(0)]);
    }

    #[test]
    fn test_scenario_no_sensors() {
        let mut b = blind(Some(65), None, None);
        for _ in 0..3 {
            let reading = b.get_target_position().unwrap();
            assert_eq!(reading.position, 65);
            assert_eq!(reading.correction, None);
        }
        assert_eq!(b.store().writes, 0);
        assert!(b.observer().events.is_empty());
    }

    #[test]
    fn test_set_to_current_is_noop() {
        let mut b = blind(Some(40), None, None);
        let writes = b.lines().writes.len();
        assert_eq!(b.set_target_position(40, 0).unwrap(), Request::Unchanged);
        assert_eq!(b.motion_state(), MotionState::Stopped);
        assert_eq!(b.lines().writes.len(), writes);
        assert!(b.observer().events.is_empty());
    }

    #[test]
    fn test_out_of_range_clamped() {
        let mut b = blind(Some(0), None, None);
        b.set_target_position(200, 0).unwrap();
        assert_eq!(b.get_target_position().unwrap().position, 100);
    }

    #[test]
    fn test_notification_order() {
        let mut b = blind(Some(0), None, None);
        b.set_target_position(2, 0).unwrap();
        b.poll(1000).unwrap();
        assert_eq!(
            b.observer().events,
            vec![
                Event::State(MotionState::Increasing),
                Event::Position(1),
                Event::State(MotionState::Stopped),
                Event::Position(2),
            ]
        );
    }

    #[test]
    fn test_halt_keeps_estimate() {
        let mut b = blind(Some(0), None, None);
        b.set_target_position(100, 0).unwrap();
        b.poll(2500).unwrap();
        b.halt().unwrap();
        assert_eq!(b.current_position(), 25);
        assert_eq!(b.motion_state(), MotionState::Stopped);
        assert_eq!(b.next_wakeup(), None);
        assert!(!b.lines().up && !b.lines().down);
    }

    #[test]
    fn test_restart_resumes_position() {
        let mut b = blind(Some(0), None, None);
        b.set_target_position(70, 0).unwrap();
        b.poll(7000).unwrap();
        let stored = b.store().get("living");

        let b = blind(stored, None, None);
        assert_eq!(b.current_position(), 70);
    }

    #[test]
    fn test_correction_during_motion_keeps_pulse() {
        let mut b = blind(Some(0), Some(true), None);
        b.set_target_position(100, 0).unwrap();
        b.poll(100).unwrap();
        assert_eq!(b.current_position(), 1);

        // Closed switch still asserted after the first tick
        let reading = b.get_target_position().unwrap();
        assert_eq!(reading.correction, Some(Correction::Closed));
        assert_eq!(reading.position, 0);
        assert_eq!(b.current_position(), 0);

        // The pulse keeps running towards its deadline
        assert_eq!(b.motion_state(), MotionState::Increasing);
        assert!(b.lines().up);
        assert_eq!(b.next_wakeup(), Some(200));

        // Later ticks are absorbed by the corrected target
        let events = b.observer().events.len();
        b.poll(5000).unwrap();
        assert_eq!(b.current_position(), 0);
        assert_eq!(b.observer().events.len(), events);

        assert!(b.poll(10000).unwrap());
        assert_eq!(b.current_position(), 0);
        assert_eq!(b.motion_state(), MotionState::Stopped);
        assert!(!b.lines().up);
        assert_eq!(b.store().get("living"), Some(0));
    }

    #[test]
    fn test_line_fault_leaves_blind_stopped() {
        let lines = MockLines {
            fail_energize: Some(Direction::Down),
            ..Default::default()
        };
        let mut b = BlindController::new(
            &config(10000, 10000),
            lines,
            None::<MockEndStop>,
            None,
            MemoryStore::default(),
            Recorder::default(),
        )
        .unwrap();

        b.set_target_position(100, 0).unwrap();
        b.poll(4000).unwrap();
        assert!(b.set_target_position(0, 4000).is_err());

        assert_eq!(b.motion_state(), MotionState::Stopped);
        assert_eq!(b.direction(), None);
        assert_eq!(b.next_wakeup(), None);
        assert_eq!(b.current_position(), 40);
        assert_eq!(b.get_target_position().unwrap().position, 40);
        assert!(!b.lines().up && !b.lines().down);
    }

    proptest! {
        #[test]
        fn prop_never_both_lines(
            start in 0i32..=100,
            steps in proptest::collection::vec((0u8..=100, 0u64..3000), 1..20),
        ) {
            let mut b = blind(Some(start), None, None);
            let mut now = 0u64;
            for (target, delay) in steps {
                b.set_target_position(target, now).unwrap();
                now += delay;
                b.poll(now).unwrap();
                prop_assert!(!(b.lines().up && b.lines().down));
                prop_assert!(b.current_position() <= 100);
            }
            prop_assert!(!b.lines().overlapped);

            b.poll(now + 20000).unwrap();
            prop_assert_eq!(b.motion_state(), MotionState::Stopped);
            prop_assert!(!b.lines().up && !b.lines().down);
            let target = b.get_target_position().unwrap().position;
            prop_assert_eq!(b.current_position(), target);
        }

        #[test]
        fn prop_finalize_lands_on_target(start in 0i32..=100, target in 0u8..=100, elapsed in 0u64..20000) {
            let mut b = blind(Some(start), None, None);
            b.set_target_position(target, 0).unwrap();
            b.poll(elapsed).unwrap();
            b.finalize().unwrap();
            prop_assert_eq!(b.current_position(), target);
            prop_assert_eq!(b.motion_state(), MotionState::Stopped);
        }

        #[test]
        fn prop_ticks_monotonic(start in 0i32..=100, target in 0u8..=100) {
            let mut b = blind(Some(start), None, None);
            b.set_target_position(target, 0).unwrap();
            b.poll(20000).unwrap();

            let positions: Vec<u8> = b
                .observer()
                .events
                .iter()
                .filter_map(|e| match e {
                    Event::Position(p) => Some(*p),
                    _ => None,
                })
                .collect();
            let ascending = positions.windows(2).all(|w| w[0] <= w[1]);
            let descending = positions.windows(2).all(|w| w[0] >= w[1]);
            prop_assert!(ascending || descending);
        }

        #[test]
        fn prop_persist_round_trip(position in 0u8..=100) {
            let mut b = blind(None, None, None);
            b.set_target_position(position, 0).unwrap();
            b.finalize().unwrap();
            let b = blind(b.store().get("living"), None, None);
            prop_assert_eq!(b.current_position(), position);
        }
    }
}
