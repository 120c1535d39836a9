//! Motion driver
//!
//! Turns a target position into a bounded drive pulse on one motor line.
//! While the pulse runs, a tick process moves the estimate one percent per
//! sub-interval. When the deadline passes the line is released and the
//! estimate snaps to the target.
//!
//! ```text
//!   request(t) ──► Driving { direction, deadline, ticks } ──poll──► tick, tick, ...
//!        ▲                    │                                        │
//!        │   reversal:        │ deadline due                           │
//!        └── release old line ▼                                        ▼
//!                          finalize(): release line, Stopped, current = target
//! ```

use crate::config::Calibration;
use crate::position::PositionModel;
use crate::traits::{MotorLines, Observer, PositionStore};

use super::timer::{Deadline, Interval};
use super::{Direction, MotionState};

/// An accepted drive pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionPlan {
    pub direction: Direction,
    /// Time the line is held active (ms)
    pub duration_ms: u32,
    /// Time between position ticks (ms)
    pub tick_ms: u32,
    /// An opposite-direction motion was interrupted
    pub reversed: bool,
}

/// Outcome of a target request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Target equals the current position, nothing touched
    Unchanged,
    /// A new pulse was started
    Moving(MotionPlan),
}

/// In-flight motion
#[derive(Debug, Clone, Copy)]
struct Motion {
    direction: Direction,
    deadline: Deadline,
    ticks: Interval,
}

impl Motion {
    /// Next tick, if it falls strictly before the deadline
    fn pending_tick(&self) -> Option<u64> {
        (self.ticks.next_at < self.deadline.at).then_some(self.ticks.next_at)
    }
}

/// Drives a pair of motor lines from timed requests
pub struct MotionDriver<L> {
    lines: L,
    calibration: Calibration,
    active: Option<Motion>,
}

impl<L: MotorLines> MotionDriver<L> {
    pub fn new(lines: L, calibration: Calibration) -> Self {
        Self {
            lines,
            calibration,
            active: None,
        }
    }

    /// Direction of the running pulse
    pub fn direction(&self) -> Option<Direction> {
        self.active.map(|m| m.direction)
    }

    pub fn is_driving(&self) -> bool {
        self.active.is_some()
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }

    /// Release both lines and forget any motion
    ///
    /// Used at startup to put the relays in a known state.
    pub fn release(&mut self) -> Result<(), L::Error> {
        self.active = None;
        self.lines.release_all()
    }

    /// Start moving towards `target`
    ///
    /// A target equal to the current position is a no-op even while a pulse
    /// towards a different target is running; that pulse continues.
    pub fn request<P, O>(
        &mut self,
        model: &mut PositionModel<P, O>,
        target: u8,
        now: u64,
    ) -> Result<Request, L::Error>
    where
        P: PositionStore,
        O: Observer,
    {
        let current = model.current();
        if target == current {
            return Ok(Request::Unchanged);
        }

        let direction = Direction::towards(current, target);
        let reversed = self.active.is_some_and(|m| m.direction != direction);

        if let Err(e) = self.switch_lines(direction) {
            self.abort(model);
            return Err(e);
        }

        let distance = current.abs_diff(target);
        let duration_ms = self.calibration.drive_ms(direction, distance);
        let tick_ms = self.calibration.tick_ms(direction);

        self.active = Some(Motion {
            direction,
            deadline: Deadline::after(now, duration_ms),
            ticks: Interval::starting(now, tick_ms),
        });

        model.set_target(target);
        model.set_motion_state(direction.into());

        Ok(Request::Moving(MotionPlan {
            direction,
            duration_ms,
            tick_ms,
            reversed,
        }))
    }

    /// Fire every deferred item due at `now`, in time order
    ///
    /// Ticks scheduled strictly before the deadline fire first; the deadline
    /// then finalizes. Returns true if the motion completed.
    pub fn poll<P, O>(&mut self, model: &mut PositionModel<P, O>, now: u64) -> Result<bool, L::Error>
    where
        P: PositionStore,
        O: Observer,
    {
        let Some(motion) = self.active.as_mut() else {
            return Ok(false);
        };

        while let Some(at) = motion.pending_tick() {
            if at > now {
                break;
            }
            Self::tick(model, motion.direction);
            motion.ticks.advance();
        }

        if motion.deadline.is_due(now) {
            self.finalize(model)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Earliest instant at which [`poll`](Self::poll) has work
    pub fn next_wakeup(&self) -> Option<u64> {
        self.active.map(|m| match m.pending_tick() {
            Some(tick) => tick.min(m.deadline.at),
            None => m.deadline.at,
        })
    }

    /// Stop the pulse and snap the estimate to the target
    ///
    /// Also usable as an external stop: with nothing running it releases both
    /// lines and settles the model where it is.
    pub fn finalize<P, O>(&mut self, model: &mut PositionModel<P, O>) -> Result<(), L::Error>
    where
        P: PositionStore,
        O: Observer,
    {
        let released = match self.active.take() {
            Some(motion) => self.lines.set_active(motion.direction, false),
            None => self.lines.release_all(),
        };
        if let Err(e) = released {
            self.abort(model);
            return Err(e);
        }

        model.set_motion_state(MotionState::Stopped);
        model.set_position(model.target());
        Ok(())
    }

    /// Drop the running pulse and energize the line for `direction`
    fn switch_lines(&mut self, direction: Direction) -> Result<(), L::Error> {
        if let Some(motion) = self.active.take() {
            if motion.direction != direction {
                self.lines.set_active(motion.direction, false)?;
            }
        }
        if !self.lines.is_active(direction)? {
            self.lines.set_active(direction, true)?;
        }
        Ok(())
    }

    /// Settle after a failed line write
    ///
    /// Releases both lines best-effort and leaves the estimate where it is,
    /// so the model never reports motion that nothing is driving.
    fn abort<P, O>(&mut self, model: &mut PositionModel<P, O>)
    where
        P: PositionStore,
        O: Observer,
    {
        self.active = None;
        let _ = self.lines.release_all();
        if model.motion_state().is_moving() {
            model.set_target(model.current());
            model.set_motion_state(MotionState::Stopped);
        }
    }

    /// Advance the estimate one step, never past the target
    fn tick<P, O>(model: &mut PositionModel<P, O>, direction: Direction)
    where
        P: PositionStore,
        O: Observer,
    {
        let current = model.current();
        let target = model.target();
        match direction {
            Direction::Up if current < target => model.set_position(current + 1),
            Direction::Down if current > target => model.set_position(current - 1),
            _ => {}
        }
    }
}
