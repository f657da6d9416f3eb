//! Fixed-period control loop driver.
//!
//! Per tick: apply due operator commands, sample feedback, step the
//! supervisor, record timing. Everything runs on the caller's thread.

use mc_controls::{
    DutyActuator, FeedbackSource, OperatingMode, Pid, SampleConfig, Supervisor, Transition,
};
use mc_core::{TickStats, Timer, as_hz};

use crate::schedule::{Command, Schedule};
use crate::ticker::Ticker;

/// Snapshot of one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRecord {
    pub tick: u64,
    pub setpoint_hz: f64,
    pub measurement_hz: f64,
    pub mode: OperatingMode,
    pub output: Option<f64>,
    pub duty_ticks: u16,
}

pub struct ControlLoop<F, A> {
    feedback: F,
    pid: Pid,
    supervisor: Supervisor<A>,
    sample: SampleConfig,
    setpoint_hz: f64,
    schedule: Schedule,
    status_every: u64,
    stats: TickStats,
    tick: u64,
    fault_tick: Option<u64>,
    started: bool,
}

impl<F: FeedbackSource, A: DutyActuator> ControlLoop<F, A> {
    pub fn new(
        feedback: F,
        pid: Pid,
        supervisor: Supervisor<A>,
        sample: SampleConfig,
        setpoint_hz: f64,
    ) -> Self {
        Self {
            feedback,
            pid,
            supervisor,
            sample,
            setpoint_hz,
            schedule: Schedule::default(),
            status_every: 0,
            stats: TickStats::new(),
            tick: 0,
            fault_tick: None,
            started: false,
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Log a status line every `n` ticks; 0 disables it.
    pub fn with_status_every(mut self, n: u64) -> Self {
        self.status_every = n;
        self
    }

    /// Run one control tick without waiting.
    pub fn tick(&mut self) -> TickRecord {
        if !self.started {
            self.feedback.init();
            self.started = true;
        }
        for command in self.schedule.take_due(self.tick) {
            self.apply(command);
        }

        let timer = Timer::start("tick");
        let measurement_hz = as_hz(self.feedback.sample());
        let report = self
            .supervisor
            .step(&mut self.pid, self.setpoint_hz, measurement_hz);
        self.stats.record(timer.stop());

        if report.mode == OperatingMode::Faulted && self.fault_tick.is_none() {
            self.fault_tick = Some(self.tick);
        }

        let record = TickRecord {
            tick: self.tick,
            setpoint_hz: self.setpoint_hz,
            measurement_hz,
            mode: report.mode,
            output: report.output,
            duty_ticks: report.duty_ticks,
        };

        self.tick += 1;
        if self.status_every > 0 && self.tick % self.status_every == 0 {
            tracing::info!(
                tick = record.tick,
                mode = %record.mode,
                setpoint_hz = record.setpoint_hz,
                measurement_hz = record.measurement_hz,
                duty_ticks = record.duty_ticks,
                "status"
            );
        }
        record
    }

    /// Run `n` ticks paced by `ticker` and return their records.
    pub fn run_for<T: Ticker>(&mut self, n: u64, mut ticker: T) -> Vec<TickRecord> {
        let mut records = Vec::with_capacity(usize::try_from(n).unwrap_or(0));
        for _ in 0..n {
            if !ticker.wait() {
                self.stats.record_overrun();
            }
            records.push(self.tick());
        }
        records
    }

    /// Run until the process is stopped.
    pub fn run<T: Ticker>(&mut self, mut ticker: T) -> ! {
        tracing::info!(period_s = self.sample.dt, setpoint_hz = self.setpoint_hz, "control loop started");
        loop {
            if !ticker.wait() {
                self.stats.record_overrun();
            }
            self.tick();
        }
    }

    pub fn request(&mut self, mode: OperatingMode) -> Transition {
        self.supervisor.request(mode)
    }

    pub fn set_setpoint(&mut self, setpoint_hz: f64) {
        tracing::info!(from = self.setpoint_hz, to = setpoint_hz, "setpoint changed");
        self.setpoint_hz = setpoint_hz;
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Request(mode) => {
                self.request(mode);
            }
            Command::Setpoint(hz) => self.set_setpoint(hz),
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.supervisor.mode()
    }

    pub fn setpoint_hz(&self) -> f64 {
        self.setpoint_hz
    }

    pub fn period(&self) -> SampleConfig {
        self.sample
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// First tick that ended in `Faulted`.
    pub fn fault_tick(&self) -> Option<u64> {
        self.fault_tick
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn supervisor(&self) -> &Supervisor<A> {
        &self.supervisor
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduledCommand;
    use crate::ticker::ManualTicker;
    use mc_controls::{PwmActuator, SupervisorConfig, SyntheticRamp};
    use mc_hal::{FakeRegisters, Mcpwm, McpwmLayout};

    fn control(
        feedback: SyntheticRamp,
    ) -> ControlLoop<SyntheticRamp, PwmActuator<FakeRegisters>> {
        let pwm = Mcpwm::new(FakeRegisters::new(), McpwmLayout::default());
        let supervisor = Supervisor::new(
            PwmActuator::new(pwm, 160_000_000),
            SupervisorConfig::default(),
        );
        ControlLoop::new(
            feedback,
            Pid::new(0.02, 0.005, 0.0, 0.01, 0.0, 100.0),
            supervisor,
            SampleConfig::new(0.01).unwrap(),
            800.0,
        )
    }

    #[test]
    fn first_tick_arms_and_runs() {
        let mut lp = control(SyntheticRamp::default());
        let record = lp.tick();

        assert_eq!(record.tick, 0);
        assert_eq!(record.mode, OperatingMode::Running);
        assert_eq!(record.measurement_hz, 400.5);
        assert!(record.duty_ticks > 0);
        assert_eq!(lp.tick_count(), 1);
        assert_eq!(lp.stats().count(), 1);
    }

    #[test]
    fn run_for_counts_ticks() {
        let mut lp = control(SyntheticRamp::default());
        let records = lp.run_for(25, ManualTicker::new());

        assert_eq!(records.len(), 25);
        assert_eq!(records.last().map(|r| r.tick), Some(24));
        assert_eq!(lp.stats().overruns(), 0);
        assert_eq!(lp.fault_tick(), None);
    }

    #[test]
    fn scheduled_commands_apply_at_their_tick() {
        let schedule = Schedule::new(vec![
            ScheduledCommand {
                at_tick: 3,
                command: Command::Setpoint(600.0),
            },
            ScheduledCommand {
                at_tick: 5,
                command: Command::Request(OperatingMode::Stopped),
            },
        ]);
        let mut lp = control(SyntheticRamp::default()).with_schedule(schedule);
        let records = lp.run_for(8, ManualTicker::new());

        assert_eq!(records[2].setpoint_hz, 800.0);
        assert_eq!(records[3].setpoint_hz, 600.0);
        assert_eq!(records[4].mode, OperatingMode::Running);
        assert_eq!(records[5].mode, OperatingMode::Stopped);
        assert_eq!(records[5].duty_ticks, 0);
    }

    #[test]
    fn out_of_envelope_ramp_records_fault_tick() {
        // Third sample is 2100 Hz
        let ramp = SyntheticRamp::new(1800.0, 100.0, 0.0, 5000.0).unwrap();
        let mut lp = control(ramp);
        let records = lp.run_for(6, ManualTicker::new());

        assert_eq!(lp.fault_tick(), Some(2));
        assert_eq!(records[1].mode, OperatingMode::Running);
        assert!(records[3..].iter().all(|r| r.mode == OperatingMode::Faulted && r.duty_ticks == 0));
    }
}
