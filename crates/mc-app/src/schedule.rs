//! Operator command schedule.
//!
//! A schedule is a list of commands keyed by the tick at which they apply.
//! Entries are applied in tick order; entries sharing a tick keep their file
//! order.

use mc_config::{CommandDef, ScheduledCommandDef};
use mc_controls::OperatingMode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Request(OperatingMode),
    Setpoint(f64),
}

impl From<CommandDef> for Command {
    fn from(def: CommandDef) -> Self {
        match def {
            CommandDef::Request { mode } => Command::Request(mode),
            CommandDef::Setpoint { hz } => Command::Setpoint(hz),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledCommand {
    pub at_tick: u64,
    pub command: Command,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    entries: Vec<ScheduledCommand>,
    next: usize,
}

impl Schedule {
    pub fn new(mut entries: Vec<ScheduledCommand>) -> Self {
        entries.sort_by_key(|e| e.at_tick);
        Self { entries, next: 0 }
    }

    pub fn from_defs(defs: &[ScheduledCommandDef]) -> Self {
        Self::new(
            defs.iter()
                .map(|d| ScheduledCommand {
                    at_tick: d.at_tick,
                    command: d.command.into(),
                })
                .collect(),
        )
    }

    /// Pop every command due at or before `tick`.
    pub fn take_due(&mut self, tick: u64) -> Vec<Command> {
        let start = self.next;
        while self.next < self.entries.len() && self.entries[self.next].at_tick <= tick {
            self.next += 1;
        }
        self.entries[start..self.next]
            .iter()
            .map(|e| e.command)
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.entries.len() - self.next
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
