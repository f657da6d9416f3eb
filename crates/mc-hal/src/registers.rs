//! Register access abstraction.
//!
//! Peripheral drivers never dereference raw addresses themselves; they talk to
//! a [`RegisterAccess`] implementation. Addresses are absolute 32-bit bus
//! addresses and every register is 32 bits wide.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Read/write access to 32-bit memory-mapped registers.
pub trait RegisterAccess {
    /// Read the register at `addr`.
    fn read(&self, addr: u32) -> u32;

    /// Write `value` to the register at `addr`.
    fn write(&self, addr: u32, value: u32);

    /// Read-modify-write the register at `addr`.
    fn modify<F>(&self, addr: u32, f: F)
    where
        F: FnOnce(u32) -> u32,
        Self: Sized,
    {
        let value = self.read(addr);
        self.write(addr, f(value));
    }
}

impl<T: RegisterAccess> RegisterAccess for &T {
    fn read(&self, addr: u32) -> u32 {
        (**self).read(addr)
    }

    fn write(&self, addr: u32, value: u32) {
        (**self).write(addr, value)
    }
}

/// Volatile accesses to the real peripheral bus.
#[derive(Debug, Clone, Copy)]
pub struct MmioRegisters {
    _private: (),
}

impl MmioRegisters {
    /// Create an MMIO backend.
    ///
    /// # Safety
    ///
    /// Every address later passed to [`RegisterAccess::read`] or
    /// [`RegisterAccess::write`] must be a valid, 4-byte aligned device
    /// register on the running SoC, and no other code may drive the same
    /// peripherals concurrently.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterAccess for MmioRegisters {
    fn read(&self, addr: u32) -> u32 {
        // SAFETY: upheld by the contract of `MmioRegisters::new`.
        unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
    }

    fn write(&self, addr: u32, value: u32) {
        // SAFETY: upheld by the contract of `MmioRegisters::new`.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    values: BTreeMap<u32, u32>,
    /// `None` unless created with [`FakeRegisters::with_write_log`].
    writes: Option<Vec<(u32, u32)>>,
}

/// In-memory register file.
///
/// Unwritten registers read as zero. Clones share the same storage, so a
/// simulated plant can observe what a driver wrote. Writes are only recorded
/// by a handle created with [`with_write_log`](Self::with_write_log); the
/// plain handle keeps nothing but current values and can back a loop that
/// runs indefinitely.
#[derive(Debug, Clone, Default)]
pub struct FakeRegisters {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register file that records every write for later inspection.
    pub fn with_write_log() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                values: BTreeMap::new(),
                writes: Some(Vec::new()),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Preload a register without recording a write.
    pub fn preset(&self, addr: u32, value: u32) {
        self.lock().values.insert(addr, value);
    }

    /// Every recorded write, oldest first. Empty when logging is off.
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.lock().writes.clone().unwrap_or_default()
    }

    /// Recorded writes to a single address, oldest first.
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.lock()
            .writes
            .iter()
            .flatten()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_log(&self) {
        if let Some(writes) = self.lock().writes.as_mut() {
            writes.clear();
        }
    }
}

impl RegisterAccess for FakeRegisters {
    fn read(&self, addr: u32) -> u32 {
        self.lock().values.get(&addr).copied().unwrap_or(0)
    }

    fn write(&self, addr: u32, value: u32) {
        let mut state = self.lock();
        state.values.insert(addr, value);
        if let Some(writes) = state.writes.as_mut() {
            writes.push((addr, value));
        }
    }
}

/// Backend chosen at startup from configuration.
#[derive(Debug, Clone)]
pub enum RegisterBackend {
    Fake(FakeRegisters),
    Mmio(MmioRegisters),
}

impl RegisterAccess for RegisterBackend {
    fn read(&self, addr: u32) -> u32 {
        match self {
            Self::Fake(regs) => regs.read(addr),
            Self::Mmio(regs) => regs.read(addr),
        }
    }

    fn write(&self, addr: u32, value: u32) {
        match self {
            Self::Fake(regs) => regs.write(addr, value),
            Self::Mmio(regs) => regs.write(addr, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_reads_back_writes() {
        let regs = FakeRegisters::with_write_log();
        assert_eq!(regs.read(0x10), 0);

        regs.write(0x10, 42);
        assert_eq!(regs.read(0x10), 42);
        assert_eq!(regs.writes(), vec![(0x10, 42)]);
    }

    #[test]
    fn plain_handle_keeps_values_without_logging() {
        let regs = FakeRegisters::new();
        for i in 0..1000 {
            regs.write(0x10, i);
        }
        assert_eq!(regs.read(0x10), 999);
        assert!(regs.writes().is_empty());
        assert!(regs.writes_to(0x10).is_empty());
        assert!(regs.lock().writes.is_none());
    }

    #[test]
    fn log_is_shared_between_clones() {
        let regs = FakeRegisters::with_write_log();
        regs.clone().write(0x50, 3);
        assert_eq!(regs.writes(), vec![(0x50, 3)]);
        regs.clear_log();
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn fake_clones_share_storage() {
        let regs = FakeRegisters::new();
        let observer = regs.clone();
        regs.write(0x20, 7);
        assert_eq!(observer.read(0x20), 7);
    }

    #[test]
    fn modify_preserves_other_bits() {
        let regs = FakeRegisters::with_write_log();
        regs.preset(0x30, 0b1010);
        regs.modify(0x30, |v| v | 0b0001);
        assert_eq!(regs.read(0x30), 0b1011);
        assert_eq!(regs.writes_to(0x30), vec![0b1011]);
    }

    #[test]
    fn backend_delegates_to_fake() {
        let fake = FakeRegisters::new();
        let backend = RegisterBackend::Fake(fake.clone());
        backend.write(0x40, 5);
        assert_eq!(fake.read(0x40), 5);
        assert_eq!(backend.read(0x40), 5);
    }
}
