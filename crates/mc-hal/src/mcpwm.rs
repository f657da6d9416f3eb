//! MCPWM0 / PWM0A carrier driver.
//!
//! Drives one fixed-frequency carrier: timer 0 counts up to `period_ticks - 1`
//! and generator 0 output A is high while the counter is below the compare
//! value. The compare register is shadowed and latched when the timer wraps
//! to zero, so a new duty never tears an in-flight period.
//!
//! Register offsets follow the reference board firmware.

use crate::error::{HalError, HalResult};
use crate::registers::RegisterAccess;

pub const CLK_CFG: u32 = 0x0000;
pub const TIMER0_CFG0: u32 = 0x0004;
pub const TIMER0_CFG1: u32 = 0x0008;
pub const GEN0_STMP_CFG: u32 = 0x0044;
pub const GEN0_CFG0: u32 = 0x0048;
pub const GEN0_A: u32 = 0x0050;
pub const UPDATE_CFG: u32 = 0x010C;

const PRESCALE_MASK: u32 = 0xFF;
const PERIOD_MASK: u32 = 0xFFFF;
const COMPARE_MASK: u32 = 0xFFFF;

/// Timer 0 start field: start and keep running.
const TIMER_START_RUN: u32 = 0b10;
/// Timer 0 count mode field (bits 4:3): count up.
const TIMER_MODE_UP: u32 = 0b01 << 3;
/// Compare A update method: latch on timer-equals-zero.
const GEN_A_UPMETHOD_TEZ: u32 = 0b0001;

const UPDATE_GLOBAL_EN: u32 = 1 << 0;
const UPDATE_GEN0_EN: u32 = 1 << 4;

const GPIO_FUNC0_OUT_SEL_CFG: u32 = 0x00D0;
const GPIO_ENABLE: u32 = 0x0020;

/// Bus addresses of the blocks this driver touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McpwmLayout {
    pub mcpwm_base: u32,
    pub gpio_base: u32,
    pub gpio_matrix_base: u32,
    /// GPIO pad the PWM0A signal is routed to.
    pub output_gpio: u8,
    /// Output signal index of PWM0A in the GPIO matrix.
    pub signal_index: u32,
}

impl Default for McpwmLayout {
    fn default() -> Self {
        Self {
            mcpwm_base: 0x3F40_0000,
            gpio_base: 0x3F40_4000,
            gpio_matrix_base: 0x3F40_8000,
            output_gpio: 18,
            signal_index: 0,
        }
    }
}

/// Values programmed by [`Mcpwm::configure_carrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierSetup {
    /// Clock divider; the prescale register holds `divider - 1`.
    pub divider: u32,
    /// Ticks per carrier period.
    pub period_ticks: u16,
}

impl CarrierSetup {
    /// Work out the divider that makes `period_ticks` ticks last one carrier period.
    pub fn solve(timebase_hz: u32, carrier_hz: u32, period_ticks: u16) -> HalResult<Self> {
        if timebase_hz == 0 || carrier_hz == 0 || period_ticks == 0 {
            return Err(HalError::InvalidCarrier {
                what: "timebase, carrier and resolution must be non-zero".to_string(),
            });
        }
        let ticks_per_second = u64::from(carrier_hz) * u64::from(period_ticks);
        let timebase = u64::from(timebase_hz);
        if timebase % ticks_per_second != 0 {
            return Err(HalError::InvalidCarrier {
                what: format!(
                    "{timebase_hz} Hz timebase cannot produce {carrier_hz} Hz with {period_ticks} ticks"
                ),
            });
        }
        let divider = timebase / ticks_per_second;
        if !(1..=256).contains(&divider) {
            return Err(HalError::InvalidCarrier {
                what: format!("clock divider {divider} outside 1..=256"),
            });
        }
        Ok(Self {
            divider: divider as u32,
            period_ticks,
        })
    }
}

/// MCPWM0 timer 0 / generator 0 driver.
#[derive(Debug, Clone)]
pub struct Mcpwm<R> {
    regs: R,
    layout: McpwmLayout,
}

impl<R: RegisterAccess> Mcpwm<R> {
    pub fn new(regs: R, layout: McpwmLayout) -> Self {
        Self { regs, layout }
    }

    pub fn layout(&self) -> &McpwmLayout {
        &self.layout
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn reg(&self, offset: u32) -> u32 {
        self.layout.mcpwm_base + offset
    }

    /// Program and start the carrier, leaving the output at `initial_compare`.
    ///
    /// Running it twice with the same setup rewrites the same values.
    pub fn configure_carrier(&self, setup: CarrierSetup, initial_compare: u16) {
        let period_reg = u32::from(setup.period_ticks).saturating_sub(1);
        let compare = u32::from(initial_compare.min(setup.period_ticks));

        self.regs
            .write(self.reg(CLK_CFG), setup.divider.saturating_sub(1) & PRESCALE_MASK);
        self.regs
            .write(self.reg(TIMER0_CFG0), period_reg & PERIOD_MASK);
        self.regs
            .write(self.reg(GEN0_STMP_CFG), GEN_A_UPMETHOD_TEZ);
        self.regs.write(self.reg(GEN0_A), compare & COMPARE_MASK);
        self.regs.write(self.reg(GEN0_CFG0), 0);
        self.regs
            .write(self.reg(UPDATE_CFG), UPDATE_GLOBAL_EN | UPDATE_GEN0_EN);
        self.regs
            .write(self.reg(TIMER0_CFG1), TIMER_START_RUN | TIMER_MODE_UP);

        let gpio = u32::from(self.layout.output_gpio);
        self.regs.write(
            self.layout.gpio_matrix_base + GPIO_FUNC0_OUT_SEL_CFG + 4 * gpio,
            self.layout.signal_index,
        );
        self.regs
            .modify(self.layout.gpio_base + GPIO_ENABLE, |v| v | 1u32.checked_shl(gpio).unwrap_or(0));

        tracing::debug!(
            divider = setup.divider,
            period_ticks = setup.period_ticks,
            compare,
            "MCPWM carrier started"
        );
    }

    /// Stage a new compare value; it becomes active at the next period boundary.
    pub fn commit_compare(&self, ticks: u16) {
        self.regs
            .write(self.reg(GEN0_A), u32::from(ticks) & COMPARE_MASK);
        self.regs
            .write(self.reg(UPDATE_CFG), UPDATE_GLOBAL_EN | UPDATE_GEN0_EN);
    }

    /// Last compare value written.
    pub fn compare(&self) -> u16 {
        (self.regs.read(self.reg(GEN0_A)) & COMPARE_MASK) as u16
    }

    /// Period length in ticks as currently programmed, or 0 if the carrier was never configured.
    pub fn period_ticks(&self) -> u16 {
        let cfg1 = self.regs.read(self.reg(TIMER0_CFG1));
        if cfg1 & TIMER_START_RUN == 0 {
            return 0;
        }
        ((self.regs.read(self.reg(TIMER0_CFG0)) & PERIOD_MASK) + 1) as u16
    }
}
