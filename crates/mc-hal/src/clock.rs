//! SoC clock configuration.
//!
//! The carrier math in [`crate::mcpwm`] assumes the CPU runs from the PLL at
//! 240 MHz. This is a one-time call made by bootstrap before the control loop
//! starts.

use crate::registers::RegisterAccess;

const CPU_PER_CONF: u32 = 0x0010;
const SYSCLK_CONF: u32 = 0x0060;

const CPUPERIOD_SEL_SHIFT: u32 = 0;
const CPUPERIOD_SEL_MASK: u32 = 0x3 << CPUPERIOD_SEL_SHIFT;
const PLL_FREQ_SEL_SHIFT: u32 = 2;
const PLL_FREQ_SEL_MASK: u32 = 0x1 << PLL_FREQ_SEL_SHIFT;
const SOC_CLK_SEL_SHIFT: u32 = 27;
const SOC_CLK_SEL_MASK: u32 = 0x3 << SOC_CLK_SEL_SHIFT;

const SOC_CLK_XTAL: u32 = 0;
const SOC_CLK_PLL: u32 = 1;

const XTAL_HZ: u32 = 40_000_000;

/// Location of the SYSTEM register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemClockLayout {
    pub system_base: u32,
}

impl Default for SystemClockLayout {
    fn default() -> Self {
        Self {
            system_base: 0x600C_0000,
        }
    }
}

/// Switch the CPU to PLL/2 with the PLL at 480 MHz.
pub fn set_cpu_clock_240mhz<R: RegisterAccess>(regs: &R, layout: SystemClockLayout) {
    regs.modify(layout.system_base + CPU_PER_CONF, |v| {
        let mut v = v & !(CPUPERIOD_SEL_MASK | PLL_FREQ_SEL_MASK);
        v |= 2 << CPUPERIOD_SEL_SHIFT;
        v |= 1 << PLL_FREQ_SEL_SHIFT;
        v
    });
    regs.modify(layout.system_base + SYSCLK_CONF, |v| {
        (v & !SOC_CLK_SEL_MASK) | (SOC_CLK_PLL << SOC_CLK_SEL_SHIFT)
    });
    tracing::info!("CPU clock set to 240 MHz");
}

/// Decode the CPU frequency currently selected, if it is a known combination.
pub fn cpu_clock_hz<R: RegisterAccess>(regs: &R, layout: SystemClockLayout) -> Option<u32> {
    let sysclk = regs.read(layout.system_base + SYSCLK_CONF);
    match (sysclk & SOC_CLK_SEL_MASK) >> SOC_CLK_SEL_SHIFT {
        SOC_CLK_XTAL => Some(XTAL_HZ),
        SOC_CLK_PLL => {
            let per = regs.read(layout.system_base + CPU_PER_CONF);
            let pll_480 = (per & PLL_FREQ_SEL_MASK) != 0;
            match ((per & CPUPERIOD_SEL_MASK) >> CPUPERIOD_SEL_SHIFT, pll_480) {
                (0, _) => Some(80_000_000),
                (1, _) => Some(160_000_000),
                (2, true) => Some(240_000_000),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::FakeRegisters;

    #[test]
    fn reset_state_reads_as_xtal() {
        let regs = FakeRegisters::new();
        assert_eq!(cpu_clock_hz(&regs, SystemClockLayout::default()), Some(XTAL_HZ));
    }

    #[test]
    fn sets_240mhz_and_keeps_unrelated_bits() {
        let regs = FakeRegisters::new();
        let layout = SystemClockLayout::default();
        regs.preset(layout.system_base + CPU_PER_CONF, 0xF0 | 0x1);
        regs.preset(layout.system_base + SYSCLK_CONF, 0x0000_1234);

        set_cpu_clock_240mhz(&regs, layout);

        let per = regs.read(layout.system_base + CPU_PER_CONF);
        assert_eq!(per & 0xF0, 0xF0);
        assert_eq!(per & CPUPERIOD_SEL_MASK, 2);
        assert_eq!(regs.read(layout.system_base + SYSCLK_CONF) & 0xFFFF, 0x1234);
        assert_eq!(cpu_clock_hz(&regs, layout), Some(240_000_000));
    }
}
