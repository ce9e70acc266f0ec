//! embedded-hal adapter — the only module that touches real peripherals.
//!
//! Wraps an SPI device bound to the MCP3462R, its data-ready input and the
//! two probe outputs behind [`ProbeHardware`].  Any HAL that implements the
//! embedded-hal 1.0 traits plugs in here.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::error;

use crate::app::ports::ProbeHardware;
use crate::config::ProbeConfig;
use crate::error::HardwareError;

pub struct HalProbe<SPI, READY, TRIG, EN> {
    spi: SPI,
    ready: READY,
    trigger: TRIG,
    enable: EN,
    /// The MCP3462R pulls IRQ low when a conversion is waiting.
    ready_active_low: bool,
}

impl<SPI, READY, TRIG, EN> HalProbe<SPI, READY, TRIG, EN>
where
    SPI: SpiDevice,
    READY: InputPin,
    TRIG: OutputPin,
    EN: OutputPin,
{
    /// Take ownership of the peripherals and drive both outputs low.
    pub fn new(spi: SPI, ready: READY, trigger: TRIG, enable: EN, ready_active_low: bool) -> Self {
        let mut probe = Self {
            spi,
            ready,
            trigger,
            enable,
            ready_active_low,
        };
        probe.set_trigger(false);
        probe.set_enable(false);
        probe
    }

    /// [`new`](Self::new) with the data-ready polarity taken from `config`.
    pub fn from_config(spi: SPI, ready: READY, trigger: TRIG, enable: EN, config: &ProbeConfig) -> Self {
        Self::new(spi, ready, trigger, enable, config.ready_active_low)
    }

    /// Give the peripherals back.
    pub fn release(self) -> (SPI, READY, TRIG, EN) {
        (self.spi, self.ready, self.trigger, self.enable)
    }
}

fn drive(pin: &mut impl OutputPin, high: bool) -> Result<(), HardwareError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|_| HardwareError::PinWrite)
}

impl<SPI, READY, TRIG, EN> ProbeHardware for HalProbe<SPI, READY, TRIG, EN>
where
    SPI: SpiDevice,
    READY: InputPin,
    TRIG: OutputPin,
    EN: OutputPin,
{
    fn adc_ready(&mut self) -> Result<bool, HardwareError> {
        let high = self.ready.is_high().map_err(|_| HardwareError::PinRead)?;
        Ok(high != self.ready_active_low)
    }

    fn spi_exchange(&mut self, frame: &mut [u8; 3]) -> Result<(), HardwareError> {
        self.spi
            .transfer_in_place(frame)
            .map_err(|_| HardwareError::SpiTransfer)
    }

    fn set_trigger(&mut self, high: bool) {
        if let Err(e) = drive(&mut self.trigger, high) {
            error!("Trigger pin: {}", e);
        }
    }

    fn set_enable(&mut self, high: bool) {
        if let Err(e) = drive(&mut self.enable, high) {
            error!("Enable pin: {}", e);
        }
    }
}
