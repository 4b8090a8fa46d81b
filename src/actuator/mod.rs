//! Gateway to the external actuator controller.
//!
//! Serializes logical LED/pump/indicator commands into the configured wire
//! protocol and writes them to the serial channel. Writes are fallible and the
//! game loop logs-and-discards failures: a stalled or disconnected board
//! degrades feedback, never the round. Only the initial open is fatal — the
//! game cannot run without actuator feedback at all.

pub mod protocol;

use crate::config::{GameConfig, ProtocolVariant};
use crate::{GameError, Result, CHANNEL_COUNT, INDICATOR_COUNT};
use log::debug;
use protocol::Command;
use serialport::SerialPort;
use std::io::Write;
use std::time::Duration;

/// Read/write timeout applied to the serial port
const SERIAL_TIMEOUT: Duration = Duration::from_millis(250);

/// Open the configured serial port and wait out the controller's reset window
/// before the first command may be sent. Fails fast when the device is absent.
pub fn open(config: &GameConfig) -> Result<ActuatorGateway<Box<dyn SerialPort>>> {
    let port = serialport::new(config.serial_port.as_str(), config.baud_rate)
        .timeout(SERIAL_TIMEOUT)
        .open()?;
    debug!(
        "opened {} at {} baud, settling {:?}",
        config.serial_port,
        config.baud_rate,
        config.settle()
    );
    // The controller resets on connect; commands sent before it has booted
    // are lost.
    std::thread::sleep(config.settle());
    Ok(ActuatorGateway::new(port, config.protocol))
}

/// Serial-protocol boundary to the controller driving LEDs, pumps and the
/// indicator bank
pub struct ActuatorGateway<W: Write> {
    port: W,
    variant: ProtocolVariant,
    dropped: u64,
}

impl<W: Write> ActuatorGateway<W> {
    /// Wrap an already-open channel speaking `variant`
    pub fn new(port: W, variant: ProtocolVariant) -> Self {
        ActuatorGateway {
            port,
            variant,
            dropped: 0,
        }
    }

    /// Switch one game LED
    pub fn set_led(&mut self, index: u8, on: bool) -> Result<()> {
        self.send(Command::Led { index, on })
    }

    /// Switch one water pump
    pub fn set_pump(&mut self, index: u8, on: bool) -> Result<()> {
        self.send(Command::Pump { index, on })
    }

    /// Switch one indicator LED of the player-count bank
    pub fn set_indicator(&mut self, index: u8, on: bool) -> Result<()> {
        self.send(Command::Indicator { index, on })
    }

    /// Switch several LEDs on. Purely repeated single-channel commands; there
    /// is no atomic multi-channel frame, so partial application under a fault
    /// is possible and accepted.
    pub fn leds_on(&mut self, indices: impl IntoIterator<Item = u8>) -> Result<()> {
        self.send_each(indices.into_iter().map(|index| Command::Led { index, on: true }))
    }

    /// Switch several LEDs off
    pub fn leds_off(&mut self, indices: impl IntoIterator<Item = u8>) -> Result<()> {
        self.send_each(indices.into_iter().map(|index| Command::Led { index, on: false }))
    }

    /// Clear every LED, pump and indicator channel. Used on the failure path
    /// and at shutdown; leaving a pump energized is a defect.
    pub fn all_off(&mut self) -> Result<()> {
        let leds = (0..CHANNEL_COUNT).map(|index| Command::Led { index, on: false });
        let pumps = (0..CHANNEL_COUNT).map(|index| Command::Pump { index, on: false });
        let indicators = (0..INDICATOR_COUNT).map(|index| Command::Indicator { index, on: false });
        self.send_each(leds.chain(pumps).chain(indicators))
    }

    /// Commands dropped because of write failures since construction
    pub fn dropped_commands(&self) -> u64 {
        self.dropped
    }

    /// Attempt every command even after a failure, reporting the first error
    fn send_each(&mut self, commands: impl Iterator<Item = Command>) -> Result<()> {
        let mut first_err = None;
        for command in commands {
            if let Err(e) = self.send(command) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn send(&mut self, command: Command) -> Result<()> {
        let (index, limit) = match command {
            Command::Led { index, .. } | Command::Pump { index, .. } => (index, CHANNEL_COUNT),
            Command::Indicator { index, .. } => (index, INDICATOR_COUNT),
        };
        if index >= limit {
            return Err(GameError::InvalidChannel(index));
        }

        let Some(frame) = protocol::encode(command, self.variant) else {
            debug!("{:?} not representable in {:?}, dropped", command, self.variant);
            return Ok(());
        };
        self.port
            .write_all(&frame)
            .and_then(|()| self.port.flush())
            .map_err(|e| {
                self.dropped += 1;
                GameError::ActuatorIo(e)
            })
    }

    /// Emitted wire bytes, for assertions
    #[cfg(test)]
    pub(crate) fn port(&self) -> &W {
        &self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn text_gateway() -> ActuatorGateway<Vec<u8>> {
        ActuatorGateway::new(Vec::new(), ProtocolVariant::Text)
    }

    #[test]
    fn led_commands_hit_the_wire() {
        let mut gateway = text_gateway();
        gateway.set_led(3, true).expect("send");
        gateway.set_led(3, false).expect("send");
        assert_eq!(gateway.port(), b"LED_ON 3\nLED_OFF 3\n");
    }

    #[test]
    fn compact_variant_emits_single_bytes() {
        let mut gateway = ActuatorGateway::new(Vec::new(), ProtocolVariant::Compact);
        gateway.set_led(2, true).expect("send");
        gateway.set_led(2, false).expect("send");
        gateway.set_pump(5, true).expect("send");
        assert_eq!(gateway.port(), b"2CP");
    }

    #[test]
    fn compact_indicator_silently_dropped() {
        let mut gateway = ActuatorGateway::new(Vec::new(), ProtocolVariant::Compact);
        gateway.set_indicator(1, true).expect("unrepresentable is ok");
        assert!(gateway.port().is_empty());
        assert_eq!(gateway.dropped_commands(), 0);
    }

    #[test]
    fn out_of_range_channels_rejected() {
        let mut gateway = text_gateway();
        assert!(matches!(
            gateway.set_led(8, true),
            Err(GameError::InvalidChannel(8))
        ));
        assert!(matches!(
            gateway.set_indicator(4, true),
            Err(GameError::InvalidChannel(4))
        ));
    }

    #[test]
    fn all_off_covers_every_channel() {
        let mut gateway = text_gateway();
        gateway.all_off().expect("send");
        let wire = String::from_utf8(gateway.port().clone()).expect("utf8");
        let lines: Vec<&str> = wire.lines().collect();
        assert_eq!(lines.len(), 20); // 8 LEDs + 8 pumps + 4 indicators
        assert!(lines.contains(&"LED_OFF 7"));
        assert!(lines.contains(&"PUMP_OFF 0"));
        assert!(lines.contains(&"WAIT_OFF 3"));
        assert!(lines.iter().all(|l| l.contains("_OFF ")));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_surface_and_are_counted() {
        let mut gateway = ActuatorGateway::new(BrokenPipe, ProtocolVariant::Text);
        assert!(matches!(
            gateway.set_pump(0, true),
            Err(GameError::ActuatorIo(_))
        ));
        assert_eq!(gateway.dropped_commands(), 1);

        // Batch helpers keep attempting the remaining channels
        assert!(gateway.leds_off(0..CHANNEL_COUNT).is_err());
        assert_eq!(gateway.dropped_commands(), 9);
    }
}
