//! Wire encodings for the actuator controller.
//!
//! Two firmware generations exist and both stay supported:
//! - *compact*: one raw byte per command. LED ON for channel i is ASCII
//!   `'0'+i`, OFF is `'A'+i`. The pump is a single shared channel (`'P'`/`'p'`);
//!   the indicator bank is not representable at all.
//! - *text*: newline-terminated `<DOMAIN>_<ON|OFF> <index>` lines with
//!   DOMAIN ∈ {LED, PUMP, WAIT}, each fully addressing one channel.
//!
//! Encoding is a pure function of `(command, variant)`: commands are
//! state-setting, never edge-triggered, so re-sending an OFF to an already-off
//! channel emits identical bytes.

use crate::config::ProtocolVariant;

/// One logical actuator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch a game LED
    Led {
        /// Channel index 0..8
        index: u8,
        /// Desired state
        on: bool,
    },
    /// Switch a water pump
    Pump {
        /// Channel index 0..8 (ignored by the compact variant's shared channel)
        index: u8,
        /// Desired state
        on: bool,
    },
    /// Switch a player-count indicator LED
    Indicator {
        /// Indicator index 0..4
        index: u8,
        /// Desired state
        on: bool,
    },
}

/// Encode `command` for `variant`. Returns `None` when the variant cannot
/// express the command (compact has no indicator bank); the caller drops it.
pub fn encode(command: Command, variant: ProtocolVariant) -> Option<Vec<u8>> {
    match variant {
        ProtocolVariant::Compact => encode_compact(command),
        ProtocolVariant::Text => Some(encode_text(command)),
    }
}

fn encode_compact(command: Command) -> Option<Vec<u8>> {
    match command {
        Command::Led { index, on } => {
            let byte = if on { b'0' + index } else { b'A' + index };
            Some(vec![byte])
        }
        // Single shared pump channel; per-index addressing does not exist
        Command::Pump { on, .. } => Some(vec![if on { b'P' } else { b'p' }]),
        Command::Indicator { .. } => None,
    }
}

fn encode_text(command: Command) -> Vec<u8> {
    let (domain, index, on) = match command {
        Command::Led { index, on } => ("LED", index, on),
        Command::Pump { index, on } => ("PUMP", index, on),
        Command::Indicator { index, on } => ("WAIT", index, on),
    };
    let state = if on { "ON" } else { "OFF" };
    format!("{}_{} {}\n", domain, state, index).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lines_cover_all_domains() {
        let cases = [
            (Command::Led { index: 3, on: true }, "LED_ON 3\n"),
            (Command::Led { index: 0, on: false }, "LED_OFF 0\n"),
            (Command::Pump { index: 7, on: true }, "PUMP_ON 7\n"),
            (Command::Indicator { index: 2, on: false }, "WAIT_OFF 2\n"),
        ];
        for (command, expected) in cases {
            assert_eq!(
                encode(command, ProtocolVariant::Text),
                Some(expected.as_bytes().to_vec())
            );
        }
    }

    #[test]
    fn compact_led_bytes_span_both_ranges() {
        assert_eq!(
            encode(Command::Led { index: 0, on: true }, ProtocolVariant::Compact),
            Some(vec![b'0'])
        );
        assert_eq!(
            encode(Command::Led { index: 7, on: true }, ProtocolVariant::Compact),
            Some(vec![b'7'])
        );
        assert_eq!(
            encode(Command::Led { index: 0, on: false }, ProtocolVariant::Compact),
            Some(vec![b'A'])
        );
        assert_eq!(
            encode(Command::Led { index: 7, on: false }, ProtocolVariant::Compact),
            Some(vec![b'H'])
        );
    }

    #[test]
    fn compact_pump_is_shared() {
        let a = encode(Command::Pump { index: 0, on: true }, ProtocolVariant::Compact);
        let b = encode(Command::Pump { index: 6, on: true }, ProtocolVariant::Compact);
        assert_eq!(a, b);
        assert_eq!(a, Some(vec![b'P']));
    }

    #[test]
    fn compact_indicator_unrepresentable() {
        assert_eq!(
            encode(
                Command::Indicator { index: 1, on: true },
                ProtocolVariant::Compact
            ),
            None
        );
    }

    #[test]
    fn encoding_is_a_pure_function_of_command_and_variant() {
        // State-setting semantics: repeated encodes of the same command are
        // byte-identical regardless of any prior command.
        let off = Command::Led { index: 4, on: false };
        for variant in [ProtocolVariant::Compact, ProtocolVariant::Text] {
            let first = encode(off, variant);
            let _ = encode(Command::Led { index: 4, on: true }, variant);
            let second = encode(off, variant);
            assert_eq!(first, second);
        }
    }
}
