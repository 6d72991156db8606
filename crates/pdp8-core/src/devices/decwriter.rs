//! DECwriter console teleprinter (C7): the keyboard (device 3) and printer
//! (device 4) halves, fed and drained by an external text source/sink
//! rather than by real serial hardware. Pulse assignments are not fixed by
//! either the original implementation (which left the teleprinter
//! unimplemented) or the specification text beyond their names; the
//! numbering below is a self-consistent choice recorded in DESIGN.md.

use std::collections::VecDeque;

use crate::cpu::Cpu;
use crate::iot::IotDevice;

pub const KEYBOARD_DEVICE: u8 = 3;
pub const PRINTER_DEVICE: u8 = 4;

/// Keyboard half: KSF(1)/KCF(2)/KRS(4)/KIE(5)/KRB(6). Pulse 1 matches
/// `cpu::OP_KSF` (word 06031) so the idle detector recognizes a real KSF
/// poll loop.
#[derive(Debug, Default)]
pub struct Keyboard {
    buffer: VecDeque<u8>,
    flag: bool,
    interrupt_enable: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues input bytes from the host; raises the flag while unread input
    /// remains.
    pub fn feed(&mut self, text: &str) {
        self.buffer.extend(text.bytes());
        if !self.buffer.is_empty() {
            self.flag = true;
        }
    }
}

impl IotDevice for Keyboard {
    fn operation(&mut self, cpu: &mut Cpu, _device: u8, opcode: u8) {
        match opcode {
            // KSF at device 3 pulse 1 assembles to word 06031, matching
            // `cpu::OP_KSF` used by the JMP idle detector.
            1 => {
                if self.flag {
                    cpu.pc.advance();
                }
            }
            2 => self.flag = false, // KCF
            4 => {
                // KRS: read the pending character without consuming it.
                if let Some(&byte) = self.buffer.front() {
                    cpu.lac.set_ascii(byte);
                }
            }
            5 => self.interrupt_enable = true, // KIE
            6 => {
                // KRB: read and consume one character.
                if let Some(byte) = self.buffer.pop_front() {
                    cpu.lac.set_ascii(byte);
                }
                self.flag = !self.buffer.is_empty();
            }
            _ => {}
        }
    }

    fn interrupt_request(&self) -> bool {
        self.interrupt_enable && self.flag
    }

    fn reset(&mut self) {
        self.flag = false;
        self.interrupt_enable = false;
    }
}

/// Printer half: TFL(1)/TSF(2)/TCF(4)/TPC(5)/TSK(6)/TLS(7).
#[derive(Debug, Default)]
pub struct Printer {
    output: Vec<u8>,
    flag: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains everything printed since the last drain.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl IotDevice for Printer {
    fn operation(&mut self, cpu: &mut Cpu, _device: u8, opcode: u8) {
        match opcode {
            1 => self.flag = true, // TFL
            2 => {
                // TSF
                if self.flag {
                    cpu.pc.advance();
                }
            }
            4 => self.flag = false,                 // TCF
            5 => self.output.push(cpu.lac.ascii()),  // TPC
            6 => {
                // TSK
                if self.flag {
                    cpu.pc.advance();
                }
            }
            7 => {
                // TLS: print and raise the flag on completion.
                self.output.push(cpu.lac.ascii());
                self.flag = true;
            }
            _ => {}
        }
    }

    fn interrupt_request(&self) -> bool {
        self.flag
    }

    fn reset(&mut self) {
        self.flag = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Cpu;

    #[test]
    fn keyboard_feed_then_krb_dequeues_one_char() {
        let mut kb = Keyboard::new();
        let mut cpu = Cpu::new();
        kb.feed("AB");
        kb.operation(&mut cpu, KEYBOARD_DEVICE, 6); // KRB
        assert_eq!(cpu.lac.ascii(), b'A');
        assert!(kb.flag); // one character remains queued
    }

    #[test]
    fn keyboard_ksf_skips_when_flag_set() {
        let mut kb = Keyboard::new();
        let mut cpu = Cpu::new();
        cpu.pc.set(0o200);
        kb.feed("A");
        kb.operation(&mut cpu, KEYBOARD_DEVICE, 1);
        assert_eq!(cpu.pc.get(), 0o201);
    }

    #[test]
    fn printer_tls_buffers_output_and_raises_flag() {
        let mut printer = Printer::new();
        let mut cpu = Cpu::new();
        cpu.lac.set_ascii(b'X');
        printer.operation(&mut cpu, PRINTER_DEVICE, 7);
        assert_eq!(printer.take_output(), vec![b'X']);
        assert!(printer.interrupt_request());
    }

    #[test]
    fn printer_tcf_clears_flag() {
        let mut printer = Printer::new();
        let mut cpu = Cpu::new();
        printer.operation(&mut cpu, PRINTER_DEVICE, 1);
        printer.operation(&mut cpu, PRINTER_DEVICE, 4);
        assert!(!printer.interrupt_request());
    }
}
