//! Front-panel command channel (§6.4): Start/LoadAddress/Deposit/Examine/
//! Continue/Stop.

use crate::cpu::Cpu;
use crate::memory::Memory;
use crate::registers::Mb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Start,
    LoadAddress(u16),
    Deposit(u16),
    Examine,
    Continue,
    Stop,
}

/// Runs one panel command. Only `Examine` produces a value.
pub fn dispatch(cpu: &mut Cpu, memory: &mut Memory, command: PanelCommand) -> Option<Mb> {
    match command {
        PanelCommand::Start => {
            cpu.lac.clear();
            cpu.halt = false;
            cpu.run = true;
            None
        }
        PanelCommand::LoadAddress(switch_register) => {
            cpu.load_address(switch_register);
            None
        }
        PanelCommand::Deposit(data) => {
            cpu.deposit(memory, data);
            None
        }
        PanelCommand::Examine => Some(cpu.examine(memory)),
        PanelCommand::Continue => {
            cpu.halt = false;
            cpu.run = true;
            None
        }
        PanelCommand::Stop => {
            cpu.run = false;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_address_sets_pc_and_fields() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        dispatch(&mut cpu, &mut mem, PanelCommand::LoadAddress(0o200));
        assert_eq!(cpu.pc.get(), 0o200);
    }

    #[test]
    fn deposit_then_examine_round_trips_through_address() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        dispatch(&mut cpu, &mut mem, PanelCommand::LoadAddress(0o200));
        dispatch(&mut cpu, &mut mem, PanelCommand::Deposit(0o1234));
        assert_eq!(cpu.pc.get(), 0o201);

        dispatch(&mut cpu, &mut mem, PanelCommand::LoadAddress(0o200));
        let word = dispatch(&mut cpu, &mut mem, PanelCommand::Examine).unwrap();
        assert_eq!(word.data(), 0o1234);
        assert_eq!(cpu.pc.get(), 0o201);
    }

    #[test]
    fn stop_then_continue_toggles_run() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        dispatch(&mut cpu, &mut mem, PanelCommand::Stop);
        assert!(!cpu.run);
        dispatch(&mut cpu, &mut mem, PanelCommand::Continue);
        assert!(cpu.run);
    }

    #[test]
    fn start_clears_accumulator() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        cpu.lac.set_acc(0o1234);
        cpu.halt = true;
        dispatch(&mut cpu, &mut mem, PanelCommand::Start);
        assert_eq!(cpu.lac.acc(), 0);
        assert!(!cpu.halt);
    }
}
