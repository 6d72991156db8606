//! The `Machine` chassis: owns the CPU, core memory and IOT dispatcher and
//! wires them together for a single caller to drive.

use crate::cpu::{Cpu, StepKind};
use crate::iot::{IotDevice, IotDispatcher};
use crate::memory::Memory;
use crate::panel::{dispatch as panel_dispatch, PanelCommand};
use crate::registers::Mb;

/// Construction-time configuration. Config is passed by constructor
/// parameter, never read from the environment or a file.
#[derive(Debug, Clone, Copy)]
pub struct MachineConfig {
    pub fields: u8,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self { fields: 1 }
    }
}

pub struct Machine {
    pub cpu: Cpu,
    pub memory: Memory,
    pub iot: IotDispatcher,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            memory: Memory::new(config.fields),
            iot: IotDispatcher::new(),
        }
    }

    pub fn register_device(&mut self, device: u8, handler: Box<dyn IotDevice>) {
        self.iot.register(device, handler);
    }

    /// Advances one cycle sub-state, syncing `interrupt_request` from the
    /// registered devices first (§5: the interrupt line is the logical OR
    /// of every device's request).
    pub fn cycle_step(&mut self) {
        self.cpu.interrupt_request = self.iot.any_interrupt_request();
        self.cpu.step(StepKind::Cycle, &mut self.memory, &mut self.iot);
    }

    /// Advances one full instruction (through to the next Fetch).
    pub fn instruction_step(&mut self) {
        self.cpu.interrupt_request = self.iot.any_interrupt_request();
        self.cpu
            .step(StepKind::Instruction, &mut self.memory, &mut self.iot);
    }

    /// Runs instructions until `halt` or `idle` becomes set, or the panel
    /// clears `run`.
    pub fn run(&mut self) {
        while self.cpu.run && !self.cpu.halt && !self.cpu.idle {
            self.instruction_step();
        }
    }

    pub fn panel(&mut self, command: PanelCommand) -> Option<Mb> {
        panel_dispatch(&mut self.cpu, &mut self.memory, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{install_rim, RIM_LOADER, RIM_LOADER_START};

    #[test]
    fn machine_runs_to_halt_instruction() {
        let mut machine = Machine::new(MachineConfig { fields: 1 });
        machine.memory.write(0, 0o200, 0o7402); // HLT
        machine.cpu.pc.set(0o200);
        machine.run();
        assert!(machine.cpu.halt);
    }

    #[test]
    fn install_rim_through_machine() {
        let mut machine = Machine::new(MachineConfig { fields: 1 });
        install_rim(&mut machine.cpu, &mut machine.memory);
        assert_eq!(
            machine.memory.read(0, RIM_LOADER_START).data(),
            RIM_LOADER[0]
        );
    }

    #[test]
    fn panel_stop_halts_the_run_loop() {
        let mut machine = Machine::new(MachineConfig { fields: 1 });
        machine.memory.write(0, 0o200, 0o7000); // NOP OPR, never halts
        machine.cpu.pc.set(0o200);
        machine.panel(PanelCommand::Stop);
        machine.run();
        assert_eq!(machine.cpu.pc.get(), 0o200); // loop never entered
    }
}
