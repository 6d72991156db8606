//! Instruction cycle (C4): Fetch -> (Defer) -> Execute -> Interrupt -> Fetch.

use super::operate::execute_opr;
use super::{Cpu, CycleState, Instruction, OP_CLSC, OP_KSF};
use crate::iot::IotDispatcher;
use crate::memory::Memory;
use crate::registers::Ma;

/// Which stepping granularity [`Cpu::step`] was asked to run to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Advance exactly one cycle sub-state.
    Cycle,
    /// Run cycle sub-states until the next Fetch.
    Instruction,
}

impl Cpu {
    /// Advances exactly one cycle sub-state.
    pub fn cycle_step(&mut self, memory: &mut Memory, iot: &mut IotDispatcher) {
        match self.cycle_state {
            CycleState::Fetch => self.fetch(memory),
            CycleState::Defer => self.defer(memory),
            CycleState::Execute => self.execute(memory, iot),
            CycleState::Interrupt => self.interrupt_substate(memory),
            CycleState::Pause => {}
        }
    }

    /// Runs cycle sub-states until the machine is back at Fetch (§4.3: "the
    /// CPU exposes two stepping granularities").
    pub fn instruction_step(&mut self, memory: &mut Memory, iot: &mut IotDispatcher) {
        self.cycle_step(memory, iot);
        while self.cycle_state != CycleState::Fetch {
            self.cycle_step(memory, iot);
        }
    }

    pub fn step(&mut self, kind: StepKind, memory: &mut Memory, iot: &mut IotDispatcher) {
        match kind {
            StepKind::Cycle => self.cycle_step(memory, iot),
            StepKind::Instruction => self.instruction_step(memory, iot),
        }
    }

    fn fetch(&mut self, memory: &mut Memory) {
        let if_field = self.field.instruction_field();
        let pc = self.pc.get();
        self.ma = Ma::new(if_field, pc);
        self.mb = memory.read(if_field, pc);
        self.ir.load(self.mb.data());
        self.pc.advance();

        let instr = Instruction::decode(self.ir.opcode());
        if instr.is_memory_reference() {
            let mut ma = self.ma;
            ma.set_word_addr(self.ir.addr());
            if self.ir.page() {
                ma.set_page_addr((self.pc.get() >> 7) & 0o37);
            } else {
                ma.set_page_addr(0);
            }
            self.ma = ma;
        }

        self.cycle_state = if instr.is_memory_reference() && self.ir.indirect() {
            CycleState::Defer
        } else {
            CycleState::Execute
        };
    }

    fn defer(&mut self, memory: &mut Memory) {
        let mut ma = self.ma;
        let autoincrement =
            ma.page_addr() == 0 && (ma.word_addr() & 0o170) == 0o010;
        if autoincrement {
            let cell = memory.read(ma.field(), ma.page_word_addr());
            memory.write(ma.field(), ma.page_word_addr(), cell.data().wrapping_add(1) & 0o7777);
        }
        let mb = memory.read(ma.field(), ma.page_word_addr());
        ma.set_page_word_addr(mb.data());

        let instr = Instruction::decode(self.ir.opcode());
        if matches!(
            instr,
            Instruction::And | Instruction::Tad | Instruction::Isz | Instruction::Dca
        ) {
            ma.set_field(self.field.data_field());
        }
        self.ma = ma;
        self.mb = mb;
        self.cycle_state = CycleState::Execute;
    }

    fn execute(&mut self, memory: &mut Memory, iot: &mut IotDispatcher) {
        match Instruction::decode(self.ir.opcode()) {
            Instruction::And => {
                let word = memory.read(self.ma.field(), self.ma.page_word_addr()).data();
                self.lac.set_acc(self.lac.acc() & word);
            }
            Instruction::Tad => {
                let word = memory.read(self.ma.field(), self.ma.page_word_addr()).data();
                self.lac.add_to_arithmetic(word);
            }
            Instruction::Isz => {
                let field = self.ma.field();
                let addr = self.ma.page_word_addr();
                let incremented = memory.read(field, addr).data().wrapping_add(1) & 0o7777;
                memory.write(field, addr, incremented);
                if incremented == 0 {
                    self.pc.advance();
                }
            }
            Instruction::Dca => {
                memory.write(self.ma.field(), self.ma.page_word_addr(), self.lac.acc());
                self.lac.set_acc(0);
            }
            Instruction::Jms => {
                memory.write(self.ma.field(), self.ma.page_word_addr(), self.pc.get());
                self.pc.set(self.ma.page_word_addr().wrapping_add(1) & 0o7777);
                self.interrupt_deferred = false;
                self.field
                    .set_instruction_field(self.field.instruction_buffer());
            }
            Instruction::Jmp => self.execute_jmp(memory),
            Instruction::Iot => iot.dispatch(self, memory),
            Instruction::Opr => execute_opr(self),
        }
        self.cycle_state = CycleState::Interrupt;
    }

    fn execute_jmp(&mut self, memory: &Memory) {
        let target = self.ma.page_word_addr();
        if !self.ir.indirect() {
            let pc = self.pc.get();
            if target == pc.wrapping_sub(2) & 0o7777 {
                let word = memory.read(self.field.instruction_field(), target).data();
                if word == OP_KSF || word == OP_CLSC {
                    self.idle = true;
                }
            }
            if target == pc.wrapping_sub(1) & 0o7777 {
                if self.interrupt_enable || self.interrupt_delayed > 0 {
                    self.interrupt_enable = true;
                    self.interrupt_delayed = 0;
                    self.idle = true;
                    self.short_jmp = true;
                } else {
                    self.halt = true;
                }
            }
        }

        if self.short_jmp {
            self.short_jmp = false;
        } else {
            self.pc.set(target);
            self.interrupt_deferred = false;
            self.field
                .set_instruction_field(self.field.instruction_buffer());
        }
    }

    fn interrupt_substate(&mut self, memory: &mut Memory) {
        if self.interrupt_enable && self.interrupt_request && !self.interrupt_deferred {
            self.save_field = self.field;
            self.save_user_flag = false;
            self.field.set_instruction_field(0);
            self.field.set_data_field(0);
            self.field.set_instruction_buffer(0);
            memory.write(0, 0, self.pc.get());
            self.pc.set(1);
            self.interrupt_enable = false;
        }
        if self.interrupt_delayed > 0 {
            self.interrupt_delayed -= 1;
            if self.interrupt_delayed == 0 {
                self.interrupt_enable = true;
            }
        }
        self.cycle_state = CycleState::Fetch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iot::IotDispatcher;

    fn assemble_word(opcode: u8, indirect: bool, page: bool, addr: u16) -> u16 {
        (u16::from(opcode) << 9)
            | (u16::from(indirect) << 8)
            | (u16::from(page) << 7)
            | (addr & 0o177)
    }

    #[test]
    fn fetch_advances_pc_by_one() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        let mut iot = IotDispatcher::new();
        cpu.pc.set(0o200);
        mem.write(0, 0o200, 0o7402); // HLT
        cpu.cycle_step(&mut mem, &mut iot);
        assert_eq!(cpu.pc.get(), 0o201);
        assert_eq!(cpu.cycle_state, CycleState::Execute);
    }

    #[test]
    fn scenario_b_tad_indirect_autoincrement() {
        // Autoincrement slots (010..017 of page 0) are incremented in
        // place and the *new* value is reread as the dereferenced address
        // (the original implementation's defer() rereads the same cell
        // after writing back cell+1). The operand therefore lives at the
        // post-increment address, one past the slot's starting value.
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        let mut iot = IotDispatcher::new();
        mem.write(0, 0o010, 0o0000); // autoincrement slot
        mem.write(0, 0o0001, 0o0001); // operand at the post-increment address
        // TAD I 010 (opcode TAD=1, indirect, zero-page, addr 010)
        mem.write(0, 0o201, assemble_word(1, true, false, 0o010));
        cpu.pc.set(0o201);
        cpu.lac.set_acc(0);
        cpu.lac.set_link(0);

        cpu.instruction_step(&mut mem, &mut iot);

        assert_eq!(mem.read(0, 0o010).data(), 0o0001);
        assert_eq!(cpu.lac.acc(), 0o0001);
        assert_eq!(cpu.lac.link(), 0);
    }

    #[test]
    fn scenario_c_jmp_dot_minus_one_idles() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        let mut iot = IotDispatcher::new();
        mem.write(0, 0o200, OP_KSF);
        mem.write(0, 0o201, assemble_word(5, false, true, 0o200)); // JMP 0200
        cpu.pc.set(0o200);
        cpu.interrupt_enable = true;

        cpu.instruction_step(&mut mem, &mut iot); // KSF (unregistered device -> no-op)
        cpu.instruction_step(&mut mem, &mut iot); // JMP 0200

        assert!(cpu.idle);
    }

    #[test]
    fn scenario_d_jmp_dot_halts_when_interrupts_disabled() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        let mut iot = IotDispatcher::new();
        mem.write(0, 0o200, 0o6002); // IOF
        mem.write(0, 0o201, assemble_word(5, false, true, 0o201)); // JMP .
        cpu.pc.set(0o200);
        cpu.interrupt_enable = true;

        cpu.instruction_step(&mut mem, &mut iot); // IOF
        cpu.instruction_step(&mut mem, &mut iot); // JMP .

        assert!(cpu.halt);
    }

    #[test]
    fn scenario_e_isz_boundary_skip() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        let mut iot = IotDispatcher::new();
        mem.write(0, 0o177, 0o7777);
        mem.write(0, 0o200, assemble_word(2, false, true, 0o177)); // ISZ 0177
        mem.write(0, 0o201, 0o7402); // HLT (skipped)
        mem.write(0, 0o202, 0o7402); // HLT (landed on)
        cpu.pc.set(0o200);

        cpu.instruction_step(&mut mem, &mut iot); // ISZ
        assert_eq!(mem.read(0, 0o177).data(), 0);
        assert_eq!(cpu.pc.get(), 0o202);
    }

    #[test]
    fn interrupt_fires_between_instructions_when_enabled() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        let mut iot = IotDispatcher::new();
        mem.write(0, 0o200, 0o7000); // NOP-equivalent OPR (no bits set)
        cpu.pc.set(0o200);
        cpu.interrupt_enable = true;
        cpu.interrupt_request = true;

        cpu.instruction_step(&mut mem, &mut iot);

        assert_eq!(cpu.pc.get(), 1);
        assert_eq!(mem.read(0, 0).data(), 0o201);
        assert!(!cpu.interrupt_enable);
    }

    #[test]
    fn interrupt_enable_false_blocks_interrupt_substate() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new(1);
        let mut iot = IotDispatcher::new();
        mem.write(0, 0o200, 0o7000);
        cpu.pc.set(0o200);
        cpu.interrupt_enable = false;
        cpu.interrupt_request = true;

        cpu.instruction_step(&mut mem, &mut iot);

        assert_eq!(cpu.pc.get(), 0o201);
        assert_eq!(mem.read(0, 0).data(), 0);
    }
}
