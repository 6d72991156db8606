//! CPU state (C3) and the fetch/defer/execute/interrupt cycle (C4).

mod cycle;
mod operate;

pub use cycle::StepKind;

use crate::memory::Memory;
use crate::registers::{FieldRegister, Ir, Lac, Ma, Mb, Pc};

/// Opcode values of the eight PDP-8 instructions, as they appear in IR bits
/// 9..11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    And = 0,
    Tad = 1,
    Isz = 2,
    Dca = 3,
    Jms = 4,
    Jmp = 5,
    Iot = 6,
    Opr = 7,
}

impl Instruction {
    pub fn decode(opcode: u8) -> Self {
        match opcode & 0o7 {
            0 => Self::And,
            1 => Self::Tad,
            2 => Self::Isz,
            3 => Self::Dca,
            4 => Self::Jms,
            5 => Self::Jmp,
            6 => Self::Iot,
            _ => Self::Opr,
        }
    }

    pub fn is_memory_reference(self) -> bool {
        matches!(
            self,
            Self::And | Self::Tad | Self::Isz | Self::Dca | Self::Jms | Self::Jmp
        )
    }
}

/// Sub-state of the instruction cycle (§3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Fetch,
    Defer,
    Execute,
    Interrupt,
    Pause,
}

/// Opcodes recognized by the JMP idle detector (§4.4).
pub const OP_KSF: u16 = 0o6031;
pub const OP_CLSC: u16 = 0o6053;

/// CPU-internal architectural state: registers, field selectors and the
/// flags that drive the instruction cycle. Owns no memory and no IOT
/// devices — those are supplied to [`Cpu::cycle_step`] by the caller
/// (normally [`crate::machine::Machine`]).
#[derive(Debug, Clone, Default)]
pub struct Cpu {
    pub pc: Pc,
    pub lac: Lac,
    pub mq: u16,
    pub sc: u8,
    pub sr: u16,
    pub ir: Ir,
    pub ma: Ma,
    pub mb: Mb,
    pub field: FieldRegister,
    /// (user flag, instruction field, data field) captured at interrupt
    /// entry and restored by RTF-style bookkeeping. The PDP-8/I has no user
    /// flag of its own; it is tracked here for interrupt-frame completeness
    /// and is always false.
    pub save_field: FieldRegister,
    pub save_user_flag: bool,

    pub cycle_state: CycleState,
    pub interrupt_enable: bool,
    pub interrupt_request: bool,
    pub interrupt_deferred: bool,
    /// Implements the ION two-instruction delay: counts down to 0, at which
    /// point `interrupt_enable` becomes true.
    pub interrupt_delayed: u8,
    pub halt: bool,
    pub run: bool,
    pub idle: bool,
    pub greater_than: bool,
    pub short_jmp: bool,
    pub error: bool,

    /// EAE mode B (SWAB/SWBA), §4.6 Group 3.
    pub eae_mode_b: bool,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            run: true,
            ..Self::default()
        }
    }

    /// PC ← switch register; DF ← SR[9..11]; IF ← SR[6..8] (§6.4 LoadAddress).
    pub fn load_address(&mut self, switch_register: u16) {
        self.sr = switch_register & 0o7777;
        self.pc.set(switch_register & 0o7777);
        self.field.set_data_field(((switch_register >> 9) & 0o7) as u8);
        self.field
            .set_instruction_field(((switch_register >> 6) & 0o7) as u8);
    }

    /// `deposit`/C11: memory[IF, PC] ← data; PC++.
    pub fn deposit(&mut self, memory: &mut Memory, data: u16) {
        let field = self.field.instruction_field();
        let addr = self.pc.get();
        memory.write(field, addr, data);
        self.pc.advance();
    }

    /// `examine`/C11: word ← memory[IF, PC]; PC++; returns the word read.
    pub fn examine(&mut self, memory: &Memory) -> Mb {
        let field = self.field.instruction_field();
        let addr = self.pc.get();
        let mb = memory.read(field, addr);
        self.pc.advance();
        mb
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
