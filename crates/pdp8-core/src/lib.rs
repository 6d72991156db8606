//! PDP-8/I CPU, core memory and IOT device emulation.
//!
//! `pdp8_core` models the register bit-slice algebra, multi-field core
//! memory, fetch/defer/execute/interrupt instruction cycle, operate-group
//! microcode, IOT dispatch and the reference devices of a PDP-8/I family
//! minicomputer, plus the bootstrap loaders and front-panel command channel
//! used to get a program running on one.

pub mod cpu;
pub mod devices;
pub mod iot;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod panel;
pub mod register;
pub mod registers;

pub use cpu::{Cpu, CycleState, Instruction, StepKind};
pub use iot::{IotDevice, IotDispatcher};
pub use machine::{Machine, MachineConfig};
pub use memory::Memory;
pub use panel::PanelCommand;
