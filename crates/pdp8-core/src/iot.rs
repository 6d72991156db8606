//! IOT dispatch (C6) and the peripheral device contract (C7).

use std::collections::HashMap;

use crate::cpu::Cpu;
use crate::memory::Memory;

/// Device number reserved for CPU-internal IOT pulses (SKON/ION/IOF/SRQ/
/// GTF/RTF/SGT/CAF).
pub const DEVICE_CPU: u8 = 0;
/// Device numbers reserved for memory-extension IOT pulses (CDF/CIF/RDF/
/// RIF/RIB/RMF/CINT/SINT/CUF/SUF).
pub const MEMORY_EXTENSION_RANGE: std::ops::RangeInclusive<u8> = 0o20..=0o27;

/// Capability set an external IOT device implements (§4.10, grounded on
/// the original `IOTDevice` interface).
pub trait IotDevice {
    /// Mutate device state for the given opcode (0..7, IR bits 0..2). May
    /// read or write `cpu.lac`/`cpu.pc` directly to request a skip or to
    /// transfer data, and may set `cpu.halt`.
    fn operation(&mut self, cpu: &mut Cpu, device: u8, opcode: u8);

    /// Whether the device currently asserts an interrupt.
    fn interrupt_request(&self) -> bool;

    /// Optional asynchronous service line.
    fn service_request(&self) -> bool {
        false
    }

    fn set_service_request(&mut self, _request: bool) {}

    /// Invoked by CAF (device 0, opcode 7): clear any latched device state.
    fn reset(&mut self) {}
}

/// Owns the sparse map of device-number to handler and routes IOT
/// instructions to CPU-internal, memory-extension, or external handling.
#[derive(Default)]
pub struct IotDispatcher {
    devices: HashMap<u8, Box<dyn IotDevice>>,
}

impl IotDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an external device. Panics if `device` falls in a
    /// reserved range (0 or 020..027): that is a wiring bug, not a runtime
    /// condition.
    pub fn register(&mut self, device: u8, handler: Box<dyn IotDevice>) {
        assert!(
            device != DEVICE_CPU && !MEMORY_EXTENSION_RANGE.contains(&device),
            "device {device:#o} is reserved for CPU/memory-extension IOT pulses"
        );
        self.devices.insert(device, handler);
    }

    pub fn unregister(&mut self, device: u8) {
        self.devices.remove(&device);
    }

    /// Whether any registered external device is asserting an interrupt.
    pub fn any_interrupt_request(&self) -> bool {
        self.devices.values().any(|d| d.interrupt_request())
    }

    /// Executes the IOT named by `cpu.ir`, per §4.5.
    pub fn dispatch(&mut self, cpu: &mut Cpu, memory: &Memory) {
        let device = cpu.ir.device_sel();
        let opcode = cpu.ir.device_opr();
        if device == DEVICE_CPU {
            self.dispatch_cpu(cpu, opcode);
        } else if MEMORY_EXTENSION_RANGE.contains(&device) {
            dispatch_memory_extension(cpu, memory, device);
        } else if let Some(handler) = self.devices.get_mut(&device) {
            handler.operation(cpu, device, opcode);
        }
        // No handler registered: silent no-op (§7).
    }

    fn dispatch_cpu(&mut self, cpu: &mut Cpu, opcode: u8) {
        match opcode {
            // SKON: if IE then PC++; falls through into IOF's "clear IE",
            // matching the original's intentional case fallthrough.
            0 => {
                if cpu.interrupt_enable {
                    cpu.pc.advance();
                }
                cpu.interrupt_enable = false;
            }
            // ION
            1 => cpu.interrupt_delayed = 2,
            // IOF
            2 => cpu.interrupt_enable = false,
            // SRQ
            3 => {
                if cpu.interrupt_request {
                    cpu.pc.advance();
                }
            }
            // GTF: pack link@11, GT@10, IR@9, IE@7, IF@6..4, DF@3..1 into AC.
            4 => {
                let mut ac: u16 = 0;
                ac |= cpu.lac.link() << 11;
                ac |= u16::from(cpu.greater_than) << 10;
                ac |= u16::from(cpu.interrupt_request) << 9;
                ac |= u16::from(cpu.interrupt_enable) << 7;
                ac |= u16::from(cpu.field.instruction_field()) << 4;
                ac |= u16::from(cpu.field.data_field()) << 1;
                cpu.lac.set_acc(ac);
            }
            // RTF: unpack the GTF layout back into flags and field buffers.
            5 => {
                let ac = cpu.lac.acc();
                cpu.lac.set_link((ac >> 11) & 1);
                cpu.greater_than = (ac >> 10) & 1 != 0;
                cpu.interrupt_request = (ac >> 9) & 1 != 0;
                cpu.interrupt_enable = (ac >> 7) & 1 != 0;
                cpu.interrupt_delayed = 0;
                cpu.field
                    .set_instruction_buffer(((ac >> 4) & 0o7) as u8);
                cpu.field.set_data_field(((ac >> 1) & 0o7) as u8);
            }
            // SGT
            6 => {
                if cpu.greater_than {
                    cpu.pc.advance();
                }
            }
            // CAF: PC<-0, reset IOT devices, clear LAC/IE/GT.
            7 => {
                cpu.pc.set(0);
                cpu.lac.clear();
                cpu.interrupt_enable = false;
                cpu.interrupt_delayed = 0;
                cpu.greater_than = false;
                for device in self.devices.values_mut() {
                    device.reset();
                }
            }
            _ => {}
        }
    }
}

/// CDF (pulse bit 0) and CIF (pulse bit 1) on devices 020..027; the field
/// operand is the instruction word's bits 3..5. RDF/RIF/RIB/RMF/CINT/SINT/
/// CUF/SUF are accepted as no-ops: neither the original implementation nor
/// this specification fixes their bit encoding (see DESIGN.md).
fn dispatch_memory_extension(cpu: &mut Cpu, _memory: &Memory, _device: u8) {
    let opr = cpu.ir.device_opr();
    let selected_field = cpu.ir.field_reg();
    if opr & 0o1 != 0 {
        cpu.field.set_data_field(selected_field);
    }
    if opr & 0o2 != 0 {
        cpu.field.set_instruction_buffer(selected_field);
    }
}
