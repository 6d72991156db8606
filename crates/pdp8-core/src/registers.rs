//! Named CPU registers, built from the slice algebra in [`crate::register`].
//!
//! Field widths and slice offsets follow the PDP-8/I register table: PC is
//! a bare 12-bit word, LAC/MA/MB/IR carry several overlapping named views.

use crate::register::Register;

/// Program counter: a bare 12-bit word within the current instruction field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pc(Register);

impl Pc {
    pub const WIDTH: u32 = 12;

    pub fn get(self) -> u16 {
        self.0.get::<12, 0>() as u16
    }

    pub fn set(&mut self, v: u16) {
        self.0.set::<12, 0>(v as u32);
    }

    /// Advances by one, wrapping modulo 4096.
    pub fn advance(&mut self) {
        self.0.increment::<12, 0>();
    }
}

/// Accumulator and link: a 13-bit register with the 1-bit link at offset 12
/// and the 12-bit accumulator at offset 0, plus the byte-wide nibble and
/// ASCII views used by the operate group and the teleprinter device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lac(Register);

impl Lac {
    pub fn link(self) -> u16 {
        self.0.get::<1, 12>() as u16
    }

    pub fn set_link(&mut self, v: u16) {
        self.0.set::<1, 12>(v as u32);
    }

    pub fn acc(self) -> u16 {
        self.0.get::<12, 0>() as u16
    }

    pub fn set_acc(&mut self, v: u16) {
        self.0.set::<12, 0>(v as u32);
    }

    /// 13-bit link+accumulator view; TAD adds into this slice so carry out
    /// of bit 11 lands in the link.
    pub fn arithmetic(self) -> u16 {
        self.0.get::<13, 0>() as u16
    }

    pub fn set_arithmetic(&mut self, v: u16) {
        self.0.set::<13, 0>(v as u32);
    }

    pub fn add_to_arithmetic(&mut self, delta: u16) {
        let sum = self.arithmetic().wrapping_add(delta);
        self.set_arithmetic(sum);
    }

    pub fn msb(self) -> u16 {
        self.0.get::<1, 11>() as u16
    }

    pub fn lsb(self) -> u16 {
        self.0.get::<1, 0>() as u16
    }

    pub fn upper_nibble(self) -> u16 {
        self.0.get::<6, 6>() as u16
    }

    pub fn set_upper_nibble(&mut self, v: u16) {
        self.0.set::<6, 6>(v as u32);
    }

    pub fn lower_nibble(self) -> u16 {
        self.0.get::<6, 0>() as u16
    }

    pub fn set_lower_nibble(&mut self, v: u16) {
        self.0.set::<6, 0>(v as u32);
    }

    pub fn ascii(self) -> u8 {
        self.0.get::<8, 0>() as u8
    }

    pub fn set_ascii(&mut self, v: u8) {
        self.0.set::<8, 0>(u32::from(v));
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Decoded instruction register: several overlapping views of the 12-bit
/// instruction word, selected by what 4.3/4.5/4.6 need to read out of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ir(Register);

impl Ir {
    pub fn load(&mut self, word: u16) {
        self.0.set_word(u32::from(word) & 0o7777);
    }

    pub fn word(self) -> u16 {
        self.0.word() as u16
    }

    /// Bits 9..11: the three-bit opcode (0..7).
    pub fn opcode(self) -> u8 {
        self.0.get::<3, 9>() as u8
    }

    /// Bit 8: indirect-addressing flag on memory-reference instructions.
    pub fn indirect(self) -> bool {
        self.0.get::<1, 8>() != 0
    }

    /// Bit 7: zero-page (0) vs current-page (1) flag.
    pub fn page(self) -> bool {
        self.0.get::<1, 7>() != 0
    }

    /// Bits 0..6: the seven-bit page-relative address.
    pub fn addr(self) -> u16 {
        self.0.get::<7, 0>() as u16
    }

    /// Bits 0..8: the nine-bit operate microcode field.
    pub fn opr_bits(self) -> u16 {
        self.0.get::<9, 0>() as u16
    }

    /// Bits 3..8: the six-bit IOT device selector.
    pub fn device_sel(self) -> u8 {
        self.0.get::<6, 3>() as u8
    }

    /// Bits 0..2: the three-bit IOT opcode/pulse.
    pub fn device_opr(self) -> u8 {
        self.0.get::<3, 0>() as u8
    }

    /// Bits 3..5: the field operand of a CDF/CIF-style memory-extension IOT.
    pub fn field_reg(self) -> u8 {
        self.0.get::<3, 3>() as u8
    }
}

/// Memory address register: a 15-bit address with a 3-bit field selector at
/// offset 12 and the 12-bit in-field word address at offset 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ma(Register);

impl Ma {
    pub fn new(field: u8, addr: u16) -> Self {
        let mut ma = Self::default();
        ma.set_field(field);
        ma.set_page_word_addr(addr);
        ma
    }

    pub fn field(self) -> u8 {
        self.0.get::<3, 12>() as u8
    }

    pub fn set_field(&mut self, v: u8) {
        self.0.set::<3, 12>(u32::from(v));
    }

    /// The full 12-bit in-field word address.
    pub fn page_word_addr(self) -> u16 {
        self.0.get::<12, 0>() as u16
    }

    pub fn set_page_word_addr(&mut self, v: u16) {
        self.0.set::<12, 0>(u32::from(v));
    }

    /// Bits 7..11: the current page number.
    pub fn page_addr(self) -> u16 {
        self.0.get::<5, 7>() as u16
    }

    pub fn set_page_addr(&mut self, v: u16) {
        self.0.set::<5, 7>(u32::from(v));
    }

    /// Bits 0..6: the page-relative word address.
    pub fn word_addr(self) -> u16 {
        self.0.get::<7, 0>() as u16
    }

    pub fn set_word_addr(&mut self, v: u16) {
        self.0.set::<7, 0>(u32::from(v));
    }
}

/// Memory buffer register: the 12-bit data word plus the "this cell has
/// ever been written" initialized flag at bit 12.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mb(Register);

impl Mb {
    pub fn new(data: u16, initialized: bool) -> Self {
        let mut mb = Self::default();
        mb.set_data(data);
        mb.set_initialized(initialized);
        mb
    }

    pub fn data(self) -> u16 {
        self.0.get::<12, 0>() as u16
    }

    pub fn set_data(&mut self, v: u16) {
        self.0.set::<12, 0>(u32::from(v));
    }

    pub fn initialized(self) -> bool {
        self.0.get::<1, 12>() != 0
    }

    pub fn set_initialized(&mut self, v: bool) {
        self.0.set::<1, 12>(u32::from(v));
    }
}

/// The combined instruction/data/buffered-instruction field register: three
/// independent 3-bit field numbers packed into one word, per the table in
/// §3.2 (`instBuffer[3]@0, dataField[3]@3, instField[3]@6`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldRegister(Register);

impl FieldRegister {
    pub fn instruction_field(self) -> u8 {
        self.0.get::<3, 6>() as u8
    }

    pub fn set_instruction_field(&mut self, v: u8) {
        self.0.set::<3, 6>(u32::from(v));
    }

    pub fn data_field(self) -> u8 {
        self.0.get::<3, 3>() as u8
    }

    pub fn set_data_field(&mut self, v: u8) {
        self.0.set::<3, 3>(u32::from(v));
    }

    pub fn instruction_buffer(self) -> u8 {
        self.0.get::<3, 0>() as u8
    }

    pub fn set_instruction_buffer(&mut self, v: u8) {
        self.0.set::<3, 0>(u32::from(v));
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pc_advances_modulo_4096() {
        let mut pc = Pc::default();
        pc.set(4095);
        pc.advance();
        assert_eq!(pc.get(), 0);
    }

    #[test]
    fn lac_arithmetic_carries_into_link() {
        let mut lac = Lac::default();
        lac.set_acc(0o7777);
        lac.add_to_arithmetic(1);
        assert_eq!(lac.acc(), 0);
        assert_eq!(lac.link(), 1);
    }

    #[test]
    fn ir_decodes_memory_reference_fields() {
        let mut ir = Ir::default();
        // AND 0200 1 55 -> opcode 0, indirect, current page, addr 055
        ir.load(0b000_1_1_1010101);
        assert_eq!(ir.opcode(), 0);
        assert!(ir.indirect());
        assert!(ir.page());
        assert_eq!(ir.addr(), 0o125);
    }

    #[test]
    fn ir_decodes_iot_fields() {
        let mut ir = Ir::default();
        // IOT device 030 (KCF), opcode 6, device_sel=030, device_opr=1
        ir.load(0o6301);
        assert_eq!(ir.opcode(), 6);
        assert_eq!(ir.device_sel(), 0o30);
        assert_eq!(ir.device_opr(), 1);
    }

    #[test]
    fn field_register_packs_three_fields() {
        let mut fr = FieldRegister::default();
        fr.set_instruction_field(5);
        fr.set_data_field(3);
        fr.set_instruction_buffer(7);
        assert_eq!(fr.instruction_field(), 5);
        assert_eq!(fr.data_field(), 3);
        assert_eq!(fr.instruction_buffer(), 7);
    }
}
