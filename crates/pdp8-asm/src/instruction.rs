//! Mnemonic table and operate/IOT combination rules (C9).

/// How a mnemonic's opcode bits combine with whatever has already been
/// accumulated for the current instruction (§4.6/§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinationType {
    /// Replaces any prior value outright (memory-reference opcodes).
    Memory,
    /// OR's in unconditionally (the indirect flag `I`).
    Flag,
    /// AND's with the accumulated value (the zero-page flag `Z`).
    Mask,
    /// Group-agnostic microcode (NOP, CLA): OR's with any group.
    Gr,
    Gr1,
    Gr2,
    Gr2Or,
    Gr2And,
    Gr3,
    /// An IOT pulse; does not combine with anything else.
    Iot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u16,
    pub mnemonic: &'static str,
    pub combination: CombinationType,
}

use CombinationType::*;

/// The mnemonic table, combining memory-reference opcodes, operate-group
/// microcode and the IOT pulses of the CPU-internal and reference devices
/// (§4.6, §4.10, grounded on the original `InstructionSet`).
pub const INSTRUCTION_SET: &[Instruction] = &[
    // Addressing flags.
    Instruction { opcode: 0o0400, mnemonic: "I", combination: Flag },
    Instruction { opcode: 0o7577, mnemonic: "Z", combination: Mask },
    // Memory-reference instructions, default current-page addressing.
    Instruction { opcode: 0o0000, mnemonic: "AND", combination: Memory },
    Instruction { opcode: 0o1000, mnemonic: "TAD", combination: Memory },
    Instruction { opcode: 0o2000, mnemonic: "ISZ", combination: Memory },
    Instruction { opcode: 0o3000, mnemonic: "DCA", combination: Memory },
    Instruction { opcode: 0o4000, mnemonic: "JMS", combination: Memory },
    Instruction { opcode: 0o5000, mnemonic: "JMP", combination: Memory },
    // Group-agnostic microcode.
    Instruction { opcode: 0o7000, mnemonic: "NOP", combination: Gr },
    Instruction { opcode: 0o7200, mnemonic: "CLA", combination: Gr },
    // Group 1.
    Instruction { opcode: 0o7100, mnemonic: "CLL", combination: Gr1 },
    Instruction { opcode: 0o7040, mnemonic: "CMA", combination: Gr1 },
    Instruction { opcode: 0o7020, mnemonic: "CML", combination: Gr1 },
    Instruction { opcode: 0o7001, mnemonic: "IAC", combination: Gr1 },
    Instruction { opcode: 0o7041, mnemonic: "CIA", combination: Gr1 },
    Instruction { opcode: 0o7010, mnemonic: "RAR", combination: Gr1 },
    Instruction { opcode: 0o7004, mnemonic: "RAL", combination: Gr1 },
    Instruction { opcode: 0o7012, mnemonic: "RTR", combination: Gr1 },
    Instruction { opcode: 0o7006, mnemonic: "RTL", combination: Gr1 },
    Instruction { opcode: 0o7002, mnemonic: "BSW", combination: Gr1 },
    // Group 2, OR sub-group.
    Instruction { opcode: 0o7500, mnemonic: "SMA", combination: Gr2Or },
    Instruction { opcode: 0o7440, mnemonic: "SZA", combination: Gr2Or },
    Instruction { opcode: 0o7420, mnemonic: "SNL", combination: Gr2Or },
    // Group 2, AND sub-group.
    Instruction { opcode: 0o7510, mnemonic: "SPA", combination: Gr2And },
    Instruction { opcode: 0o7450, mnemonic: "SNA", combination: Gr2And },
    Instruction { opcode: 0o7430, mnemonic: "SZL", combination: Gr2And },
    // Group 2, privileged.
    Instruction { opcode: 0o7404, mnemonic: "OSR", combination: Gr2 },
    Instruction { opcode: 0o7402, mnemonic: "HLT", combination: Gr2 },
    Instruction { opcode: 0o7410, mnemonic: "SKP", combination: Gr2 },
    // Common macros.
    Instruction { opcode: 0o7041, mnemonic: "TCA", combination: Gr1 },
    // Group 3 (EAE).
    Instruction { opcode: 0o7421, mnemonic: "MQL", combination: Gr3 },
    Instruction { opcode: 0o7501, mnemonic: "MQA", combination: Gr3 },
    Instruction { opcode: 0o7621, mnemonic: "CAM", combination: Gr3 },
    Instruction { opcode: 0o7521, mnemonic: "SWP", combination: Gr3 },
    Instruction { opcode: 0o7431, mnemonic: "SWAB", combination: Gr3 },
    Instruction { opcode: 0o7447, mnemonic: "SWBA", combination: Gr3 },
    // Memory extension (device 020..027).
    Instruction { opcode: 0o6201, mnemonic: "CDF", combination: Iot },
    Instruction { opcode: 0o6202, mnemonic: "CIF", combination: Iot },
    Instruction { opcode: 0o6214, mnemonic: "RDF", combination: Iot },
    Instruction { opcode: 0o6224, mnemonic: "RIF", combination: Iot },
    Instruction { opcode: 0o6234, mnemonic: "RIB", combination: Iot },
    Instruction { opcode: 0o6244, mnemonic: "RMF", combination: Iot },
    // CPU-internal (device 0).
    Instruction { opcode: 0o6000, mnemonic: "SKON", combination: Iot },
    Instruction { opcode: 0o6001, mnemonic: "ION", combination: Iot },
    Instruction { opcode: 0o6002, mnemonic: "IOF", combination: Iot },
    Instruction { opcode: 0o6003, mnemonic: "SRQ", combination: Iot },
    Instruction { opcode: 0o6004, mnemonic: "GTF", combination: Iot },
    Instruction { opcode: 0o6005, mnemonic: "RTF", combination: Iot },
    Instruction { opcode: 0o6006, mnemonic: "SGT", combination: Iot },
    Instruction { opcode: 0o6007, mnemonic: "CAF", combination: Iot },
    // DK8-EA real-time clock (device 013).
    Instruction { opcode: 0o6131, mnemonic: "CLON", combination: Iot },
    Instruction { opcode: 0o6132, mnemonic: "CLOF", combination: Iot },
    Instruction { opcode: 0o6133, mnemonic: "CLSK", combination: Iot },
    // DECwriter keyboard (device 03).
    Instruction { opcode: 0o6031, mnemonic: "KSF", combination: Iot },
    Instruction { opcode: 0o6032, mnemonic: "KCF", combination: Iot },
    Instruction { opcode: 0o6034, mnemonic: "KRS", combination: Iot },
    Instruction { opcode: 0o6035, mnemonic: "KIE", combination: Iot },
    Instruction { opcode: 0o6036, mnemonic: "KRB", combination: Iot },
    // DECwriter printer (device 04).
    Instruction { opcode: 0o6041, mnemonic: "TFL", combination: Iot },
    Instruction { opcode: 0o6042, mnemonic: "TSF", combination: Iot },
    Instruction { opcode: 0o6044, mnemonic: "TCF", combination: Iot },
    Instruction { opcode: 0o6045, mnemonic: "TPC", combination: Iot },
    Instruction { opcode: 0o6046, mnemonic: "TSK", combination: Iot },
    Instruction { opcode: 0o6047, mnemonic: "TLS", combination: Iot },
];

pub fn lookup(mnemonic: &str) -> Option<&'static Instruction> {
    INSTRUCTION_SET
        .iter()
        .find(|i| i.mnemonic == mnemonic)
        .or_else(|| {
            let upper = mnemonic.to_uppercase();
            INSTRUCTION_SET.iter().find(|i| i.mnemonic == upper)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("tad").unwrap().opcode, 0o1000);
        assert_eq!(lookup("TAD").unwrap().opcode, 0o1000);
    }

    #[test]
    fn unknown_mnemonic_is_none() {
        assert!(lookup("NOSUCH").is_none());
    }

    #[test]
    fn clock_and_keyboard_pulses_match_runtime_devices() {
        // KSF must assemble to the word cpu::OP_KSF checks for idle detection.
        assert_eq!(lookup("KSF").unwrap().opcode, 0o6031);
    }

    #[test]
    fn swab_and_swba_are_group3_not_memory_reference() {
        // Standalone EAE mode-switch words; they take no address operand.
        assert_eq!(lookup("SWAB").unwrap().combination, CombinationType::Gr3);
        assert_eq!(lookup("SWBA").unwrap().combination, CombinationType::Gr3);
    }
}
