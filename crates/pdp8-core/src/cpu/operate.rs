//! Operate decoder (C5): Groups 1, 2 and 3 microcode.
//!
//! `opr_bits()` is the nine-bit microcode field (IR bits 0..8). Bit weight
//! `0400` (octal) selects Group 1 (clear) when unset; among Group 2/3, bit
//! weight `1` selects Group 3 (EAE) when set.

use super::Cpu;

const GROUP_SELECT: u16 = 0o400;
const GROUP3_SELECT: u16 = 0o001;

// Group 1 bit weights.
const CLA: u16 = 0o200;
const CLL: u16 = 0o100;
const CMA: u16 = 0o040;
const CML: u16 = 0o020;
const IAC: u16 = 0o001;
const ROTATE_MASK: u16 = 0o016;

// Group 2 bit weights.
const G2_AND_SELECT: u16 = 0o010;
const G2_SMA_SPA: u16 = 0o100;
const G2_SZA_SNA: u16 = 0o040;
const G2_SNL_SZL: u16 = 0o020;
const G2_CLA: u16 = 0o200;
const G2_OSR: u16 = 0o004;
const G2_HLT: u16 = 0o002;

// Group 3 bit weights.
const G3_CLA: u16 = 0o200;
const G3_MQA: u16 = 0o100;
const G3_MQL: u16 = 0o020;

/// EAE mode-switch instructions (§4.6); these have fixed, unambiguous
/// opcodes so they are matched on the full word rather than decomposed.
const SWAB: u16 = 0o7431;
const SWBA: u16 = 0o7447;

pub fn execute_opr(cpu: &mut Cpu) {
    let bits = cpu.ir.opr_bits();
    if bits & GROUP_SELECT == 0 {
        execute_group1(cpu, bits);
    } else if bits & GROUP3_SELECT == 0 {
        execute_group2(cpu, bits);
    } else {
        execute_group3(cpu, cpu.ir.word(), bits);
    }
}

fn execute_group1(cpu: &mut Cpu, bits: u16) {
    // Seq 1
    if bits & CLA != 0 {
        cpu.lac.set_acc(0);
    }
    if bits & CLL != 0 {
        cpu.lac.set_link(0);
    }
    // Seq 2
    if bits & CMA != 0 {
        cpu.lac.set_acc(!cpu.lac.acc() & 0o7777);
    }
    if bits & CML != 0 {
        cpu.lac.set_link(cpu.lac.link() ^ 1);
    }
    // Seq 3
    if bits & IAC != 0 {
        cpu.lac.add_to_arithmetic(1);
    }
    // Seq 4: rotate select. Simultaneous RAL+RAR (bit patterns 0o014/0o016)
    // are an undefined combination; left as a no-op (see DESIGN.md).
    match bits & ROTATE_MASK {
        0 => {}
        0o002 => byte_swap(cpu),
        0o004 => rotate(cpu, 1, true),
        0o006 => rotate(cpu, 2, true),
        0o010 => rotate(cpu, 1, false),
        0o012 => rotate(cpu, 2, false),
        _ => {}
    }
}

fn byte_swap(cpu: &mut Cpu) {
    let acc = cpu.lac.acc();
    cpu.lac.set_acc(((acc & 0o77) << 6) | (acc >> 6));
}

fn rotate(cpu: &mut Cpu, count: u32, left: bool) {
    let mut arithmetic = cpu.lac.arithmetic();
    for _ in 0..count {
        arithmetic = if left {
            ((arithmetic << 1) | (arithmetic >> 12)) & 0o17777
        } else {
            ((arithmetic >> 1) | (arithmetic << 12)) & 0o17777
        };
    }
    cpu.lac.set_arithmetic(arithmetic);
}

fn execute_group2(cpu: &mut Cpu, bits: u16) {
    let and_group = bits & G2_AND_SELECT != 0;
    let sma_or_spa = bits & G2_SMA_SPA != 0;
    let sza_or_sna = bits & G2_SZA_SNA != 0;
    let snl_or_szl = bits & G2_SNL_SZL != 0;

    let ac_negative = cpu.lac.msb() != 0;
    let ac_zero = cpu.lac.acc() == 0;
    let link_set = cpu.lac.link() != 0;

    let skip = if !and_group {
        (sma_or_spa && ac_negative) || (sza_or_sna && ac_zero) || (snl_or_szl && link_set)
    } else {
        let any_selected = sma_or_spa || sza_or_sna || snl_or_szl;
        if !any_selected {
            true // SKP: empty AND predicate always skips.
        } else {
            (!sma_or_spa || !ac_negative)
                && (!sza_or_sna || ac_zero)
                && (!snl_or_szl || !link_set)
        }
    };
    if skip {
        cpu.pc.advance();
    }

    if bits & G2_CLA != 0 {
        cpu.lac.set_acc(0);
    }
    if bits & G2_OSR != 0 {
        cpu.lac.set_acc(cpu.lac.acc() | cpu.sr);
    }
    if bits & G2_HLT != 0 {
        cpu.halt = true;
    }
}

/// CLA, MQA, MQL and their CAM/exchange combinations, plus the SWAB/SWBA
/// mode switch. Remaining mode-A/B EAE microcode (NMI, SHL, ASR, LSR, SCA,
/// DAD, DST, DPSZ, DPIC, DCM, SAM, ACS, MUY, DVI) has no bit-exact
/// encoding in either the original implementation (which leaves Group 3
/// entirely unimplemented) or this specification, and is intentionally
/// left unrecognized — see DESIGN.md.
fn execute_group3(cpu: &mut Cpu, word: u16, bits: u16) {
    if word == SWAB {
        cpu.eae_mode_b = true;
        return;
    }
    if word == SWBA {
        cpu.eae_mode_b = false;
        return;
    }

    if bits & G3_CLA != 0 {
        cpu.lac.set_acc(0);
    }
    let mqa = bits & G3_MQA != 0;
    let mql = bits & G3_MQL != 0;
    if mqa && mql {
        let old_acc = cpu.lac.acc();
        cpu.lac.set_acc(cpu.mq);
        cpu.mq = old_acc;
    } else if mql {
        cpu.mq = cpu.lac.acc();
        cpu.lac.set_acc(0);
    } else if mqa {
        cpu.lac.set_acc(cpu.lac.acc() | cpu.mq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Cpu;

    fn opr(word: u16) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.ir.load(word);
        cpu
    }

    #[test]
    fn scenario_a_cla_cll_cma_iac() {
        // CLA CLL CMA IAC = 7000|0200|0100|0040|0001 = 7341
        let mut cpu = opr(0o7341);
        cpu.lac.set_acc(0o1234);
        cpu.lac.set_link(1);
        execute_opr(&mut cpu);
        assert_eq!(cpu.lac.acc(), 0);
        assert_eq!(cpu.lac.link(), 1);
    }

    #[test]
    fn rtl_rotates_link_and_acc_left_by_two() {
        let mut cpu = opr(0o7006); // RAL|BSW = RTL
        cpu.lac.set_arithmetic(0o1); // link=0, acc=1
        execute_opr(&mut cpu);
        assert_eq!(cpu.lac.arithmetic(), 0o4);
    }

    #[test]
    fn bsw_swaps_six_bit_halves() {
        let mut cpu = opr(0o7002);
        cpu.lac.set_acc(0o1234);
        execute_opr(&mut cpu);
        assert_eq!(cpu.lac.acc(), 0o3412);
    }

    #[test]
    fn group2_skp_always_skips() {
        let mut cpu = opr(0o7410); // SKP
        cpu.pc.set(0o200);
        execute_opr(&mut cpu);
        assert_eq!(cpu.pc.get(), 0o201);
    }

    #[test]
    fn group2_sma_skips_on_negative_acc() {
        let mut cpu = opr(0o7500); // SMA
        cpu.lac.set_acc(0o4000);
        cpu.pc.set(0o200);
        execute_opr(&mut cpu);
        assert_eq!(cpu.pc.get(), 0o201);
    }

    #[test]
    fn group2_spa_skips_on_nonnegative_acc() {
        let mut cpu = opr(0o7510); // SPA (AND group, SMA bit + AND bit)
        cpu.lac.set_acc(0o0001);
        cpu.pc.set(0o200);
        execute_opr(&mut cpu);
        assert_eq!(cpu.pc.get(), 0o201);
    }

    #[test]
    fn group2_osr_ors_switch_register() {
        let mut cpu = opr(0o7404); // OSR
        cpu.sr = 0o0070;
        cpu.lac.set_acc(0o0007);
        execute_opr(&mut cpu);
        assert_eq!(cpu.lac.acc(), 0o0077);
    }

    #[test]
    fn group2_hlt_sets_halt() {
        let mut cpu = opr(0o7402); // HLT
        execute_opr(&mut cpu);
        assert!(cpu.halt);
    }

    #[test]
    fn group3_cam_clears_acc_and_mq() {
        let mut cpu = opr(0o7621); // CLA MQL (CAM)
        cpu.lac.set_acc(0o4321);
        cpu.mq = 0o1111;
        execute_opr(&mut cpu);
        assert_eq!(cpu.lac.acc(), 0);
        assert_eq!(cpu.mq, 0);
    }

    #[test]
    fn group3_exchanges_acc_and_mq() {
        let mut cpu = opr(0o7521); // MQA MQL
        cpu.lac.set_acc(0o1234);
        cpu.mq = 0o5670;
        execute_opr(&mut cpu);
        assert_eq!(cpu.lac.acc(), 0o5670);
        assert_eq!(cpu.mq, 0o1234);
    }

    #[test]
    fn swab_sets_eae_mode_b() {
        let mut cpu = opr(SWAB);
        execute_opr(&mut cpu);
        assert!(cpu.eae_mode_b);
    }
}
