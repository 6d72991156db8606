//! Runs the property-check battery and prints a pass/fail summary,
//! mirroring the original `singleInstructionTests` report shape.

use pdp8_harness::{run_suite, Check, Criterion};

const CHECKS: &[Check] = &[
    Check {
        name: "scenario_a_trivial_opr_clears_ac",
        source: "OCTAL\n*0200\nCLA CLL CMA IAC\nHLT\n",
        observe: |m| m.cpu.lac.acc() as i64,
        expected: 0,
        criteria: Criterion::Equal,
    },
    Check {
        name: "scenario_a_trivial_opr_sets_link",
        source: "OCTAL\n*0200\nCLA CLL CMA IAC\nHLT\n",
        observe: |m| m.cpu.lac.link() as i64,
        expected: 1,
        criteria: Criterion::Equal,
    },
    Check {
        name: "scenario_d_jmp_dot_halts",
        source: "OCTAL\n*0200\nIOF\nJMP .\n",
        observe: |m| m.cpu.halt as i64,
        expected: 1,
        criteria: Criterion::Equal,
    },
    Check {
        name: "scenario_c_jmp_minus_one_idles",
        source: "OCTAL\n*0200\nKSF\nJMP 0200\nHLT\n",
        observe: |m| m.cpu.idle as i64,
        expected: 1,
        criteria: Criterion::Equal,
    },
    Check {
        name: "scenario_e_isz_boundary_wraps_to_zero",
        source: "OCTAL\n*0177\n7777\n*0200\nISZ 0177\nHLT\nHLT\n",
        observe: |m| m.memory.read(0, 0o177).data() as i64,
        expected: 0,
        criteria: Criterion::Equal,
    },
];

fn main() {
    let (passed, total) = run_suite(CHECKS);
    println!("{passed}/{total} checks passed");
    if passed != total {
        std::process::exit(1);
    }
}
