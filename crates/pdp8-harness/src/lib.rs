//! Single-instruction and code-fragment property checks for `pdp8-core`,
//! run by assembling PAL source with `pdp8-asm` and executing it on a
//! fresh `Machine`. Mirrors the original implementation's
//! `SingleInstructionTest`/`TestCPU` harness: a named check carries an
//! expectation and a comparison criterion rather than a bare assertion, so
//! a failing run can report what it actually saw.

use pdp8_asm::Assembler;
use pdp8_core::{Machine, MachineConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Less,
    LessEq,
    Equal,
    GreaterEq,
    Greater,
    NotEqual,
}

impl Criterion {
    pub fn holds(self, observed: i64, expected: i64) -> bool {
        match self {
            Criterion::Less => observed < expected,
            Criterion::LessEq => observed <= expected,
            Criterion::Equal => observed == expected,
            Criterion::GreaterEq => observed >= expected,
            Criterion::Greater => observed > expected,
            Criterion::NotEqual => observed != expected,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Criterion::Less => "<",
            Criterion::LessEq => "<=",
            Criterion::Equal => "==",
            Criterion::GreaterEq => ">=",
            Criterion::Greater => ">",
            Criterion::NotEqual => "!=",
        }
    }
}

/// One property check: assemble `source`, run it to completion, then
/// compare whatever `observe` reads off the finished machine against
/// `expected` under `criteria`.
pub struct Check {
    pub name: &'static str,
    pub source: &'static str,
    pub observe: fn(&Machine) -> i64,
    pub expected: i64,
    pub criteria: Criterion,
}

pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub observed: i64,
    pub expected: i64,
    pub criteria: Criterion,
}

/// Assembles and runs `source`, returning the machine in its final state
/// for the caller to inspect.
pub fn run_source(source: &str) -> Machine {
    let mut assembler = Assembler::new();
    let output = assembler.assemble(source).expect("fixture source must assemble");
    let mut machine = Machine::new(MachineConfig::default());
    for entry in &output.listing {
        machine.memory.write(0, entry.address, entry.data);
    }
    let start = output
        .listing
        .first()
        .map(|e| e.address)
        .unwrap_or(0);
    machine.cpu.pc.set(start);
    machine.run();
    machine
}

pub fn run_check(check: &Check) -> CheckOutcome {
    let machine = run_source(check.source);
    let observed = (check.observe)(&machine);
    CheckOutcome {
        name: check.name,
        passed: check.criteria.holds(observed, check.expected),
        observed,
        expected: check.expected,
        criteria: check.criteria,
    }
}

/// Runs every check and returns `(passed, total)`, mirroring the original
/// `singleInstructionTests` return shape.
pub fn run_suite(checks: &[Check]) -> (usize, usize) {
    let mut passed = 0;
    for check in checks {
        let outcome = run_check(check);
        if outcome.passed {
            passed += 1;
        } else {
            eprintln!(
                "FAIL {}: observed {}, expected {} {}",
                outcome.name, outcome.observed, outcome.criteria.symbol(), outcome.expected
            );
        }
    }
    (passed, checks.len())
}
