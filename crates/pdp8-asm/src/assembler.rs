//! Two-pass PAL-style assembler (C9/C11): resolves labels and radix
//! pragmas in pass one against a null output, then regenerates the same
//! walk in pass two, this time emitting BIN frames and erroring on any
//! symbol still undefined.

use std::fmt;

use crate::bin::BinWriter;
use crate::instruction::{self, CombinationType};
use crate::lexer::Lexer;
use crate::symbol::SymbolTable;
use crate::token::{Token, TokenClass};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for AssembleError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Octal,
    Decimal,
    /// Radix is decided per-literal from its own syntax: `0x`/`0X` prefix
    /// is hex, a leading `0` followed by more digits is octal, anything
    /// else is decimal (spec §3.5/§4.7/§4.8).
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    One,
    Two,
}

/// One assembled code word and the listing line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub address: u16,
    pub data: u16,
    pub source_line: usize,
}

#[derive(Debug, Clone)]
pub struct AssembleOutput {
    pub tape: Vec<u8>,
    pub listing: Vec<ListingEntry>,
}

pub struct Assembler {
    symbols: SymbolTable,
    radix: Radix,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            radix: Radix::Octal,
        }
    }

    pub fn assemble(&mut self, source: &str) -> Result<AssembleOutput, AssembleError> {
        let tokens = Lexer::tokenize(source).map_err(|e| AssembleError {
            line: e.line,
            column: e.column,
            message: "unrecognized or ambiguous token".to_string(),
        })?;
        let lines = split_lines(&tokens);

        self.radix = Radix::Octal;
        let mut pc: u16 = 0;
        for line in &lines {
            self.parse_line(line, &mut pc, Pass::One)?;
        }

        self.radix = Radix::Octal;
        let mut pc: u16 = 0;
        let mut writer = BinWriter::new();
        let mut listing = Vec::new();
        for line in &lines {
            if let Some((address, data)) = self.parse_line(line, &mut pc, Pass::Two)? {
                writer.write(address, data);
                listing.push(ListingEntry {
                    address,
                    data,
                    source_line: line.first().map(|t| t.line).unwrap_or(0),
                });
            }
        }

        Ok(AssembleOutput {
            tape: writer.into_bytes(),
            listing,
        })
    }

    fn parse_line(
        &mut self,
        tokens: &[Token],
        pc: &mut u16,
        pass: Pass,
    ) -> Result<Option<(u16, u16)>, AssembleError> {
        let mut i = 0;
        if tokens.is_empty() || tokens[i].class.is_end_of_code_line() {
            return Ok(None);
        }

        if tokens[i].class == TokenClass::Literal {
            if let Some(radix) = radix_pragma(&tokens[i].literal) {
                self.radix = radix;
                return Ok(None);
            }
            if let Some(next) = tokens.get(i + 1) {
                match next.class {
                    TokenClass::LabelDefine => {
                        self.symbols.set(&tokens[i].literal, *pc);
                        i += 2;
                        if tokens.get(i).map_or(true, |t| t.class.is_end_of_code_line()) {
                            return Ok(None);
                        }
                    }
                    TokenClass::LabelAssign => {
                        let (value, _) = self.evaluate_expression(&tokens[i + 2..], *pc, pass)?;
                        self.symbols.set(&tokens[i].literal, value);
                        return Ok(None);
                    }
                    _ => {}
                }
            }
        }

        if tokens.get(i).map(|t| t.class) == Some(TokenClass::Location) {
            let (value, _) = self.evaluate_expression(&tokens[i + 1..], *pc, pass)?;
            *pc = value & 0o7777;
            return Ok(None);
        }

        if tokens.get(i).map_or(true, |t| t.class.is_end_of_code_line()) {
            return Ok(None);
        }

        let value = self.evaluate_opcode(&tokens[i..], *pc, pass)?;
        let address = *pc;
        *pc = pc.wrapping_add(1) & 0o7777;
        Ok(Some((address, value)))
    }

    /// Left-to-right NUMBER/LABEL/`.` terms combined by `+`/`-`, masked to
    /// 12 bits at the end.
    fn evaluate_expression(
        &mut self,
        tokens: &[Token],
        pc: u16,
        pass: Pass,
    ) -> Result<(u16, usize), AssembleError> {
        let mut i = 0;
        let mut value: i32 = 0;
        let mut negate = false;
        let mut have_term = false;

        while i < tokens.len() {
            let tok = &tokens[i];
            match tok.class {
                TokenClass::Addition => {
                    negate = false;
                    i += 1;
                }
                TokenClass::Subtraction => {
                    negate = true;
                    i += 1;
                }
                TokenClass::Number => {
                    let n = self.parse_number(tok)?;
                    value += if negate { -(n as i32) } else { n as i32 };
                    have_term = true;
                    i += 1;
                }
                TokenClass::ProgramCounter => {
                    value += if negate { -(pc as i32) } else { pc as i32 };
                    have_term = true;
                    i += 1;
                }
                TokenClass::Literal => {
                    let resolved = match self.symbols.get(&tok.literal) {
                        Some(sym) if sym.status == crate::symbol::SymbolStatus::Defined => {
                            sym.value
                        }
                        _ => {
                            if pass == Pass::Two {
                                return Err(AssembleError {
                                    line: tok.line,
                                    column: tok.column,
                                    message: format!("undefined symbol: '{}'", tok.literal),
                                });
                            }
                            self.symbols.reference(&tok.literal);
                            0
                        }
                    };
                    value += if negate { -(resolved as i32) } else { resolved as i32 };
                    have_term = true;
                    i += 1;
                }
                _ => break,
            }
            if !have_term {
                break;
            }
        }

        Ok(((value & 0o7777) as u16, i))
    }

    fn parse_number(&self, tok: &Token) -> Result<u16, AssembleError> {
        let literal = tok.literal.as_str();
        if let Some(hex_digits) = literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
            return u16::from_str_radix(hex_digits, 16).map_err(|_| AssembleError {
                line: tok.line,
                column: tok.column,
                message: format!("invalid hex number: '{}'", literal),
            });
        }
        let radix = match self.radix {
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Automatic => {
                if literal.len() > 1 && literal.starts_with('0') {
                    8
                } else {
                    10
                }
            }
        };
        u16::from_str_radix(literal, radix).map_err(|_| AssembleError {
            line: tok.line,
            column: tok.column,
            message: format!("invalid number: '{}'", literal),
        })
    }

    /// Combines mnemonics and a trailing address/value expression per the
    /// microcode-group restrictions (§4.6/§4.8): operate-group
    /// instructions from incompatible groups, or a memory-reference
    /// mnemonic mixed with an IOT pulse, is an error.
    fn evaluate_opcode(
        &mut self,
        tokens: &[Token],
        pc: u16,
        pass: Pass,
    ) -> Result<u16, AssembleError> {
        let mut value: u16 = 0;
        let mut group: Option<CombinationType> = None;
        let mut is_memory_ref = false;
        let mut zero_flag = false;
        let mut i = 0;

        while i < tokens.len() && !tokens[i].class.is_end_of_code_line() {
            let tok = &tokens[i];
            if tok.class == TokenClass::Literal {
                if let Some(instr) = instruction::lookup(&tok.literal) {
                    match instr.combination {
                        CombinationType::Flag => value |= instr.opcode,
                        CombinationType::Mask => zero_flag = true,
                        CombinationType::Memory => {
                            restrict(&mut group, CombinationType::Memory, tok)?;
                            value |= instr.opcode;
                            is_memory_ref = true;
                        }
                        CombinationType::Iot => {
                            restrict(&mut group, CombinationType::Iot, tok)?;
                            value |= instr.opcode;
                        }
                        CombinationType::Gr => value |= instr.opcode,
                        other => {
                            restrict(&mut group, other, tok)?;
                            value |= instr.opcode;
                        }
                    }
                    i += 1;
                    continue;
                }
            }

            let (expr_value, consumed) = self.evaluate_expression(&tokens[i..], pc, pass)?;
            if consumed == 0 {
                break;
            }
            i += consumed;

            if is_memory_ref {
                value = combine_memory_address(value, expr_value, pc, zero_flag, tok)?;
            } else {
                value |= expr_value & 0o7777;
            }
        }

        Ok(value)
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

fn restrict(
    group: &mut Option<CombinationType>,
    incoming: CombinationType,
    tok: &Token,
) -> Result<(), AssembleError> {
    use CombinationType::*;
    let compatible = |a: CombinationType, b: CombinationType| match (a, b) {
        (Gr1, Gr1) | (Gr2, Gr2) | (Gr2Or, Gr2Or) | (Gr2And, Gr2And) | (Gr3, Gr3) => true,
        (Gr2 | Gr2Or | Gr2And, Gr2 | Gr2Or | Gr2And) => true,
        (Memory, Memory) | (Iot, Iot) => true,
        _ => false,
    };
    match group {
        None => *group = Some(incoming),
        Some(current) if compatible(*current, incoming) => {}
        Some(_) => {
            return Err(AssembleError {
                line: tok.line,
                column: tok.column,
                message: format!("invalid microcode combination at '{}'", tok.literal),
            })
        }
    }
    Ok(())
}

fn combine_memory_address(
    value: u16,
    addr: u16,
    pc: u16,
    zero_flag: bool,
    tok: &Token,
) -> Result<u16, AssembleError> {
    let page = addr & 0o7600;
    let pc_page = pc & 0o7600;
    let current_page_bit = if zero_flag {
        0
    } else if page == 0 {
        0
    } else if page == pc_page {
        0o200
    } else {
        return Err(AssembleError {
            line: tok.line,
            column: tok.column,
            message: format!("memory location out of range: {:04o}", addr),
        });
    };
    Ok((value & !0o377) | current_page_bit | (addr & 0o177))
}

fn radix_pragma(literal: &str) -> Option<Radix> {
    match literal.to_uppercase().as_str() {
        "OCTAL" => Some(Radix::Octal),
        "DECIMAL" => Some(Radix::Decimal),
        "AUTOMATIC" => Some(Radix::Automatic),
        _ => None,
    }
}

/// Splits a flat token stream into logical lines, dropping whitespace (it
/// has done its job as a separator) and the terminating end-of-line or
/// end-of-instruction (`;`) token itself. A `;` closes out the current
/// instruction the same way a newline does, so two instructions separated
/// by `;` on one physical source line each get their own logical line.
fn split_lines(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for tok in tokens {
        match tok.class {
            TokenClass::WhiteSpace => continue,
            TokenClass::EndOfLine | TokenClass::EndOfInstruction => {
                lines.push(std::mem::take(&mut current));
            }
            TokenClass::EndOfFile => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(tok.clone()),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_a_single_memory_reference_instruction() {
        let mut asm = Assembler::new();
        let out = asm.assemble("*0200\nTAD 0210\n").unwrap();
        assert_eq!(out.listing.len(), 1);
        assert_eq!(out.listing[0].address, 0o200);
        assert_eq!(out.listing[0].data, 0o1000 | 0o200 | 0o010);
    }

    #[test]
    fn resolves_a_forward_labeled_jump() {
        let mut asm = Assembler::new();
        let source = "*0200\nJMP DONE\nNOP\nDONE, HLT\n";
        let out = asm.assemble(source).unwrap();
        assert_eq!(out.listing.len(), 3);
        let jmp = out.listing[0].data;
        assert_eq!(jmp & 0o7000, 0o5000);
        assert_eq!(jmp & 0o200, 0o200); // current-page bit set
        assert_eq!(jmp & 0o177, 0o002); // DONE is the third word on the page
    }

    #[test]
    fn combines_indirect_flag_with_memory_reference() {
        let mut asm = Assembler::new();
        let out = asm.assemble("*0200\nTAD I 0010\n").unwrap();
        assert_eq!(out.listing[0].data, 0o1000 | 0o400 | 0o010);
    }

    #[test]
    fn combines_compatible_group1_operates() {
        let mut asm = Assembler::new();
        let out = asm.assemble("*0200\nCLA CLL\n").unwrap();
        assert_eq!(out.listing[0].data, 0o7200 | 0o7100);
    }

    #[test]
    fn rejects_incompatible_group_combination() {
        let mut asm = Assembler::new();
        let err = asm.assemble("*0200\nRAR RTL MQL\n").unwrap_err();
        assert!(err.message.contains("invalid microcode combination"));
    }

    #[test]
    fn undefined_symbol_is_an_error_only_after_pass_one() {
        let mut asm = Assembler::new();
        let err = asm.assemble("*0200\nJMP NOWHERE\n").unwrap_err();
        assert!(err.message.contains("undefined symbol"));
    }

    #[test]
    fn label_assign_defines_a_constant_not_tied_to_pc() {
        let mut asm = Assembler::new();
        let out = asm.assemble("COUNT=7\n*0200\nTAD COUNT\n").unwrap();
        assert_eq!(out.listing[0].data & 0o177, 7);
    }

    #[test]
    fn semicolon_separates_two_instructions_on_one_line() {
        let mut asm = Assembler::new();
        let out = asm.assemble("*0200\nCLA; HLT\n").unwrap();
        assert_eq!(out.listing.len(), 2);
        assert_eq!(out.listing[0].address, 0o200);
        assert_eq!(out.listing[0].data, 0o7200);
        assert_eq!(out.listing[1].address, 0o201);
        assert_eq!(out.listing[1].data, 0o7402);
    }

    #[test]
    fn automatic_radix_infers_octal_and_decimal_per_literal() {
        let mut asm = Assembler::new();
        let out = asm
            .assemble("AUTOMATIC\n*0200\nTAD 010\nTAD 8\n")
            .unwrap();
        assert_eq!(out.listing[0].data & 0o177, 0o010);
        assert_eq!(out.listing[1].data & 0o177, 8);
    }

    #[test]
    fn hex_prefixed_literal_assembles_under_any_radix() {
        let mut asm = Assembler::new();
        let out = asm.assemble("*0200\nTAD 0x08\n").unwrap();
        assert_eq!(out.listing[0].data & 0o177, 8);
    }
}
