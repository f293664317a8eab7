//! Two-pass Hack assembler over structured instructions.
//!
//! Pass 1 binds every `(LABEL)` to the ROM address of the next executable
//! instruction. Pass 2 resolves `@symbol` operands: predefined registers
//! first, then labels, and anything else becomes a variable allocated from
//! RAM 16 upward in first-use order.

use crate::vm_translator::asm::{Address, Comp, Dest, Instruction, Jump};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// ROM capacity in words
pub const ROM_SIZE: usize = 32768;
/// First RAM cell handed out to variables
pub const VARIABLE_BASE: u16 = 16;

lazy_static! {
    pub static ref PREDEFINED_SYMBOLS: HashMap<&'static str, u16> = {
        let mut m = HashMap::new();
        m.insert("SP", 0);
        m.insert("LCL", 1);
        m.insert("ARG", 2);
        m.insert("THIS", 3);
        m.insert("THAT", 4);
        for (n, name) in [
            "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R11", "R12",
            "R13", "R14", "R15",
        ]
        .iter()
        .enumerate()
        {
            m.insert(*name, n as u16);
        }
        m.insert("SCREEN", 16384);
        m.insert("KBD", 24576);
        m
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    DuplicateLabel(String),
    ProgramTooLarge(usize),
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssemblerError::DuplicateLabel(name) => {
                write!(f, "Label '{}' is defined more than once", name)
            }
            AssemblerError::ProgramTooLarge(len) => {
                write!(f, "Program of {} words does not fit in ROM ({} words)", len, ROM_SIZE)
            }
        }
    }
}

impl std::error::Error for AssemblerError {}

/// One ROM word, symbols resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineOp {
    Load(u16),
    Compute { dest: Dest, comp: Comp, jump: Jump },
}

/// Assembled ROM image and its symbol table
#[derive(Debug, Clone)]
pub struct Program {
    pub ops: Vec<MachineOp>,
    labels: IndexMap<String, u16>,
    variables: IndexMap<String, u16>,
}

impl Program {
    /// Address bound to `name`: predefined register, label, or variable
    pub fn symbol(&self, name: &str) -> Option<u16> {
        PREDEFINED_SYMBOLS
            .get(name)
            .copied()
            .or_else(|| self.labels.get(name).copied())
            .or_else(|| self.variables.get(name).copied())
    }

    pub fn variables(&self) -> &IndexMap<String, u16> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

pub fn assemble(instructions: &[Instruction]) -> Result<Program, AssemblerError> {
    // Pass 1: labels
    let mut labels: IndexMap<String, u16> = IndexMap::new();
    let mut rom_address: usize = 0;
    for instruction in instructions {
        match instruction {
            Instruction::Label(name) => {
                if labels.insert(name.clone(), rom_address as u16).is_some() {
                    return Err(AssemblerError::DuplicateLabel(name.clone()));
                }
            }
            Instruction::Address(_) | Instruction::Compute { .. } => rom_address += 1,
            Instruction::Comment(_) => {}
        }
    }
    if rom_address > ROM_SIZE {
        return Err(AssemblerError::ProgramTooLarge(rom_address));
    }

    // Pass 2: operands
    let mut variables: IndexMap<String, u16> = IndexMap::new();
    let mut ops = Vec::with_capacity(rom_address);
    for instruction in instructions {
        match instruction {
            Instruction::Address(address) => {
                let value = match address {
                    Address::Constant(value) => *value,
                    Address::Register(n) => *n,
                    Address::Symbol(name) => {
                        if let Some(&value) = PREDEFINED_SYMBOLS.get(name.as_str()) {
                            value
                        } else if let Some(&value) = labels.get(name) {
                            value
                        } else {
                            let next = VARIABLE_BASE + variables.len() as u16;
                            *variables.entry(name.clone()).or_insert(next)
                        }
                    }
                };
                ops.push(MachineOp::Load(value));
            }
            Instruction::Compute { dest, comp, jump } => ops.push(MachineOp::Compute {
                dest: *dest,
                comp: *comp,
                jump: *jump,
            }),
            Instruction::Label(_) | Instruction::Comment(_) => {}
        }
    }

    debug!(
        "Assembled {} words, {} labels, {} variables",
        ops.len(),
        labels.len(),
        variables.len()
    );
    Ok(Program {
        ops,
        labels,
        variables,
    })
}
