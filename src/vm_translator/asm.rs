//! Hack Assembly Instruction Model
//!
//! Structured values for every line the translator emits. Code generation
//! builds `Instruction`s and only the final `Display` turns them into text,
//! so tests can assert on instruction sequences without string diffing.
//!
//! # Hack instruction forms
//!
//! - **A-instruction** `@value` loads a constant or symbol address into `A`.
//! - **C-instruction** `dest=comp;jump` computes `comp` over `A`, `D` and
//!   `M` (= `RAM[A]`), stores it in any of `A`/`D`/`M`, and optionally jumps
//!   to `ROM[A]` when the result satisfies the jump condition.
//! - **Label** `(NAME)` binds `NAME` to the address of the next instruction.

use std::fmt;

/// Operand of an A-instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Literal value, e.g. `@256`
    Constant(u16),
    /// Numbered register `R0`-`R15`
    Register(u16),
    /// Predefined pointer, label or variable name, e.g. `@SP`, `@Main.0`
    Symbol(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Address::Constant(value) => write!(f, "{}", value),
            Address::Register(n) => write!(f, "R{}", n),
            Address::Symbol(name) => f.write_str(name),
        }
    }
}

/// Destination field of a C-instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dest {
    None,
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

impl Dest {
    pub fn writes_a(&self) -> bool {
        matches!(self, Dest::A | Dest::AM | Dest::AD | Dest::AMD)
    }

    pub fn writes_d(&self) -> bool {
        matches!(self, Dest::D | Dest::MD | Dest::AD | Dest::AMD)
    }

    pub fn writes_m(&self) -> bool {
        matches!(self, Dest::M | Dest::MD | Dest::AM | Dest::AMD)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Dest::None => "",
            Dest::M => "M",
            Dest::D => "D",
            Dest::MD => "MD",
            Dest::A => "A",
            Dest::AM => "AM",
            Dest::AD => "AD",
            Dest::AMD => "AMD",
        }
    }
}

/// Computation field of a C-instruction (the full Hack ALU table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comp {
    Zero,
    One,
    MinusOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

impl Comp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Comp::Zero => "0",
            Comp::One => "1",
            Comp::MinusOne => "-1",
            Comp::D => "D",
            Comp::A => "A",
            Comp::M => "M",
            Comp::NotD => "!D",
            Comp::NotA => "!A",
            Comp::NotM => "!M",
            Comp::NegD => "-D",
            Comp::NegA => "-A",
            Comp::NegM => "-M",
            Comp::DPlusOne => "D+1",
            Comp::APlusOne => "A+1",
            Comp::MPlusOne => "M+1",
            Comp::DMinusOne => "D-1",
            Comp::AMinusOne => "A-1",
            Comp::MMinusOne => "M-1",
            Comp::DPlusA => "D+A",
            Comp::DPlusM => "D+M",
            Comp::DMinusA => "D-A",
            Comp::DMinusM => "D-M",
            Comp::AMinusD => "A-D",
            Comp::MMinusD => "M-D",
            Comp::DAndA => "D&A",
            Comp::DAndM => "D&M",
            Comp::DOrA => "D|A",
            Comp::DOrM => "D|M",
        }
    }

    /// Whether the computation reads memory (the `a` bit of the encoding)
    pub fn reads_memory(&self) -> bool {
        matches!(
            self,
            Comp::M
                | Comp::NotM
                | Comp::NegM
                | Comp::MPlusOne
                | Comp::MMinusOne
                | Comp::DPlusM
                | Comp::DMinusM
                | Comp::MMinusD
                | Comp::DAndM
                | Comp::DOrM
        )
    }
}

/// Jump field of a C-instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Jump {
    None,
    JGT,
    JEQ,
    JGE,
    JLT,
    JNE,
    JLE,
    JMP,
}

impl Jump {
    /// Whether a computed value triggers this jump
    pub fn taken(&self, value: i16) -> bool {
        match self {
            Jump::None => false,
            Jump::JGT => value > 0,
            Jump::JEQ => value == 0,
            Jump::JGE => value >= 0,
            Jump::JLT => value < 0,
            Jump::JNE => value != 0,
            Jump::JLE => value <= 0,
            Jump::JMP => true,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Jump::None => "",
            Jump::JGT => "JGT",
            Jump::JEQ => "JEQ",
            Jump::JGE => "JGE",
            Jump::JLT => "JLT",
            Jump::JNE => "JNE",
            Jump::JLE => "JLE",
            Jump::JMP => "JMP",
        }
    }
}

/// One line of emitted Hack assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Comment(String),
    Label(String),
    Address(Address),
    Compute { dest: Dest, comp: Comp, jump: Jump },
}

impl Instruction {
    /// `@name`
    pub fn at(name: impl Into<String>) -> Self {
        Instruction::Address(Address::Symbol(name.into()))
    }

    /// `@value`
    pub fn at_value(value: u16) -> Self {
        Instruction::Address(Address::Constant(value))
    }

    /// `@Rn`
    pub fn at_register(n: u16) -> Self {
        Instruction::Address(Address::Register(n))
    }

    /// `dest=comp`
    pub fn assign(dest: Dest, comp: Comp) -> Self {
        Instruction::Compute {
            dest,
            comp,
            jump: Jump::None,
        }
    }

    /// `comp;jump`
    pub fn jump(comp: Comp, jump: Jump) -> Self {
        Instruction::Compute {
            dest: Dest::None,
            comp,
            jump,
        }
    }

    /// `(name)`
    pub fn label(name: impl Into<String>) -> Self {
        Instruction::Label(name.into())
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Instruction::Comment(text.into())
    }

    /// Whether this line occupies a ROM word once assembled
    pub fn is_executable(&self) -> bool {
        matches!(self, Instruction::Address(_) | Instruction::Compute { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Comment(text) => write!(f, "// {}", text),
            Instruction::Label(name) => write!(f, "({})", name),
            Instruction::Address(address) => write!(f, "@{}", address),
            Instruction::Compute { dest, comp, jump } => {
                if *dest != Dest::None {
                    write!(f, "{}=", dest.mnemonic())?;
                }
                f.write_str(comp.mnemonic())?;
                if *jump != Jump::None {
                    write!(f, ";{}", jump.mnemonic())?;
                }
                Ok(())
            }
        }
    }
}

/// Render instructions as assembly text, one per line
pub fn render(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}
