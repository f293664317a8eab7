// VM Command Model
//
// One parsed VM instruction: a kind plus up to two operands.

use crate::vm_translator::error::TranslatorError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    IfGoto,
    Function,
    Call,
    Return,
}

impl CommandKind {
    /// Look up the kind selected by the first token of a line
    pub fn from_mnemonic(mnemonic: &str) -> Option<CommandKind> {
        if ArithmeticOp::from_str(mnemonic).is_ok() {
            return Some(CommandKind::Arithmetic);
        }
        match mnemonic {
            "push" => Some(CommandKind::Push),
            "pop" => Some(CommandKind::Pop),
            "label" => Some(CommandKind::Label),
            "goto" => Some(CommandKind::Goto),
            "if-goto" => Some(CommandKind::IfGoto),
            "function" => Some(CommandKind::Function),
            "call" => Some(CommandKind::Call),
            "return" => Some(CommandKind::Return),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            CommandKind::Arithmetic => "arithmetic",
            CommandKind::Push => "push",
            CommandKind::Pop => "pop",
            CommandKind::Label => "label",
            CommandKind::Goto => "goto",
            CommandKind::IfGoto => "if-goto",
            CommandKind::Function => "function",
            CommandKind::Call => "call",
            CommandKind::Return => "return",
        }
    }

    /// Number of operand tokens this kind requires after the mnemonic
    pub fn operand_count(&self) -> usize {
        match self {
            CommandKind::Arithmetic | CommandKind::Return => 0,
            CommandKind::Label | CommandKind::Goto | CommandKind::IfGoto => 1,
            CommandKind::Push | CommandKind::Pop | CommandKind::Function | CommandKind::Call => 2,
        }
    }
}

/// Arithmetic and logical operators of the VM language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ArithmeticOp::Add),
            "sub" => Ok(ArithmeticOp::Sub),
            "neg" => Ok(ArithmeticOp::Neg),
            "eq" => Ok(ArithmeticOp::Eq),
            "gt" => Ok(ArithmeticOp::Gt),
            "lt" => Ok(ArithmeticOp::Lt),
            "and" => Ok(ArithmeticOp::And),
            "or" => Ok(ArithmeticOp::Or),
            "not" => Ok(ArithmeticOp::Not),
            other => Err(TranslatorError::UnrecognizedCommand(other.to_string())),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A single VM command. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    arg1: Option<String>,
    arg2: Option<u16>,
}

impl Command {
    /// Build a command, checking that the operands present match what the kind needs
    pub fn new(
        kind: CommandKind,
        arg1: Option<String>,
        arg2: Option<u16>,
    ) -> Result<Self, TranslatorError> {
        let wants = kind.operand_count();
        let has_arg1 = arg1.as_deref().is_some_and(|a| !a.is_empty());

        match kind {
            CommandKind::Arithmetic => {
                let op = arg1.as_deref().unwrap_or("");
                ArithmeticOp::from_str(op)?;
                if arg2.is_some() {
                    return Err(TranslatorError::MalformedOperand(format!(
                        "'{}' takes no operands",
                        op
                    )));
                }
            }
            CommandKind::Return => {
                if arg1.is_some() || arg2.is_some() {
                    return Err(TranslatorError::MalformedOperand(
                        "'return' takes no operands".to_string(),
                    ));
                }
            }
            _ => {
                if !has_arg1 {
                    return Err(TranslatorError::MalformedOperand(format!(
                        "'{}' requires a name operand",
                        kind.keyword()
                    )));
                }
                if wants == 2 && arg2.is_none() {
                    return Err(TranslatorError::MalformedOperand(format!(
                        "'{}' requires an integer operand",
                        kind.keyword()
                    )));
                }
                if wants == 1 && arg2.is_some() {
                    return Err(TranslatorError::MalformedOperand(format!(
                        "'{}' takes a single operand",
                        kind.keyword()
                    )));
                }
            }
        }

        Ok(Command { kind, arg1, arg2 })
    }

    pub fn arithmetic(op: ArithmeticOp) -> Self {
        Command {
            kind: CommandKind::Arithmetic,
            arg1: Some(op.mnemonic().to_string()),
            arg2: None,
        }
    }

    pub fn push(segment: &str, index: u16) -> Self {
        Self::with_two(CommandKind::Push, segment, index)
    }

    pub fn pop(segment: &str, index: u16) -> Self {
        Self::with_two(CommandKind::Pop, segment, index)
    }

    pub fn label(name: &str) -> Self {
        Self::with_one(CommandKind::Label, name)
    }

    pub fn goto(name: &str) -> Self {
        Self::with_one(CommandKind::Goto, name)
    }

    pub fn if_goto(name: &str) -> Self {
        Self::with_one(CommandKind::IfGoto, name)
    }

    pub fn function(name: &str, n_vars: u16) -> Self {
        Self::with_two(CommandKind::Function, name, n_vars)
    }

    pub fn call(name: &str, n_args: u16) -> Self {
        Self::with_two(CommandKind::Call, name, n_args)
    }

    pub fn ret() -> Self {
        Command {
            kind: CommandKind::Return,
            arg1: None,
            arg2: None,
        }
    }

    fn with_one(kind: CommandKind, name: &str) -> Self {
        Command {
            kind,
            arg1: Some(name.to_string()),
            arg2: None,
        }
    }

    fn with_two(kind: CommandKind, name: &str, value: u16) -> Self {
        Command {
            kind,
            arg1: Some(name.to_string()),
            arg2: Some(value),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Operator name, segment name, label name or function name
    pub fn arg1(&self) -> Option<&str> {
        self.arg1.as_deref()
    }

    /// Segment index, local count or argument count
    pub fn arg2(&self) -> Option<u16> {
        self.arg2
    }

    /// The typed operator of an arithmetic command
    pub fn arithmetic_op(&self) -> Option<ArithmeticOp> {
        match self.kind {
            CommandKind::Arithmetic => self.arg1().and_then(|op| op.parse().ok()),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            CommandKind::Arithmetic => write!(f, "{}", self.arg1().unwrap_or("")),
            CommandKind::Return => write!(f, "return"),
            kind => {
                write!(f, "{}", kind.keyword())?;
                if let Some(arg1) = self.arg1() {
                    write!(f, " {}", arg1)?;
                }
                if let Some(arg2) = self.arg2 {
                    write!(f, " {}", arg2)?;
                }
                Ok(())
            }
        }
    }
}
