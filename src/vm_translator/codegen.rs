// Hack Code Generator
//
// Owns the emission state shared by every translation unit in one run and
// dispatches each VM command to the stack, branch or call emitters
// (codegen_stack.rs, codegen_branch.rs, codegen_calls.rs).

use crate::vm_translator::asm::{Comp, Dest, Instruction};
use crate::vm_translator::command::{Command, CommandKind};
use crate::vm_translator::error::TranslatorError;
use crate::vm_translator::segment::SegmentResolver;
use log::debug;

/// Stack pointer register symbol
pub const SP: &str = "SP";
/// Scratch register holding a computed pop target, or the frame base during return
pub const SCRATCH_ADDRESS: u16 = 13;
/// Scratch register holding the return address during return
pub const SCRATCH_RETURN: u16 = 14;
/// Words saved by a call: return address plus LCL, ARG, THIS, THAT
pub const FRAME_SIZE: u16 = 5;

/// Name of the function whose body is currently being emitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionContext {
    name: Option<String>,
}

impl FunctionContext {
    pub fn enter(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn clear(&mut self) {
        self.name = None;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `function$label` inside a function, the bare label otherwise
    pub fn scoped(&self, label: &str) -> String {
        match &self.name {
            Some(function) => format!("{}${}", function, label),
            None => label.to_string(),
        }
    }
}

/// Counters and context threaded through every unit of one output stream.
///
/// Both counters only ever increase, so generated labels never repeat.
#[derive(Debug, Clone, Default)]
pub struct EmissionState {
    pub comparison_label_counter: u32,
    pub return_site_counter: u32,
    pub function: FunctionContext,
}

impl EmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the `<OP>_<n>` stem for a comparison's TRUE/END labels
    pub fn next_comparison_label(&mut self, mnemonic: &str) -> String {
        let label = format!("{}_{}", mnemonic.to_uppercase(), self.comparison_label_counter);
        self.comparison_label_counter += 1;
        label
    }

    /// Allocate `<caller>$ret.<n>` for a call site
    pub fn next_return_label(&mut self) -> String {
        let label = self
            .function
            .scoped(&format!("ret.{}", self.return_site_counter));
        self.return_site_counter += 1;
        label
    }
}

/// Code generation context for one translation run
pub struct HackCodeGen {
    pub(crate) state: EmissionState,
    pub(crate) resolver: SegmentResolver,
    output: Vec<Instruction>,
    emit_comments: bool,
    commands_emitted: usize,
}

impl Default for HackCodeGen {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HackCodeGen {
    pub fn new(emit_comments: bool) -> Self {
        HackCodeGen {
            state: EmissionState::new(),
            resolver: SegmentResolver::default(),
            output: Vec::new(),
            emit_comments,
            commands_emitted: 0,
        }
    }

    /// Start a new translation unit: statics move to its namespace and
    /// labels are unscoped until its first function declaration
    pub fn begin_unit(&mut self, namespace: &str) {
        debug!(
            "UNIT '{}' starts at instruction {} (comparisons={}, return sites={})",
            namespace,
            self.output.len(),
            self.state.comparison_label_counter,
            self.state.return_site_counter
        );
        self.resolver.set_namespace(namespace);
        self.state.function.clear();
    }

    /// Lower one VM command, preceded by a comment echoing it
    pub fn emit_command(&mut self, command: &Command) -> Result<(), TranslatorError> {
        let before = self.output.len();
        self.emit_comment(&command.to_string());

        match command.kind() {
            CommandKind::Arithmetic => {
                let op = command.arithmetic_op().ok_or_else(|| {
                    TranslatorError::UnrecognizedCommand(command.arg1().unwrap_or("").to_string())
                })?;
                self.emit_arithmetic(op)?;
            }
            CommandKind::Push => {
                self.emit_push(name_operand(command)?, count_operand(command)?)?;
            }
            CommandKind::Pop => {
                self.emit_pop(name_operand(command)?, count_operand(command)?)?;
            }
            CommandKind::Label => self.emit_label(name_operand(command)?),
            CommandKind::Goto => self.emit_goto(name_operand(command)?),
            CommandKind::IfGoto => self.emit_if_goto(name_operand(command)?),
            CommandKind::Function => {
                self.emit_function(name_operand(command)?, count_operand(command)?);
            }
            CommandKind::Call => {
                self.emit_call(name_operand(command)?, count_operand(command)?);
            }
            CommandKind::Return => self.emit_return(),
        }

        self.commands_emitted += 1;
        debug!(
            "'{}' -> {} lines (function={:?})",
            command,
            self.output.len() - before,
            self.state.function.name()
        );
        Ok(())
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.output.push(instruction);
    }

    pub fn emit_all<I: IntoIterator<Item = Instruction>>(&mut self, instructions: I) {
        self.output.extend(instructions);
    }

    pub fn emit_comment(&mut self, text: &str) {
        if self.emit_comments {
            self.output.push(Instruction::comment(text));
        }
    }

    /// `*SP = D; SP++`
    pub(crate) fn emit_push_d(&mut self) {
        self.emit_all([
            Instruction::at(SP),
            Instruction::assign(Dest::A, Comp::M),
            Instruction::assign(Dest::M, Comp::D),
            Instruction::at(SP),
            Instruction::assign(Dest::M, Comp::MPlusOne),
        ]);
    }

    /// `SP--; D = *SP`
    pub(crate) fn emit_pop_d(&mut self) {
        self.emit_all([
            Instruction::at(SP),
            Instruction::assign(Dest::AM, Comp::MMinusOne),
            Instruction::assign(Dest::D, Comp::M),
        ]);
    }

    pub fn state(&self) -> &EmissionState {
        &self.state
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.output
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.output
    }

    pub fn commands_emitted(&self) -> usize {
        self.commands_emitted
    }
}

fn name_operand(command: &Command) -> Result<&str, TranslatorError> {
    command.arg1().ok_or_else(|| {
        TranslatorError::MalformedOperand(format!("'{}' is missing its name operand", command))
    })
}

fn count_operand(command: &Command) -> Result<u16, TranslatorError> {
    command.arg2().ok_or_else(|| {
        TranslatorError::MalformedOperand(format!("'{}' is missing its integer operand", command))
    })
}
