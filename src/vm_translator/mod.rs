// VM Translator Module
// Lowers stack-machine VM commands to Hack assembly

pub mod asm;
pub mod codegen;
pub mod codegen_branch;
pub mod codegen_calls;
pub mod codegen_stack;
pub mod command;
pub mod config;
pub mod error;
pub mod reader;
pub mod segment;
pub mod sources;

#[cfg(test)]
mod execution_tests;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

pub use asm::Instruction;
pub use command::{ArithmeticOp, Command, CommandKind};
pub use config::TranslatorConfig;
pub use error::TranslatorError;

use crate::vm_translator::asm::{Comp, Dest, Jump};
use crate::vm_translator::codegen::{HackCodeGen, SP};
use crate::vm_translator::reader::CommandReader;
use crate::vm_translator::segment::{AddressMode, Segment};

/// One source of VM commands and the namespace its statics live in
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub namespace: String,
    pub source: String,
}

impl TranslationUnit {
    pub fn new(namespace: &str, source: impl Into<String>) -> Self {
        TranslationUnit {
            namespace: namespace.to_string(),
            source: source.into(),
        }
    }

    /// Build a unit from individual VM lines
    pub fn from_lines<S: AsRef<str>>(namespace: &str, lines: &[S]) -> Self {
        let source = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(namespace, source)
    }
}

/// What a translation run declared and referenced, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationSummary {
    /// unit -> functions declared in it
    pub functions: IndexMap<String, Vec<String>>,
    /// unit -> static indices it touches
    pub statics: IndexMap<String, IndexSet<u16>>,
    pub commands: usize,
    pub comparison_labels: u32,
    pub return_sites: u32,
}

impl TranslationSummary {
    fn record(&mut self, unit: &str, command: &Command) {
        self.commands += 1;
        match command.kind() {
            CommandKind::Function => {
                if let Some(name) = command.arg1() {
                    self.functions
                        .entry(unit.to_string())
                        .or_default()
                        .push(name.to_string());
                }
            }
            CommandKind::Push | CommandKind::Pop => {
                if command.arg1() == Some(Segment::Static.name()) {
                    if let Some(index) = command.arg2() {
                        self.statics.entry(unit.to_string()).or_default().insert(index);
                    }
                }
            }
            _ => {}
        }
    }

    /// Every static symbol referenced, e.g. `Main.0`
    pub fn static_symbols(&self) -> Vec<String> {
        self.statics
            .iter()
            .flat_map(|(unit, indices)| {
                indices
                    .iter()
                    .map(move |&index| AddressMode::static_symbol(unit, index))
            })
            .collect()
    }
}

/// Output of a translation run
#[derive(Debug, Clone)]
pub struct Translation {
    pub instructions: Vec<Instruction>,
    pub summary: TranslationSummary,
}

impl Translation {
    /// Number of lines that become ROM words (labels and comments excluded)
    pub fn executable_len(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_executable()).count()
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&asm::render(&self.instructions))
    }
}

/// Translation driver
pub struct VmTranslator {
    config: TranslatorConfig,
}

impl Default for VmTranslator {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}

impl VmTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        VmTranslator { config }
    }

    /// Translate `units` in the given order into one instruction stream.
    ///
    /// With an `entry_function`, bootstrap code runs first: it sets SP and
    /// calls the entry function from a synthetic wrapper frame. The first bad
    /// command aborts the whole run.
    pub fn translate(
        &self,
        units: &[TranslationUnit],
        entry_function: Option<&str>,
    ) -> Result<Translation, TranslatorError> {
        let mut codegen = HackCodeGen::new(self.config.emit_comments);
        let mut summary = TranslationSummary::default();

        if let Some(entry) = entry_function {
            self.emit_bootstrap(&mut codegen, entry)?;
        }

        for unit in units {
            codegen.begin_unit(&unit.namespace);
            for item in CommandReader::new(&unit.source) {
                let (line, command) = item.map_err(|(line, err)| err.in_unit(&unit.namespace, line))?;
                codegen
                    .emit_command(&command)
                    .map_err(|err| err.in_unit(&unit.namespace, line))?;
                summary.record(&unit.namespace, &command);
            }
        }

        summary.comparison_labels = codegen.state().comparison_label_counter;
        summary.return_sites = codegen.state().return_site_counter;

        let translation = Translation {
            instructions: codegen.into_instructions(),
            summary,
        };
        info!(
            "Translated {} units: {} commands -> {} instructions",
            units.len(),
            translation.summary.commands,
            translation.executable_len()
        );
        Ok(translation)
    }

    fn emit_bootstrap(&self, codegen: &mut HackCodeGen, entry: &str) -> Result<(), TranslatorError> {
        debug!(
            "Bootstrap: SP={}, wrapper '{}' calls '{}'",
            self.config.stack_base, self.config.bootstrap_function, entry
        );
        codegen.emit_comment("bootstrap");
        codegen.emit_all([
            Instruction::at_value(self.config.stack_base),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at(SP),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        codegen.emit_command(&Command::function(&self.config.bootstrap_function, 0))?;
        codegen.emit_command(&Command::call(entry, 0))?;

        if self.config.halt_loop {
            let halt = codegen.state().function.scoped("halt");
            codegen.emit_comment("halt");
            codegen.emit_all([
                Instruction::label(halt.clone()),
                Instruction::at(halt),
                Instruction::jump(Comp::Zero, Jump::JMP),
            ]);
        }
        Ok(())
    }
}
