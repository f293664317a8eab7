//! codegen_branch.rs
//! Label, goto and if-goto lowering. User labels are scoped to the enclosing
//! function so identical names in different functions never collide.
use crate::vm_translator::asm::{Comp, Instruction, Jump};
use crate::vm_translator::codegen::HackCodeGen;

impl HackCodeGen {
    pub fn emit_label(&mut self, label: &str) {
        let scoped = self.state.function.scoped(label);
        self.emit(Instruction::label(scoped));
    }

    pub fn emit_goto(&mut self, label: &str) {
        let scoped = self.state.function.scoped(label);
        self.emit_all([
            Instruction::at(scoped),
            Instruction::jump(Comp::Zero, Jump::JMP),
        ]);
    }

    /// Pops the condition whether or not the branch is taken
    pub fn emit_if_goto(&mut self, label: &str) {
        let scoped = self.state.function.scoped(label);
        self.emit_pop_d();
        self.emit_all([
            Instruction::at(scoped),
            Instruction::jump(Comp::D, Jump::JNE),
        ]);
    }
}
