/// codegen_stack.rs
/// Arithmetic, logical and push/pop lowering for HackCodeGen
///
use crate::vm_translator::asm::{Comp, Dest, Instruction, Jump};
use crate::vm_translator::codegen::{HackCodeGen, SCRATCH_ADDRESS, SP};
use crate::vm_translator::command::ArithmeticOp;
use crate::vm_translator::error::TranslatorError;
use crate::vm_translator::segment::{AddressMode, Segment};

impl HackCodeGen {
    pub fn emit_arithmetic(&mut self, op: ArithmeticOp) -> Result<(), TranslatorError> {
        match op {
            ArithmeticOp::Add => self.emit_binary(Comp::DPlusM),
            ArithmeticOp::Sub => self.emit_binary(Comp::MMinusD),
            ArithmeticOp::And => self.emit_binary(Comp::DAndM),
            ArithmeticOp::Or => self.emit_binary(Comp::DOrM),
            ArithmeticOp::Neg => self.emit_unary(Comp::NegM),
            ArithmeticOp::Not => self.emit_unary(Comp::NotM),
            ArithmeticOp::Eq => self.emit_comparison(op, Jump::JEQ),
            ArithmeticOp::Gt => self.emit_comparison(op, Jump::JGT),
            ArithmeticOp::Lt => self.emit_comparison(op, Jump::JLT),
        }
        Ok(())
    }

    /// Pop the right operand into D and combine into the left operand in place
    fn emit_binary(&mut self, comp: Comp) {
        self.emit_pop_d();
        self.emit_all([
            Instruction::assign(Dest::A, Comp::AMinusOne),
            Instruction::assign(Dest::M, comp),
        ]);
    }

    fn emit_unary(&mut self, comp: Comp) {
        self.emit_all([
            Instruction::at(SP),
            Instruction::assign(Dest::A, Comp::MMinusOne),
            Instruction::assign(Dest::M, comp),
        ]);
    }

    /// `x - y` decides the branch; the new top becomes -1 (true) or 0 (false).
    /// Overflow of the 16-bit subtraction is inherited from the target.
    fn emit_comparison(&mut self, op: ArithmeticOp, condition: Jump) {
        let stem = self.state.next_comparison_label(op.mnemonic());
        let true_label = format!("{}_TRUE", stem);
        let end_label = format!("{}_END", stem);

        self.emit_pop_d();
        self.emit_all([
            Instruction::assign(Dest::A, Comp::AMinusOne),
            Instruction::assign(Dest::D, Comp::MMinusD),
            Instruction::at(true_label.clone()),
            Instruction::jump(Comp::D, condition),
            // false
            Instruction::at(SP),
            Instruction::assign(Dest::A, Comp::MMinusOne),
            Instruction::assign(Dest::M, Comp::Zero),
            Instruction::at(end_label.clone()),
            Instruction::jump(Comp::Zero, Jump::JMP),
            // true
            Instruction::label(true_label),
            Instruction::at(SP),
            Instruction::assign(Dest::A, Comp::MMinusOne),
            Instruction::assign(Dest::M, Comp::MinusOne),
            Instruction::label(end_label),
        ]);
    }

    pub fn emit_push(&mut self, segment: &str, index: u16) -> Result<(), TranslatorError> {
        match self.resolver.resolve(segment, index)? {
            AddressMode::Immediate(value) => {
                self.emit_all([
                    Instruction::at_value(value),
                    Instruction::assign(Dest::D, Comp::A),
                ]);
            }
            AddressMode::Indirect { base, offset } => {
                self.emit_all([
                    Instruction::at(base.symbol()),
                    Instruction::assign(Dest::D, Comp::M),
                    Instruction::at_value(offset),
                    Instruction::assign(Dest::A, Comp::DPlusA),
                    Instruction::assign(Dest::D, Comp::M),
                ]);
            }
            AddressMode::Direct(register) => {
                self.emit_all([
                    Instruction::at_register(register),
                    Instruction::assign(Dest::D, Comp::M),
                ]);
            }
            AddressMode::Static { namespace, index } => {
                self.emit_all([
                    Instruction::at(AddressMode::static_symbol(&namespace, index)),
                    Instruction::assign(Dest::D, Comp::M),
                ]);
            }
        }
        self.emit_push_d();
        Ok(())
    }

    pub fn emit_pop(&mut self, segment: &str, index: u16) -> Result<(), TranslatorError> {
        match self.resolver.resolve(segment, index)? {
            // Constants have no cell to store into
            AddressMode::Immediate(_) => {
                return Err(TranslatorError::UnknownSegment(
                    Segment::Constant.name().to_string(),
                ));
            }
            AddressMode::Indirect { base, offset } => {
                // Only D is free, so the target address waits in a scratch register
                self.emit_all([
                    Instruction::at(base.symbol()),
                    Instruction::assign(Dest::D, Comp::M),
                    Instruction::at_value(offset),
                    Instruction::assign(Dest::D, Comp::DPlusA),
                    Instruction::at_register(SCRATCH_ADDRESS),
                    Instruction::assign(Dest::M, Comp::D),
                ]);
                self.emit_pop_d();
                self.emit_all([
                    Instruction::at_register(SCRATCH_ADDRESS),
                    Instruction::assign(Dest::A, Comp::M),
                    Instruction::assign(Dest::M, Comp::D),
                ]);
            }
            AddressMode::Direct(register) => {
                self.emit_pop_d();
                self.emit_all([
                    Instruction::at_register(register),
                    Instruction::assign(Dest::M, Comp::D),
                ]);
            }
            AddressMode::Static { namespace, index } => {
                self.emit_pop_d();
                self.emit_all([
                    Instruction::at(AddressMode::static_symbol(&namespace, index)),
                    Instruction::assign(Dest::M, Comp::D),
                ]);
            }
        }
        Ok(())
    }
}
