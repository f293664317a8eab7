//! codegen_calls.rs
//! Function declaration, call and return: the calling convention.
//!
//! A call leaves this frame below the callee's locals:
//!
//! ```text
//!   ARG ->  argument 0 .. argument n-1
//!           return address
//!           saved LCL
//!           saved ARG
//!           saved THIS
//!           saved THAT
//!   LCL ->  local 0 .. local k-1
//! ```
use crate::vm_translator::asm::{Comp, Dest, Instruction, Jump};
use crate::vm_translator::codegen::{HackCodeGen, FRAME_SIZE, SCRATCH_ADDRESS, SCRATCH_RETURN, SP};
use crate::vm_translator::segment::BaseRegister;
use log::debug;

impl HackCodeGen {
    /// Declares `name` and materialises its locals as zeros on the stack
    pub fn emit_function(&mut self, name: &str, n_vars: u16) {
        self.state.function.enter(name);
        self.emit(Instruction::label(name));
        for _ in 0..n_vars {
            self.emit(Instruction::assign(Dest::D, Comp::Zero));
            self.emit_push_d();
        }
    }

    pub fn emit_call(&mut self, name: &str, n_args: u16) {
        let return_label = self.state.next_return_label();
        debug!("call site {} -> {} ({} args)", return_label, name, n_args);

        self.emit_all([
            Instruction::at(return_label.clone()),
            Instruction::assign(Dest::D, Comp::A),
        ]);
        self.emit_push_d();

        for register in BaseRegister::FRAME_ORDER {
            self.emit_all([
                Instruction::at(register.symbol()),
                Instruction::assign(Dest::D, Comp::M),
            ]);
            self.emit_push_d();
        }

        // ARG = SP - 5 - nArgs
        self.emit_all([
            Instruction::at(SP),
            Instruction::assign(Dest::D, Comp::M),
            Instruction::at_value(FRAME_SIZE),
            Instruction::assign(Dest::D, Comp::DMinusA),
            Instruction::at_value(n_args),
            Instruction::assign(Dest::D, Comp::DMinusA),
            Instruction::at(BaseRegister::Arg.symbol()),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        // LCL = SP
        self.emit_all([
            Instruction::at(SP),
            Instruction::assign(Dest::D, Comp::M),
            Instruction::at(BaseRegister::Lcl.symbol()),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        self.emit_all([
            Instruction::at(name),
            Instruction::jump(Comp::Zero, Jump::JMP),
            Instruction::label(return_label),
        ]);
    }

    pub fn emit_return(&mut self) {
        // frame = LCL
        self.emit_all([
            Instruction::at(BaseRegister::Lcl.symbol()),
            Instruction::assign(Dest::D, Comp::M),
            Instruction::at_register(SCRATCH_ADDRESS),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        // return address = *(frame - 5), saved before *ARG overwrites it when nArgs == 0
        self.emit_all([
            Instruction::at_value(FRAME_SIZE),
            Instruction::assign(Dest::A, Comp::DMinusA),
            Instruction::assign(Dest::D, Comp::M),
            Instruction::at_register(SCRATCH_RETURN),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        // *ARG = pop(); SP = ARG + 1
        self.emit_pop_d();
        self.emit_all([
            Instruction::at(BaseRegister::Arg.symbol()),
            Instruction::assign(Dest::A, Comp::M),
            Instruction::assign(Dest::M, Comp::D),
            Instruction::at(BaseRegister::Arg.symbol()),
            Instruction::assign(Dest::D, Comp::MPlusOne),
            Instruction::at(SP),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        // THAT, THIS, ARG, LCL = *(--frame)
        for register in BaseRegister::FRAME_ORDER.iter().rev() {
            self.emit_all([
                Instruction::at_register(SCRATCH_ADDRESS),
                Instruction::assign(Dest::AM, Comp::MMinusOne),
                Instruction::assign(Dest::D, Comp::M),
                Instruction::at(register.symbol()),
                Instruction::assign(Dest::M, Comp::D),
            ]);
        }

        self.emit_all([
            Instruction::at_register(SCRATCH_RETURN),
            Instruction::assign(Dest::A, Comp::M),
            Instruction::jump(Comp::Zero, Jump::JMP),
        ]);
    }
}
