//! Hack platform toolchain: assembler and CPU emulator for translated programs

pub mod assembler;
pub mod cpu;

pub use assembler::{assemble, AssemblerError, MachineOp, Program};
pub use cpu::{Cpu, RunReport, StopReason};
