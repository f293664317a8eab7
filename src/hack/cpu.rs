//! Hack CPU emulator.
//!
//! Executes an assembled [`Program`] one word per cycle over a 32K-word RAM
//! with 16-bit wrapping arithmetic.

use crate::hack::assembler::{MachineOp, Program};
use crate::vm_translator::asm::Comp;
use log::{debug, trace};

/// RAM capacity in words
pub const RAM_SIZE: usize = 32768;
const ADDRESS_MASK: u16 = (RAM_SIZE - 1) as u16;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// PC moved past the last ROM word
    RanOffEnd,
    /// PC reached a `(L) @L 0;JMP` style self-loop at this address
    Halted(u16),
    /// The cycle budget ran out first
    CycleLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub cycles: u64,
    pub stop: StopReason,
}

pub struct Cpu {
    pub a: u16,
    pub d: u16,
    pub pc: u16,
    ram: Vec<u16>,
    rom: Vec<MachineOp>,
    cycles: u64,
}

impl Cpu {
    pub fn new(program: &Program) -> Self {
        Cpu {
            a: 0,
            d: 0,
            pc: 0,
            ram: vec![0; RAM_SIZE],
            rom: program.ops.clone(),
            cycles: 0,
        }
    }

    pub fn peek(&self, address: u16) -> u16 {
        self.ram[(address & ADDRESS_MASK) as usize]
    }

    /// RAM cell read as a signed value
    pub fn peek_signed(&self, address: u16) -> i16 {
        self.peek(address) as i16
    }

    pub fn poke(&mut self, address: u16, value: u16) {
        self.ram[(address & ADDRESS_MASK) as usize] = value;
    }

    fn alu(&self, comp: Comp, m: u16) -> u16 {
        let (a, d) = (self.a, self.d);
        match comp {
            Comp::Zero => 0,
            Comp::One => 1,
            Comp::MinusOne => 0xFFFF,
            Comp::D => d,
            Comp::A => a,
            Comp::M => m,
            Comp::NotD => !d,
            Comp::NotA => !a,
            Comp::NotM => !m,
            Comp::NegD => d.wrapping_neg(),
            Comp::NegA => a.wrapping_neg(),
            Comp::NegM => m.wrapping_neg(),
            Comp::DPlusOne => d.wrapping_add(1),
            Comp::APlusOne => a.wrapping_add(1),
            Comp::MPlusOne => m.wrapping_add(1),
            Comp::DMinusOne => d.wrapping_sub(1),
            Comp::AMinusOne => a.wrapping_sub(1),
            Comp::MMinusOne => m.wrapping_sub(1),
            Comp::DPlusA => d.wrapping_add(a),
            Comp::DPlusM => d.wrapping_add(m),
            Comp::DMinusA => d.wrapping_sub(a),
            Comp::DMinusM => d.wrapping_sub(m),
            Comp::AMinusD => a.wrapping_sub(d),
            Comp::MMinusD => m.wrapping_sub(d),
            Comp::DAndA => d & a,
            Comp::DAndM => d & m,
            Comp::DOrA => d | a,
            Comp::DOrM => d | m,
        }
    }

    /// Execute the word at PC. Returns false if PC is outside ROM.
    pub fn step(&mut self) -> bool {
        let op = match self.rom.get(self.pc as usize) {
            Some(op) => *op,
            None => return false,
        };

        match op {
            MachineOp::Load(value) => {
                self.a = value;
                self.pc = self.pc.wrapping_add(1);
            }
            MachineOp::Compute { dest, comp, jump } => {
                let address = self.a;
                let m = if comp.reads_memory() { self.peek(address) } else { 0 };
                let value = self.alu(comp, m);

                if dest.writes_m() {
                    self.poke(address, value);
                }
                if dest.writes_a() {
                    self.a = value;
                }
                if dest.writes_d() {
                    self.d = value;
                }

                self.pc = if jump.taken(value as i16) {
                    address
                } else {
                    self.pc.wrapping_add(1)
                };
            }
        }

        self.cycles += 1;
        trace!("pc={} a={} d={} sp={}", self.pc, self.a, self.d, self.ram[0]);
        true
    }

    /// Whether PC sits on `@PC; 0;JMP`, the two-word halt idiom
    fn at_halt_loop(&self) -> bool {
        let pc = self.pc as usize;
        match (self.rom.get(pc), self.rom.get(pc + 1)) {
            (Some(MachineOp::Load(target)), Some(MachineOp::Compute { comp, jump, .. })) => {
                *target as usize == pc && *comp == Comp::Zero && jump.taken(0)
            }
            _ => false,
        }
    }

    pub fn run(&mut self, max_cycles: u64) -> RunReport {
        let start = self.cycles;
        let stop = loop {
            if self.at_halt_loop() {
                break StopReason::Halted(self.pc);
            }
            if self.cycles - start >= max_cycles {
                break StopReason::CycleLimit;
            }
            if !self.step() {
                break StopReason::RanOffEnd;
            }
        };

        let report = RunReport {
            cycles: self.cycles - start,
            stop,
        };
        debug!("CPU stopped: {:?}", report);
        report
    }
}
