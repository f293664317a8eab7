// Segment Resolver
//
// Maps a VM memory segment and index to the Hack addressing needed to reach it.

use crate::vm_translator::error::TranslatorError;
use std::fmt;
use std::str::FromStr;

/// First register of the `pointer` segment (THIS)
pub const POINTER_BASE: u16 = 3;
/// First register of the `temp` segment
pub const TEMP_BASE: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
    Constant,
}

impl Segment {
    pub fn name(&self) -> &'static str {
        match self {
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::Static => "static",
            Segment::Constant => "constant",
        }
    }
}

impl FromStr for Segment {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Segment::Local),
            "argument" => Ok(Segment::Argument),
            "this" => Ok(Segment::This),
            "that" => Ok(Segment::That),
            "pointer" => Ok(Segment::Pointer),
            "temp" => Ok(Segment::Temp),
            "static" => Ok(Segment::Static),
            "constant" => Ok(Segment::Constant),
            other => Err(TranslatorError::UnknownSegment(other.to_string())),
        }
    }
}

/// The four pointer registers a frame saves and restores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseRegister {
    Lcl,
    Arg,
    This,
    That,
}

impl BaseRegister {
    /// Push order of a call frame; return restores in reverse
    pub const FRAME_ORDER: [BaseRegister; 4] = [
        BaseRegister::Lcl,
        BaseRegister::Arg,
        BaseRegister::This,
        BaseRegister::That,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            BaseRegister::Lcl => "LCL",
            BaseRegister::Arg => "ARG",
            BaseRegister::This => "THIS",
            BaseRegister::That => "THAT",
        }
    }
}

impl fmt::Display for BaseRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How a segment cell is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressMode {
    /// `RAM[RAM[base] + offset]`
    Indirect { base: BaseRegister, offset: u16 },
    /// Register cell `Rn`, no indirection
    Direct(u16),
    /// Named cell `namespace.index`, unique per translation unit
    Static { namespace: String, index: u16 },
    /// Not a memory reference; the value itself.
    ///
    /// An A-instruction holds 15 bits, so only 0..=32767 is loadable on real
    /// Hack hardware. Larger values are emitted unchanged and not rejected.
    Immediate(u16),
}

impl AddressMode {
    /// Assembly symbol of a static cell
    pub fn static_symbol(namespace: &str, index: u16) -> String {
        format!("{}.{}", namespace, index)
    }
}

/// Resolves segment references for the translation unit currently being emitted
#[derive(Debug, Clone, Default)]
pub struct SegmentResolver {
    namespace: String,
}

impl SegmentResolver {
    pub fn new(namespace: &str) -> Self {
        SegmentResolver {
            namespace: namespace.to_string(),
        }
    }

    /// Switch the static namespace at a unit boundary
    pub fn set_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn resolve(&self, segment: &str, index: u16) -> Result<AddressMode, TranslatorError> {
        let mode = match segment.parse::<Segment>()? {
            Segment::Local => AddressMode::Indirect {
                base: BaseRegister::Lcl,
                offset: index,
            },
            Segment::Argument => AddressMode::Indirect {
                base: BaseRegister::Arg,
                offset: index,
            },
            Segment::This => AddressMode::Indirect {
                base: BaseRegister::This,
                offset: index,
            },
            Segment::That => AddressMode::Indirect {
                base: BaseRegister::That,
                offset: index,
            },
            // Index ranges are not checked, matching the target's lack of bounds checks
            Segment::Pointer => AddressMode::Direct(POINTER_BASE.wrapping_add(index)),
            Segment::Temp => AddressMode::Direct(TEMP_BASE.wrapping_add(index)),
            Segment::Static => AddressMode::Static {
                namespace: self.namespace.clone(),
                index,
            },
            Segment::Constant => AddressMode::Immediate(index),
        };
        Ok(mode)
    }
}
