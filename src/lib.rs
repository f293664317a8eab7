#![crate_name = "hackvm"]

#[macro_use]
extern crate lazy_static;

pub mod hack;
pub mod vm_translator;
