pub mod calling_convention;
pub mod regs;

use itertools::Itertools;

use crate::error::Error;
use crate::storage::StorageDescriptor;

use super::{RegisterTable, TableBuilder, numbered};
use self::regs::{RealRegister, XmmRegister, XMM_REGISTER_COUNT};

pub const NAME: &str = "x86_64";

pub const INTEGER: u32 = 0;
pub const VECTOR: u32 = 1;
pub const X87: u32 = 2;
pub const STACK: u32 = 3;

/// Stack slots a storage index may address. The code generator numbers stack slots in 32-bit
/// units, so each 64-bit stack argument covers two of them.
pub const STACK_LIMIT: u32 = 1 << 16;

const GPR_SUFFIXES: &[&str] = &["", "_H"];
const XMM_SUFFIXES: &[&str] = &[
    "", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p"
];

// General purpose registers in the allocator's order. RSP comes last so that it and its high half
// sit at the end of the chunk.
const GPR_ORDER: &[RealRegister] = &[
    RealRegister::R10,
    RealRegister::R11,
    RealRegister::R8,
    RealRegister::R9,
    RealRegister::R12,
    RealRegister::Rcx,
    RealRegister::Rbx,
    RealRegister::Rdi,
    RealRegister::Rdx,
    RealRegister::Rsi,
    RealRegister::Rax,
    RealRegister::Rbp,
    RealRegister::R13,
    RealRegister::R14,
    RealRegister::R15,
    RealRegister::Rsp
];

fn slot_names(reg: &str, suffixes: &[&str]) -> Vec<String> {
    suffixes.iter().map(|s| format!("{}{}", reg, s)).collect_vec()
}

pub fn build_table() -> Result<RegisterTable, Error> {
    let gpr_order = GPR_ORDER.iter().flat_map(|r| slot_names(r.table_name(), GPR_SUFFIXES));
    let xmm_order = numbered("XMM", XMM_REGISTER_COUNT).into_iter().flat_map(|r| slot_names(&r, XMM_SUFFIXES));
    let opmask = (1..8).rev().flat_map(|k| slot_names(&format!("K{}", k), GPR_SUFFIXES)).collect_vec();

    TableBuilder::new(NAME)
        .register_class(INTEGER, "integer", RealRegister::ALL.iter().map(|r| r.table_name()), GPR_SUFFIXES)
        .register_class(VECTOR, "vector", numbered("XMM", XMM_REGISTER_COUNT), XMM_SUFFIXES)
        .register_class(X87, "x87", Vec::<String>::new(), GPR_SUFFIXES)
        .stack_class(STACK, "stack", 2, STACK_LIMIT)
        .opto_only(opmask.iter().cloned())
        .opto_only(vec!["RFLAGS"])
        .allocation_order(gpr_order)
        .allocation_order(xmm_order)
        .allocation_order(opmask)
        .allocation_order(vec!["RFLAGS"])
        .frame_pointer(RealRegister::Rsp.table_name(), true)
        .build()
}

lazy_static! {
    pub static ref TABLE: RegisterTable = {
        match build_table() {
            Ok(table) => table,
            Err(e) => panic!("built-in register table is inconsistent: {}", e)
        }
    };
}

pub fn gpr_storage(reg: RealRegister) -> StorageDescriptor {
    StorageDescriptor::new(INTEGER, reg.encoding())
}

pub fn xmm_storage(reg: XmmRegister) -> StorageDescriptor {
    StorageDescriptor::new(VECTOR, reg.encoding())
}

pub fn stack_storage(slot: u32) -> StorageDescriptor {
    StorageDescriptor::new(STACK, slot)
}
