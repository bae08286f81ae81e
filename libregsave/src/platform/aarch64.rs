use itertools::Itertools;

use crate::error::Error;

use super::{RegisterTable, TableBuilder, numbered};

pub const NAME: &str = "aarch64";

pub const INTEGER: u32 = 0;
pub const VECTOR: u32 = 1;
pub const STACK: u32 = 3;

pub const STACK_LIMIT: u32 = 1 << 16;

pub const FRAME_POINTER: &str = "R31";

const GPR_SUFFIXES: &[&str] = &["", "_H"];
const VEC_SUFFIXES: &[&str] = &["", "_H", "_J", "_K"];

fn chunk(prefix: &str, regs: impl Iterator<Item=u32>, suffixes: &[&str]) -> Vec<String> {
    regs.flat_map(|r| suffixes.iter().map(move |s| format!("{}{}{}", prefix, r, s))).collect_vec()
}

pub fn build_table() -> Result<RegisterTable, Error> {
    // volatiles, then argument registers, then callee-saved, then the registers the allocator
    // never hands out: heap base, thread, fp, lr, sp and the two scratch registers
    let gpr_order = chunk("R", (10..19).chain(0..8).chain(19..27), GPR_SUFFIXES)
        .into_iter()
        .chain(chunk("R", (27..32).chain(8..10), GPR_SUFFIXES));
    let vec_order = chunk("V", (16..32).chain(0..8).chain(8..16), VEC_SUFFIXES);

    TableBuilder::new(NAME)
        .register_class(INTEGER, "integer", numbered("R", 32), GPR_SUFFIXES)
        .register_class(VECTOR, "vector", numbered("V", 32), VEC_SUFFIXES)
        .stack_class(STACK, "stack", 2, STACK_LIMIT)
        .opto_only(vec!["RFLAGS"])
        .allocation_order(gpr_order)
        .allocation_order(vec_order)
        .allocation_order(vec!["RFLAGS"])
        .frame_pointer(FRAME_POINTER, true)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OptoReg, VmReg};

    #[test]
    fn test_table_builds() {
        let table = build_table().unwrap();

        assert!(table.validate().is_ok());
        assert_eq!(table.reg_count(), 64 + 128 + 1);
        assert_eq!(table.vm_slot_count(), 64 + 128);
        assert_eq!(table.stack0(), 194);
    }

    #[test]
    fn test_storage_kinds() {
        assert_eq!(TABLE.class_by_name("integer").map(|c| c.kind), Some(0));
        assert_eq!(TABLE.class_by_name("vector").map(|c| c.kind), Some(1));
        assert_eq!(TABLE.class_by_name("stack").map(|c| c.kind), Some(3));
        assert!(TABLE.class(3).unwrap().is_stack());
        assert!(TABLE.class(2).is_none());
    }

    #[test]
    fn test_frame_pointer_is_sp() {
        let fp = TABLE.frame_pointer();

        assert_eq!(TABLE.reg_name(fp), Some("R31"));
        assert_eq!(TABLE.frame_pointer_pair(), Some(OptoReg(fp.0 + 1)));
        assert_eq!(TABLE.reg_name(OptoReg(fp.0 + 1)), Some("R31_H"));
    }

    #[test]
    fn test_allocation_order() {
        assert_eq!(TABLE.reg_name(OptoReg(0)), Some("R10"));
        assert_eq!(TABLE.reg_name(OptoReg(18)), Some("R0"));
        assert_eq!(TABLE.reg_name(OptoReg(62)), Some("R9"));
        assert_eq!(TABLE.reg_name(OptoReg(64)), Some("V16"));
        assert_eq!(TABLE.reg_name(OptoReg(67)), Some("V16_K"));
        assert_eq!(TABLE.reg_name(OptoReg(192)), Some("RFLAGS"));
        assert_eq!(TABLE.vm_to_opto(VmReg(0)), Some(OptoReg(18)));
        assert_eq!(TABLE.vm_to_opto(VmReg(64)), TABLE.lookup("V0"));
    }
}
