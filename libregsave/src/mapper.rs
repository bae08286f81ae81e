use crate::error::{Error, ErrorKind};
use crate::platform::{ClassLayout, RegisterTable};
use crate::storage::{OptoReg, StorageDescriptor, VmReg};

/// Resolves a storage descriptor to its VM-level slot, or to its stack slot index for stack
/// storage. Register storages resolve to the low slot of the register.
pub fn storage_to_vm_reg(table: &RegisterTable, storage: StorageDescriptor) -> Result<VmReg, Error> {
    let invalid = || Error(ErrorKind::InvalidStorage(storage), table.name());
    let class = table.class(storage.kind).ok_or_else(invalid)?;

    match class.layout {
        ClassLayout::Registers { vm_base, count, slots_per_reg } => {
            if storage.index >= count {
                return Err(invalid());
            };

            Ok(VmReg(vm_base + storage.index * slots_per_reg))
        },
        ClassLayout::Stack { .. } => Err(invalid())
    }
}

/// Maps a storage descriptor to the code generator's canonical register number.
///
/// Register storages go through the table's VM-to-canonical mapping; stack storages are numbered
/// upwards from the table's first stack slot. Anything the table does not define is rejected
/// rather than clamped, since it means the caller's ABI layer and the register table disagree.
pub fn map_storage(table: &RegisterTable, storage: StorageDescriptor) -> Result<OptoReg, Error> {
    let invalid = || Error(ErrorKind::InvalidStorage(storage), table.name());
    let class = table.class(storage.kind).ok_or_else(invalid)?;

    match class.layout {
        ClassLayout::Registers { .. } => {
            let vm = storage_to_vm_reg(table, storage)?;
            table.vm_to_opto(vm).ok_or_else(invalid)
        },
        ClassLayout::Stack { slots_per_index, limit } => {
            if storage.index >= limit {
                return Err(invalid());
            };

            Ok(OptoReg(table.stack0() + storage.index * slots_per_index))
        }
    }
}

/// The boundary form of `map_storage`, taking the signed pair the managed side passes.
pub fn map_raw_storage(table: &RegisterTable, kind: i32, index: i32) -> Result<OptoReg, Error> {
    match StorageDescriptor::from_raw(kind, index) {
        Some(storage) => map_storage(table, storage),
        None => Err(Error(ErrorKind::InvalidRawStorage { kind, index }, table.name()))
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::platform::{aarch64, amd64, numbered, TableBuilder};
    use crate::platform::amd64::regs::{RealRegister, XmmRegister};

    #[test]
    fn test_amd64_gprs() {
        let table = &*amd64::TABLE;

        for &r in RealRegister::ALL.iter() {
            let opto = map_storage(table, amd64::gpr_storage(r)).unwrap();
            assert_eq!(table.reg_name(opto), Some(r.table_name()));
        };
    }

    #[test]
    fn test_amd64_xmms() {
        let table = &*amd64::TABLE;

        for x in XmmRegister::all() {
            let opto = map_storage(table, amd64::xmm_storage(x)).unwrap();
            assert_eq!(table.reg_name(opto).unwrap(), format!("XMM{}", x.0));
        };
    }

    #[test]
    fn test_amd64_known_numbers() {
        let table = &*amd64::TABLE;

        assert_eq!(map_storage(table, amd64::gpr_storage(RealRegister::Rdi)), Ok(OptoReg(14)));
        assert_eq!(map_storage(table, amd64::gpr_storage(RealRegister::Rsi)), Ok(OptoReg(18)));
        assert_eq!(map_storage(table, amd64::gpr_storage(RealRegister::Rax)), Ok(OptoReg(20)));
        assert_eq!(map_storage(table, amd64::gpr_storage(RealRegister::Rsp)), Ok(OptoReg(30)));
        assert_eq!(map_storage(table, amd64::xmm_storage(XmmRegister(0))), Ok(OptoReg(32)));
        assert_eq!(map_storage(table, amd64::xmm_storage(XmmRegister(1))), Ok(OptoReg(48)));
    }

    #[test]
    fn test_amd64_stack() {
        let table = &*amd64::TABLE;

        assert_eq!(map_storage(table, amd64::stack_storage(0)), Ok(OptoReg(560)));
        assert_eq!(map_storage(table, amd64::stack_storage(3)), Ok(OptoReg(566)));
        assert!(map_storage(table, amd64::stack_storage(amd64::STACK_LIMIT)).is_err());
        assert!(storage_to_vm_reg(table, amd64::stack_storage(0)).is_err());
    }

    #[test]
    fn test_amd64_invalid() {
        let table = &*amd64::TABLE;

        let err = map_storage(table, StorageDescriptor::new(amd64::INTEGER, 16)).unwrap_err();
        assert_eq!(err, Error(ErrorKind::InvalidStorage(StorageDescriptor::new(0, 16)), "x86_64"));

        assert!(map_storage(table, StorageDescriptor::new(amd64::VECTOR, 32)).unwrap_err().is_invalid_storage());
        assert!(map_storage(table, StorageDescriptor::new(amd64::X87, 0)).unwrap_err().is_invalid_storage());
        assert!(map_storage(table, StorageDescriptor::new(9, 0)).unwrap_err().is_invalid_storage());
    }

    #[test]
    fn test_deterministic() {
        let table = &*amd64::TABLE;
        let storages = (0..16).map(|i| StorageDescriptor::new(amd64::INTEGER, i)).collect_vec();

        let first = storages.iter().map(|&s| map_storage(table, s).unwrap()).collect_vec();
        let second = storages.iter().rev().map(|&s| map_storage(table, s).unwrap()).collect_vec();

        assert_eq!(first, second.into_iter().rev().collect_vec());
        assert_eq!(first.iter().unique().count(), 16);
    }

    #[test]
    fn test_aarch64() {
        let table = &*aarch64::TABLE;

        let r0 = map_storage(table, StorageDescriptor::new(aarch64::INTEGER, 0)).unwrap();
        let v0 = map_storage(table, StorageDescriptor::new(aarch64::VECTOR, 0)).unwrap();
        let sp = map_storage(table, StorageDescriptor::new(aarch64::INTEGER, 31)).unwrap();

        assert_eq!(table.reg_name(r0), Some("R0"));
        assert_eq!(table.reg_name(v0), Some("V0"));
        assert_eq!(sp, table.frame_pointer());
        assert!(map_storage(table, StorageDescriptor::new(aarch64::INTEGER, 32)).is_err());
        assert!(map_storage(table, StorageDescriptor::new(2, 0)).unwrap_err().is_invalid_storage());
        assert_eq!(
            map_storage(table, StorageDescriptor::new(aarch64::STACK, 1)),
            Ok(OptoReg(table.stack0() + 2))
        );
    }

    #[test]
    fn test_unmapped_vm_slot() {
        let table = TableBuilder::new("partial")
            .register_class(0, "r", numbered("R", 4), &[""])
            .allocation_order(vec!["R0", "R2", "R3"])
            .frame_pointer("R3", false)
            .build()
            .unwrap();

        assert_eq!(map_storage(&table, StorageDescriptor::new(0, 2)), Ok(OptoReg(1)));
        assert_eq!(storage_to_vm_reg(&table, StorageDescriptor::new(0, 1)), Ok(VmReg(1)));
        assert!(map_storage(&table, StorageDescriptor::new(0, 1)).unwrap_err().is_invalid_storage());
    }

    #[test]
    fn test_raw() {
        let table = &*amd64::TABLE;

        assert_eq!(map_raw_storage(table, 0, 7), Ok(OptoReg(14)));
        assert_eq!(
            map_raw_storage(table, 0, -1),
            Err(Error(ErrorKind::InvalidRawStorage { kind: 0, index: -1 }, "x86_64"))
        );
    }
}
