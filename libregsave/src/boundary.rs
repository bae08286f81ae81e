//! Entry points exposed to the managed side of the foreign-call boundary.
//!
//! The set of entry points is fixed, so it is kept as a static table of typed function pointers.
//! Registration hands each of them to a `NativeBinder`, which plays the part of the managed class
//! declaring the matching native methods.

use itertools::Itertools;

use crate::error::{Error, ErrorKind};
use crate::log::Log;
use crate::mapper::map_raw_storage;
use crate::platform::RegisterTable;
use crate::policy::compute_policy;
use crate::storage::StorageDescriptor;

pub type MapStorageFn = fn(&RegisterTable, i32, i32) -> Result<i64, Error>;
pub type ComputePolicyFn = fn(&RegisterTable, &[(i32, i32)], &mut Log) -> Result<String, Error>;

#[derive(Clone, Copy)]
pub enum EntryPoint {
    MapStorage(MapStorageFn),
    ComputePolicy(ComputePolicyFn)
}

#[derive(Clone, Copy)]
pub struct NativeMethod {
    pub name: &'static str,
    pub signature: &'static str,
    pub entry: EntryPoint
}

pub const MAP_STORAGE_NAME: &str = "vmStorageToVMReg";
pub const MAP_STORAGE_SIGNATURE: &str = "(II)J";
pub const COMPUTE_POLICY_NAME: &str = "computeRegSavePolicy";
pub const COMPUTE_POLICY_SIGNATURE: &str = "([Ljdk/internal/invoke/VMStorageProxy;)Ljava/lang/String;";

pub const NATIVE_METHODS: &[NativeMethod] = &[
    NativeMethod {
        name: MAP_STORAGE_NAME,
        signature: MAP_STORAGE_SIGNATURE,
        entry: EntryPoint::MapStorage(vm_storage_to_vm_reg)
    },
    NativeMethod {
        name: COMPUTE_POLICY_NAME,
        signature: COMPUTE_POLICY_SIGNATURE,
        entry: EntryPoint::ComputePolicy(compute_reg_save_policy)
    }
];

pub fn vm_storage_to_vm_reg(table: &RegisterTable, kind: i32, index: i32) -> Result<i64, Error> {
    map_raw_storage(table, kind, index).map(|r| r.0 as i64)
}

pub fn compute_reg_save_policy(table: &RegisterTable, storages: &[(i32, i32)], log: &mut Log) -> Result<String, Error> {
    let storages = storages.iter().map(|&(kind, index)| {
        StorageDescriptor::from_raw(kind, index)
            .ok_or_else(|| Error(ErrorKind::InvalidRawStorage { kind, index }, table.name()))
    }).collect::<Result<Vec<_>, _>>()?;

    compute_policy(table, &storages, log).map(|p| p.to_string())
}

pub trait NativeBinder {
    fn bind(&mut self, method: &NativeMethod) -> Result<(), String>;
}

/// Validates the table, then binds every entry point. Any failure leaves the boundary unusable and
/// must stop the embedding process from starting.
pub fn register_natives(binder: &mut dyn NativeBinder, table: &RegisterTable, log: &mut Log) -> Result<(), Error> {
    if let Err(Error(kind, _)) = table.validate() {
        let msg = match kind {
            ErrorKind::InvalidTable(msg) => msg,
            kind => format!("{:?}", kind)
        };

        return Err(Error(ErrorKind::Registration(format!("register table rejected: {}", msg)), table.name()));
    };

    for method in NATIVE_METHODS.iter() {
        if let Err(msg) = binder.bind(method) {
            return Err(Error(
                ErrorKind::Registration(format!("{} {}: {}", method.name, method.signature, msg)),
                table.name()
            ));
        };

        log_writeln!(log, "{}: bound native {} {}", table.name(), method.name, method.signature);
    };

    Ok(())
}

/// A managed class declaring native methods by name and signature, as seen from the native side.
pub struct NativeClass {
    pub name: &'static str,
    declared: Vec<(&'static str, &'static str)>,
    map_storage: Option<MapStorageFn>,
    compute_policy: Option<ComputePolicyFn>
}

impl NativeClass {
    pub fn new(name: &'static str, declared: &[(&'static str, &'static str)]) -> NativeClass {
        NativeClass {
            name,
            declared: declared.to_vec(),
            map_storage: None,
            compute_policy: None
        }
    }

    pub fn native_entry_point() -> NativeClass {
        NativeClass::new("jdk/internal/invoke/NativeEntryPoint", &[
            (MAP_STORAGE_NAME, MAP_STORAGE_SIGNATURE),
            (COMPUTE_POLICY_NAME, COMPUTE_POLICY_SIGNATURE)
        ])
    }

    pub fn is_bound(&self) -> bool {
        self.map_storage.is_some() && self.compute_policy.is_some()
    }

    fn unbound(&self, table: &RegisterTable, method: &str) -> Error {
        Error(ErrorKind::Registration(format!("{}.{} is not bound", self.name, method)), table.name())
    }

    pub fn vm_storage_to_vm_reg(&self, table: &RegisterTable, kind: i32, index: i32) -> Result<i64, Error> {
        match self.map_storage {
            Some(f) => f(table, kind, index),
            None => Err(self.unbound(table, MAP_STORAGE_NAME))
        }
    }

    pub fn compute_reg_save_policy(&self, table: &RegisterTable, storages: &[(i32, i32)], log: &mut Log) -> Result<String, Error> {
        match self.compute_policy {
            Some(f) => f(table, storages, log),
            None => Err(self.unbound(table, COMPUTE_POLICY_NAME))
        }
    }
}

impl NativeBinder for NativeClass {
    fn bind(&mut self, method: &NativeMethod) -> Result<(), String> {
        if !self.declared.iter().any(|&(n, s)| n == method.name && s == method.signature) {
            return Err(format!(
                "{} declares no native method {} {} (declared: {})",
                self.name, method.name, method.signature,
                self.declared.iter().map(|&(n, s)| format!("{} {}", n, s)).join(", ")
            ));
        };

        match method.entry {
            EntryPoint::MapStorage(f) => self.map_storage = Some(f),
            EntryPoint::ComputePolicy(f) => self.compute_policy = Some(f)
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{amd64, numbered, TableBuilder};

    fn registered() -> NativeClass {
        let mut class = NativeClass::native_entry_point();

        register_natives(&mut class, &amd64::TABLE, &mut Log::none()).unwrap();
        class
    }

    #[test]
    fn test_register_and_call() {
        let class = registered();
        let table = &*amd64::TABLE;

        assert!(class.is_bound());
        assert_eq!(class.vm_storage_to_vm_reg(table, 0, 7), Ok(14));
        assert_eq!(class.vm_storage_to_vm_reg(table, 0, 4), Ok(30));

        let policy = class.compute_reg_save_policy(table, &[(0, 7), (1, 0)], &mut Log::none()).unwrap();

        assert_eq!(policy.len(), table.reg_count() as usize);
        assert_eq!(&policy[14..16], "CE");
        assert_eq!(&policy[30..34], "NNCE");
        assert_eq!(policy.chars().filter(|&c| c == 'C').count(), 2);
    }

    #[test]
    fn test_raw_errors() {
        let class = registered();
        let table = &*amd64::TABLE;

        assert!(class.vm_storage_to_vm_reg(table, -1, 0).unwrap_err().is_invalid_storage());
        assert!(class.vm_storage_to_vm_reg(table, 0, 99).unwrap_err().is_invalid_storage());
        assert!(class.compute_reg_save_policy(table, &[(0, 1), (1, -2)], &mut Log::none()).unwrap_err().is_invalid_storage());

        let err = class.compute_reg_save_policy(table, &[(amd64::STACK as i32, 0)], &mut Log::none()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OutOfRangeRegister { .. }));
    }

    #[test]
    fn test_signature_mismatch() {
        let mut class = NativeClass::new("Foo", &[
            (MAP_STORAGE_NAME, "(JJ)J"),
            (COMPUTE_POLICY_NAME, COMPUTE_POLICY_SIGNATURE)
        ]);
        let err = register_natives(&mut class, &amd64::TABLE, &mut Log::none()).unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::Registration(_)));
        assert!(!class.is_bound());
    }

    #[test]
    fn test_unbound_call() {
        let class = NativeClass::native_entry_point();
        let err = class.vm_storage_to_vm_reg(&amd64::TABLE, 0, 0).unwrap_err();

        assert_eq!(
            err.kind(),
            &ErrorKind::Registration("jdk/internal/invoke/NativeEntryPoint.vmStorageToVMReg is not bound".to_owned())
        );
    }

    #[test]
    fn test_log() {
        let mut class = NativeClass::native_entry_point();
        let table = TableBuilder::new("tiny")
            .register_class(0, "r", numbered("R", 2), &[""])
            .frame_pointer("R0", true)
            .build()
            .unwrap();
        let mut buf: Vec<u8> = vec![];

        register_natives(&mut class, &table, &mut Log(Some(&mut buf))).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "tiny: bound native vmStorageToVMReg (II)J\n\
             tiny: bound native computeRegSavePolicy ([Ljdk/internal/invoke/VMStorageProxy;)Ljava/lang/String;\n"
        );
        assert_eq!(class.compute_reg_save_policy(&table, &[], &mut Log::none()), Ok("NN".to_owned()));
    }
}
