use std::error;
use std::fmt;

use crate::storage::{OptoReg, StorageDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidStorage(StorageDescriptor),
    InvalidRawStorage { kind: i32, index: i32 },
    OutOfRangeRegister { reg: OptoReg, reg_count: u32 },
    Registration(String),
    InvalidTable(String)
}

/// An error raised while working against one platform register table. The second field names the
/// table so that a mismatch between the caller's ABI layer and the table can be traced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error(pub ErrorKind, pub &'static str);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn platform(&self) -> &'static str {
        self.1
    }

    pub fn is_invalid_storage(&self) -> bool {
        matches!(self.0, ErrorKind::InvalidStorage(_) | ErrorKind::InvalidRawStorage { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: ", self.1)?;

        match self.0 {
            ErrorKind::InvalidStorage(storage) => {
                write!(f, "storage (kind {}, index {}) is not defined by the register table", storage.kind, storage.index)
            },
            ErrorKind::InvalidRawStorage { kind, index } => {
                write!(f, "storage (kind {}, index {}) has a negative component", kind, index)
            },
            ErrorKind::OutOfRangeRegister { reg, reg_count } => {
                write!(f, "register {} is outside the register space [0, {})", reg, reg_count)
            },
            ErrorKind::Registration(ref msg) => {
                write!(f, "failed to register boundary entry points: {}", msg)
            },
            ErrorKind::InvalidTable(ref msg) => {
                write!(f, "inconsistent register table: {}", msg)
            }
        }
    }
}

impl error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error(ErrorKind::InvalidStorage(StorageDescriptor::new(0, 16)), "x86_64");
        assert_eq!(
            format!("{}", e),
            "x86_64: storage (kind 0, index 16) is not defined by the register table"
        );

        let e = Error(ErrorKind::OutOfRangeRegister { reg: OptoReg(600), reg_count: 559 }, "x86_64");
        assert_eq!(
            format!("{}", e),
            "x86_64: register #600 is outside the register space [0, 559)"
        );
    }

    #[test]
    fn test_is_invalid_storage() {
        assert!(Error(ErrorKind::InvalidStorage(StorageDescriptor::new(9, 0)), "t").is_invalid_storage());
        assert!(Error(ErrorKind::InvalidRawStorage { kind: -1, index: 0 }, "t").is_invalid_storage());
        assert!(!Error(ErrorKind::Registration("x".to_owned()), "t").is_invalid_storage());
    }
}
