use std::fmt;

/// Where one argument or return value of a foreign call lives under the platform calling
/// convention. `kind` selects one of the platform's storage classes and `index` a location inside
/// it (a register encoding, or a stack slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageDescriptor {
    pub kind: u32,
    pub index: u32
}

impl StorageDescriptor {
    pub fn new(kind: u32, index: u32) -> StorageDescriptor {
        StorageDescriptor { kind, index }
    }

    /// Converts the signed pair handed across the managed boundary. Negative values can never be
    /// valid and yield `None`.
    pub fn from_raw(kind: i32, index: i32) -> Option<StorageDescriptor> {
        if kind < 0 || index < 0 {
            None
        } else {
            Some(StorageDescriptor { kind: kind as u32, index: index as u32 })
        }
    }
}

impl fmt::Display for StorageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.index)
    }
}

/// A slot number in the VM-level register numbering, where every register occupies
/// `slots_per_reg` consecutive slots of its class starting at the class base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VmReg(pub u32);

impl fmt::Display for VmReg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A canonical register number as used by the code generator. Values below the table's register
/// count are registers; values from the table's `stack0` upwards are stack slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptoReg(pub u32);

impl OptoReg {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OptoReg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Into<usize> for OptoReg {
    fn into(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for OptoReg {
    fn from(i: usize) -> OptoReg {
        OptoReg(i as u32)
    }
}
