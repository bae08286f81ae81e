//! Platform register tables.
//!
//! A `RegisterTable` ties together two independently maintained numberings of the same machine
//! registers: the VM-level numbering that storage descriptors resolve to, where each register
//! class occupies a contiguous run of slots, and the canonical numbering used by the code
//! generator, which follows the register allocator's preferred order. Everything here is fixed
//! once a table has been built, and tables are passed explicitly to every operation that needs
//! them.

pub mod aarch64;
pub mod amd64;

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;

use crate::error::{Error, ErrorKind};
use crate::storage::{OptoReg, VmReg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLayout {
    Registers { vm_base: u32, count: u32, slots_per_reg: u32 },
    Stack { slots_per_index: u32, limit: u32 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageClass {
    pub kind: u32,
    pub name: &'static str,
    pub layout: ClassLayout
}

impl StorageClass {
    pub fn is_stack(&self) -> bool {
        matches!(self.layout, ClassLayout::Stack { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RegisterTable {
    name: &'static str,
    classes: Vec<StorageClass>,
    vm2opto: Vec<Option<OptoReg>>,
    opto_names: Vec<String>,
    frame_pointer: OptoReg,
    frame_pointer_paired: bool,
    stack0: u32
}

impl RegisterTable {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn reg_count(&self) -> u32 {
        self.opto_names.len() as u32
    }

    pub fn frame_pointer(&self) -> OptoReg {
        self.frame_pointer
    }

    /// The second half of the frame pointer when the code generator models it as one wide
    /// register split over two adjacent canonical numbers.
    pub fn frame_pointer_pair(&self) -> Option<OptoReg> {
        if self.frame_pointer_paired {
            Some(OptoReg(self.frame_pointer.0 + 1))
        } else {
            None
        }
    }

    pub fn stack0(&self) -> u32 {
        self.stack0
    }

    pub fn class(&self, kind: u32) -> Option<&StorageClass> {
        self.classes.iter().find(|c| c.kind == kind)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&StorageClass> {
        self.classes.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn vm_slot_count(&self) -> u32 {
        self.vm2opto.len() as u32
    }

    pub fn vm_to_opto(&self, reg: VmReg) -> Option<OptoReg> {
        self.vm2opto.get(reg.0 as usize).cloned().unwrap_or(None)
    }

    pub fn reg_name(&self, reg: OptoReg) -> Option<&str> {
        self.opto_names.get(reg.index()).map(|n| &n[..])
    }

    pub fn lookup(&self, name: &str) -> Option<OptoReg> {
        self.opto_names.iter().position(|n| n == name).map(OptoReg::from)
    }

    /// Re-checks the invariants `TableBuilder::build` establishes. Tables can only be obtained from
    /// the builder, so this only fails if a table was corrupted after construction.
    pub fn validate(&self) -> Result<(), Error> {
        let reg_count = self.reg_count();
        let invalid = |msg: String| Err(Error(ErrorKind::InvalidTable(msg), self.name));

        if reg_count == 0 {
            return invalid("table defines no registers".to_owned());
        };

        if self.frame_pointer.0 >= reg_count {
            return invalid(format!("frame pointer {} is not a register", self.frame_pointer));
        };

        if let Some(pair) = self.frame_pointer_pair() {
            if pair.0 >= reg_count {
                return invalid(format!("frame pointer pair {} is not a register", pair));
            };
        };

        if self.stack0 < reg_count {
            return invalid(format!("stack slots start at {}, inside the register space", self.stack0));
        };

        if let Some(reg) = self.vm2opto.iter().filter_map(|&r| r).find(|r| r.0 >= reg_count) {
            return invalid(format!("VM slot maps to {}, outside the register space", reg));
        };

        if let Some((a, _)) = self.classes.iter().map(|c| c.kind).sorted().tuple_windows().find(|(a, b)| a == b) {
            return invalid(format!("storage class kind {} is defined twice", a));
        };

        Ok(())
    }

    pub fn pretty(&self) -> PrettyTable {
        PrettyTable(self)
    }
}

pub struct PrettyTable<'a>(&'a RegisterTable);

impl <'a> fmt::Display for PrettyTable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let table = self.0;

        writeln!(f, "## REGISTER TABLE {} ##", table.name)?;
        writeln!(f, "  registers: {}", table.reg_count())?;
        write!(f, "  frame pointer: {} ({})", table.frame_pointer, table.reg_name(table.frame_pointer).unwrap_or("???"))?;
        if let Some(pair) = table.frame_pointer_pair() {
            write!(f, ", paired with {} ({})", pair, table.reg_name(pair).unwrap_or("???"))?;
        };
        writeln!(f)?;
        writeln!(f, "  stack slots from: {}", table.stack0)?;

        for c in table.classes.iter() {
            match c.layout {
                ClassLayout::Registers { vm_base, count, slots_per_reg } => {
                    writeln!(
                        f, "  [{}] {}: {} registers x {} slots at v{}",
                        c.kind, c.name, count, slots_per_reg, vm_base
                    )?;
                },
                ClassLayout::Stack { slots_per_index, limit } => {
                    writeln!(f, "  [{}] {}: {} slots x {} per index", c.kind, c.name, limit, slots_per_index)?;
                }
            };
        };

        Result::Ok(())
    }
}

enum ClassSpec {
    Registers { names: Vec<String>, suffixes: Vec<String> },
    Stack { slots_per_index: u32, limit: u32 }
}

/// Generates register names `prefix0` through `prefix{count - 1}`.
pub fn numbered(prefix: &str, count: u32) -> Vec<String> {
    (0..count).map(|i| format!("{}{}", prefix, i)).collect_vec()
}

pub struct TableBuilder {
    name: &'static str,
    classes: Vec<(u32, &'static str, ClassSpec)>,
    opto_only: Vec<String>,
    order: Vec<String>,
    frame_pointer: Option<(String, bool)>,
    stack0: Option<u32>
}

impl TableBuilder {
    pub fn new(name: &'static str) -> TableBuilder {
        TableBuilder {
            name,
            classes: vec![],
            opto_only: vec![],
            order: vec![],
            frame_pointer: None,
            stack0: None
        }
    }

    /// Adds a register class. Registers are listed in encoding order; each register occupies one VM
    /// slot per suffix, and the slot is named by appending the suffix to the register name.
    pub fn register_class<N, S>(mut self, kind: u32, class_name: &'static str, names: N, suffixes: &[S]) -> TableBuilder
        where N: IntoIterator, N::Item: Into<String>, S: AsRef<str> {
        self.classes.push((kind, class_name, ClassSpec::Registers {
            names: names.into_iter().map(|n| n.into()).collect_vec(),
            suffixes: suffixes.iter().map(|s| s.as_ref().to_owned()).collect_vec()
        }));
        self
    }

    pub fn stack_class(mut self, kind: u32, class_name: &'static str, slots_per_index: u32, limit: u32) -> TableBuilder {
        self.classes.push((kind, class_name, ClassSpec::Stack { slots_per_index, limit }));
        self
    }

    /// Adds registers the code generator allocates but that no storage class can name, such as
    /// condition flags.
    pub fn opto_only<N>(mut self, names: N) -> TableBuilder where N: IntoIterator, N::Item: Into<String> {
        self.opto_only.extend(names.into_iter().map(|n| n.into()));
        self
    }

    /// Appends to the canonical register order. If no order is given at all, VM slot order
    /// followed by the opto-only registers is used.
    pub fn allocation_order<N>(mut self, names: N) -> TableBuilder where N: IntoIterator, N::Item: Into<String> {
        self.order.extend(names.into_iter().map(|n| n.into()));
        self
    }

    pub fn frame_pointer(mut self, name: &str, paired: bool) -> TableBuilder {
        self.frame_pointer = Some((name.to_owned(), paired));
        self
    }

    pub fn stack0(mut self, stack0: u32) -> TableBuilder {
        self.stack0 = Some(stack0);
        self
    }

    pub fn build(self) -> Result<RegisterTable, Error> {
        let table_name = self.name;
        let invalid = |msg: String| Error(ErrorKind::InvalidTable(msg), table_name);

        let mut classes = vec![];
        let mut vm_names: Vec<String> = vec![];

        for (kind, class_name, spec) in self.classes {
            if classes.iter().any(|c: &StorageClass| c.kind == kind) {
                return Err(invalid(format!("storage class kind {} is defined twice", kind)));
            };
            if classes.iter().any(|c: &StorageClass| c.name.eq_ignore_ascii_case(class_name)) {
                return Err(invalid(format!("storage class name {} is defined twice", class_name)));
            };

            let layout = match spec {
                ClassSpec::Registers { names, suffixes } => {
                    if !names.is_empty() && suffixes.is_empty() {
                        return Err(invalid(format!("register class {} has no slots per register", class_name)));
                    };

                    let vm_base = vm_names.len() as u32;

                    for reg in names.iter() {
                        for suffix in suffixes.iter() {
                            vm_names.push(format!("{}{}", reg, suffix));
                        };
                    };

                    ClassLayout::Registers {
                        vm_base,
                        count: names.len() as u32,
                        slots_per_reg: suffixes.len() as u32
                    }
                },
                ClassSpec::Stack { slots_per_index, limit } => {
                    if slots_per_index == 0 {
                        return Err(invalid(format!("stack class {} has no slots per index", class_name)));
                    };

                    ClassLayout::Stack { slots_per_index, limit }
                }
            };

            classes.push(StorageClass { kind, name: class_name, layout });
        };

        let mut by_name: HashMap<&str, Option<u32>> = HashMap::new();

        for (i, n) in vm_names.iter().enumerate() {
            if by_name.insert(n, Some(i as u32)).is_some() {
                return Err(invalid(format!("register slot {} is defined twice", n)));
            };
        };
        for n in self.opto_only.iter() {
            if by_name.insert(n, None).is_some() {
                return Err(invalid(format!("register slot {} is defined twice", n)));
            };
        };

        let order = if self.order.is_empty() {
            vm_names.iter().chain(self.opto_only.iter()).cloned().collect_vec()
        } else {
            self.order
        };

        let mut vm2opto = vec![None; vm_names.len()];
        let mut opto_names: Vec<String> = Vec::with_capacity(order.len());

        for n in order {
            match by_name.get(&n[..]) {
                Some(&vm) => {
                    if opto_names.contains(&n) {
                        return Err(invalid(format!("register {} appears twice in the allocation order", n)));
                    };

                    if let Some(vm) = vm {
                        vm2opto[vm as usize] = Some(OptoReg(opto_names.len() as u32));
                    };
                },
                None => {
                    return Err(invalid(format!("allocation order names unknown register {}", n)));
                }
            };

            opto_names.push(n);
        };

        let reg_count = opto_names.len() as u32;

        if reg_count == 0 {
            return Err(invalid("table defines no registers".to_owned()));
        };

        let (fp_name, frame_pointer_paired) = match self.frame_pointer {
            Some(fp) => fp,
            None => return Err(invalid("no frame pointer given".to_owned()))
        };

        let frame_pointer = match opto_names.iter().position(|n| *n == fp_name) {
            Some(i) => OptoReg(i as u32),
            None => return Err(invalid(format!("frame pointer {} is not in the allocation order", fp_name)))
        };

        if frame_pointer_paired && frame_pointer.0 + 1 >= reg_count {
            return Err(invalid(format!("frame pointer {} is the last register and cannot be paired", fp_name)));
        };

        let stack0 = self.stack0.unwrap_or((reg_count + 1) & !1);

        if stack0 < reg_count {
            return Err(invalid(format!("stack slots start at {}, inside the register space", stack0)));
        };

        for c in classes.iter() {
            if let ClassLayout::Stack { slots_per_index, limit } = c.layout {
                let max = (limit as u64) * (slots_per_index as u64) + (stack0 as u64);

                if max > (u32::MAX as u64) {
                    return Err(invalid(format!("stack class {} overflows the register numbering", c.name)));
                };
            };
        };

        Ok(RegisterTable {
            name: table_name,
            classes,
            vm2opto,
            opto_names,
            frame_pointer,
            frame_pointer_paired,
            stack0
        })
    }
}

/// Looks up one of the built-in platform tables by target name.
pub fn by_name(name: &str) -> Option<&'static RegisterTable> {
    match name {
        "x86_64" | "amd64" | "x64" => Some(&*amd64::TABLE),
        "aarch64" | "arm64" => Some(&*aarch64::TABLE),
        _ => None
    }
}
