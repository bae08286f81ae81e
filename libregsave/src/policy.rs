use std::fmt;

use itertools::Itertools;

use crate::bitvec::BitVec;
use crate::error::{Error, ErrorKind};
use crate::log::Log;
use crate::mapper::map_storage;
use crate::platform::RegisterTable;
use crate::storage::{OptoReg, StorageDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveClass {
    NeverTouch,
    MustPreserve,
    ExpectClobbered
}

impl SaveClass {
    pub fn symbol(self) -> char {
        match self {
            SaveClass::NeverTouch => 'N',
            SaveClass::MustPreserve => 'C',
            SaveClass::ExpectClobbered => 'E'
        }
    }

    pub fn from_symbol(c: char) -> Option<SaveClass> {
        match c {
            'N' => Some(SaveClass::NeverTouch),
            'C' => Some(SaveClass::MustPreserve),
            'E' => Some(SaveClass::ExpectClobbered),
            _ => None
        }
    }
}

/// One classification per canonical register, in canonical order. The stub generator reads this
/// positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePolicy(Vec<SaveClass>);

impl SavePolicy {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, reg: OptoReg) -> Option<SaveClass> {
        self.0.get(reg.index()).cloned()
    }

    pub fn classes(&self) -> &[SaveClass] {
        &self.0
    }

    pub fn registers_in(&self, class: SaveClass) -> impl Iterator<Item=OptoReg> + '_ {
        self.0.iter().positions(move |&c| c == class).map(OptoReg::from)
    }

    pub fn pretty<'a>(&'a self, table: &'a RegisterTable) -> PrettyPolicy<'a> {
        PrettyPolicy(self, table)
    }
}

impl fmt::Display for SavePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for c in self.0.iter() {
            write!(f, "{}", c.symbol())?;
        };

        Result::Ok(())
    }
}

/// Lists the registers that are not `ExpectClobbered` by name.
pub struct PrettyPolicy<'a>(&'a SavePolicy, &'a RegisterTable);

impl <'a> fmt::Display for PrettyPolicy<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let PrettyPolicy(policy, table) = *self;
        let name = |r: OptoReg| table.reg_name(r).unwrap_or("???");

        write!(f, "never touch = {{ ")?;
        for r in policy.registers_in(SaveClass::NeverTouch) {
            write!(f, "{} ", name(r))?;
        };
        write!(f, "}}, must preserve = {{ ")?;
        for r in policy.registers_in(SaveClass::MustPreserve) {
            write!(f, "{} ", name(r))?;
        };
        write!(f, "}}")
    }
}

/// Maps every storage and collects the resulting registers into a set sized to the register space.
pub fn call_touched_set<'a>(
    table: &RegisterTable,
    storages: impl IntoIterator<Item=&'a StorageDescriptor>
) -> Result<BitVec<OptoReg>, Error> {
    let mut set = BitVec::new(table.reg_count() as usize);

    for &storage in storages {
        let reg = map_storage(table, storage)?;

        if set.set(reg, true).is_none() {
            return Err(Error(
                ErrorKind::OutOfRangeRegister { reg, reg_count: table.reg_count() },
                table.name()
            ));
        };
    };

    Ok(set)
}

/// Classifies every canonical register from the set of registers a call's arguments and returns
/// occupy. The frame pointer and its pair always come out `NeverTouch`, even when a storage names
/// them.
pub fn classify(table: &RegisterTable, touched: &BitVec<OptoReg>) -> SavePolicy {
    let fp = table.frame_pointer();
    let fp_pair = table.frame_pointer_pair();

    SavePolicy((0..table.reg_count()).map(OptoReg).map(|r| {
        if r == fp || Some(r) == fp_pair {
            SaveClass::NeverTouch
        } else if touched.get(r) {
            SaveClass::MustPreserve
        } else {
            SaveClass::ExpectClobbered
        }
    }).collect_vec())
}

pub fn compute_policy<'a>(
    table: &RegisterTable,
    storages: impl IntoIterator<Item=&'a StorageDescriptor>,
    log: &mut Log
) -> Result<SavePolicy, Error> {
    let touched = call_touched_set(table, storages)?;

    log_write!(log, "{}: call touched = {{ ", table.name());
    for r in touched.iter() {
        log_write!(log, "{} ", table.reg_name(r).unwrap_or("???"));
    };
    log_writeln!(log, "}}");

    let policy = classify(table, &touched);

    log_writeln!(log, "{}: {}", table.name(), policy.pretty(table));

    Ok(policy)
}
