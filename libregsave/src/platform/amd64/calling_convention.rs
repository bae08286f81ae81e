use std::fmt;

use itertools::Itertools;
use smallvec::SmallVec;

use crate::storage::StorageDescriptor;
use super::{INTEGER, VECTOR, gpr_storage, xmm_storage};
use super::regs::{RealRegister, XmmRegister, XMM_LEGACY_COUNT};

pub trait CallingConvention {
    fn name(&self) -> &'static str;

    fn int_arg_regs(&self) -> &'static [RealRegister];
    fn int_return_regs(&self) -> &'static [RealRegister];
    fn vector_arg_regs(&self) -> &'static [XmmRegister];
    fn vector_return_regs(&self) -> &'static [XmmRegister];

    fn nonvolatile_regs(&self) -> &'static [RealRegister];
    fn nonvolatile_vector_regs(&self) -> &'static [XmmRegister];

    fn frame_pointer(&self) -> RealRegister;
    fn stack_pointer(&self) -> RealRegister;

    fn is_volatile_reg(&self, reg: RealRegister) -> bool {
        !self.nonvolatile_regs().contains(&reg)
    }

    fn is_volatile_vector_reg(&self, reg: XmmRegister) -> bool {
        !self.nonvolatile_vector_regs().contains(&reg)
    }

    /// Whether the register a storage names is clobbered by a call under this convention. Storages
    /// that do not name a register have no answer.
    fn is_volatile(&self, storage: StorageDescriptor) -> Option<bool> {
        match storage.kind {
            INTEGER => RealRegister::from_encoding(storage.index).map(|r| self.is_volatile_reg(r)),
            VECTOR if storage.index < 32 => Some(self.is_volatile_vector_reg(XmmRegister(storage.index as u8))),
            _ => None
        }
    }

    fn arg_storages(&self) -> Vec<StorageDescriptor> {
        self.int_arg_regs().iter().map(|&r| gpr_storage(r))
            .chain(self.vector_arg_regs().iter().map(|&r| xmm_storage(r)))
            .collect_vec()
    }

    fn return_storages(&self) -> Vec<StorageDescriptor> {
        self.int_return_regs().iter().map(|&r| gpr_storage(r))
            .chain(self.vector_return_regs().iter().map(|&r| xmm_storage(r)))
            .collect_vec()
    }
}

const XMM_0_7: &[XmmRegister] = &[
    XmmRegister(0), XmmRegister(1), XmmRegister(2), XmmRegister(3),
    XmmRegister(4), XmmRegister(5), XmmRegister(6), XmmRegister(7)
];

const XMM_6_15: &[XmmRegister] = &[
    XmmRegister(6), XmmRegister(7), XmmRegister(8), XmmRegister(9), XmmRegister(10),
    XmmRegister(11), XmmRegister(12), XmmRegister(13), XmmRegister(14), XmmRegister(15)
];

pub struct SysVCallingConvention();

impl SysVCallingConvention {
    const NONVOLATILE_REGS: &'static [RealRegister] = &[
        RealRegister::Rbx,
        RealRegister::Rsp,
        RealRegister::Rbp,
        RealRegister::R12,
        RealRegister::R13,
        RealRegister::R14,
        RealRegister::R15
    ];
    const INT_ARG_REGS: &'static [RealRegister] = &[
        RealRegister::Rdi,
        RealRegister::Rsi,
        RealRegister::Rdx,
        RealRegister::Rcx,
        RealRegister::R8,
        RealRegister::R9
    ];
    const INT_RETURN_REGS: &'static [RealRegister] = &[
        RealRegister::Rax,
        RealRegister::Rdx
    ];
}

impl CallingConvention for SysVCallingConvention {
    fn name(&self) -> &'static str {
        "sysv"
    }

    fn int_arg_regs(&self) -> &'static [RealRegister] {
        Self::INT_ARG_REGS
    }

    fn int_return_regs(&self) -> &'static [RealRegister] {
        Self::INT_RETURN_REGS
    }

    fn vector_arg_regs(&self) -> &'static [XmmRegister] {
        XMM_0_7
    }

    fn vector_return_regs(&self) -> &'static [XmmRegister] {
        &XMM_0_7[..2]
    }

    fn nonvolatile_regs(&self) -> &'static [RealRegister] {
        Self::NONVOLATILE_REGS
    }

    fn nonvolatile_vector_regs(&self) -> &'static [XmmRegister] {
        &[]
    }

    fn frame_pointer(&self) -> RealRegister {
        RealRegister::Rbp
    }

    fn stack_pointer(&self) -> RealRegister {
        RealRegister::Rsp
    }
}

pub struct Win64CallingConvention();

impl Win64CallingConvention {
    const NONVOLATILE_REGS: &'static [RealRegister] = &[
        RealRegister::Rbx,
        RealRegister::Rsp,
        RealRegister::Rbp,
        RealRegister::Rsi,
        RealRegister::Rdi,
        RealRegister::R12,
        RealRegister::R13,
        RealRegister::R14,
        RealRegister::R15
    ];
    const INT_ARG_REGS: &'static [RealRegister] = &[
        RealRegister::Rcx,
        RealRegister::Rdx,
        RealRegister::R8,
        RealRegister::R9
    ];
    const INT_RETURN_REGS: &'static [RealRegister] = &[
        RealRegister::Rax
    ];
}

impl CallingConvention for Win64CallingConvention {
    fn name(&self) -> &'static str {
        "win64"
    }

    fn int_arg_regs(&self) -> &'static [RealRegister] {
        Self::INT_ARG_REGS
    }

    fn int_return_regs(&self) -> &'static [RealRegister] {
        Self::INT_RETURN_REGS
    }

    fn vector_arg_regs(&self) -> &'static [XmmRegister] {
        &XMM_0_7[..4]
    }

    fn vector_return_regs(&self) -> &'static [XmmRegister] {
        &XMM_0_7[..1]
    }

    fn nonvolatile_regs(&self) -> &'static [RealRegister] {
        Self::NONVOLATILE_REGS
    }

    fn nonvolatile_vector_regs(&self) -> &'static [XmmRegister] {
        XMM_6_15
    }

    fn frame_pointer(&self) -> RealRegister {
        RealRegister::Rbp
    }

    fn stack_pointer(&self) -> RealRegister {
        RealRegister::Rsp
    }
}

pub fn by_name(name: &str) -> Option<Box<dyn CallingConvention>> {
    match name {
        "sysv" => Some(Box::new(SysVCallingConvention())),
        "win64" | "windows" => Some(Box::new(Win64CallingConvention())),
        _ => None
    }
}

/// How much of each vector register a stub has to save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VectorWidth {
    Sse,
    Avx,
    Avx512
}

impl VectorWidth {
    pub fn bytes(self) -> u32 {
        match self {
            VectorWidth::Sse => 16,
            VectorWidth::Avx => 32,
            VectorWidth::Avx512 => 64
        }
    }

    pub fn register_count(self) -> u32 {
        match self {
            VectorWidth::Avx512 => 32,
            _ => XMM_LEGACY_COUNT
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedRegister {
    Gpr(RealRegister),
    Xmm(XmmRegister)
}

impl fmt::Display for SavedRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SavedRegister::Gpr(r) => write!(f, "{}", r),
            SavedRegister::Xmm(r) => write!(f, "{}", r)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSlot {
    pub reg: SavedRegister,
    pub offset: u32,
    pub size: u32
}

/// The area an upcall stub reserves to preserve the registers the native caller expects to
/// survive the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegSaveArea {
    pub slots: SmallVec<[SaveSlot; 16]>,
    pub size: u32
}

impl fmt::Display for RegSaveArea {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "## REGISTER SAVE AREA ({} bytes) ##", self.size)?;
        for slot in self.slots.iter() {
            writeln!(f, "  [+{}] {} ({} bytes)", slot.offset, slot.reg, slot.size)?;
        };

        Result::Ok(())
    }
}

/// Lays out the callee-saved registers an upcall stub must preserve: the nonvolatile general
/// purpose registers in encoding order, then the nonvolatile vector registers at the given width.
/// The frame and stack pointers are handled by the stub's prologue and epilogue and are skipped.
pub fn reg_save_area(cc: &dyn CallingConvention, width: VectorWidth) -> RegSaveArea {
    let mut slots = SmallVec::new();
    let mut offset = 0;

    for &reg in RealRegister::ALL.iter() {
        if reg == cc.frame_pointer() || reg == cc.stack_pointer() {
            continue;
        };

        if !cc.is_volatile_reg(reg) {
            slots.push(SaveSlot { reg: SavedRegister::Gpr(reg), offset, size: 8 });
            offset += 8;
        };
    };

    for reg in XmmRegister::all().take(width.register_count() as usize) {
        if !cc.is_volatile_vector_reg(reg) {
            slots.push(SaveSlot { reg: SavedRegister::Xmm(reg), offset, size: width.bytes() });
            offset += width.bytes();
        };
    };

    RegSaveArea { slots, size: offset }
}
