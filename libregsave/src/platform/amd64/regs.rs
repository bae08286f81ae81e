use std::fmt;

/// General purpose registers, in hardware encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RealRegister {
    Rax,
    Rcx,
    Rdx,
    Rbx,
    Rsp,
    Rbp,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15
}

impl RealRegister {
    pub const ALL: &'static [RealRegister] = &[
        RealRegister::Rax,
        RealRegister::Rcx,
        RealRegister::Rdx,
        RealRegister::Rbx,
        RealRegister::Rsp,
        RealRegister::Rbp,
        RealRegister::Rsi,
        RealRegister::Rdi,
        RealRegister::R8,
        RealRegister::R9,
        RealRegister::R10,
        RealRegister::R11,
        RealRegister::R12,
        RealRegister::R13,
        RealRegister::R14,
        RealRegister::R15
    ];

    pub fn encoding(self) -> u32 {
        self as u32
    }

    pub fn from_encoding(enc: u32) -> Option<RealRegister> {
        RealRegister::ALL.get(enc as usize).cloned()
    }

    pub fn name_qword(&self) -> &'static str {
        match *self {
            RealRegister::Rax => "rax",
            RealRegister::Rcx => "rcx",
            RealRegister::Rdx => "rdx",
            RealRegister::Rbx => "rbx",
            RealRegister::Rsp => "rsp",
            RealRegister::Rbp => "rbp",
            RealRegister::Rsi => "rsi",
            RealRegister::Rdi => "rdi",
            RealRegister::R8 => "r8",
            RealRegister::R9 => "r9",
            RealRegister::R10 => "r10",
            RealRegister::R11 => "r11",
            RealRegister::R12 => "r12",
            RealRegister::R13 => "r13",
            RealRegister::R14 => "r14",
            RealRegister::R15 => "r15"
        }
    }

    /// The name the code generator's register table uses for the low slot of this register.
    pub fn table_name(&self) -> &'static str {
        match *self {
            RealRegister::Rax => "RAX",
            RealRegister::Rcx => "RCX",
            RealRegister::Rdx => "RDX",
            RealRegister::Rbx => "RBX",
            RealRegister::Rsp => "RSP",
            RealRegister::Rbp => "RBP",
            RealRegister::Rsi => "RSI",
            RealRegister::Rdi => "RDI",
            RealRegister::R8 => "R8",
            RealRegister::R9 => "R9",
            RealRegister::R10 => "R10",
            RealRegister::R11 => "R11",
            RealRegister::R12 => "R12",
            RealRegister::R13 => "R13",
            RealRegister::R14 => "R14",
            RealRegister::R15 => "R15"
        }
    }
}

impl fmt::Display for RealRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name_qword())
    }
}

pub const XMM_REGISTER_COUNT: u32 = 32;

/// The XMM registers beyond this one are only addressable with AVX-512.
pub const XMM_LEGACY_COUNT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct XmmRegister(pub u8);

impl XmmRegister {
    pub fn encoding(self) -> u32 {
        self.0 as u32
    }

    pub fn all() -> impl Iterator<Item=XmmRegister> {
        (0..XMM_REGISTER_COUNT).map(|i| XmmRegister(i as u8))
    }
}

impl fmt::Display for XmmRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "xmm{}", self.0)
    }
}
