extern crate itertools;
#[macro_use] extern crate lazy_static;
extern crate plex;
extern crate smallvec;

#[macro_use] pub mod log;

pub mod bitvec;
pub mod boundary;
pub mod error;
pub mod lex;
pub mod mapper;
pub mod parse;
pub mod platform;
pub mod policy;
pub mod storage;
