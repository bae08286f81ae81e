use std::io::Write;

/// Optional sink for diagnostic output. `Log(None)` discards everything.
pub struct Log<'a>(pub Option<&'a mut dyn Write>);

impl <'a> Log<'a> {
    pub fn none() -> Log<'a> {
        Log(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    pub fn try_unwrap(&mut self) -> Option<&mut (dyn Write + 'a)> {
        self.0.as_mut().map(|w| &mut **w)
    }

    pub fn log(&mut self) -> &mut Log<'a> {
        self
    }
}

// Write errors on the log sink are ignored.
#[macro_export]
macro_rules! log_write {
    ($dst:expr, $($arg:tt)*) => {
        if let Some(dst) = $dst.log().try_unwrap() {
            let _ = write!(dst, $($arg)*);
        };
    }
}

#[macro_export]
macro_rules! log_writeln {
    ($dst:expr) => {
        if let Some(dst) = $dst.log().try_unwrap() {
            let _ = writeln!(dst);
        };
    };
    ($dst:expr, $($arg:tt)*) => {
        if let Some(dst) = $dst.log().try_unwrap() {
            let _ = writeln!(dst, $($arg)*);
        };
    }
}
