extern crate libregsave as lib;

use std::env;
use std::io::{self, Read};
use std::process;

use lib::boundary::{register_natives, NativeClass};
use lib::lex::Lexer;
use lib::log::Log;
use lib::parse::parse_signatures;
use lib::platform::{self, RegisterTable};
use lib::platform::amd64::calling_convention::{self, reg_save_area, VectorWidth};

struct Options {
    platform: String,
    verbose: bool,
    save_area: Option<String>
}

fn usage() -> ! {
    eprintln!("usage: regsave [-v] [--save-area sysv|win64] [platform]");
    process::exit(1);
}

fn parse_args() -> Options {
    let mut opts = Options { platform: "x86_64".to_owned(), verbose: false, save_area: None };
    let mut platform = None;
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match &arg[..] {
            "-v" | "--verbose" => opts.verbose = true,
            "--save-area" => match args.next() {
                Some(cc) => opts.save_area = Some(cc),
                None => usage()
            },
            "-h" | "--help" => usage(),
            _ if arg.starts_with('-') => usage(),
            _ => {
                if platform.is_some() {
                    usage();
                };
                platform = Some(arg);
            }
        };
    };

    if let Some(platform) = platform {
        opts.platform = platform;
    };

    opts
}

fn fail(msg: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {}", msg);
    process::exit(1);
}

fn print_save_area(table: &RegisterTable, cc_name: &str) {
    if table.name() != platform::amd64::NAME {
        fail(&format!("no callee-saved area layout for {}", table.name()));
    };

    let cc = match calling_convention::by_name(cc_name) {
        Some(cc) => cc,
        None => fail(&format!("unknown calling convention {}", cc_name))
    };

    for &width in [VectorWidth::Sse, VectorWidth::Avx, VectorWidth::Avx512].iter() {
        println!("# {} with {}-byte vectors", cc.name(), width.bytes());
        print!("{}", reg_save_area(&*cc, width));
    };
    println!();
}

fn main() {
    let opts = parse_args();

    let table = match platform::by_name(&opts.platform) {
        Some(table) => table,
        None => fail(&format!("unknown platform {}", opts.platform))
    };

    let mut stdout = io::stdout();
    let mut log = if opts.verbose { Log(Some(&mut stdout)) } else { Log::none() };

    let mut natives = NativeClass::native_entry_point();

    if let Err(e) = register_natives(&mut natives, table, &mut log) {
        fail(&e);
    };

    if opts.verbose {
        println!("{}", table.pretty());
    };

    if let Some(ref cc_name) = opts.save_area {
        print_save_area(table, cc_name);
    };

    let stdin = io::stdin();
    let mut contents = String::new();

    if let Err(e) = stdin.lock().read_to_string(&mut contents) {
        fail(&e);
    };

    let sigs = match parse_signatures(&mut Lexer::new(&contents), table) {
        Ok(sigs) => sigs,
        Err((msg, span)) => fail(&format!("line {}, col {}: {}", span.lo.line, span.lo.col, msg))
    };

    for sig in sigs {
        let raw = sig.storages.iter().map(|s| (s.kind as i32, s.index as i32)).collect::<Vec<_>>();

        match natives.compute_reg_save_policy(table, &raw, &mut log) {
            Ok(policy) => println!("{}", policy),
            Err(e) => fail(&format!("line {}: {}", sig.line, e))
        };
    };
}
