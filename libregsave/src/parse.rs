use crate::lex::{Lexer, Span, Token};
use crate::platform::RegisterTable;
use crate::storage::StorageDescriptor;

pub type Error = (String, Span);

macro_rules! bad_token {
    ($actual:expr, $expect:expr) => {{
        let &(ref tok, span) = $actual;
        return Result::Err((format!("expected {} but found {}", $expect, tok), span));
    }}
}

/// The storages of one call, as written on one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub line: usize,
    pub storages: Vec<StorageDescriptor>
}

// Limited to the non-negative range of i32, the integer type of the boundary.
fn parse_u32(val: &str, span: Span) -> Result<u32, Error> {
    val.parse::<i32>()
        .map(|v| v as u32)
        .map_err(|_| (format!("'{}' is out of range", val), span))
}

fn parse_kind(lexer: &mut Lexer, table: &RegisterTable) -> Result<u32, Error> {
    match lexer.peek().clone() {
        (Token::Id(name), span) => {
            lexer.pop();

            match table.class_by_name(name) {
                Some(class) => Result::Ok(class.kind),
                None => Result::Err((format!("no storage class {} in register table {}", name, table.name()), span))
            }
        },
        (Token::Int(val), span) => {
            lexer.pop();
            parse_u32(val, span)
        },
        _ => bad_token!(lexer.peek(), "a storage class")
    }
}

pub fn parse_storage(lexer: &mut Lexer, table: &RegisterTable) -> Result<StorageDescriptor, Error> {
    let kind = parse_kind(lexer, table)?;

    if !matches!(lexer.peek().0, Token::Colon) {
        bad_token!(lexer.peek(), "':'");
    };
    lexer.pop();

    let index = match lexer.peek().clone() {
        (Token::Int(val), span) => {
            lexer.pop();
            parse_u32(val, span)?
        },
        _ => bad_token!(lexer.peek(), "a storage index")
    };

    Result::Ok(StorageDescriptor::new(kind, index))
}

fn at_line_end(lexer: &Lexer) -> bool {
    matches!(lexer.peek().0, Token::Newline | Token::EndOfFile)
}

/// Parses one line. `void` on its own denotes a call with no register storages at all.
pub fn parse_signature(lexer: &mut Lexer, table: &RegisterTable) -> Result<Signature, Error> {
    let line = lexer.peek().1.lo.line;
    let mut storages = vec![];

    if let Token::Id("void") = lexer.peek().0 {
        lexer.pop();
    } else {
        storages.push(parse_storage(lexer, table)?);

        while !at_line_end(lexer) {
            if let Token::Comma = lexer.peek().0 {
                lexer.pop();
            };

            storages.push(parse_storage(lexer, table)?);
        };
    };

    if !at_line_end(lexer) {
        bad_token!(lexer.peek(), "end of line");
    };

    Result::Ok(Signature { line, storages })
}

pub fn parse_signatures(lexer: &mut Lexer, table: &RegisterTable) -> Result<Vec<Signature>, Error> {
    let mut sigs = vec![];

    loop {
        match lexer.peek().0 {
            Token::EndOfFile => break,
            Token::Newline => {
                lexer.pop();
            },
            _ => {
                sigs.push(parse_signature(lexer, table)?);
            }
        };
    };

    Result::Ok(sigs)
}
