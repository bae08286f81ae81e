use std::cmp::Ordering;
use std::fmt;
use std::mem;

use plex::lexer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Colon,
    Comma,

    Newline,
    Whitespace(&'a str),
    Comment(&'a str),

    Id(&'a str),
    Int(&'a str),

    BadChar(char),
    EndOfFile
}

impl <'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),

            Token::Newline => write!(f, "newline"),
            Token::Whitespace(_) => write!(f, "whitespace"),
            Token::Comment(_) => write!(f, "comment"),

            Token::Id(id) => write!(f, "identifier '{}'", id),
            Token::Int(val) => write!(f, "'{}'", val),

            Token::BadChar(ch) => write!(f, "'{}'", ch),
            Token::EndOfFile => write!(f, "end of file")
        }
    }
}

#[derive(Clone, Copy, Eq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
    pub off: usize
}

impl Pos {
    fn dummy() -> Pos {
        Pos { line: !0, col: !0, off: !0 }
    }

    fn start() -> Pos {
        Pos { line: 1, col: 1, off: 0 }
    }

    fn next_line(self, off: usize) -> Pos {
        Pos { line: self.line + 1, col: 1, off }
    }

    fn add_cols(self, cols: usize, off: usize) -> Pos {
        Pos { line: self.line, col: self.col + cols, off }
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.off == !0 {
            write!(f, "Pos::dummy()")
        } else {
            write!(f, "Pos(line {}, col {}, off {})", self.line, self.col, self.off)
        }
    }
}

impl PartialEq for Pos {
    fn eq(&self, other: &Pos) -> bool {
        self.off == other.off
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Pos) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pos {
    fn cmp(&self, other: &Pos) -> Ordering {
        self.off.cmp(&other.off)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub lo: Pos,
    pub hi: Pos
}

impl Span {
    pub fn dummy() -> Span {
        Span { lo: Pos::dummy(), hi: Pos::dummy() }
    }

    pub fn from(a: Pos, b: Pos) -> Span {
        Span { lo: a, hi: b }
    }
}

lexer! {
    fn take_token(tok: 'a) -> (Token<'a>, &'a str);

    r#":"# => (Token::Colon, tok),
    r#","# => (Token::Comma, tok),

    r#"\r?\n"# => (Token::Newline, tok),
    r#"[ \t]+"# => (Token::Whitespace(tok), tok),
    r#"#[^\r\n]*"# => (Token::Comment(tok), tok),

    r#"[a-zA-Z_][a-zA-Z0-9_]*"# => (Token::Id(tok), tok),
    r#"[0-9]+"# => (Token::Int(tok), tok),

    r#"."# => (Token::BadChar(tok.chars().next().unwrap_or('?')), tok)
}

/// Splits storage signature text into tokens. Whitespace and comments are skipped, but newlines
/// are kept since they end a signature.
pub struct Lexer<'a> {
    contents: &'a str,
    cur_pos: Pos,

    next_token: (Token<'a>, Span)
}

impl <'a> Lexer<'a> {
    pub fn new(contents: &'a str) -> Lexer<'a> {
        let mut lexer = Lexer {
            contents,
            cur_pos: Pos::start(),

            next_token: (Token::EndOfFile, Span::dummy())
        };
        lexer.pop();

        lexer
    }

    fn next_token_noskip(&mut self) -> (Token<'a>, Span) {
        if let Some(((tok, tok_text), rem)) = take_token(&self.contents[self.cur_pos.off..]) {
            let lo = self.cur_pos;
            let hi_off = (rem.as_ptr() as usize) - (self.contents.as_ptr() as usize);

            let hi = match tok {
                Token::Newline => self.cur_pos.next_line(hi_off),
                _ => self.cur_pos.add_cols(tok_text.chars().count(), hi_off)
            };
            self.cur_pos = hi;

            (tok, Span::from(lo, hi))
        } else {
            (Token::EndOfFile, Span::from(self.cur_pos, self.cur_pos))
        }
    }

    pub fn pop(&mut self) -> (Token<'a>, Span) {
        let next_token = loop {
            let (tok, tok_span) = self.next_token_noskip();

            match tok {
                Token::Whitespace(_) | Token::Comment(_) => continue,
                _ => break (tok, tok_span)
            };
        };

        mem::replace(&mut self.next_token, next_token)
    }

    pub fn peek(&self) -> &(Token<'a>, Span) {
        &self.next_token
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn tokens(s: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(s);
        let mut toks = vec![];

        loop {
            let (tok, _) = lexer.pop();

            if tok == Token::EndOfFile {
                break;
            };
            toks.push(tok);
        };

        toks
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            tokens("integer:7, 1:0 # rdi and xmm0\nstack:2"),
            vec![
                Token::Id("integer"), Token::Colon, Token::Int("7"), Token::Comma,
                Token::Int("1"), Token::Colon, Token::Int("0"), Token::Newline,
                Token::Id("stack"), Token::Colon, Token::Int("2")
            ]
        );
    }

    #[test]
    fn test_bad_char() {
        assert_eq!(tokens("int:-1"), vec![Token::Id("int"), Token::Colon, Token::BadChar('-'), Token::Int("1")]);
    }

    #[test]
    fn test_spans() {
        let mut lexer = Lexer::new("a:1\n  b");
        let spans = (0..5).map(|_| lexer.pop().1).collect_vec();

        assert_eq!((spans[0].lo.line, spans[0].lo.col), (1, 1));
        assert_eq!((spans[2].lo.line, spans[2].lo.col), (1, 3));
        assert_eq!((spans[4].lo.line, spans[4].lo.col), (2, 3));
        assert_eq!(lexer.peek().0, Token::EndOfFile);
    }
}
