// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::FormulaError;
use crate::utils::limits::Limits;
use crate::Rc;

use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

type Result<T> = core::result::Result<T, FormulaError>;

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

/// A formula's text together with its line table. Cheap to clone.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::as_ptr(&self.src) == Rc::as_ptr(&other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.src.file.fmt(f)
    }
}

impl Source {
    /// Wraps `contents` after checking it against `limits.max_formula_length`.
    ///
    /// The length check is the first thing done with a formula; no line table
    /// is built and no token is produced for oversized input.
    pub fn from_contents(file: String, contents: String, limits: &Limits) -> Result<Source> {
        // Byte length bounds the character count from above.
        if contents.len() > limits.max_formula_length {
            limits.check_formula_length(contents.chars().count())?;
        }

        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() {
            lines.push((start, contents.len() as u32));
        } else if contents.is_empty() {
            lines.push((0, 0));
        } else {
            let s = (contents.len() - 1) as u32;
            lines.push((s, s));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = (col as usize).saturating_sub(1);

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
             {:<line_num_width$}| {}\n\
             {:<line_num_width$}| {:<col_spaces$}^\n\
             {}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> FormulaError {
        FormulaError::Syntax {
            message: self.message(line, col, "error", msg),
        }
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> FormulaError {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = match t.char_indices().nth(max) {
            Some((cut, _)) => (&t[..cut], "..."),
            None => (t.as_str(), ""),
        };

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            self.line, self.col, self.start, self.end, txt, trailer
        ))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Symbol,
    /// Double-quoted string. The span excludes the quotes.
    String,
    /// Single-quoted string. The span excludes the quotes.
    QuotedString,
    Number,
    Ident,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn span(&self, col: u32, start: usize, end: usize) -> Span {
        Span {
            source: self.source.clone(),
            line: self.line,
            col,
            start: start as u32,
            end: end as u32,
        }
    }

    fn read_ident(&mut self) -> Result<Token> {
        let start = self.peek().0;
        let col = self.col;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        self.col += (end - start) as u32;
        Ok(Token(TokenKind::Ident, self.span(col, start, end)))
    }

    fn read_digits(&mut self) {
        while self.peek().1.is_ascii_digit() {
            self.iter.next();
        }
    }

    // Numbers follow json's grammar, minus the sign which is a unary operator here.
    fn read_number(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();
        let col = self.col;
        self.iter.next();

        // Read integer part.
        if chr != '0' {
            // Starts with 1.. or 9. Read digits.
            self.read_digits();
        }

        // Read fraction part
        // . must be followed by at least 1 digit.
        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next(); // .
            self.read_digits();
        }

        // Read exponent part
        let ch = self.peek().1;
        if ch == 'e' || ch == 'E' {
            self.iter.next();
            // e must be followed by an optional sign and digits
            if matches!(self.peek().1, '+' | '-') {
                self.iter.next();
            }
            // Absence of digits is reported by serde below.
            self.read_digits();
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;

        // A valid number cannot be followed by these characters.
        let ch = self.peek().1;
        if ch == '_' || ch == '.' || ch.is_ascii_alphanumeric() {
            return Err(self.source.error(self.line, self.col, "invalid number"));
        }

        // Ensure that the number is representable as a finite f64.
        if let Err(e) = serde_json::from_str::<f64>(&self.source.contents()[start..end]) {
            let serde_msg = e.to_string();
            let msg = match serde_msg.as_str() {
                m if m.contains("out of range") => "out of range",
                m if m.contains("invalid number") => "invalid number",
                m if m.contains("EOF") => "missing exponent digits",
                m => m,
            };
            return Err(self
                .source
                .error(self.line, col, format!("invalid number: {msg}").as_str()));
        }

        Ok(Token(TokenKind::Number, self.span(col, start, end)))
    }

    fn read_string(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.iter.next();
        self.col += 1;
        let (start, _) = self.peek();
        loop {
            let (offset, ch) = self.peek();
            let col = self.col + self.source.contents()[start..offset].chars().count() as u32;
            match ch {
                '"' => break,
                '\x00' if offset >= self.source.contents().len() => break,
                '\\' => {
                    self.iter.next();
                    let (_, ch) = self.peek();
                    self.iter.next();
                    match ch {
                        // json escape sequence
                        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => (),
                        'u' => {
                            for _i in 0..4 {
                                let (offset, ch) = self.peek();
                                let col = self.col
                                    + self.source.contents()[start..offset].chars().count() as u32;
                                if !ch.is_ascii_hexdigit() {
                                    return Err(self.source.error(
                                        line,
                                        col,
                                        "invalid hex escape sequence",
                                    ));
                                }
                                self.iter.next();
                            }
                        }
                        _ => return Err(self.source.error(line, col, "invalid escape sequence")),
                    }
                }
                _ => {
                    // check for valid json chars
                    if !('\u{0020}'..='\u{10FFFF}').contains(&ch) {
                        return Err(self.source.error(line, col, "invalid character in string"));
                    }
                    self.iter.next();
                }
            }
        }

        if self.peek().1 != '"' {
            return Err(self.source.error(line, col, "unterminated string literal"));
        }

        let end = self.peek().0;
        self.iter.next();
        self.col += self.source.contents()[start..end].chars().count() as u32 + 1;

        Ok(Token(
            TokenKind::String,
            Span {
                source: self.source.clone(),
                line,
                col: col + 1,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn read_quoted_string(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        self.iter.next();
        self.col += 1;
        let (start, _) = self.peek();
        loop {
            let (offset, ch) = self.peek();
            match ch {
                '\'' => break,
                '\x00' if offset >= self.source.contents().len() => break,
                '\\' => {
                    self.iter.next();
                    let (_, ch) = self.peek();
                    if !matches!(ch, '\'' | '\\') {
                        let col = self.col + (offset - start) as u32;
                        return Err(self.source.error(line, col, "invalid escape sequence"));
                    }
                    self.iter.next();
                }
                '\n' | '\r' => break,
                _ => {
                    self.iter.next();
                }
            }
        }

        if self.peek().1 != '\'' {
            return Err(self.source.error(line, col, "unterminated string literal"));
        }

        let end = self.peek().0;
        self.iter.next();
        self.col += self.source.contents()[start..end].chars().count() as u32 + 1;

        Ok(Token(
            TokenKind::QuotedString,
            Span {
                source: self.source.clone(),
                line,
                col: col + 1,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn skip_ws(&mut self) {
        // A tab is considered 4 space characters.
        loop {
            match self.peek().1 {
                ' ' | '\r' => self.col += 1,
                '\t' => self.col += 4,
                '\n' => {
                    self.col = 1;
                    self.line += 1;
                }
                _ => break,
            }
            self.iter.next();
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_ws();

        let (start, chr) = self.peek();
        let col = self.col;

        match chr {
            // arith operators
            '+' | '-' | '*' | '/' | '^' |
            // grouping and separators
            '(' | ')' | '[' | ']' | ',' | '.' => {
                self.col += 1;
                self.iter.next();
                Ok(Token(TokenKind::Symbol, self.span(col, start, start + 1)))
            }
            '"' => self.read_string(),
            '\'' => self.read_quoted_string(),
            '\x00' if start >= self.source.contents().len() => {
                Ok(Token(TokenKind::Eof, self.span(col, start, start)))
            }
            _ if chr.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
            _ => Err(self.source.error(
                self.line,
                self.col,
                format!("invalid character `{}`", chr.escape_debug()).as_str(),
            )),
        }
    }
}

/// Decodes the body of a string token into its value.
pub fn unescape(token: &Token) -> Result<String> {
    let span = &token.1;
    match token.0 {
        TokenKind::String => serde_json::from_str::<String>(format!("\"{}\"", span.text()).as_str())
            .map_err(|e| span.error(format!("invalid string literal. {e}").as_str())),
        TokenKind::QuotedString => {
            let mut value = String::with_capacity(span.text().len());
            let mut chars = span.text().chars();
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    _ => value.push(ch),
                }
            }
            Ok(value)
        }
        _ => Err(span.error("expecting string")),
    }
}
