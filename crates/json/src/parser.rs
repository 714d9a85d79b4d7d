//! Recursive-descent JSON parser (`spec.md` §4.4, C4).
//!
//! Grammar is RFC 8259 with three narrowings: whitespace is only space, tab,
//! LF, CR; leading-zero integers are rejected; numbers land in [`Number`]'s
//! three variants rather than a single float type.

use thiserror::Error;

use crate::allocator::AllocatorHandle;
use crate::array::Array;
use crate::number::Number;
use crate::object::Object;
use crate::string::ArenaString;
use crate::value::Value;

/// Byte offset of every error is measured from the start of the input the
/// parser was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErrorCode {
    EmptyDocument,
    EndOfFile,
    ExtraCharacter,
    StackLimitReached,
    MissValue,
    MissQuote,
    MissColon,
    MissCurlyClose,
    MissSquareClose,
    NotMatchNull,
    NotMatchTrue,
    NotMatchFalse,
    InvalidWhitespace,
    InvalidEscape,
    InvalidUnicode,
    InvalidNumberInteger,
    InvalidNumberFraction,
    InvalidNumberExponent,
    AllocatorExhausted,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{code:?} at byte offset {offset}")]
pub struct ParserError {
    pub code: ParserErrorCode,
    pub offset: usize,
}

/// Tunables for a single [`parse`] call.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum container nesting depth; `0` disables the check.
    pub limit: usize,
    /// When set, bytes after a complete top-level value do not raise
    /// [`ParserErrorCode::ExtraCharacter`].
    pub streaming_mode: bool,
    pub allocator: AllocatorHandle,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            limit: 0,
            streaming_mode: false,
            allocator: crate::allocator::default_allocator(),
        }
    }
}

/// Parses one JSON value out of `text`. On success, returns the value and
/// the offset of the first byte after it (equal to `text.len()` unless
/// `options.streaming_mode` tolerated trailing bytes).
pub fn parse(text: &str, options: ParseOptions) -> Result<Value, ParserError> {
    let (value, _end) = parse_streaming(text, options)?;
    Ok(value)
}

/// Like [`parse`], but also returns the cursor position right after the
/// parsed value, for callers that want to keep parsing the remainder of a
/// buffer (only meaningful combined with `streaming_mode`).
pub fn parse_streaming(text: &str, options: ParseOptions) -> Result<(Value, usize), ParserError> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Err(ParserError {
            code: ParserErrorCode::EmptyDocument,
            offset: 0,
        });
    }

    let mut p = Parser {
        bytes,
        pos: 0,
        depth: 0,
        limit: options.limit,
        allocator: options.allocator,
    };

    p.skip_whitespace()?;
    let value = p.parse_value()?;
    p.skip_whitespace()?;

    if !options.streaming_mode && p.pos != bytes.len() {
        return Err(ParserError {
            code: ParserErrorCode::ExtraCharacter,
            offset: p.pos,
        });
    }

    Ok((value, p.pos))
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    limit: usize,
    allocator: AllocatorHandle,
}

type PResult<T> = Result<T, ParserError>;

impl<'a> Parser<'a> {
    fn err(&self, code: ParserErrorCode) -> ParserError {
        ParserError { code, offset: self.pos }
    }

    fn err_at(&self, code: ParserErrorCode, offset: usize) -> ParserError {
        ParserError { code, offset }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) -> PResult<()> {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
        Ok(())
    }

    fn expect_literal(&mut self, literal: &[u8], on_fail: ParserErrorCode) -> PResult<()> {
        if self.bytes[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(self.err(on_fail))
        }
    }

    fn parse_value(&mut self) -> PResult<Value> {
        let Some(b) = self.peek() else {
            return Err(self.err(ParserErrorCode::EndOfFile));
        };

        match b {
            b'{' => self.parse_object(),
            b'[' => self.parse_array(),
            b'"' => self.parse_string().map(|s| Value::String(s)),
            b't' => {
                self.expect_literal(b"true", ParserErrorCode::NotMatchTrue)?;
                Ok(Value::from_bool(true, self.allocator.clone()))
            }
            b'f' => {
                self.expect_literal(b"false", ParserErrorCode::NotMatchFalse)?;
                Ok(Value::from_bool(false, self.allocator.clone()))
            }
            b'n' => {
                self.expect_literal(b"null", ParserErrorCode::NotMatchNull)?;
                Ok(Value::null(self.allocator.clone()))
            }
            b'-' | b'0'..=b'9' => self.parse_number(),
            _ => Err(self.err(ParserErrorCode::MissValue)),
        }
    }

    fn enter_container(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.limit != 0 && self.depth > self.limit {
            return Err(self.err(ParserErrorCode::StackLimitReached));
        }
        Ok(())
    }

    fn parse_object(&mut self) -> PResult<Value> {
        self.enter_container()?;
        self.pos += 1; // consume '{'
        self.skip_whitespace()?;

        let mut buffered: Vec<(ArenaString, Value)> = Vec::new();

        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return self.build_object(buffered);
        }

        loop {
            self.skip_whitespace()?;
            if self.peek() != Some(b'"') {
                return Err(self.err(ParserErrorCode::MissQuote));
            }
            let key = self.parse_string()?;
            self.skip_whitespace()?;
            if self.advance() != Some(b':') {
                return Err(self.err(ParserErrorCode::MissColon));
            }
            self.skip_whitespace()?;
            let value = self.parse_value()?;
            buffered.push((key, value));
            self.skip_whitespace()?;

            match self.advance() {
                Some(b',') => continue,
                Some(b'}') => break,
                _ => return Err(self.err(ParserErrorCode::MissCurlyClose)),
            }
        }

        self.depth -= 1;
        self.build_object(buffered)
    }

    fn build_object(&self, buffered: Vec<(ArenaString, Value)>) -> PResult<Value> {
        let mut object = Object::new(self.allocator.clone());
        for (key, value) in buffered {
            object
                .insert(key, value)
                .map_err(|_| self.err(ParserErrorCode::AllocatorExhausted))?;
        }
        Ok(Value::Object(object))
    }

    fn parse_array(&mut self) -> PResult<Value> {
        self.enter_container()?;
        self.pos += 1; // consume '['
        self.skip_whitespace()?;

        let mut buffered: Vec<Value> = Vec::new();

        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return self.build_array(buffered);
        }

        loop {
            self.skip_whitespace()?;
            let value = self.parse_value()?;
            buffered.push(value);
            self.skip_whitespace()?;

            match self.advance() {
                Some(b',') => continue,
                Some(b']') => break,
                _ => return Err(self.err(ParserErrorCode::MissSquareClose)),
            }
        }

        self.depth -= 1;
        self.build_array(buffered)
    }

    fn build_array(&self, buffered: Vec<Value>) -> PResult<Value> {
        let mut array = Array::new(self.allocator.clone());
        for value in buffered {
            array
                .push(value)
                .map_err(|_| self.err(ParserErrorCode::AllocatorExhausted))?;
        }
        Ok(Value::Array(array))
    }

    /// Two-pass scan: first counts the decoded length (so the arena
    /// allocation is exact), then decodes into it.
    fn parse_string(&mut self) -> PResult<ArenaString> {
        self.pos += 1; // consume opening quote
        let start = self.pos;

        let decoded_len = self.scan_string_length(start)?;
        let raw = self.decode_string(start, decoded_len)?;
        let text = std::str::from_utf8(&raw).map_err(|_| self.err(ParserErrorCode::InvalidUnicode))?;
        ArenaString::try_from_bytes(text, self.allocator.clone())
            .map_err(|_| self.err(ParserErrorCode::AllocatorExhausted))
    }

    fn scan_string_length(&self, start: usize) -> PResult<usize> {
        let mut pos = start;
        let mut len = 0usize;
        loop {
            let Some(b) = self.bytes.get(pos).copied() else {
                return Err(self.err_at(ParserErrorCode::MissQuote, pos));
            };
            match b {
                b'"' => return Ok(len),
                b'\\' => {
                    let Some(esc) = self.bytes.get(pos + 1).copied() else {
                        return Err(self.err_at(ParserErrorCode::MissQuote, pos));
                    };
                    match esc {
                        b'"' | b'\\' | b'/' | b'n' | b'r' | b't' | b'b' | b'f' => {
                            len += 1;
                            pos += 2;
                        }
                        b'u' => {
                            let hi = self.read_hex4(pos + 2)?;
                            let mut advance = 6;
                            let codepoint = if (0xD800..=0xDBFF).contains(&hi)
                                && self.bytes.get(pos + 6) == Some(&b'\\')
                                && self.bytes.get(pos + 7) == Some(&b'u')
                            {
                                let lo = self.read_hex4(pos + 8)?;
                                if (0xDC00..=0xDFFF).contains(&lo) {
                                    advance = 12;
                                    0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00)
                                } else {
                                    hi
                                }
                            } else {
                                hi
                            };
                            len += utf8_len(codepoint);
                            pos += advance;
                        }
                        _ => return Err(self.err_at(ParserErrorCode::InvalidEscape, pos)),
                    }
                }
                0x00..=0x1F => return Err(self.err_at(ParserErrorCode::InvalidWhitespace, pos)),
                _ => {
                    len += 1;
                    pos += 1;
                }
            }
        }
    }

    fn decode_string(&mut self, start: usize, decoded_len: usize) -> PResult<Vec<u8>> {
        let mut out = Vec::with_capacity(decoded_len);
        self.pos = start;
        loop {
            let b = self.bytes[self.pos];
            match b {
                b'"' => {
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => {
                    let esc = self.bytes[self.pos + 1];
                    match esc {
                        b'"' => {
                            out.push(b'"');
                            self.pos += 2;
                        }
                        b'\\' => {
                            out.push(b'\\');
                            self.pos += 2;
                        }
                        b'/' => {
                            out.push(b'/');
                            self.pos += 2;
                        }
                        b'n' => {
                            out.push(b'\n');
                            self.pos += 2;
                        }
                        b'r' => {
                            out.push(b'\r');
                            self.pos += 2;
                        }
                        b't' => {
                            out.push(b'\t');
                            self.pos += 2;
                        }
                        b'b' => {
                            out.push(0x08);
                            self.pos += 2;
                        }
                        b'f' => {
                            out.push(0x0C);
                            self.pos += 2;
                        }
                        b'u' => {
                            let hi = self.read_hex4(self.pos + 2)?;
                            let (codepoint, advance) = if (0xD800..=0xDBFF).contains(&hi)
                                && self.bytes.get(self.pos + 6) == Some(&b'\\')
                                && self.bytes.get(self.pos + 7) == Some(&b'u')
                            {
                                let lo = self.read_hex4(self.pos + 8)?;
                                if (0xDC00..=0xDFFF).contains(&lo) {
                                    (0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00), 12)
                                } else {
                                    (hi, 6)
                                }
                            } else {
                                (hi, 6)
                            };
                            let ch = char::from_u32(codepoint)
                                .ok_or_else(|| self.err(ParserErrorCode::InvalidUnicode))?;
                            let mut buf = [0u8; 4];
                            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                            self.pos += advance;
                        }
                        _ => return Err(self.err(ParserErrorCode::InvalidEscape)),
                    }
                }
                0x00..=0x1F => return Err(self.err(ParserErrorCode::InvalidWhitespace)),
                _ => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
    }

    fn read_hex4(&self, at: usize) -> PResult<u32> {
        let slice = self
            .bytes
            .get(at..at + 4)
            .ok_or_else(|| self.err_at(ParserErrorCode::InvalidUnicode, at))?;
        let s = std::str::from_utf8(slice).map_err(|_| self.err_at(ParserErrorCode::InvalidUnicode, at))?;
        u32::from_str_radix(s, 16).map_err(|_| self.err_at(ParserErrorCode::InvalidUnicode, at))
    }

    fn parse_number(&mut self) -> PResult<Value> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }

        let int_start = self.pos;
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.pos += 1;
                }
            }
            _ => return Err(self.err_at(ParserErrorCode::InvalidNumberInteger, start)),
        }
        let int_end = self.pos;
        if int_end - int_start > 1 && self.bytes[int_start] == b'0' {
            return Err(self.err_at(ParserErrorCode::InvalidNumberInteger, start));
        }

        let mut has_frac = false;
        if self.peek() == Some(b'.') {
            has_frac = true;
            self.pos += 1;
            let frac_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == frac_start {
                return Err(self.err_at(ParserErrorCode::InvalidNumberFraction, start));
            }
        }

        let mut has_exp = false;
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            has_exp = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == exp_start {
                return Err(self.err_at(ParserErrorCode::InvalidNumberExponent, start));
            }
        }

        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        let number = if !has_frac && !has_exp {
            if negative {
                match text.parse::<i64>() {
                    Ok(v) => Number::I64(v),
                    Err(_) => Number::F64(text.parse::<f64>().unwrap()),
                }
            } else {
                match text.parse::<u64>() {
                    Ok(v) => Number::U64(v),
                    Err(_) => Number::F64(text.parse::<f64>().unwrap()),
                }
            }
        } else {
            Number::F64(text.parse::<f64>().map_err(|_| self.err_at(ParserErrorCode::InvalidNumberFraction, start))?)
        };

        Ok(Value::from_number(number, self.allocator.clone()))
    }
}

fn utf8_len(codepoint: u32) -> usize {
    match codepoint {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 4,
    }
}
