//! Recursive descent parser.
//!
//! Works directly on bytes; there is no separate tokenizer. Every error
//! carries the byte offset where parsing stopped. Arrays and objects are
//! built atomically: if any element fails, every child parsed so far is
//! handed back to the allocator before the error propagates.

use std::borrow::Cow;

use super::limits::Limits;
use super::types::{saturate, Node, Value};
use crate::alloc::Allocator;
use crate::error::{ErrorCode, JsonResult};
use crate::json::codec::parse_string;

/// Parser state over one input buffer.
pub(crate) struct Parser<'i, A: Allocator + ?Sized> {
    input: &'i [u8],
    alloc: &'i A,
    limits: Limits,
    depth: usize,
}

impl<'i, A: Allocator + ?Sized> Parser<'i, A> {
    /// Create a parser for `input`.
    pub(crate) fn new(input: &'i [u8], alloc: &'i A, limits: Limits) -> Self {
        Self {
            input,
            alloc,
            limits,
            depth: 0,
        }
    }

    /// Parse one value, returning it with the offset where parsing stopped.
    ///
    /// With `require_end`, trailing whitespace is skipped and anything left
    /// after it is `E109_TrailingContent`.
    pub(crate) fn parse_document<'a>(&mut self, require_end: bool) -> JsonResult<(Node<'a>, usize)> {
        let start = self.skip_whitespace(0);
        let (node, end) = self.parse_value(start)?;
        if !require_end {
            return Ok((node, end));
        }
        let end = self.skip_whitespace(end);
        if end < self.input.len() {
            node.release_into(self.alloc);
            return Err(ErrorCode::E109_TrailingContent(end));
        }
        Ok((node, end))
    }

    /// Any byte in `0x01..=0x20` is whitespace.
    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while matches!(self.input.get(pos), Some(&b) if (0x01..=0x20).contains(&b)) {
            pos += 1;
        }
        pos
    }

    fn starts_with(&self, pos: usize, literal: &[u8]) -> bool {
        self.input
            .get(pos..)
            .is_some_and(|rest| rest.starts_with(literal))
    }

    /// Parse the value starting at `pos` (no leading whitespace).
    fn parse_value<'a>(&mut self, pos: usize) -> JsonResult<(Node<'a>, usize)> {
        // Literals are matched as prefixes: `nullx` is `null` followed by `x`.
        if self.starts_with(pos, b"null") {
            return Ok((Node::null(), pos + 4));
        }
        if self.starts_with(pos, b"false") {
            return Ok((Node::bool(false), pos + 5));
        }
        if self.starts_with(pos, b"true") {
            return Ok((Node::bool(true), pos + 4));
        }
        match self.input.get(pos) {
            None => Err(ErrorCode::E101_UnexpectedEnd(pos)),
            Some(b'"') => {
                let (text, end) = parse_string(self.input, pos, self.alloc)?;
                Ok((Node::new(Value::String(Cow::Owned(text))), end))
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number(pos),
            Some(b'[') => self.parse_array(pos),
            Some(b'{') => self.parse_object(pos),
            Some(_) => Err(ErrorCode::E100_UnexpectedCharacter(pos)),
        }
    }

    /// Optional sign, then a maximal run of digits. Anything after the digits
    /// (a fraction or exponent included) is left for the caller.
    fn parse_number<'a>(&self, pos: usize) -> JsonResult<(Node<'a>, usize)> {
        let negative = self.input.get(pos) == Some(&b'-');
        let digits_start = if negative { pos + 1 } else { pos };

        let mut end = digits_start;
        let mut magnitude: i64 = 0;
        while let Some(&b) = self.input.get(end) {
            if !b.is_ascii_digit() {
                break;
            }
            magnitude = magnitude
                .saturating_mul(10)
                .saturating_add(i64::from(b - b'0'));
            end += 1;
        }
        if end == digits_start {
            return Err(ErrorCode::E102_InvalidNumber(pos));
        }

        let value = if negative { -magnitude } else { magnitude };
        Ok((Node::number(saturate(value)), end))
    }

    fn enter(&mut self, pos: usize) -> JsonResult<()> {
        if self.depth >= self.limits.max_nesting_depth {
            return Err(ErrorCode::E110_NestingTooDeep(
                pos,
                self.limits.max_nesting_depth,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn abandon<'a>(&mut self, items: Vec<Node<'a>>, error: ErrorCode) -> ErrorCode {
        for item in items {
            item.release_into(self.alloc);
        }
        self.depth -= 1;
        error
    }

    /// Parse an array whose `[` is at `pos`.
    fn parse_array<'a>(&mut self, pos: usize) -> JsonResult<(Node<'a>, usize)> {
        self.enter(pos)?;
        let mut items = Vec::new();

        let mut cursor = self.skip_whitespace(pos + 1);
        if self.input.get(cursor) == Some(&b']') {
            self.depth -= 1;
            return Ok((Node::new(Value::Array(items)), cursor + 1));
        }

        loop {
            let (item, end) = match self.parse_value(cursor) {
                Ok(parsed) => parsed,
                Err(e) => return Err(self.abandon(items, e)),
            };
            items.push(item);

            cursor = self.skip_whitespace(end);
            match self.input.get(cursor) {
                Some(b',') => cursor = self.skip_whitespace(cursor + 1),
                Some(b']') => break,
                _ => {
                    let error = ErrorCode::E106_ExpectedArrayEnd(cursor);
                    return Err(self.abandon(items, error));
                }
            }
        }

        self.depth -= 1;
        Ok((Node::new(Value::Array(items)), cursor + 1))
    }

    /// Parse an object whose `{` is at `pos`.
    fn parse_object<'a>(&mut self, pos: usize) -> JsonResult<(Node<'a>, usize)> {
        self.enter(pos)?;
        let mut members = Vec::new();

        let mut cursor = self.skip_whitespace(pos + 1);
        if self.input.get(cursor) == Some(&b'}') {
            self.depth -= 1;
            return Ok((Node::new(Value::Object(members)), cursor + 1));
        }

        loop {
            let (member, end) = match self.parse_member(cursor) {
                Ok(parsed) => parsed,
                Err(e) => return Err(self.abandon(members, e)),
            };
            members.push(member);

            cursor = self.skip_whitespace(end);
            match self.input.get(cursor) {
                Some(b',') => cursor = self.skip_whitespace(cursor + 1),
                Some(b'}') => break,
                _ => {
                    let error = ErrorCode::E107_ExpectedObjectEnd(cursor);
                    return Err(self.abandon(members, error));
                }
            }
        }

        self.depth -= 1;
        Ok((Node::new(Value::Object(members)), cursor + 1))
    }

    /// Parse `"key" : value` starting at the key's opening quote.
    fn parse_member<'a>(&mut self, pos: usize) -> JsonResult<(Node<'a>, usize)> {
        let (key, after_key) = parse_string(self.input, pos, self.alloc)?;

        let colon = self.skip_whitespace(after_key);
        if self.input.get(colon) != Some(&b':') {
            self.alloc.release(key.into_bytes());
            return Err(ErrorCode::E108_ExpectedColon(colon));
        }

        let value_start = self.skip_whitespace(colon + 1);
        match self.parse_value(value_start) {
            Ok((mut member, end)) => {
                member.name = Some(Cow::Owned(key));
                Ok((member, end))
            }
            Err(e) => {
                self.alloc.release(key.into_bytes());
                Err(e)
            }
        }
    }
}
