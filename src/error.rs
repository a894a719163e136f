//! Error handling for the document engine.
//!
//! Every fallible operation returns [`JsonResult`]. Codes are grouped by
//! the layer that raises them:
//!
//! - `E1xx`: parse errors, always carrying the offending byte position
//! - `E2xx`: type and shape errors from queries and mutations
//! - `E3xx`: allocation and output-buffer failures
//! - `E5xx`: internal invariant violations (never expected in practice)

use thiserror::Error;

/// All error codes raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[allow(non_camel_case_types)]
pub enum ErrorCode {
    /// A byte that cannot start a value, or a misplaced token (code 100)
    #[error("E100_UnexpectedCharacter(position {0})")]
    E100_UnexpectedCharacter(usize),

    /// Input ended where a value was expected (code 101)
    #[error("E101_UnexpectedEnd(position {0})")]
    E101_UnexpectedEnd(usize),

    /// A sign with no digits after it (code 102)
    #[error("E102_InvalidNumber(position {0})")]
    E102_InvalidNumber(usize),

    /// String literal with no closing quote (code 103)
    #[error("E103_UnterminatedString(position {0})")]
    E103_UnterminatedString(usize),

    /// Unknown escape character after a backslash (code 104)
    #[error("E104_InvalidEscape(position {0})")]
    E104_InvalidEscape(usize),

    /// Malformed `\uXXXX` sequence or invalid surrogate pair (code 105)
    #[error("E105_InvalidUnicodeEscape(position {0})")]
    E105_InvalidUnicodeEscape(usize),

    /// Array element not followed by `,` or `]` (code 106)
    #[error("E106_ExpectedArrayEnd(position {0})")]
    E106_ExpectedArrayEnd(usize),

    /// Object member not followed by `,` or `}` (code 107)
    #[error("E107_ExpectedObjectEnd(position {0})")]
    E107_ExpectedObjectEnd(usize),

    /// Object key not followed by `:` (code 108)
    #[error("E108_ExpectedColon(position {0})")]
    E108_ExpectedColon(usize),

    /// Content left over when full consumption was required (code 109)
    #[error("E109_TrailingContent(position {0})")]
    E109_TrailingContent(usize),

    /// Arrays/objects nested beyond the configured limit (code 110)
    #[error("E110_NestingTooDeep(position {0}, limit {1})")]
    E110_NestingTooDeep(usize, usize),

    /// Value read as the wrong variant (code 200)
    #[error("E200_TypeMismatch(expected {0}, found {1})")]
    E200_TypeMismatch(&'static str, &'static str),

    /// Structural edit on a node that is not an array or object (code 201)
    #[error("E201_NotAContainer({0})")]
    E201_NotAContainer(&'static str),

    /// Structural edit through a reference node (code 202)
    #[error("E202_ReferenceIsReadOnly")]
    E202_ReferenceIsReadOnly,

    /// Index or key does not name an existing child (code 203)
    #[error("E203_ItemNotFound({0})")]
    E203_ItemNotFound(String),

    /// The allocator refused a request of the given size (code 300)
    #[error("E300_AllocationFailed(size {0})")]
    E300_AllocationFailed(usize),

    /// A fixed caller buffer cannot hold the output (code 301)
    #[error("E301_BufferTooSmall(needed {0}, available {1})")]
    E301_BufferTooSmall(usize, usize),

    /// Requested buffer exceeds the signed 31-bit ceiling (code 302)
    #[error("E302_SizeLimitExceeded(size {0}, limit {1})")]
    E302_SizeLimitExceeded(usize, usize),

    /// Internal invariant violated (code 500)
    #[error("E500_InternalError({0})")]
    E500_InternalError(&'static str),
}

impl ErrorCode {
    /// Get the numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::E100_UnexpectedCharacter(_) => 100,
            ErrorCode::E101_UnexpectedEnd(_) => 101,
            ErrorCode::E102_InvalidNumber(_) => 102,
            ErrorCode::E103_UnterminatedString(_) => 103,
            ErrorCode::E104_InvalidEscape(_) => 104,
            ErrorCode::E105_InvalidUnicodeEscape(_) => 105,
            ErrorCode::E106_ExpectedArrayEnd(_) => 106,
            ErrorCode::E107_ExpectedObjectEnd(_) => 107,
            ErrorCode::E108_ExpectedColon(_) => 108,
            ErrorCode::E109_TrailingContent(_) => 109,
            ErrorCode::E110_NestingTooDeep(_, _) => 110,
            ErrorCode::E200_TypeMismatch(_, _) => 200,
            ErrorCode::E201_NotAContainer(_) => 201,
            ErrorCode::E202_ReferenceIsReadOnly => 202,
            ErrorCode::E203_ItemNotFound(_) => 203,
            ErrorCode::E300_AllocationFailed(_) => 300,
            ErrorCode::E301_BufferTooSmall(_, _) => 301,
            ErrorCode::E302_SizeLimitExceeded(_, _) => 302,
            ErrorCode::E500_InternalError(_) => 500,
        }
    }

    /// Get the error name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::E100_UnexpectedCharacter(_) => "E100_UnexpectedCharacter",
            ErrorCode::E101_UnexpectedEnd(_) => "E101_UnexpectedEnd",
            ErrorCode::E102_InvalidNumber(_) => "E102_InvalidNumber",
            ErrorCode::E103_UnterminatedString(_) => "E103_UnterminatedString",
            ErrorCode::E104_InvalidEscape(_) => "E104_InvalidEscape",
            ErrorCode::E105_InvalidUnicodeEscape(_) => "E105_InvalidUnicodeEscape",
            ErrorCode::E106_ExpectedArrayEnd(_) => "E106_ExpectedArrayEnd",
            ErrorCode::E107_ExpectedObjectEnd(_) => "E107_ExpectedObjectEnd",
            ErrorCode::E108_ExpectedColon(_) => "E108_ExpectedColon",
            ErrorCode::E109_TrailingContent(_) => "E109_TrailingContent",
            ErrorCode::E110_NestingTooDeep(_, _) => "E110_NestingTooDeep",
            ErrorCode::E200_TypeMismatch(_, _) => "E200_TypeMismatch",
            ErrorCode::E201_NotAContainer(_) => "E201_NotAContainer",
            ErrorCode::E202_ReferenceIsReadOnly => "E202_ReferenceIsReadOnly",
            ErrorCode::E203_ItemNotFound(_) => "E203_ItemNotFound",
            ErrorCode::E300_AllocationFailed(_) => "E300_AllocationFailed",
            ErrorCode::E301_BufferTooSmall(_, _) => "E301_BufferTooSmall",
            ErrorCode::E302_SizeLimitExceeded(_, _) => "E302_SizeLimitExceeded",
            ErrorCode::E500_InternalError(_) => "E500_InternalError",
        }
    }

    /// Byte offset into the parsed input, for parse errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            ErrorCode::E100_UnexpectedCharacter(p)
            | ErrorCode::E101_UnexpectedEnd(p)
            | ErrorCode::E102_InvalidNumber(p)
            | ErrorCode::E103_UnterminatedString(p)
            | ErrorCode::E104_InvalidEscape(p)
            | ErrorCode::E105_InvalidUnicodeEscape(p)
            | ErrorCode::E106_ExpectedArrayEnd(p)
            | ErrorCode::E107_ExpectedObjectEnd(p)
            | ErrorCode::E108_ExpectedColon(p)
            | ErrorCode::E109_TrailingContent(p)
            | ErrorCode::E110_NestingTooDeep(p, _) => Some(*p),
            _ => None,
        }
    }

    /// Returns true for errors raised while parsing text.
    pub fn is_parse_error(&self) -> bool {
        (100..200).contains(&self.code())
    }

    /// Returns true for allocation and output-buffer failures.
    pub fn is_allocation_error(&self) -> bool {
        (300..400).contains(&self.code())
    }
}

/// Result type for engine operations.
pub type JsonResult<T> = Result<T, ErrorCode>;
