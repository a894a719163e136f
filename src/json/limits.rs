//! Resource limits for parsing, printing and duplication.
//!
//! The engine recurses once per nesting level when parsing, printing,
//! duplicating and releasing, so an explicit depth bound keeps hostile input
//! from exhausting the stack. The default fits a 2 MiB thread stack in an
//! unoptimized build. The print ceiling mirrors
//! the signed 31-bit length bound of the growth buffer.

/// Largest output a print buffer may grow to (2^31 - 1 bytes).
pub const MAX_PRINT_SIZE: usize = i32::MAX as usize;

/// Default nesting bound for arrays and objects.
pub const DEFAULT_NESTING_DEPTH: usize = 256;

/// Nesting bound of [`Limits::lenient`].
pub const LENIENT_NESTING_DEPTH: usize = 1024;

/// Limits applied by an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth for arrays/objects (E110)
    pub max_nesting_depth: usize,
    /// Maximum size a growable print buffer may reach (E302)
    pub max_print_size: usize,
}

impl Limits {
    /// Default limits.
    pub const fn strict() -> Self {
        Self {
            max_nesting_depth: DEFAULT_NESTING_DEPTH,
            max_print_size: MAX_PRINT_SIZE,
        }
    }

    /// Deeper nesting for trusted input. Callers must make sure the thread
    /// stack can hold the recursion (8 MiB covers it).
    pub const fn lenient() -> Self {
        Self {
            max_nesting_depth: LENIENT_NESTING_DEPTH,
            max_print_size: MAX_PRINT_SIZE,
        }
    }

    /// Override the nesting depth.
    pub const fn with_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Override the print ceiling. Values above [`MAX_PRINT_SIZE`] are clamped.
    pub const fn with_max_print_size(mut self, size: usize) -> Self {
        self.max_print_size = if size > MAX_PRINT_SIZE {
            MAX_PRINT_SIZE
        } else {
            size
        };
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::strict()
    }
}
