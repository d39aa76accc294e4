//! Error types for demoapp core operations

/// Errors reported by the kernels and their input checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoError {
    /// Sum does not fit in the accumulator
    Overflow,
    /// Count exceeds what a 32-bit loop counter can reach
    CounterOverflow,
    /// Count string is not a valid integer
    InvalidCount,
    /// Range string is malformed or reversed
    InvalidRange,
    /// Strategy name is not recognised
    InvalidStrategy,
    /// A job run was requested with zero jobs
    InvalidJobCount,
    /// Pixel buffer does not match the image dimensions
    InvalidImage,
    /// Region of interest is reversed or leaves the image
    InvalidRoi,
    /// Seed lies outside the image
    SeedOutOfBounds,
}

/// Broad grouping of errors, for callers that map them to status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Arithmetic limits were hit
    Arithmetic,
    /// Caller-supplied input was rejected
    Input,
}

impl DemoError {
    /// Category this error belongs to
    pub const fn category(&self) -> ErrorCategory {
        match self {
            DemoError::Overflow | DemoError::CounterOverflow => ErrorCategory::Arithmetic,
            DemoError::InvalidCount
            | DemoError::InvalidRange
            | DemoError::InvalidStrategy
            | DemoError::InvalidJobCount
            | DemoError::InvalidImage
            | DemoError::InvalidRoi
            | DemoError::SeedOutOfBounds => ErrorCategory::Input,
        }
    }
}

impl core::fmt::Display for DemoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            DemoError::Overflow => "Sum overflows the accumulator",
            DemoError::CounterOverflow => "Count exceeds the 32-bit loop counter",
            DemoError::InvalidCount => "Invalid operation count",
            DemoError::InvalidRange => "Invalid range",
            DemoError::InvalidStrategy => "Unknown summation strategy",
            DemoError::InvalidJobCount => "Job count must be at least 1",
            DemoError::InvalidImage => "Pixel buffer does not match image dimensions",
            DemoError::InvalidRoi => "Invalid region of interest",
            DemoError::SeedOutOfBounds => "Seed outside the image",
        };
        write!(f, "{msg}")
    }
}

impl core::error::Error for DemoError {}

/// Result type for summation operations
pub type Result<T> = core::result::Result<T, DemoError>;
