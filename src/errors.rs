use thiserror::Error;

use crate::families::PolynomialFamily;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum GKError
{
    #[error("division by a ball containing zero")]
    DivisionByZero,
    #[error("square root of a ball that is not strictly positive")]
    NegativeSquareRoot,
    #[error("degenerate weight factor denominator at ({row}, {column})")]
    DegenerateDenominator { row: usize, column: usize },
    #[error("could not isolate the roots of a degree {degree} polynomial ({isolated} certified)")]
    RootIsolationFailed { degree: usize, isolated: usize },
    #[error("polynomial coefficients are not representable as finite doubles")]
    NonFiniteCoefficients,
    #[error("at least one extension level is required")]
    EmptyExtensionLevels,
    #[error("extension levels must be positive")]
    ZeroExtensionLevel,
    #[error("invalid precision: {0} bits")]
    InvalidPrecision(u32),
    #[error("level {level} exceeds the maximum level {max_level}")]
    LevelOutOfRange { level: usize, max_level: usize },
    #[error("the {0:?} family has no symmetric weight function")]
    UnsupportedFamily(PolynomialFamily),
    #[error("level {level} not accurate to {target_precision} bits at {working_precision} bits of working precision")]
    PrecisionExhausted { level: usize, target_precision: u32, working_precision: u32 },
    #[error("serialization failed")]
    SerializationFailed,
    #[error("deserialization failed")]
    DeserializationFailed,
    #[error("LZ4 decompression failed")]
    LZ4DecompressionFailed,
    #[error("could not open file")]
    FileIOError,
    #[error("could not read buffer")]
    ReadBufferFailed,
    #[error("could not write buffer")]
    WriteBufferFailed,
}

pub type Result<T> = std::result::Result<T, GKError>;
