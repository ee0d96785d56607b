use thiserror::Error as ThisError;

/// This crate's closed error set: a backend error, specialized to what
/// the interpreter and the native stub can fail on. Converts into
/// `stride_core::Error` at the CLI boundary via `From`.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("module failed verification: {0}")]
    Verify(String),

    #[error("'main' is not defined in this module")]
    MissingMain,

    #[error("division by zero")]
    DivisionByZero,

    #[error("exceeded the recursion limit ({0} frames)")]
    RecursionLimitExceeded(u32),

    #[error("exceeded the interpreter's step fuel ({0} steps)")]
    FuelExhausted(u32),

    #[error("cannot interpret external function '{0}': it has no body")]
    UninterpretableExtern(String),

    #[error("native code emission is not implemented in this build")]
    NativeUnimplemented,
}

impl From<Error> for stride_core::Error {
    fn from(err: Error) -> Self {
        stride_core::Error::backend(err.to_string())
    }
}
