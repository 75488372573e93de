use miette::Diagnostic;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised while the engine is running.
///
/// All of these are fatal to the run; the engine stops at the failing
/// instruction and surfaces the error to the caller. Output already written
/// stays written.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Stack Overflow")]
    #[diagnostic(code(runtime::stack_overflow))]
    StackOverflow,
    #[error("Stack Underflow")]
    #[diagnostic(code(runtime::stack_underflow))]
    StackUnderflow,
    #[error("division by zero")]
    #[diagnostic(code(runtime::division_by_zero))]
    DivisionByZero,
    #[error("integer overflow in arithmetic")]
    #[diagnostic(code(runtime::integer_overflow))]
    IntegerOverflow,
    #[error("READ expected an integer, got {0:?}")]
    #[diagnostic(
        code(runtime::invalid_input),
        help("type a whole number such as 42 or -7")
    )]
    InvalidInput(String),
    #[error("READ reached end of input")]
    #[diagnostic(code(runtime::end_of_input))]
    EndOfInput,
    #[error("jump to undefined label `{0}`")]
    #[diagnostic(code(runtime::undefined_label))]
    UndefinedLabel(String),
    #[error("jump target {0} is outside the program")]
    #[diagnostic(code(runtime::jump_out_of_bounds))]
    JumpOutOfBounds(i64),
    #[error("program counter {0} does not address an instruction")]
    #[diagnostic(
        code(runtime::misaligned_counter),
        help("a raw LOOP target probably landed on an operand slot")
    )]
    MisalignedCounter(usize),
    #[error("write to output failed: {0}")]
    #[diagnostic(code(runtime::io))]
    IoError(String),
    /// Not a failure: `HALT` raises this internally and the run loop turns
    /// it into a normal stop.
    #[error("Halt instruction encountered")]
    #[diagnostic(code(runtime::halt))]
    HaltEncountered,
}
