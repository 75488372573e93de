//! S3 (Simple Stack Script): a line-oriented scripting language executed by
//! a bounded-size stack machine.
//!
//! The pipeline has two stages with no feedback between them: the frontend
//! turns source text into a flat token stream plus a label table, and the
//! engine runs a fetch-decode-execute loop over that stream. See
//! [`s3_frontend`] and [`s3_vm`].

pub mod s3_frontend;
pub mod s3_macro;
pub mod s3_vm;

pub use s3_frontend::program::Program;
pub use s3_frontend::tokenize;
pub use s3_vm::Runtime;

/// Tokenizes and executes an S3 script against standard input/output.
pub fn run(source: &str) -> miette::Result<()> {
    let program = s3_frontend::tokenize(source)?;
    let mut runtime = s3_vm::Runtime::new(program);
    runtime.run()?;
    Ok(())
}
