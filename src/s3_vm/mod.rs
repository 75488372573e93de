//! The S3 execution engine: a fetch-decode-execute loop over the flat token
//! stream produced by the frontend.
//!
//! All execution state lives in one [`Runtime`] value: the operand stack,
//! the program counter, and the loop counters. Nothing is shared between
//! runs; a host executing several scripts builds one `Runtime` per script.
//! `READ` and `WAIT` are the only blocking points.

use crate::s3_frontend::program::{Cmp, Op, Program, Token};
use crate::s3_vm::error::{RuntimeError, RuntimeResult};
use crate::s3_vm::stack::Stack;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::time::Duration;

pub mod error;
pub mod stack;

pub struct Runtime<'io> {
    pub program: Program,
    pub stack: Stack,
    /// Program Counter
    pub pc: usize,
    /// Remaining iterations per loop site, keyed by the resolved target
    /// index. Created on the first visit of a LOOP, removed when spent.
    loop_counters: HashMap<usize, i64>,
    input: Option<Box<dyn BufRead + 'io>>,
    output: Option<Box<dyn Write + 'io>>,
}

impl<'io> Runtime<'io> {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            stack: Stack::new(),
            pc: 0,
            loop_counters: HashMap::new(),
            input: None,
            output: None,
        }
    }

    /// Replaces standard input for `READ`.
    pub fn with_input<I: BufRead + 'io>(mut self, input: I) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Replaces standard output for `PRINT` and `PRINT.TOP`.
    pub fn with_output<O: Write + 'io>(mut self, output: O) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Runs the program to completion.
    ///
    /// Stops normally on `HALT` or when the counter runs past the end of
    /// the stream (an implicit halt). Any other way out is an error.
    pub fn run(&mut self) -> RuntimeResult<()> {
        while self.pc < self.program.len() {
            let op = self.fetch_op()?;
            match self.execute(op) {
                Ok(()) => {}
                Err(RuntimeError::HaltEncountered) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn execute(&mut self, op: Op) -> RuntimeResult<()> {
        match op {
            Op::Push => {
                let n = self.fetch_int()?;
                self.stack.push(n)?;
            }
            Op::Pop => {
                self.stack.pop()?;
            }
            Op::Add => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let sum = b.checked_add(a).ok_or(RuntimeError::IntegerOverflow)?;
                self.stack.push(sum)?;
            }
            Op::Sub => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let diff = b.checked_sub(a).ok_or(RuntimeError::IntegerOverflow)?;
                self.stack.push(diff)?;
            }
            Op::Mul => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let product = b.checked_mul(a).ok_or(RuntimeError::IntegerOverflow)?;
                self.stack.push(product)?;
            }
            Op::Div => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                if a == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let quotient = b.checked_div(a).ok_or(RuntimeError::IntegerOverflow)?;
                self.stack.push(quotient)?;
            }
            Op::Dup => {
                let top = self.stack.top()?;
                self.stack.push(top)?;
            }
            Op::Swap => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a)?;
                self.stack.push(b)?;
            }
            Op::Over => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(b)?;
                self.stack.push(a)?;
                self.stack.push(b)?;
            }
            Op::Rot => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                let c = self.stack.pop()?;
                self.stack.push(b)?;
                self.stack.push(a)?;
                self.stack.push(c)?;
            }
            Op::Nip => {
                let a = self.stack.pop()?;
                self.stack.pop()?;
                self.stack.push(a)?;
            }
            Op::Tuck => {
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a)?;
                self.stack.push(b)?;
                self.stack.push(a)?;
            }
            Op::Print => {
                let text = self.fetch_str()?;
                self.write_line(&text)?;
            }
            Op::PrintTop => {
                let top = self.stack.top()?;
                self.write_line(&top.to_string())?;
            }
            Op::Read => {
                let value = self.read_integer()?;
                self.stack.push(value)?;
            }
            Op::Jump | Op::Goto => {
                let label = self.fetch_label()?;
                self.pc = self.resolve(&label)?;
            }
            Op::JumpIfZero => {
                let label = self.fetch_label()?;
                if self.stack.top()? == 0 {
                    self.pc = self.resolve(&label)?;
                }
            }
            Op::JumpIfPos => {
                let label = self.fetch_label()?;
                if self.stack.top()? > 0 {
                    self.pc = self.resolve(&label)?;
                }
            }
            Op::Loop => {
                let target = self.fetch_loop_target()?;
                let count = self.fetch_int()?;
                let remaining = self.loop_counters.entry(target).or_insert(count);
                if *remaining > 0 {
                    *remaining -= 1;
                    self.pc = target;
                } else {
                    self.loop_counters.remove(&target);
                }
            }
            Op::Wait => {
                let millis = self.fetch_int()?;
                if millis > 0 {
                    std::thread::sleep(Duration::from_millis(millis as u64));
                }
            }
            Op::If => {
                let cmp = self.fetch_cmp()?;
                let threshold = self.fetch_int()?;
                let top = self.stack.top()?;
                if !cmp.eval(top, threshold) {
                    // Skip the inlined trailing instruction; when the
                    // condition holds the counter already points at it.
                    let width = self
                        .program
                        .instruction_width(self.pc)
                        .ok_or(RuntimeError::MisalignedCounter(self.pc))?;
                    self.pc += width;
                }
            }
            Op::Halt => return Err(RuntimeError::HaltEncountered),
        }
        Ok(())
    }

    #[inline(always)]
    fn fetch_op(&mut self) -> RuntimeResult<Op> {
        match self.program.tokens.get(self.pc) {
            Some(Token::Op(op)) => {
                let op = *op;
                self.pc += 1;
                Ok(op)
            }
            _ => Err(RuntimeError::MisalignedCounter(self.pc)),
        }
    }

    #[inline(always)]
    fn fetch_int(&mut self) -> RuntimeResult<i64> {
        match self.program.tokens.get(self.pc) {
            Some(Token::Int(n)) => {
                let n = *n;
                self.pc += 1;
                Ok(n)
            }
            _ => Err(RuntimeError::MisalignedCounter(self.pc)),
        }
    }

    fn fetch_str(&mut self) -> RuntimeResult<String> {
        match self.program.tokens.get(self.pc) {
            Some(Token::Str(s)) => {
                let s = s.clone();
                self.pc += 1;
                Ok(s)
            }
            _ => Err(RuntimeError::MisalignedCounter(self.pc)),
        }
    }

    fn fetch_label(&mut self) -> RuntimeResult<String> {
        match self.program.tokens.get(self.pc) {
            Some(Token::Label(l)) => {
                let l = l.clone();
                self.pc += 1;
                Ok(l)
            }
            _ => Err(RuntimeError::MisalignedCounter(self.pc)),
        }
    }

    fn fetch_cmp(&mut self) -> RuntimeResult<Cmp> {
        match self.program.tokens.get(self.pc) {
            Some(Token::Cmp(cmp)) => {
                let cmp = *cmp;
                self.pc += 1;
                Ok(cmp)
            }
            _ => Err(RuntimeError::MisalignedCounter(self.pc)),
        }
    }

    /// A LOOP target is either a label or a raw stream index; raw indices
    /// are range-checked here, misaligned ones surface at the next fetch.
    fn fetch_loop_target(&mut self) -> RuntimeResult<usize> {
        let target = match self.program.tokens.get(self.pc) {
            Some(Token::Int(i)) => {
                if *i < 0 || *i as usize > self.program.len() {
                    return Err(RuntimeError::JumpOutOfBounds(*i));
                }
                *i as usize
            }
            Some(Token::Label(l)) => self.resolve(l)?,
            _ => return Err(RuntimeError::MisalignedCounter(self.pc)),
        };
        self.pc += 1;
        Ok(target)
    }

    fn resolve(&self, label: &str) -> RuntimeResult<usize> {
        self.program
            .labels
            .get(label)
            .copied()
            .ok_or_else(|| RuntimeError::UndefinedLabel(label.to_string()))
    }

    fn write_line(&mut self, text: &str) -> RuntimeResult<()> {
        let output = self
            .output
            .get_or_insert_with(|| Box::new(std::io::stdout()));
        writeln!(output, "{}", text).map_err(|e| RuntimeError::IoError(e.to_string()))?;
        output.flush().map_err(|e| RuntimeError::IoError(e.to_string()))
    }

    fn read_integer(&mut self) -> RuntimeResult<i64> {
        let input = self
            .input
            .get_or_insert_with(|| Box::new(std::io::stdin().lock()));
        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| RuntimeError::IoError(e.to_string()))?;
        if read == 0 {
            return Err(RuntimeError::EndOfInput);
        }
        let trimmed = line.trim();
        trimmed
            .parse::<i64>()
            .map_err(|_| RuntimeError::InvalidInput(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3_frontend::tokenize;

    fn run_script(src: &str, input: &str) -> (RuntimeResult<()>, String) {
        let program = tokenize(src).expect("script tokenizes");
        let mut out = Vec::new();
        let result = {
            let mut runtime = Runtime::new(program)
                .with_input(std::io::Cursor::new(input.to_string()))
                .with_output(&mut out);
            runtime.run()
        };
        (result, String::from_utf8(out).expect("output is utf-8"))
    }

    fn run_for_stack(src: &str) -> (RuntimeResult<()>, Vec<i64>) {
        let program = tokenize(src).expect("script tokenizes");
        let mut runtime = Runtime::new(program).with_output(std::io::sink());
        let result = runtime.run();
        (result, runtime.stack.iter().copied().collect())
    }

    #[test]
    fn add_leaves_one_sum() {
        for (m, n) in [(2i64, 3i64), (0, 0), (-8, 8), (i64::MAX, 0)] {
            let (result, stack) = run_for_stack(&format!("PUSH {m}\nPUSH {n}\nADD\nHALT\n"));
            assert!(result.is_ok());
            assert_eq!(stack, vec![m + n]);
        }
    }

    #[test]
    fn sub_and_div_take_second_popped_first() {
        let (_, out) = run_script("PUSH 5\nPUSH 3\nSUB\nPRINT.TOP\nHALT\n", "");
        assert_eq!(out, "2\n");
        let (_, out) = run_script("PUSH 7\nPUSH 2\nDIV\nPRINT.TOP\nHALT\n", "");
        assert_eq!(out, "3\n");
    }

    #[test]
    fn division_by_zero_is_fatal() {
        let (result, _) = run_for_stack("PUSH 1\nPUSH 0\nDIV\nHALT\n");
        assert_eq!(result, Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn arithmetic_overflow_is_fatal() {
        let src = format!("PUSH {}\nPUSH 2\nMUL\nHALT\n", i64::MAX);
        let (result, _) = run_for_stack(&src);
        assert_eq!(result, Err(RuntimeError::IntegerOverflow));
    }

    #[test]
    fn jump_if_zero_prints_reached_once() {
        let src = "PUSH 0\nJUMP.IF.0 target\nPRINT \"missed\"\ntarget:\nPRINT \"reached\"\nHALT\n";
        let (result, out) = run_script(src, "");
        assert!(result.is_ok());
        assert_eq!(out, "reached\n");
    }

    #[test]
    fn jump_if_pos_falls_through_on_zero() {
        let src = "PUSH 0\nJUMP.IF.POS target\nPRINT \"fell\"\nHALT\ntarget:\nPRINT \"jumped\"\nHALT\n";
        let (_, out) = run_script(src, "");
        assert_eq!(out, "fell\n");
    }

    #[test]
    fn conditional_jumps_peek_without_popping() {
        let (result, stack) = run_for_stack("PUSH 0\nJUMP.IF.0 end\nend:\nHALT\n");
        assert!(result.is_ok());
        assert_eq!(stack, vec![0]);
    }

    #[test]
    fn goto_is_unconditional() {
        let (result, out) = run_script("GOTO end\nPRINT \"no\"\nend:\nHALT\n", "");
        assert!(result.is_ok());
        assert_eq!(out, "");
    }

    #[test]
    fn loop_body_runs_exactly_count_times() {
        // Body is only entered through the LOOP jump, so count = 3 means
        // exactly 3 executions before falling through.
        let src = "PUSH 0\nGOTO check\nbody:\nPUSH 1\nADD\ncheck:\nLOOP body 3\nPRINT.TOP\nHALT\n";
        let (result, out) = run_script(src, "");
        assert!(result.is_ok());
        assert_eq!(out, "3\n");
    }

    #[test]
    fn loop_with_raw_index_target() {
        // Index 0 addresses the first PUSH; one extra push per jump.
        let (result, stack) = run_for_stack("PUSH 1\nLOOP 0 2\nHALT\n");
        assert!(result.is_ok());
        assert_eq!(stack, vec![1, 1, 1]);
    }

    #[test]
    fn loop_target_out_of_bounds_is_fatal() {
        let (result, _) = run_for_stack("LOOP 99 1\nHALT\n");
        assert_eq!(result, Err(RuntimeError::JumpOutOfBounds(99)));
    }

    #[test]
    fn loop_target_on_operand_slot_is_misaligned() {
        // Stream index 1 is PUSH's operand, not an instruction.
        let (result, _) = run_for_stack("PUSH 1\nLOOP 1 1\nHALT\n");
        assert_eq!(result, Err(RuntimeError::MisalignedCounter(1)));
    }

    #[test]
    fn stack_underflow_holds_for_every_popping_opcode() {
        for src in [
            "POP\n",
            "ADD\n",
            "PUSH 1\nSUB\n",
            "PRINT.TOP\n",
            "DUP\n",
            "PUSH 1\nSWAP\n",
            "PUSH 1\nPUSH 2\nROT\n",
            "PUSH 1\nNIP\n",
            "JUMP.IF.0 end\nend:\n",
        ] {
            let (result, _) = run_for_stack(src);
            assert_eq!(result, Err(RuntimeError::StackUnderflow), "src: {src:?}");
        }
    }

    #[test]
    fn stack_overflow_through_a_loop() {
        // 1 fall-in push + 300 jumps back exceeds the 256-slot stack.
        let (result, _) = run_for_stack("again:\nPUSH 1\nLOOP again 300\nHALT\n");
        assert_eq!(result, Err(RuntimeError::StackOverflow));
    }

    #[test]
    fn halt_only_program_terminates_silently() {
        let (result, out) = run_script("HALT\n", "");
        assert!(result.is_ok());
        assert_eq!(out, "");
    }

    #[test]
    fn running_off_the_end_is_an_implicit_halt() {
        let (result, stack) = run_for_stack("PUSH 9\n");
        assert!(result.is_ok());
        assert_eq!(stack, vec![9]);
        let (result, _) = run_for_stack("");
        assert!(result.is_ok());
    }

    #[test]
    fn read_parses_one_integer_per_line() {
        let (result, out) = run_script("READ\nREAD\nADD\nPRINT.TOP\nHALT\n", "40\n2\n");
        assert!(result.is_ok());
        assert_eq!(out, "42\n");
    }

    #[test]
    fn read_rejects_non_integer_input() {
        let (result, _) = run_script("READ\nHALT\n", "forty\n");
        assert_eq!(result, Err(RuntimeError::InvalidInput("forty".to_string())));
    }

    #[test]
    fn read_at_end_of_input_is_fatal() {
        let (result, _) = run_script("READ\nHALT\n", "");
        assert_eq!(result, Err(RuntimeError::EndOfInput));
    }

    #[test]
    fn if_executes_or_skips_the_trailing_instruction() {
        let src = "PUSH 5\nIF > 3 PRINT \"big\"\nIF < 3 PRINT \"small\"\nIF = 5 PRINT \"five\"\nPRINT \"end\"\nHALT\n";
        let (result, out) = run_script(src, "");
        assert!(result.is_ok());
        assert_eq!(out, "big\nfive\nend\n");
    }

    #[test]
    fn if_skips_a_trailing_instruction_with_operands() {
        let src = "PUSH 0\nIF = 1 GOTO end\nPRINT \"fell\"\nend:\nHALT\n";
        let (_, out) = run_script(src, "");
        assert_eq!(out, "fell\n");
    }

    #[test]
    fn stack_manipulation_semantics() {
        let cases: [(&str, &[i64]); 6] = [
            ("PUSH 4\nDUP\nHALT\n", &[4, 4]),
            ("PUSH 1\nPUSH 2\nSWAP\nHALT\n", &[2, 1]),
            ("PUSH 1\nPUSH 2\nOVER\nHALT\n", &[1, 2, 1]),
            ("PUSH 1\nPUSH 2\nPUSH 3\nROT\nHALT\n", &[2, 3, 1]),
            ("PUSH 1\nPUSH 2\nNIP\nHALT\n", &[2]),
            ("PUSH 1\nPUSH 2\nTUCK\nHALT\n", &[2, 1, 2]),
        ];
        for (src, expected) in cases {
            let (result, stack) = run_for_stack(src);
            assert!(result.is_ok(), "src: {src:?}");
            assert_eq!(stack, expected, "src: {src:?}");
        }
    }

    #[test]
    fn print_writes_the_literal_verbatim() {
        let (_, out) = run_script("PRINT \"Hello, World!\"\nHALT\n", "");
        assert_eq!(out, "Hello, World!\n");
    }

    #[test]
    fn wait_with_non_positive_duration_is_a_no_op() {
        let (result, _) = run_for_stack("WAIT 0\nWAIT -5\nHALT\n");
        assert!(result.is_ok());
    }
}
