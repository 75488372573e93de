use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// The S3 instruction set: the union of every opcode the language ever
/// shipped, as one closed enum so dispatch is exhaustively checked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Op {
    Push,
    Pop,
    Add,
    Sub,
    Mul,
    Div,
    Dup,
    Swap,
    Over,
    Rot,
    Nip,
    Tuck,
    Print,
    PrintTop,
    Read,
    Jump,
    /// Alias of [`Op::Jump`] kept for script compatibility.
    Goto,
    JumpIfZero,
    JumpIfPos,
    Loop,
    Wait,
    If,
    Halt,
}

impl Op {
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Op::Push => "PUSH",
            Op::Pop => "POP",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Dup => "DUP",
            Op::Swap => "SWAP",
            Op::Over => "OVER",
            Op::Rot => "ROT",
            Op::Nip => "NIP",
            Op::Tuck => "TUCK",
            Op::Print => "PRINT",
            Op::PrintTop => "PRINT.TOP",
            Op::Read => "READ",
            Op::Jump => "JUMP",
            Op::Goto => "GOTO",
            Op::JumpIfZero => "JUMP.IF.0",
            Op::JumpIfPos => "JUMP.IF.POS",
            Op::Loop => "LOOP",
            Op::Wait => "WAIT",
            Op::If => "IF",
            Op::Halt => "HALT",
        }
    }

    /// Number of operand slots following the opcode in the token stream.
    ///
    /// `IF` reports only its comparison operator and threshold; the trailing
    /// instruction encoded after them is measured separately (see
    /// [`Program::instruction_width`]).
    pub const fn operand_count(&self) -> usize {
        match self {
            Op::Push | Op::Print | Op::Wait => 1,
            Op::Jump | Op::Goto | Op::JumpIfZero | Op::JumpIfPos => 1,
            Op::Loop => 2,
            Op::If => 2,
            _ => 0,
        }
    }
}

impl FromStr for Op {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "PUSH" => Op::Push,
            "POP" => Op::Pop,
            "ADD" => Op::Add,
            "SUB" => Op::Sub,
            "MUL" => Op::Mul,
            "DIV" => Op::Div,
            "DUP" => Op::Dup,
            "SWAP" => Op::Swap,
            "OVER" => Op::Over,
            "ROT" => Op::Rot,
            "NIP" => Op::Nip,
            "TUCK" => Op::Tuck,
            "PRINT" => Op::Print,
            "PRINT.TOP" => Op::PrintTop,
            "READ" => Op::Read,
            "JUMP" => Op::Jump,
            "GOTO" => Op::Goto,
            "JUMP.IF.0" => Op::JumpIfZero,
            "JUMP.IF.POS" => Op::JumpIfPos,
            "LOOP" => Op::Loop,
            "WAIT" => Op::Wait,
            "IF" => Op::If,
            "HALT" => Op::Halt,
            _ => return Err(()),
        })
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Comparison operator carried by `IF`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cmp {
    Gt,
    Lt,
    Eq,
}

impl Cmp {
    pub fn eval(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            Cmp::Gt => lhs > rhs,
            Cmp::Lt => lhs < rhs,
            Cmp::Eq => lhs == rhs,
        }
    }
}

impl Display for Cmp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cmp::Gt => write!(f, ">"),
            Cmp::Lt => write!(f, "<"),
            Cmp::Eq => write!(f, "="),
        }
    }
}

/// One slot of the flat token stream.
///
/// Opcodes and their operands are interleaved in a single vector so the
/// program counter is a plain index: after dispatching an opcode the engine
/// has advanced past exactly [`Op::operand_count`] operand slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Op(Op),
    Int(i64),
    Str(String),
    Label(String),
    Cmp(Cmp),
}

/// A tokenized S3 program: the flat token stream plus the label table.
///
/// Labels map to the stream index of the instruction that followed the
/// declaration; the table is built once by the frontend and read-only from
/// then on.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub tokens: Vec<Token>,
    pub labels: HashMap<String, usize>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Width in slots of the instruction starting at `at`, counting the
    /// opcode itself. For `IF` this includes the inlined trailing
    /// instruction, recursing through chained `IF`s.
    ///
    /// Returns `None` when `at` does not address an opcode slot, which the
    /// engine reports as a misaligned program counter.
    pub fn instruction_width(&self, at: usize) -> Option<usize> {
        match self.tokens.get(at)? {
            Token::Op(Op::If) => {
                let trailing = self.instruction_width(at + 3)?;
                Some(3 + trailing)
            }
            Token::Op(op) => Some(1 + op.operand_count()),
            _ => None,
        }
    }
}
