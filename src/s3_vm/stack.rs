use crate::s3_vm::error::{RuntimeError, RuntimeResult};
use std::fmt::Display;

/// Number of operand slots; fixed for the lifetime of a run.
pub const STACK_CAPACITY: usize = 256;

/// The operand stack: a fixed-size array of integers addressed at its top.
///
/// Capacity never changes after construction. Pushing past the last slot is
/// a stack overflow and popping or peeking an empty stack is a stack
/// underflow; both abort the run.
#[derive(Debug)]
pub struct Stack {
    values: [i64; STACK_CAPACITY],
    /// One past the last value pushed.
    top: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self {
            values: [0; STACK_CAPACITY],
            top: 0,
        }
    }

    #[inline(always)]
    pub fn push(&mut self, value: i64) -> RuntimeResult<()> {
        if self.top < STACK_CAPACITY {
            self.values[self.top] = value;
            self.top += 1;
            Ok(())
        } else {
            Self::push_stack_overflow()
        }
    }

    #[inline(always)]
    pub fn pop(&mut self) -> RuntimeResult<i64> {
        if self.top == 0 {
            return Self::pop_stack_underflow();
        }
        self.top -= 1;
        Ok(self.values[self.top])
    }

    /// Peeks the value on top without removing it.
    #[inline(always)]
    pub fn top(&self) -> RuntimeResult<i64> {
        if self.top == 0 {
            return Self::pop_stack_underflow();
        }
        Ok(self.values[self.top - 1])
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.top
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, i64> {
        self.values[..self.top].iter()
    }

    #[cold]
    #[inline(never)]
    fn pop_stack_underflow() -> RuntimeResult<i64> {
        Err(RuntimeError::StackUnderflow)
    }

    #[cold]
    #[inline(never)]
    fn push_stack_overflow() -> RuntimeResult<()> {
        Err(RuntimeError::StackOverflow)
    }
}

impl Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_is_lifo() {
        let mut stack = Stack::new();
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        assert_eq!(stack.top().unwrap(), 2);
        assert_eq!(stack.pop().unwrap(), 2);
        assert_eq!(stack.pop().unwrap(), 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn underflow_on_empty_pop_and_peek() {
        let mut stack = Stack::new();
        assert!(matches!(stack.pop(), Err(RuntimeError::StackUnderflow)));
        assert!(matches!(stack.top(), Err(RuntimeError::StackUnderflow)));
        // the failed pop must not corrupt the stack
        stack.push(7).unwrap();
        assert_eq!(stack.pop().unwrap(), 7);
    }

    #[test]
    fn overflow_at_capacity() {
        let mut stack = Stack::new();
        for i in 0..STACK_CAPACITY {
            stack.push(i as i64).unwrap();
        }
        assert!(matches!(stack.push(0), Err(RuntimeError::StackOverflow)));
        assert_eq!(stack.len(), STACK_CAPACITY);
    }

    #[test]
    fn display_renders_bottom_to_top() {
        let mut stack = Stack::new();
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        assert_eq!(stack.to_string(), "[1, 2]");
    }
}
