//! Operand stack for bez evaluation.

use types::Fixed;

use super::Error;

/// Maximum size of the operand stack.
///
/// No bez operator takes more than eleven operands; the extra room allows
/// for a few values pending a `div`.
pub const MAX_STACK: usize = 20;

/// Operand stack for bez glyph programs.
pub struct Stack {
    values: [Fixed; MAX_STACK],
    top: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            values: [Fixed::ZERO; MAX_STACK],
            top: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    pub fn len(&self) -> usize {
        self.top
    }

    pub fn verify_at_least_len(&self, len: usize) -> Result<(), Error> {
        if self.top < len {
            Err(Error::StackUnderflow)
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.top = 0;
    }

    pub fn push(&mut self, value: Fixed) -> Result<(), Error> {
        if self.top == MAX_STACK {
            return Err(Error::StackOverflow);
        }
        self.values[self.top] = value;
        self.top += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Fixed, Error> {
        if self.top == 0 {
            return Err(Error::StackUnderflow);
        }
        self.top -= 1;
        Ok(self.values[self.top])
    }

    /// Returns the topmost `N` values in push order.
    ///
    /// The values are not removed from the stack.
    pub fn args<const N: usize>(&self) -> Result<[Fixed; N], Error> {
        self.verify_at_least_len(N)?;
        let mut args = [Fixed::ZERO; N];
        args.copy_from_slice(&self.values[self.top - N..self.top]);
        Ok(args)
    }

    pub fn values(&self) -> &[Fixed] {
        &self.values[..self.top]
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
