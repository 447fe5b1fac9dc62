//! J1 assembly emitter for the PL/0 compiler.
//!
//! Accumulates mnemonic lines, labels and comments in program order and
//! hands out unique label names. Serialisation optionally runs the
//! [`PeepholeOptimizer`] over the finished stream.

use crate::optimizer::PeepholeOptimizer;

/// Append-only assembly line buffer.
#[derive(Debug)]
pub struct AsmWriter {
    lines: Vec<String>,
    /// Monotonic across the whole run; never reset.
    label_counter: usize,
}

impl AsmWriter {
    /// Default initial capacity in lines.
    const DEFAULT_CAPACITY: usize = 512;

    /// Create a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new writer with room for `capacity` lines.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
            label_counter: 0,
        }
    }

    /// Allocate a fresh label name: `prefix0`, `prefix1`, ...
    ///
    /// The counter is shared by all prefixes.
    pub fn unique_label(&mut self, prefix: &str) -> String {
        let label = format!("{}{}", prefix, self.label_counter);
        self.label_counter += 1;
        label
    }

    /// Write a zero-argument instruction (`DUP`, `ADD`, `@`, ...).
    #[inline]
    pub fn write_instruction(&mut self, mnemonic: &str) {
        self.lines.push(mnemonic.to_string());
    }

    /// Write a literal push.
    #[inline]
    pub fn write_lit(&mut self, value: u16) {
        self.lines.push(format!("LIT {}", value));
    }

    /// Write an unconditional jump.
    #[inline]
    pub fn write_jump(&mut self, label: &str) {
        self.write_transfer("JUMP", label);
    }

    /// Write a branch taken when the top of stack is zero.
    #[inline]
    pub fn write_branch(&mut self, label: &str) {
        self.write_transfer("0BRANCH", label);
    }

    /// Write a subroutine call.
    #[inline]
    pub fn write_call(&mut self, label: &str) {
        self.write_transfer("CALL", label);
    }

    fn write_transfer(&mut self, mnemonic: &str, label: &str) {
        let mut line = String::with_capacity(mnemonic.len() + 1 + label.len());
        line.push_str(mnemonic);
        line.push(' ');
        line.push_str(label);
        self.lines.push(line);
    }

    /// Write a label definition.
    #[inline]
    pub fn write_label(&mut self, label: &str) {
        self.lines.push(format!("{}:", label));
    }

    /// Write a comment line.
    #[inline]
    pub fn write_comment(&mut self, text: &str) {
        self.lines.push(format!("; {}", text));
    }

    /// Lines written so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines written so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Serialise to newline-terminated text, optionally peephole-optimised.
    pub fn finish(self, optimize: bool) -> String {
        let text = if self.lines.is_empty() {
            String::new()
        } else {
            self.lines.join("\n") + "\n"
        };
        if optimize {
            PeepholeOptimizer::optimize(&text)
        } else {
            text
        }
    }
}

impl Default for AsmWriter {
    fn default() -> Self {
        Self::new()
    }
}
