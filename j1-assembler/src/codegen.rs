use crate::parser::ResolvedInstruction;

/// Extension point for different instruction encodings
pub trait Backend {
    fn encode_lit(&self, value: u16) -> u16;
    fn encode_transfer(&self, kind: Transfer, target: u16) -> u16;
}

/// Control-transfer instruction classes sharing the 13-bit address field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Jump,
    ZeroBranch,
    Call,
}

/// J1 format: bit 15 set for literals, bits 14..13 select the transfer kind
pub struct J1Binary;

impl Backend for J1Binary {
    fn encode_lit(&self, value: u16) -> u16 {
        0x8000 | (value & 0x7FFF)
    }

    fn encode_transfer(&self, kind: Transfer, target: u16) -> u16 {
        let base = match kind {
            Transfer::Jump => 0x0000,
            Transfer::ZeroBranch => 0x2000,
            Transfer::Call => 0x4000,
        };
        base | (target & 0x1FFF)
    }
}

/// Code generator (generic over backend)
pub struct CodeGen<B: Backend> {
    backend: B,
}

impl<B: Backend> CodeGen<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Encode a resolved instruction into one machine word
    pub fn encode(&self, inst: &ResolvedInstruction) -> u16 {
        match *inst {
            ResolvedInstruction::Lit(value) => self.backend.encode_lit(value),
            ResolvedInstruction::Jump(target) => {
                self.backend.encode_transfer(Transfer::Jump, target)
            }
            ResolvedInstruction::ZeroBranch(target) => {
                self.backend.encode_transfer(Transfer::ZeroBranch, target)
            }
            ResolvedInstruction::Call(target) => {
                self.backend.encode_transfer(Transfer::Call, target)
            }
            // ALU words are pre-assembled in the mnemonic table
            ResolvedInstruction::Alu(word) => word,
        }
    }
}

pub type J1CodeGen = CodeGen<J1Binary>;

impl J1CodeGen {
    pub fn j1() -> Self {
        Self::new(J1Binary)
    }
}

/// Render a word as 4 uppercase hex digits
pub fn write_hex_word(word: u16, buf: &mut String) {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    for shift in [12, 8, 4, 0] {
        buf.push(DIGITS[((word >> shift) & 0xF) as usize] as char);
    }
}
