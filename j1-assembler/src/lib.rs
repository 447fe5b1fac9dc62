//! J1 Assembler - two-pass assembler for the J1 16-bit stack machine.
//!
//! Pass 1 collects labels and assigns one word address per instruction;
//! pass 2 resolves arguments (numbers or labels, forward references
//! included) and encodes each instruction into a 16-bit word.
//!
//! # Usage
//!
//! ```
//! use j1_assembler::assemble;
//!
//! let assembly = assemble("start: LIT 37\nJUMP start\n").unwrap();
//! assert_eq!(assembly.words, vec![0xA025, 0x0000]);
//! ```

pub mod codegen;
pub mod error;
pub mod parser;
pub mod symbols;

use codegen::{J1CodeGen, write_hex_word};
use error::{AsmError, Result};
use parser::{Instruction, parse_line};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use symbols::LabelTable;
use tracing::{debug, trace};

/// One listing row: address, encoded word, original source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    pub address: u16,
    pub word: u16,
    pub source: String,
}

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}  {:04X}    {}", self.address, self.word, self.source)
    }
}

/// Output of a successful assembly run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    /// Machine words in address order, starting at word address 0
    pub words: Vec<u16>,
    /// One row per instruction
    pub listing: Vec<ListingLine>,
}

impl Assembly {
    /// Words as 4-digit uppercase hex strings
    pub fn hex_lines(&self) -> Vec<String> {
        self.words
            .iter()
            .map(|&word| {
                let mut buf = String::with_capacity(4);
                write_hex_word(word, &mut buf);
                buf
            })
            .collect()
    }

    /// Hex image text: one word per line, newline terminated
    pub fn hex(&self) -> String {
        let mut output = String::with_capacity(self.words.len() * 5);
        for &word in &self.words {
            write_hex_word(word, &mut output);
            output.push('\n');
        }
        output
    }

    /// Listing text: one instruction per line, newline terminated
    pub fn listing_text(&self) -> String {
        let mut output = String::new();
        for line in &self.listing {
            output.push_str(&line.to_string());
            output.push('\n');
        }
        output
    }
}

/// Instruction collected in pass 1
struct Collected<'a> {
    line_num: usize,
    source: &'a str,
    address: u16,
    instruction: Instruction,
}

/// Assemble J1 assembly source
pub fn assemble(source: &str) -> Result<Assembly> {
    // Pass 1: collect labels and assign addresses
    let mut labels = LabelTable::new();
    let mut collected = Vec::new();
    let mut pc = 0u16;

    for (idx, raw) in source.lines().enumerate() {
        let line_num = idx + 1;
        let parsed = parse_line(raw, line_num)?;

        if let Some(label) = parsed.label {
            trace!(%label, address = pc, "label");
            labels
                .add_label(label, pc)
                .map_err(|dup| AsmError::DuplicateLabel {
                    line: line_num,
                    label: dup,
                })?;
        }

        if let Some(instruction) = parsed.instruction {
            collected.push(Collected {
                line_num,
                source: raw,
                address: pc,
                instruction,
            });
            pc = pc.wrapping_add(1);
        }
    }

    debug!(
        instructions = collected.len(),
        labels = labels.len(),
        "pass 1 complete"
    );

    // Pass 2: resolve arguments and encode
    let codegen = J1CodeGen::j1();
    let mut assembly = Assembly {
        words: Vec::with_capacity(collected.len()),
        listing: Vec::with_capacity(collected.len()),
    };

    for item in &collected {
        let resolved = item.instruction.resolve(&labels, item.line_num)?;
        let word = codegen.encode(&resolved);

        assembly.words.push(word);
        assembly.listing.push(ListingLine {
            address: item.address,
            word,
            source: item.source.to_string(),
        });
    }

    debug!(words = assembly.words.len(), "pass 2 complete");
    Ok(assembly)
}

/// Assemble a single file
pub fn assemble_file(path: &Path) -> Result<Assembly> {
    let source = fs::read_to_string(path).map_err(|e| AsmError::io(path, e))?;
    debug!(path = %path.display(), "assembling");
    assemble(&source)
}

/// Assemble independent files in parallel; results keep input order
pub fn assemble_files(paths: &[PathBuf]) -> Vec<(PathBuf, Result<Assembly>)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), assemble_file(path)))
        .collect()
}

/// Write `<stem>.hex` (and `<stem>.lst` when `listing` is set) into `output_dir`
///
/// Returns the path of the hex image.
pub fn write_outputs(
    input: &Path,
    assembly: &Assembly,
    output_dir: &Path,
    listing: bool,
) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out");

    let hex_path = output_dir.join(format!("{stem}.hex"));
    fs::write(&hex_path, assembly.hex()).map_err(|e| AsmError::io(&hex_path, e))?;

    if listing {
        let lst_path = output_dir.join(format!("{stem}.lst"));
        fs::write(&lst_path, assembly.listing_text()).map_err(|e| AsmError::io(&lst_path, e))?;
    }

    Ok(hex_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_program() {
        let source = "
            LIT 2
            LIT 3
            ADD
            LIT 0x100
            !
        ";

        let assembly = assemble(source).unwrap();
        assert_eq!(assembly.words, vec![0x8002, 0x8003, 0x6203, 0x8100, 0x6123]);
    }

    #[test]
    fn test_lit_37() {
        let assembly = assemble("LIT 37").unwrap();
        assert_eq!(assembly.hex_lines(), vec!["A025"]);
    }

    #[test]
    fn test_with_labels() {
        let source = "
            JUMP main
        helper:
            EXIT
        main:
            CALL helper
        halt: JUMP halt
        ";

        let assembly = assemble(source).unwrap();
        assert_eq!(assembly.words, vec![0x0002, 0x7018, 0x4001, 0x0003]);
    }

    #[test]
    fn test_lit_accepts_label() {
        let source = "LIT data\ndata: EXIT";
        let assembly = assemble(source).unwrap();
        assert_eq!(assembly.words[0], 0x8001);
    }

    #[test]
    fn test_comments_and_whitespace() {
        let source = "
            ; a comment
            DUP     ; inline comment

            ; another
            DROP
        ";

        let assembly = assemble(source).unwrap();
        assert_eq!(assembly.words, vec![0x6081, 0x6103]);
    }

    #[test]
    fn test_listing() {
        let source = "start: LIT 5 ; five\n  JUMP start";
        let assembly = assemble(source).unwrap();

        assert_eq!(assembly.listing.len(), 2);
        assert_eq!(
            assembly.listing[0].to_string(),
            "0000  8005    start: LIT 5 ; five"
        );
        assert_eq!(assembly.listing[1].to_string(), "0001  0000      JUMP start");
    }

    #[test]
    fn test_hex_text() {
        let assembly = assemble("DUP\nEXIT").unwrap();
        assert_eq!(assembly.hex(), "6081\n7018\n");
    }

    #[test]
    fn test_duplicate_label_error() {
        let source = "
        loop:
            DUP
        loop:
            DROP
        ";

        match assemble(source).unwrap_err() {
            AsmError::DuplicateLabel { line, label } => {
                assert_eq!(label, "loop");
                assert_eq!(line, 4);
            }
            other => panic!("Expected DuplicateLabel error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_mnemonic_reported_before_argument_errors() {
        // Pass 1 rejects the mnemonic before pass 2 looks at arguments
        let source = "LIT\nFROB";
        match assemble(source).unwrap_err() {
            AsmError::UnknownMnemonic { line, mnemonic } => {
                assert_eq!(line, 2);
                assert_eq!(mnemonic, "FROB");
            }
            other => panic!("Expected UnknownMnemonic error, got {other:?}"),
        }
    }
}
