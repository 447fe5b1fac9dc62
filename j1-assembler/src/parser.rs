use crate::error::{AsmError, Result};
use crate::symbols::{LabelTable, alu_word};

/// Instruction class; the argument is kept as raw text until pass 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Lit,
    Jump,
    ZeroBranch,
    Call,
    Alu(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: String,
    pub opcode: Opcode,
    pub argument: Option<String>,
}

/// Resolved instruction with every argument converted to a number
/// This type makes it impossible to have unresolved labels at encoding time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedInstruction {
    Lit(u16),
    Jump(u16),
    ZeroBranch(u16),
    Call(u16),
    Alu(u16),
}

impl Instruction {
    /// Resolve the argument against the labels collected in pass 1
    pub fn resolve(&self, labels: &LabelTable, line_num: usize) -> Result<ResolvedInstruction> {
        let address = |value: i64| (value & 0x1FFF) as u16;

        match self.opcode {
            Opcode::Alu(word) => match &self.argument {
                None => Ok(ResolvedInstruction::Alu(word)),
                Some(arg) => Err(AsmError::UnexpectedArgument {
                    line: line_num,
                    mnemonic: self.mnemonic.clone(),
                    argument: arg.clone(),
                }),
            },
            Opcode::Lit => {
                let value = self.argument_value(labels, line_num)?;
                if !(0..=0x7FFF).contains(&value) {
                    return Err(AsmError::LiteralOutOfRange {
                        line: line_num,
                        value,
                    });
                }
                Ok(ResolvedInstruction::Lit(value as u16))
            }
            Opcode::Jump => Ok(ResolvedInstruction::Jump(address(
                self.argument_value(labels, line_num)?,
            ))),
            Opcode::ZeroBranch => Ok(ResolvedInstruction::ZeroBranch(address(
                self.argument_value(labels, line_num)?,
            ))),
            Opcode::Call => Ok(ResolvedInstruction::Call(address(
                self.argument_value(labels, line_num)?,
            ))),
        }
    }

    fn argument_value(&self, labels: &LabelTable, line_num: usize) -> Result<i64> {
        let arg = self
            .argument
            .as_deref()
            .ok_or_else(|| AsmError::MissingArgument {
                line: line_num,
                mnemonic: self.mnemonic.clone(),
            })?;

        if let Some(value) = parse_number(arg) {
            return Ok(value);
        }

        if is_identifier(arg) {
            return labels
                .get(arg)
                .map(i64::from)
                .ok_or_else(|| AsmError::UndefinedLabel {
                    line: line_num,
                    label: arg.to_string(),
                });
        }

        Err(AsmError::InvalidArgument {
            line: line_num,
            argument: arg.to_string(),
        })
    }
}

/// One source line: optional label, optional instruction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub label: Option<String>,
    pub instruction: Option<Instruction>,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.instruction.is_none()
    }
}

/// Strip comments and whitespace
fn clean_line(line: &str) -> &str {
    line.split(';').next().unwrap_or("").trim()
}

/// Label names: a letter or underscore, then letters, digits or underscores
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer
pub fn parse_number(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    s.parse::<i64>().ok()
}

fn classify(mnemonic: &str) -> Option<Opcode> {
    match mnemonic.to_ascii_uppercase().as_str() {
        "LIT" => Some(Opcode::Lit),
        "JUMP" => Some(Opcode::Jump),
        "0BRANCH" => Some(Opcode::ZeroBranch),
        "CALL" => Some(Opcode::Call),
        _ => alu_word(mnemonic).map(Opcode::Alu),
    }
}

/// Parse `MNEMONIC [ARG]`
fn parse_instruction(text: &str, line_num: usize) -> Result<Instruction> {
    let (mnemonic, argument) = match text.split_once(char::is_whitespace) {
        Some((mn, rest)) => (mn, Some(rest.trim().to_string())),
        None => (text, None),
    };

    let opcode = classify(mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
        line: line_num,
        mnemonic: mnemonic.to_string(),
    })?;

    Ok(Instruction {
        mnemonic: mnemonic.to_ascii_uppercase(),
        opcode,
        argument,
    })
}

/// Parse single line
pub fn parse_line(line: &str, line_num: usize) -> Result<Line> {
    let clean = clean_line(line);

    if clean.is_empty() {
        return Ok(Line::default());
    }

    let (label, rest) = match clean.split_once(':') {
        Some((label, rest)) => {
            let label = label.trim();
            if !is_identifier(label) {
                return Err(AsmError::InvalidLabel {
                    line: line_num,
                    label: label.to_string(),
                });
            }
            (Some(label.to_string()), rest.trim())
        }
        None => (None, clean),
    };

    let instruction = if rest.is_empty() {
        None
    } else {
        Some(parse_instruction(rest, line_num)?)
    };

    Ok(Line { label, instruction })
}
