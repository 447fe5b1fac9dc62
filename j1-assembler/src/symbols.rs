use phf::phf_map;
use std::collections::HashMap;

/// Zero-argument ALU mnemonics and their pre-assembled words (compile-time perfect hash map)
pub static ALU_WORDS: phf::Map<&'static str, u16> = phf_map! {
    "DUP" => 0x6081,
    "OVER" => 0x6181,
    "INVERT" => 0x6600,
    "ADD" => 0x6203,
    "SUB" => 0x6303, // N - T
    "SWAP" => 0x6180,
    "NIP" => 0x6003,
    "DROP" => 0x6103,
    "EXIT" => 0x7018,
    "@" => 0x6C00,
    "!" => 0x6123,
    ">R" => 0x61CB,
    "R>" => 0x7B99,
    "R@" => 0x7B81,
};

/// Look up an ALU mnemonic (case-insensitive)
pub fn alu_word(mnemonic: &str) -> Option<u16> {
    ALU_WORDS
        .get(mnemonic)
        .or_else(|| ALU_WORDS.get(mnemonic.to_ascii_uppercase().as_str()))
        .copied()
}

/// Label → word address map filled during pass 1
pub struct LabelTable {
    labels: HashMap<String, u16>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelTable {
    pub fn new() -> Self {
        Self {
            labels: HashMap::with_capacity(64),
        }
    }

    pub fn add_label(&mut self, label: String, address: u16) -> Result<(), String> {
        if self.labels.contains_key(&label) {
            return Err(label);
        }
        self.labels.insert(label, address);
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<u16> {
        self.labels.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alu_words() {
        assert_eq!(alu_word("DUP"), Some(0x6081));
        assert_eq!(alu_word("ADD"), Some(0x6203));
        assert_eq!(alu_word("EXIT"), Some(0x7018));
        assert_eq!(alu_word("@"), Some(0x6C00));
        assert_eq!(alu_word("R@"), Some(0x7B81));
        assert_eq!(alu_word("LIT"), None);
    }

    #[test]
    fn test_alu_words_ignore_case() {
        assert_eq!(alu_word("dup"), Some(0x6081));
        assert_eq!(alu_word("Invert"), Some(0x6600));
        assert_eq!(alu_word("r>"), Some(0x7B99));
    }

    #[test]
    fn test_label_addition() {
        let mut table = LabelTable::new();
        assert!(table.is_empty());
        assert!(table.add_label("loop".to_string(), 10).is_ok());
        assert_eq!(table.get("loop"), Some(10));
        assert_eq!(table.add_label("loop".to_string(), 20), Err("loop".to_string()));
        assert_eq!(table.get("loop"), Some(10));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let mut table = LabelTable::new();
        table.add_label("Main".to_string(), 1).unwrap();
        assert_eq!(table.get("main"), None);
    }
}
