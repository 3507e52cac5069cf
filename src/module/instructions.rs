// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::{HEADER_WORDS, ModuleError, Word};

/// One instruction of the stream, borrowed from the module words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    offset: u32,
    opcode: u16,
    operands: &'a [Word],
}

impl<'a> Instruction<'a> {
    /// Word offset of the instruction's leading word within the module.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// The opcode as a known [`spirv::Op`], or `None` for opcodes newer than this crate.
    pub fn op(&self) -> Option<spirv::Op> {
        spirv::Op::from_u32(u32::from(self.opcode))
    }

    /// Every word after the leading word.
    pub fn operands(&self) -> &'a [Word] {
        self.operands
    }

    pub fn operand(&self, index: usize) -> Option<Word> {
        self.operands.get(index).copied()
    }

    /// Word offset of operand `index` within the module.
    ///
    /// This is the position to overwrite when patching that operand in place.
    pub fn operand_offset(&self, index: usize) -> u32 {
        self.offset + 1 + index as u32
    }

    /// Decodes a nul-terminated literal string starting at operand `index`.
    ///
    /// Returns `None` when the operands end before the terminator.
    pub fn literal_string(&self, index: usize) -> Option<String> {
        let mut bytes = Vec::new();
        for word in self.operands.get(index..)? {
            for byte in word.to_le_bytes() {
                if byte == 0 {
                    return Some(String::from_utf8_lossy(&bytes).into_owned());
                }
                bytes.push(byte);
            }
        }
        None
    }
}

/**
Iterator over the instruction stream that follows the module header.

Each instruction's leading word packs `(word_count << 16) | opcode`. A word count of zero,
or an instruction that would run past the end of the module, yields one
[`ModuleError::MalformedInstruction`] and ends the iteration.
*/
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    words: &'a [Word],
    position: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub(crate) fn new(words: &'a [Word]) -> Self {
        Instructions {
            words,
            position: HEADER_WORDS.min(words.len()),
            failed: false,
        }
    }

    /// Word offset of the next instruction to be yielded.
    pub fn word_offset(&self) -> u32 {
        self.position as u32
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, ModuleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let leading = *self.words.get(self.position)?;
        let word_count = (leading >> 16) as usize;
        let offset = self.position as u32;
        let end = self.position + word_count;
        if word_count == 0 || end > self.words.len() {
            self.failed = true;
            return Some(Err(ModuleError::MalformedInstruction { offset }));
        }
        let instruction = Instruction {
            offset,
            opcode: (leading & 0xFFFF) as u16,
            operands: &self.words[self.position + 1..end],
        };
        self.position = end;
        Some(Ok(instruction))
    }
}

impl std::iter::FusedIterator for Instructions<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MAGIC_NUMBER;

    fn header() -> Vec<Word> {
        vec![MAGIC_NUMBER, 0x0001_0000, 0, 10, 0]
    }

    #[test]
    fn iterates_after_header() {
        let mut words = header();
        words.extend([(2 << 16) | 26, 3]); //OpTypeSampler %3
        words.extend([(4 << 16) | 71, 3, 33, 5]); //OpDecorate %3 Binding 5
        let mut iter = Instructions::new(&words);
        assert_eq!(iter.word_offset(), 5);

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.opcode(), 26);
        assert_eq!(first.offset(), 5);
        assert_eq!(first.operands(), &[3]);

        let second = iter.next().unwrap().unwrap();
        assert_eq!(second.opcode(), 71);
        assert_eq!(second.op(), Some(spirv::Op::Decorate));
        assert_eq!(second.operand(2), Some(5));
        assert_eq!(second.operand_offset(2), 10);
        assert_eq!(words[second.operand_offset(2) as usize], 5);
        assert!(iter.next().is_none());
        assert_eq!(iter.word_offset(), 11);
    }

    #[test]
    fn zero_word_count_fails_once() {
        let mut words = header();
        words.push(71);
        let mut iter = Instructions::new(&words);
        assert_eq!(
            iter.next(),
            Some(Err(ModuleError::MalformedInstruction { offset: 5 }))
        );
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn truncated_instruction_fails() {
        let mut words = header();
        words.extend([(4 << 16) | 71, 3, 33]);
        let results: Vec<_> = Instructions::new(&words).collect();
        assert_eq!(
            results,
            vec![Err(ModuleError::MalformedInstruction { offset: 5 })]
        );
    }

    #[test]
    fn short_module_has_no_instructions() {
        assert_eq!(Instructions::new(&[MAGIC_NUMBER, 0]).count(), 0);
    }

    #[test]
    fn literal_strings() {
        let mut words = header();
        //OpName %1 "abcd" needs a second word for the terminator
        words.extend([(4 << 16) | 5, 1, u32::from_le_bytes(*b"abcd"), 0]);
        let name = Instructions::new(&words).next().unwrap().unwrap();
        assert_eq!(name.literal_string(1).as_deref(), Some("abcd"));

        let unterminated = Instruction {
            offset: 0,
            opcode: 5,
            operands: &[1, u32::from_le_bytes(*b"abcd")],
        };
        assert_eq!(unterminated.literal_string(1), None);
    }
}
