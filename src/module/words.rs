// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::{Instructions, ModuleError, ModuleHeader, Word};

/// A SPIR-V module that owns its words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpirvModule {
    words: Vec<Word>,
}

impl SpirvModule {
    /// Takes ownership of `words`.
    pub fn new(words: Vec<Word>) -> Self {
        SpirvModule { words }
    }

    /**
    Copies a module out of raw bytes in native byte order.

    The word count is `bytes.len() / 4`; trailing bytes that don't form a whole word are
    dropped. The input need not be 4-byte aligned.
    */
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let words = bytes
            .chunks_exact(std::mem::size_of::<Word>())
            .map(|c| Word::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        SpirvModule { words }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Mutable access for the patch entry points.
    pub fn words_mut(&mut self) -> &mut [Word] {
        &mut self.words
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    /// The module as bytes in native byte order, suitable for a backend's
    /// shader-module creation call.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_ne_bytes()).collect()
    }

    pub fn view(&self) -> SpirvModuleView<'_> {
        SpirvModuleView::new(&self.words)
    }

    /// See [`SpirvModuleView::read_header`].
    pub fn read_header(&self) -> Result<ModuleHeader, ModuleError> {
        self.view().read_header()
    }

    /// See [`SpirvModuleView::word_offset`].
    pub fn word_offset(&self, position: &[Word]) -> Option<u32> {
        self.view().word_offset(position)
    }

    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.words)
    }
}

impl From<Vec<Word>> for SpirvModule {
    fn from(words: Vec<Word>) -> Self {
        SpirvModule::new(words)
    }
}

/// A non-owning view over module words owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpirvModuleView<'a> {
    words: &'a [Word],
}

impl<'a> SpirvModuleView<'a> {
    pub fn new(words: &'a [Word]) -> Self {
        SpirvModuleView { words }
    }

    pub fn words(&self) -> &'a [Word] {
        self.words
    }

    /// Validates and returns the module header.
    ///
    /// Fails with [`ModuleError::InvalidModule`] when the module is shorter than the header,
    /// and with [`ModuleError::InvalidHeader`] when the magic number doesn't match.
    pub fn read_header(&self) -> Result<ModuleHeader, ModuleError> {
        ModuleHeader::read(self.words)
    }

    /**
    Converts a scan position into a word offset.

    `position` must be a sub-slice of this module's words, such as the tail left over while
    scanning; the result is the index of its first word. Returns `None` for a slice that lies
    outside the module.
    */
    pub fn word_offset(&self, position: &[Word]) -> Option<u32> {
        let word = std::mem::size_of::<Word>();
        let base = self.words.as_ptr() as usize;
        let start = position.as_ptr() as usize;
        let end = start.checked_add(position.len() * word)?;
        if start < base || end > base + self.words.len() * word {
            return None;
        }
        u32::try_from((start - base) / word).ok()
    }

    pub fn instructions(&self) -> Instructions<'a> {
        Instructions::new(self.words)
    }
}

impl<'a> From<&'a SpirvModule> for SpirvModuleView<'a> {
    fn from(module: &'a SpirvModule) -> Self {
        module.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MAGIC_NUMBER;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn from_bytes_drops_partial_word() {
        let mut bytes: Vec<u8> = [MAGIC_NUMBER, 0x0001_0000, 1, 2, 3]
            .iter()
            .flat_map(|w| w.to_ne_bytes())
            .collect();
        bytes.extend([0xAA, 0xBB]);
        let module = SpirvModule::from_bytes(&bytes);
        assert_eq!(module.words().len(), bytes.len() / 4);
        assert_eq!(module.words()[0], MAGIC_NUMBER);
        assert!(module.read_header().is_ok());
    }

    #[test]
    fn unaligned_bytes() {
        let words = [MAGIC_NUMBER, 0x0001_0000, 0, 1, 0];
        let mut bytes = vec![0u8];
        bytes.extend(words.iter().flat_map(|w| w.to_ne_bytes()));
        let module = SpirvModule::from_bytes(&bytes[1..]);
        assert_eq!(module.words(), &words);
        assert_eq!(module.to_bytes(), &bytes[1..]);
    }

    #[test]
    fn word_offsets() {
        let words = [MAGIC_NUMBER, 1, 2, 3, 4, 5, 6];
        let view = SpirvModuleView::new(&words);
        assert_eq!(view.word_offset(&words), Some(0));
        assert_eq!(view.word_offset(&words[5..]), Some(5));
        assert_eq!(view.word_offset(&words[7..]), Some(7));

        let elsewhere = [0u32; 4];
        assert_eq!(view.word_offset(&elsewhere), None);
    }

    #[test]
    fn view_and_owned_agree() {
        let module = SpirvModule::new(vec![0xDEAD_BEEF; 5]);
        let view = SpirvModuleView::from(&module);
        assert_eq!(view.read_header(), module.read_header());
        assert_eq!(
            module.read_header(),
            Err(ModuleError::InvalidHeader { found: 0xDEAD_BEEF })
        );
    }
}
