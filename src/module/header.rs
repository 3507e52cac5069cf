// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use super::{ModuleError, Word};

/// The SPIR-V magic number, stored as the first word of every module.
pub const MAGIC_NUMBER: Word = spirv::MAGIC_NUMBER;

/// Number of words in the module header.
pub const HEADER_WORDS: usize = 5;

/// The fixed header of a SPIR-V module.
///
/// Only used for validation; nothing in this crate rewrites the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHeader {
    /// Must be [`MAGIC_NUMBER`].
    pub magic: Word,
    /// Version word, `0x00MMmm00` for version `MM.mm`.
    pub version: Word,
    /// Generator magic of the tool that produced the module.
    pub generator: Word,
    /// All result ids in the module are below this bound.
    pub bound: Word,
    /// Reserved instruction schema, 0 in practice.
    pub schema: Word,
}

impl ModuleHeader {
    pub(crate) fn read(words: &[Word]) -> Result<Self, ModuleError> {
        let Some(&[magic, version, generator, bound, schema]) = words.get(..HEADER_WORDS) else {
            return Err(ModuleError::InvalidModule {
                word_count: words.len(),
            });
        };
        if magic != MAGIC_NUMBER {
            return Err(ModuleError::InvalidHeader { found: magic });
        }
        Ok(ModuleHeader {
            magic,
            version,
            generator,
            bound,
            schema,
        })
    }

    /// Decodes the version word as `(major, minor)`.
    pub fn version(&self) -> (u8, u8) {
        (
            ((self.version >> 16) & 0xFF) as u8,
            ((self.version >> 8) & 0xFF) as u8,
        )
    }
}
