// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
SPIR-V module containers.

A module is a flat sequence of 32-bit [`Word`]s: a fixed 5-word header followed by the
instruction stream. Two containers are provided:

- [`SpirvModule`] owns its words. It can be built from a word vector, or copied out of a raw
  byte buffer (which need not be word-aligned).
- [`SpirvModuleView`] borrows words owned by the caller. The borrow checker guarantees the view
  never outlives the buffer.

Both expose the same read-only operations: header validation, instruction iteration, and
conversion of a scan position into a word offset that can later be patched.

```
use shaders_and_bindings::module::{SpirvModule, MAGIC_NUMBER};

let module = SpirvModule::new(vec![MAGIC_NUMBER, 0x0001_0000, 0, 1, 0]);
let header = module.read_header().expect("valid header");
assert_eq!(header.version(), (1, 0));
```
*/

mod header;
mod instructions;
mod words;

pub use header::{HEADER_WORDS, MAGIC_NUMBER, ModuleHeader};
pub use instructions::{Instruction, Instructions};
pub use words::{SpirvModule, SpirvModuleView};

/// A single SPIR-V word.
pub type Word = u32;

/// Errors produced while reading a module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ModuleError {
    /// The module is too short to hold a header.
    #[error("module has {word_count} words, the header alone needs {min}", min = HEADER_WORDS)]
    InvalidModule { word_count: usize },
    /// The leading word is not the SPIR-V magic number.
    #[error("bad magic number {found:#010x}, expected {expected:#010x}", expected = MAGIC_NUMBER)]
    InvalidHeader { found: Word },
    /// An instruction has a zero word count or runs past the end of the module.
    #[error("malformed instruction at word {offset}")]
    MalformedInstruction { offset: u32 },
}
