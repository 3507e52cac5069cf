// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Remaps the descriptor bindings encoded in a SPIR-V module.
//!
//! A [`BindingLayout`] is built once per module from the binding points a
//! [`BindingReflector`] reports. Consumers then request new destinations for the bindings
//! they care about with [`BindingLayout::assign_binding_slots`], and finally write the new
//! numbers back with [`BindingLayout::update_module`].
//!
//! The layout never keeps a reference into the module it was built from. It only records
//! word offsets, and patching overwrites the 32-bit values at those offsets in whatever
//! buffer is passed in. The length and structure of the module never change.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "testing")]
//! # {
//! use shaders_and_bindings::bindings::binding_layout::{BindingLayout, BindingSlot};
//! use shaders_and_bindings::reflect::SpirvReflector;
//! use shaders_and_bindings::testing::ModuleBuilder;
//!
//! let mut builder = ModuleBuilder::new();
//! builder.uniform_block("Globals", 0, 4);
//! builder.texture("albedo", 0, 9);
//! let mut words = builder.build();
//!
//! let mut layout = BindingLayout::from_words(&words, &SpirvReflector).expect("reflect");
//! // move both into set 2, numbered from zero
//! let changed = layout.assign_binding_slots(
//!     &[BindingSlot::new(0, 4), BindingSlot::new(0, 9)],
//!     2,
//!     true,
//! );
//! assert_eq!(changed, 2);
//! layout.update_module(&mut words);
//! assert_eq!(layout.find(0, 9).map(|b| (b.dst_set(), b.dst_binding())), Some((2, 1)));
//! # }
//! ```

use std::collections::HashSet;

use crate::module::{ModuleError, SpirvModule, SpirvModuleView, Word};
use crate::reflect::{BindingPoint, BindingReflector, ReflectError};

/// A binding a consumer wants remapped, matched against the source set and binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BindingSlot {
    pub set: u32,
    pub index: u32,
}

impl BindingSlot {
    pub const fn new(set: u32, index: u32) -> Self {
        BindingSlot { set, index }
    }
}

/**
One binding of a module, with where it came from and where it goes.

The source set and binding identify the entry and never change after the layout is built.
The destination starts out equal to the source and is what [`BindingLayout::update_module`]
writes.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleBinding {
    src_set: u32,
    src_binding: u32,
    dst_set: u32,
    dst_binding: u32,
    set_word_offset: u32,
    binding_word_offset: u32,
}

impl ModuleBinding {
    fn new(point: &BindingPoint) -> Self {
        ModuleBinding {
            src_set: point.set,
            src_binding: point.binding,
            dst_set: point.set,
            dst_binding: point.binding,
            set_word_offset: point.set_word_offset,
            binding_word_offset: point.binding_word_offset,
        }
    }

    pub fn src_set(&self) -> u32 {
        self.src_set
    }

    pub fn src_binding(&self) -> u32 {
        self.src_binding
    }

    pub fn dst_set(&self) -> u32 {
        self.dst_set
    }

    pub fn dst_binding(&self) -> u32 {
        self.dst_binding
    }

    /// Word offset of the encoded descriptor set.
    pub fn set_word_offset(&self) -> u32 {
        self.set_word_offset
    }

    /// Word offset of the encoded binding.
    pub fn binding_word_offset(&self) -> u32 {
        self.binding_word_offset
    }

    //sort and search key
    fn source(&self) -> (u32, u32) {
        (self.src_set, self.src_binding)
    }

    fn patches(&self) -> [(u32, Word); 2] {
        [
            (self.set_word_offset, self.dst_set),
            (self.binding_word_offset, self.dst_binding),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LayoutError {
    #[error("can't build binding layout: {0}")]
    Reflect(#[from] ReflectError),
    #[error("can't build binding layout: {0}")]
    Module(#[from] ModuleError),
}

/// The remap table for one module.
///
/// Entries are kept sorted by source set and source binding, so each request is a binary
/// search. Assignment only touches destinations, so the order holds for the lifetime of
/// the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingLayout {
    bindings: Vec<ModuleBinding>,
}

impl BindingLayout {
    /// An empty layout.
    pub fn new() -> Self {
        BindingLayout::default()
    }

    /// Builds the identity layout for a module owned by the caller.
    pub fn from_words<R>(words: &[Word], reflector: &R) -> Result<Self, LayoutError>
    where
        R: BindingReflector + ?Sized,
    {
        let view = SpirvModuleView::new(words);
        view.read_header()?;
        let points = reflector.reflect_binding_points(view)?;
        let mut bindings: Vec<ModuleBinding> = points.iter().map(ModuleBinding::new).collect();
        bindings.sort_by_key(ModuleBinding::source);
        Ok(BindingLayout { bindings })
    }

    /**
    Rebuilds this layout from a module in raw bytes.

    On failure the layout is left empty and the error says why. A missing reflector is
    reported as [`ReflectError::Unavailable`]; callers typically fall back to using the module
    unmodified.
    */
    pub fn build_from_module<R>(
        &mut self,
        bytes: &[u8],
        reflector: &R,
    ) -> Result<(), LayoutError>
    where
        R: BindingReflector + ?Sized,
    {
        self.bindings.clear();
        let module = SpirvModule::from_bytes(bytes);
        match Self::from_words(module.words(), reflector) {
            Ok(layout) => {
                *self = layout;
                Ok(())
            }
            Err(e) => {
                logwise::warn_sync!(
                    "binding layout unavailable: {err}",
                    err = logwise::privacy::LogIt(&e)
                );
                Err(e)
            }
        }
    }

    /// Every binding, sorted by source set then source binding.
    pub fn bindings(&self) -> &[ModuleBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The first binding with the given source set and binding.
    pub fn find(&self, src_set: u32, src_binding: u32) -> Option<&ModuleBinding> {
        self.bindings[self.equal_range((src_set, src_binding))].first()
    }

    fn equal_range(&self, key: (u32, u32)) -> std::ops::Range<usize> {
        let start = self.bindings.partition_point(|b| b.source() < key);
        let end = self.bindings.partition_point(|b| b.source() <= key);
        start..end
    }

    /**
    Moves the requested bindings to descriptor set `dst_set`.

    Each request is matched against source set and source binding. With `ascending`, matched
    requests also get consecutive binding numbers starting at zero, in request order; without
    it, destination bindings are kept. Requests that match nothing are skipped, since a
    consumer may declare slots some variant of a module never uses.

    Returns how many requests changed a destination. Repeating a call therefore returns zero.
    When several module bindings share a source, one request moves all of them and counts
    once. A request repeated within one call is only honored the first time and takes no
    binding number.
    */
    pub fn assign_binding_slots(
        &mut self,
        slots: &[BindingSlot],
        dst_set: u32,
        ascending: bool,
    ) -> u32 {
        let mut changed = 0;
        let mut next_binding = 0;
        let mut matched = HashSet::new();
        for slot in slots {
            let range = self.equal_range((slot.set, slot.index));
            if range.is_empty() {
                logwise::trace_sync!(
                    "no binding at set {set} index {index}",
                    set = slot.set,
                    index = slot.index
                );
                continue;
            }
            if !matched.insert((slot.set, slot.index)) {
                logwise::trace_sync!(
                    "binding ({set},{index}) already assigned in this call",
                    set = slot.set,
                    index = slot.index
                );
                continue;
            }
            let mut any_changed = false;
            for binding in &mut self.bindings[range] {
                let dst_binding = if ascending {
                    next_binding
                } else {
                    binding.dst_binding
                };
                if binding.dst_set != dst_set || binding.dst_binding != dst_binding {
                    binding.dst_set = dst_set;
                    binding.dst_binding = dst_binding;
                    any_changed = true;
                }
                logwise::trace_sync!(
                    "binding ({set},{index}) -> ({dst_set},{dst_binding})",
                    set = slot.set,
                    index = slot.index,
                    dst_set = dst_set,
                    dst_binding = dst_binding
                );
            }
            if ascending {
                next_binding += 1;
            }
            if any_changed {
                changed += 1;
            }
        }
        changed
    }

    /// Sends every binding with source `slot` to one explicit destination.
    ///
    /// Returns whether anything changed; `false` also when nothing matches.
    pub fn assign_binding(&mut self, slot: BindingSlot, dst_set: u32, dst_binding: u32) -> bool {
        let range = self.equal_range((slot.set, slot.index));
        let mut changed = false;
        for binding in &mut self.bindings[range] {
            changed |= binding.dst_set != dst_set || binding.dst_binding != dst_binding;
            binding.dst_set = dst_set;
            binding.dst_binding = dst_binding;
        }
        changed
    }

    /**
    Writes every destination set and binding into `words`.

    Offsets past the end of `words` are skipped with a warning; nothing outside the buffer
    is ever written.
    */
    pub fn update_module(&self, words: &mut [Word]) {
        let len = words.len();
        for binding in &self.bindings {
            for (offset, value) in binding.patches() {
                match words.get_mut(offset as usize) {
                    Some(word) => *word = value,
                    None => warn_skipped(offset, len),
                }
            }
        }
    }

    /// Like [`update_module`](Self::update_module), for a module in native-endian bytes.
    ///
    /// A trailing partial word is never written.
    pub fn update_module_bytes(&self, bytes: &mut [u8]) {
        const WORD: usize = std::mem::size_of::<Word>();
        let len = bytes.len() / WORD;
        for binding in &self.bindings {
            for (offset, value) in binding.patches() {
                let start = (offset as usize).saturating_mul(WORD);
                match bytes.get_mut(start..start.saturating_add(WORD)) {
                    Some(word) => word.copy_from_slice(&value.to_ne_bytes()),
                    None => warn_skipped(offset, len),
                }
            }
        }
    }
}

fn warn_skipped(offset: u32, len: usize) {
    logwise::warn_sync!(
        "skipping binding patch at word {offset}, module has {len} words",
        offset = offset,
        len = len
    );
}

/**
Builds a layout for `words`, assigns `slots` and patches the module in place.

Returns the number of requests that changed a destination.
*/
pub fn remap_module<R>(
    words: &mut [Word],
    reflector: &R,
    slots: &[BindingSlot],
    dst_set: u32,
    ascending: bool,
) -> Result<u32, LayoutError>
where
    R: BindingReflector + ?Sized,
{
    let mut layout = BindingLayout::from_words(words, reflector)?;
    let changed = layout.assign_binding_slots(slots, dst_set, ascending);
    layout.update_module(words);
    Ok(changed)
}
