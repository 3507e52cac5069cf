// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Resource kinds and stage visibility.
//!
//! These types describe what a shader resource is and which pipeline stages read it.
//! Backends use them to pick a binding type and a visibility mask for each entry of their
//! descriptor layout.
//!
//! # Examples
//!
//! ```
//! use shaders_and_bindings::bindings::visible_to::{ResourceType, StageFlags};
//!
//! // A uniform block read by both graphics stages
//! let kind = ResourceType::ConstantBuffer;
//! let stages = StageFlags::VERTEX | StageFlags::FRAGMENT;
//! assert!(stages.contains(StageFlags::FRAGMENT));
//! assert!(kind > ResourceType::Texture);
//! ```

/// The kind of a shader resource.
///
/// The ordering of this enum is load-bearing: reflection output is sorted by resource type in
/// *descending* order, so `ConstantBuffer` sorts first and `Sampler` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ResourceType {
    /// A sampler object, without an image.
    Sampler,
    /// A sampled image, or an image combined with its sampler.
    Texture,
    /// An image read or written without a sampler.
    StorageTexture,
    /// A read-write buffer block.
    StorageBuffer,
    /// A read-only uniform block.
    ConstantBuffer,
}

bitflags::bitflags! {
    /// Set of pipeline stages that access a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StageFlags: u32 {
        const VERTEX = 1 << 0;
        const TESS_CONTROL = 1 << 1;
        const TESS_EVALUATION = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::TESS_CONTROL.bits()
            | Self::TESS_EVALUATION.bits()
            | Self::GEOMETRY.bits()
            | Self::FRAGMENT.bits();
    }
}
