// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
mod bind_group;
mod error;
mod vertex;

pub use bind_group::LinkedProgram;
pub(crate) use bind_group::link;
pub use error::Error;
pub use vertex::NativeInputLayout;
pub(crate) use vertex::input_layout;

use crate::limits::Limits;

pub(crate) fn default_limits() -> Limits {
    let limits = wgpu::Limits::default();
    Limits {
        max_descriptor_sets: limits.max_bind_groups,
        max_bindings_per_set: limits.max_bindings_per_bind_group,
        max_vertex_attributes: limits.max_vertex_attributes,
    }
}
