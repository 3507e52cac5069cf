// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! A backend that accepts every composition the generic checks let through.
use crate::limits::Limits;
use crate::program::reflection::ShaderReflection;
use crate::program::stage_slots::StageSlots;
use crate::program::vertex_layout::InputLayout;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("the nop backend can't link programs")]
pub struct Error;

pub(crate) fn default_limits() -> Limits {
    Limits {
        max_descriptor_sets: 4,
        max_bindings_per_set: 1000,
        max_vertex_attributes: 16,
    }
}

/// Backend state of a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedProgram {
    bind_group_count: usize,
}

impl LinkedProgram {
    pub fn bind_group_count(&self) -> usize {
        self.bind_group_count
    }
}

pub(crate) fn link(
    _stages: &StageSlots,
    reflection: &ShaderReflection,
) -> Result<LinkedProgram, Error> {
    let bind_group_count = reflection
        .resources
        .iter()
        .map(|r| r.set as usize + 1)
        .max()
        .unwrap_or(0);
    Ok(LinkedProgram { bind_group_count })
}

/// Backend form of an input layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeInputLayout {
    buffer_count: usize,
}

impl NativeInputLayout {
    pub fn buffer_count(&self) -> usize {
        self.buffer_count
    }
}

pub(crate) fn input_layout(layout: &InputLayout) -> NativeInputLayout {
    NativeInputLayout {
        buffer_count: layout.strides.len(),
    }
}
