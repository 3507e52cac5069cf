// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::program::vertex_layout::{InputLayout, VertexFieldType};

/// An input layout in wgpu terms: attributes grouped by vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeInputLayout {
    buffers: Vec<(u64, Vec<VertexAttribute>)>,
}

impl NativeInputLayout {
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn attributes(&self, buffer_slot: usize) -> &[VertexAttribute] {
        self.buffers
            .get(buffer_slot)
            .map(|(_, attributes)| attributes.as_slice())
            .unwrap_or_default()
    }

    /// Layouts for `wgpu::VertexState::buffers`, one per buffer slot.
    pub fn vertex_buffer_layouts(&self) -> Vec<VertexBufferLayout<'_>> {
        self.buffers
            .iter()
            .map(|(stride, attributes)| VertexBufferLayout {
                array_stride: *stride,
                step_mode: VertexStepMode::Vertex,
                attributes,
            })
            .collect()
    }
}

pub(crate) fn input_layout(layout: &InputLayout) -> NativeInputLayout {
    let mut buffers: Vec<(u64, Vec<VertexAttribute>)> = layout
        .strides
        .iter()
        .map(|stride| (*stride as u64, Vec::new()))
        .collect();
    for element in &layout.elements {
        if let Some((_, attributes)) = buffers.get_mut(element.buffer_slot as usize) {
            attributes.push(VertexAttribute {
                format: format(element.field_type),
                offset: element.offset as u64,
                shader_location: element.location,
            });
        }
    }
    NativeInputLayout { buffers }
}

fn format(field_type: VertexFieldType) -> VertexFormat {
    match field_type {
        VertexFieldType::F32 => VertexFormat::Float32,
        VertexFieldType::F32x2 => VertexFormat::Float32x2,
        VertexFieldType::F32x3 => VertexFormat::Float32x3,
        VertexFieldType::F32x4 => VertexFormat::Float32x4,
        VertexFieldType::U32 => VertexFormat::Uint32,
        VertexFieldType::U32x2 => VertexFormat::Uint32x2,
        VertexFieldType::U32x3 => VertexFormat::Uint32x3,
        VertexFieldType::U32x4 => VertexFormat::Uint32x4,
        VertexFieldType::I32 => VertexFormat::Sint32,
        VertexFieldType::I32x2 => VertexFormat::Sint32x2,
        VertexFieldType::I32x3 => VertexFormat::Sint32x3,
        VertexFieldType::I32x4 => VertexFormat::Sint32x4,
    }
}
