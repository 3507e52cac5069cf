// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Vertex buffer layout descriptions.
//!
//! A [`VertexLayout`] describes one vertex buffer: the attributes each vertex contains,
//! in memory order. A list of layouts, one per buffer slot, is passed to
//! [`ShaderProgram::build_input_layout`](crate::program::ShaderProgram::build_input_layout),
//! which matches every field by name against the inputs the vertex shader declares.
//!
//! # Example
//!
//! ```
//! use shaders_and_bindings::program::vertex_layout::{VertexLayout, VertexFieldType};
//!
//! // position and color, interleaved in one buffer
//! let mut layout = VertexLayout::new();
//! layout.add_field("position", VertexFieldType::F32x3);
//! layout.add_field("color", VertexFieldType::F32x4);
//! assert_eq!(layout.element_stride(), 28);
//! ```

/// Describes the layout of a vertex buffer.
///
/// Fields are tightly packed in the order they are added; the offset of each field is the
/// sum of the sizes of the fields before it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub(crate) fields: Vec<VertexField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VertexField {
    pub(crate) name: String,
    pub(crate) r#type: VertexFieldType,
}

/// Specifies the data type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum VertexFieldType {
    F32,
    F32x2,
    F32x3,
    F32x4,
    U32,
    U32x2,
    U32x3,
    U32x4,
    I32,
    I32x2,
    I32x3,
    I32x4,
}

impl VertexFieldType {
    /// Size of one attribute of this type, in bytes.
    pub fn stride(&self) -> u32 {
        4 * self.components()
    }

    pub fn components(&self) -> u32 {
        match self {
            VertexFieldType::F32 | VertexFieldType::U32 | VertexFieldType::I32 => 1,
            VertexFieldType::F32x2 | VertexFieldType::U32x2 | VertexFieldType::I32x2 => 2,
            VertexFieldType::F32x3 | VertexFieldType::U32x3 | VertexFieldType::I32x3 => 3,
            VertexFieldType::F32x4 | VertexFieldType::U32x4 | VertexFieldType::I32x4 => 4,
        }
    }

    /// The type of `components` 32-bit scalars, if such a type exists.
    pub(crate) fn vector(scalar: ScalarKind, components: u32) -> Option<Self> {
        use VertexFieldType::*;
        Some(match (scalar, components) {
            (ScalarKind::Float, 1) => F32,
            (ScalarKind::Float, 2) => F32x2,
            (ScalarKind::Float, 3) => F32x3,
            (ScalarKind::Float, 4) => F32x4,
            (ScalarKind::Uint, 1) => U32,
            (ScalarKind::Uint, 2) => U32x2,
            (ScalarKind::Uint, 3) => U32x3,
            (ScalarKind::Uint, 4) => U32x4,
            (ScalarKind::Sint, 1) => I32,
            (ScalarKind::Sint, 2) => I32x2,
            (ScalarKind::Sint, 3) => I32x3,
            (ScalarKind::Sint, 4) => I32x4,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Float,
    Uint,
    Sint,
}

impl VertexLayout {
    /// Creates a new, empty vertex layout.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a field to the vertex layout.
    ///
    /// Fields are added in the order they appear in memory. `name` must match the name of
    /// an input declared by the vertex shader.
    pub fn add_field(&mut self, name: impl Into<String>, r#type: VertexFieldType) {
        self.fields.push(VertexField {
            name: name.into(),
            r#type,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of attributes in one vertex.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Size of one vertex, in bytes.
    pub fn element_stride(&self) -> u32 {
        self.fields.iter().map(|e| e.r#type.stride()).sum()
    }
}

/// One attribute of a built input layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputElement {
    pub name: String,
    /// Shader input location the attribute feeds.
    pub location: u32,
    /// Index of the vertex buffer (position in the layout list).
    pub buffer_slot: u32,
    /// Byte offset within one vertex.
    pub offset: u32,
    pub field_type: VertexFieldType,
}

/// The result of matching vertex layouts against the vertex shader's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputLayout {
    pub elements: Vec<InputElement>,
    /// Stride of each vertex buffer, indexed by buffer slot.
    pub strides: Vec<u32>,
}
