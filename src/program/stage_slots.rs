// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::sync::Arc;

use crate::bindings::visible_to::StageFlags;
use crate::program::shader::{Shader, ShaderStage};

/// One optional shader per stage, indexed by [`ShaderStage`].
#[derive(Debug, Clone, Default)]
pub struct StageSlots {
    slots: [Option<Arc<Shader>>; ShaderStage::COUNT],
}

impl StageSlots {
    pub fn get(&self, stage: ShaderStage) -> Option<&Arc<Shader>> {
        self.slots[stage.index()].as_ref()
    }

    /// Puts `shader` in its stage's slot, returning the shader it replaces.
    pub(crate) fn insert(&mut self, shader: Arc<Shader>) -> Option<Arc<Shader>> {
        let index = shader.stage().index();
        self.slots[index].replace(shader)
    }

    pub(crate) fn clear(&mut self) {
        self.slots = Default::default();
    }

    pub fn vertex(&self) -> Option<&Arc<Shader>> {
        self.get(ShaderStage::Vertex)
    }

    pub fn tess_control(&self) -> Option<&Arc<Shader>> {
        self.get(ShaderStage::TessControl)
    }

    pub fn tess_evaluation(&self) -> Option<&Arc<Shader>> {
        self.get(ShaderStage::TessEvaluation)
    }

    pub fn geometry(&self) -> Option<&Arc<Shader>> {
        self.get(ShaderStage::Geometry)
    }

    pub fn fragment(&self) -> Option<&Arc<Shader>> {
        self.get(ShaderStage::Fragment)
    }

    pub fn compute(&self) -> Option<&Arc<Shader>> {
        self.get(ShaderStage::Compute)
    }

    /// Attached shaders in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Shader>> {
        self.slots.iter().flatten()
    }

    /// The set of occupied stages.
    pub fn stages(&self) -> StageFlags {
        self.iter()
            .fold(StageFlags::empty(), |acc, s| acc | s.stage().flag())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
