// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::num::NonZero;

use wgpu::{
    BindGroupLayoutEntry, BindingType, BufferBindingType, SamplerBindingType, ShaderStages,
    StorageTextureAccess, TextureFormat, TextureSampleType, TextureViewDimension,
};

use super::Error;
use crate::bindings::resource_view::ResourceView;
use crate::bindings::visible_to::{ResourceType, StageFlags};
use crate::program::ShaderStage;
use crate::program::reflection::ShaderReflection;
use crate::program::stage_slots::StageSlots;

/**
A program linked for wgpu: one list of bind group layout entries per descriptor set.

Entries are sorted by binding. Sets the program doesn't use have an empty list.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedProgram {
    bind_groups: Vec<Vec<BindGroupLayoutEntry>>,
}

impl LinkedProgram {
    pub fn bind_group_count(&self) -> usize {
        self.bind_groups.len()
    }

    /// Entries for `set`, ready for `wgpu::BindGroupLayoutDescriptor`.
    pub fn bind_group_layout_entries(&self, set: u32) -> &[BindGroupLayoutEntry] {
        self.bind_groups
            .get(set as usize)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

pub(crate) fn link(
    stages: &StageSlots,
    reflection: &ShaderReflection,
) -> Result<LinkedProgram, Error> {
    for shader in stages.iter() {
        match shader.stage() {
            ShaderStage::Vertex | ShaderStage::Fragment | ShaderStage::Compute => {}
            stage => return Err(Error::UnsupportedStage(stage)),
        }
    }
    let mut bind_groups: Vec<Vec<BindGroupLayoutEntry>> = Vec::new();
    for view in &reflection.resources {
        let set = view.set as usize;
        if bind_groups.len() <= set {
            bind_groups.resize_with(set + 1, Vec::new);
        }
        let entries = &mut bind_groups[set];
        //views of one binding under different names share an entry
        if let Some(entry) = entries.iter_mut().find(|e| e.binding == view.slot) {
            entry.visibility |= visibility(view.stages);
            continue;
        }
        entries.push(BindGroupLayoutEntry {
            binding: view.slot,
            visibility: visibility(view.stages),
            ty: binding_type(view.resource_type),
            count: count(view)?,
        });
    }
    for entries in &mut bind_groups {
        entries.sort_by_key(|e| e.binding);
    }
    Ok(LinkedProgram { bind_groups })
}

fn visibility(stages: StageFlags) -> ShaderStages {
    let mut visibility = ShaderStages::NONE;
    if stages.contains(StageFlags::VERTEX) {
        visibility |= ShaderStages::VERTEX;
    }
    if stages.contains(StageFlags::FRAGMENT) {
        visibility |= ShaderStages::FRAGMENT;
    }
    if stages.contains(StageFlags::COMPUTE) {
        visibility |= ShaderStages::COMPUTE;
    }
    visibility
}

fn binding_type(resource_type: ResourceType) -> BindingType {
    match resource_type {
        ResourceType::ConstantBuffer => BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        ResourceType::StorageBuffer => BindingType::Buffer {
            ty: BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        ResourceType::Texture => BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        //SPIR-V reflection doesn't tell us the format; this is the one every adapter supports
        ResourceType::StorageTexture => BindingType::StorageTexture {
            access: StorageTextureAccess::WriteOnly,
            format: TextureFormat::Rgba8Unorm,
            view_dimension: TextureViewDimension::D2,
        },
        ResourceType::Sampler => BindingType::Sampler(SamplerBindingType::Filtering),
    }
}

fn count(view: &ResourceView) -> Result<Option<NonZero<u32>>, Error> {
    match view.array_size {
        0 => Err(Error::RuntimeArray {
            set: view.set,
            binding: view.slot,
        }),
        1 => Ok(None), //not array
        n => Ok(NonZero::new(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reflection(resources: Vec<ResourceView>) -> ShaderReflection {
        ShaderReflection {
            resources,
            vertex_inputs: Vec::new(),
        }
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn entries_per_set() {
        let both = StageFlags::VERTEX | StageFlags::FRAGMENT;
        let linked = link(
            &StageSlots::default(),
            &reflection(vec![
                ResourceView::new(ResourceType::Texture, 3)
                    .with_set(1)
                    .with_stages(StageFlags::FRAGMENT),
                ResourceView::new(ResourceType::ConstantBuffer, 0).with_stages(both),
                ResourceView::new(ResourceType::Sampler, 1)
                    .with_set(1)
                    .with_stages(StageFlags::FRAGMENT)
                    .with_array_size(2),
            ]),
        )
        .unwrap();
        assert_eq!(linked.bind_group_count(), 2);
        let set0 = linked.bind_group_layout_entries(0);
        assert_eq!(set0.len(), 1);
        assert_eq!(set0[0].visibility, ShaderStages::VERTEX_FRAGMENT);
        let set1 = linked.bind_group_layout_entries(1);
        assert_eq!(set1.iter().map(|e| e.binding).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(set1[0].count, NonZero::new(2));
        assert!(linked.bind_group_layout_entries(7).is_empty());
    }

    #[test]
    fn runtime_arrays_are_rejected() {
        let result = link(
            &StageSlots::default(),
            &reflection(vec![
                ResourceView::new(ResourceType::Texture, 0).with_array_size(0),
            ]),
        );
        assert_eq!(result, Err(Error::RuntimeArray { set: 0, binding: 0 }));
    }
}
