// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::collections::HashMap;
use std::sync::Arc;

use crate::bindings::binding_layout::{BindingSlot, LayoutError};
use crate::bindings::visible_to::{ResourceType, StageFlags};
use crate::imp;
use crate::limits::Limits;
use crate::module::SpirvModule;
use crate::program::reflection::ShaderReflection;
use crate::program::shader::{Shader, ShaderStage};
use crate::program::stage_slots::StageSlots;
use crate::program::vertex_layout::{InputElement, InputLayout, VertexLayout};
use crate::reflect::BindingReflector;

/// Why shaders can't be attached or linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum LinkError {
    /// The stages can't form one pipeline, e.g. compute mixed with graphics.
    #[error("invalid composition of attached shaders")]
    InvalidComposition,
    /// An attached shader failed its own validation.
    #[error("invalid shader byte code")]
    InvalidByteCode,
    /// A shader of the same stage is already attached.
    #[error("too many attachments for one shader stage")]
    TooManyAttachments,
    /// A mandatory stage is missing, e.g. a graphics program without a vertex shader.
    #[error("incomplete attachments")]
    IncompleteAttachments,
    /// The program exceeds the limits or the capabilities of the backend.
    #[error("rejected by the backend")]
    BackendRejected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProgramError {
    #[error("program is not linked")]
    NotLinked,
    #[error("\"{name}\" is not an input of the vertex shader")]
    UnknownAttribute { name: String },
    #[error("{count} vertex attributes exceed the limit of {max}")]
    TooManyAttributes { count: usize, max: u32 },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Where a [`ShaderProgram`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramState {
    Empty,
    Composing,
    Linked,
    LinkFailed(LinkError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SlotOverride {
    resource_type: ResourceType,
    name: String,
    slot: u32,
}

struct LinkFailure {
    error: LinkError,
    log: String,
}

impl LinkFailure {
    fn new(error: LinkError, log: impl Into<String>) -> Self {
        LinkFailure {
            error,
            log: log.into(),
        }
    }
}

/**
Attaches shader stages, validates how they combine, and links them.

```
# #[cfg(feature = "testing")]
# {
use std::sync::Arc;
use shaders_and_bindings::program::{LinkError, ProgramState, Shader, ShaderProgram, ShaderStage};
use shaders_and_bindings::testing::ModuleBuilder;

let mut builder = ModuleBuilder::new();
builder.uniform_block("Globals", 0, 0);
let bytes = builder.build_bytes();

let mut program = ShaderProgram::new();
program.attach_shader(Arc::new(Shader::from_bytes(ShaderStage::Vertex, "v", &bytes))).unwrap();
program.attach_shader(Arc::new(Shader::from_bytes(ShaderStage::Fragment, "f", &bytes))).unwrap();
let compute = Arc::new(Shader::from_bytes(ShaderStage::Compute, "c", &bytes));
assert_eq!(program.attach_shader(compute), Err(LinkError::InvalidComposition));

assert!(program.link_shaders());
assert_eq!(program.state(), ProgramState::Linked);
let reflection = program.query_reflection_descriptor().unwrap();
assert_eq!(reflection.resources.len(), 1);
# }
```
*/
#[derive(Debug)]
pub struct ShaderProgram {
    stages: StageSlots,
    state: ProgramState,
    info_log: String,
    limits: Limits,
    overrides: Vec<SlotOverride>,
    //merged reflection of the stages, before slot overrides
    merged: Option<ShaderReflection>,
    linked: Option<imp::LinkedProgram>,
    input_layout: Option<InputLayout>,
    native_input_layout: Option<imp::NativeInputLayout>,
}

impl Default for ShaderProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderProgram {
    /// An empty program checked against the backend's default limits.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        ShaderProgram {
            stages: StageSlots::default(),
            state: ProgramState::Empty,
            info_log: String::new(),
            limits,
            overrides: Vec::new(),
            merged: None,
            linked: None,
            input_layout: None,
            native_input_layout: None,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn stages(&self) -> &StageSlots {
        &self.stages
    }

    /**
    Attaches `shader` to its stage.

    Fails with [`LinkError::TooManyAttachments`] when the stage is taken and with
    [`LinkError::InvalidComposition`] when compute and graphics stages would mix. A failed
    attach changes nothing. A successful one discards any previous link.
    */
    pub fn attach_shader(&mut self, shader: Arc<Shader>) -> Result<(), LinkError> {
        let stage = shader.stage();
        let result = if self.stages.get(stage).is_some() {
            Err(LinkError::TooManyAttachments)
        } else if self
            .stages
            .iter()
            .any(|s| s.stage().is_graphics() != stage.is_graphics())
        {
            Err(LinkError::InvalidComposition)
        } else {
            Ok(())
        };
        if let Err(e) = result {
            logwise::warn_sync!(
                "can't attach {stage} shader {name}: {err}",
                stage = logwise::privacy::LogIt(&stage),
                name = logwise::privacy::LogIt(&shader.debug_name()),
                err = logwise::privacy::LogIt(&e)
            );
            return Err(e);
        }
        self.stages.insert(shader);
        self.merged = None;
        self.linked = None;
        self.info_log.clear();
        self.state = ProgramState::Composing;
        Ok(())
    }

    /// Detaches every shader and forgets links, overrides and input layouts.
    pub fn detach_all(&mut self) {
        self.stages.clear();
        self.state = ProgramState::Empty;
        self.info_log.clear();
        self.overrides.clear();
        self.merged = None;
        self.linked = None;
        self.input_layout = None;
        self.native_input_layout = None;
    }

    /**
    Links the attached shaders.

    Returns `true` on success. On failure the state records the [`LinkError`] and
    [`query_info_log`](Self::query_info_log) says what went wrong. Reflection stays
    unavailable until a link succeeds.
    */
    pub fn link_shaders(&mut self) -> bool {
        match self.link() {
            Ok((merged, linked)) => {
                logwise::info_sync!(
                    "linked program with {stages} stages and {resources} resources",
                    stages = self.stages.iter().count(),
                    resources = merged.resources.len()
                );
                self.merged = Some(merged);
                self.linked = Some(linked);
                self.info_log.clear();
                self.state = ProgramState::Linked;
                true
            }
            Err(failure) => {
                self.fail(failure);
                false
            }
        }
    }

    fn fail(&mut self, failure: LinkFailure) {
        logwise::error_sync!(
            "link failed: {log}",
            log = logwise::privacy::LogIt(&failure.log)
        );
        self.linked = None;
        self.state = ProgramState::LinkFailed(failure.error);
        self.info_log = failure.log;
    }

    fn link(&self) -> Result<(ShaderReflection, imp::LinkedProgram), LinkFailure> {
        self.validate_composition()?;
        let mut log = String::new();
        for shader in self.stages.iter().filter(|s| s.has_errors()) {
            log.push_str(&format!(
                "{} shader {}: {}",
                shader.stage(),
                shader.debug_name(),
                shader.report()
            ));
        }
        if !log.is_empty() {
            return Err(LinkFailure::new(LinkError::InvalidByteCode, log));
        }

        let mut merged = ShaderReflection::default();
        for shader in self.stages.iter() {
            for view in &shader.reflection().resources {
                merged.merge_resource(view);
            }
        }
        if let Some(vertex) = self.stages.vertex() {
            merged.vertex_inputs = vertex.reflection().vertex_inputs.clone();
        }
        for o in &self.overrides {
            warn_if_unknown(&merged, o);
        }
        let linked = self.finish(&merged)?;
        Ok((merged, linked))
    }

    fn validate_composition(&self) -> Result<(), LinkFailure> {
        let stages = self.stages.stages();
        if stages.is_empty() {
            return Err(LinkFailure::new(
                LinkError::IncompleteAttachments,
                "no shaders attached",
            ));
        }
        if stages.contains(StageFlags::COMPUTE) {
            if stages != StageFlags::COMPUTE {
                return Err(LinkFailure::new(
                    LinkError::InvalidComposition,
                    "compute shaders can't be combined with graphics stages",
                ));
            }
            return Ok(());
        }
        if !stages.contains(StageFlags::VERTEX) {
            return Err(LinkFailure::new(
                LinkError::IncompleteAttachments,
                "graphics program has no vertex shader",
            ));
        }
        let tess_control = stages.contains(StageFlags::TESS_CONTROL);
        if tess_control != stages.contains(StageFlags::TESS_EVALUATION) {
            return Err(LinkFailure::new(
                LinkError::IncompleteAttachments,
                "tessellation needs both a control and an evaluation shader",
            ));
        }
        Ok(())
    }

    //checks that depend on slot overrides, so they rerun when overrides change
    fn finish(&self, merged: &ShaderReflection) -> Result<imp::LinkedProgram, LinkFailure> {
        let moves = self.source_moves(merged)?;
        for view in &merged.resources {
            let Some(slot) = moves.get(&(view.set, view.slot)) else {
                continue;
            };
            if self.override_for(view.resource_type, &view.name).is_none() {
                logwise::warn_sync!(
                    "{name} aliases set {set} binding {binding} and moves to {slot}",
                    name = logwise::privacy::LogIt(&view.name),
                    set = view.set,
                    binding = view.slot,
                    slot = *slot
                );
            }
        }
        let effective = self.effective(merged, &moves);
        for (i, a) in effective.resources.iter().enumerate() {
            for b in &effective.resources[i + 1..] {
                if a.set == b.set && a.slot == b.slot && a.resource_type != b.resource_type {
                    return Err(LinkFailure::new(
                        LinkError::InvalidComposition,
                        format!(
                            "set {} binding {} is declared as both {:?} \"{}\" and {:?} \"{}\"",
                            a.set, a.slot, a.resource_type, a.name, b.resource_type, b.name
                        ),
                    ));
                }
            }
            if a.set >= self.limits.max_descriptor_sets {
                return Err(LinkFailure::new(
                    LinkError::BackendRejected,
                    format!(
                        "\"{}\" uses descriptor set {}, the limit is {} sets",
                        a.name, a.set, self.limits.max_descriptor_sets
                    ),
                ));
            }
            if a.slot >= self.limits.max_bindings_per_set {
                return Err(LinkFailure::new(
                    LinkError::BackendRejected,
                    format!(
                        "\"{}\" uses binding {}, the limit is {} bindings per set",
                        a.name, a.slot, self.limits.max_bindings_per_set
                    ),
                ));
            }
        }
        imp::link(&self.stages, &effective)
            .map_err(|e| LinkFailure::new(LinkError::BackendRejected, e.to_string()))
    }

    /**
    Destination slot for each source `(set, binding)` an override applies to.

    Overrides move bindings, not names: resources aliasing an overridden binding move with
    it. Two overrides pulling one binding to different slots fail the link.
    */
    fn source_moves(
        &self,
        merged: &ShaderReflection,
    ) -> Result<HashMap<(u32, u32), u32>, LinkFailure> {
        let mut moves = HashMap::new();
        for view in &merged.resources {
            let Some(slot) = self.override_for(view.resource_type, &view.name) else {
                continue;
            };
            if let Some(other) = moves.insert((view.set, view.slot), slot)
                && other != slot
            {
                return Err(LinkFailure::new(
                    LinkError::InvalidComposition,
                    format!(
                        "overrides move set {} binding {} to both {} and {}",
                        view.set, view.slot, other, slot
                    ),
                ));
            }
        }
        Ok(moves)
    }

    fn effective(
        &self,
        merged: &ShaderReflection,
        moves: &HashMap<(u32, u32), u32>,
    ) -> ShaderReflection {
        let mut effective = merged.clone();
        for view in &mut effective.resources {
            if let Some(slot) = moves.get(&(view.set, view.slot)) {
                view.slot = *slot;
            }
        }
        effective.finalize();
        effective
    }

    //moves of the current link; a linked program's overrides never conflict
    fn linked_moves(&self) -> Option<(&ShaderReflection, HashMap<(u32, u32), u32>)> {
        match (&self.state, &self.merged) {
            (ProgramState::Linked, Some(merged)) => {
                self.source_moves(merged).ok().map(|moves| (merged, moves))
            }
            _ => None,
        }
    }

    fn override_for(&self, resource_type: ResourceType, name: &str) -> Option<u32> {
        self.overrides
            .iter()
            .find(|o| o.resource_type == resource_type && o.name == name)
            .map(|o| o.slot)
    }

    /// What went wrong in the last link; empty after a successful one.
    pub fn query_info_log(&self) -> &str {
        &self.info_log
    }

    /**
    The merged reflection of all stages, with slot overrides applied.

    Resources are sorted by type, then slot, both descending; see
    [`finalize_resource_views`](crate::program::reflection::finalize_resource_views).
    Vertex inputs come from the vertex stage.
    */
    pub fn query_reflection_descriptor(&self) -> Result<ShaderReflection, ProgramError> {
        let (merged, moves) = self.linked_moves().ok_or(ProgramError::NotLinked)?;
        Ok(self.effective(merged, &moves))
    }

    /// Binds the constant buffer called `name` to `slot` instead of its declared binding.
    pub fn bind_constant_buffer(&mut self, name: &str, slot: u32) {
        self.bind_slot(ResourceType::ConstantBuffer, name, slot);
    }

    /// Binds the storage buffer called `name` to `slot` instead of its declared binding.
    pub fn bind_storage_buffer(&mut self, name: &str, slot: u32) {
        self.bind_slot(ResourceType::StorageBuffer, name, slot);
    }

    fn bind_slot(&mut self, resource_type: ResourceType, name: &str, slot: u32) {
        let new = SlotOverride {
            resource_type,
            name: name.to_string(),
            slot,
        };
        match self
            .overrides
            .iter_mut()
            .find(|o| o.resource_type == resource_type && o.name == name)
        {
            Some(existing) => *existing = new,
            None => self.overrides.push(new),
        }
        //once linked, the program relinks against the new slots
        let Some(merged) = self.merged.as_ref() else {
            return;
        };
        if let Some(o) = self
            .overrides
            .iter()
            .find(|o| o.resource_type == resource_type && o.name == name)
        {
            warn_if_unknown(merged, o);
        }
        match self.finish(merged) {
            Ok(linked) => {
                self.linked = Some(linked);
                self.info_log.clear();
                self.state = ProgramState::Linked;
            }
            Err(failure) => self.fail(failure),
        }
    }

    /// Every slot override, as resource type, name and slot.
    pub fn slot_overrides(&self) -> impl Iterator<Item = (ResourceType, &str, u32)> {
        self.overrides
            .iter()
            .map(|o| (o.resource_type, o.name.as_str(), o.slot))
    }

    /**
    Each stage's module with the slot overrides patched in, in pipeline order.

    The patched modules agree with
    [`query_reflection_descriptor`](Self::query_reflection_descriptor). Bindings without an
    override keep their numbers.
    */
    pub fn remapped_modules<R>(
        &self,
        reflector: &R,
    ) -> Result<Vec<(ShaderStage, SpirvModule)>, ProgramError>
    where
        R: BindingReflector + ?Sized,
    {
        let (_, moves) = self.linked_moves().ok_or(ProgramError::NotLinked)?;
        self.stages
            .iter()
            .map(|shader| {
                let mut layout = shader.binding_layout(reflector)?;
                for (&(set, binding), &slot) in &moves {
                    layout.assign_binding(BindingSlot::new(set, binding), set, slot);
                }
                Ok((shader.stage(), shader.remapped_module(&layout)))
            })
            .collect()
    }

    /**
    Matches vertex buffer layouts, one per buffer slot, against the vertex shader's inputs.

    Does nothing when `layouts` is empty or no valid vertex shader is attached. Fails when
    a field names no vertex input or the attribute count exceeds the limit.
    */
    pub fn build_input_layout(&mut self, layouts: &[VertexLayout]) -> Result<(), ProgramError> {
        let Some(vertex) = self.stages.vertex().filter(|v| !v.has_errors()) else {
            return Ok(());
        };
        if layouts.is_empty() {
            return Ok(());
        }
        let inputs = &vertex.reflection().vertex_inputs;
        let mut layout = InputLayout::default();
        for (buffer_slot, vertex_layout) in layouts.iter().enumerate() {
            let mut offset = 0;
            for field in &vertex_layout.fields {
                let input = inputs.iter().find(|a| a.name == field.name).ok_or_else(|| {
                    ProgramError::UnknownAttribute {
                        name: field.name.clone(),
                    }
                })?;
                if input.field_type.is_some_and(|t| t != field.r#type) {
                    logwise::warn_sync!(
                        "vertex attribute {name} is {declared} in the shader, {given} in layout",
                        name = logwise::privacy::LogIt(&field.name),
                        declared = logwise::privacy::LogIt(&input.field_type),
                        given = logwise::privacy::LogIt(&field.r#type)
                    );
                }
                layout.elements.push(InputElement {
                    name: field.name.clone(),
                    location: input.location,
                    buffer_slot: buffer_slot as u32,
                    offset,
                    field_type: field.r#type,
                });
                offset += field.r#type.stride();
            }
            layout.strides.push(vertex_layout.element_stride());
        }
        let max = self.limits.max_vertex_attributes;
        if layout.elements.len() > max as usize {
            return Err(ProgramError::TooManyAttributes {
                count: layout.elements.len(),
                max,
            });
        }
        self.native_input_layout = Some(imp::input_layout(&layout));
        self.input_layout = Some(layout);
        Ok(())
    }

    pub fn input_layout(&self) -> Option<&InputLayout> {
        self.input_layout.as_ref()
    }

    /// The input layout in the backend's terms.
    pub fn native_input_layout(&self) -> Option<&imp::NativeInputLayout> {
        self.native_input_layout.as_ref()
    }

    /// Backend state of the current link.
    pub fn linked_program(&self) -> Option<&imp::LinkedProgram> {
        self.linked.as_ref()
    }
}

fn warn_if_unknown(merged: &ShaderReflection, o: &SlotOverride) {
    if merged.find_resource(&o.name, o.resource_type).is_none() {
        logwise::warn_sync!(
            "no {kind} named {name} to bind to slot {slot}",
            kind = logwise::privacy::LogIt(&o.resource_type),
            name = logwise::privacy::LogIt(&o.name),
            slot = o.slot
        );
    }
}
