// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::collections::{BTreeMap, HashMap, HashSet};

use spirv::{Decoration, Op, StorageClass};

use super::{BindingPoint, BindingReflector, ReflectError};
use crate::bindings::resource_view::ResourceView;
use crate::bindings::visible_to::{ResourceType, StageFlags};
use crate::module::{Instruction, SpirvModuleView, Word};
use crate::program::reflection::{InputAttribute, ShaderReflection};
use crate::program::vertex_layout::{ScalarKind, VertexFieldType};

/// `Sampled` operand of `OpTypeImage` for images used without a sampler.
const SAMPLED_STORAGE: u32 = 2;

/**
Reflects SPIR-V modules by scanning their words.

Only the global section is read: the scan stops at the first `OpFunction`. Besides the
binding points needed for remapping, [`SpirvReflector::reflect`] classifies each bound
variable into a [`ResourceView`] and collects the vertex inputs.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpirvReflector;

impl SpirvReflector {
    /// Resources and vertex inputs of a module, attributed to `stages`.
    ///
    /// Resources come out in declaration order and vertex inputs in location order.
    /// Push constants have no binding and are not reported.
    pub fn reflect(
        &self,
        module: SpirvModuleView<'_>,
        stages: StageFlags,
    ) -> Result<ShaderReflection, ReflectError> {
        let scan = Scan::run(module)?;
        let mut reflection = ShaderReflection::default();
        for variable in &scan.variables {
            if let Some(view) = scan.resource_view(variable) {
                reflection.resources.push(view.with_stages(stages));
            }
            if let Some(input) = scan.input_attribute(variable) {
                reflection.vertex_inputs.push(input);
            }
        }
        reflection.vertex_inputs.sort_by_key(|a| a.location);
        Ok(reflection)
    }
}

impl BindingReflector for SpirvReflector {
    fn reflect_binding_points(
        &self,
        module: SpirvModuleView<'_>,
    ) -> Result<Vec<BindingPoint>, ReflectError> {
        let scan = Scan::run(module)?;
        Ok(scan
            .bindings
            .iter()
            .filter_map(|(id, binding)| {
                let set = scan.sets.get(id)?;
                Some(BindingPoint {
                    set: set.value,
                    binding: binding.value,
                    set_word_offset: set.offset,
                    binding_word_offset: binding.offset,
                })
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy)]
struct Literal {
    value: Word,
    offset: u32,
}

#[derive(Debug, Clone, Copy)]
enum Type {
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { component: u32, count: u32 },
    Image { sampled: u32 },
    Sampler,
    SampledImage,
    Array { element: u32, length: u32 },
    RuntimeArray { element: u32 },
    Struct,
    Pointer { pointee: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Variable {
    id: u32,
    pointer: u32,
    storage: StorageClass,
}

#[derive(Debug, Default)]
struct Scan {
    names: HashMap<u32, String>,
    //ordered by id, which orders the binding points
    sets: BTreeMap<u32, Literal>,
    bindings: BTreeMap<u32, Literal>,
    locations: HashMap<u32, u32>,
    built_ins: HashSet<u32>,
    buffer_blocks: HashSet<u32>,
    types: HashMap<u32, Type>,
    constants: HashMap<u32, Word>,
    variables: Vec<Variable>,
}

impl Scan {
    fn run(module: SpirvModuleView<'_>) -> Result<Self, ReflectError> {
        module.read_header()?;
        let mut scan = Scan::default();
        for instruction in module.instructions() {
            let instruction = instruction?;
            let Some(opcode) = instruction.op() else {
                continue;
            };
            if opcode == Op::Function {
                break;
            }
            scan.visit(opcode, &instruction);
        }
        Ok(scan)
    }

    //instructions missing their operands are ignored
    fn visit(&mut self, opcode: Op, i: &Instruction<'_>) {
        let o = |index| i.operand(index);
        match opcode {
            Op::Name => {
                if let (Some(target), Some(name)) = (o(0), i.literal_string(1)) {
                    self.names.insert(target, name);
                }
            }
            Op::Decorate => self.decorate(i),
            Op::TypeInt => {
                if let (Some(id), Some(width), Some(signed)) = (o(0), o(1), o(2)) {
                    let signed = signed != 0;
                    self.types.insert(id, Type::Int { width, signed });
                }
            }
            Op::TypeFloat => {
                if let (Some(id), Some(width)) = (o(0), o(1)) {
                    self.types.insert(id, Type::Float { width });
                }
            }
            Op::TypeVector => {
                if let (Some(id), Some(component), Some(count)) = (o(0), o(1), o(2)) {
                    self.types.insert(id, Type::Vector { component, count });
                }
            }
            Op::TypeImage => {
                if let (Some(id), Some(sampled)) = (o(0), o(6)) {
                    self.types.insert(id, Type::Image { sampled });
                }
            }
            Op::TypeSampler => {
                if let Some(id) = o(0) {
                    self.types.insert(id, Type::Sampler);
                }
            }
            Op::TypeSampledImage => {
                if let Some(id) = o(0) {
                    self.types.insert(id, Type::SampledImage);
                }
            }
            Op::TypeArray => {
                if let (Some(id), Some(element), Some(length)) = (o(0), o(1), o(2)) {
                    self.types.insert(id, Type::Array { element, length });
                }
            }
            Op::TypeRuntimeArray => {
                if let (Some(id), Some(element)) = (o(0), o(1)) {
                    self.types.insert(id, Type::RuntimeArray { element });
                }
            }
            Op::TypeStruct => {
                if let Some(id) = o(0) {
                    self.types.insert(id, Type::Struct);
                }
            }
            Op::TypePointer => {
                if let (Some(id), Some(pointee)) = (o(0), o(2)) {
                    self.types.insert(id, Type::Pointer { pointee });
                }
            }
            Op::Constant => {
                if let (Some(id), Some(value)) = (o(1), o(2)) {
                    self.constants.insert(id, value);
                }
            }
            Op::Variable => {
                let storage = o(2).and_then(StorageClass::from_u32);
                if let (Some(pointer), Some(id), Some(storage)) = (o(0), o(1), storage) {
                    self.variables.push(Variable {
                        id,
                        pointer,
                        storage,
                    });
                }
            }
            _ => {}
        }
    }

    fn decorate(&mut self, i: &Instruction<'_>) {
        let kind = i.operand(1).and_then(Decoration::from_u32);
        let (Some(target), Some(kind)) = (i.operand(0), kind) else {
            return;
        };
        let literal = i.operand(2).map(|value| Literal {
            value,
            offset: i.operand_offset(2),
        });
        match (kind, literal) {
            (Decoration::DescriptorSet, Some(literal)) => {
                self.sets.insert(target, literal);
            }
            (Decoration::Binding, Some(literal)) => {
                self.bindings.insert(target, literal);
            }
            (Decoration::Location, Some(literal)) => {
                self.locations.insert(target, literal.value);
            }
            (Decoration::BuiltIn, _) => {
                self.built_ins.insert(target);
            }
            (Decoration::BufferBlock, _) => {
                self.buffer_blocks.insert(target);
            }
            _ => {}
        }
    }

    fn pointee(&self, variable: &Variable) -> Option<u32> {
        match self.types.get(&variable.pointer)? {
            Type::Pointer { pointee } => Some(*pointee),
            _ => None,
        }
    }

    fn resource_view(&self, variable: &Variable) -> Option<ResourceView> {
        let set = self.sets.get(&variable.id)?.value;
        let slot = self.bindings.get(&variable.id)?.value;
        let mut ty = self.pointee(variable)?;
        let mut array_size = 1;
        //arrays of resources bind as one descriptor with a count
        loop {
            match self.types.get(&ty)? {
                Type::Array { element, length } => {
                    array_size = self.constants.get(length).copied().unwrap_or(1);
                    ty = *element;
                }
                Type::RuntimeArray { element } => {
                    array_size = 0;
                    ty = *element;
                }
                _ => break,
            }
        }
        let resource_type = match (variable.storage, self.types.get(&ty)?) {
            (StorageClass::Uniform, Type::Struct) if self.buffer_blocks.contains(&ty) => {
                ResourceType::StorageBuffer
            }
            (StorageClass::Uniform, Type::Struct) => ResourceType::ConstantBuffer,
            (StorageClass::StorageBuffer, Type::Struct) => ResourceType::StorageBuffer,
            (StorageClass::UniformConstant, Type::Image { sampled })
                if *sampled == SAMPLED_STORAGE =>
            {
                ResourceType::StorageTexture
            }
            (StorageClass::UniformConstant, Type::Image { .. } | Type::SampledImage) => {
                ResourceType::Texture
            }
            (StorageClass::UniformConstant, Type::Sampler) => ResourceType::Sampler,
            _ => return None,
        };
        let name = self
            .names
            .get(&variable.id)
            .filter(|n| !n.is_empty())
            .or_else(|| self.names.get(&ty))
            .cloned()
            .unwrap_or_default();
        Some(
            ResourceView::new(resource_type, slot)
                .with_name(name)
                .with_set(set)
                .with_array_size(array_size),
        )
    }

    fn input_attribute(&self, variable: &Variable) -> Option<InputAttribute> {
        if variable.storage != StorageClass::Input || self.built_ins.contains(&variable.id) {
            return None;
        }
        let location = *self.locations.get(&variable.id)?;
        let field_type = self.pointee(variable).and_then(|ty| self.field_type(ty));
        Some(InputAttribute {
            name: self.names.get(&variable.id).cloned().unwrap_or_default(),
            location,
            field_type,
        })
    }

    fn field_type(&self, ty: u32) -> Option<VertexFieldType> {
        match *self.types.get(&ty)? {
            Type::Vector { component, count } => {
                VertexFieldType::vector(self.scalar(component)?, count)
            }
            _ => VertexFieldType::vector(self.scalar(ty)?, 1),
        }
    }

    fn scalar(&self, ty: u32) -> Option<ScalarKind> {
        match *self.types.get(&ty)? {
            Type::Float { width: 32 } => Some(ScalarKind::Float),
            Type::Int {
                width: 32,
                signed: true,
            } => Some(ScalarKind::Sint),
            Type::Int {
                width: 32,
                signed: false,
            } => Some(ScalarKind::Uint),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleError, SpirvModule};
    use crate::testing::ModuleBuilder;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn binding_points_point_at_literals() {
        let mut builder = ModuleBuilder::new();
        builder.uniform_block("Globals", 0, 3);
        builder.texture("albedo", 1, 7);
        let words = builder.build();
        let points = SpirvReflector
            .reflect_binding_points(SpirvModuleView::new(&words))
            .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].set, points[0].binding), (0, 3));
        assert_eq!((points[1].set, points[1].binding), (1, 7));
        for point in &points {
            assert_eq!(words[point.set_word_offset as usize], point.set);
            assert_eq!(words[point.binding_word_offset as usize], point.binding);
        }
    }

    #[test]
    fn half_decorated_targets_are_ignored() {
        let mut builder = ModuleBuilder::new();
        let sampler = builder.type_sampler();
        builder.decorate(sampler, Decoration::Binding, &[2]);
        let words = builder.build();
        let points = SpirvReflector
            .reflect_binding_points(SpirvModuleView::new(&words))
            .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn scan_stops_at_first_function() {
        let mut builder = ModuleBuilder::new();
        builder.sampler("s", 0, 0);
        builder.function();
        //garbage after the global section is never parsed
        builder.instruction(Op::Nop, &[]);
        let words = builder.build();
        let points = SpirvReflector
            .reflect_binding_points(SpirvModuleView::new(&words))
            .unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn malformed_modules_fail() {
        let module = SpirvModule::new(vec![0; 3]);
        assert_eq!(
            SpirvReflector.reflect_binding_points(module.view()),
            Err(ReflectError::Module(ModuleError::InvalidModule {
                word_count: 3
            }))
        );

        let mut words = ModuleBuilder::new().build();
        words.push((9 << 16) | Op::Decorate as u32);
        assert!(matches!(
            SpirvReflector.reflect_binding_points(SpirvModuleView::new(&words)),
            Err(ReflectError::Module(ModuleError::MalformedInstruction { .. }))
        ));
    }

    #[test]
    fn classifies_resources() {
        let mut builder = ModuleBuilder::new();
        builder.uniform_block("Globals", 0, 0);
        builder.storage_block("Particles", 0, 1);
        builder.texture("albedo", 1, 0);
        builder.storage_texture("target", 1, 1);
        builder.sampler("linear", 1, 2);
        let words = builder.build();
        let reflection = SpirvReflector
            .reflect(SpirvModuleView::new(&words), StageFlags::FRAGMENT)
            .unwrap();
        let kinds: Vec<_> = reflection
            .resources
            .iter()
            .map(|r| (r.name.as_str(), r.resource_type, r.set, r.slot))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("Globals", ResourceType::ConstantBuffer, 0, 0),
                ("Particles", ResourceType::StorageBuffer, 0, 1),
                ("albedo", ResourceType::Texture, 1, 0),
                ("target", ResourceType::StorageTexture, 1, 1),
                ("linear", ResourceType::Sampler, 1, 2),
            ]
        );
        assert!(
            reflection
                .resources
                .iter()
                .all(|r| r.stages == StageFlags::FRAGMENT && r.array_size == 1)
        );
        assert!(reflection.vertex_inputs.is_empty());
    }

    #[test]
    fn legacy_buffer_blocks_and_arrays() {
        let mut builder = ModuleBuilder::new();
        let float = builder.type_float(32);
        let block = builder.type_struct(&[float]);
        builder.decorate(block, Decoration::BufferBlock, &[]);
        let pointer = builder.type_pointer(StorageClass::Uniform, block);
        let legacy = builder.variable(pointer, StorageClass::Uniform);
        builder.name(legacy, "legacy");
        builder.bind(legacy, 0, 0);

        let sampler = builder.type_sampler();
        let samplers = builder.type_array(sampler, 4);
        builder.resource("samplers", samplers, 0, 1);

        let image = builder.type_image(float, 1);
        let images = builder.type_runtime_array(image);
        builder.resource("bindless", images, 0, 2);

        let words = builder.build();
        let reflection = SpirvReflector
            .reflect(SpirvModuleView::new(&words), StageFlags::COMPUTE)
            .unwrap();
        let legacy = &reflection.resources[0];
        assert_eq!(legacy.resource_type, ResourceType::StorageBuffer);
        let samplers = &reflection.resources[1];
        assert_eq!(samplers.resource_type, ResourceType::Sampler);
        assert_eq!(samplers.array_size, 4);
        let bindless = &reflection.resources[2];
        assert_eq!(bindless.resource_type, ResourceType::Texture);
        assert_eq!(bindless.array_size, 0);
    }

    #[test]
    fn push_constants_are_not_resources() {
        let mut builder = ModuleBuilder::new();
        let float = builder.type_float(32);
        let block = builder.type_struct(&[float]);
        builder.decorate(block, Decoration::Block, &[]);
        let pointer = builder.type_pointer(StorageClass::PushConstant, block);
        builder.variable(pointer, StorageClass::PushConstant);
        let words = builder.build();
        let reflection = SpirvReflector
            .reflect(SpirvModuleView::new(&words), StageFlags::VERTEX)
            .unwrap();
        assert!(reflection.resources.is_empty());
    }

    #[test]
    fn vertex_inputs() {
        let mut builder = ModuleBuilder::new();
        builder.vertex_input("color", 1, 4);
        builder.vertex_input("position", 0, 3);
        builder.vertex_input("weight", 2, 1);
        let index = builder.vertex_input("gl_VertexIndex", 9, 1);
        builder.decorate(index, Decoration::BuiltIn, &[42]);
        let int = builder.type_int(32, true);
        let pointer = builder.type_pointer(StorageClass::Input, int);
        let id = builder.variable(pointer, StorageClass::Input);
        builder.name(id, "id");
        builder.decorate(id, Decoration::Location, &[3]);
        let words = builder.build();

        let reflection = SpirvReflector
            .reflect(SpirvModuleView::new(&words), StageFlags::VERTEX)
            .unwrap();
        let inputs: Vec<_> = reflection
            .vertex_inputs
            .iter()
            .map(|a| (a.name.as_str(), a.location, a.field_type))
            .collect();
        assert_eq!(
            inputs,
            vec![
                ("position", 0, Some(VertexFieldType::F32x3)),
                ("color", 1, Some(VertexFieldType::F32x4)),
                ("weight", 2, Some(VertexFieldType::F32)),
                ("id", 3, Some(VertexFieldType::I32)),
            ]
        );
    }

    #[test]
    fn block_name_is_the_fallback() {
        let mut builder = ModuleBuilder::new();
        let globals = builder.uniform_block("Globals", 0, 0);
        builder.name(globals, "");
        let words = builder.build();
        let reflection = SpirvReflector
            .reflect(SpirvModuleView::new(&words), StageFlags::VERTEX)
            .unwrap();
        assert_eq!(reflection.resources[0].name, "Globals");
    }
}
