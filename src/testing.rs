// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Hand-assembled SPIR-V fixtures.

[`ModuleBuilder`] writes just enough of a module for reflection and remapping to work on:
names, decorations, types and global variables. Instructions are appended in call order;
no validation is done, so a fixture may be deliberately malformed.

Only compiled with the `testing` feature.

```
# #[cfg(feature = "testing")]
# {
use shaders_and_bindings::testing::ModuleBuilder;
use shaders_and_bindings::module::SpirvModule;

let mut builder = ModuleBuilder::new();
builder.uniform_block("Globals", 0, 1);
let module = SpirvModule::new(builder.build());
assert!(module.read_header().is_ok());
# }
```
*/
use spirv::{Decoration, Op, StorageClass};

use crate::module::{MAGIC_NUMBER, Word};

const VERSION_1_0: Word = 0x0001_0000;

/// Builds SPIR-V modules for tests.
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    words: Vec<Word>,
    next_id: u32,
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBuilder {
    pub fn new() -> Self {
        ModuleBuilder {
            words: vec![MAGIC_NUMBER, VERSION_1_0, 0, 0, 0],
            next_id: 1,
        }
    }

    /// Allocates a fresh result id.
    pub fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Appends a raw instruction and returns the word offset of its leading word.
    pub fn instruction(&mut self, opcode: Op, operands: &[Word]) -> u32 {
        let offset = self.words.len() as u32;
        let word_count = (operands.len() + 1) as u32;
        self.words.push((word_count << 16) | opcode as u32);
        self.words.extend_from_slice(operands);
        offset
    }

    pub fn name(&mut self, target: u32, name: &str) {
        let mut operands = vec![target];
        operands.extend(literal_string(name));
        self.instruction(Op::Name, &operands);
    }

    /// Decorates `target`; returns the word offset of the first literal, if any.
    pub fn decorate(&mut self, target: u32, decoration: Decoration, literals: &[Word]) -> u32 {
        let mut operands = vec![target, decoration as u32];
        operands.extend_from_slice(literals);
        self.instruction(Op::Decorate, &operands) + 3
    }

    pub fn type_float(&mut self, width: u32) -> u32 {
        let id = self.id();
        self.instruction(Op::TypeFloat, &[id, width]);
        id
    }

    pub fn type_int(&mut self, width: u32, signed: bool) -> u32 {
        let id = self.id();
        self.instruction(Op::TypeInt, &[id, width, signed as u32]);
        id
    }

    pub fn type_vector(&mut self, component: u32, count: u32) -> u32 {
        let id = self.id();
        self.instruction(Op::TypeVector, &[id, component, count]);
        id
    }

    /// A 2D image type; `sampled` is 1 for sampled images and 2 for storage images.
    pub fn type_image(&mut self, sampled_type: u32, sampled: u32) -> u32 {
        let id = self.id();
        //dim 2D, no depth, not arrayed, not multisampled, unknown format
        self.instruction(Op::TypeImage, &[id, sampled_type, 1, 0, 0, 0, sampled, 0]);
        id
    }

    pub fn type_sampler(&mut self) -> u32 {
        let id = self.id();
        self.instruction(Op::TypeSampler, &[id]);
        id
    }

    pub fn type_sampled_image(&mut self, image: u32) -> u32 {
        let id = self.id();
        self.instruction(Op::TypeSampledImage, &[id, image]);
        id
    }

    /// A fixed-size array; the length constant is emitted alongside.
    pub fn type_array(&mut self, element: u32, length: u32) -> u32 {
        let uint = self.type_int(32, false);
        let length_id = self.constant(uint, length);
        let id = self.id();
        self.instruction(Op::TypeArray, &[id, element, length_id]);
        id
    }

    pub fn type_runtime_array(&mut self, element: u32) -> u32 {
        let id = self.id();
        self.instruction(Op::TypeRuntimeArray, &[id, element]);
        id
    }

    pub fn type_struct(&mut self, members: &[u32]) -> u32 {
        let id = self.id();
        let mut operands = vec![id];
        operands.extend_from_slice(members);
        self.instruction(Op::TypeStruct, &operands);
        id
    }

    pub fn type_pointer(&mut self, storage_class: StorageClass, pointee: u32) -> u32 {
        let id = self.id();
        self.instruction(Op::TypePointer, &[id, storage_class as u32, pointee]);
        id
    }

    pub fn constant(&mut self, ty: u32, value: u32) -> u32 {
        let id = self.id();
        self.instruction(Op::Constant, &[ty, id, value]);
        id
    }

    pub fn variable(&mut self, pointer_type: u32, storage_class: StorageClass) -> u32 {
        let id = self.id();
        self.instruction(Op::Variable, &[pointer_type, id, storage_class as u32]);
        id
    }

    /// Decorates `variable` with a descriptor set and binding, set first.
    pub fn bind(&mut self, variable: u32, set: u32, binding: u32) {
        self.decorate(variable, Decoration::DescriptorSet, &[set]);
        self.decorate(variable, Decoration::Binding, &[binding]);
    }

    /// A `uniform` block holding one `vec4`; returns the variable id.
    pub fn uniform_block(&mut self, name: &str, set: u32, binding: u32) -> u32 {
        let float = self.type_float(32);
        let vec4 = self.type_vector(float, 4);
        let block = self.type_struct(&[vec4]);
        self.name(block, name);
        self.decorate(block, Decoration::Block, &[]);
        let pointer = self.type_pointer(StorageClass::Uniform, block);
        let variable = self.variable(pointer, StorageClass::Uniform);
        self.bind(variable, set, binding);
        variable
    }

    /// A `buffer` block holding a runtime array of floats; returns the variable id.
    pub fn storage_block(&mut self, name: &str, set: u32, binding: u32) -> u32 {
        let float = self.type_float(32);
        let floats = self.type_runtime_array(float);
        let block = self.type_struct(&[floats]);
        self.name(block, name);
        self.decorate(block, Decoration::Block, &[]);
        let pointer = self.type_pointer(StorageClass::StorageBuffer, block);
        let variable = self.variable(pointer, StorageClass::StorageBuffer);
        self.bind(variable, set, binding);
        variable
    }

    /// A combined image sampler; returns the variable id.
    pub fn texture(&mut self, name: &str, set: u32, binding: u32) -> u32 {
        let float = self.type_float(32);
        let image = self.type_image(float, 1);
        let sampled = self.type_sampled_image(image);
        self.resource(name, sampled, set, binding)
    }

    pub fn storage_texture(&mut self, name: &str, set: u32, binding: u32) -> u32 {
        let float = self.type_float(32);
        let image = self.type_image(float, 2);
        self.resource(name, image, set, binding)
    }

    pub fn sampler(&mut self, name: &str, set: u32, binding: u32) -> u32 {
        let sampler = self.type_sampler();
        self.resource(name, sampler, set, binding)
    }

    /// A named `UniformConstant` variable of type `ty`.
    pub fn resource(&mut self, name: &str, ty: u32, set: u32, binding: u32) -> u32 {
        let pointer = self.type_pointer(StorageClass::UniformConstant, ty);
        let variable = self.variable(pointer, StorageClass::UniformConstant);
        self.name(variable, name);
        self.bind(variable, set, binding);
        variable
    }

    /// A float vector input with `components` components (1 for a scalar).
    pub fn vertex_input(&mut self, name: &str, location: u32, components: u32) -> u32 {
        let float = self.type_float(32);
        let ty = if components == 1 {
            float
        } else {
            self.type_vector(float, components)
        };
        let pointer = self.type_pointer(StorageClass::Input, ty);
        let variable = self.variable(pointer, StorageClass::Input);
        self.name(variable, name);
        self.decorate(variable, Decoration::Location, &[location]);
        variable
    }

    /// Marks the end of the global section with an empty function header.
    pub fn function(&mut self) {
        let id = self.id();
        self.instruction(Op::Function, &[0, id, 0, 0]);
    }

    /// The finished words, with the id bound filled in.
    pub fn build(&self) -> Vec<Word> {
        let mut words = self.words.clone();
        words[3] = self.next_id;
        words
    }

    /// The finished module as native-endian bytes.
    pub fn build_bytes(&self) -> Vec<u8> {
        self.build().iter().flat_map(|w| w.to_ne_bytes()).collect()
    }
}

fn literal_string(s: &str) -> Vec<Word> {
    let mut bytes = s.as_bytes().to_vec();
    //always at least one nul, padded to a whole word
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(4)
        .map(|c| Word::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
