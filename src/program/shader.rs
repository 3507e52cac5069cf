// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::fmt::Display;

use crate::bindings::binding_layout::{BindingLayout, LayoutError};
use crate::bindings::visible_to::StageFlags;
use crate::module::SpirvModule;
use crate::program::reflection::ShaderReflection;
use crate::reflect::{BindingReflector, ReflectError, SpirvReflector};

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    /// Hull shader in D3D terms.
    TessControl,
    /// Domain shader in D3D terms.
    TessEvaluation,
    Geometry,
    /// Pixel shader in D3D terms.
    Fragment,
    Compute,
}

impl ShaderStage {
    pub const COUNT: usize = 6;

    /// Every stage, in pipeline order.
    pub const ALL: [ShaderStage; Self::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_graphics(self) -> bool {
        !matches!(self, ShaderStage::Compute)
    }

    pub const fn flag(self) -> StageFlags {
        match self {
            ShaderStage::Vertex => StageFlags::VERTEX,
            ShaderStage::TessControl => StageFlags::TESS_CONTROL,
            ShaderStage::TessEvaluation => StageFlags::TESS_EVALUATION,
            ShaderStage::Geometry => StageFlags::GEOMETRY,
            ShaderStage::Fragment => StageFlags::FRAGMENT,
            ShaderStage::Compute => StageFlags::COMPUTE,
        }
    }
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// The validation log of one shader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    errors: Vec<String>,
}

impl Report {
    pub(crate) fn push(&mut self, error: impl Display) {
        self.errors.push(error.to_string());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

/**
A compiled shader for one stage.

Construction never fails. A module that doesn't validate or can't be reflected produces a
shader whose [`Report`] has errors, and linking a program with that shader fails with
[`LinkError::InvalidByteCode`](crate::program::LinkError::InvalidByteCode).

```
# #[cfg(feature = "testing")]
# {
use shaders_and_bindings::program::{Shader, ShaderStage};
use shaders_and_bindings::testing::ModuleBuilder;

let mut builder = ModuleBuilder::new();
builder.vertex_input("position", 0, 3);
let shader = Shader::from_bytes(ShaderStage::Vertex, "triangle", &builder.build_bytes());
assert!(!shader.has_errors());
assert_eq!(shader.reflection().vertex_inputs.len(), 1);

let broken = Shader::from_bytes(ShaderStage::Vertex, "broken", &[0; 12]);
assert!(broken.has_errors());
# }
```
*/
#[derive(Debug, Clone)]
pub struct Shader {
    stage: ShaderStage,
    debug_name: String,
    module: SpirvModule,
    reflection: ShaderReflection,
    report: Report,
}

impl Shader {
    /// Validates `module` and reflects it with the built-in reflector.
    pub fn new(stage: ShaderStage, debug_name: &str, module: SpirvModule) -> Self {
        let result = SpirvReflector.reflect(module.view(), stage.flag());
        Self::validated(stage, debug_name, module, result)
    }

    pub fn from_bytes(stage: ShaderStage, debug_name: &str, bytes: &[u8]) -> Self {
        Self::new(stage, debug_name, SpirvModule::from_bytes(bytes))
    }

    /**
    Uses reflection obtained elsewhere, such as from the compiler front-end.

    The header is still validated. Resources that don't name any stage are attributed to
    `stage`.
    */
    pub fn with_reflection(
        stage: ShaderStage,
        debug_name: &str,
        module: SpirvModule,
        mut reflection: ShaderReflection,
    ) -> Self {
        for resource in &mut reflection.resources {
            if resource.stages.is_empty() {
                resource.stages = stage.flag();
            }
        }
        let result = module
            .read_header()
            .map(|_| reflection)
            .map_err(ReflectError::from);
        Self::validated(stage, debug_name, module, result)
    }

    fn validated(
        stage: ShaderStage,
        debug_name: &str,
        module: SpirvModule,
        result: Result<ShaderReflection, ReflectError>,
    ) -> Self {
        let mut report = Report::default();
        let mut reflection = match result {
            Ok(reflection) => reflection,
            Err(e) => {
                logwise::warn_sync!(
                    "{stage} shader {name} failed validation: {err}",
                    stage = logwise::privacy::LogIt(&stage),
                    name = logwise::privacy::LogIt(&debug_name),
                    err = logwise::privacy::LogIt(&e)
                );
                report.push(e);
                ShaderReflection::default()
            }
        };
        if stage != ShaderStage::Vertex {
            reflection.vertex_inputs.clear();
        }
        Shader {
            stage,
            debug_name: debug_name.to_string(),
            module,
            reflection,
            report,
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    pub fn module(&self) -> &SpirvModule {
        &self.module
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }

    /// Builds the binding remap table for this shader's module.
    pub fn binding_layout<R>(&self, reflector: &R) -> Result<BindingLayout, LayoutError>
    where
        R: BindingReflector + ?Sized,
    {
        BindingLayout::from_words(self.module.words(), reflector)
    }

    /// A copy of the module with `layout`'s destinations patched in, ready for the backend.
    pub fn remapped_module(&self, layout: &BindingLayout) -> SpirvModule {
        let mut module = self.module.clone();
        layout.update_module(module.words_mut());
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::binding_layout::BindingSlot;
    use crate::bindings::resource_view::ResourceView;
    use crate::bindings::visible_to::ResourceType;
    use crate::module::ModuleError;
    use crate::testing::ModuleBuilder;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn stage_indices_are_dense() {
        for (i, stage) in ShaderStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        let graphics = ShaderStage::ALL.iter().filter(|s| s.is_graphics()).count();
        assert_eq!(graphics, 5);
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");
    }

    #[test]
    fn reflects_on_construction() {
        let mut builder = ModuleBuilder::new();
        builder.uniform_block("Globals", 0, 0);
        builder.vertex_input("position", 0, 3);
        let module = SpirvModule::new(builder.build());

        let vertex = Shader::new(ShaderStage::Vertex, "v", module.clone());
        assert!(!vertex.has_errors());
        assert_eq!(vertex.reflection().resources[0].stages, StageFlags::VERTEX);
        assert_eq!(vertex.reflection().vertex_inputs.len(), 1);

        //inputs of later stages are varyings, not vertex attributes
        let fragment = Shader::new(ShaderStage::Fragment, "f", module);
        assert!(fragment.reflection().vertex_inputs.is_empty());
        assert_eq!(fragment.reflection().resources[0].stages, StageFlags::FRAGMENT);
    }

    #[test]
    fn invalid_modules_are_reported() {
        let shader = Shader::new(ShaderStage::Compute, "c", SpirvModule::new(vec![7; 6]));
        assert!(shader.has_errors());
        assert_eq!(
            shader.report().errors(),
            &[ModuleError::InvalidHeader { found: 7 }.to_string()]
        );
        assert!(shader.report().to_string().contains("magic"));
    }

    #[test]
    fn external_reflection() {
        let module = SpirvModule::new(ModuleBuilder::new().build());
        let reflection = ShaderReflection {
            resources: vec![ResourceView::new(ResourceType::Texture, 3).with_name("t")],
            vertex_inputs: Vec::new(),
        };
        let shader = Shader::with_reflection(ShaderStage::Fragment, "f", module, reflection);
        assert!(!shader.has_errors());
        assert_eq!(shader.reflection().resources[0].stages, StageFlags::FRAGMENT);
    }

    #[test]
    fn remapped_module_leaves_original() {
        let mut builder = ModuleBuilder::new();
        builder.sampler("s", 0, 5);
        let shader = Shader::new(ShaderStage::Fragment, "f", SpirvModule::new(builder.build()));
        let mut layout = shader.binding_layout(&SpirvReflector).unwrap();
        layout.assign_binding_slots(&[BindingSlot::new(0, 5)], 1, true);
        let remapped = shader.remapped_module(&layout);
        assert_ne!(&remapped, shader.module());

        let reflected = SpirvReflector
            .reflect(remapped.view(), StageFlags::FRAGMENT)
            .unwrap();
        assert_eq!((reflected.resources[0].set, reflected.resources[0].slot), (1, 0));
    }
}
