// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Shader programs.

A [`Shader`] is one compiled stage with its reflection. A [`ShaderProgram`] attaches shaders
to stages, checks that they form a valid pipeline, links them through the active backend, and
answers reflection queries about the result.
*/

pub mod reflection;
pub mod stage_slots;
pub mod vertex_layout;

mod composer;
mod shader;

pub use composer::{LinkError, ProgramError, ProgramState, ShaderProgram};
pub use shader::{Report, Shader, ShaderStage};

pub use crate::imp::{Error as BackendError, LinkedProgram, NativeInputLayout};
