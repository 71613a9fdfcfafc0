mod common;
mod gpu;
mod shader;

pub use common::{
    object_model_matrix, CameraParams, GlobalUniform, ObjectConstants, SpotUniform,
    MAX_SPOT_LIGHTS,
};
pub use gpu::{RenderError, Renderer};
