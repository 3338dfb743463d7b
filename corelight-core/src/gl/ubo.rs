use glow::HasContext;

use crate::{
    error::Error,
    gl::{GpuRegistry, ShaderProgram, buffer_upload_struct},
    scene::Scene,
};

#[derive(Debug)]
pub(crate) struct UniformBufferObject {
    buffer: glow::Buffer,
    binding_point: u32,
}

impl UniformBufferObject {
    pub fn new(gl: &glow::Context, registry: &mut GpuRegistry, binding_point: u32) -> Result<Self, Error> {
        let buffer = registry.create_buffer(gl, "ubo")?;
        Ok(Self { buffer, binding_point })
    }

    pub fn bind(&self, gl: &glow::Context) {
        unsafe { gl.bind_buffer(glow::UNIFORM_BUFFER, Some(self.buffer)) };
    }

    pub fn unbind(&self, gl: &glow::Context) {
        unsafe { gl.bind_buffer(glow::UNIFORM_BUFFER, None) };
    }

    /// Connects the named uniform block of `shader` to this buffer's binding point.
    pub(crate) fn bind_to_shader(
        &self,
        gl: &glow::Context,
        shader: &ShaderProgram,
        block_name: &'static str,
    ) -> Result<(), Error> {
        let block_index = unsafe { gl.get_uniform_block_index(shader.program, block_name) }
            .ok_or(Error::uniform_location_failed(block_name))?;

        unsafe {
            gl.uniform_block_binding(shader.program, block_index, self.binding_point);
            gl.bind_buffer_base(glow::UNIFORM_BUFFER, self.binding_point, Some(self.buffer));
        }

        Ok(())
    }

    pub fn upload_data<T: Copy>(&self, gl: &glow::Context, data: &T) {
        self.bind(gl);
        buffer_upload_struct(gl, glow::UNIFORM_BUFFER, data, glow::DYNAMIC_DRAW);
        self.unbind(gl);
    }
}

/// Light rig shared by every lit program, laid out for `layout(std140)`.
///
/// Colors are premultiplied by intensity; point light parameters hold
/// `(cutoff distance, decay, 0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(16))]
pub(crate) struct LightsUbo {
    pub ambient: [f32; 4],
    pub directional_color: [f32; 4],
    pub directional_dir: [f32; 4],
    pub point_position: [[f32; 4]; 2],
    pub point_color: [[f32; 4]; 2],
    pub point_params: [[f32; 4]; 2],
    pub camera_position: [f32; 4],
}

impl LightsUbo {
    pub const BINDING_POINT: u32 = 0;
    pub const BLOCK_NAME: &'static str = "Lights";

    pub(crate) fn from_scene(scene: &Scene) -> Self {
        let lights = &scene.lights;
        let scaled = |c: [f32; 3], i: f32| [c[0] * i, c[1] * i, c[2] * i, 0.0];
        let [core_pos, rim_pos] = scene.point_light_positions();
        let dir = lights.directional.position.normalize_or_zero();

        Self {
            ambient: scaled(lights.ambient_color, lights.ambient_intensity),
            directional_color: scaled(lights.directional.color, lights.directional.intensity),
            directional_dir: dir.extend(0.0).to_array(),
            point_position: [core_pos.extend(1.0).to_array(), rim_pos.extend(1.0).to_array()],
            point_color: [
                scaled(lights.core.color, lights.core.intensity),
                scaled(lights.rim.color, lights.rim.intensity),
            ],
            point_params: [
                [lights.core.distance, lights.core.decay, 0.0, 0.0],
                [lights.rim.distance, lights.rim.decay, 0.0, 0.0],
            ],
            camera_position: scene.camera.position.extend(1.0).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BackdropConfig, random::ScriptedRandom};

    #[test]
    fn test_std140_size() {
        // 10 vec4 slots
        assert_eq!(size_of::<LightsUbo>(), 160);
    }

    #[test]
    fn test_lights_follow_focal_group() {
        let mut config = BackdropConfig::default();
        config.stars.count = 0;
        let mut scene = Scene::new(&config, 1.0, &mut ScriptedRandom::constant(0.0));
        scene.focal = glam::Vec3::new(1.0, 2.0, 3.0);

        let ubo = LightsUbo::from_scene(&scene);
        assert_eq!(ubo.point_position[0], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(ubo.point_position[1], [1.0, 2.0, -37.0, 1.0]);
        assert_eq!(ubo.point_params[1], [260.0, 2.2, 0.0, 0.0]);
        assert!((ubo.ambient[0] - 0.08).abs() < 1e-6);
    }
}
