//! Base pass: draws the scene graph into an offscreen color + depth target.

use glow::HasContext;

use crate::{
    GlslVersion,
    config::BackdropConfig,
    error::Error,
    gl::{
        Drawable, GlState, GpuRegistry, RenderContext, RenderFlags, ShaderProgram,
        mesh::{Mesh, PointCloud},
        target::RenderTarget,
        texture::{HudRaster, HudTexture},
        ubo::{LightsUbo, UniformBufferObject},
    },
    scene::{Material, Scene, geometry},
    sim::Particle,
};

// 1000 periods of the 0.002 rad/ms blink
const STAR_TIME_WRAP_MS: f64 = 1000.0 * std::f64::consts::TAU / 0.002;

/// Background starfield, drawn in view space so it never parallaxes.
#[derive(Debug)]
struct StarfieldDrawable {
    shader: ShaderProgram,
    u_projection: Option<glow::UniformLocation>,
    u_time: Option<glow::UniformLocation>,
    u_pixel_ratio: Option<glow::UniformLocation>,
    points: PointCloud,
}

impl StarfieldDrawable {
    const VERTEX_GLSL: &'static str = include_str!("../shaders/star.vert");
    const FRAGMENT_GLSL: &'static str = include_str!("../shaders/star.frag");

    fn new(gl: &glow::Context, registry: &mut GpuRegistry, glsl: GlslVersion, scene: &Scene) -> Result<Self, Error> {
        let shader = ShaderProgram::create(gl, registry, glsl, Self::VERTEX_GLSL, Self::FRAGMENT_GLSL)?;
        let stars: Vec<[f32; 4]> = scene
            .stars()
            .iter()
            .map(|s| s.position.extend(s.phase).to_array())
            .collect();

        Ok(Self {
            u_projection: shader.uniform(gl, "u_projection"),
            u_time: shader.uniform(gl, "u_time"),
            u_pixel_ratio: shader.uniform(gl, "u_pixel_ratio"),
            points: PointCloud::new_static(gl, registry, &stars)?,
            shader,
        })
    }
}

impl Drawable for StarfieldDrawable {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        let gl = context.gl;
        context.state
            .flags(gl, RenderFlags::ADDITIVE)
            .blend_func(gl, glow::SRC_ALPHA, glow::ONE);

        self.shader.use_program(gl);
        let projection = context.scene.camera.projection();
        unsafe {
            gl.uniform_matrix_4_f32_slice(self.u_projection.as_ref(), false, &projection.to_cols_array());
            // wrapped at a whole number of blink periods so f32 keeps its precision
            gl.uniform_1_f32(self.u_time.as_ref(), (context.scene.time_ms % STAR_TIME_WRAP_MS) as f32);
            gl.uniform_1_f32(self.u_pixel_ratio.as_ref(), context.pixel_ratio);
        }
        Ok(())
    }

    fn draw(&self, context: &mut RenderContext) {
        self.points.draw(context.gl);
    }

    fn cleanup(&self, context: &mut RenderContext) {
        unsafe { context.gl.use_program(None) };
    }
}

/// Uniform locations of the lit-surface program.
#[derive(Debug)]
struct LitUniforms {
    model: Option<glow::UniformLocation>,
    view_projection: Option<glow::UniformLocation>,
    base_color: Option<glow::UniformLocation>,
    emissive: Option<glow::UniformLocation>,
    emissive_intensity: Option<glow::UniformLocation>,
    roughness: Option<glow::UniformLocation>,
    metalness: Option<glow::UniformLocation>,
}

/// The core sphere and the optional orbiting cube, sharing one lit program.
#[derive(Debug)]
struct SolidsDrawable {
    shader: ShaderProgram,
    uniforms: LitUniforms,
    lights: UniformBufferObject,
    core: Mesh,
    orbiter: Option<Mesh>,
}

impl SolidsDrawable {
    const VERTEX_GLSL: &'static str = include_str!("../shaders/lit.vert");
    const FRAGMENT_GLSL: &'static str = include_str!("../shaders/lit.frag");

    fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        config: &BackdropConfig,
    ) -> Result<Self, Error> {
        let shader = ShaderProgram::create(gl, registry, glsl, Self::VERTEX_GLSL, Self::FRAGMENT_GLSL)?;
        let lights = UniformBufferObject::new(gl, registry, LightsUbo::BINDING_POINT)?;
        lights.bind_to_shader(gl, &shader, LightsUbo::BLOCK_NAME)?;

        let uniforms = LitUniforms {
            model: shader.uniform(gl, "u_model"),
            view_projection: shader.uniform(gl, "u_view_projection"),
            base_color: shader.uniform(gl, "u_base_color"),
            emissive: shader.uniform(gl, "u_emissive"),
            emissive_intensity: shader.uniform(gl, "u_emissive_intensity"),
            roughness: shader.uniform(gl, "u_roughness"),
            metalness: shader.uniform(gl, "u_metalness"),
        };

        let core = Mesh::new(gl, registry, &geometry::sphere(config.core.core_radius, config.core.segments))?;
        let orbiter = if config.orbiter.enabled {
            Some(Mesh::new(gl, registry, &geometry::cube(config.orbiter.size))?)
        } else {
            None
        };

        Ok(Self { shader, uniforms, lights, core, orbiter })
    }

    fn draw_mesh(&self, gl: &glow::Context, mesh: &Mesh, model: glam::Mat4, material: &Material) {
        let u = &self.uniforms;
        unsafe {
            gl.uniform_matrix_4_f32_slice(u.model.as_ref(), false, &model.to_cols_array());
            gl.uniform_3_f32_slice(u.base_color.as_ref(), &material.base_color);
            gl.uniform_3_f32_slice(u.emissive.as_ref(), &material.emissive);
            gl.uniform_1_f32(u.emissive_intensity.as_ref(), material.emissive_intensity);
            gl.uniform_1_f32(u.roughness.as_ref(), material.roughness);
            gl.uniform_1_f32(u.metalness.as_ref(), material.metalness);
        }
        mesh.draw(gl);
    }
}

impl Drawable for SolidsDrawable {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        let gl = context.gl;
        context.state.flags(gl, RenderFlags::OPAQUE);

        self.shader.use_program(gl);
        self.lights
            .upload_data(gl, &LightsUbo::from_scene(context.scene));
        unsafe {
            gl.uniform_matrix_4_f32_slice(
                self.uniforms.view_projection.as_ref(),
                false,
                &context.scene.camera.view_projection().to_cols_array(),
            );
        }
        Ok(())
    }

    fn draw(&self, context: &mut RenderContext) {
        let scene = context.scene;
        self.draw_mesh(context.gl, &self.core, scene.core_matrix(), &scene.core.material);

        if let (Some(mesh), Some(orbiter), Some(model)) =
            (&self.orbiter, &scene.orbiter, scene.orbiter_matrix())
        {
            self.draw_mesh(context.gl, mesh, model, &orbiter.material);
        }
    }

    fn cleanup(&self, context: &mut RenderContext) {
        self.lights.unbind(context.gl);
        unsafe { context.gl.use_program(None) };
    }
}

/// Additive fresnel shell around the core.
#[derive(Debug)]
struct ShellDrawable {
    shader: ShaderProgram,
    u_model: Option<glow::UniformLocation>,
    u_view: Option<glow::UniformLocation>,
    u_projection: Option<glow::UniformLocation>,
    u_time: Option<glow::UniformLocation>,
    mesh: Mesh,
}

impl ShellDrawable {
    /// Additive blend over the outward faces only.
    const FLAGS: RenderFlags = RenderFlags::ADDITIVE.union(RenderFlags::CULL_FACE);
    const VERTEX_GLSL: &'static str = include_str!("../shaders/shell.vert");
    const FRAGMENT_GLSL: &'static str = include_str!("../shaders/shell.frag");

    fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        config: &BackdropConfig,
    ) -> Result<Self, Error> {
        let shader = ShaderProgram::create(gl, registry, glsl, Self::VERTEX_GLSL, Self::FRAGMENT_GLSL)?;
        Ok(Self {
            u_model: shader.uniform(gl, "u_model"),
            u_view: shader.uniform(gl, "u_view"),
            u_projection: shader.uniform(gl, "u_projection"),
            u_time: shader.uniform(gl, "u_time"),
            mesh: Mesh::new(gl, registry, &geometry::sphere(config.core.shell_radius, config.core.segments))?,
            shader,
        })
    }
}

impl Drawable for ShellDrawable {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        let gl = context.gl;
        context.state
            .flags(gl, Self::FLAGS)
            .blend_func(gl, glow::SRC_ALPHA, glow::ONE);

        let scene = context.scene;
        self.shader.use_program(gl);
        unsafe {
            gl.uniform_matrix_4_f32_slice(self.u_model.as_ref(), false, &scene.focal_matrix().to_cols_array());
            gl.uniform_matrix_4_f32_slice(self.u_view.as_ref(), false, &scene.camera.view().to_cols_array());
            gl.uniform_matrix_4_f32_slice(
                self.u_projection.as_ref(),
                false,
                &scene.camera.projection().to_cols_array(),
            );
            gl.uniform_1_f32(self.u_time.as_ref(), scene.shell_time());
        }
        Ok(())
    }

    fn draw(&self, context: &mut RenderContext) {
        self.mesh.draw(context.gl);
    }

    fn cleanup(&self, context: &mut RenderContext) {
        unsafe { context.gl.use_program(None) };
    }
}

/// Spark particles, rewritten into one dynamic buffer every frame.
#[derive(Debug)]
struct SparksDrawable {
    shader: ShaderProgram,
    u_view_projection: Option<glow::UniformLocation>,
    u_point_size: Option<glow::UniformLocation>,
    u_viewport_height: Option<glow::UniformLocation>,
    points: PointCloud,
    point_size: f32,
    staging: Vec<[f32; 4]>,
}

impl SparksDrawable {
    const VERTEX_GLSL: &'static str = include_str!("../shaders/spark.vert");
    const FRAGMENT_GLSL: &'static str = include_str!("../shaders/spark.frag");

    fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        config: &BackdropConfig,
    ) -> Result<Self, Error> {
        let shader = ShaderProgram::create(gl, registry, glsl, Self::VERTEX_GLSL, Self::FRAGMENT_GLSL)?;
        let capacity = config.particles.capacity;
        Ok(Self {
            u_view_projection: shader.uniform(gl, "u_view_projection"),
            u_point_size: shader.uniform(gl, "u_point_size"),
            u_viewport_height: shader.uniform(gl, "u_viewport_height"),
            points: PointCloud::new_dynamic(gl, registry, capacity)?,
            point_size: config.particles.point_size,
            staging: Vec::with_capacity(capacity),
            shader,
        })
    }

    /// Mirrors the live particle set into the GPU buffer.
    fn update(&mut self, gl: &glow::Context, particles: &[Particle]) {
        self.staging.clear();
        self.staging
            .extend(particles.iter().map(|p| p.position.extend(p.opacity()).to_array()));
        self.points.update(gl, &self.staging);
    }
}

impl Drawable for SparksDrawable {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        let gl = context.gl;
        context.state
            .flags(gl, RenderFlags::ADDITIVE)
            .blend_func(gl, glow::SRC_ALPHA, glow::ONE);

        self.shader.use_program(gl);
        unsafe {
            gl.uniform_matrix_4_f32_slice(
                self.u_view_projection.as_ref(),
                false,
                &context.scene.camera.view_projection().to_cols_array(),
            );
            gl.uniform_1_f32(self.u_point_size.as_ref(), self.point_size);
            gl.uniform_1_f32(self.u_viewport_height.as_ref(), context.viewport.1 as f32);
        }
        Ok(())
    }

    fn draw(&self, context: &mut RenderContext) {
        self.points.draw(context.gl);
    }

    fn cleanup(&self, context: &mut RenderContext) {
        unsafe { context.gl.use_program(None) };
    }
}

/// Telemetry panel sampling the HUD texture.
#[derive(Debug)]
struct HudPanelDrawable {
    shader: ShaderProgram,
    u_model: Option<glow::UniformLocation>,
    u_view_projection: Option<glow::UniformLocation>,
    u_sampler: glow::UniformLocation,
    mesh: Mesh,
    texture: HudTexture,
}

impl HudPanelDrawable {
    const VERTEX_GLSL: &'static str = include_str!("../shaders/hud.vert");
    const FRAGMENT_GLSL: &'static str = include_str!("../shaders/hud.frag");

    fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        config: &BackdropConfig,
        raster: &HudRaster,
    ) -> Result<Self, Error> {
        let shader = ShaderProgram::create(gl, registry, glsl, Self::VERTEX_GLSL, Self::FRAGMENT_GLSL)?;
        let [w, h] = config.hud.panel_size;
        Ok(Self {
            u_model: shader.uniform(gl, "u_model"),
            u_view_projection: shader.uniform(gl, "u_view_projection"),
            u_sampler: shader.required_uniform(gl, "u_sampler")?,
            mesh: Mesh::new(gl, registry, &geometry::plane(w, h))?,
            texture: HudTexture::new(gl, registry, raster)?,
            shader,
        })
    }
}

impl Drawable for HudPanelDrawable {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        let gl = context.gl;
        context.state
            .flags(gl, RenderFlags::ADDITIVE)
            .blend_func(gl, glow::SRC_ALPHA, glow::ONE)
            .active_texture(gl, glow::TEXTURE0);

        self.shader.use_program(gl);
        self.texture.bind(gl);
        unsafe {
            gl.uniform_1_i32(Some(&self.u_sampler), 0);
            gl.uniform_matrix_4_f32_slice(self.u_model.as_ref(), false, &context.scene.hud_matrix().to_cols_array());
            gl.uniform_matrix_4_f32_slice(
                self.u_view_projection.as_ref(),
                false,
                &context.scene.camera.view_projection().to_cols_array(),
            );
        }
        Ok(())
    }

    fn draw(&self, context: &mut RenderContext) {
        self.mesh.draw(context.gl);
    }

    fn cleanup(&self, context: &mut RenderContext) {
        unsafe {
            context.gl.bind_texture(glow::TEXTURE_2D, None);
            context.gl.use_program(None);
        }
    }
}

/// Renders the scene graph into its own color + depth target.
#[derive(Debug)]
pub(crate) struct ScenePass {
    target: RenderTarget,
    clear_rgb: [f32; 3],
    solids: SolidsDrawable,
    stars: StarfieldDrawable,
    shell: ShellDrawable,
    sparks: SparksDrawable,
    hud: HudPanelDrawable,
}

impl ScenePass {
    pub(crate) fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        config: &BackdropConfig,
        scene: &Scene,
        raster: &HudRaster,
        size: (u32, u32),
    ) -> Result<Self, Error> {
        Ok(Self {
            target: RenderTarget::new(gl, registry, "scene", size, true)?,
            clear_rgb: config.clear_rgb(),
            solids: SolidsDrawable::new(gl, registry, glsl, config)?,
            stars: StarfieldDrawable::new(gl, registry, glsl, scene)?,
            shell: ShellDrawable::new(gl, registry, glsl, config)?,
            sparks: SparksDrawable::new(gl, registry, glsl, config)?,
            hud: HudPanelDrawable::new(gl, registry, glsl, config, raster)?,
        })
    }

    pub(crate) fn resize(&mut self, gl: &glow::Context, size: (u32, u32)) -> Result<(), Error> {
        self.target.resize(gl, size)
    }

    /// Uploads the frame's dynamic data: spark positions and a dirty HUD raster.
    pub(crate) fn upload(&mut self, gl: &glow::Context, particles: &[Particle], raster: &mut HudRaster) {
        self.sparks.update(gl, particles);
        self.hud.texture.flush(gl, raster);
    }

    /// Draws opaque geometry first, then every additive layer.
    pub(crate) fn render(
        &self,
        gl: &glow::Context,
        state: &mut GlState,
        scene: &Scene,
        pixel_ratio: f32,
    ) -> Result<&RenderTarget, Error> {
        self.target.bind(gl, state);
        let [r, g, b] = self.clear_rgb;
        state
            .flags(gl, RenderFlags::DEPTH_WRITE)
            .clear_color(gl, r, g, b, 1.0);
        unsafe { gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) };

        let mut context = RenderContext {
            gl,
            state,
            scene,
            viewport: self.target.size(),
            pixel_ratio,
        };

        self.solids.render(&mut context)?;
        self.stars.render(&mut context)?;
        self.shell.render(&mut context)?;
        self.sparks.render(&mut context)?;
        self.hud.render(&mut context)?;

        Ok(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_culls_back_faces() {
        assert!(ShellDrawable::FLAGS.contains(RenderFlags::CULL_FACE));
        assert!(ShellDrawable::FLAGS.contains(RenderFlags::ADDITIVE));
        assert!(!ShellDrawable::FLAGS.contains(RenderFlags::DEPTH_WRITE));
    }
}
