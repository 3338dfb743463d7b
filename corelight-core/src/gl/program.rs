use glow::HasContext;

use crate::{
    GlslVersion,
    error::Error,
    gl::{GpuRegistry, GpuResource},
};

/// A linked shader program.
///
/// The program handle is owned by the session's [`GpuRegistry`]; shader
/// objects are deleted right after linking.
#[derive(Debug)]
pub(crate) struct ShaderProgram {
    pub(crate) program: glow::Program,
}

impl ShaderProgram {
    /// Compiles and links a program from version-less GLSL sources.
    ///
    /// The `#version` line and precision qualifiers for the target are
    /// prepended here, so shader files stay identical for WebGL2 and desktop GL.
    pub(crate) fn create(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, Error> {
        let vertex_source = format!("{}{vertex_source}", glsl.vertex_preamble());
        let fragment_source = format!("{}{fragment_source}", glsl.fragment_preamble());

        let program =
            unsafe { gl.create_program() }.map_err(|_| Error::shader_program_creation_failed())?;
        registry.register(GpuResource::Program(program));

        let vertex_shader = compile_shader(gl, ShaderType::Vertex, &vertex_source)?;
        let fragment_shader = match compile_shader(gl, ShaderType::Fragment, &fragment_source) {
            Ok(shader) => shader,
            Err(e) => {
                unsafe { gl.delete_shader(vertex_shader) };
                return Err(e);
            },
        };

        unsafe {
            gl.attach_shader(program, vertex_shader);
            gl.attach_shader(program, fragment_shader);
            gl.link_program(program);
        }
        let linked = check_link_status(gl, program);

        // shaders are no longer needed once linking has been attempted
        unsafe {
            gl.detach_shader(program, vertex_shader);
            gl.detach_shader(program, fragment_shader);
            gl.delete_shader(vertex_shader);
            gl.delete_shader(fragment_shader);
        }
        linked?;

        Ok(ShaderProgram { program })
    }

    /// Use the shader program.
    pub(crate) fn use_program(&self, gl: &glow::Context) {
        unsafe { gl.use_program(Some(self.program)) };
    }

    /// Looks up a uniform; `None` if it does not exist or was optimized out.
    pub(crate) fn uniform(&self, gl: &glow::Context, name: &str) -> Option<glow::UniformLocation> {
        unsafe { gl.get_uniform_location(self.program, name) }
    }

    /// Looks up a uniform the program cannot work without.
    pub(crate) fn required_uniform(
        &self,
        gl: &glow::Context,
        name: &str,
    ) -> Result<glow::UniformLocation, Error> {
        self.uniform(gl, name)
            .ok_or_else(|| Error::uniform_location_failed(name))
    }
}

fn compile_shader(
    gl: &glow::Context,
    shader_type: ShaderType,
    source: &str,
) -> Result<glow::Shader, Error> {
    let shader = unsafe { gl.create_shader(shader_type.into()) }
        .map_err(|e| Error::shader_creation_failed(&e))?;

    unsafe {
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
    }

    if !unsafe { gl.get_shader_compile_status(shader) } {
        let log = unsafe { gl.get_shader_info_log(shader) };
        unsafe { gl.delete_shader(shader) };
        return Err(Error::shader_compile_failed(shader_type.label(), log));
    }

    Ok(shader)
}

fn check_link_status(gl: &glow::Context, program: glow::Program) -> Result<(), Error> {
    let status = unsafe { gl.get_program_link_status(program) };
    if !status {
        let log = unsafe { gl.get_program_info_log(program) };
        return Err(Error::shader_link_failed(log));
    }

    Ok(())
}

/// Enum representing the type of shader.
#[derive(Clone, Copy)]
enum ShaderType {
    Vertex,
    Fragment,
}

impl ShaderType {
    fn label(self) -> &'static str {
        match self {
            ShaderType::Vertex => "vertex",
            ShaderType::Fragment => "fragment",
        }
    }
}

impl From<ShaderType> for u32 {
    fn from(val: ShaderType) -> Self {
        use ShaderType::*;

        match val {
            Vertex => glow::VERTEX_SHADER,
            Fragment => glow::FRAGMENT_SHADER,
        }
    }
}
