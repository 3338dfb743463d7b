use glow::HasContext;

use crate::{
    error::Error,
    gl::{
        GpuRegistry,
        buffer::{as_bytes, attrib, create_buffer, create_buffer_sized, enable_float_attrib},
    },
    scene::geometry::MeshData,
};

/// Static indexed triangle mesh with position, normal and uv attributes.
#[derive(Debug)]
pub(crate) struct Mesh {
    vao: glow::VertexArray,
    index_count: i32,
}

impl Mesh {
    pub(crate) fn new(gl: &glow::Context, registry: &mut GpuRegistry, data: &MeshData) -> Result<Self, Error> {
        const STRIDE: i32 = MeshData::FLOATS_PER_VERTEX as i32;

        let vao = registry.create_vertex_array(gl)?;
        unsafe { gl.bind_vertex_array(Some(vao)) };

        create_buffer(gl, registry, "mesh-vertices", glow::ARRAY_BUFFER, &data.interleaved(), glow::STATIC_DRAW)?;
        enable_float_attrib(gl, attrib::POSITION, 3, STRIDE, 0);
        enable_float_attrib(gl, attrib::NORMAL, 3, STRIDE, 3);
        enable_float_attrib(gl, attrib::UV, 2, STRIDE, 6);

        create_buffer(gl, registry, "mesh-indices", glow::ELEMENT_ARRAY_BUFFER, &data.indices, glow::STATIC_DRAW)?;

        // unbind VAO first so the element buffer binding stays recorded in it
        unsafe {
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        Ok(Self { vao, index_count: data.indices.len() as i32 })
    }

    pub(crate) fn draw(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);
            gl.bind_vertex_array(None);
        }
    }
}

/// Point sprites with a `vec3` position and one scalar per point.
///
/// Static clouds are filled once; dynamic clouds reserve room for a fixed
/// number of points and are rewritten with [`PointCloud::update`].
#[derive(Debug)]
pub(crate) struct PointCloud {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    capacity: usize,
    count: usize,
}

impl PointCloud {
    pub const FLOATS_PER_POINT: usize = 4;

    pub(crate) fn new_static(gl: &glow::Context, registry: &mut GpuRegistry, points: &[[f32; 4]]) -> Result<Self, Error> {
        let vao = registry.create_vertex_array(gl)?;
        unsafe { gl.bind_vertex_array(Some(vao)) };

        let vbo = create_buffer(gl, registry, "points-static", glow::ARRAY_BUFFER, points, glow::STATIC_DRAW)?;
        Self::describe(gl);

        Ok(Self { vao, vbo, capacity: points.len(), count: points.len() })
    }

    pub(crate) fn new_dynamic(gl: &glow::Context, registry: &mut GpuRegistry, capacity: usize) -> Result<Self, Error> {
        let vao = registry.create_vertex_array(gl)?;
        unsafe { gl.bind_vertex_array(Some(vao)) };

        let bytes = capacity.max(1) * Self::FLOATS_PER_POINT * size_of::<f32>();
        let vbo = create_buffer_sized(gl, registry, "points-dynamic", glow::ARRAY_BUFFER, bytes, glow::DYNAMIC_DRAW)?;
        Self::describe(gl);

        Ok(Self { vao, vbo, capacity, count: 0 })
    }

    fn describe(gl: &glow::Context) {
        const STRIDE: i32 = PointCloud::FLOATS_PER_POINT as i32;
        enable_float_attrib(gl, attrib::POSITION, 3, STRIDE, 0);
        enable_float_attrib(gl, attrib::POINT_EXTRA, 1, STRIDE, 3);

        unsafe {
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    /// Rewrites the live points; anything beyond the capacity is dropped.
    pub(crate) fn update(&mut self, gl: &glow::Context, points: &[[f32; 4]]) {
        let points = &points[..points.len().min(self.capacity)];
        self.count = points.len();
        if points.is_empty() {
            return;
        }

        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, as_bytes(points));
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    pub(crate) fn draw(&self, gl: &glow::Context) {
        if self.count == 0 {
            return;
        }
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::POINTS, 0, self.count as i32);
            gl.bind_vertex_array(None);
        }
    }
}

/// Attribute-less fullscreen triangle; the vertex shader derives positions
/// from `gl_VertexID`.
#[derive(Debug)]
pub(crate) struct FullscreenTriangle {
    vao: glow::VertexArray,
}

impl FullscreenTriangle {
    pub(crate) fn new(gl: &glow::Context, registry: &mut GpuRegistry) -> Result<Self, Error> {
        Ok(Self { vao: registry.create_vertex_array(gl)? })
    }

    pub(crate) fn draw(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
            gl.bind_vertex_array(None);
        }
    }
}
