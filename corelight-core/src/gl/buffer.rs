use std::slice;

use glow::HasContext;

use crate::{error::Error, gl::GpuRegistry};

/// Vertex attribute locations shared by every shader in the crate.
pub(crate) mod attrib {
    pub const POSITION: u32 = 0;
    pub const NORMAL: u32 = 1;
    pub const UV: u32 = 2;
    /// Per-point scalar: star blink phase or spark opacity.
    pub const POINT_EXTRA: u32 = 1;
}

/// Uploads a single struct to a GL buffer as raw bytes.
///
/// # Safety
/// Requires that T:
/// - Has a stable memory layout (use #[repr(C)] or #[repr(transparent)])
/// - Contains only copy types
pub(crate) fn buffer_upload_struct<T: Copy>(gl: &glow::Context, target: u32, data: &T, usage: u32) {
    unsafe {
        let bytes = slice::from_raw_parts(data as *const T as *const u8, size_of::<T>());
        gl.buffer_data_u8_slice(target, bytes, usage);
    }
}

/// Views a slice of plain values as raw bytes.
pub(crate) fn as_bytes<T: Copy>(data: &[T]) -> &[u8] {
    unsafe { slice::from_raw_parts(data.as_ptr() as *const u8, size_of_val(data)) }
}

/// Creates a buffer, registers it for disposal and fills it with `data`.
pub(crate) fn create_buffer<T: Copy>(
    gl: &glow::Context,
    registry: &mut GpuRegistry,
    label: &str,
    target: u32,
    data: &[T],
    usage: u32,
) -> Result<glow::Buffer, Error> {
    let buffer = registry.create_buffer(gl, label)?;
    unsafe {
        gl.bind_buffer(target, Some(buffer));
        gl.buffer_data_u8_slice(target, as_bytes(data), usage);
    }
    Ok(buffer)
}

/// Creates a buffer with `size` bytes of uninitialized storage.
pub(crate) fn create_buffer_sized(
    gl: &glow::Context,
    registry: &mut GpuRegistry,
    label: &str,
    target: u32,
    size: usize,
    usage: u32,
) -> Result<glow::Buffer, Error> {
    let buffer = registry.create_buffer(gl, label)?;
    unsafe {
        gl.bind_buffer(target, Some(buffer));
        gl.buffer_data_size(target, size as i32, usage);
    }
    Ok(buffer)
}

/// Enables a float vertex attribute on the currently bound VAO and buffer.
pub(crate) fn enable_float_attrib(gl: &glow::Context, index: u32, size: i32, stride_floats: i32, offset_floats: i32) {
    unsafe {
        gl.enable_vertex_attrib_array(index);
        gl.vertex_attrib_pointer_f32(index, size, glow::FLOAT, false, stride_floats * 4, offset_floats * 4);
    }
}
