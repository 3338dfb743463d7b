//! Scoped acquisition of GPU handles.
//!
//! Every handle the engine allocates goes through [`GpuRegistry`] at creation
//! time. Teardown drains the registry once, so no path can skip a handle and
//! no handle is ever released twice.

use glow::HasContext;
use tracing::debug;

use crate::error::Error;

/// Ordered list of resources awaiting release.
///
/// Resources are released in reverse registration order, mirroring the
/// usual "last acquired, first released" discipline.
#[derive(Debug)]
pub struct DisposalList<T> {
    entries: Vec<T>,
    released: bool,
}

impl<T> Default for DisposalList<T> {
    fn default() -> Self {
        Self { entries: Vec::new(), released: false }
    }
}

impl<T> DisposalList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource to the list.
    ///
    /// Registering after the list has been drained reopens it, so a rebuilt
    /// set of resources is tracked like the first one.
    pub fn register(&mut self, resource: T) {
        self.released = false;
        self.entries.push(resource);
    }

    /// Releases every registered resource exactly once, newest first.
    ///
    /// Returns the number of resources released; a second call returns zero.
    pub fn drain(&mut self, mut release: impl FnMut(T)) -> usize {
        let count = self.entries.len();
        while let Some(resource) = self.entries.pop() {
            release(resource);
        }
        self.released = true;
        count
    }

    /// Drops every entry without releasing it.
    ///
    /// For handles that died with their context and must not be passed back
    /// to the driver.
    pub fn forget(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.released = true;
        count
    }

    /// Number of resources still held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` once the list has been drained or forgotten and nothing new was registered.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

/// A GL object owned by one backdrop session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpuResource {
    /// Vertex or index buffer.
    Buffer(glow::Buffer),
    /// Vertex array object.
    VertexArray(glow::VertexArray),
    /// Linked shader program.
    Program(glow::Program),
    /// 2D texture.
    Texture(glow::Texture),
    /// Framebuffer object.
    Framebuffer(glow::Framebuffer),
    /// Renderbuffer attachment.
    Renderbuffer(glow::Renderbuffer),
}

impl GpuResource {
    fn release(self, gl: &glow::Context) {
        unsafe {
            match self {
                Self::Buffer(b) => gl.delete_buffer(b),
                Self::VertexArray(v) => gl.delete_vertex_array(v),
                Self::Program(p) => gl.delete_program(p),
                Self::Texture(t) => gl.delete_texture(t),
                Self::Framebuffer(f) => gl.delete_framebuffer(f),
                Self::Renderbuffer(r) => gl.delete_renderbuffer(r),
            }
        }
    }
}

/// Disposal list for the GL objects of one session, with creation helpers
/// that register each handle as it is made.
#[derive(Debug, Default)]
pub struct GpuRegistry {
    list: DisposalList<GpuResource>,
}

impl GpuRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a handle created elsewhere.
    pub fn register(&mut self, resource: GpuResource) {
        self.list.register(resource);
    }

    pub(crate) fn create_buffer(&mut self, gl: &glow::Context, label: &str) -> Result<glow::Buffer, Error> {
        let buffer = unsafe { gl.create_buffer() }.map_err(|e| Error::buffer_creation_failed(label, e))?;
        self.register(GpuResource::Buffer(buffer));
        Ok(buffer)
    }

    pub(crate) fn create_vertex_array(&mut self, gl: &glow::Context) -> Result<glow::VertexArray, Error> {
        let vao = unsafe { gl.create_vertex_array() }.map_err(Error::vertex_array_creation_failed)?;
        self.register(GpuResource::VertexArray(vao));
        Ok(vao)
    }

    pub(crate) fn create_texture(&mut self, gl: &glow::Context) -> Result<glow::Texture, Error> {
        let texture = unsafe { gl.create_texture() }.map_err(Error::texture_creation_failed)?;
        self.register(GpuResource::Texture(texture));
        Ok(texture)
    }

    pub(crate) fn create_framebuffer(&mut self, gl: &glow::Context) -> Result<glow::Framebuffer, Error> {
        let framebuffer = unsafe { gl.create_framebuffer() }.map_err(Error::framebuffer_creation_failed)?;
        self.register(GpuResource::Framebuffer(framebuffer));
        Ok(framebuffer)
    }

    pub(crate) fn create_renderbuffer(&mut self, gl: &glow::Context) -> Result<glow::Renderbuffer, Error> {
        let renderbuffer = unsafe { gl.create_renderbuffer() }.map_err(Error::framebuffer_creation_failed)?;
        self.register(GpuResource::Renderbuffer(renderbuffer));
        Ok(renderbuffer)
    }

    /// Deletes every registered GL object. Safe to call repeatedly.
    pub fn dispose(&mut self, gl: &glow::Context) -> usize {
        let released = self.list.drain(|resource| resource.release(gl));
        if released > 0 {
            debug!(released, "released GPU resources");
        }
        released
    }

    /// Forgets every handle without deleting it, after a lost context.
    pub fn abandon(&mut self) -> usize {
        let forgotten = self.list.forget();
        if forgotten > 0 {
            debug!(forgotten, "abandoned GPU handles of lost context");
        }
        forgotten
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// `true` when every handle was released or abandoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_releases_once_newest_first() {
        let mut list = DisposalList::new();
        for id in 1..=4u32 {
            list.register(id);
        }

        let mut released = Vec::new();
        assert_eq!(list.drain(|id| released.push(id)), 4);
        assert_eq!(released, vec![4, 3, 2, 1]);
        assert!(list.is_released());

        assert_eq!(list.drain(|id| released.push(id)), 0);
        assert_eq!(released.len(), 4);
    }

    #[test]
    fn test_drain_on_empty_list() {
        let mut list: DisposalList<u32> = DisposalList::new();
        assert!(!list.is_released());
        assert_eq!(list.drain(|_| panic!("nothing to release")), 0);
        assert!(list.is_released());
    }

    #[test]
    fn test_forget_skips_release() {
        let mut list = DisposalList::new();
        list.register("vbo");
        list.register("vao");
        assert_eq!(list.forget(), 2);
        assert_eq!(list.drain(|_| panic!("forgotten handles must not be released")), 0);
    }

    #[test]
    fn test_register_after_drain_reopens() {
        let mut list = DisposalList::new();
        list.register(1u8);
        list.drain(|_| {});
        list.register(2u8);
        assert!(!list.is_released());
        assert_eq!(list.len(), 1);
    }
}
