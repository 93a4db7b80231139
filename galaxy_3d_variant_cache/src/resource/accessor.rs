/// Typed accessors over binary buffers.
///
/// An accessor describes how to read `element_count` elements of one
/// `ElementType` from a buffer, starting at `byte_offset` and advancing
/// `stride` bytes per element. Element types follow the glTF accessor
/// model (shape × component type).
///
/// Accessors are cached by structural key. A stride of 0 means "tightly
/// packed" and is resolved to the element size before the key is built,
/// so a defaulted stride and the equivalent explicit one share an accessor.

use std::ops::Range;
use bytemuck::Pod;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::utils::VariantCache;
use crate::engine_bail;
use super::buffer_cache::{BufferCache, BufferId};

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable identity of a cached accessor.
    pub struct AccessorId;
}

// ===== ELEMENT TYPE =====

/// Element shape (glTF accessor `type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementShape {
    /// Number of components per element
    pub fn component_count(&self) -> u32 {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
            ElementShape::Vec4 => 4,
            ElementShape::Mat2 => 4,
            ElementShape::Mat3 => 9,
            ElementShape::Mat4 => 16,
        }
    }

    /// Parse a glTF accessor type name ("SCALAR", "VEC3", ...)
    pub fn from_gltf(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(ElementShape::Scalar),
            "VEC2" => Some(ElementShape::Vec2),
            "VEC3" => Some(ElementShape::Vec3),
            "VEC4" => Some(ElementShape::Vec4),
            "MAT2" => Some(ElementShape::Mat2),
            "MAT3" => Some(ElementShape::Mat3),
            "MAT4" => Some(ElementShape::Mat4),
            _ => None,
        }
    }
}

/// Component type (glTF accessor `componentType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size in bytes
    pub fn size_bytes(&self) -> u32 {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    /// Parse a glTF component type code (5120..=5126)
    pub fn from_gltf(code: u32) -> Option<Self> {
        match code {
            5120 => Some(ComponentType::I8),
            5121 => Some(ComponentType::U8),
            5122 => Some(ComponentType::I16),
            5123 => Some(ComponentType::U16),
            5125 => Some(ComponentType::U32),
            5126 => Some(ComponentType::F32),
            _ => None,
        }
    }
}

/// Type of one accessor element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementType {
    pub shape: ElementShape,
    pub component: ComponentType,
}

impl ElementType {
    pub const fn new(shape: ElementShape, component: ComponentType) -> Self {
        Self { shape, component }
    }

    pub fn component_count(&self) -> u32 {
        self.shape.component_count()
    }

    pub fn component_size(&self) -> u32 {
        self.component.size_bytes()
    }

    /// Size of one tightly packed element
    pub fn natural_stride(&self) -> u32 {
        self.component_count() * self.component_size()
    }
}

// ===== ACCESSOR KEY =====

/// Structural key of an accessor (stride always resolved)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessorKey {
    pub element_type: ElementType,
    pub buffer: BufferId,
    pub byte_offset: u64,
    pub element_count: u32,
    pub stride: u32,
}

// ===== ACCESSOR =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    key: AccessorKey,
    component_count: u32,
    component_size: u32,
}

impl Accessor {
    fn new(key: AccessorKey) -> Self {
        Self {
            component_count: key.element_type.component_count(),
            component_size: key.element_type.component_size(),
            key,
        }
    }

    pub fn key(&self) -> &AccessorKey {
        &self.key
    }

    pub fn element_type(&self) -> ElementType {
        self.key.element_type
    }

    pub fn buffer(&self) -> BufferId {
        self.key.buffer
    }

    pub fn byte_offset(&self) -> u64 {
        self.key.byte_offset
    }

    pub fn element_count(&self) -> u32 {
        self.key.element_count
    }

    /// Resolved stride (never 0)
    pub fn stride(&self) -> u32 {
        self.key.stride
    }

    pub fn component_count(&self) -> u32 {
        self.component_count
    }

    pub fn component_size(&self) -> u32 {
        self.component_size
    }

    /// Size of one element in bytes
    pub fn element_size(&self) -> u32 {
        self.component_count * self.component_size
    }

    /// Byte range of element `index` within the buffer
    pub fn element_range(&self, index: u32) -> Result<Range<usize>> {
        if index >= self.key.element_count {
            engine_bail!("galaxy3d::Accessor", "Element index {} out of range (count {})",
                index, self.key.element_count);
        }
        let start = self.key.byte_offset as usize + index as usize * self.key.stride as usize;
        Ok(start..start + self.element_size() as usize)
    }

    /// Read element `index` as `T` from the accessor's buffer bytes.
    ///
    /// `T` must have exactly the element size (e.g. `glam::Vec3` for
    /// Vec3/F32, `u16` for Scalar/U16). Reads are unaligned.
    pub fn read<T: Pod>(&self, bytes: &[u8], index: u32) -> Result<T> {
        if std::mem::size_of::<T>() != self.element_size() as usize {
            engine_bail!("galaxy3d::Accessor", "Cannot read {:?} elements ({} bytes) as {} ({} bytes)",
                self.key.element_type, self.element_size(),
                std::any::type_name::<T>(), std::mem::size_of::<T>());
        }
        let range = self.element_range(index)?;
        match bytes.get(range) {
            Some(slice) => Ok(bytemuck::pod_read_unaligned(slice)),
            None => Err(Error::InvalidResource(format!(
                "element {} lies outside a {}-byte buffer", index, bytes.len()))),
        }
    }

    /// Read every element as `T`
    pub fn read_all<T: Pod>(&self, bytes: &[u8]) -> Result<Vec<T>> {
        (0..self.key.element_count).map(|index| self.read(bytes, index)).collect()
    }
}

// ===== ACCESSOR CACHE =====

pub struct AccessorCache {
    accessors: SlotMap<AccessorId, Accessor>,
    lookup: VariantCache<AccessorKey, AccessorId>,
}

impl AccessorCache {
    pub fn new() -> Self {
        Self {
            accessors: SlotMap::with_key(),
            lookup: VariantCache::new(),
        }
    }

    /// Return the accessor for this view, creating it on first request.
    ///
    /// A `stride` of 0 is resolved to the element size first. The view
    /// is validated against the buffer when the accessor is created.
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the buffer was released, the stride is smaller
    /// than one element, or the view does not fit inside the buffer.
    /// Nothing is cached on failure.
    pub fn get_or_create(
        &mut self,
        buffers: &BufferCache,
        element_type: ElementType,
        buffer: BufferId,
        byte_offset: u64,
        element_count: u32,
        stride: u32,
    ) -> Result<AccessorId> {
        let key = AccessorKey {
            element_type,
            buffer,
            byte_offset,
            element_count,
            stride: if stride == 0 { element_type.natural_stride() } else { stride },
        };

        let accessors = &mut self.accessors;
        let id = *self.lookup.try_get_or_create(key, |key| {
            validate_view(buffers, key)?;
            Ok(accessors.insert(Accessor::new(*key)))
        })?;
        Ok(id)
    }

    pub fn accessor(&self, id: AccessorId) -> Option<&Accessor> {
        self.accessors.get(id)
    }

    pub fn find(&self, key: &AccessorKey) -> Option<AccessorId> {
        self.lookup.get(key).copied()
    }

    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }
}

impl Default for AccessorCache {
    fn default() -> Self {
        Self::new()
    }
}

// ===== VALIDATION =====

fn validate_view(buffers: &BufferCache, key: &AccessorKey) -> Result<()> {
    let length = buffers.bytes(key.buffer)?.len() as u64;
    let element_size = key.element_type.natural_stride() as u64;

    if (key.stride as u64) < element_size {
        engine_bail!("galaxy3d::Accessor", "Stride {} is smaller than the {}-byte element",
            key.stride, element_size);
    }

    let end = if key.element_count == 0 {
        key.byte_offset
    } else {
        (key.element_count as u64 - 1)
            .checked_mul(key.stride as u64)
            .and_then(|span| span.checked_add(key.byte_offset))
            .and_then(|last| last.checked_add(element_size))
            .ok_or_else(|| crate::engine_err!("galaxy3d::Accessor", "Accessor range overflow"))?
    };

    if end > length {
        engine_bail!("galaxy3d::Accessor", "View [{}, {}) exceeds buffer length {}",
            key.byte_offset, end, length);
    }
    Ok(())
}

#[cfg(test)]
#[path = "accessor_tests.rs"]
mod tests;
