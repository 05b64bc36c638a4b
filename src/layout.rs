//! Vertex layout for batch meshes.
//!
//! Attributes live at fixed shader slots (position 0, normal 1,
//! texcoord 2) so that one set of shaders can consume every attribute
//! combination a batch can produce. Each attribute is stored in its own
//! tightly packed buffer, so the stride of a buffer is just its
//! attribute's size.

/// Semantic meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeSemantic {
    /// Vertex position (float3). Always present.
    Position,
    /// Vertex normal (float3, unit length).
    Normal,
    /// Texture coordinates (float2).
    TexCoord0,
}

impl VertexAttributeSemantic {
    /// Get the fixed shader slot for this semantic.
    pub fn slot(&self) -> u32 {
        match self {
            Self::Position => 0,
            Self::Normal => 1,
            Self::TexCoord0 => 2,
        }
    }
}

/// Format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
}

impl VertexAttributeFormat {
    /// Get the size in bytes of this format.
    pub fn size(&self) -> usize {
        match self {
            Self::Float2 => 8,
            Self::Float3 => 12,
        }
    }
}

/// A single vertex attribute description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Semantic meaning of this attribute.
    pub semantic: VertexAttributeSemantic,
    /// Data format of this attribute.
    pub format: VertexAttributeFormat,
}

impl VertexAttribute {
    /// Create a position attribute (float3).
    pub fn position() -> Self {
        Self {
            semantic: VertexAttributeSemantic::Position,
            format: VertexAttributeFormat::Float3,
        }
    }

    /// Create a normal attribute (float3).
    pub fn normal() -> Self {
        Self {
            semantic: VertexAttributeSemantic::Normal,
            format: VertexAttributeFormat::Float3,
        }
    }

    /// Create a texcoord attribute (float2).
    pub fn texcoord0() -> Self {
        Self {
            semantic: VertexAttributeSemantic::TexCoord0,
            format: VertexAttributeFormat::Float2,
        }
    }
}

/// Describes the vertex data of a batch: one tightly packed buffer per
/// attribute, bound in attribute order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    /// The vertex attributes, one buffer each, in binding order.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Create an empty vertex layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex attribute.
    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Layout for a batch with the given optional attributes.
    ///
    /// Position is always present; normals come before texcoords, matching
    /// the buffer order the batch uploads.
    pub fn for_attributes(has_normals: bool, has_texcoords: bool) -> Self {
        let mut layout = Self::new().with_attribute(VertexAttribute::position());
        if has_normals {
            layout = layout.with_attribute(VertexAttribute::normal());
        }
        if has_texcoords {
            layout = layout.with_attribute(VertexAttribute::texcoord0());
        }
        layout
    }

    /// Position-only layout.
    pub fn position_only() -> Self {
        Self::for_attributes(false, false)
    }

    /// Get the number of vertex buffers (one per attribute).
    pub fn buffer_count(&self) -> usize {
        self.attributes.len()
    }

    /// Get the stride of the buffer backing attribute `index`.
    pub fn buffer_stride(&self, index: usize) -> u64 {
        self.attributes
            .get(index)
            .map(|attr| attr.format.size() as u64)
            .unwrap_or(0)
    }

    /// Check if this layout has a specific semantic.
    pub fn has_semantic(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attributes.iter().any(|attr| attr.semantic == semantic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_slots() {
        assert_eq!(VertexAttributeSemantic::Position.slot(), 0);
        assert_eq!(VertexAttributeSemantic::Normal.slot(), 1);
        assert_eq!(VertexAttributeSemantic::TexCoord0.slot(), 2);
    }

    #[test]
    fn test_attribute_format_size() {
        assert_eq!(VertexAttributeFormat::Float2.size(), 8);
        assert_eq!(VertexAttributeFormat::Float3.size(), 12);
    }

    #[test]
    fn test_layout_for_attributes() {
        let layout = VertexLayout::for_attributes(true, true);
        assert_eq!(layout.buffer_count(), 3);
        assert_eq!(layout.buffer_stride(0), 12);
        assert_eq!(layout.buffer_stride(1), 12);
        assert_eq!(layout.buffer_stride(2), 8);
        assert!(layout.has_semantic(VertexAttributeSemantic::Normal));

        let layout = VertexLayout::for_attributes(false, true);
        assert_eq!(layout.buffer_count(), 2);
        assert_eq!(layout.buffer_stride(1), 8);
        assert!(!layout.has_semantic(VertexAttributeSemantic::Normal));

        let layout = VertexLayout::position_only();
        assert_eq!(layout.buffer_count(), 1);
        assert_eq!(layout.buffer_stride(5), 0);
    }
}
