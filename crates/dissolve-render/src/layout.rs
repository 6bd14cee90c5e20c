//! std140 packing of uniform tables.

use dissolve_core::{UniformTable, UniformValue};

/// Location of one uniform inside a [`UniformBlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    /// Uniform name.
    pub name: String,
    /// Byte offset from the start of the block.
    pub offset: usize,
    /// Size in bytes.
    pub size: usize,
}

/// Uniform values packed with std140 rules, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformBlock {
    entries: Vec<BlockEntry>,
    data: Vec<u8>,
}

/// Returns `(size, alignment)` of a value under std140.
fn std140_layout(value: &UniformValue) -> (usize, usize) {
    match value {
        UniformValue::Float(_) | UniformValue::Int(_) | UniformValue::Bool(_) => (4, 4),
        UniformValue::Vec2(_) => (8, 8),
        UniformValue::Vec3(_) | UniformValue::Color(_) => (12, 16),
        UniformValue::Vec4(_) => (16, 16),
        UniformValue::Mat4(_) => (64, 16),
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

fn write_value(value: &UniformValue, out: &mut [u8]) {
    match value {
        UniformValue::Float(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
        UniformValue::Int(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
        UniformValue::Bool(v) => out.copy_from_slice(bytemuck::bytes_of(&u32::from(*v))),
        UniformValue::Vec2(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
        UniformValue::Vec3(v) | UniformValue::Color(v) => {
            out.copy_from_slice(bytemuck::cast_slice(&v.to_array()));
        }
        UniformValue::Vec4(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
        UniformValue::Mat4(m) => out.copy_from_slice(bytemuck::cast_slice(&m.to_cols_array())),
    }
}

impl UniformBlock {
    /// Packs the current values of `table`.
    pub fn from_table(table: &UniformTable) -> Self {
        let mut entries = Vec::with_capacity(table.len());
        let mut data = Vec::new();
        let mut cursor = 0;

        for (name, uniform) in table.iter() {
            let value = uniform.value();
            let (size, align) = std140_layout(&value);
            let offset = align_up(cursor, align);
            data.resize(offset + size, 0);
            write_value(&value, &mut data[offset..offset + size]);
            entries.push(BlockEntry {
                name: name.to_string(),
                offset,
                size,
            });
            cursor = offset + size;
        }

        data.resize(align_up(cursor, 16), 0);
        Self { entries, data }
    }

    /// Returns the byte offset of a uniform.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.offset)
    }

    /// Returns the entries in block order.
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Returns the packed bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the block size in bytes (a multiple of 16).
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissolve_core::{Mat4, Vec3};

    #[test]
    fn test_std140_offsets() {
        let table = UniformTable::from_defaults([
            ("a_scale", UniformValue::Float(2.0)),
            ("b_tint", UniformValue::Color(Vec3::new(1.0, 0.5, 0.25))),
            ("c_flag", UniformValue::Bool(true)),
            ("d_model", UniformValue::Mat4(Mat4::IDENTITY)),
        ]);
        let block = UniformBlock::from_table(&table);

        assert_eq!(block.offset_of("a_scale"), Some(0));
        assert_eq!(block.offset_of("b_tint"), Some(16));
        // A scalar packs into the vec3's trailing padding
        assert_eq!(block.offset_of("c_flag"), Some(28));
        assert_eq!(block.offset_of("d_model"), Some(32));
        assert_eq!(block.size(), 96);
        assert_eq!(block.offset_of("missing"), None);
    }

    #[test]
    fn test_values_written() {
        let table = UniformTable::from_defaults([
            ("progress", UniformValue::Float(0.5)),
            ("mixcolor", UniformValue::Color(Vec3::new(1.0, 0.0, 0.25))),
        ]);
        let block = UniformBlock::from_table(&table);
        let floats: Vec<f32> = block
            .bytes()
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        // mixcolor sorts first
        assert_eq!(&floats[0..3], &[1.0, 0.0, 0.25]);
        assert_eq!(floats[3], 0.5);
        assert_eq!(block.size(), 16);
    }

    #[test]
    fn test_empty_table() {
        let block = UniformBlock::from_table(&UniformTable::new());
        assert_eq!(block.size(), 0);
        assert!(block.entries().is_empty());
    }
}
