/// Typed shader values and their packed byte sizes.
///
/// `ValueType` is the shape of a constant buffer entry; `ShaderValue` is a
/// concrete value of one of those shapes. Values are packed without padding,
/// in native byte order, exactly as they are laid out in a constant buffer.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

// ===== VALUE TYPE =====

/// Abstract scalar / vector / matrix type of a constant buffer entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int32,
    UInt32,
    Float,
    Vector2D,
    Vector3D,
    Vector4D,
    Color3,
    Color4,
    Matrix3x3,
    Matrix4x4,
}

impl ValueType {
    /// Size in bytes of one element (packed, no alignment padding)
    pub fn size_bytes(&self) -> usize {
        match self {
            ValueType::Int32 => 4,
            ValueType::UInt32 => 4,
            ValueType::Float => 4,
            ValueType::Vector2D => 8,
            ValueType::Vector3D => 12,
            ValueType::Vector4D => 16,
            ValueType::Color3 => 12,
            ValueType::Color4 => 16,
            ValueType::Matrix3x3 => 36,
            ValueType::Matrix4x4 => 64,
        }
    }

    /// Number of 32-bit scalar fields in one element
    pub fn field_count(&self) -> usize {
        self.size_bytes() / 4
    }
}

// ===== SHADER VALUE =====

/// A concrete value that can be written into a constant buffer entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderValue {
    Int32(i32),
    UInt32(u32),
    Float(f32),
    Vector2D(Vec2),
    Vector3D(Vec3),
    Vector4D(Vec4),
    Color3(Vec3),
    Color4(Vec4),
    Matrix3x3(Mat3),
    Matrix4x4(Mat4),
}

impl ShaderValue {
    /// The entry type this value fits into
    pub fn value_type(&self) -> ValueType {
        match self {
            ShaderValue::Int32(_) => ValueType::Int32,
            ShaderValue::UInt32(_) => ValueType::UInt32,
            ShaderValue::Float(_) => ValueType::Float,
            ShaderValue::Vector2D(_) => ValueType::Vector2D,
            ShaderValue::Vector3D(_) => ValueType::Vector3D,
            ShaderValue::Vector4D(_) => ValueType::Vector4D,
            ShaderValue::Color3(_) => ValueType::Color3,
            ShaderValue::Color4(_) => ValueType::Color4,
            ShaderValue::Matrix3x3(_) => ValueType::Matrix3x3,
            ShaderValue::Matrix4x4(_) => ValueType::Matrix4x4,
        }
    }

    /// Packed bytes of this value
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ShaderValue::Int32(v) => v.to_ne_bytes().to_vec(),
            ShaderValue::UInt32(v) => v.to_ne_bytes().to_vec(),
            ShaderValue::Float(v) => v.to_ne_bytes().to_vec(),
            ShaderValue::Vector2D(v) => bytemuck::bytes_of(v).to_vec(),
            ShaderValue::Vector3D(v) | ShaderValue::Color3(v) => bytemuck::bytes_of(v).to_vec(),
            ShaderValue::Vector4D(v) | ShaderValue::Color4(v) => {
                bytemuck::cast_slice(&v.to_array()).to_vec()
            }
            ShaderValue::Matrix3x3(m) => bytemuck::bytes_of(m).to_vec(),
            ShaderValue::Matrix4x4(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
        }
    }

    /// Decode one element of `value_type` from the start of `bytes`
    ///
    /// Returns None if `bytes` is shorter than one element.
    pub fn from_bytes(value_type: ValueType, bytes: &[u8]) -> Option<Self> {
        let size = value_type.size_bytes();
        if bytes.len() < size {
            return None;
        }
        let bytes = &bytes[..size];
        let floats = |count: usize| -> Vec<f32> {
            (0..count)
                .map(|i| bytemuck::pod_read_unaligned::<f32>(&bytes[i * 4..i * 4 + 4]))
                .collect()
        };

        let value = match value_type {
            ValueType::Int32 => ShaderValue::Int32(bytemuck::pod_read_unaligned(bytes)),
            ValueType::UInt32 => ShaderValue::UInt32(bytemuck::pod_read_unaligned(bytes)),
            ValueType::Float => ShaderValue::Float(bytemuck::pod_read_unaligned(bytes)),
            ValueType::Vector2D => ShaderValue::Vector2D(Vec2::from_slice(&floats(2))),
            ValueType::Vector3D => ShaderValue::Vector3D(Vec3::from_slice(&floats(3))),
            ValueType::Vector4D => ShaderValue::Vector4D(Vec4::from_slice(&floats(4))),
            ValueType::Color3 => ShaderValue::Color3(Vec3::from_slice(&floats(3))),
            ValueType::Color4 => ShaderValue::Color4(Vec4::from_slice(&floats(4))),
            ValueType::Matrix3x3 => ShaderValue::Matrix3x3(Mat3::from_cols_slice(&floats(9))),
            ValueType::Matrix4x4 => ShaderValue::Matrix4x4(Mat4::from_cols_slice(&floats(16))),
        };
        Some(value)
    }
}

#[cfg(test)]
#[path = "value_type_tests.rs"]
mod tests;
