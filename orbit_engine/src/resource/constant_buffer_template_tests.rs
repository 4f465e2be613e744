use super::*;

#[test]
fn test_lighting_style_layout() {
    let mut builder = ShaderConstantBufferTemplate::builder();
    assert!(builder.add_entry(ValueType::Int32, 1, "count"));
    assert!(builder.add_entry(ValueType::Float, 1, "lights[0].strength"));
    let template = builder.build();

    assert_eq!(template.find_entry("count").map(|e| e.offset), Some(0));
    assert_eq!(template.find_entry("lights[0].strength").map(|e| e.offset), Some(4));
    assert_eq!(template.size(), 8);
}

#[test]
fn test_offset_law() {
    let types = [
        (ValueType::Matrix4x4, 1),
        (ValueType::Vector3D, 2),
        (ValueType::Float, 3),
        (ValueType::Color4, 1),
        (ValueType::Matrix3x3, 1),
        (ValueType::Vector2D, 4),
    ];
    let mut builder = ShaderConstantBufferTemplateBuilder::new();
    for (i, (value_type, count)) in types.iter().enumerate() {
        assert!(builder.add_entry(*value_type, *count, &format!("e{}", i)));
    }
    let template = builder.build();

    let mut expected = 0;
    for (i, (value_type, count)) in types.iter().enumerate() {
        let entry = template.entry(i).unwrap();
        assert_eq!(entry.offset, expected);
        expected += value_type.size_bytes() * count;
    }
    assert_eq!(template.size(), expected);
    assert_eq!(template.size(), 64 + 24 + 12 + 16 + 36 + 32);
}

#[test]
fn test_duplicate_name_rejected() {
    let mut builder = ShaderConstantBufferTemplateBuilder::new();
    assert!(builder.add_entry(ValueType::Float, 1, "alpha"));
    assert!(!builder.add_entry(ValueType::Matrix4x4, 1, "alpha"));
    assert_eq!(builder.size(), 4);
    assert_eq!(builder.build().entry_count(), 1);
}

#[test]
fn test_zero_count_rejected() {
    let mut builder = ShaderConstantBufferTemplateBuilder::new();
    assert!(!builder.add_entry(ValueType::Float, 0, "nothing"));
    assert!(builder.find_entry("nothing").is_none());
}

#[test]
fn test_find_shader_value_index() {
    let template = ShaderConstantBufferTemplateBuilder::new()
        .with_entry(ValueType::Float, 1, "a")
        .with_entry(ValueType::Float, 1, "b")
        .build();
    assert_eq!(template.find_shader_value_index("b"), Some(1));
    assert_eq!(template.find_shader_value_index("missing"), None);
}

#[test]
fn test_structural_compatibility() {
    let build = || {
        ShaderConstantBufferTemplateBuilder::new()
            .with_entry(ValueType::Vector4D, 1, "color")
            .build()
    };
    let a = build();
    let b = build();
    let other = ShaderConstantBufferTemplateBuilder::new()
        .with_entry(ValueType::Vector3D, 1, "color")
        .build();

    assert!(a.is_compatible(&a));
    assert!(a.is_compatible(&b));
    assert!(!a.is_compatible(&other));
}
