use super::*;

fn spec(corners: Vec<[f64; 2]>) -> TemplateSpec {
    TemplateSpec {
        name: "Living room".to_string(),
        scene_ref: "scenes/living.jpg".to_string(),
        scene_width: 1000,
        scene_height: 800,
        corners,
        blend_mode: BlendMode::Multiply,
    }
}

#[test]
fn valid_spec_becomes_typed_geometry() {
    let g = spec(vec![[10.0, 10.0], [110.0, 12.0], [108.0, 160.0], [12.0, 158.0]])
        .validate()
        .unwrap();
    assert_eq!(g.corners[1], Point::new(110.0, 12.0));
    assert_eq!(g.blend_mode, BlendMode::Multiply);
}

#[test]
fn wrong_corner_count_is_a_validation_error() {
    let err = spec(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]])
        .validate()
        .unwrap_err();
    assert!(matches!(err, MockupError::Validation(_)));
    assert!(err.to_string().contains("exactly 4 corners"));
}

#[test]
fn non_finite_and_empty_fields_are_rejected() {
    assert!(
        spec(vec![[f64::NAN, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
            .validate()
            .is_err()
    );
    let mut s = spec(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    s.scene_width = 0;
    assert!(s.validate().is_err());
    s.scene_width = 10;
    s.name = "  ".to_string();
    assert!(s.validate().is_err());
}

#[test]
fn wire_format_uses_corner_pairs_and_defaults_blend() {
    let json = serde_json::json!({
        "name": "Hall",
        "scene_ref": "hall.png",
        "scene_width": 100,
        "scene_height": 150,
        "corners": [[0, 0], [100, 0], [100, 150], [0, 150]]
    });
    let s: TemplateSpec = serde_json::from_value(json).unwrap();
    assert_eq!(s.blend_mode, BlendMode::Normal);
    let g = s.validate().unwrap();
    let out = serde_json::to_value(&g).unwrap();
    assert_eq!(out["corners"][2], serde_json::json!([100.0, 150.0]));
    assert_eq!(out["blend_mode"], "normal");
    assert_eq!(TemplateSpec::from(&g), s);
}
