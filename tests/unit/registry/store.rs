use super::*;
use crate::compose::blend::BlendMode;

fn spec(name: &str) -> TemplateSpec {
    TemplateSpec {
        name: name.to_string(),
        scene_ref: format!("{name}.png"),
        scene_width: 200,
        scene_height: 100,
        corners: vec![[20.0, 10.0], [80.0, 10.0], [80.0, 90.0], [20.0, 90.0]],
        blend_mode: BlendMode::Normal,
    }
}

#[tokio::test]
async fn active_templates_follow_rank_then_id() {
    let r = Registry::new();
    let a = r.create_template(&spec("a"), true, 2).await.unwrap();
    let b = r.create_template(&spec("b"), true, 1).await.unwrap();
    let c = r.create_template(&spec("c"), false, 0).await.unwrap();
    let d = r.create_template(&spec("d"), true, 1).await.unwrap();

    let ids: Vec<_> = r.active_templates().await.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![b.id, d.id, a.id]);

    r.set_template_active(c.id, true, Some(0)).await.unwrap();
    assert_eq!(r.active_templates().await[0].id, c.id);
}

#[tokio::test]
async fn invalid_template_is_rejected_synchronously() {
    let r = Registry::new();
    let mut bad = spec("x");
    bad.corners.pop();
    assert!(matches!(
        r.create_template(&bad, true, 0).await,
        Err(MockupError::Validation(_))
    ));
    assert!(r.templates().await.is_empty());
}

#[tokio::test]
async fn pack_membership_keeps_explicit_order() {
    let r = Registry::new();
    let a = r.create_template(&spec("a"), true, 0).await.unwrap();
    let b = r.create_template(&spec("b"), true, 1).await.unwrap();
    let pack = r
        .create_pack(NewPack {
            name: "Cozy".to_string(),
            template_ids: vec![b.id, a.id],
            grade: "Warm".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(pack.grade, "warm");
    let resolved: Vec<_> = r
        .templates_by_ids(&pack.template_ids)
        .await
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(resolved, vec![b.id, a.id]);
}

#[tokio::test]
async fn pack_rejects_unknown_template_grade_and_duplicates() {
    let r = Registry::new();
    let a = r.create_template(&spec("a"), true, 0).await.unwrap();
    let unknown_template = NewPack {
        name: "p".to_string(),
        template_ids: vec![TemplateId(999)],
        grade: "none".to_string(),
    };
    assert!(r.create_pack(unknown_template).await.is_err());

    let unknown_grade = NewPack {
        name: "p".to_string(),
        template_ids: vec![a.id],
        grade: "sepia-ish".to_string(),
    };
    assert!(r.create_pack(unknown_grade).await.is_err());

    let dup = NewPack {
        name: "p".to_string(),
        template_ids: vec![a.id, a.id],
        grade: "none".to_string(),
    };
    assert!(r.create_pack(dup).await.is_err());
}

#[tokio::test]
async fn update_pack_reports_invalidation_only_for_output_changes() {
    let r = Registry::new();
    let a = r.create_template(&spec("a"), true, 0).await.unwrap();
    let b = r.create_template(&spec("b"), true, 1).await.unwrap();
    let pack = r
        .create_pack(NewPack {
            name: "p".to_string(),
            template_ids: vec![a.id],
            grade: "none".to_string(),
        })
        .await
        .unwrap();

    let (_, invalidates) = r
        .update_pack(
            pack.id,
            PackUpdate {
                name: Some("renamed".to_string()),
                ..PackUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(!invalidates);

    let (updated, invalidates) = r
        .update_pack(
            pack.id,
            PackUpdate {
                template_ids: Some(vec![a.id, b.id]),
                ..PackUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(invalidates);
    assert_eq!(updated.name, "renamed");

    let (_, invalidates) = r
        .update_pack(
            pack.id,
            PackUpdate {
                grade: Some("moody".to_string()),
                ..PackUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(invalidates);
}

#[tokio::test]
async fn deleting_template_drops_it_from_packs() {
    let r = Registry::new();
    let a = r.create_template(&spec("a"), true, 0).await.unwrap();
    let b = r.create_template(&spec("b"), true, 1).await.unwrap();
    let pack = r
        .create_pack(NewPack {
            name: "p".to_string(),
            template_ids: vec![a.id, b.id],
            grade: "none".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(r.packs_containing(a.id).await, vec![pack.id]);
    let (removed, touched) = r.delete_template(a.id).await.unwrap();
    assert_eq!(removed.id, a.id);
    assert_eq!(touched, vec![pack.id]);
    assert_eq!(r.pack(pack.id).await.unwrap().template_ids, vec![b.id]);
    assert!(r.packs_containing(a.id).await.is_empty());
    assert!(matches!(
        r.template(a.id).await,
        Err(MockupError::NotFound { .. })
    ));
}

#[tokio::test]
async fn seed_round_trip_keeps_ids_and_continues_numbering() {
    let json = serde_json::json!({
        "templates": [{
            "id": 7,
            "name": "Hall",
            "scene_ref": "hall.png",
            "scene_width": 100,
            "scene_height": 150,
            "corners": [[0, 0], [100, 0], [100, 150], [0, 150]]
        }],
        "packs": [{ "id": 3, "name": "Gallery", "template_ids": [7], "grade": "vivid" }]
    });
    let seed: RegistrySeed = serde_json::from_value(json).unwrap();
    let r = Registry::from_seed(seed).unwrap();
    assert!(r.template(TemplateId(7)).await.unwrap().active);
    assert_eq!(r.pack(PackId(3)).await.unwrap().grade, "vivid");

    let next = r.create_template(&spec("n"), true, 0).await.unwrap();
    assert_eq!(next.id, TemplateId(8));

    let exported = r.export().await;
    assert_eq!(exported.templates.len(), 2);
    assert_eq!(exported.packs[0].id, PackId(3));
}
