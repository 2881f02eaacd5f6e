use super::*;

fn new(source: u64, template: u64, rank: u32) -> NewMockup {
    NewMockup {
        source_id: SourceId(source),
        template_id: TemplateId(template),
        pack_id: None,
        variant: MockupVariant::Graded,
        rank,
        mime: "image/png",
        data: vec![rank as u8],
    }
}

#[tokio::test]
async fn save_upserts_per_source_template_and_variant() {
    let store = InMemoryMockupStore::new();
    let first = store.save(new(1, 10, 1)).await.unwrap();
    let again = store.save(new(1, 10, 3)).await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(*again.data, vec![3]);

    let mut clean = new(1, 10, 4);
    clean.variant = MockupVariant::Clean;
    let clean = store.save(clean).await.unwrap();
    assert_ne!(clean.id, first.id);
    assert_eq!(store.get(SourceId(1)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn get_orders_by_rank() {
    let store = InMemoryMockupStore::new();
    store.save(new(1, 10, 3)).await.unwrap();
    store.save(new(1, 11, 1)).await.unwrap();
    store.save(new(1, 12, 2)).await.unwrap();
    store.save(new(2, 10, 0)).await.unwrap();

    let ranks: Vec<_> = store
        .get(SourceId(1))
        .await
        .unwrap()
        .iter()
        .map(|m| m.rank)
        .collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn delete_all_only_touches_one_source() {
    let store = InMemoryMockupStore::new();
    store.save(new(1, 10, 1)).await.unwrap();
    store.save(new(1, 11, 2)).await.unwrap();
    store.save(new(2, 10, 1)).await.unwrap();

    assert_eq!(store.delete_all(SourceId(1)).await.unwrap(), 2);
    assert!(store.get(SourceId(1)).await.unwrap().is_empty());
    assert_eq!(store.get(SourceId(2)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn channel_flags_are_independent() {
    let store = InMemoryMockupStore::new();
    let m = store.save(new(1, 10, 1)).await.unwrap();
    assert!(m.include_marketplace && m.include_storefront);

    let m = store
        .set_channel_inclusion(m.id, Channel::Marketplace, false)
        .await
        .unwrap();
    assert!(!m.included_in(Channel::Marketplace));
    assert!(m.included_in(Channel::Storefront));
}

#[tokio::test]
async fn storefront_primary_is_unique_per_source() {
    let store = InMemoryMockupStore::new();
    let a = store.save(new(1, 10, 1)).await.unwrap();
    let b = store.save(new(1, 11, 2)).await.unwrap();
    let other = store.save(new(2, 10, 1)).await.unwrap();
    assert!(a.storefront_primary);
    assert!(!b.storefront_primary);

    store.set_storefront_primary(b.id).await.unwrap();
    let rows = store.get(SourceId(1)).await.unwrap();
    let primaries: Vec<_> = rows.iter().filter(|m| m.storefront_primary).map(|m| m.id).collect();
    assert_eq!(primaries, vec![b.id]);
    assert!(store.get_by_id(other.id).await.unwrap().storefront_primary);
}

#[tokio::test]
async fn pack_references_are_deduplicated() {
    let store = InMemoryMockupStore::new();
    for (source, template) in [(1, 10), (1, 11), (3, 10)] {
        let mut m = new(source, template, 1);
        m.pack_id = Some(PackId(5));
        store.save(m).await.unwrap();
    }
    store.save(new(2, 10, 1)).await.unwrap();

    assert_eq!(
        store.sources_referencing_pack(PackId(5)).await.unwrap(),
        vec![SourceId(1), SourceId(3)]
    );
}

#[tokio::test]
async fn external_ids_round_trip_and_missing_rows_error() {
    let store = InMemoryMockupStore::new();
    let m = store.save(new(1, 10, 1)).await.unwrap();
    let ext = ExternalImage {
        image_id: "img-1".to_string(),
        url: Some("https://cdn.example/img-1.jpg".to_string()),
    };
    store.set_external(m.id, Some(ext.clone())).await.unwrap();
    assert_eq!(store.get_by_id(m.id).await.unwrap().external, Some(ext));

    assert!(matches!(
        store.set_external(MockupId(999), None).await,
        Err(MockupError::NotFound { .. })
    ));
}

#[tokio::test]
async fn rows_saved_after_a_wipe_start_a_fresh_set() {
    let store = InMemoryMockupStore::new();
    let old = store.save(new(1, 10, 1)).await.unwrap();
    store.save(new(1, 11, 2)).await.unwrap();
    store.delete_all(SourceId(1)).await.unwrap();
    assert!(store.get_by_id(old.id).await.is_err());
    assert_eq!(store.delete_all(SourceId(1)).await.unwrap(), 0);

    let first = store.save(new(1, 11, 1)).await.unwrap();
    let second = store.save(new(1, 12, 2)).await.unwrap();
    assert!(first.storefront_primary);
    assert!(!second.storefront_primary);
    store.set_storefront_primary(second.id).await.unwrap();

    let rows = store.get(SourceId(1)).await.unwrap();
    assert_eq!(
        rows.iter().map(|m| (m.id, m.storefront_primary)).collect::<Vec<_>>(),
        vec![(first.id, false), (second.id, true)]
    );
}
