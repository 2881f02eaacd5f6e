use super::*;
use crate::market::memory::InMemoryListingService;

const LISTING: ListingId = ListingId(77);

fn entries(n: u64) -> Vec<SyncEntry> {
    (1..=n)
        .map(|i| SyncEntry {
            mockup_id: MockupId(i),
            kind: MockupVariant::Graded,
            mime: "image/jpeg",
            bytes: Arc::new(vec![i as u8]),
        })
        .collect()
}

fn fast() -> SyncOptions {
    SyncOptions {
        write_delay: Duration::ZERO,
        ..SyncOptions::default()
    }
}

fn never_empty(svc: &InMemoryListingService) {
    let counts = svc.observed_counts(LISTING);
    assert!(!counts.is_empty());
    assert!(counts.iter().all(|&c| c > 0), "observed counts {counts:?}");
}

#[tokio::test]
async fn replaces_existing_images_keeping_one_until_the_end() {
    let svc = InMemoryListingService::new();
    let seeded = svc.seed(LISTING, 3);

    let report = upload_mockups(&svc, "t", LISTING, &entries(4), true, &fast())
        .await
        .unwrap();

    assert_eq!(report.uploaded.len(), 4);
    assert_eq!(report.removed, 3);
    let images = svc.images(LISTING);
    assert_eq!(images.len(), 4);
    assert!(images.iter().all(|i| !seeded.contains(&i.image_id)));
    assert_eq!(images[0].image_id, report.uploaded[0].external_image_id);
    assert_eq!(
        report.uploaded.iter().map(|u| u.rank).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    never_empty(&svc);
}

#[tokio::test]
async fn fresh_listing_just_receives_uploads() {
    let svc = InMemoryListingService::new();
    let report = upload_mockups(&svc, "t", LISTING, &entries(2), false, &fast())
        .await
        .unwrap();
    assert_eq!(report.uploaded.len(), 2);
    assert_eq!(report.removed, 0);
    assert_eq!(svc.images(LISTING).len(), 2);
}

#[tokio::test]
async fn single_upload_failure_is_skipped() {
    let svc = InMemoryListingService::new();
    svc.seed(LISTING, 1);
    svc.fail_uploads_at(2);

    let report = upload_mockups(&svc, "t", LISTING, &entries(3), true, &fast())
        .await
        .unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(
        report.uploaded.iter().map(|u| u.mockup_id).collect::<Vec<_>>(),
        vec![MockupId(1), MockupId(3)]
    );
    assert_eq!(svc.images(LISTING).len(), 2);
    never_empty(&svc);
}

#[tokio::test]
async fn placeholder_survives_when_every_upload_fails() {
    let svc = InMemoryListingService::new();
    let seeded = svc.seed(LISTING, 2);
    svc.fail_uploads_at(1);
    svc.fail_uploads_at(2);

    let report = upload_mockups(&svc, "t", LISTING, &entries(2), true, &fast())
        .await
        .unwrap();
    assert!(report.uploaded.is_empty());
    let images = svc.images(LISTING);
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].image_id, seeded[1]);
    never_empty(&svc);
}

#[tokio::test]
async fn listing_failure_aborts_before_any_write() {
    let svc = InMemoryListingService::new();
    svc.seed(LISTING, 2);
    svc.fail_listing(true);

    assert!(
        upload_mockups(&svc, "t", LISTING, &entries(2), true, &fast())
            .await
            .is_err()
    );
    assert_eq!(svc.images(LISTING).len(), 2);
}

#[tokio::test]
async fn full_listing_swaps_placeholder_out_before_last_slot() {
    let svc = InMemoryListingService::new();
    svc.seed(LISTING, 5);
    let opts = SyncOptions {
        max_images: 3,
        ..fast()
    };

    let report = upload_mockups(&svc, "t", LISTING, &entries(4), true, &opts)
        .await
        .unwrap();
    assert_eq!(report.uploaded.len(), 3);
    assert_eq!(report.dropped, 1);
    assert_eq!(svc.images(LISTING).len(), 3);
    assert!(svc.observed_counts(LISTING).iter().all(|&c| c <= 5 && c > 0));
    never_empty(&svc);
}

#[tokio::test(start_paused = true)]
async fn writes_are_paced() {
    let svc = InMemoryListingService::new();
    let opts = SyncOptions {
        write_delay: Duration::from_millis(100),
        ..SyncOptions::default()
    };
    let started = tokio::time::Instant::now();
    upload_mockups(&svc, "t", LISTING, &entries(3), false, &opts)
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(300));
}
