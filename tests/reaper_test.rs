//! Integration tests for reclaiming unused stream directories.

mod common;

use std::time::{Duration, SystemTime};

use common::TestHarness;
use tc_core::{GenerationKey, Variant};

#[tokio::test]
async fn stale_generated_directory_is_swept() {
    let h = TestHarness::new();
    let stale = h.register(31);
    let fresh = h.register(32);

    for id in [stale, fresh] {
        h.ctx
            .engine
            .ensure_generating(GenerationKey::variant(id, Variant::Aac96))
            .await
            .unwrap();
    }

    std::fs::File::options()
        .write(true)
        .open(h.layout().usage_marker(stale))
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(3 * 3600))
        .unwrap();

    let report = tc_stream::sweep(h.layout().hls_root(), h.ctx.config.reaper.ttl()).unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.removed, 1);
    assert!(!h.layout().asset_dir(stale).exists());
    assert!(h.layout().completion_marker(fresh, Variant::Aac96).exists());

    // A swept asset regenerates on the next request.
    let served = h.ctx.engine.serve(stale, "96k_1.m4s").await.unwrap();
    assert_eq!(served.body, b"96k segment 1");
}
