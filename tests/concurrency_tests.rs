//! Concurrency and thread safety tests for the identification service

mod common;

use std::sync::Arc;
use std::thread;

use common::{
    arch, assert_not_identified, bmp, broad_whorl, noise, steep_arch, whorl, wide_arch, wide_whorl,
    write_scan,
};
use nidprint::{
    EnrollmentSource, FingerprintPipeline, IdentificationService, IdentityKey, MatchConfig,
    MatchResult, enroll,
};
use tempfile::tempdir;

fn gallery(parallel: bool) -> IdentificationService {
    let dir = tempdir().unwrap();
    write_scan(dir.path(), 1, &wide_whorl());
    write_scan(dir.path(), 2, &wide_arch());
    write_scan(dir.path(), 3, &steep_arch());
    write_scan(dir.path(), 4, &broad_whorl());

    let pipeline = FingerprintPipeline::default();
    let (store, _) = enroll(&pipeline, &EnrollmentSource::new(dir.path(), 1, 4)).unwrap();
    IdentificationService::new(
        pipeline,
        Arc::new(store),
        MatchConfig::default().with_parallel(parallel),
    )
    .unwrap()
}

#[test]
fn concurrent_identify_same_query() {
    let service = Arc::new(gallery(false));
    let query = Arc::new(bmp(&steep_arch()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let query = Arc::clone(&query);
            thread::spawn(move || service.identify(&query).expect("identify should succeed"))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (i, result) in results.iter().enumerate() {
        assert_eq!(
            *result,
            MatchResult::Identified {
                key: IdentityKey(3),
                distance: 0.0
            },
            "Thread {i} produced a different result",
        );
    }
}

#[test]
fn concurrent_identify_mixed_queries() {
    let service = Arc::new(gallery(true));
    let queries = [
        (bmp(&wide_whorl()), Some(IdentityKey(1))),
        (bmp(&wide_arch()), Some(IdentityKey(2))),
        (bmp(&broad_whorl()), Some(IdentityKey(4))),
        (bmp(&noise(99)), None),
    ];
    assert_not_identified(&service, &queries[3].0);

    thread::scope(|scope| {
        for round in 0..3 {
            for (query, expected) in &queries {
                let service = &service;
                scope.spawn(move || {
                    let result = service.identify(query).unwrap();
                    assert_eq!(result.key(), *expected, "round {round}");
                });
            }
        }
    });
}

#[test]
fn parallel_and_sequential_scans_agree() {
    let sequential = gallery(false);
    let parallel = gallery(true);
    for query in [bmp(&whorl(10.0)), bmp(&arch(0.9, 7.0)), bmp(&noise(3))] {
        assert_eq!(
            sequential.identify(&query).unwrap(),
            parallel.identify(&query).unwrap()
        );
        assert_eq!(
            sequential.candidates(&query, 4).unwrap(),
            parallel.candidates(&query, 4).unwrap()
        );
    }
}

#[test]
fn cloned_service_shares_gallery() {
    let service = gallery(false);
    let clone = service.clone();
    assert!(Arc::ptr_eq(service.store(), clone.store()));
}
