//! End-to-end pipeline scenarios (spec §8): a full generation run produces
//! a non-trivial city, the same seed reproduces it exactly, and malformed
//! configuration is rejected before any generation work starts.

use citygen::geometry::Vector;
use citygen::{GenError, Params, Pipeline};

/// A small world with a tight separation distance relative to its size, so
/// every road class reliably produces several crossing streamlines (and
/// therefore at least one closed block) without the test depending on the
/// library's full-size defaults.
fn small_params(seed: u64) -> Params {
    let mut params = Params::default();
    params.world_dimensions = Vector::new(800.0, 800.0);
    params.seed = seed;
    for sp in [&mut params.streamlines.main, &mut params.streamlines.major, &mut params.streamlines.minor] {
        sp.dsep = 100.0;
        sp.dtest = 50.0;
        sp.seed_tries = 80;
    }
    params
}

#[test]
fn full_run_produces_roads_blocks_lots_and_buildings() {
    let params = small_params(7);
    let mut pipeline = Pipeline::new(params);
    pipeline.run().expect("a default-shaped params document should never fail generation");
    let map = pipeline.into_map();

    assert!(!map.main_roads.is_empty(), "expected at least one main road streamline");
    assert!(map.graph.is_some(), "planar graph should be built once roads exist");
    assert!(!map.blocks.is_empty(), "expected at least one block face");
    assert!(!map.lots.is_empty(), "expected at least one subdivided lot");
    assert_eq!(map.lots.len(), map.buildings.len(), "every lot should get exactly one building");
}

#[test]
fn same_seed_reproduces_the_same_city() {
    let run = |seed| {
        let mut pipeline = Pipeline::new(small_params(seed));
        pipeline.run().unwrap();
        pipeline.into_map()
    };

    let a = run(99);
    let b = run(99);

    assert_eq!(a.main_roads.len(), b.main_roads.len());
    assert_eq!(a.major_roads.len(), b.major_roads.len());
    assert_eq!(a.minor_roads.len(), b.minor_roads.len());
    assert_eq!(a.lots.len(), b.lots.len());
    for (ra, rb) in a.main_roads.iter().zip(b.main_roads.iter()) {
        assert_eq!(ra.dense.len(), rb.dense.len());
        for (pa, pb) in ra.dense.iter().zip(rb.dense.iter()) {
            assert!((pa.x - pb.x).abs() < 1e-9);
            assert!((pa.y - pb.y).abs() < 1e-9);
        }
    }
}

#[test]
fn different_seeds_usually_diverge() {
    let run = |seed| {
        let mut pipeline = Pipeline::new(small_params(seed));
        pipeline.run().unwrap();
        pipeline.into_map()
    };

    let a = run(1);
    let b = run(2);
    assert!(
        a.main_roads.len() != b.main_roads.len() || a.lots.len() != b.lots.len(),
        "two different seeds produced an identical city; RNG draws may not be seed-dependent"
    );
}

#[test]
fn step_advances_one_stage_at_a_time_and_matches_run() {
    use citygen::StageId;

    let mut stepped = Pipeline::new(small_params(13));
    let mut stages_seen = Vec::new();
    loop {
        stages_seen.push(stepped.stage());
        let more = stepped.step(u32::MAX).unwrap();
        if !more {
            break;
        }
    }
    assert_eq!(stepped.stage(), StageId::Done);
    assert!(stages_seen.contains(&StageId::Coastline));
    assert!(stages_seen.contains(&StageId::Buildings));

    let mut run_to_completion = Pipeline::new(small_params(13));
    run_to_completion.run().unwrap();

    assert_eq!(stepped.into_map().lots.len(), run_to_completion.into_map().lots.len());
}

#[test]
fn config_round_trips_through_json() {
    let params = small_params(5);
    let json = serde_json::to_string(&params).expect("Params must serialize");
    let reloaded = Params::from_json_str(&json).expect("serialized Params must reparse and validate");
    assert_eq!(params, reloaded);
}

#[test]
fn invalid_zoom_is_rejected_before_generation() {
    let mut params = Params::default();
    params.zoom = 0.0;
    let json = serde_json::to_string(&params).unwrap();
    match Params::from_json_str(&json) {
        Err(GenError::ParamInvalid(msg)) => assert!(msg.contains("zoom")),
        other => panic!("expected ParamInvalid for zoom, got {other:?}"),
    }
}

#[test]
fn invalid_world_dimensions_are_rejected() {
    let mut params = Params::default();
    params.world_dimensions = Vector::new(0.0, 500.0);
    assert!(matches!(params.validate(), Err(GenError::ParamInvalid(_))));
}
