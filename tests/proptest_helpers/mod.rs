#![allow(dead_code)]

use img2eq::{BinaryMask, TurnPolicy};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Random masks up to 16x16 with roughly `density` foreground.
pub fn arb_mask() -> BoxedStrategy<BinaryMask> {
    (1u32..=16, 1u32..=16, 0.1f64..0.9)
        .prop_flat_map(|(w, h, density)| {
            proptest::collection::vec(proptest::bool::weighted(density), (w * h) as usize)
                .prop_map(move |data| BinaryMask::new(w, h, data).unwrap())
        })
        .boxed()
}

pub fn arb_turn_policy() -> BoxedStrategy<TurnPolicy> {
    prop_oneof![
        Just(TurnPolicy::Black),
        Just(TurnPolicy::White),
        Just(TurnPolicy::Left),
        Just(TurnPolicy::Right),
        Just(TurnPolicy::Minority),
        Just(TurnPolicy::Majority),
    ]
    .boxed()
}
