//! Property-based tests for cosine generator invariants.

use dg_math::{
    cos_degrees, CosineGenerator, DataGenerator, GeneratorEvent, GeneratorState,
};
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6f64..1.0e6,
        any::<f64>().prop_filter("finite", |v| v.is_finite()),
    ]
}

fn rotation() -> impl Strategy<Value = f64> {
    finite().prop_filter("nonzero", |v| *v != 0.0)
}

fn non_finite() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY)
    ]
}

fn same_value(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-12
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn construction_accepts_all_valid_pairs(a in finite(), r in rotation()) {
        let g = CosineGenerator::new(a, r).expect("valid pair rejected");
        prop_assert_eq!(g.starting_angle(), a);
        prop_assert_eq!(g.current_angle(), a);
        prop_assert_eq!(g.rotation(), r);
    }

    #[test]
    fn construction_rejects_bad_input(a in finite(), bad in non_finite()) {
        prop_assert!(CosineGenerator::new(bad, 1.0).is_err());
        prop_assert!(CosineGenerator::new(a, bad).is_err());
        prop_assert!(CosineGenerator::new(a, 0.0).is_err());
    }

    #[test]
    fn next_yields_pre_advance_cosine(a in finite(), r in rotation()) {
        let mut g = CosineGenerator::new(a, r).unwrap();
        let before = g.state();
        let (value, event) = g.next_with_event();

        prop_assert!(same_value(value, cos_degrees(before.current_angle)));

        let advanced = before.current_angle + before.rotation;
        if advanced.is_finite() {
            prop_assert_eq!(event, None);
            prop_assert_eq!(g.current_angle(), advanced);
            prop_assert_eq!(g.starting_angle(), before.starting_angle);
            prop_assert_eq!(g.reset_count(), 0);
        } else {
            prop_assert_eq!(event, Some(GeneratorEvent::Reset));
            prop_assert_eq!(g.state(), GeneratorState::initial());
            prop_assert_eq!(g.reset_count(), 1);
        }
    }

    #[test]
    fn state_stays_finite_over_many_steps(a in finite(), r in rotation(), steps in 1usize..64) {
        let mut g = CosineGenerator::new(a, r).unwrap();
        for _ in 0..steps {
            g.next();
            let s = g.state();
            prop_assert!(s.starting_angle.is_finite());
            prop_assert!(s.current_angle.is_finite());
            prop_assert!(s.rotation.is_finite() && s.rotation != 0.0);
        }
    }

    #[test]
    fn seed_returns_previous_starting_angle(a in finite(), r in rotation(), x in any::<f64>()) {
        let mut g = CosineGenerator::new(a, r).unwrap();
        g.next();
        let rotation_before = g.rotation();
        let starting_before = g.starting_angle();

        let previous = g.seed(x);
        let expected = if x.is_finite() { x } else { 0.0 };

        prop_assert_eq!(previous, starting_before);
        prop_assert_eq!(g.starting_angle(), expected);
        prop_assert_eq!(g.current_angle(), expected);
        prop_assert_eq!(g.rotation(), rotation_before);
    }
}
