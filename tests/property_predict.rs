//! Property-based tests for the prediction path
//!
//! Exercises the demo model over the full input space the schema admits:
//! any finite numeric values combined with any in-vocabulary categorical
//! values must produce a finite prediction, and out-of-vocabulary values
//! must always be rejected.

use proptest::prelude::*;

use tasar::frame::Row;
use tasar::model::{CostPredictor, LinearCostModel};
use tasar::TasarError;

fn patient_row(
    age: f64,
    sex: &str,
    bmi: f64,
    children: i64,
    smoker: &str,
    region: &str,
) -> Row {
    Row::new()
        .with("age", age)
        .with("sex", sex)
        .with("bmi", bmi)
        .with("children", children)
        .with("smoker", smoker)
        .with("region", region)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_valid_inputs_predict_finite(
        age in 0.0f64..120.0,
        sex in prop::sample::select(vec!["female", "male"]),
        bmi in 10.0f64..80.0,
        children in 0i64..10,
        smoker in prop::sample::select(vec!["no", "yes"]),
        region in prop::sample::select(vec![
            "northeast", "northwest", "southeast", "southwest",
        ]),
    ) {
        let model = LinearCostModel::demo();
        let row = patient_row(age, sex, bmi, children, smoker, region);
        let charges = model.predict_one(&row).expect("valid input");
        prop_assert!(charges.is_finite());
    }

    #[test]
    fn prop_predictions_are_deterministic(
        age in 0.0f64..120.0,
        bmi in 10.0f64..80.0,
        children in 0i64..10,
    ) {
        let model = LinearCostModel::demo();
        let row = patient_row(age, "male", bmi, children, "no", "northeast");
        let first = model.predict_one(&row).expect("valid input");
        let second = model.predict_one(&row).expect("valid input");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_unknown_region_always_rejected(
        region in "[a-z]{1,12}",
    ) {
        prop_assume!(!matches!(
            region.as_str(),
            "northeast" | "northwest" | "southeast" | "southwest"
        ));

        let model = LinearCostModel::demo();
        let row = patient_row(30.0, "female", 25.0, 1, "no", &region);
        let result = model.predict_one(&row);
        let is_unknown_category =
            matches!(result, Err(TasarError::UnknownCategory { .. }));
        prop_assert!(is_unknown_category);
    }

    #[test]
    fn prop_age_is_monotonic(
        age in 0.0f64..119.0,
        delta in 0.5f64..10.0,
    ) {
        let model = LinearCostModel::demo();
        let younger = patient_row(age, "female", 25.0, 0, "no", "southeast");
        let older = patient_row(age + delta, "female", 25.0, 0, "no", "southeast");

        let a = model.predict_one(&younger).expect("valid input");
        let b = model.predict_one(&older).expect("valid input");
        prop_assert!(b >= a); // positive age coefficient
    }
}
