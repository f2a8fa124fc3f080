use proptest::prelude::*;
use svgtoolpath_designer::{parse_transform_list, AffineTransform};

fn transform_function() -> impl Strategy<Value = (String, AffineTransform)> {
    prop_oneof![
        (-100.0..100.0f64, -100.0..100.0f64)
            .prop_map(|(x, y)| (format!("translate({x}, {y})"), AffineTransform::translate(x, y))),
        (0.1..5.0f64, 0.1..5.0f64)
            .prop_map(|(x, y)| (format!("scale({x} {y})"), AffineTransform::scale(x, y))),
        (-360.0..360.0f64).prop_map(|a| (format!("rotate({a})"), AffineTransform::rotate(a))),
        (-360.0..360.0f64, -50.0..50.0f64, -50.0..50.0f64).prop_map(|(a, cx, cy)| {
            (
                format!("rotate({a},{cx},{cy})"),
                AffineTransform::rotate_around(a, cx, cy),
            )
        }),
        (-60.0..60.0f64).prop_map(|a| (format!("skewX({a})"), AffineTransform::skew(a, 0.0))),
        (-60.0..60.0f64).prop_map(|a| (format!("skewY({a})"), AffineTransform::skew(0.0, a))),
    ]
}

proptest! {
    #[test]
    fn composed_list_equals_outermost_first_application(
        functions in prop::collection::vec(transform_function(), 0..6),
        x in -100.0..100.0f64,
        y in -100.0..100.0f64,
    ) {
        let list = functions
            .iter()
            .map(|(text, _)| text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let composed = parse_transform_list(&list).apply(x, y);

        // The last function applies first.
        let expected = functions
            .iter()
            .rev()
            .fold((x, y), |(px, py), (_, t)| t.apply(px, py));

        let tolerance = 1e-6 * (1.0 + expected.0.abs().max(expected.1.abs()));
        prop_assert!((composed.0 - expected.0).abs() < tolerance, "{list}: {composed:?} vs {expected:?}");
        prop_assert!((composed.1 - expected.1).abs() < tolerance, "{list}: {composed:?} vs {expected:?}");
    }

    #[test]
    fn garbage_never_panics(input in "\\PC{0,40}") {
        let _ = parse_transform_list(&input);
    }
}
