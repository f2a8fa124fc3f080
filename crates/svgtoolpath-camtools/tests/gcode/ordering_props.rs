use super::{assert_retraction_balanced, uncentered};
use proptest::prelude::*;
use svgtoolpath_camtools::{write_gcode, ToolpathOptimizer};
use svgtoolpath_core::Command;

fn strokes() -> impl Strategy<Value = Vec<Vec<(i32, i32)>>> {
    prop::collection::vec(
        prop::collection::vec((0..50i32, 0..50i32), 1..5),
        0..8,
    )
}

fn to_commands(strokes: &[Vec<(i32, i32)>]) -> Vec<Command> {
    strokes
        .iter()
        .flat_map(|stroke| {
            stroke.iter().enumerate().map(|(i, &(x, y))| {
                if i == 0 {
                    Command::travel(x as f64, y as f64)
                } else {
                    Command::extrude(x as f64, y as f64, 0.4)
                }
            })
        })
        .collect()
}

/// A stroke's points in whichever direction sorts first.
fn canonical(points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    let mut reversed = points.clone();
    reversed.reverse();
    points.min(reversed)
}

proptest! {
    #[test]
    fn reordering_keeps_every_stroke(strokes in strokes()) {
        let commands = to_commands(&strokes);
        let sorted = ToolpathOptimizer::sort_commands(&commands).unwrap();
        prop_assert_eq!(sorted.len(), commands.len());
        prop_assert_eq!(sorted.first(), commands.first());
        prop_assert!(sorted.iter().filter_map(Command::line_width).all(|w| w == 0.4));

        let mut before: Vec<_> = strokes.iter().cloned().map(canonical).collect();
        let mut after: Vec<_> = ToolpathOptimizer::split_strokes(&sorted)
            .unwrap()
            .into_iter()
            .map(|stroke| {
                canonical(
                    stroke
                        .iter()
                        .map(|c| {
                            let p = c.position();
                            (p.x as i32, p.y as i32)
                        })
                        .collect(),
                )
            })
            .collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn retraction_stays_balanced(strokes in strokes(), height in 0.0..1.0f64) {
        let mut config = uncentered();
        config.reader.height = height;
        let output = write_gcode(&config, &to_commands(&strokes)).unwrap();
        assert_retraction_balanced(&output.gcode);
        prop_assert!(output.layers.layers().iter().all(|l| l.polygons.iter().all(|p| p.is_consistent())));
    }
}
