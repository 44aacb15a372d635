use interpreter::{sample, EvalError, Function};
use itertools::{Itertools, MinMaxResult};

use crate::config::DrawConfig;

/// Samples taken for every column of the plot.
const SAMPLES: usize = 10;

/// Largest plot area. Bigger areas are cut down to it.
pub const MAX_WIDTH: usize = 1000;
pub const MAX_HEIGHT: usize = 500;

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(y) => Some((y, y)),
        MinMaxResult::MinMax(min, max) => Some((min, max)),
    }
}

/// Plots a one-argument function as a block of `#` characters, followed by
/// the plotted x and y ranges. Points where the function fails are left
/// blank.
pub fn draw(function: &Function, config: &DrawConfig) -> Result<String, EvalError> {
    let width = config.width.min(MAX_WIDTH);
    let height = config.height.min(MAX_HEIGHT);
    let points = sample(function, config.range(), width * SAMPLES + 1)?;
    // neighbouring columns share their edge sample so steep parts stay connected
    let columns: Vec<Option<(f64, f64)>> = points
        .windows(SAMPLES + 1)
        .step_by(SAMPLES)
        .map(|column| bounds(column.iter().filter_map(|&(_, y)| y)))
        .collect();

    let (mut min, mut max) = bounds(columns.iter().flatten().flat_map(|&(lo, hi)| [lo, hi]))
        .unwrap_or((0.0, 0.0));
    if min == max {
        min -= 1.0;
        max += 1.0;
    }

    let mut out = String::with_capacity((width + 1) * height + 40);
    for i in 0..height {
        let top = max - (max - min) * i as f64 / height as f64;
        let bottom = max - (max - min) * (i + 1) as f64 / height as f64;
        for column in &columns {
            let hit = column.map_or(false, |(lo, hi)| lo <= top && hi >= bottom);
            out.push(if hit { '#' } else { ' ' });
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "[{:.2},{:.2}]x[{:.2},{:.2}]\n",
        config.from, config.to, min, max
    ));
    Ok(out)
}
