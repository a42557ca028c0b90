use crate::model::{Rgba, Sample, Series, SeriesPoint};
use palette::{FromColor, Lch, Srgb};
use rand::Rng;
use std::collections::BTreeSet;

/// Every key seen in any sample, ordered by its count in the last sample
/// (largest first) and then by name.
pub fn display_order(samples: &[Sample]) -> Vec<String> {
    let Some(last) = samples.last() else {
        return Vec::new();
    };

    let all_keys: BTreeSet<&str> = samples
        .iter()
        .flat_map(|s| s.measurements.keys().map(String::as_str))
        .collect();

    let mut keys: Vec<String> = all_keys.into_iter().map(String::from).collect();
    keys.sort_by(|a, b| last.count(b).cmp(&last.count(a)).then_with(|| a.cmp(b)));
    keys
}

/// Share of each key in `sample`, in percent. All zero when the sample has
/// no measurements at all.
pub fn instantaneous_percentages(sample: &Sample, keys: &[String]) -> Vec<f64> {
    let total = sample.total();
    if total == 0 {
        return vec![0.0; keys.len()];
    }
    keys.iter()
        .map(|key| sample.count(key) as f64 / total as f64 * 100.0)
        .collect()
}

/// Builds one stacked series per key: at every commit index the value of the
/// K-th series is the summed percentage of the first K keys.
pub fn build_series(samples: &[Sample]) -> Vec<Series> {
    let keys = display_order(samples);
    let mut rng = rand::thread_rng();

    let mut series: Vec<Series> = keys
        .iter()
        .map(|key| Series {
            label: key.clone(),
            color: random_color(&mut rng),
            points: Vec::with_capacity(samples.len()),
        })
        .collect();

    let mut empty_commits = Vec::new();
    for (index, sample) in samples.iter().enumerate() {
        if sample.total() == 0 {
            empty_commits.push(sample.commit.short_id().to_string());
        }

        let mut cumulative = 0.0;
        for (s, percent) in series
            .iter_mut()
            .zip(instantaneous_percentages(sample, &keys))
        {
            cumulative += percent;
            s.points.push(SeriesPoint { x: index, y: cumulative });
        }
    }

    if !empty_commits.is_empty() {
        tracing::warn!(
            commits = ?empty_commits,
            "commits without measurements are plotted as 0%"
        );
    }

    series
}

fn random_color<R: Rng>(rng: &mut R) -> Rgba {
    let hue = rng.gen_range(0.0f32..360.0f32);
    let color = Lch::new(65.0f32, 70.0f32, hue);
    let srgb: Srgb<f32> = Srgb::from_color(color);
    let (r, g, b) = srgb.into_components();
    Rgba {
        r: (r * 255.0f32) as u8,
        g: (g * 255.0f32) as u8,
        b: (b * 255.0f32) as u8,
        a: 255,
    }
}
