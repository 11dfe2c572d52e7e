/// Min-max scale into `[0, 1]`. A tied set (including a single score) maps
/// to all `1.0`.
pub fn normalize(scores: &[f32]) -> Vec<f32> {
    let Some(&first) = scores.first() else { return Vec::new() };
    let (min, max) = scores.iter().fold((first, first), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let span = max - min;
    if span <= 0.0 { return vec![1.0; scores.len()]; }
    scores.iter().map(|&s| (s - min) / span).collect()
}
