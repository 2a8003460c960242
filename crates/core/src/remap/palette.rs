//! Greedy palette assignment.

use rand::Rng;
use restyle_protocol::Rgb;

/// Fallback replacement palette used when the caller-supplied source is
/// unavailable. A small neutral set so the remap flow never blocks.
pub const BUILTIN_PALETTE: &[Rgb] = &[
    Rgb::new(0x1a, 0x1a, 0x2e), // ink
    Rgb::new(0x16, 0x21, 0x3e), // navy
    Rgb::new(0x0f, 0x34, 0x60), // ocean
    Rgb::new(0x53, 0x3d, 0x8f), // violet
    Rgb::new(0xe9, 0x45, 0x60), // coral
    Rgb::new(0xf5, 0xf5, 0xf1), // paper
];

/// Assign each selected source color a replacement from the target palette.
///
/// Deterministic greedy nearest-brightness-then-distance pass:
///
/// 1. sources ascending by perceptual brightness,
/// 2. targets ascending by the same measure,
/// 3. each source takes the *unused* target minimizing Euclidean RGB
///    distance (first match wins ties),
/// 4. once targets are exhausted, remaining sources draw a uniformly-random
///    target — an intentional fallback so oversized selections still remap,
///    not an error.
pub fn assign(sources: &[Rgb], targets: &[Rgb]) -> Vec<(Rgb, Rgb)> {
    if targets.is_empty() {
        return Vec::new();
    }

    let mut sources: Vec<Rgb> = sources.to_vec();
    sources.sort_by(|a, b| a.brightness().total_cmp(&b.brightness()));
    let mut targets: Vec<Rgb> = targets.to_vec();
    targets.sort_by(|a, b| a.brightness().total_cmp(&b.brightness()));

    let mut used = vec![false; targets.len()];
    let mut rng = rand::rng();
    let mut pairs = Vec::with_capacity(sources.len());

    for source in sources {
        let best = targets
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .min_by_key(|(_, target)| source.distance_sq(target));
        let target = match best {
            Some((i, target)) => {
                used[i] = true;
                *target
            }
            // Palette exhausted: uniformly-random pick.
            None => targets[rng.random_range(0..targets.len())],
        };
        pairs.push((source, target));
    }
    pairs
}
