//! Shared color palettes, referenced by index.

/// General-purpose palette (d3 Category10). `PALETTE[0]` is the primary
/// series color.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", // blue
    "#ff7f0e", // orange
    "#2ca02c", // green
    "#d62728", // red
    "#9467bd", // purple
    "#8c564b", // brown
    "#e377c2", // pink
    "#7f7f7f", // gray
    "#bcbd22", // olive
    "#17becf", // cyan
];

/// d3 Category20c, used for pie slices.
pub const CATEGORY20C: [&str; 20] = [
    "#3182bd", "#6baed6", "#9ecae1", "#c6dbef", "#e6550d", "#fd8d3c", "#fdae6b", "#fdd0a2",
    "#31a354", "#74c476", "#a1d99b", "#c7e9c0", "#756bb1", "#9e9ac8", "#bcbddc", "#dadaeb",
    "#636363", "#969696", "#bdbdbd", "#d9d9d9",
];

/// Pick a color, wrapping around when `idx` exceeds the palette size.
#[inline]
pub fn cycle(palette: &[&'static str], idx: usize) -> &'static str {
    palette[idx % palette.len()]
}

/// First `n` colors of `palette`, repeating it as often as needed.
pub fn take_cycled(palette: &[&'static str], n: usize) -> Vec<String> {
    (0..n).map(|i| cycle(palette, i).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_repeat_past_palette_size() {
        let colors = take_cycled(&CATEGORY20C, 22);
        assert_eq!(colors.len(), 22);
        assert_eq!(colors[20], CATEGORY20C[0]);
        assert_eq!(colors[21], CATEGORY20C[1]);
    }
}
