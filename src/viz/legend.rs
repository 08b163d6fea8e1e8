//! Right-hand legend panel for figures that carry a legend.

use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::wrap_text_to_width;

/// Draw a single-column list of color swatches and labels, wrapping long labels.
pub fn draw_legend_panel<DB: DrawingBackend>(
    legend_area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBColor)],
    font_px: u32,
) -> Result<()> {
    legend_area
        .fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let (w_u32, _) = legend_area.dim_in_pixel();
    let w = w_u32 as i32;

    let font_px = font_px.max(8);
    let line_h: i32 = font_px as i32 + 2;
    let row_gap: i32 = 4;
    let pad_x: i32 = 6;
    let swatch: i32 = 8;

    let label_style: TextStyle =
        TextStyle::from((FontFamily::SansSerif, font_px)).pos(Pos::new(HPos::Left, VPos::Center));

    let text_x = pad_x + swatch + 10;
    let max_text_w = (w - text_x - pad_x).max(40) as u32;
    let mut y = 12;

    for (label, color) in items {
        let lines = wrap_text_to_width(label, font_px, max_text_w);
        let block_h = (lines.len().max(1) as i32) * line_h;
        let center_y = y + block_h / 2;

        legend_area
            .draw(&Rectangle::new(
                [
                    (pad_x, center_y - swatch / 2),
                    (pad_x + swatch, center_y + swatch / 2),
                ],
                color.filled(),
            ))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        for (i, line) in lines.iter().enumerate() {
            let line_center_y = y + (i as i32) * line_h + line_h / 2;
            legend_area
                .draw(&Text::new(
                    line.as_str(),
                    (text_x, line_center_y),
                    label_style.clone(),
                ))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }

        y += block_h + row_gap;
    }
    Ok(())
}
