// src/plot_framework.rs

use log::{info, warn};
use plotters::backend::BitMapBackend;
use plotters::chart::{ChartBuilder, SeriesLabelPosition};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{PathElement, Polygon, Rectangle, Text};
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, RED, WHITE};
use plotters::style::{Color, IntoFont, RGBColor};

use std::ops::Range;
use std::path::Path;

use crate::constants::{
    FONT_SIZE_AXIS_LABEL, FONT_SIZE_CHART_TITLE, FONT_SIZE_LEGEND, FONT_SIZE_MAIN_TITLE,
    FONT_SIZE_MESSAGE, LINE_WIDTH_LEGEND,
};
use crate::{Error, Result};

type PanelArea<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Calculate plot range with padding.
/// Adds 15% padding, or a fixed padding for very small ranges.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-6 { 0.5 } else { range * 0.15 };
    (min - padding, max + padding)
}

/// Padded x and y ranges covering every finite point of `series` and `bands`.
/// None when nothing finite is plotted.
pub fn data_ranges(series: &[PlotSeries], bands: &[BandSeries]) -> Option<(Range<f64>, Range<f64>)> {
    let points = series
        .iter()
        .flat_map(|s| s.data.iter().copied())
        .chain(
            bands
                .iter()
                .flat_map(|b| b.data.iter().flat_map(|&(x, lo, hi)| [(x, lo), (x, hi)])),
        )
        .filter(|(x, y)| x.is_finite() && y.is_finite());

    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for (x, y) in points {
        bounds = Some(match bounds {
            None => (x, x, y, y),
            Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
        });
    }
    let (x_min, x_max, y_min, y_max) = bounds?;
    let x_max = if x_max > x_min { x_max } else { x_min + 1.0 };
    let (y_lo, y_hi) = calculate_range(y_min, y_max);
    Some((x_min..x_max, y_lo..y_hi))
}

/// Y-axis tick label: more decimals the smaller the magnitude, `k` above a thousand.
pub fn format_y_label(y: f64) -> String {
    let magnitude = y.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", y / 1_000_000.0)
    } else if magnitude >= 1000.0 {
        format!("{:.0}k", y / 1000.0)
    } else if magnitude >= 10.0 || y == 0.0 {
        format!("{y:.0}")
    } else if magnitude >= 1.0 {
        format!("{y:.1}")
    } else if magnitude >= 0.1 {
        format!("{y:.2}")
    } else {
        format!("{y:.3}")
    }
}

/// Draw a "Data Unavailable" message on a panel.
pub fn draw_unavailable_message(area: &PanelArea, panel_name: &str, reason: &str) -> Result<()> {
    // Constants for text rendering
    const CHAR_WIDTH_RATIO: f32 = 0.6; // Approximate character width relative to font size
    const LINE_HEIGHT_SPACING: i32 = 4;

    let (x_range, y_range) = area.get_pixel_range();
    let (width, height) = (
        (x_range.end - x_range.start) as u32,
        (y_range.end - y_range.start) as u32,
    );
    let message = format!("{panel_name} Data Unavailable:\n{reason}");

    let estimated_char_width = (FONT_SIZE_MESSAGE as f32 * CHAR_WIDTH_RATIO) as i32;
    let estimated_line_height = FONT_SIZE_MESSAGE + LINE_HEIGHT_SPACING;

    let lines: Vec<&str> = message.split('\n').collect();
    let max_line_length = lines.iter().map(|line| line.len()).max().unwrap_or(0);
    let estimated_text_width = max_line_length.saturating_mul(estimated_char_width as usize) as i32;
    let estimated_text_height = lines.len().saturating_mul(estimated_line_height as usize) as i32;

    let center_x = width as i32 / 2 - estimated_text_width / 2;
    let center_y = height as i32 / 2 - estimated_text_height / 2;

    let text_style = ("sans-serif", FONT_SIZE_MESSAGE).into_font().color(&RED);
    area.draw(&Text::new(message, (center_x, center_y), text_style))
        .map_err(plot_err)?;
    Ok(())
}

#[derive(Clone)]
pub struct PlotSeries {
    pub data: Vec<(f64, f64)>,
    pub label: String,
    pub color: RGBColor,
    pub stroke_width: u32,
    pub opacity: f64,
}

impl PlotSeries {
    pub fn line(data: Vec<(f64, f64)>, label: impl Into<String>, color: RGBColor, stroke_width: u32) -> Self {
        Self {
            data,
            label: label.into(),
            color,
            stroke_width,
            opacity: 1.0,
        }
    }

    /// Unlabelled, translucent trace (e.g. one run among many).
    pub fn faint(data: Vec<(f64, f64)>, color: RGBColor, opacity: f64) -> Self {
        Self {
            data,
            label: String::new(),
            color,
            stroke_width: 1,
            opacity,
        }
    }
}

/// Filled area between a lower and an upper curve, as `(x, lower, upper)` points.
#[derive(Clone)]
pub struct BandSeries {
    pub data: Vec<(f64, f64, f64)>,
    pub label: String,
    pub color: RGBColor,
    pub opacity: f64,
}

/// An x interval shaded over the full panel height (e.g. a detected shock).
#[derive(Clone)]
pub struct ShadedRegion {
    pub start: f64,
    pub end: f64,
    pub color: RGBColor,
    pub opacity: f64,
    pub label: String,
}

#[derive(Clone)]
pub struct PanelConfig {
    pub title: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub series: Vec<PlotSeries>,
    pub bands: Vec<BandSeries>,
    pub regions: Vec<ShadedRegion>,
    pub x_label: String,
    pub y_label: String,
}

impl PanelConfig {
    /// Panel with ranges fitted to its own data; None if there is nothing finite to plot.
    pub fn fitted(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        series: Vec<PlotSeries>,
        bands: Vec<BandSeries>,
    ) -> Option<Self> {
        let (x_range, y_range) = data_ranges(&series, &bands)?;
        Some(Self {
            title: title.into(),
            x_range,
            y_range,
            series,
            bands,
            regions: Vec::new(),
            x_label: x_label.into(),
            y_label: y_label.into(),
        })
    }

    fn has_data(&self) -> bool {
        self.series.iter().any(|s| !s.data.is_empty()) || self.bands.iter().any(|b| !b.data.is_empty())
    }
}

fn draw_panel(area: &PanelArea, panel: &PanelConfig) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", FONT_SIZE_CHART_TITLE))
        .margin(5)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(panel.x_range.clone(), panel.y_range.clone())
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(&panel.x_label)
        .y_desc(&panel.y_label)
        .x_labels(20)
        .y_labels(10)
        .y_label_formatter(&|y| format_y_label(*y))
        .light_line_style(WHITE.mix(0.7))
        .label_style(("sans-serif", FONT_SIZE_AXIS_LABEL))
        .draw()
        .map_err(plot_err)?;

    let mut legend_series_count = 0;

    // Shading first so data is drawn on top
    for region in &panel.regions {
        let start = region.start.clamp(panel.x_range.start, panel.x_range.end);
        let end = region.end.clamp(panel.x_range.start, panel.x_range.end);
        let fill = region.color.mix(region.opacity);
        let drawn = chart
            .draw_series(std::iter::once(Rectangle::new(
                [(start, panel.y_range.start), (end, panel.y_range.end)],
                fill.filled(),
            )))
            .map_err(plot_err)?;
        if !region.label.is_empty() {
            drawn.label(&region.label).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 20, y + 5)], fill.filled())
            });
            legend_series_count += 1;
        }
    }

    for band in &panel.bands {
        let points: Vec<(f64, f64, f64)> = band
            .data
            .iter()
            .copied()
            .filter(|(x, lo, hi)| x.is_finite() && lo.is_finite() && hi.is_finite())
            .collect();
        if points.len() < 2 {
            continue;
        }
        let outline: Vec<(f64, f64)> = points
            .iter()
            .map(|&(x, _, hi)| (x, hi))
            .chain(points.iter().rev().map(|&(x, lo, _)| (x, lo)))
            .collect();
        let fill = band.color.mix(band.opacity);
        let drawn = chart
            .draw_series(std::iter::once(Polygon::new(outline, fill.filled())))
            .map_err(plot_err)?;
        if !band.label.is_empty() {
            drawn.label(&band.label).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 20, y + 5)], fill.filled())
            });
            legend_series_count += 1;
        }
    }

    for s in &panel.series {
        let points = s.data.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite());
        let style = s.color.mix(s.opacity).stroke_width(s.stroke_width);
        let drawn = chart
            .draw_series(LineSeries::new(points, style))
            .map_err(plot_err)?;
        if !s.label.is_empty() {
            let color = s.color;
            drawn.label(&s.label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH_LEGEND))
            });
            legend_series_count += 1;
        }
    }

    if legend_series_count > 0 {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", FONT_SIZE_LEGEND))
            .draw()
            .map_err(plot_err)?;
    }
    Ok(())
}

/// Renders `panel_count` panels stacked vertically into one PNG.
///
/// `get_panel` returns the panel for an index, or None when its data could not
/// be produced; such panels, and panels without data or with empty ranges,
/// show a "Data Unavailable" message instead.
/// Returns whether at least one panel was drawn.
pub fn draw_stacked_plot<F>(
    output_path: &Path,
    size: (u32, u32),
    root_name: &str,
    panel_count: usize,
    mut get_panel: F,
) -> Result<bool>
where
    F: FnMut(usize) -> Option<PanelConfig>,
{
    let root_area = BitMapBackend::new(output_path, size).into_drawing_area();
    root_area.fill(&WHITE).map_err(plot_err)?;
    root_area
        .draw(&Text::new(
            root_name,
            (10, 10),
            ("sans-serif", FONT_SIZE_MAIN_TITLE).into_font().color(&BLACK),
        ))
        .map_err(plot_err)?;
    let margined_root_area = root_area.margin(50, 5, 5, 5);
    let sub_plot_areas = margined_root_area.split_evenly((panel_count.max(1), 1));
    let mut any_panel_plotted = false;

    for (panel_index, area) in sub_plot_areas.iter().enumerate().take(panel_count) {
        match get_panel(panel_index) {
            Some(panel) => {
                let has_data = panel.has_data();
                let valid_ranges =
                    panel.x_range.end > panel.x_range.start && panel.y_range.end > panel.y_range.start;
                if has_data && valid_ranges {
                    draw_panel(area, &panel)?;
                    any_panel_plotted = true;
                } else {
                    let reason = if !has_data { "No data points" } else { "Invalid ranges" };
                    draw_unavailable_message(area, &panel.title, reason)?;
                }
            }
            None => {
                draw_unavailable_message(area, &format!("Panel {}", panel_index + 1), "Calculation/Data Extraction Failed")?;
            }
        }
    }

    root_area.present().map_err(plot_err)?;
    if any_panel_plotted {
        info!("Stacked plot saved as '{}'", output_path.display());
    } else {
        warn!(
            "'{}' saved with placeholder messages only: no panel had data",
            output_path.display()
        );
    }
    Ok(any_panel_plotted)
}


// src/plot_framework.rs
