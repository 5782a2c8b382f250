//! SVG charts of movie counts

use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Deserialize;

use crate::errors::{MovieError, MovieResult};
use crate::models::{AggregateRow, Genre, YearCount};

const VIRIDIS: [&str; 5] = ["#440154", "#3B528B", "#21918C", "#5EC962", "#FDE725"];
const TURBO: [&str; 7] = [
    "#30123B", "#4686FB", "#1AE4B6", "#A2FC3C", "#FABA39", "#E4460A", "#7A0403",
];
const FONT: &str = "sans-serif";

/// A continuous colour scale, either named or given as hex stops
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Palette {
    Named(String),
    Colors(Vec<String>),
}

impl Palette {
    pub fn scale(&self) -> MovieResult<ColorScale> {
        let stops: Vec<&str> = match self {
            Palette::Named(name) => match name.to_ascii_lowercase().as_str() {
                "viridis" => VIRIDIS.to_vec(),
                "turbo" => TURBO.to_vec(),
                _ => return Err(MovieError::Chart(format!("Unknown colour scale '{name}'"))),
            },
            Palette::Colors(colors) => colors.iter().map(String::as_str).collect(),
        };
        let stops = stops
            .into_iter()
            .map(parse_hex)
            .collect::<MovieResult<Vec<_>>>()?;
        if stops.is_empty() {
            return Err(MovieError::Chart("Empty colour palette".to_string()));
        }
        Ok(ColorScale { stops })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    stops: Vec<RGBColor>,
}

impl ColorScale {
    /// Colour at `t` in `[0, 1]`, linearly interpolated between stops
    pub fn at(&self, t: f64) -> RGBColor {
        let last = self.stops.len() - 1;
        if last == 0 || !t.is_finite() {
            return self.stops[0];
        }
        let pos = t.clamp(0.0, 1.0) * last as f64;
        let i = (pos.floor() as usize).min(last - 1);
        let frac = pos - i as f64;
        let (a, b) = (self.stops[i], self.stops[i + 1]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    /// `n` colours spread evenly over the scale
    pub fn discrete(&self, n: usize) -> Vec<RGBColor> {
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.0)],
            _ => (0..n).map(|i| self.at(i as f64 / (n - 1) as f64)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Fixed y-axis bounds; fitted to the data when absent
    pub y_range: Option<(f64, f64)>,
    pub palette: Palette,
    pub legend_title: String,
    pub legend_title_font_size: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 900,
            height: 600,
            y_range: None,
            palette: Palette::Named("Viridis".to_string()),
            legend_title: "Genre".to_string(),
            legend_title_font_size: 12,
        }
    }
}

impl ChartOptions {
    /// Layout of the per-genre grouped bar chart
    pub fn genre_counts() -> Self {
        Self {
            title: "Movies made by year per genre".to_string(),
            width: 1200,
            height: 800,
            y_range: Some((0.0, 165.0)),
            palette: Palette::Named("Turbo".to_string()),
            ..Default::default()
        }
    }

    /// Layout of the single-genre year scatter
    pub fn year_scatter() -> Self {
        Self {
            palette: Palette::Colors(
                ["#FF4858", "#1B7F79", "#00CCC0", "#72F2EB", "#747F7F"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn y_bounds(&self, max: u32) -> (f64, f64) {
        self.y_range
            .unwrap_or((0.0, (max as f64 * 1.1).ceil().max(1.0)))
    }
}

/// Grouped bars: one category per year, one bar per genre.
pub fn render_grouped_bar(rows: &[AggregateRow], options: &ChartOptions, path: &Path) -> MovieResult<()> {
    let colors = options.palette.scale()?.discrete(Genre::ALL.len());
    let max = rows.iter().flat_map(|r| r.counts).max().unwrap_or(0);
    let (y0, y1) = options.y_bounds(max);
    let labels: Vec<String> = rows.iter().map(|r| year_label(r.year)).collect();
    let categories = rows.len().max(1);

    let root = canvas(options, path)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&options.title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(categories as f64 - 0.5), y0..y1)
        .map_err(chart_error)?;
    let label_for = |x: &f64| category_label(&labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories)
        .x_label_formatter(&label_for)
        .x_desc("year")
        .y_desc("count")
        .draw()
        .map_err(chart_error)?;

    let bar_width = 0.8 / Genre::ALL.len() as f64;
    for (g, (genre, color)) in Genre::ALL.iter().zip(colors).enumerate() {
        let offset = -0.4 + g as f64 * bar_width;
        chart
            .draw_series(rows.iter().enumerate().map(|(i, row)| {
                let x0 = i as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + bar_width, row.count(*genre) as f64)], color.filled())
            }))
            .map_err(chart_error)?
            .label(genre.count_column())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }
    draw_legend(&mut chart, options)?;
    finish(&root, options)
}

/// One point series per genre over the years.
pub fn render_scatter(rows: &[AggregateRow], options: &ChartOptions, path: &Path) -> MovieResult<()> {
    let colors = options.palette.scale()?.discrete(Genre::ALL.len());
    let max = rows.iter().flat_map(|r| r.counts).max().unwrap_or(0);
    let (y0, y1) = options.y_bounds(max);
    let years: Vec<i32> = rows.iter().filter_map(|r| r.year).collect();
    let (x0, x1) = year_bounds(&years);

    let root = canvas(options, path)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&options.title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(chart_error)?;
    chart
        .configure_mesh()
        .x_label_formatter(&|x| format!("{x:.0}"))
        .x_desc("year")
        .y_desc("count")
        .draw()
        .map_err(chart_error)?;

    for (genre, color) in Genre::ALL.iter().zip(colors) {
        chart
            .draw_series(rows.iter().filter_map(|row| {
                let year = row.year?;
                Some(Circle::new((year as f64, row.count(*genre) as f64), 4, color.filled()))
            }))
            .map_err(chart_error)?
            .label(genre.count_column())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }
    draw_legend(&mut chart, options)?;
    finish(&root, options)
}

/// A single count series coloured along the palette by its count.
pub fn render_year_counts(
    counts: &[YearCount],
    kind: ChartKind,
    options: &ChartOptions,
    path: &Path,
) -> MovieResult<()> {
    let scale = options.palette.scale()?;
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
    let min = counts.iter().map(|c| c.count).min().unwrap_or(0);
    let shade = |count: u32| {
        if max == min {
            scale.at(1.0)
        } else {
            scale.at((count - min) as f64 / (max - min) as f64)
        }
    };
    let (y0, y1) = options.y_bounds(max);

    let root = canvas(options, path)?;
    match kind {
        ChartKind::Bar => {
            let labels: Vec<String> = counts.iter().map(|c| c.year.to_string()).collect();
            let categories = counts.len().max(1);
            let mut chart = ChartBuilder::on(&root)
                .caption(&options.title, (FONT, 24))
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(60)
                .build_cartesian_2d(-0.5f64..(categories as f64 - 0.5), y0..y1)
                .map_err(chart_error)?;
            let label_for = |x: &f64| category_label(&labels, *x);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(categories)
                .x_label_formatter(&label_for)
                .x_desc("year")
                .y_desc("count")
                .draw()
                .map_err(chart_error)?;
            chart
                .draw_series(counts.iter().enumerate().map(|(i, c)| {
                    let x = i as f64;
                    Rectangle::new([(x - 0.4, 0.0), (x + 0.4, c.count as f64)], shade(c.count).filled())
                }))
                .map_err(chart_error)?;
        }
        ChartKind::Scatter => {
            let years: Vec<i32> = counts.iter().map(|c| c.year).collect();
            let (x0, x1) = year_bounds(&years);
            let mut chart = ChartBuilder::on(&root)
                .caption(&options.title, (FONT, 24))
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(60)
                .build_cartesian_2d(x0..x1, y0..y1)
                .map_err(chart_error)?;
            chart
                .configure_mesh()
                .x_label_formatter(&|x| format!("{x:.0}"))
                .x_desc("year")
                .y_desc("count")
                .draw()
                .map_err(chart_error)?;
            chart
                .draw_series(counts.iter().map(|c| {
                    Circle::new((c.year as f64, c.count as f64), 5, shade(c.count).filled())
                }))
                .map_err(chart_error)?;
        }
    }
    finish(&root, options)
}

fn canvas<'a>(options: &ChartOptions, path: &'a Path) -> MovieResult<DrawingArea<SVGBackend<'a>, Shift>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MovieError::io(parent, e))?;
    }
    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;
    Ok(root)
}

type Cartesian = Cartesian2d<RangedCoordf64, RangedCoordf64>;

fn draw_legend<'a>(
    chart: &mut ChartContext<'a, SVGBackend<'a>, Cartesian>,
    options: &ChartOptions,
) -> MovieResult<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, options.legend_title_font_size as f64))
        .draw()
        .map_err(chart_error)
}

fn finish(root: &DrawingArea<SVGBackend<'_>, Shift>, options: &ChartOptions) -> MovieResult<()> {
    if !options.legend_title.is_empty() {
        let x = options.width as i32 - 220;
        root.draw(&Text::new(
            options.legend_title.clone(),
            (x.max(0), 30),
            (FONT, options.legend_title_font_size as f64).into_font(),
        ))
        .map_err(chart_error)?;
    }
    root.present().map_err(chart_error)
}

fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

fn year_label(year: Option<i32>) -> String {
    year.map_or_else(|| "null".to_string(), |y| y.to_string())
}

fn year_bounds(years: &[i32]) -> (f64, f64) {
    match (years.iter().min(), years.iter().max()) {
        (Some(min), Some(max)) => (*min as f64 - 1.0, *max as f64 + 1.0),
        _ => (0.0, 1.0),
    }
}

fn parse_hex(color: &str) -> MovieResult<RGBColor> {
    let hex = color.trim().trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(|| MovieError::Chart(format!("Invalid colour '{color}'")))
    };
    if hex.len() != 6 {
        return Err(MovieError::Chart(format!("Invalid colour '{color}'")));
    }
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

fn chart_error<E: std::fmt::Display>(e: E) -> MovieError {
    MovieError::Chart(e.to_string())
}
