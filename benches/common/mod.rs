//! Shared plumbing for the plotting benches: reads criterion's estimates back
//! and draws one line per method with its confidence band.

use plotters::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Deserialize)]
struct Estimates {
    mean: Stats,
}

#[derive(Deserialize)]
struct Stats {
    point_estimate: f64,
    confidence_interval: ConfidenceInterval,
}

#[derive(Deserialize)]
struct ConfidenceInterval {
    lower_bound: f64,
    upper_bound: f64,
}

/// Mean and confidence interval of one measurement, in milliseconds.
#[derive(Clone, Copy)]
pub struct Timing {
    pub param: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

pub struct Axes<'a> {
    pub caption: &'a str,
    pub x_desc: &'a str,
    /// Plot both axes in log10.
    pub log: bool,
    /// Draw a slope-one line through the first measurement.
    pub linear_reference: bool,
}

/// Collects `target/criterion/<group>/<method>/<param>/base/estimates.json`.
/// Missing measurements are skipped.
pub fn read_timings(
    group: &str,
    methods: &[&'static str],
    params: &[usize],
) -> Result<BTreeMap<&'static str, Vec<Timing>>, Box<dyn Error>> {
    let root = Path::new("target/criterion").join(group);
    let mut data = BTreeMap::new();
    if !root.exists() {
        return Ok(data);
    }
    for &method in methods {
        let mut points = Vec::new();
        for &param in params {
            let path = root
                .join(method)
                .join(param.to_string())
                .join("base/estimates.json");
            if !path.exists() {
                continue;
            }
            let estimates: Estimates = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
            points.push(Timing {
                param: param as f64,
                mean: estimates.mean.point_estimate / 1_000_000.0,
                lower: estimates.mean.confidence_interval.lower_bound / 1_000_000.0,
                upper: estimates.mean.confidence_interval.upper_bound / 1_000_000.0,
            });
        }
        if !points.is_empty() {
            points.sort_by(|a, b| a.param.total_cmp(&b.param));
            data.insert(method, points);
        }
    }
    Ok(data)
}

/// `benches/results/<stem>_<git hash>.png`
pub fn results_file(stem: &str) -> Result<PathBuf, Box<dyn Error>> {
    let out_dir = Path::new("benches/results");
    std::fs::create_dir_all(out_dir)?;
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    Ok(out_dir.join(format!("{}_{}.png", stem, git_hash)))
}

pub fn plot_timings(
    out_file: &Path,
    axes: &Axes,
    data: &BTreeMap<&'static str, Vec<Timing>>,
) -> Result<(), Box<dyn Error>> {
    let scale = |v: f64| if axes.log { v.log10() } else { v };
    let points = || data.values().flatten();

    let min_x = points().map(|p| scale(p.param)).fold(f64::INFINITY, f64::min);
    let max_x = points().map(|p| scale(p.param)).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points().map(|p| scale(p.lower)).fold(f64::INFINITY, f64::min);
    let max_y = points().map(|p| scale(p.upper)).fold(f64::NEG_INFINITY, f64::max);
    let (y_from, y_to) = if axes.log {
        (min_y - 0.1, max_y + 0.2)
    } else {
        (0.0, max_y * 1.1)
    };

    let root_area = BitMapBackend::new(out_file, (1024, 768)).into_drawing_area();
    root_area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root_area)
        .caption(axes.caption, ("sans-serif", 40).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(min_x..max_x.max(min_x + 1.0), y_from..y_to)?;

    let log = axes.log;
    let label = move |v: &f64| {
        if log {
            format!("10^{:.1}", v)
        } else {
            format!("{:.0}", v)
        }
    };
    chart
        .configure_mesh()
        .x_desc(axes.x_desc)
        .y_desc("Time (ms)")
        .x_label_formatter(&label)
        .y_label_formatter(&|v| if log { format!("10^{:.1}", v) } else { format!("{:.1}", v) })
        .draw()?;

    if axes.linear_reference {
        if let Some(first) = data.values().next().and_then(|s| s.first()) {
            let (x0, y0) = (scale(first.param), scale(first.mean));
            let steps = 40;
            let reference = (0..=steps).map(|i| {
                let x = min_x + (max_x - min_x) * i as f64 / steps as f64;
                let y = if log { y0 + (x - x0) } else { y0 * x / x0 };
                (x, y)
            });
            chart
                .draw_series(PointSeries::of_element(
                    reference,
                    1,
                    &BLACK,
                    &|c, s, st| Circle::new(c, s, st.filled()),
                ))?
                .label("Linear")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));
        }
    }

    let colors = [RED, BLUE, GREEN, MAGENTA, CYAN];

    for (i, (method, points)) in data.iter().enumerate() {
        let color = colors[i % colors.len()];

        let band: Vec<_> = points
            .iter()
            .map(|p| (scale(p.param), scale(p.upper)))
            .chain(points.iter().rev().map(|p| (scale(p.param), scale(p.lower))))
            .collect();
        chart.draw_series(std::iter::once(Polygon::new(band, color.mix(0.2).filled())))?;

        let line: Vec<_> = points.iter().map(|p| (scale(p.param), scale(p.mean))).collect();
        chart
            .draw_series(LineSeries::new(line.iter().copied(), &color))?
            .label(*method)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        chart.draw_series(PointSeries::of_element(
            line,
            5,
            &color,
            &|c, s, st| EmptyElement::at(c) + Circle::new((0, 0), s, st.filled()),
        ))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    println!("Plot saved to {:?}", out_file);
    Ok(())
}
