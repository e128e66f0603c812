//! Text-free PNG charts.
//!
//! The bitmap backend is built without a font stack, so nothing here draws
//! text: titles, axis names and the colour key live in the Markdown report.

use std::panic::UnwindSafe;
use std::path::{Path, PathBuf};

use hull_core::{GzCurve, ResultTable};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::ReportError;
use crate::export::{publish, staging_dir};

const SIZE: (u32, u32) = (800, 480);
const MARGIN: u32 = 24;
const GRID_DIVISIONS: u32 = 5;
const GRID_LINE: RGBColor = RGBColor(0xe4, 0xe4, 0xe4);
const GREY: RGBColor = RGBColor(0xbb, 0xbb, 0xbb);
const FEASIBLE: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const PARETO: RGBColor = RGBColor(0xd6, 0x27, 0x28);

type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Point classes of the displacement/GZ scatter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterSeries {
    pub infeasible: Vec<(f64, f64)>,
    pub feasible: Vec<(f64, f64)>,
    pub pareto: Vec<(f64, f64)>,
}

impl ScatterSeries {
    /// Rows with non-finite objectives are left out.
    pub fn from_table(table: &ResultTable) -> Self {
        let mut series = Self::default();
        for record in table.records() {
            if !(record.displacement.is_finite() && record.gz_max.is_finite()) {
                continue;
            }
            let point = (record.displacement, record.gz_max);
            if record.is_pareto_optimal() {
                series.pareto.push(point);
            } else if record.feasible {
                series.feasible.push(point);
            } else {
                series.infeasible.push(point);
            }
        }
        series
    }

    pub fn is_empty(&self) -> bool {
        self.infeasible.is_empty() && self.feasible.is_empty() && self.pareto.is_empty()
    }

    fn all(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.infeasible
            .iter()
            .chain(self.feasible.iter())
            .chain(self.pareto.iter())
    }
}

/// GZ against heel angle for one candidate.
pub fn render_gz_curve(path: &Path, curve: &GzCurve) -> Result<PathBuf, ReportError> {
    let points: Vec<(f64, f64)> = curve
        .points
        .iter()
        .map(|p| (p.heel_deg, p.gz))
        .filter(|p| p.0.is_finite() && p.1.is_finite())
        .collect();
    if points.is_empty() {
        return Err(ReportError::Plot("GZ curve has no points".into()));
    }
    let x = (0.0, points.iter().map(|p| p.0).fold(0.0f64, f64::max).max(1.0));
    let y_min = points.iter().map(|p| p.1).fold(0.0f64, f64::min);
    let y_max = points.iter().map(|p| p.1).fold(0.0f64, f64::max);
    let margin = ((y_max - y_min).abs() * 0.1).max(0.01);
    let y = (y_min - margin, y_max + margin);

    render_atomic(path, move |target| {
        let root = BitMapBackend::new(target, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(MARGIN)
            .build_cartesian_2d(x.0..x.1, y.0..y.1)
            .map_err(plot_error)?;
        draw_frame(&mut chart, x, y)?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                points.clone(),
                FEASIBLE.stroke_width(2),
            )))
            .map_err(plot_error)?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&point| Circle::new(point, 3, FEASIBLE.filled())),
            )
            .map_err(plot_error)?;

        drop(chart);
        root.present().map_err(plot_error)
    })
}

/// Displacement against GZ max. Infeasible rows are grey, feasible rows
/// blue, Pareto rows red.
pub fn render_pareto_scatter(path: &Path, series: &ScatterSeries) -> Result<PathBuf, ReportError> {
    if series.is_empty() {
        return Err(ReportError::Plot("no finite rows to plot".into()));
    }
    let x = extent(series.all().map(|p| p.0));
    let y = extent(series.all().map(|p| p.1));
    let series = series.clone();

    render_atomic(path, move |target| {
        let root = BitMapBackend::new(target, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(MARGIN)
            .build_cartesian_2d(x.0..x.1, y.0..y.1)
            .map_err(plot_error)?;
        draw_frame(&mut chart, x, y)?;

        // Pareto last so it sits on top.
        for (points, color) in [
            (&series.infeasible, GREY),
            (&series.feasible, FEASIBLE),
            (&series.pareto, PARETO),
        ] {
            chart
                .draw_series(
                    points
                        .iter()
                        .map(move |&point| Circle::new(point, 4, color.filled())),
                )
                .map_err(plot_error)?;
        }

        drop(chart);
        root.present().map_err(plot_error)
    })
}

/// Light grid plus left and bottom axis lines.
fn draw_frame(chart: &mut Chart<'_, '_>, x: (f64, f64), y: (f64, f64)) -> Result<(), ReportError> {
    let at = |lo: f64, hi: f64, i: u32| lo + (hi - lo) * f64::from(i) / f64::from(GRID_DIVISIONS);
    let grid = (0..=GRID_DIVISIONS).flat_map(|i| {
        let gx = at(x.0, x.1, i);
        let gy = at(y.0, y.1, i);
        [
            PathElement::new(vec![(gx, y.0), (gx, y.1)], GRID_LINE.stroke_width(1)),
            PathElement::new(vec![(x.0, gy), (x.1, gy)], GRID_LINE.stroke_width(1)),
        ]
    });
    chart.draw_series(grid).map_err(plot_error)?;
    chart
        .draw_series([
            PathElement::new(vec![(x.0, y.0), (x.1, y.0)], BLACK.stroke_width(1)),
            PathElement::new(vec![(x.0, y.0), (x.0, y.1)], BLACK.stroke_width(1)),
        ])
        .map_err(plot_error)?;
    Ok(())
}

/// Draw into a `.png` temporary next to `path` and rename it into place only
/// when drawing succeeds. On failure `path` is left as it was.
fn render_atomic<F>(path: &Path, draw: F) -> Result<PathBuf, ReportError>
where
    F: FnOnce(&Path) -> Result<(), ReportError> + UnwindSafe,
{
    let dir = staging_dir(path)?;
    let tmp = tempfile::Builder::new()
        .prefix(".chart")
        .suffix(".png")
        .tempfile_in(dir)
        .map_err(|source| ReportError::Io {
            context: "staging chart",
            source,
        })?;
    let target = tmp.path().to_path_buf();
    guarded(move || draw(&target))?;
    publish(tmp, path)?;
    Ok(path.to_path_buf())
}

/// Padded range; a single value still gets a non-empty span.
fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let pad = ((max - min).abs() * 0.05).max(min.abs() * 0.05).max(0.01);
    (min - pad, max + pad)
}

fn plot_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Plot(err.to_string())
}

/// A panic inside plotters becomes a plot error instead of ending the run.
fn guarded<F>(render: F) -> Result<(), ReportError>
where
    F: FnOnce() -> Result<(), ReportError> + UnwindSafe,
{
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let attempt = std::panic::catch_unwind(render);
    std::panic::set_hook(prev_hook);

    match attempt {
        Ok(result) => result,
        Err(_) => Err(ReportError::Plot("plotters panicked while rendering".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hull_core::{Candidate, Evaluation, ParetoRanker, ResultRecord, StabilityModel, SyntheticGz};

    #[test]
    fn scatter_series_splits_classes_and_skips_nan() {
        let mut table = ResultTable::new();
        for (length, displacement, gz_max, feasible) in [
            (90.0, 900.0, 0.2, true),
            (100.0, 1000.0, 0.1, true),
            (110.0, 500.0, 0.5, false),
        ] {
            let evaluation = Evaluation {
                candidate: Candidate::new(length, 16.0, 5.0, 0.6),
                displacement,
                gz_max,
            };
            table
                .push(ResultRecord::evaluated(&evaluation, feasible))
                .expect("push");
        }
        table
            .push(ResultRecord::failed(Candidate::new(1.0, 1.0, 1.0, 0.6), "x"))
            .expect("push");
        table.rank(&ParetoRanker::default());

        let series = ScatterSeries::from_table(&table);
        assert_eq!(series.pareto, vec![(900.0, 0.2)]);
        assert_eq!(series.feasible, vec![(1000.0, 0.1)]);
        assert_eq!(series.infeasible, vec![(500.0, 0.5)]);
    }

    #[test]
    fn extent_pads_degenerate_ranges() {
        let (lo, hi) = extent([5.0].into_iter());
        assert!(lo < 5.0 && hi > 5.0);
        let (lo, hi) = extent([1.0, 3.0].into_iter());
        assert!(lo < 1.0 && hi > 3.0);
    }

    #[test]
    fn empty_inputs_are_rejected_before_drawing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = render_pareto_scatter(&dir.path().join("s.png"), &ScatterSeries::default())
            .expect_err("nothing to draw");
        assert!(matches!(err, ReportError::Plot(_)));
        let err = render_gz_curve(&dir.path().join("gz.png"), &GzCurve::default())
            .expect_err("empty curve");
        assert!(matches!(err, ReportError::Plot(_)));
        assert!(!dir.path().join("s.png").exists());
        assert!(!dir.path().join("gz.png").exists());
    }

    #[test]
    fn gz_curve_renders_a_decodable_png() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("gz.png");
        let curve = SyntheticGz::default().righting_arm_curve(&Candidate::new(100.0, 16.0, 5.0, 0.6));

        let written = render_gz_curve(&path, &curve).expect("gz chart renders");
        assert_eq!(written, path);
        image::open(&path).expect("png decodes");
        assert_eq!(image::image_dimensions(&path).expect("png header"), SIZE);
    }

    #[test]
    fn pareto_scatter_renders_a_decodable_png() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("scatter.png");
        let series = ScatterSeries {
            infeasible: vec![(9225.0, 0.2)],
            feasible: vec![(5330.0, 0.1845)],
            pareto: vec![(3946.25, 0.1685)],
        };

        render_pareto_scatter(&path, &series).expect("scatter renders");
        image::open(&path).expect("png decodes");
        assert_eq!(image::image_dimensions(&path).expect("png header"), SIZE);
        let leftovers = staged_files(dir.path());
        assert!(leftovers.is_empty(), "temporary files left: {leftovers:?}");
    }

    fn staged_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .expect("list dir")
            .map(|entry| entry.expect("entry").path())
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(".chart"))
            })
            .collect()
    }

    #[test]
    fn failed_render_leaves_no_file_behind() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("gz.png");
        let err = render_atomic(&path, |_| Err(ReportError::Plot("backend refused".into())))
            .expect_err("render fails");
        assert!(matches!(err, ReportError::Plot(_)));
        assert!(!path.exists());
        assert!(staged_files(dir.path()).is_empty());
    }

    #[test]
    fn panicking_render_keeps_the_previous_chart() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pareto.png");
        std::fs::write(&path, b"previous chart").expect("seed");

        let err = render_atomic(&path, |_| panic!("glyph lookup")).expect_err("render panics");
        assert!(matches!(err, ReportError::Plot(_)));
        assert_eq!(std::fs::read(&path).expect("still there"), b"previous chart");
        assert!(staged_files(dir.path()).is_empty());
    }
}
