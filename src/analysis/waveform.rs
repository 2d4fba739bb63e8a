//! Waveform view
//!
//! Scaling and noise gating are applied to every sample; the display window
//! only limits what is drawn. The arrays always cover the whole recording so
//! nothing computed from them depends on display state.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::audio::AudioSample;
use crate::error::{PcgError, Result};

/// Display controls forwarded by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformParams {
    /// Multiplier applied to raw amplitudes (> 0)
    pub amplitude_scale: f64,
    /// Scaled values with smaller magnitude are zeroed; 0 disables the gate
    pub noise_threshold: f64,
    /// Upper bound of the visible window in seconds (> 0)
    pub max_duration_seconds: f64,
}

impl Default for WaveformParams {
    fn default() -> Self {
        Self {
            amplitude_scale: 1.0,
            noise_threshold: 0.0,
            max_duration_seconds: 8.0,
        }
    }
}

impl WaveformParams {
    pub const MAX_DURATION_RANGE: (u32, u32) = (1, 10);
    pub const AMPLITUDE_SCALE_RANGE: (f64, f64) = (0.1, 3.0);
    pub const NOISE_THRESHOLD_RANGE: (u32, u32) = (0, 1000);

    /// Build parameters from the UI controls, enforcing the slider ranges
    pub fn from_controls(
        max_duration_seconds: u32,
        amplitude_scale: f64,
        noise_threshold: u32,
    ) -> Result<Self> {
        let (min_dur, max_dur) = Self::MAX_DURATION_RANGE;
        if !(min_dur..=max_dur).contains(&max_duration_seconds) {
            return Err(PcgError::InvalidParameter {
                param: "max_duration_seconds".to_string(),
                value: max_duration_seconds.to_string(),
                expected: format!("{} to {} seconds", min_dur, max_dur),
            });
        }
        let (min_amp, max_amp) = Self::AMPLITUDE_SCALE_RANGE;
        if !(min_amp..=max_amp).contains(&amplitude_scale) {
            return Err(PcgError::InvalidParameter {
                param: "amplitude_scale".to_string(),
                value: amplitude_scale.to_string(),
                expected: format!("{} to {}", min_amp, max_amp),
            });
        }
        let (min_noise, max_noise) = Self::NOISE_THRESHOLD_RANGE;
        if !(min_noise..=max_noise).contains(&noise_threshold) {
            return Err(PcgError::InvalidParameter {
                param: "noise_threshold".to_string(),
                value: noise_threshold.to_string(),
                expected: format!("{} to {}", min_noise, max_noise),
            });
        }
        Ok(Self {
            amplitude_scale,
            noise_threshold: noise_threshold as f64,
            max_duration_seconds: max_duration_seconds as f64,
        })
    }

    /// Check the renderer's own preconditions
    pub fn validate(&self) -> Result<()> {
        if !(self.amplitude_scale.is_finite() && self.amplitude_scale > 0.0) {
            return Err(PcgError::InvalidParameter {
                param: "amplitude_scale".to_string(),
                value: self.amplitude_scale.to_string(),
                expected: "a positive number".to_string(),
            });
        }
        if !(self.noise_threshold.is_finite() && self.noise_threshold >= 0.0) {
            return Err(PcgError::InvalidParameter {
                param: "noise_threshold".to_string(),
                value: self.noise_threshold.to_string(),
                expected: "zero or a positive number".to_string(),
            });
        }
        if !(self.max_duration_seconds.is_finite() && self.max_duration_seconds > 0.0) {
            return Err(PcgError::InvalidParameter {
                param: "max_duration_seconds".to_string(),
                value: self.max_duration_seconds.to_string(),
                expected: "a positive number of seconds".to_string(),
            });
        }
        Ok(())
    }
}

/// Time/amplitude arrays plus the visible window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveformView {
    pub title: String,
    pub time_axis: Vec<f64>,
    pub amplitude_axis: Vec<f64>,
    /// `(0, min(duration, max_duration_seconds))`
    pub display_window: (f64, f64),
}

/// Build the waveform view of a recording
pub fn render_waveform(sample: &AudioSample, params: &WaveformParams, title: &str) -> Result<WaveformView> {
    params.validate()?;

    let n = sample.len();
    let duration = sample.duration_secs();
    let time_axis = linspace(0.0, duration, n);

    let gate = params.noise_threshold > 0.0;
    let amplitude_axis = sample
        .samples()
        .iter()
        .map(|&raw| {
            let scaled = raw * params.amplitude_scale;
            if gate && scaled.abs() < params.noise_threshold {
                0.0
            } else {
                scaled
            }
        })
        .collect();

    Ok(WaveformView {
        title: title.to_string(),
        time_axis,
        amplitude_axis,
        display_window: (0.0, duration.min(params.max_duration_seconds)),
    })
}

/// `n` evenly spaced values from `start` to `end` inclusive
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

impl WaveformView {
    /// Indices of the points inside the display window
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let end = self
            .time_axis
            .partition_point(|&t| t <= self.display_window.1);
        0..end
    }

    /// Render the visible window as a standalone SVG document
    ///
    /// Each pixel column draws the min..max of the points falling in it, so
    /// long recordings stay small.
    pub fn to_svg(&self, width: u32, height: u32) -> String {
        let width = width.max(64) as f64;
        let height = height.max(32) as f64;
        let margin = 24.0;
        let plot_w = width - 2.0 * margin;
        let plot_h = height - 2.0 * margin;

        let range = self.visible_range();
        let times = &self.time_axis[range.clone()];
        let values = &self.amplitude_axis[range];
        let window = (self.display_window.1 - self.display_window.0).max(f64::EPSILON);
        let extent = values
            .iter()
            .fold(0.0_f64, |m, v| m.max(v.abs()))
            .max(f64::EPSILON);

        let x_of = |t: f64| margin + (t - self.display_window.0) / window * plot_w;
        let y_of = |v: f64| margin + plot_h / 2.0 - v / extent * plot_h / 2.0;

        let columns = plot_w.max(1.0) as usize;
        let mut extrema: Vec<Option<(f64, f64)>> = vec![None; columns];
        for (&t, &v) in times.iter().zip(values) {
            let col = (((t - self.display_window.0) / window) * columns as f64) as usize;
            let slot = &mut extrema[col.min(columns - 1)];
            *slot = Some(match *slot {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }

        let mut path = String::new();
        for (col, bounds) in extrema.iter().enumerate() {
            if let Some((lo, hi)) = bounds {
                let x = margin + (col as f64 + 0.5) * plot_w / columns as f64;
                let _ = write!(path, "M{:.1},{:.1}L{:.1},{:.1}", x, y_of(*hi), x, y_of(*lo) + 0.1);
            }
        }

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = width,
            h = height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

        // grid: 10 vertical divisions across the window, 4 horizontal
        for i in 0..=10 {
            let x = margin + plot_w * i as f64 / 10.0;
            let _ = writeln!(
                svg,
                r##"<line x1="{x:.1}" y1="{y0:.1}" x2="{x:.1}" y2="{y1:.1}" stroke="#dddddd" stroke-width="0.5"/>"##,
                x = x,
                y0 = margin,
                y1 = margin + plot_h
            );
        }
        for i in 0..=4 {
            let y = margin + plot_h * i as f64 / 4.0;
            let _ = writeln!(
                svg,
                r##"<line x1="{x0:.1}" y1="{y:.1}" x2="{x1:.1}" y2="{y:.1}" stroke="#dddddd" stroke-width="0.5"/>"##,
                x0 = margin,
                x1 = margin + plot_w,
                y = y
            );
        }

        let _ = writeln!(
            svg,
            r##"<path d="{}" stroke="#1f77b4" stroke-width="0.7" fill="none"/>"##,
            path
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="12" text-anchor="middle">{}</text>"#,
            width / 2.0,
            margin - 8.0,
            escape_xml(&self.title)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="end">{:.2} s</text>"#,
            x_of(self.display_window.1),
            height - 6.0,
            self.display_window.1
        );
        svg.push_str("</svg>\n");
        svg
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(values: Vec<f64>, rate: u32) -> AudioSample {
        AudioSample::new(rate, values).unwrap()
    }

    #[test]
    fn test_time_axis_spans_duration() {
        let view = render_waveform(&sample(vec![0.0; 5], 4), &WaveformParams::default(), "t").unwrap();
        assert_eq!(view.time_axis.len(), 5);
        assert_eq!(view.time_axis[0], 0.0);
        assert_relative_eq!(view.time_axis[4], 1.25);
        assert_relative_eq!(view.time_axis[1], 0.3125);
    }

    #[test]
    fn test_single_sample_time_axis() {
        let view = render_waveform(&sample(vec![7.0], 1000), &WaveformParams::default(), "t").unwrap();
        assert_eq!(view.time_axis, vec![0.0]);
    }

    #[test]
    fn test_scaling_then_gating() {
        let params = WaveformParams {
            amplitude_scale: 2.0,
            noise_threshold: 100.0,
            max_duration_seconds: 8.0,
        };
        let view = render_waveform(&sample(vec![40.0, -49.0, 50.0, -60.0, 10.0], 1000), &params, "t").unwrap();
        // 40*2=80 < 100 gated, 50*2=100 not strictly below, kept
        assert_eq!(view.amplitude_axis, vec![0.0, 0.0, 100.0, -120.0, 0.0]);
    }

    #[test]
    fn test_zero_threshold_disables_gate() {
        let view = render_waveform(&sample(vec![1.0, -0.5], 1000), &WaveformParams::default(), "t").unwrap();
        assert_eq!(view.amplitude_axis, vec![1.0, -0.5]);
    }

    #[test]
    fn test_window_does_not_truncate() {
        let params = WaveformParams {
            max_duration_seconds: 1.0,
            ..WaveformParams::default()
        };
        let view = render_waveform(&sample(vec![1.0; 3000], 1000), &params, "t").unwrap();
        assert_eq!(view.time_axis.len(), 3000);
        assert_eq!(view.amplitude_axis.len(), 3000);
        assert_eq!(view.display_window, (0.0, 1.0));
        assert!(view.visible_range().end < 3000);
    }

    #[test]
    fn test_window_shorter_recording() {
        let view = render_waveform(&sample(vec![1.0; 500], 1000), &WaveformParams::default(), "t").unwrap();
        assert_eq!(view.display_window, (0.0, 0.5));
        assert_eq!(view.visible_range(), 0..500);
    }

    #[test]
    fn test_from_controls_ranges() {
        assert!(WaveformParams::from_controls(8, 1.0, 0).is_ok());
        assert!(WaveformParams::from_controls(0, 1.0, 0).is_err());
        assert!(WaveformParams::from_controls(11, 1.0, 0).is_err());
        assert!(WaveformParams::from_controls(5, 0.05, 0).is_err());
        assert!(WaveformParams::from_controls(5, 3.0, 1000).is_ok());
        assert!(WaveformParams::from_controls(5, 1.0, 1001).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        let params = WaveformParams {
            amplitude_scale: 0.0,
            ..WaveformParams::default()
        };
        assert!(render_waveform(&sample(vec![1.0], 10), &params, "t").is_err());
    }

    #[test]
    fn test_svg_contains_title_and_path() {
        let view = render_waveform(
            &sample((0..2000).map(|i| (i % 50) as f64 - 25.0).collect(), 1000),
            &WaveformParams::default(),
            "Mitral <Valve> Waveform",
        )
        .unwrap();
        let svg = view.to_svg(400, 120);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Mitral &lt;Valve&gt; Waveform"));
        assert!(svg.contains("<path d=\"M"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
