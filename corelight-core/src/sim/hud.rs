use compact_str::{CompactString, format_compact};

use crate::{config::HudConfig, random::RandomSource};

/// Session-owned telemetry shown on the HUD panel.
///
/// Created at mount and dropped at unmount; nothing here is global.
#[derive(Debug, Clone, PartialEq)]
pub struct HudState {
    start_time_ms: f64,
    iteration: u64,
}

impl HudState {
    /// Starts the uptime clock at `start_time_ms`; a non-finite start counts as zero.
    #[must_use]
    pub fn new(start_time_ms: f64) -> Self {
        let start_time_ms = if start_time_ms.is_finite() { start_time_ms } else { 0.0 };
        Self { start_time_ms, iteration: 0 }
    }

    /// Advances the iteration counter with the given per-frame probability.
    ///
    /// Returns `true` when the counter advanced.
    pub fn tick(&mut self, chance: f32, rng: &mut dyn RandomSource) -> bool {
        let advanced = rng.chance(chance);
        if advanced {
            self.iteration += 1;
        }
        advanced
    }

    /// Mount time the uptime is measured from.
    #[must_use]
    pub fn start_time_ms(&self) -> f64 {
        self.start_time_ms
    }

    /// Current value of the iteration counter.
    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Elapsed seconds since mount; never negative.
    #[must_use]
    pub fn uptime_secs(&self, now_ms: f64) -> f64 {
        let elapsed = (now_ms - self.start_time_ms) / 1000.0;
        if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 }
    }

    /// Lays out the HUD raster for the given instant.
    ///
    /// Pure: the result depends only on this state, the label and `now_ms`.
    #[must_use]
    pub fn frame(&self, config: &HudConfig, now_ms: f64) -> HudFrame {
        HudFrame {
            width: config.width,
            height: config.height,
            lines: vec![
                HudLine {
                    text: config.label.clone(),
                    font: HudFont::LABEL,
                    color: HudColor::rgba(170, 230, 255, 0.95),
                    x: 20.0,
                    y: 36.0,
                },
                HudLine {
                    text: uptime_text(self.uptime_secs(now_ms)),
                    font: HudFont::READOUT,
                    color: HudColor::rgba(140, 200, 255, 0.95),
                    x: 20.0,
                    y: 70.0,
                },
                HudLine {
                    text: format_compact!("iter: {}", self.iteration),
                    font: HudFont::READOUT,
                    color: HudColor::rgba(210, 170, 255, 0.9),
                    x: 20.0,
                    y: 96.0,
                },
            ],
            scanlines: Scanlines { spacing: 2, color: HudColor::rgba(80, 140, 255, 0.05) },
        }
    }
}

/// Formats the uptime readout with one decimal place.
#[must_use]
pub fn uptime_text(seconds: f64) -> CompactString {
    format_compact!("uptime: {seconds:.1}s")
}

/// One complete HUD raster description, independent of any drawing API.
#[derive(Debug, Clone, PartialEq)]
pub struct HudFrame {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Text lines, drawn in order.
    pub lines: Vec<HudLine>,
    /// Overlay drawn after the text.
    pub scanlines: Scanlines,
}

/// A single line of text anchored at its baseline-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct HudLine {
    /// Text to draw.
    pub text: CompactString,
    /// Font used for this line.
    pub font: HudFont,
    /// Fill color.
    pub color: HudColor,
    /// Left edge in raster pixels.
    pub x: f32,
    /// Baseline in raster pixels.
    pub y: f32,
}

/// Horizontal 1-pixel lines drawn over the text every `spacing` rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scanlines {
    /// Rows between two scanlines.
    pub spacing: u32,
    /// Scanline color.
    pub color: HudColor,
}

/// Font weight and size for one HUD line; the family is chosen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudFont {
    /// CSS font weight.
    pub weight: u16,
    /// Font size in raster pixels.
    pub size_px: u16,
}

impl HudFont {
    /// Title line.
    pub const LABEL: Self = Self { weight: 700, size_px: 20 };
    /// Telemetry lines.
    pub const READOUT: Self = Self { weight: 600, size_px: 16 };
}

/// 8-bit RGB color with a fractional alpha, as used by the 2D canvas API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f32,
}

impl HudColor {
    /// Builds a color from its channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_uptime_one_decimal() {
        let hud = HudState::new(0.0);
        assert_eq!(uptime_text(hud.uptime_secs(1500.0)), "uptime: 1.5s");
        assert_eq!(uptime_text(hud.uptime_secs(0.0)), "uptime: 0.0s");
        assert_eq!(uptime_text(hud.uptime_secs(61_240.0)), "uptime: 61.2s");
    }

    #[test]
    fn test_uptime_never_negative() {
        let hud = HudState::new(5000.0);
        assert_eq!(hud.uptime_secs(1000.0), 0.0);
        assert_eq!(hud.uptime_secs(f64::NAN), 0.0);
    }

    #[test]
    fn test_iteration_follows_gate() {
        let mut hud = HudState::new(0.0);
        let mut rng = ScriptedRandom::new([0.001, 0.5, 0.01, 0.9]);
        let advanced: Vec<bool> = (0..4).map(|_| hud.tick(0.015, &mut rng)).collect();

        assert_eq!(advanced, vec![true, false, true, false]);
        assert_eq!(hud.iteration(), 2);
    }

    #[test]
    fn test_frame_layout() {
        let mut hud = HudState::new(250.0);
        hud.tick(1.0, &mut ScriptedRandom::constant(0.0));

        let frame = hud.frame(&HudConfig::default(), 2250.0);
        assert_eq!((frame.width, frame.height), (512, 128));

        let texts: Vec<&str> = frame.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["OPEN CORE", "uptime: 2.0s", "iter: 1"]);
        assert_eq!(frame.lines[0].font, HudFont::LABEL);
        assert_eq!(frame.lines[2].y, 96.0);
        assert_eq!(frame.scanlines.spacing, 2);
    }

    #[test]
    fn test_frame_does_not_mutate_state() {
        let hud = HudState::new(0.0);
        let before = hud.clone();
        let _ = hud.frame(&HudConfig::default(), 10_000.0);
        assert_eq!(hud, before);
    }
}
