//! `cargo xtask diff`: run the engine on two raw frame dumps
//!
//! Dumps are raw little-endian RGB565, `stride` bytes per row (the last row
//! may omit its padding), as written by most display-driver framebuffer
//! captures.

use anyhow::{ensure, Context, Result};
use clap::Args;
use colored::Colorize;
use frame_diff::geometry::BYTES_PER_PIXEL;
use frame_diff::{DiffConfig, DiffEngine, DiffStats, Frame, FrameGeometry, Interlace, LinkProfile};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Frame width in pixels
    #[arg(long)]
    pub width: usize,
    /// Frame height in pixels
    #[arg(long)]
    pub height: usize,
    /// Row stride in bytes (defaults to width * 2)
    #[arg(long)]
    pub stride: Option<usize>,
    /// JSON engine configuration (defaults to the 8-bit SPI scanline config)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the merge threshold with a link profile (see `cargo xtask profiles`)
    #[arg(long, value_parser = parse_profile)]
    pub profile: Option<LinkProfile>,
    /// Diff a single interlaced field
    #[arg(long)]
    pub interlaced: bool,
    /// Field parity for --interlaced (0 = even rows, 1 = odd rows)
    #[arg(long, default_value_t = 0)]
    pub parity: usize,
    /// Previous frame dump
    pub prev: PathBuf,
    /// Current frame dump
    pub cur: PathBuf,
}

fn parse_profile(name: &str) -> Result<LinkProfile, String> {
    LinkProfile::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = LinkProfile::ALL.iter().map(LinkProfile::name).collect();
        format!("unknown profile '{name}' (expected one of: {})", known.join(", "))
    })
}

pub fn run(args: &DiffArgs) -> Result<()> {
    let stride = args.stride.unwrap_or(args.width.saturating_mul(BYTES_PER_PIXEL));
    let geometry = FrameGeometry::new(args.width, args.height, stride).context("Invalid frame geometry")?;
    let config = resolve_config(args.config.as_deref(), args.profile)?;

    let prev = load_frame(&args.prev, &geometry)?;
    let cur = load_frame(&args.cur, &geometry)?;
    let interlace = Interlace::from_flags(args.interlaced, args.parity);

    let mut engine = DiffEngine::new(args.width, args.height, config).context("Invalid engine configuration")?;
    tracing::debug!(?config, ?interlace, "Diffing frame dumps");

    println!();
    println!(
        "{}",
        format!(
            "Diff {}x{} ({} strategy, threshold {})",
            args.width,
            args.height,
            config.strategy.name(),
            config.merge_threshold
        )
        .cyan()
        .bold()
    );
    println!();

    let Some(spans) = engine.compute_diff(Frame::new(&cur, geometry), Frame::new(&prev, geometry), true, interlace)
    else {
        println!("{}", "  ✓ No change".green());
        println!();
        return Ok(());
    };

    println!(
        "  {:>4}  {:>5} {:>5} {:>5} {:>5} {:>7} {:>8}",
        "#".bold(),
        "x".bold(),
        "endX".bold(),
        "y".bold(),
        "endY".bold(),
        "lastEnd".bold(),
        "pixels".bold()
    );
    for (n, span) in spans.iter().enumerate() {
        println!(
            "  {:>4}  {:>5} {:>5} {:>5} {:>5} {:>7} {:>8}",
            n, span.x, span.end_x, span.y, span.end_y, span.last_scan_end_x, span.size
        );
    }

    let stats = DiffStats::from_list(&spans);
    let total = geometry.pixel_count();
    println!();
    println!(
        "{}",
        format!(
            "  {} spans, {} of {} pixels ({:.1}%), {} bytes on the wire",
            stats.span_count,
            stats.dirty_pixels,
            total,
            percent(stats.dirty_pixels, total),
            stats.wire_bytes(config.bytes_per_pixel)
        )
        .green()
    );
    println!();

    Ok(())
}

// Display only: precision loss on huge counts does not matter.
#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / total as f64
}

/// Config file (or the default), with the merge threshold optionally taken from a link profile
fn resolve_config(path: Option<&Path>, profile: Option<LinkProfile>) -> Result<DiffConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => DiffConfig::DEFAULT,
    };
    if let Some(profile) = profile {
        config.merge_threshold = profile.merge_threshold();
    }
    Ok(config)
}

/// Read a raw little-endian RGB565 dump holding at least one frame of `geometry`
fn load_frame(path: &Path, geometry: &FrameGeometry) -> Result<Vec<u16>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read frame {}", path.display()))?;
    decode_rgb565(&bytes, geometry).with_context(|| format!("Bad frame dump {}", path.display()))
}

fn decode_rgb565(bytes: &[u8], geometry: &FrameGeometry) -> Result<Vec<u16>> {
    ensure!(
        bytes.len() % BYTES_PER_PIXEL == 0,
        "dump length {} is not a whole number of 16-bit pixels",
        bytes.len()
    );
    let min_bytes = geometry.min_buffer_len().saturating_mul(BYTES_PER_PIXEL);
    ensure!(
        bytes.len() >= min_bytes,
        "dump holds {} bytes but a {}x{} frame with a {}-byte stride needs {}",
        bytes.len(),
        geometry.width(),
        geometry.height(),
        geometry.stride_bytes(),
        min_bytes
    );
    Ok(bytes
        .chunks_exact(BYTES_PER_PIXEL)
        .filter_map(|pair| pair.try_into().ok())
        .map(u16::from_le_bytes)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_diff::DiffStrategy;
    use std::io::Write;

    #[test]
    fn test_decode_little_endian() {
        let g = FrameGeometry::packed(2, 1).unwrap();
        assert_eq!(decode_rgb565(&[0x00, 0xF8, 0x1F, 0x00], &g).unwrap(), [0xF800, 0x001F]);
    }

    #[test]
    fn test_decode_rejects_short_and_odd_dumps() {
        let g = FrameGeometry::packed(4, 2).unwrap();
        assert!(decode_rgb565(&[0; 15], &g).is_err());
        assert!(decode_rgb565(&[0; 14], &g).is_err());
        // Padded geometry: the last row may stop at its visible width
        let padded = FrameGeometry::new(3, 2, 8).unwrap();
        assert_eq!(decode_rgb565(&[0; 14], &padded).unwrap().len(), 7);
    }

    #[test]
    fn test_config_file_and_profile_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"strategy": "BoundingBox", "dma_align": true}}"#).unwrap();

        let config = resolve_config(Some(file.path()), None).unwrap();
        assert_eq!(config.strategy, DiffStrategy::BoundingBox);
        assert!(config.dma_align);
        // Fields absent from the file keep their defaults
        assert_eq!(config.merge_threshold, DiffConfig::DEFAULT.merge_threshold);

        let config = resolve_config(Some(file.path()), Some(LinkProfile::Spi16Bit)).unwrap();
        assert_eq!(config.merge_threshold, 10);

        assert_eq!(resolve_config(None, None).unwrap(), DiffConfig::DEFAULT);
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!(parse_profile("hx8357d"), Ok(LinkProfile::Hx8357d));
        assert!(parse_profile("usb").unwrap_err().contains("spi8"));
    }

    #[test]
    fn test_run_on_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let prev_path = dir.path().join("prev.raw");
        let cur_path = dir.path().join("cur.raw");
        std::fs::write(&prev_path, [0u8; 64]).unwrap();
        let mut cur = [0u8; 64];
        cur[2 * (8 * 2 + 3)] = 0xFF;
        std::fs::write(&cur_path, cur).unwrap();

        let args = DiffArgs {
            width: 8,
            height: 4,
            stride: None,
            config: None,
            profile: Some(LinkProfile::Spi8Bit),
            interlaced: false,
            parity: 0,
            prev: prev_path,
            cur: cur_path,
        };
        run(&args).unwrap();
    }
}
