/// Averaged spectral energy per perceptual channel, each normalized to [0,1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandLevels {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

/// Partition boundaries for a spectrum of `len` bins: `[0, low_end)` is the
/// low band, `[low_end, mid_end)` the mid band, `[mid_end, len)` the high
/// band. The three ranges cover the spectrum exactly, with no overlap.
pub fn band_boundaries(len: usize) -> (usize, usize) {
    let low_end = (len as f32 * 0.15) as usize;
    let mid_end = (len as f32 * 0.5) as usize;
    (low_end, mid_end)
}

/// Reduce a byte spectrum into three band averages.
///
/// Pure function of the input frame; degenerate ranges (frames too short to
/// populate a band) yield 0 for that band rather than a NaN.
pub fn extract_bands(frame: &[u8]) -> BandLevels {
    let (low_end, mid_end) = band_boundaries(frame.len());

    BandLevels {
        low: average_range(frame, 0, low_end),
        mid: average_range(frame, low_end, mid_end),
        high: average_range(frame, mid_end, frame.len()),
    }
}

/// Mean level of the whole frame, normalized to [0,1].
pub fn average_level(frame: &[u8]) -> f32 {
    average_range(frame, 0, frame.len())
}

fn average_range(data: &[u8], start: usize, end: usize) -> f32 {
    if start >= end || start >= data.len() {
        return 0.0;
    }

    let end = end.min(data.len());
    let sum: u32 = data[start..end].iter().map(|&v| v as u32).sum();
    sum as f32 / (end - start) as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_frame_yields_uniform_bands() {
        let frame = vec![100u8; 1024];
        let bands = extract_bands(&frame);

        let expected = 100.0 / 255.0;
        assert!((bands.low - expected).abs() < 1e-6);
        assert!((bands.mid - expected).abs() < 1e-6);
        assert!((bands.high - expected).abs() < 1e-6);
    }

    #[test]
    fn boundaries_partition_without_gap_or_overlap() {
        for len in [1usize, 7, 64, 512, 1024] {
            let (low_end, mid_end) = band_boundaries(len);
            assert!(low_end <= mid_end);
            assert!(mid_end <= len);

            let low_count = low_end;
            let mid_count = mid_end - low_end;
            let high_count = len - mid_end;
            assert_eq!(low_count + mid_count + high_count, len);
        }
    }

    #[test]
    fn degenerate_ranges_are_zero() {
        // A single-bin frame leaves the low and mid ranges empty.
        let bands = extract_bands(&[204]);
        assert_eq!(bands.low, 0.0);
        assert_eq!(bands.mid, 0.0);
        assert!((bands.high - 204.0 / 255.0).abs() < 1e-6);

        let empty = extract_bands(&[]);
        assert_eq!(empty, BandLevels::default());
    }

    #[test]
    fn average_level_matches_mean() {
        assert_eq!(average_level(&[]), 0.0);
        assert!((average_level(&[255; 32]) - 1.0).abs() < 1e-6);
        assert!((average_level(&[0, 255]) - 0.5).abs() < 1e-3);
    }
}
