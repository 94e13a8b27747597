//! Waveform peak envelopes

/// Peak amplitude of `samples` split into `bins` equal spans.
///
/// With `normalize` the result is scaled so the largest peak is 1.0.
pub fn peaks(samples: &[f32], bins: usize, normalize: bool) -> Vec<f32> {
    if samples.is_empty() || bins == 0 {
        return Vec::new();
    }

    let bins = bins.min(samples.len());
    let mut output: Vec<f32> = (0..bins)
        .map(|bin| {
            let start = bin * samples.len() / bins;
            let end = (bin + 1) * samples.len() / bins;
            samples[start..end]
                .iter()
                .fold(0.0f32, |peak, &s| peak.max(s.abs()))
        })
        .collect();

    if normalize {
        let max = output.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 {
            for peak in &mut output {
                *peak /= max;
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaks_per_bin() {
        let samples = [0.1, -0.4, 0.2, 0.0, 0.05, -0.05];
        assert_eq!(peaks(&samples, 3, false), vec![0.4, 0.2, 0.05]);
    }

    #[test]
    fn test_normalized_peaks() {
        let samples = [0.25, 0.5];
        assert_eq!(peaks(&samples, 2, true), vec![0.5, 1.0]);
    }

    #[test]
    fn test_more_bins_than_samples() {
        assert_eq!(peaks(&[0.3, 0.6], 10, false).len(), 2);
        assert!(peaks(&[], 4, true).is_empty());
        assert_eq!(peaks(&[0.0; 8], 2, true), vec![0.0, 0.0]);
    }
}
