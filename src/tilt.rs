use crate::types::TiltSample;
use log::{info, trace, warn};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Last known tilt in degrees. One slot, last write wins.
#[derive(Debug, Default)]
pub struct TiltCell {
    bits: AtomicU32,
}

impl TiltCell {
    pub fn new(degrees: f32) -> Self {
        TiltCell {
            bits: AtomicU32::new(degrees.to_bits()),
        }
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, degrees: f32) {
        self.bits.store(degrees.to_bits(), Ordering::Release);
    }
}

/// Tilt of the device in degrees, in (-180, 180].
///
/// `atan2(x, z)`: positive when the left-right axis leans towards +x.
pub fn tilt_degrees(sample: TiltSample) -> f32 {
    let degrees = (sample.x as f64).atan2(sample.z as f64).to_degrees() as f32;
    // atan2 reaches -pi exactly for (-0, z < 0), and values just above it round to -180 in f32
    if degrees <= -180.0 {
        180.0
    } else {
        degrees
    }
}

/// Feeds sensor samples into a shared [`TiltCell`].
#[derive(Debug, Clone)]
pub struct AngleEstimator {
    cell: Arc<TiltCell>,
}

impl AngleEstimator {
    pub fn new(cell: Arc<TiltCell>) -> Self {
        AngleEstimator { cell }
    }

    /// Returns the new tilt, or `None` if the sample was not finite and got dropped.
    pub fn update(&self, sample: TiltSample) -> Option<f32> {
        if !sample.x.is_finite() || !sample.z.is_finite() {
            trace!("dropping non-finite sample {:?}", sample);
            return None;
        }

        let tilt = tilt_degrees(sample);
        trace!("sample x={} z={} -> tilt {:.2}", sample.x, sample.z, tilt);
        self.cell.store(tilt);
        Some(tilt)
    }

    /// Reads one sample per line until EOF and returns how many were applied.
    ///
    /// Blank lines and `#` comments are skipped, malformed lines are logged and
    /// skipped. With a `pace`, each applied sample is held for that long before
    /// the next line is read.
    pub async fn follow<R>(&self, reader: R, pace: Option<Duration>) -> io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut applied = 0;
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.parse::<TiltSample>() {
                Ok(sample) => {
                    if self.update(sample).is_none() {
                        continue;
                    }
                    applied += 1;
                }
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            }

            if let Some(pace) = pace {
                tokio::time::sleep(pace).await;
            }
        }
        info!("sensor input ended after {} samples", applied);
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[rstest]
    #[case(0.0, 9.81, 0.0)]
    #[case(9.81, 0.0, 90.0)]
    #[case(-9.81, 0.0, -90.0)]
    #[case(1.0, 1.0, 45.0)]
    #[case(0.0, -9.81, 180.0)]
    #[case(-0.0, -9.81, 180.0)]
    #[case(0.0, 0.0, 0.0)]
    fn test_tilt_degrees(#[case] x: f32, #[case] z: f32, #[case] expected: f32) {
        let tilt = tilt_degrees(TiltSample::new(x, z));
        assert!(close(tilt, expected), "tilt({}, {}) = {}", x, z, tilt);
    }

    #[test]
    fn test_tilt_range_over_grid() {
        let values = [-1e6f32, -9.81, -3.0, -1e-6, -0.0, 0.0, 1e-6, 2.5, 9.81, 1e6];
        for &x in &values {
            for &z in &values {
                let tilt = tilt_degrees(TiltSample::new(x, z));
                assert!(tilt > -180.0 && tilt <= 180.0, "tilt({}, {}) = {}", x, z, tilt);

                let reference = x.atan2(z).to_degrees();
                let matches = close(tilt, reference) || (close(reference, -180.0) && tilt == 180.0);
                assert!(matches, "tilt({}, {}) = {}, atan2 gives {}", x, z, tilt, reference);
            }
        }
    }

    #[test]
    fn test_estimator_updates_cell() {
        let cell = Arc::new(TiltCell::default());
        let estimator = AngleEstimator::new(cell.clone());
        assert_eq!(cell.load(), 0.0);

        assert!(close(estimator.update(TiltSample::new(1.0, 1.0)).unwrap(), 45.0));
        assert!(close(cell.load(), 45.0));

        assert!(close(estimator.update(TiltSample::new(-1.0, 1.0)).unwrap(), -45.0));
        assert!(close(cell.load(), -45.0));
    }

    #[test]
    fn test_estimator_drops_non_finite() {
        let cell = Arc::new(TiltCell::new(12.5));
        let estimator = AngleEstimator::new(cell.clone());

        assert_eq!(estimator.update(TiltSample::new(f32::NAN, 1.0)), None);
        assert_eq!(estimator.update(TiltSample::new(1.0, f32::INFINITY)), None);
        assert_eq!(cell.load(), 12.5);
    }

    #[tokio::test]
    async fn test_follow_skips_bad_lines() {
        let cell = Arc::new(TiltCell::default());
        let estimator = AngleEstimator::new(cell.clone());
        let input = "# x,y,z\n1,9.8,1\n\nnot a sample\nNaN,0,1\n-1 9.8 1\n";

        let applied = estimator.follow(input.as_bytes(), None).await.unwrap();

        assert_eq!(applied, 2);
        assert!(close(cell.load(), -45.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_holds_each_sample() {
        let cell = Arc::new(TiltCell::default());
        let estimator = AngleEstimator::new(cell.clone());
        let started = tokio::time::Instant::now();

        let applied = estimator
            .follow(&b"1,1\n-1,1\nbad\n0,1\n"[..], Some(Duration::from_millis(500)))
            .await
            .unwrap();

        assert_eq!(applied, 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
        assert!(close(cell.load(), 0.0));
    }
}
