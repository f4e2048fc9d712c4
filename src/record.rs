use crate::capture::CaptureSource;
use crate::error::Result;
use crate::label::{Labeler, TextFace};
use crate::output::FrameSink;
use chrono::{DateTime, Local, TimeZone};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILENAME_FORMAT: &str = "%Y-%m-%d--%H-%M-%S.jpg";

/// Text stamped onto a frame captured at `at`.
pub fn frame_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(LABEL_FORMAT).to_string()
}

/// File name for a frame captured at `at`; sorts in capture order.
pub fn frame_filename<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(FILENAME_FORMAT).to_string()
}

/// Drives capture, labelling and saving on a fixed period.
pub struct Recorder<C, O, F> {
    capture: C,
    sink: O,
    labeler: Labeler<F>,
    interval: Duration,
}

impl<C, O, F> Recorder<C, O, F>
where
    C: CaptureSource,
    O: FrameSink,
    F: TextFace,
{
    pub fn new(capture: C, sink: O, labeler: Labeler<F>, interval: Duration) -> Self {
        Self {
            capture,
            sink,
            labeler,
            interval,
        }
    }

    /// One capture-label-save cycle. Label and file name both derive from `now`.
    pub fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<PathBuf>
    where
        Tz::Offset: std::fmt::Display,
    {
        let _span = tracing::debug_span!("tick", device = self.capture.device_id()).entered();

        let mut frame = self.capture.capture_frame()?;
        self.labeler.label(&mut frame, &frame_label(now));

        let path = self.sink.write_frame(&frame, &frame_filename(now))?;
        tracing::debug!(
            "Saved {}x{} frame to {}",
            frame.width(),
            frame.height(),
            path.display()
        );

        Ok(path)
    }

    /// Tick every `interval` until an error occurs. The first tick fires
    /// one interval after the call.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Capturing every {:?}", self.interval);

        let mut deadline = Instant::now() + self.interval;
        let mut frame_count = 0u64;

        loop {
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }

            self.tick(&Local::now())?;
            frame_count += 1;

            if frame_count % 60 == 0 {
                tracing::info!("Captured {} frames", frame_count);
            }

            deadline += self.interval;
            let now = Instant::now();
            if deadline < now {
                tracing::warn!("Capture fell behind schedule, skipping missed ticks");
                deadline = now + self.interval;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::label::FontFace;
    use crate::output::{FrameWriter, LATEST_LINK};
    use image::{Rgb, RgbImage};

    struct StaticCapture {
        frames_left: usize,
    }

    impl CaptureSource for StaticCapture {
        fn capture_frame(&mut self) -> Result<RgbImage> {
            if self.frames_left == 0 {
                return Err(Error::Device {
                    device: 7,
                    reason: "no image on device".into(),
                });
            }
            self.frames_left -= 1;
            Ok(RgbImage::from_pixel(320, 60, Rgb([0x40, 0x80, 0xC0])))
        }

        fn device_id(&self) -> u32 {
            7
        }
    }

    #[derive(Default)]
    struct MemorySink {
        frames: Vec<(String, RgbImage)>,
    }

    impl FrameSink for MemorySink {
        fn write_frame(&mut self, frame: &RgbImage, filename: &str) -> Result<PathBuf> {
            self.frames.push((filename.to_string(), frame.clone()));
            Ok(PathBuf::from(filename))
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 3, 5, h, m, s).unwrap()
    }

    fn labeler() -> Labeler {
        Labeler::new(FontFace::load(None).unwrap())
    }

    #[test]
    fn timestamps_format_to_second() {
        let t = at(14, 7, 9);
        assert_eq!(frame_label(&t), "2024-03-05 14:07:09");
        assert_eq!(frame_filename(&t), "2024-03-05--14-07-09.jpg");
    }

    #[test]
    fn filenames_sort_chronologically() {
        let names: Vec<String> = [at(9, 59, 59), at(10, 0, 0), at(23, 1, 0)]
            .iter()
            .map(frame_filename)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn tick_labels_and_saves_with_single_timestamp() {
        let mut recorder = Recorder::new(
            StaticCapture { frames_left: 1 },
            MemorySink::default(),
            labeler(),
            Duration::from_secs(60),
        );

        let path = recorder.tick(&at(14, 7, 9)).unwrap();
        assert_eq!(path, PathBuf::from("2024-03-05--14-07-09.jpg"));

        let (name, frame) = &recorder.sink.frames[0];
        assert_eq!(name, "2024-03-05--14-07-09.jpg");

        let mut expected = RgbImage::from_pixel(320, 60, Rgb([0x40, 0x80, 0xC0]));
        labeler().label(&mut expected, "2024-03-05 14:07:09");
        assert_eq!(frame.as_raw(), expected.as_raw());
    }

    struct CountingCapture {
        captures: u8,
    }

    impl CaptureSource for CountingCapture {
        fn capture_frame(&mut self) -> Result<RgbImage> {
            self.captures += 1;
            Ok(RgbImage::from_pixel(8, 100, Rgb([self.captures; 3])))
        }

        fn device_id(&self) -> u32 {
            0
        }
    }

    #[test]
    fn frames_are_captured_during_their_own_tick() {
        let mut recorder = Recorder::new(
            CountingCapture { captures: 0 },
            MemorySink::default(),
            Labeler::new(FontFace::load(None).unwrap()),
            Duration::from_secs(60),
        );
        assert_eq!(recorder.capture.captures, 0);

        recorder.tick(&at(10, 0, 0)).unwrap();
        assert_eq!(recorder.capture.captures, 1);
        recorder.tick(&at(10, 1, 0)).unwrap();
        assert_eq!(recorder.capture.captures, 2);

        let saved: Vec<(&str, u8)> = recorder
            .sink
            .frames
            .iter()
            .map(|(name, frame)| (name.as_str(), frame.get_pixel(7, 0)[0]))
            .collect();
        assert_eq!(
            saved,
            vec![("2024-03-05--10-00-00.jpg", 1), ("2024-03-05--10-01-00.jpg", 2)]
        );
    }

    #[test]
    fn capture_failure_stops_the_tick() {
        let mut recorder = Recorder::new(
            StaticCapture { frames_left: 0 },
            MemorySink::default(),
            labeler(),
            Duration::from_secs(60),
        );

        let err = recorder.tick(&at(0, 0, 0)).unwrap_err();
        assert!(matches!(err, Error::Device { device: 7, .. }));
        assert!(recorder.sink.frames.is_empty());
    }

    #[test]
    fn run_exits_on_first_device_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::new(
            StaticCapture { frames_left: 2 },
            FrameWriter::new(dir.path()),
            labeler(),
            Duration::from_millis(1),
        );

        let err = recorder.run().unwrap_err();
        assert!(matches!(err, Error::Device { .. }));
        assert!(dir.path().join(LATEST_LINK).exists());
    }
}
