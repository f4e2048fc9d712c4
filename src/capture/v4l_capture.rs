use super::CaptureSource;
use crate::error::{Error, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::{Camera, NokhwaError};

/// The streaming half of a camera. The stream is only open while a frame
/// is being read, so no buffers fill up between ticks.
trait FrameStream {
    fn open(&mut self) -> std::result::Result<(), String>;
    fn read(&mut self) -> std::result::Result<RgbImage, String>;
    fn close(&mut self) -> std::result::Result<(), String>;
}

fn describe(e: NokhwaError) -> String {
    e.to_string()
}

impl FrameStream for Camera {
    fn open(&mut self) -> std::result::Result<(), String> {
        self.open_stream().map_err(describe)
    }

    fn read(&mut self) -> std::result::Result<RgbImage, String> {
        let buffer = self.frame().map_err(describe)?;
        buffer.decode_image::<RgbFormat>().map_err(describe)
    }

    fn close(&mut self) -> std::result::Result<(), String> {
        self.stop_stream().map_err(describe)
    }
}

/// Open the stream, take one frame, close the stream again. The stream is
/// closed on every path once it has been opened.
fn capture_fresh<S: FrameStream>(stream: &mut S, device: u32) -> Result<RgbImage> {
    let device_error = |reason: String| Error::Device { device, reason };

    stream
        .open()
        .map_err(|e| device_error(format!("unable to open stream: {e}")))?;

    let frame = stream
        .read()
        .map_err(|e| device_error(format!("cannot read device: {e}")));

    let closed = stream
        .close()
        .map_err(|e| device_error(format!("unable to stop stream: {e}")));

    let frame = frame?;
    closed?;

    if frame.width() == 0 || frame.height() == 0 {
        return Err(device_error("no image on device".into()));
    }

    Ok(frame)
}

pub struct WebcamCapture {
    camera: Camera,
    device: u32,
}

impl WebcamCapture {
    pub fn new(device: u32) -> Result<Self> {
        tracing::info!("Opening capture device {}", device);

        let index = CameraIndex::Index(device);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let camera = Camera::new(index, requested).map_err(|e| Error::Device {
            device,
            reason: format!("unable to open video capture device: {e}"),
        })?;

        let resolution = camera.resolution();
        tracing::info!(
            "Capture device {} ready at {}x{}",
            device,
            resolution.width(),
            resolution.height()
        );

        Ok(Self { camera, device })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        capture_fresh(&mut self.camera, self.device)
    }

    fn device_id(&self) -> u32 {
        self.device
    }
}
