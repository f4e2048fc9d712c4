//! Minimal AVI (RIFF) writer for a single Motion-JPEG video stream.
//!
//! Layout:
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'
//!     avih
//!     LIST 'strl'
//!       strh
//!       strf
//!   LIST 'movi'
//!     00dc ...      one chunk per JPEG frame
//!   idx1
//! ```
//!
//! Chunk sizes and frame counts are placeholders until [`AviWriter::finish`]
//! seeks back and patches them.

use std::io::{self, Seek, SeekFrom, Write};

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;
const FRAME_CHUNK: &[u8; 4] = b"00dc";

#[derive(Clone, Copy)]
struct IndexEntry {
    offset: u32,
    length: u32,
}

pub struct AviWriter<W: Write + Seek> {
    out: W,
    riff_size_pos: u64,
    total_frames_pos: u64,
    stream_length_pos: u64,
    movi_size_pos: u64,
    index: Vec<IndexEntry>,
}

impl<W: Write + Seek> AviWriter<W> {
    /// Write the headers for a `width`x`height` stream at `fps` frames/s.
    pub fn new(out: W, width: u32, height: u32, fps: u32) -> io::Result<Self> {
        let mut writer = Self {
            out,
            riff_size_pos: 0,
            total_frames_pos: 0,
            stream_length_pos: 0,
            movi_size_pos: 0,
            index: Vec::new(),
        };
        writer.write_headers(width, height, fps.max(1))?;
        Ok(writer)
    }

    fn write_headers(&mut self, width: u32, height: u32, fps: u32) -> io::Result<()> {
        self.riff_size_pos = self.begin_list(b"RIFF", b"AVI ")?;
        let hdrl = self.begin_list(b"LIST", b"hdrl")?;

        self.out.write_all(b"avih")?;
        self.u32(56)?;
        self.u32(1_000_000 / fps)?; // microseconds per frame
        self.u32(0)?; // max bytes per second
        self.u32(0)?; // padding granularity
        self.u32(AVIF_HASINDEX)?;
        self.total_frames_pos = self.out.stream_position()?;
        self.u32(0)?; // total frames
        self.u32(0)?; // initial frames
        self.u32(1)?; // streams
        self.u32(0)?; // suggested buffer size
        self.u32(width)?;
        self.u32(height)?;
        for _ in 0..4 {
            self.u32(0)?; // reserved
        }

        let strl = self.begin_list(b"LIST", b"strl")?;

        self.out.write_all(b"strh")?;
        self.u32(56)?;
        self.out.write_all(b"vids")?;
        self.out.write_all(b"MJPG")?;
        self.u32(0)?; // flags
        self.u16(0)?; // priority
        self.u16(0)?; // language
        self.u32(0)?; // initial frames
        self.u32(1)?; // scale
        self.u32(fps)?; // rate
        self.u32(0)?; // start
        self.stream_length_pos = self.out.stream_position()?;
        self.u32(0)?; // length in frames
        self.u32(0)?; // suggested buffer size
        self.u32(u32::MAX)?; // quality: driver default
        self.u32(0)?; // sample size
        self.u16(0)?;
        self.u16(0)?;
        self.u16(clamp_u16(width))?;
        self.u16(clamp_u16(height))?;

        self.out.write_all(b"strf")?;
        self.u32(40)?;
        self.u32(40)?; // BITMAPINFOHEADER size
        self.u32(width)?;
        self.u32(height)?;
        self.u16(1)?; // planes
        self.u16(24)?; // bit count
        self.out.write_all(b"MJPG")?;
        self.u32(width.saturating_mul(height).saturating_mul(3))?;
        for _ in 0..4 {
            self.u32(0)?; // pels per meter x/y, colours used/important
        }

        self.end_chunk(strl)?;
        self.end_chunk(hdrl)?;

        self.movi_size_pos = self.begin_list(b"LIST", b"movi")?;
        Ok(())
    }

    /// Append one encoded JPEG as the next frame.
    pub fn add_frame(&mut self, jpeg: &[u8]) -> io::Result<()> {
        let length = u32::try_from(jpeg.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;
        let start = self.out.stream_position()?;
        // offsets are relative to the 'movi' fourcc
        let offset = u32::try_from(start - (self.movi_size_pos + 4))
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "container too large"))?;

        self.out.write_all(FRAME_CHUNK)?;
        self.u32(length)?;
        self.out.write_all(jpeg)?;
        if length % 2 == 1 {
            self.out.write_all(&[0])?;
        }

        self.index.push(IndexEntry { offset, length });
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.index.len()
    }

    /// Write the index, patch sizes and counts, and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.end_chunk(self.movi_size_pos)?;

        self.out.write_all(b"idx1")?;
        self.u32((self.index.len() * 16) as u32)?;
        for i in 0..self.index.len() {
            let IndexEntry { offset, length } = self.index[i];
            self.out.write_all(FRAME_CHUNK)?;
            self.u32(AVIIF_KEYFRAME)?;
            self.u32(offset)?;
            self.u32(length)?;
        }

        let frames = self.index.len() as u32;
        self.patch(self.total_frames_pos, frames)?;
        self.patch(self.stream_length_pos, frames)?;
        self.end_chunk(self.riff_size_pos)?;

        self.out.flush()?;
        Ok(self.out)
    }

    /// Write `id size kind` and return the position of the size field.
    fn begin_list(&mut self, id: &[u8; 4], kind: &[u8; 4]) -> io::Result<u64> {
        self.out.write_all(id)?;
        let size_pos = self.out.stream_position()?;
        self.u32(0)?;
        self.out.write_all(kind)?;
        Ok(size_pos)
    }

    fn end_chunk(&mut self, size_pos: u64) -> io::Result<()> {
        let end = self.out.stream_position()?;
        let size = u32::try_from(end - size_pos - 4)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "container too large"))?;
        self.patch(size_pos, size)
    }

    fn patch(&mut self, pos: u64, value: u32) -> io::Result<()> {
        let end = self.out.stream_position()?;
        self.out.seek(SeekFrom::Start(pos))?;
        self.u32(value)?;
        self.out.seek(SeekFrom::Start(end))?;
        Ok(())
    }

    fn u32(&mut self, value: u32) -> io::Result<()> {
        self.out.write_all(&value.to_le_bytes())
    }

    fn u16(&mut self, value: u16) -> io::Result<()> {
        self.out.write_all(&value.to_le_bytes())
    }
}

fn clamp_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Frame payloads in the 'movi' list of a finished AVI, in order.
#[cfg(test)]
pub(crate) fn movi_frames(data: &[u8]) -> Option<Vec<&[u8]>> {
    let read_u32 = |at: usize| -> Option<u32> {
        Some(u32::from_le_bytes(data.get(at..at + 4)?.try_into().ok()?))
    };

    if data.get(0..4)? != b"RIFF" || data.get(8..12)? != b"AVI " {
        return None;
    }

    let mut pos = 12;
    while pos + 12 <= data.len() {
        let id = data.get(pos..pos + 4)?;
        let size = read_u32(pos + 4)? as usize;
        if id == b"LIST" && data.get(pos + 8..pos + 12)? == b"movi" {
            let end = pos + 8 + size;
            let mut frames = Vec::new();
            let mut at = pos + 12;
            while at + 8 <= end {
                let len = read_u32(at + 4)? as usize;
                if data.get(at..at + 4)? == FRAME_CHUNK {
                    frames.push(data.get(at + 8..at + 8 + len)?);
                }
                at += 8 + len + len % 2;
            }
            return Some(frames);
        }
        pos += 8 + size + size % 2;
    }
    None
}
