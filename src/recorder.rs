use std::{
    fs::File,
    io::{BufWriter, Seek, SeekFrom, Write},
    path::Path,
};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

pub const MAGIC_BYTES: &[u8; 4] = b"GRD1";
pub const MAX_HEADER_BYTES: u32 = 1_048_576; // 1 MB

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub width: i32,
    pub height: i32,
    pub rule: String,
    pub seed: u64,
    pub density: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackMeta {
    pub total_frames: usize,
    pub save_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunHeader {
    pub version: u32,
    pub timestamp: String,
    pub config: RunConfig,
    pub playback: PlaybackMeta,
}

impl RunHeader {
    pub fn new(config: RunConfig, playback: PlaybackMeta) -> Self {
        let now: DateTime<Utc> = Utc::now();
        Self {
            version: 1,
            timestamp: now.to_rfc3339(),
            config,
            playback,
        }
    }
}

/// Streams life frames to disk: magic, header length (u32 LE), JSON header,
/// then one byte per cell per frame, row-major.
///
/// The header is padded with trailing spaces so [`FrameRecorder::finish`] can
/// rewrite `total_frames` in place once the real count is known.
pub struct FrameRecorder {
    writer: BufWriter<File>,
    header: RunHeader,
    header_len: u32,
    frame_buffer: Vec<u8>,
    frames_written: u64,
}

// Enough for any change in the digits of `total_frames`.
const HEADER_SLACK: usize = 20;

fn encode_header(header: &RunHeader, len: usize) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec(header)?;
    if json.len() > len {
        bail!("Header grew past its reserved {} bytes", len);
    }
    json.resize(len, b' ');
    Ok(json)
}

impl FrameRecorder {
    pub fn create<P: AsRef<Path>>(path: P, header: RunHeader) -> Result<Self> {
        let path = path.as_ref();
        let (width, height) = (header.config.width, header.config.height);
        if width < 0 || height < 0 {
            bail!("Negative grid dimensions ({}, {})", width, height);
        }

        let header_len = serde_json::to_vec(&header)?.len() + HEADER_SLACK;
        if header_len > MAX_HEADER_BYTES as usize {
            bail!(
                "Header too large to encode length (max {} bytes)",
                MAX_HEADER_BYTES
            );
        }
        let header_json = encode_header(&header, header_len)?;
        let header_len = header_len as u32;

        let file = File::create(path)
            .with_context(|| format!("failed to create recording: {path:?}"))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC_BYTES)?;
        writer.write_all(&header_len.to_le_bytes())?;
        writer.write_all(&header_json)?;
        debug!("recording to {path:?} ({header_len} byte header)");

        let capacity = width as usize * height as usize;

        Ok(Self {
            writer,
            header,
            header_len,
            frame_buffer: Vec::with_capacity(capacity),
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, cells: &Grid<bool>) -> Result<()> {
        let config = &self.header.config;
        if cells.width() != config.width || cells.height() != config.height {
            bail!(
                "Shape mismatch: expected ({}, {}), got ({}, {})",
                config.width,
                config.height,
                cells.width(),
                cells.height()
            );
        }

        self.frame_buffer.clear();
        for y in 0..cells.height() {
            for x in 0..cells.width() {
                let alive = cells.cell(x, y).copied().unwrap_or(false);
                self.frame_buffer.push(u8::from(alive));
            }
        }
        self.writer.write_all(&self.frame_buffer)?;

        self.frames_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        debug!("flushed {} frames", self.frames_written);
        Ok(())
    }

    /// Rewrites `total_frames` with the number of frames actually written,
    /// then flushes.
    pub fn finish(mut self) -> Result<()> {
        self.header.playback.total_frames = self.frames_written as usize;
        let header_json = encode_header(&self.header, self.header_len as usize)?;

        let header_start = (MAGIC_BYTES.len() + std::mem::size_of::<u32>()) as u64;
        self.writer.seek(SeekFrom::Start(header_start))?;
        self.writer.write_all(&header_json)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.flush()
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn header(&self) -> &RunHeader {
        &self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn header(width: i32, height: i32) -> RunHeader {
        RunHeader::new(
            RunConfig {
                width,
                height,
                rule: "B3/S23".to_string(),
                seed: 42,
                density: 0.5,
            },
            PlaybackMeta {
                total_frames: 1,
                save_interval: 1,
            },
        )
    }

    #[test]
    fn writes_header_and_body() -> Result<()> {
        let tmp_path = std::env::temp_dir().join("girder_recorder_test.grd");
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let header = header(3, 2);
        let mut recorder = FrameRecorder::create(&tmp_path, header.clone())?;
        let mut cells = Grid::new(3, 2);
        cells.set(0, 0, true);
        cells.set(2, 1, true);
        recorder.write_frame(&cells)?;
        recorder.flush()?;
        assert_eq!(recorder.frames_written(), 1);

        let bytes = fs::read(&tmp_path)?;
        assert_eq!(&bytes[0..4], MAGIC_BYTES);

        let header_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let header_json = std::str::from_utf8(&bytes[8..8 + header_len]).unwrap();
        let parsed: RunHeader = serde_json::from_str(header_json).unwrap();
        assert_eq!(parsed, header);

        let body = &bytes[8 + header_len..];
        assert_eq!(body, &[1, 0, 0, 0, 0, 1]);

        fs::remove_file(&tmp_path)?;
        Ok(())
    }

    #[test]
    fn rejects_mismatched_frame() -> Result<()> {
        let tmp_path = std::env::temp_dir().join("girder_recorder_mismatch.grd");
        let mut recorder = FrameRecorder::create(&tmp_path, header(4, 4))?;

        assert!(recorder.write_frame(&Grid::new(4, 3)).is_err());
        assert_eq!(recorder.frames_written(), 0);

        fs::remove_file(&tmp_path)?;
        Ok(())
    }

    fn read_header(bytes: &[u8]) -> Result<(RunHeader, usize)> {
        let header_len = u32::from_le_bytes(bytes[4..8].try_into()?) as usize;
        let header_json = std::str::from_utf8(&bytes[8..8 + header_len])?;
        Ok((serde_json::from_str(header_json)?, header_len))
    }

    #[test]
    fn rejects_negative_dimensions() {
        let tmp_path = std::env::temp_dir().join("girder_recorder_negative.grd");
        let _ = fs::remove_file(&tmp_path);

        assert!(FrameRecorder::create(&tmp_path, header(-5, 4)).is_err());
        assert!(!tmp_path.exists());
    }

    #[test]
    fn rejects_oversized_header() {
        let tmp_path = std::env::temp_dir().join("girder_recorder_oversized.grd");
        let _ = fs::remove_file(&tmp_path);

        let mut big = header(2, 2);
        big.config.rule = "B".repeat(MAX_HEADER_BYTES as usize);
        let err = FrameRecorder::create(&tmp_path, big).err();
        assert!(err.is_some_and(|e| e.to_string().contains("Header too large")));
        assert!(!tmp_path.exists());
    }

    #[test]
    fn finish_records_actual_frame_count() -> Result<()> {
        let tmp_path = std::env::temp_dir().join("girder_recorder_finish.grd");
        let mut planned = header(2, 2);
        planned.playback.total_frames = 1000;

        let mut recorder = FrameRecorder::create(&tmp_path, planned)?;
        let mut cells = Grid::new(2, 2);
        recorder.write_frame(&cells)?;
        cells.set(1, 1, true);
        recorder.write_frame(&cells)?;
        recorder.finish()?;

        let bytes = fs::read(&tmp_path)?;
        let (parsed, header_len) = read_header(&bytes)?;
        assert_eq!(parsed.playback.total_frames, 2);
        assert_eq!(parsed.config.rule, "B3/S23");
        assert_eq!(&bytes[8 + header_len..], &[0, 0, 0, 0, 0, 0, 0, 1]);

        fs::remove_file(&tmp_path)?;
        Ok(())
    }
}
