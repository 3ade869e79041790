//! Frame Decode Worker
//!
//! JPEG decoding runs on a dedicated thread so the render loop never blocks
//! on it. Each decoded frame is posted back together with its encoded size.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use image::ImageFormat;

use crate::stream::StreamEvent;
use crate::stream::error::StreamResult;

/// A frame exactly as it came off the socket.
#[derive(Clone, Debug)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub received_at: Instant,
}

impl EncodedFrame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            received_at: Instant::now(),
        }
    }
}

/// A frame decoded to tightly packed RGBA8.
#[derive(Clone)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Size of the JPEG payload in bytes.
    pub encoded_len: usize,
    pub received_at: Instant,
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("encoded_len", &self.encoded_len)
            .finish_non_exhaustive()
    }
}

/// Decode a JPEG payload into `(width, height, rgba)`.
pub fn decode_jpeg(bytes: &[u8]) -> StreamResult<(u32, u32, Vec<u8>)> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}

/// Handle to the decode worker thread.
///
/// Cheap to clone; the worker exits once every handle is dropped.
#[derive(Clone)]
pub struct FrameDecoder {
    sender: Sender<EncodedFrame>,
}

impl FrameDecoder {
    /// Start the worker, posting results to `events`.
    pub fn spawn(events: Sender<StreamEvent>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("stream-decoder".into())
            .spawn(move || run_decoder(receiver, events))
            .expect("failed to spawn decoder thread");
        (Self { sender }, handle)
    }

    /// Queue a frame for decoding.
    pub fn submit(&self, frame: EncodedFrame) {
        if let Err(e) = self.sender.send(frame) {
            log::warn!("Decoder is gone, dropping frame: {}", e);
        }
    }
}

fn run_decoder(receiver: Receiver<EncodedFrame>, events: Sender<StreamEvent>) {
    log::debug!("Decoder thread started");

    for mut frame in receiver.iter() {
        // Frames that queued up behind a slow decode are stale; keep the newest
        let mut skipped = 0;
        for newer in receiver.try_iter() {
            frame = newer;
            skipped += 1;
        }
        if skipped > 0 {
            log::debug!("Decoder behind, skipped {} queued frames", skipped);
        }

        let encoded_len = frame.bytes.len();
        match decode_jpeg(&frame.bytes) {
            Ok((width, height, rgba)) => {
                let decoded = DecodedFrame {
                    width,
                    height,
                    rgba,
                    encoded_len,
                    received_at: frame.received_at,
                };
                if events.send(StreamEvent::Frame(decoded)).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::error!("Dropping undecodable frame ({} bytes): {}", encoded_len, e);
            }
        }
    }

    log::debug!("Decoder thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ExtendedColorType, ImageEncoder};
    use std::time::Duration;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![200u8; (width * height * 3) as usize];
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 80)
            .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn test_decode_jpeg() {
        let (width, height, rgba) = decode_jpeg(&jpeg(16, 8)).unwrap();
        assert_eq!((width, height), (16, 8));
        assert_eq!(rgba.len(), 16 * 8 * 4);
        assert!(rgba.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_decode_rejects_non_jpeg() {
        assert!(decode_jpeg(b"definitely not a jpeg").is_err());
    }

    #[test]
    fn test_worker_skips_bad_frames() {
        let (events_tx, events_rx) = unbounded();
        let (decoder, handle) = FrameDecoder::spawn(events_tx);

        let bytes = jpeg(4, 4);
        let len = bytes.len();
        decoder.submit(EncodedFrame::new(b"garbage".to_vec()));
        decoder.submit(EncodedFrame::new(bytes));

        match events_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            StreamEvent::Frame(frame) => {
                assert_eq!((frame.width, frame.height), (4, 4));
                assert_eq!(frame.encoded_len, len);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        drop(decoder);
        handle.join().unwrap();
        assert!(events_rx.try_recv().is_err());
    }

    #[test]
    fn test_backlog_decodes_newest_only() {
        let (frames_tx, frames_rx) = unbounded();
        let (events_tx, events_rx) = unbounded();

        for width in 1..=5 {
            frames_tx.send(EncodedFrame::new(jpeg(width * 8, 8))).unwrap();
        }
        drop(frames_tx);
        run_decoder(frames_rx, events_tx);

        let decoded: Vec<u32> = events_rx
            .try_iter()
            .map(|event| match event {
                StreamEvent::Frame(frame) => frame.width,
                other => panic!("unexpected event: {:?}", other),
            })
            .collect();
        assert_eq!(decoded, [40]);
    }
}
