use crate::shared::constants::STREAM_BOUNDARY;

/// Content type of the live stream response.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Frames one JPEG image as a `multipart/x-mixed-replace` part.
pub fn frame_chunk(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{STREAM_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut chunk = Vec::with_capacity(header.len() + jpeg.len() + 2);
    chunk.extend_from_slice(header.as_bytes());
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(b"\r\n");
    chunk
}
