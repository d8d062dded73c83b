//! Wire format of command and response frames.
//!
//! Frame format:
//! - COMMAND ID (1 byte): bit 7 set on replies, bits 6:0 identify the command
//! - SIZE (1 byte): bytes that follow the header, checksum included
//!   (`total - 2`)
//! - PAYLOAD (0-252 bytes): command-specific data
//! - CHECKSUM (1 byte): two's-complement negation of the sum of every
//!   preceding byte, so a whole frame sums to zero
//!
//! There is no start marker. The receiver finds frame boundaries by looking
//! the command id up in its table, see [`crate::processor`].

/// Offset of the command id byte
pub const COMMAND_ID_OFFSET: usize = 0;

/// Offset of the size byte
pub const PAYLOAD_SIZE_OFFSET: usize = 1;

/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: usize = 2;

/// Header length (command id + size)
pub const HEADER_SIZE: usize = PAYLOAD_OFFSET;

/// Checksum length
pub const CHECKSUM_SIZE: usize = 1;

/// Fixed overhead of every frame (header + checksum)
pub const RAW_FRAME_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Largest frame the receive buffer can hold
pub const MAX_FRAME_SIZE: usize = 255;

/// Largest payload that fits in a frame
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - RAW_FRAME_SIZE;

/// Set in the command id byte of every response except the session's first
pub const REPLY_FLAG: u8 = 0x80;

/// Total frame length for a payload of `payload_size` bytes
pub const fn frame_size(payload_size: usize) -> usize {
    RAW_FRAME_SIZE + payload_size
}

/// Checksum over `bytes`: `(!sum) + 1`, i.e. the byte that makes the frame
/// sum to zero. Not a CRC.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_add(b))
        .wrapping_neg()
}

/// Errors from encoding or decoding a frame outside the command processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds [`MAX_PAYLOAD_SIZE`]
    PayloadTooLarge,
    /// Output buffer cannot hold the frame
    BufferTooSmall,
    /// Not all bytes of the frame are present yet
    Incomplete,
    /// Trailing byte does not match the computed checksum
    InvalidChecksum,
    /// Size byte describes a frame shorter than header + checksum
    InvalidFrame,
}

/// A validated frame borrowed from a byte slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Validate the frame at the start of `bytes`
    ///
    /// Bytes past the frame's declared size are ignored; use [`Frame::len`]
    /// to find where the next frame starts.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        if bytes.len() < RAW_FRAME_SIZE {
            return Err(FrameError::Incomplete);
        }

        let size = bytes[PAYLOAD_SIZE_OFFSET] as usize + HEADER_SIZE;
        if size < RAW_FRAME_SIZE {
            return Err(FrameError::InvalidFrame);
        }
        if bytes.len() < size {
            return Err(FrameError::Incomplete);
        }

        let (body, cs) = bytes[..size].split_at(size - CHECKSUM_SIZE);
        if checksum(body) != cs[0] {
            return Err(FrameError::InvalidChecksum);
        }

        Ok(Self {
            bytes: &bytes[..size],
        })
    }

    /// Command id with the reply flag masked off
    pub fn command_id(&self) -> u8 {
        self.bytes[COMMAND_ID_OFFSET] & !REPLY_FLAG
    }

    /// Whether the reply flag is set
    pub fn is_reply(&self) -> bool {
        self.bytes[COMMAND_ID_OFFSET] & REPLY_FLAG != 0
    }

    /// Payload between header and checksum
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[PAYLOAD_OFFSET..self.bytes.len() - CHECKSUM_SIZE]
    }

    /// Total frame length on the wire
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a frame has at least header and checksum
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Encode a command frame into `buffer`
///
/// This is the host side of the link. `command_id` is written unchanged, so
/// callers building replies must set [`REPLY_FLAG`] themselves.
///
/// Returns the number of bytes written.
pub fn encode(command_id: u8, payload: &[u8], buffer: &mut [u8]) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }

    let size = frame_size(payload.len());
    if buffer.len() < size {
        return Err(FrameError::BufferTooSmall);
    }

    buffer[COMMAND_ID_OFFSET] = command_id;
    buffer[PAYLOAD_SIZE_OFFSET] = (size - HEADER_SIZE) as u8;
    buffer[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
    buffer[size - 1] = checksum(&buffer[..size - 1]);

    Ok(size)
}

/// Encode a command frame into a heapless Vec
pub fn encode_to_vec(
    command_id: u8,
    payload: &[u8],
) -> Result<heapless::Vec<u8, MAX_FRAME_SIZE>, FrameError> {
    let mut buffer = [0u8; MAX_FRAME_SIZE];
    let len = encode(command_id, payload, &mut buffer)?;
    heapless::Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_negated_sum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x03, 0x01]), 0xFC);
        assert_eq!(checksum(&[0xFF, 0x01]), 0x00);
        // sum wraps at 8 bits
        assert_eq!(checksum(&[0x80, 0x80, 0x01]), 0xFF);
    }

    #[test]
    fn test_whole_frame_sums_to_zero() {
        let frame = encode_to_vec(0x21, &[9, 8, 7, 6]).unwrap();
        let sum = frame.iter().fold(0u8, |s, &b| s.wrapping_add(b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn test_encode_ping() {
        let mut buffer = [0u8; 8];
        let len = encode(0x03, &[], &mut buffer).unwrap();

        assert_eq!(len, 3);
        assert_eq!(&buffer[..3], &[0x03, 0x01, 0xFC]);
    }

    #[test]
    fn test_encode_with_payload() {
        let mut buffer = [0u8; 8];
        let len = encode(0x10, &[0xAA, 0x55], &mut buffer).unwrap();

        assert_eq!(len, 5);
        assert_eq!(buffer[0], 0x10);
        assert_eq!(buffer[1], 3); // two payload bytes + checksum
        assert_eq!(&buffer[2..4], &[0xAA, 0x55]);
        assert_eq!(buffer[4], checksum(&buffer[..4]));
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buffer = [0u8; 4];
        assert_eq!(
            encode(0x10, &[1, 2], &mut buffer),
            Err(FrameError::BufferTooSmall)
        );
    }

    #[test]
    fn test_encode_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let mut buffer = [0u8; 300];
        assert_eq!(
            encode(0x10, &payload, &mut buffer),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_largest_frame_fits() {
        let payload = [0x5Au8; MAX_PAYLOAD_SIZE];
        let frame = encode_to_vec(0x10, &payload).unwrap();
        assert_eq!(frame.len(), MAX_FRAME_SIZE);
        assert_eq!(frame[1], 253);

        let parsed = Frame::parse(&frame).unwrap();
        assert_eq!(parsed.payload().len(), MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_parse_reply() {
        let frame = encode_to_vec(0x83, &[1, 2, 3]).unwrap();
        let parsed = Frame::parse(&frame).unwrap();

        assert_eq!(parsed.command_id(), 0x03);
        assert!(parsed.is_reply());
        assert_eq!(parsed.payload(), &[1, 2, 3]);
        assert_eq!(parsed.len(), 6);
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let mut data = heapless::Vec::<u8, 16>::new();
        data.extend_from_slice(&[0x03, 0x01, 0xFC, 0x03, 0x01]).unwrap();

        let parsed = Frame::parse(&data).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(!parsed.is_reply());
        assert!(parsed.payload().is_empty());
    }

    #[test]
    fn test_parse_incomplete() {
        assert_eq!(Frame::parse(&[0x03, 0x01]), Err(FrameError::Incomplete));
        assert_eq!(
            Frame::parse(&[0x10, 0x03, 0xAA, 0x55]),
            Err(FrameError::Incomplete)
        );
    }

    #[test]
    fn test_parse_zero_size_field() {
        assert_eq!(
            Frame::parse(&[0x03, 0x00, 0xFD]),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_parse_bad_checksum() {
        let mut frame = encode_to_vec(0x03, &[]).unwrap();
        frame[2] ^= 0x01;
        assert_eq!(Frame::parse(&frame), Err(FrameError::InvalidChecksum));
    }
}
