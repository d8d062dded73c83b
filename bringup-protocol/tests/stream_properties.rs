//! Stream-level properties of the command processor, checked against
//! arbitrary byte streams.

use bringup_hal::UartTx;
use bringup_protocol::frame::{encode_to_vec, HEADER_SIZE, PAYLOAD_SIZE_OFFSET};
use bringup_protocol::{
    checksum, CommandProcessor, CommandTable, Frame, ProtocolConfig, Reply, ReplyError,
    TrailingBytes,
};
use proptest::prelude::*;

const PING: u8 = 0x03;
const ECHO: u8 = 0x10;
const ECHO_PAYLOAD: usize = 4;

#[derive(Default)]
struct Wire {
    frames: Vec<Vec<u8>>,
}

impl UartTx for Wire {
    type Error = ();

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
        self.frames.push(data.to_vec());
        Ok(())
    }
}

fn respond(_: &mut (), reply: &mut Reply<'_>, size: u8) -> Result<(), ReplyError> {
    reply.send(size)
}

fn processor(trailing: TrailingBytes) -> CommandProcessor<()> {
    let table = CommandTable::builder()
        .register(PING, 0, respond)
        .unwrap()
        .register(ECHO, ECHO_PAYLOAD as u8, respond)
        .unwrap()
        .build();
    let config = ProtocolConfig {
        trailing,
        ..ProtocolConfig::default()
    };
    CommandProcessor::new(table, config)
}

fn echo_frame(payload: &[u8; ECHO_PAYLOAD]) -> Vec<u8> {
    encode_to_vec(ECHO, payload).unwrap().to_vec()
}

/// Payload bytes that can never be mistaken for a registered id
fn payload_byte() -> impl Strategy<Value = u8> {
    0x20u8..0x80
}

/// Noise bytes that are never a registered id
fn noise_byte() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("registered id", |b| *b != PING && *b != ECHO)
}

proptest! {
    #[test]
    fn encoded_frames_parse_and_sum_to_zero(
        id in 1u8..0x80,
        payload in proptest::collection::vec(any::<u8>(), 0..=252),
    ) {
        let frame = encode_to_vec(id, &payload).unwrap();
        let sum = frame.iter().fold(0u8, |s, &b| s.wrapping_add(b));
        prop_assert_eq!(sum, 0);
        prop_assert_eq!(checksum(&frame[..frame.len() - 1]), frame[frame.len() - 1]);

        let parsed = Frame::parse(&frame).unwrap();
        prop_assert_eq!(parsed.command_id(), id);
        prop_assert_eq!(parsed.payload(), &payload[..]);
    }

    #[test]
    fn valid_frame_is_dispatched_once(
        payload in proptest::array::uniform4(payload_byte()),
    ) {
        let mut p = processor(TrailingBytes::Retain);
        let mut wire = Wire::default();

        for b in echo_frame(&payload) {
            p.push(b);
        }
        prop_assert_eq!(p.process(&mut (), &mut wire), Some(ECHO));
        prop_assert_eq!(p.process(&mut (), &mut wire), None);
        prop_assert_eq!(wire.frames.len(), 1);
        prop_assert_eq!(&wire.frames[0][2..2 + ECHO_PAYLOAD], &payload[..]);
    }

    #[test]
    fn single_bit_corruption_is_rejected(
        payload in proptest::array::uniform4(payload_byte()),
        bit in 0usize..(ECHO_PAYLOAD + 3) * 8,
    ) {
        let mut frame = echo_frame(&payload);
        frame[bit / 8] ^= 1 << (bit % 8);

        let mut p = processor(TrailingBytes::Retain);
        let mut wire = Wire::default();
        for &b in &frame {
            p.push(b);
        }

        prop_assert_eq!(p.process(&mut (), &mut wire), None);
        prop_assert!(wire.frames.is_empty());
        prop_assert!(p.stats().discarded() >= 1);
        // every byte that left the buffer was a counted single-byte discard
        prop_assert_eq!(
            p.stats().discarded() as usize + p.buffered().len(),
            frame.len()
        );
    }

    #[test]
    fn frame_behind_noise_is_found(
        noise in proptest::collection::vec(noise_byte(), 0..64),
        payload in proptest::array::uniform4(payload_byte()),
    ) {
        let mut p = processor(TrailingBytes::Retain);
        let mut wire = Wire::default();

        for &b in noise.iter().chain(echo_frame(&payload).iter()) {
            p.push(b);
            p.process(&mut (), &mut wire);
        }

        prop_assert_eq!(wire.frames.len(), 1);
        prop_assert_eq!(p.calls(ECHO), Some(1));
        prop_assert!(p.buffered().is_empty());
    }

    #[test]
    fn arbitrary_stream_never_stalls(
        stream in proptest::collection::vec(any::<u8>(), 0..600),
        discard in any::<bool>(),
    ) {
        let trailing = if discard { TrailingBytes::Discard } else { TrailingBytes::Retain };
        let mut p = processor(trailing);
        let mut wire = Wire::default();

        for &b in &stream {
            p.push(b);
            if p.process(&mut (), &mut wire).is_some() {
                continue;
            }

            // Idle only because more bytes are needed: either no full
            // header yet, or a known head waiting for its tail.
            let pending = p.buffered();
            if pending.len() > HEADER_SIZE {
                let descriptor = p.table().find(pending[0]);
                prop_assert!(descriptor.is_some());
                let expected = descriptor.unwrap().size() as usize;
                prop_assert_eq!(pending[PAYLOAD_SIZE_OFFSET] as usize + HEADER_SIZE, expected);
                prop_assert!(pending.len() < expected);
            }
        }

        prop_assert_eq!(wire.frames.len() as u32, p.stats().handler_done);
    }
}
