//! Property-based tests for the Codemasters decoders.
//!
//! The decoder must never panic and must be deterministic for any input.

use proptest::prelude::*;
use rallydash_telemetry_codemasters::{
    DIRT_SERIES_PACKET_LEN, DecodeError, DirtSeriesPacket, EA_WRC_PACKET_LEN, EaWrcPacket, decode,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Arbitrary random bytes of any length must never cause a panic.
    #[test]
    fn prop_random_bytes_no_panic(
        data in proptest::collection::vec(any::<u8>(), 0..1024)
    ) {
        let _ = decode(&data);
    }

    /// Decoding the same Mode 1 bytes twice yields identical records.
    /// Compared through `Debug` so NaN payloads compare equal.
    #[test]
    fn prop_dirt_series_decode_is_deterministic(
        data in proptest::collection::vec(any::<u8>(), DIRT_SERIES_PACKET_LEN..=DIRT_SERIES_PACKET_LEN)
    ) {
        let first = decode(&data);
        let second = decode(&data);
        prop_assert_eq!(format!("{first:?}"), format!("{second:?}"));
        prop_assert!(first.is_ok());
    }

    /// Any 237-byte buffer decodes as EA SPORTS WRC.
    #[test]
    fn prop_ea_wrc_length_always_decodes(
        data in proptest::collection::vec(any::<u8>(), EA_WRC_PACKET_LEN..=EA_WRC_PACKET_LEN)
    ) {
        prop_assert!(EaWrcPacket::decode(&data).is_ok());
        prop_assert!(decode(&data).is_ok());
    }

    /// Layout decoders reject every undersized buffer with ShortBuffer.
    #[test]
    fn prop_layout_decoders_reject_short_input(len in 0usize..DIRT_SERIES_PACKET_LEN) {
        let data = vec![0u8; len];
        prop_assert_eq!(
            DirtSeriesPacket::decode(&data),
            Err(DecodeError::ShortBuffer { got: len, want: DIRT_SERIES_PACKET_LEN })
        );
        if len < EA_WRC_PACKET_LEN {
            prop_assert_eq!(
                EaWrcPacket::decode(&data),
                Err(DecodeError::ShortBuffer { got: len, want: EA_WRC_PACKET_LEN })
            );
        }
    }
}
