// ── Wire codec ──
//
// Request framing and response decoding for the controller's UDP
// protocol. Pure functions: no I/O, no state, no error path.
//
// Request layout:
//
//   FD FD | 02 | 10 | device id (16) | 04 | password (4) | 01 | params | cksum (LE)
//
// The checksum covers everything from the type byte through the end of
// the parameter block.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::param::{ParameterId, ParameterValue, ValueWidth};

/// Frame start marker.
pub const START_MARKER: [u8; 2] = [0xFD, 0xFD];
/// Frame type byte.
pub const FRAME_TYPE: u8 = 0x02;
/// Width of the device id field.
pub const DEVICE_ID_LEN: usize = 16;
/// Width of the password field.
pub const PASSWORD_LEN: usize = 4;
/// Function byte of a read request.
pub const FUNC_READ: u8 = 0x01;
/// Function byte that opens the parameter section of a response.
pub const FUNC_RESPONSE: u8 = 0x06;
/// Prefix announcing the high byte of an extended parameter id.
pub const EXTENSION_PREFIX: u8 = 0xFF;
/// Checksum trailer length.
pub const CHECKSUM_LEN: usize = 2;
/// Responses shorter than this carry no usable data.
pub const MIN_RESPONSE_LEN: usize = 20;
/// Fixed bytes before the parameter block.
pub const HEADER_LEN: usize = START_MARKER.len() + 1 + 1 + DEVICE_ID_LEN + 1 + PASSWORD_LEN + 1;

/// Decoded parameter values of one response frame.
pub type ParameterMap = BTreeMap<ParameterId, ParameterValue>;

// ── RequestFrame ────────────────────────────────────────────────────

/// An encoded read request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame(Bytes);

impl RequestFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The encoded parameter block (between function byte and checksum).
    pub fn param_block(&self) -> &[u8] {
        self.0
            .get(HEADER_LEN..self.0.len().saturating_sub(CHECKSUM_LEN))
            .unwrap_or_default()
    }

    /// The trailing checksum, decoded little-endian.
    pub fn trailer(&self) -> u16 {
        match self.0.get(self.0.len().saturating_sub(CHECKSUM_LEN)..) {
            Some([lo, hi]) => u16::from_le_bytes([*lo, *hi]),
            _ => 0,
        }
    }
}

impl AsRef<[u8]> for RequestFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ── Encoding ────────────────────────────────────────────────────────

/// Wrapping 16-bit sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// Encode a read request for `params`.
///
/// `device_id` and `password` are written left-justified into their fixed
/// fields and zero-padded; longer values are silently truncated. Callers
/// wanting stricter behavior validate before calling (see
/// `vento_core::PollerConfig::validate`).
pub fn build_request(device_id: &str, password: &str, params: &[ParameterId]) -> RequestFrame {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + params.len() * 3 + CHECKSUM_LEN);

    buf.put_slice(&START_MARKER);
    buf.put_u8(FRAME_TYPE);
    put_sized_field(&mut buf, device_id.as_bytes(), DEVICE_ID_LEN);
    put_sized_field(&mut buf, password.as_bytes(), PASSWORD_LEN);
    buf.put_u8(FUNC_READ);
    for param in params {
        put_param(&mut buf, *param);
    }

    let sum = checksum(&buf[START_MARKER.len()..]);
    buf.put_u16_le(sum);

    RequestFrame(buf.freeze())
}

/// Size byte, then `value` truncated/zero-padded to `width`.
fn put_sized_field(buf: &mut BytesMut, value: &[u8], width: usize) {
    buf.put_u8(u8::try_from(width).unwrap_or(u8::MAX));
    let take = value.len().min(width);
    buf.put_slice(&value[..take]);
    buf.put_bytes(0, width - take);
}

fn put_param(buf: &mut BytesMut, param: ParameterId) {
    if param.is_extended() {
        buf.put_u8(EXTENSION_PREFIX);
        buf.put_u8(param.high_byte());
    }
    buf.put_u8(param.low_byte());
}

// ── Decoding ────────────────────────────────────────────────────────

/// Decode the parameter section of a response frame.
///
/// Returns an empty map when the frame is too short or has no function
/// marker; the caller decides what an empty result means. Decoding stops
/// at the trailing checksum or at the first value that would run past the
/// end of the buffer. A repeated id keeps its last value. The checksum is
/// not verified here, see [`response_checksum_matches`].
pub fn parse_response(data: &[u8]) -> ParameterMap {
    let mut values = ParameterMap::new();

    if data.len() < MIN_RESPONSE_LEN {
        warn!(len = data.len(), "response too short or empty");
        return values;
    }

    let Some(marker) = data.iter().position(|b| *b == FUNC_RESPONSE) else {
        warn!(len = data.len(), "response has no function marker");
        return values;
    };

    let end = data.len() - CHECKSUM_LEN;
    let mut pos = marker + 1;
    while pos < end {
        let Some(&id) = data.get(pos) else { break };
        pos += 1;

        let width = ValueWidth::for_response_id(id);
        let Some(value) = data
            .get(pos..pos + width.len())
            .and_then(|raw| width.decode(raw))
        else {
            debug!(id, pos, "value runs past end of frame");
            break;
        };

        values.insert(ParameterId::from(id), value);
        pos += width.len();
    }

    values
}

/// `true` when the last two bytes equal the sum of everything between the
/// start marker and the trailer.
///
/// The device's response checksum has not been observed to follow the
/// request rule on every firmware, so this is informational only.
pub fn response_checksum_matches(data: &[u8]) -> bool {
    if data.len() < START_MARKER.len() + CHECKSUM_LEN {
        return false;
    }
    let body_end = data.len() - CHECKSUM_LEN;
    match (data.get(START_MARKER.len()..body_end), data.get(body_end..)) {
        (Some(body), Some([lo, hi])) => checksum(body) == u16::from_le_bytes([*lo, *hi]),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Hand-built response: marker, device id, `06`, params, checksum.
    fn response(params: &[u8]) -> Vec<u8> {
        let mut body = vec![FRAME_TYPE, 0x10];
        body.extend_from_slice(b"DEFAULT_DEVICEID");
        body.extend_from_slice(&[0x04]);
        body.extend_from_slice(b"1111");
        body.push(FUNC_RESPONSE);
        body.extend_from_slice(params);
        let sum = checksum(&body);

        let mut frame = START_MARKER.to_vec();
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&sum.to_le_bytes());
        frame
    }

    // ── build_request ───────────────────────────────────────────────

    #[test]
    fn request_layout_for_default_parameters() {
        let frame = build_request("DEFAULT_DEVICEID", "1111", &ParameterId::DEFAULTS);
        let bytes = frame.as_bytes();

        assert_eq!(&bytes[..4], &[0xFD, 0xFD, 0x02, 0x10]);
        assert_eq!(&bytes[4..20], b"DEFAULT_DEVICEID");
        assert_eq!(&bytes[20..26], &[0x04, b'1', b'1', b'1', b'1', 0x01]);
        assert_eq!(
            frame.param_block(),
            &[0x01, 0x02, 0x06, 0x19, 0x25, 0x4A, 0x4B, 0xB7]
        );
        assert_eq!(frame.len(), HEADER_LEN + 8 + CHECKSUM_LEN);
    }

    #[test]
    fn request_checksum_matches_trailer() {
        let frame = build_request("DEFAULT_DEVICEID", "1111", &ParameterId::DEFAULTS);
        let bytes = frame.as_bytes();
        let body = &bytes[2..bytes.len() - 2];
        assert_eq!(checksum(body), frame.trailer());
    }

    #[test]
    fn request_length_formula_holds_for_mixed_ids() {
        let params = [
            ParameterId::new(0x0001),
            ParameterId::new(0x0302),
            ParameterId::new(0x00B7),
            ParameterId::new(0xFF00),
        ];
        let frame = build_request("dev", "12", &params);

        // 1 + 3 + 1 + 3 bytes of parameter block.
        assert_eq!(frame.param_block().len(), 8);
        assert_eq!(frame.len(), 2 + 1 + 1 + 16 + 1 + 4 + 1 + 8 + 2);

        let bytes = frame.as_bytes();
        assert_eq!(checksum(&bytes[2..bytes.len() - 2]), frame.trailer());
    }

    #[test]
    fn extended_ids_use_prefix() {
        let frame = build_request("d", "p", &[ParameterId::new(0x0302)]);
        assert_eq!(frame.param_block(), &[0xFF, 0x03, 0x02]);
    }

    #[test]
    fn short_fields_are_zero_padded() {
        let frame = build_request("AB", "9", &[]);
        let bytes = frame.as_bytes();
        assert_eq!(&bytes[4..6], b"AB");
        assert!(bytes[6..20].iter().all(|b| *b == 0));
        assert_eq!(&bytes[21..25], &[b'9', 0, 0, 0]);
    }

    #[test]
    fn long_fields_are_truncated() {
        let frame = build_request("0123456789ABCDEFXYZ", "123456", &[ParameterId::POWER]);
        let bytes = frame.as_bytes();
        assert_eq!(&bytes[4..20], b"0123456789ABCDEF");
        assert_eq!(&bytes[21..25], b"1234");
        assert_eq!(frame.len(), HEADER_LEN + 1 + CHECKSUM_LEN);
    }

    #[test]
    fn checksum_wraps_at_16_bits() {
        let data = vec![0xFF; 300];
        assert_eq!(checksum(&data), u16::try_from((300 * 0xFF) % 65536).unwrap());
    }

    // ── parse_response ──────────────────────────────────────────────

    #[test]
    fn parse_recovers_hand_built_values() {
        let frame = response(&[
            0x01, 0x01, // power on
            0x02, 0x03, // speed 3
            0x25, 0x37, // humidity 55
            0x4A, 0x2C, 0x01, // fan 1: 300 rpm
            0xB7, 0x01, // heat recovery
        ]);

        let values = parse_response(&frame);

        let expected: ParameterMap = [
            (ParameterId::POWER, ParameterValue::Number(1)),
            (ParameterId::SPEED_STAGE, ParameterValue::Number(3)),
            (ParameterId::HUMIDITY, ParameterValue::Number(0x37)),
            (ParameterId::FAN1_SPEED, ParameterValue::Number(300)),
            (ParameterId::OPERATING_MODE, ParameterValue::Number(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn fan_speeds_decode_little_endian() {
        let frame = response(&[0x4A, 0x2C, 0x01, 0x4B, 0x2C, 0x01]);
        let values = parse_response(&frame);
        assert_eq!(values[&ParameterId::FAN1_SPEED], ParameterValue::Number(300));
        assert_eq!(values[&ParameterId::FAN2_SPEED], ParameterValue::Number(300));
    }

    #[test]
    fn filter_timer_decodes_as_triple() {
        let frame = response(&[0x64, 0x01, 0x02, 0x03]);
        let values = parse_response(&frame);
        assert_eq!(
            values[&ParameterId::FILTER_TIMER],
            ParameterValue::Triple([1, 2, 3])
        );
    }

    #[test]
    fn short_input_yields_empty_map() {
        assert!(parse_response(&[]).is_empty());
        assert!(parse_response(&[0x06; 19]).is_empty());
    }

    #[test]
    fn missing_marker_yields_empty_map() {
        let data = vec![0x01; 40];
        assert!(parse_response(&data).is_empty());
    }

    #[test]
    fn duplicate_id_keeps_last_value() {
        let frame = response(&[0x01, 0x00, 0x25, 0x20, 0x01, 0x02]);
        let values = parse_response(&frame);
        assert_eq!(values[&ParameterId::POWER], ParameterValue::Number(2));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn truncated_value_stops_decoding() {
        // The filter timer id sits right before the checksum; its three
        // value bytes would run past the end of the frame.
        let frame = response(&[0x01, 0x01, 0x64]);
        let values = parse_response(&frame);
        assert_eq!(values.get(&ParameterId::POWER), Some(&ParameterValue::Number(1)));
        assert!(!values.contains_key(&ParameterId::FILTER_TIMER));
    }

    #[test]
    fn values_may_overlap_trailer() {
        // A value starting before the trailer is read even if it spans it.
        let mut frame = response(&[0x02, 0x01]);
        let len = frame.len();
        frame.truncate(len - 2);
        frame.extend_from_slice(&[0x4A, 0x2C, 0x01]);
        // ... 06 02 01 4A 2C 01: the fan id precedes the last two bytes.
        let values = parse_response(&frame);
        assert_eq!(values[&ParameterId::FAN1_SPEED], ParameterValue::Number(300));
    }

    #[test]
    fn response_checksum_helper() {
        let mut frame = response(&[0x01, 0x01]);
        assert!(response_checksum_matches(&frame));
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        assert!(!response_checksum_matches(&frame));
        // Corruption does not stop decoding.
        assert_eq!(parse_response(&frame).len(), 1);
    }
}
