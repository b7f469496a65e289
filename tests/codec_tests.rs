use hx_thermostat::codec::{decode, decode_with_fallback, encode};

#[test]
fn encode_decode_roundtrip_full_domain() {
    for heat in 0..=255i64 {
        for cool in 0..=255i64 {
            let packed = encode(heat, cool).unwrap();
            assert_eq!(decode(packed), (heat, cool));
        }
    }
}

#[test]
fn decode_encode_roundtrip_when_cool_byte_nonzero() {
    for packed in 0..=0xFFFFi64 {
        if packed & 0xFF == 0 {
            continue;
        }
        let (heat, cool) = decode(packed);
        assert_eq!(encode(heat, cool).unwrap(), packed);
    }
}

#[test]
fn zero_cool_byte_breaks_roundtrip_by_design() {
    let (heat, cool) = decode_with_fallback(0x4800);
    assert_eq!((heat, cool), (72, 72));
    assert_ne!(encode(heat, cool).unwrap(), 0x4800);
}

#[test]
fn documented_override_value() {
    assert_eq!(decode(18506), (72, 74));
    assert_eq!(encode(72, 74).unwrap(), 0x484A);
}

#[test]
fn out_of_range_setpoints_rejected() {
    assert!(encode(300, 74).is_err());
    assert!(encode(72, 256).is_err());
    assert!(encode(-1, -1).is_err());
}
