// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Carrier codec round trips, including the full embed -> carry -> extract
//! chain.

use cihmsb_core::carrier::{
    decode_envelope, encode_envelope, image_to_zcode, text_to_zcode, zcode_to_image, zcode_to_text,
};
use cihmsb_core::{carrier_decode, carrier_encode, embed, extract, CarrierMeta, Raster, Secret, SecretType, StegoError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn random_bits(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0..=1u8)).collect()
}

#[test]
fn header_carrier_recovers_metadata() {
    let mut zcode = vec![1, 0, 1, 1];
    zcode.extend(random_bits(500, 31));
    let meta = CarrierMeta { style_id: 2, item_id: 5, size: 256 };

    let img = carrier_encode(&zcode, meta).unwrap();
    let (back, back_meta) = carrier_decode(&img).unwrap();
    assert_eq!(back.len(), zcode.len());
    assert_eq!(back, zcode);
    assert_eq!(back_meta, meta);
}

#[test]
fn header_carrier_various_lengths() {
    let meta = CarrierMeta { style_id: 0, item_id: 65_535, size: 4096 };
    for len in [1usize, 7, 8, 9, 63, 64, 65, 1000] {
        let zcode = random_bits(len, len as u64);
        let img = carrier_encode(&zcode, meta).unwrap();
        let bytes = (72 + len).div_ceil(8);
        let w = img.width() as usize;
        assert!(w * w <= bytes && (w + 1) * (w + 1) > bytes);
        assert_eq!(img.height() as usize, bytes.div_ceil(w));
        assert_eq!(carrier_decode(&img).unwrap(), (zcode, meta));
    }
}

#[test]
fn headerless_carrier_needs_length() {
    let zcode = random_bits(37, 32);
    let img = zcode_to_image(&zcode);
    assert_eq!(image_to_zcode(&img, Some(37)), zcode);
    let padded = image_to_zcode(&img, None);
    assert_eq!(&padded[..37], &zcode[..]);
    assert!(padded[37..].iter().all(|&b| b == 0));
}

#[test]
fn text_carrier_roundtrip() {
    let zcode = random_bits(211, 33);
    let text = zcode_to_text(&zcode);
    assert_eq!(text.len(), 211);
    assert_eq!(text_to_zcode(&text).unwrap(), zcode);
}

#[test]
fn full_chain_through_carrier_image() {
    let mut rng = ChaCha20Rng::seed_from_u64(34);
    let cover_px: Vec<u8> = (0..256 * 256).map(|_| rng.gen()).collect();
    let cover = Raster::gray(256, 256, cover_px).unwrap();
    let secret = Secret::Text("through the carrier and back".into());
    let key = Some("8c1f0e2a9b7d4c3e");

    let out = embed(&cover, &secret, key).unwrap();
    let meta = CarrierMeta { style_id: 3, item_id: 12, size: 256 };
    let carrier = carrier_encode(&out.zcode, meta).unwrap();

    let (zcode, got_meta) = carrier_decode(&carrier).unwrap();
    assert_eq!(u32::from(got_meta.size), cover.width());
    let back = extract(&cover, &zcode, SecretType::Text, key).unwrap();
    assert_eq!(back.secret, secret);
}

#[test]
fn full_chain_through_envelope() {
    let cover = Raster::gray(64, 64, (0..4096).map(|i| (i * 7 % 256) as u8).collect()).unwrap();
    let secret = Secret::Text("qr".into());
    let out = embed(&cover, &secret, None).unwrap();

    let env = encode_envelope(&out.zcode, CarrierMeta { style_id: 1, item_id: 4, size: 64 });
    assert!(env.starts_with("1-4-64|"));
    let (zcode, _) = decode_envelope(&env).unwrap();
    assert_eq!(extract(&cover, &zcode, SecretType::Text, None).unwrap().secret, secret);
}

#[test]
fn corrupted_carrier_header_is_fatal() {
    let img = carrier_encode(&random_bits(40, 35), CarrierMeta::default()).unwrap();
    let mut data = img.data().to_vec();
    // declare 2^24 bits
    data[0] = 1;
    let bad = Raster::gray(img.width(), img.height(), data).unwrap();
    assert!(matches!(carrier_decode(&bad), Err(StegoError::TruncatedZcode { .. })));
}
