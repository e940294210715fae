//! Integration tests for the class id color encoding

use synth::core::result::{class_id_color, decode_class_id, encode_class_id, SegmentationMap};

#[test]
fn test_round_trip_through_bytes() {
    for id in [0u32, 255, 65536, 0x102030, 0xFFFFFF] {
        assert_eq!(decode_class_id(encode_class_id(id)), id);
    }
}

#[test]
fn test_round_trip_through_normalized_color() {
    // The shader writes the normalized color into an 8-bit unorm target
    for id in [0u32, 1, 255, 256, 65536, 0x102030, 0xFFFFFF] {
        let bytes = class_id_color(id).map(|c| (c * 255.0).round() as u8);
        assert_eq!(decode_class_id(bytes), id);
    }
}

#[test]
fn test_byte_order_is_low_mid_high() {
    assert_eq!(encode_class_id(0x102030), [0x30, 0x20, 0x10]);
    assert_eq!(decode_class_id([1, 2, 3]), 1 + 2 * 256 + 3 * 65536);
}

#[test]
fn test_segmentation_png_round_trip() {
    let rgba: Vec<u8> = [7u32, 0, 0x102030, 65536]
        .iter()
        .flat_map(|&id| {
            let [r, g, b] = encode_class_id(id);
            [r, g, b, 255]
        })
        .collect();
    let map = SegmentationMap::from_rgba(&rgba, 2, 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("segmentation.png");
    map.save_png(&path).unwrap();

    let decoded = SegmentationMap::from_rgb_image(&image::open(&path).unwrap().to_rgb8());
    assert_eq!(decoded, map);
    assert_eq!(decoded.id_at(0, 1), 0x102030);
}
