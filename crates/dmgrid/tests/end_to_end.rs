//! Full-pipeline tests: synthetic symbols rendered to images and decoded
//! through the public API.

mod common;

use common::{render, symbol_grid};
use dmgrid::preprocess::BinarizeMethod;
use dmgrid::{find_spec, DecodeConfig, Decoder, PreprocessConfig};

/// Fixed-threshold conditioning keeps synthetic flat-field renders out of
/// adaptive-threshold edge cases.
fn decoder() -> Decoder {
    Decoder::with_config(DecodeConfig {
        preprocess: PreprocessConfig {
            method: BinarizeMethod::Fixed,
            ..PreprocessConfig::default()
        },
    })
}

const PAD: u8 = 129;

#[test]
fn decodes_the_smallest_symbol() {
    let spec = find_spec(10, 10).unwrap();
    let grid = symbol_grid(spec, &[b'A' + 1, b'B' + 1, PAD]);
    let image = render(&grid, 8, 24, false);

    let outcome = decoder().decode(&image);
    assert!(outcome.success(), "no symbol decoded");
    assert_eq!(outcome.takes, 1);
    let symbol = &outcome.symbols[0];
    assert_eq!(symbol.payload, b"AB");
    assert_eq!((symbol.num_rows, symbol.num_cols), (10, 10));
    assert_eq!(symbol.corrected_errors, 0);
}

#[test]
fn decodes_a_reversed_polarity_symbol_on_the_second_take() {
    let spec = find_spec(10, 10).unwrap();
    let grid = symbol_grid(spec, &[b'X' + 1, PAD, PAD]);
    let image = render(&grid, 8, 24, true);

    let outcome = decoder().decode(&image);
    assert!(outcome.success(), "no symbol decoded");
    assert_eq!(outcome.takes, 2);
    assert_eq!(outcome.symbols[0].payload, b"X");
}

#[test]
fn decodes_a_rectangular_symbol() {
    let spec = find_spec(8, 18).unwrap();
    // "12" as a digit pair, then padding.
    let grid = symbol_grid(spec, &[142, PAD, PAD, PAD, PAD]);
    let image = render(&grid, 8, 24, false);

    let outcome = decoder().decode(&image);
    assert!(outcome.success(), "no symbol decoded");
    let symbol = &outcome.symbols[0];
    assert_eq!(symbol.payload, b"12");
    assert_eq!((symbol.num_rows, symbol.num_cols), (8, 18));
}

#[test]
fn repairs_a_damaged_module() {
    let spec = find_spec(10, 10).unwrap();
    let mut grid = symbol_grid(spec, &[b'A' + 1, b'B' + 1, PAD]);
    // Flip one interior data module: one bit error in one codeword.
    let flipped = !grid.get(5, 1);
    grid.set(5, 1, flipped);
    let image = render(&grid, 8, 24, false);

    let outcome = decoder().decode(&image);
    assert!(outcome.success(), "no symbol decoded");
    let symbol = &outcome.symbols[0];
    assert_eq!(symbol.payload, b"AB");
    assert_eq!(symbol.corrected_errors, 1);
}

#[test]
fn decodes_a_c40_symbol() {
    let spec = find_spec(12, 12).unwrap();
    // C40 latch, the pair packing (14, 22, 30) = "AIQ", unlatch, pad.
    let grid = symbol_grid(spec, &[230, 91, 15, 254, PAD]);
    let image = render(&grid, 8, 24, false);

    let outcome = decoder().decode(&image);
    assert!(outcome.success(), "no symbol decoded");
    let symbol = &outcome.symbols[0];
    assert_eq!(symbol.payload, b"AIQ");
    assert_eq!((symbol.num_rows, symbol.num_cols), (12, 12));
}

#[test]
fn decodes_a_macro_05_symbol() {
    let spec = find_spec(10, 10).unwrap();
    let grid = symbol_grid(spec, &[236, b'7' + 1, PAD]);
    let image = render(&grid, 8, 24, false);

    let outcome = decoder().decode(&image);
    assert!(outcome.success(), "no symbol decoded");
    let payload = &outcome.symbols[0].payload;
    assert!(payload.starts_with(b"[)>"));
    assert_eq!(payload[3], 30);
    assert_eq!(&payload[4..6], b"05");
    assert_eq!(payload[6], 29);
    assert_eq!(payload[7], b'7');
    assert_eq!(&payload[8..], &[30, 4]);
}

#[test]
fn decodes_a_base256_symbol() {
    let spec = find_spec(16, 16).unwrap();
    // Base256 latch, length 3, "ABC", pad out the 12 data words.
    let randomize = |v: u8, n: usize| {
        let pseudo = ((149 * n) % 255 + 1) as i32;
        ((v as i32 + pseudo) % 256) as u8
    };
    let mut data = vec![
        231,
        randomize(3, 2),
        randomize(b'A', 3),
        randomize(b'B', 4),
        randomize(b'C', 5),
        PAD,
    ];
    data.resize(spec.data_words, PAD);
    let grid = symbol_grid(spec, &data);
    let image = render(&grid, 8, 24, false);

    let outcome = decoder().decode(&image);
    assert!(outcome.success(), "no symbol decoded");
    assert_eq!(outcome.symbols[0].payload, b"ABC");
}

#[test]
fn decodes_two_symbols_in_one_frame() {
    let spec = find_spec(10, 10).unwrap();
    let first = render(&symbol_grid(spec, &[b'A' + 1, PAD, PAD]), 8, 24, false);
    let second = render(&symbol_grid(spec, &[b'B' + 1, PAD, PAD]), 8, 24, false);

    let mut frame = image::GrayImage::from_pixel(
        first.width() + second.width(),
        first.height(),
        image::Luma([220u8]),
    );
    image::imageops::replace(&mut frame, &first, 0, 0);
    image::imageops::replace(&mut frame, &second, first.width() as i64, 0);

    let outcome = decoder().decode(&frame);
    let mut payloads: Vec<Vec<u8>> = outcome.symbols.iter().map(|s| s.payload.clone()).collect();
    payloads.sort();
    assert_eq!(payloads, vec![b"A".to_vec(), b"B".to_vec()]);
}

#[test]
fn blank_frame_decodes_nothing() {
    let image = image::GrayImage::from_pixel(160, 160, image::Luma([220u8]));
    let outcome = decoder().decode(&image);
    assert!(!outcome.success());
    assert_eq!(outcome.takes, 4);
}
