//! Parsers for the textual keyword arguments carried by envelopes.

use crate::actuator::{Brightness, Rgb};

use super::errors::ArgumentError;

const HEX_PREFIX: &str = "0x";

/// Parses `0xRRGGBB` (hex channels) or `R-G-B` (decimal channels).
pub(crate) fn parse_color(input: &str) -> Result<Rgb, ArgumentError> {
    let channels = if let Some(hex) = input.strip_prefix(HEX_PREFIX) {
        parse_hex_channels(hex)
    } else if input.contains('-') {
        parse_decimal_channels(input)
    } else {
        None
    };
    channels
        .map(|[red, green, blue]| Rgb::new(red, green, blue))
        .ok_or_else(|| ArgumentError::color(input))
}

fn parse_hex_channels(digits: &str) -> Option<[u8; 3]> {
    if digits.len() != 6 || !digits.chars().all(|digit| digit.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

fn parse_decimal_channels(input: &str) -> Option<[u8; 3]> {
    let mut parts = input.split('-').map(|part| part.trim().parse::<u8>().ok());
    let channels = [parts.next()??, parts.next()??, parts.next()??];
    parts.next().is_none().then_some(channels)
}

/// Parses a decimal brightness fraction, clamping it into `[0, 1]`.
pub(crate) fn parse_brightness(input: &str) -> Result<Brightness, ArgumentError> {
    input
        .trim()
        .parse::<f32>()
        .ok()
        .and_then(Brightness::clamped)
        .ok_or_else(|| ArgumentError::brightness(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0xE09D37", Rgb::new(224, 157, 55))]
    #[case("0xe09d37", Rgb::new(224, 157, 55))]
    #[case("0x000000", Rgb::OFF)]
    #[case("224-157-55", Rgb::new(224, 157, 55))]
    #[case("0-0-255", Rgb::new(0, 0, 255))]
    #[case(" 1 - 2 - 3", Rgb::new(1, 2, 3))]
    fn parses_supported_colour_forms(#[case] input: &str, #[case] expected: Rgb) {
        assert_eq!(parse_color(input), Ok(expected));
    }

    #[rstest]
    #[case::named("purple")]
    #[case::bare_hex("E09D37")]
    #[case::short_hex("0xFFF")]
    #[case::long_hex("0xE09D3700")]
    #[case::non_hex_digits("0xGG0000")]
    #[case::two_channels("1-2")]
    #[case::four_channels("1-2-3-4")]
    #[case::channel_overflow("256-0-0")]
    #[case::negative_channel("1--2-3")]
    #[case::empty("")]
    fn rejects_other_colour_forms(#[case] input: &str) {
        assert_eq!(parse_color(input), Err(ArgumentError::color(input)));
    }

    #[rstest]
    #[case("0.6", 0.6)]
    #[case("1", 1.0)]
    #[case("0", 0.0)]
    #[case("1.5", 1.0)]
    #[case("-0.5", 0.0)]
    fn parses_brightness_fractions(#[case] input: &str, #[case] expected: f32) {
        let brightness = parse_brightness(input).expect("valid brightness");
        assert!((brightness.value() - expected).abs() < f32::EPSILON);
    }

    #[rstest]
    #[case("bright")]
    #[case("NaN")]
    #[case("inf")]
    #[case("")]
    fn rejects_invalid_brightness(#[case] input: &str) {
        assert_eq!(
            parse_brightness(input),
            Err(ArgumentError::brightness(input))
        );
    }
}
