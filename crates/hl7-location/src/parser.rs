//! Location descriptor parser implementation using nom.
//!
//! Grammar:
//!
//! ```text
//! descriptor := SEGMENT [ "[" segIndex "]" ] [ "-" field [ "(" repIndex ")" ] [ "." component [ "." subcomponent ] ] ]
//! SEGMENT    := 3+ letters/digits, matched case-insensitively
//! ```
//!
//! Segment and repetition indices are 0-based; component and subcomponent
//! positions are 1-based in text and stored 0-based; the field position is
//! stored as written.

use std::str::FromStr;

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::{all_consuming, opt},
    sequence::{delimited, preceded},
    IResult,
};

use crate::error::{LocationError, LocationResult};
use crate::key::LocationKey;

/// Minimum length of a segment name.
const MIN_SEGMENT_NAME_LEN: usize = 3;

/// Parse a location descriptor string.
///
/// # Arguments
/// * `input` - The descriptor text, e.g. `"PID-3.1"`
///
/// # Returns
/// The query key the descriptor denotes, or an error. Parsing is
/// all-or-nothing.
///
/// # Examples
///
/// ```rust
/// use hl7_location::parse;
///
/// // Field 3 of any PID
/// let key = parse("PID-3").unwrap();
/// assert_eq!(key.field(), Some(3));
/// assert_eq!(key.repetition(), None);
///
/// // Second PID occurrence
/// let key = parse("PID[1]-3").unwrap();
/// assert_eq!(key.segment_index(), Some(1));
///
/// // Third repetition of OBX-5, first component
/// let key = parse("OBX-5(2).1").unwrap();
/// assert_eq!(key.repetition(), Some(2));
/// assert_eq!(key.component(), Some(0));
///
/// assert!(parse("PID-x").is_err());
/// ```
pub fn parse(input: &str) -> LocationResult<LocationKey> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LocationError::EmptyDescriptor);
    }

    match all_consuming(descriptor)(input) {
        Ok((_, raw)) => raw.into_key(),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = input.len() - e.input.len();
            if position == 0 {
                return Err(LocationError::InvalidSegmentName(String::new()));
            }
            Err(LocationError::Malformed {
                position,
                message: format!("unexpected input at: '{}'", truncate(e.input, 20)),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(LocationError::Malformed {
            position: input.len(),
            message: "descriptor ended early".to_string(),
        }),
    }
}

impl FromStr for LocationKey {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

// ============================================================================
// Raw descriptor (digits kept as text until validated)
// ============================================================================

struct RawDescriptor<'a> {
    segment: &'a str,
    segment_index: Option<&'a str>,
    field: Option<RawField<'a>>,
}

struct RawField<'a> {
    position: &'a str,
    repetition: Option<&'a str>,
    component: Option<&'a str>,
    subcomponent: Option<&'a str>,
}

impl RawDescriptor<'_> {
    fn into_key(self) -> LocationResult<LocationKey> {
        if self.segment.len() < MIN_SEGMENT_NAME_LEN {
            return Err(LocationError::InvalidSegmentName(self.segment.to_string()));
        }

        let mut key = LocationKey::new(self.segment);
        if let Some(digits) = self.segment_index {
            key = key.with_segment_index(index(digits)?);
        }

        let Some(field) = self.field else {
            return Ok(key);
        };
        key = key.with_field(index(field.position)?);
        if let Some(digits) = field.repetition {
            key = key.with_repetition(index(digits)?);
        }
        if let Some(digits) = field.component {
            key = key.with_component(one_based(digits)?);
        }
        if let Some(digits) = field.subcomponent {
            key = key.with_subcomponent(one_based(digits)?);
        }
        Ok(key)
    }
}

fn index(digits: &str) -> LocationResult<usize> {
    digits
        .parse::<usize>()
        .map_err(|_| LocationError::IndexOverflow(digits.to_string()))
}

// Position 0 wraps to an index no node has
fn one_based(digits: &str) -> LocationResult<usize> {
    Ok(index(digits)?.wrapping_sub(1))
}

// ============================================================================
// Grammar
// ============================================================================

fn descriptor(input: &str) -> IResult<&str, RawDescriptor<'_>> {
    let (input, segment) = segment_name(input)?;
    let (input, segment_index) = opt(bracketed_index)(input)?;
    let (input, field) = opt(preceded(char('-'), field_suffix))(input)?;

    Ok((
        input,
        RawDescriptor {
            segment,
            segment_index,
            field,
        },
    ))
}

fn segment_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric())(input)
}

fn bracketed_index(input: &str) -> IResult<&str, &str> {
    delimited(char('['), digit1, char(']'))(input)
}

fn field_suffix(input: &str) -> IResult<&str, RawField<'_>> {
    let (input, position) = digit1(input)?;
    let (input, repetition) = opt(delimited(char('('), digit1, char(')')))(input)?;
    let (input, component) = opt(preceded(char('.'), digit1))(input)?;

    // A subcomponent is only meaningful after a component
    let (input, subcomponent) = match component {
        Some(_) => opt(preceded(char('.'), digit1))(input)?,
        None => (input, None),
    };

    Ok((
        input,
        RawField {
            position,
            repetition,
            component,
            subcomponent,
        },
    ))
}
