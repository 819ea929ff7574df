//! Message fixtures shared by the integration tests.
//!
//! `message` is a minimal tokenizer for test input only: one segment per
//! line, `|` between fields, default encoding characters, no escapes.

#![allow(dead_code)]

use hl7_query::{Field, FieldComponent, FieldSubcomponent, RepeatingField, Segment, Structure};

/// Builds a structure from pipe-delimited segment lines.
pub fn message(text: &str) -> Structure {
    let segments = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(segment)
        .collect();
    Structure::from_segments(segments)
}

fn segment(line: &str) -> Segment {
    let mut parts = line.split('|');
    let name = parts.next().unwrap_or_default();
    let mut segment = Segment::new(name).unwrap();

    if name == "MSH" {
        // MSH-1 is the field separator itself and MSH-2 holds the
        // encoding characters verbatim
        segment.push_field(Field::base("|"));
        segment.push_field(Field::base(parts.next().unwrap_or_default()));
    }
    for text in parts {
        segment.push_field(repeating(text));
    }
    segment
}

fn repeating(text: &str) -> RepeatingField {
    if text.is_empty() {
        return RepeatingField::single(Field::base(""));
    }
    RepeatingField::from_fields(text.split('~').map(field).collect())
}

fn field(text: &str) -> Field {
    if !text.contains('^') && !text.contains('&') {
        return Field::base(text);
    }
    Field::composite(text.split('^').map(component).collect())
}

fn component(text: &str) -> FieldComponent {
    if !text.contains('&') {
        return FieldComponent::base(text);
    }
    FieldComponent::composite(text.split('&').map(FieldSubcomponent::new).collect())
}

/// An admission with one patient, a visit and two next-of-kin.
pub fn adt() -> Structure {
    message(
        r"
        MSH|^~\&|ADT1|GOOD HEALTH HOSPITAL|GHH LAB|GHH|20070719120000||ADT^A01^ADT_A01|MSG00001|P|2.5
        EVN|A01|20070719120000
        PID|1||12345^DOE^JOHN||SMITH||19610615|M|||2222 HOME STREET^^GREENSBORO^NC^27401-1020||555-1234~555-9876
        PV1|1|I|2000^2012^01||||004777^ATTEND^AARON^A|||SUR
        NK1|1|DOE^JANE|SPO
        NK1|2|DOE^JIM|SON
        ",
    )
}

/// A lab result for two patients, with repeated and nested observations.
pub fn oru() -> Structure {
    message(
        r"
        MSH|^~\&|LAB|GHH|EHR|GHH|20070720083000||ORU^R01|MSG00002|P|2.5
        PID|1||12345^DOE^JOHN||SMITH
        OBR|1|845439^GHH OE|1045813^GHH LAB|15545^GLUCOSE
        OBX|1|NM|15074-8^Glucose^LN||182|mg/dl&milligrams per deciliter&UCUM|70_105|H
        OBX|2|NM|2345-7^Glucose^LN||7.2~7.4|mmol/L
        OBX|3|ST|8867-4^Heart rate^LN||72
        PID|2||67890^ROE^RICHARD||JONES
        ",
    )
}
