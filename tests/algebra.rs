//! Exhaustive properties of the four-valued algebra and the bus policies.

use quadsim::{
    format_bits, format_hex, invert, parse_bits, parse_hex, resolve_drivers, DomainError,
    DriverResolution, LogicValue, Resolution,
};
use LogicValue::*;

// ============================================================================
// Driver resolution
// ============================================================================

#[test]
fn test_resolution_is_order_independent_over_all_triples() {
    for a in LogicValue::ALL {
        for b in LogicValue::ALL {
            for c in LogicValue::ALL {
                let expected = resolve_drivers(&[a, b, c]);
                for perm in [[a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]] {
                    assert_eq!(resolve_drivers(&perm), expected, "{a}{b}{c}");
                }
                // folding pairwise gives the same answer
                let folded = resolve_drivers(&[resolve_drivers(&[a, b]), c]);
                assert_eq!(folded, expected, "{a}{b}{c}");
            }
        }
    }
}

#[test]
fn test_highz_is_neutral() {
    for v in LogicValue::ALL {
        assert_eq!(resolve_drivers(&[v, HighZ]), v);
        assert_eq!(resolve_drivers(&[HighZ, v, HighZ]), v);
    }
}

#[test]
fn test_unknown_absorbs_driven_values() {
    for v in LogicValue::ALL {
        assert_eq!(resolve_drivers(&[Unknown, v]), Unknown);
    }
}

#[test]
fn test_wired_policies_over_all_pairs() {
    for a in LogicValue::ALL {
        for b in LogicValue::ALL {
            let drivers = [a, b];
            let or = Resolution::WiredOr.resolve(&drivers);
            let and = Resolution::WiredAnd.resolve(&drivers);

            if drivers.contains(&High) {
                assert_eq!(or, High);
            } else {
                assert_eq!(or, resolve_drivers(&drivers));
            }
            if drivers.contains(&Low) {
                assert_eq!(and, Low);
            } else {
                assert_eq!(and, resolve_drivers(&drivers));
            }
            assert_eq!(Resolution::Standard.resolve(&drivers), resolve_drivers(&drivers));
        }
    }
}

// ============================================================================
// Inversion
// ============================================================================

#[test]
fn test_invert_properties() {
    for v in LogicValue::ALL {
        assert_eq!(invert(invert(v)), v);
        assert_eq!(invert(v).is_defined(), v.is_defined());
        if let Some(b) = v.as_bool() {
            assert_eq!(invert(v), LogicValue::from_bool(!b));
        }
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_hex_and_bits_agree() {
    let cases = [
        ("a5", "10100101"),
        ("0f", "00001111"),
        ("z1", "zzzz0001"),
        ("x", "xxxx"),
    ];
    for (hex, bits) in cases {
        assert_eq!(parse_hex(hex).unwrap(), parse_bits(bits).unwrap(), "{hex}");
        assert_eq!(format_bits(&parse_hex(hex).unwrap()), bits);
    }
}

#[test]
fn test_format_hex_pads_and_marks_undefined() {
    assert_eq!(format_hex(&parse_bits("101").unwrap()), "5");
    assert_eq!(format_hex(&parse_bits("1_0000_0001").unwrap()), "101");
    assert_eq!(format_hex(&parse_bits("zzzz1111").unwrap()), "zf");
    assert_eq!(format_hex(&parse_bits("zz11").unwrap()), "x");
    assert_eq!(format_hex(&parse_bits("1x00").unwrap()), "x");
    // padding turns a short all-floating nibble into a mixed one
    assert_eq!(format_hex(&[HighZ, HighZ]), "x");
}

#[test]
fn test_literal_errors() {
    assert_eq!(parse_bits(""), Err(DomainError::Empty));
    assert_eq!(parse_bits("__"), Err(DomainError::Empty));
    assert_eq!(
        parse_bits("10q1"),
        Err(DomainError::InvalidCharacter { ch: 'q', position: 2 })
    );
    assert_eq!(
        parse_hex("1g"),
        Err(DomainError::InvalidCharacter { ch: 'g', position: 1 })
    );
    assert!("10".parse::<LogicValue>().is_err());
    assert_eq!("X".parse::<LogicValue>(), Ok(Unknown));
}
