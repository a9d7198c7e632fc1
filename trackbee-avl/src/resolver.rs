//! Parameter resolution.
//!
//! IO elements carry a numeric parameter id and a raw value whose width is
//! determined by the group it was read from. Mapping an id to a named,
//! typed attribute is the job of the device-parameter registry, which lives
//! outside this crate; the decoder only depends on the [`ParameterResolver`]
//! trait. How unknown ids are handled is the resolver's policy, not the
//! decoder's.

use trackbee_types::AttributeValue;

/// A resolved IO element, ready to be stored on a record.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedParameter {
    pub name: String,
    pub value: AttributeValue,
}

/// Maps one raw IO element to an attribute.
///
/// Returning `None` drops the element; the decoder logs it and carries on
/// with the rest of the record.
pub trait ParameterResolver {
    fn resolve(&self, id: u32, raw: &[u8]) -> Option<ResolvedParameter>;
}

/// Fallback resolver that keeps every parameter, named `teltonika_<id>`,
/// decoded purely by value width: 1, 2 and 4 byte values are read as
/// big-endian unsigned integers, 8 byte values as a signed integer, and
/// anything else is kept as a hex dump.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawValueResolver;

impl ParameterResolver for RawValueResolver {
    fn resolve(&self, id: u32, raw: &[u8]) -> Option<ResolvedParameter> {
        let value = match raw {
            [a] => AttributeValue::Integer(i64::from(*a)),
            [a, b] => AttributeValue::Integer(i64::from(u16::from_be_bytes([*a, *b]))),
            [a, b, c, d] => {
                AttributeValue::Integer(i64::from(u32::from_be_bytes([*a, *b, *c, *d])))
            }
            [a, b, c, d, e, f, g, h] => {
                AttributeValue::Integer(i64::from_be_bytes([*a, *b, *c, *d, *e, *f, *g, *h]))
            }
            _ => AttributeValue::Text(hex::encode(raw)),
        };

        Some(ResolvedParameter {
            name: format!("teltonika_{id}"),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ParameterResolver,
        RawValueResolver,
    };
    use trackbee_types::AttributeValue;

    #[test]
    fn width_policy() {
        let resolver = RawValueResolver;

        let one = resolver.resolve(239, &[0x01]).unwrap();
        assert_eq!(one.name, "teltonika_239");
        assert_eq!(one.value, AttributeValue::Integer(1));

        let two = resolver.resolve(66, &[0x2E, 0xE0]).unwrap();
        assert_eq!(two.value, AttributeValue::Integer(12_000));

        let four = resolver.resolve(16, &[0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(four.value, AttributeValue::Integer(4_294_967_295));

        let eight = resolver
            .resolve(78, &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE])
            .unwrap();
        assert_eq!(eight.value, AttributeValue::Integer(-2));

        let odd = resolver.resolve(281, &[0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(odd.value, AttributeValue::Text("abcdef".into()));
    }
}
