use nom::bytes::complete::tag;
use nom::character::complete::digit1;
use nom::combinator::map_opt;
use nom::sequence::preceded;
use nom::IResult;
use num_bigint::BigUint;

use super::parse_all;
use crate::Error;

pub(super) const PREFIX: &str = "DHMKE:";

/// A key-exchange public value, sent in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicValue(pub BigUint);

impl PublicValue {
    pub fn parse(input: &str) -> Result<PublicValue, Error> {
        parse_all("public value", input, public_value).map(PublicValue)
    }

    pub fn serialize(&self, out: &mut String) {
        out.push_str(PREFIX);
        out.push_str(&self.0.to_str_radix(10));
    }
}

fn public_value(input: &str) -> IResult<&str, BigUint> {
    preceded(
        tag(PREFIX),
        map_opt(digit1, |s: &str| BigUint::parse_bytes(s.as_bytes(), 10)),
    )(input)
}
