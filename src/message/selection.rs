use nom::bytes::complete::tag;
use nom::character::complete::char;
use nom::sequence::{preceded, separated_pair};
use nom::IResult;

use super::{cipher_name, key_size, parse_all};
use crate::Error;

pub(super) const PREFIX: &str = "ChosenCipher:";

/// Sent in place of a choice when nothing in the proposal is supported.
pub(super) const REFUSAL: &str = "ChosenCipher:None:None";

/// The responder's choice of cipher and key size, as sent on the wire.
///
/// The name is not checked against any catalog here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenCipher {
    pub name: String,
    pub key_size: u16,
}

impl ChosenCipher {
    pub fn new(name: impl Into<String>, key_size: u16) -> Self {
        ChosenCipher {
            name: name.into(),
            key_size,
        }
    }

    pub fn parse(input: &str) -> Result<ChosenCipher, Error> {
        let (name, key_size) = parse_all("selection", input, selection)?;
        Ok(ChosenCipher::new(name, key_size))
    }

    pub fn serialize(&self, out: &mut String) {
        out.push_str(PREFIX);
        out.push_str(&self.name);
        out.push(':');
        out.push_str(&self.key_size.to_string());
    }
}

fn selection(input: &str) -> IResult<&str, (&str, u16)> {
    preceded(tag(PREFIX), separated_pair(cipher_name, char(':'), key_size))(input)
}
