//! Handshake messages and their text wire format.
//!
//! ```text
//! ProposedCiphers:<name>:[<size>,<size>,...],<name>:[<size>,...]
//! ChosenCipher:<name>:<size>
//! ChosenCipher:None:None
//! DHMKE:<decimal integer>
//! ```

mod proposal;
mod public_value;
mod selection;

pub use proposal::{Proposal, ProposedCipher};
pub use public_value::PublicValue;
pub use selection::ChosenCipher;

use nom::bytes::complete::take_while1;
use nom::character::complete::digit1;
use nom::combinator::{all_consuming, map_res, verify};
use nom::{Finish, IResult};

use crate::Error;

/// A handshake message, classified by its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Proposal(Proposal),
    ChosenCipher(ChosenCipher),
    /// The responder found no cipher suite in common.
    Refusal,
    PublicValue(PublicValue),
}

impl Message {
    pub fn parse(input: &str) -> Result<Message, Error> {
        if input == selection::REFUSAL {
            Ok(Message::Refusal)
        } else if input.starts_with(proposal::PREFIX) {
            Proposal::parse(input).map(Message::Proposal)
        } else if input.starts_with(selection::PREFIX) {
            ChosenCipher::parse(input).map(Message::ChosenCipher)
        } else if input.starts_with(public_value::PREFIX) {
            PublicValue::parse(input).map(Message::PublicValue)
        } else {
            Err(Error::Parse(format!(
                "Unknown message: {:?}",
                excerpt(input)
            )))
        }
    }

    pub fn serialize(&self, out: &mut String) {
        match self {
            Message::Proposal(m) => m.serialize(out),
            Message::ChosenCipher(m) => m.serialize(out),
            Message::Refusal => out.push_str(selection::REFUSAL),
            Message::PublicValue(m) => m.serialize(out),
        }
    }

    /// Name of the message type, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Proposal(_) => "Proposal",
            Message::ChosenCipher(_) => "ChosenCipher",
            Message::Refusal => "Refusal",
            Message::PublicValue(_) => "PublicValue",
        }
    }
}

/// One or more characters that are not wire punctuation.
fn cipher_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !matches!(c, ':' | ',' | '[' | ']'))(input)
}

/// A positive decimal key size in bits.
fn key_size(input: &str) -> IResult<&str, u16> {
    verify(map_res(digit1, |s: &str| s.parse::<u16>()), |v| *v > 0)(input)
}

/// Run `parser` over the whole of `input`, mapping failures to `Error::Parse`.
fn parse_all<'a, O, F>(what: &str, input: &'a str, parser: F) -> Result<O, Error>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    match all_consuming(parser)(input).finish() {
        Ok((_, output)) => Ok(output),
        Err(e) => Err(Error::Parse(format!(
            "Invalid {} near {:?} ({:?})",
            what,
            excerpt(e.input),
            e.code
        ))),
    }
}

fn excerpt(s: &str) -> &str {
    match s.char_indices().nth(32) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
