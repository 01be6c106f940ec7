use nom::bytes::complete::tag;
use nom::character::complete::{char, space0};
use nom::multi::separated_list1;
use nom::sequence::{delimited, preceded, separated_pair};
use nom::IResult;

use super::{cipher_name, key_size, parse_all};
use crate::catalog::CipherCatalog;
use crate::Error;

pub(super) const PREFIX: &str = "ProposedCiphers:";

/// Ciphers and key sizes offered by the initiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    entries: Vec<ProposedCipher>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedCipher {
    name: String,
    key_sizes: Vec<u16>,
}

impl ProposedCipher {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_sizes(&self) -> &[u16] {
        &self.key_sizes
    }
}

impl Proposal {
    /// Build a proposal from `(name, key sizes)` pairs.
    ///
    /// Names may be ciphers this crate does not know; they are carried as-is.
    /// Duplicate names are rejected.
    pub fn new<I, N, S>(entries: I) -> Result<Proposal, Error>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: IntoIterator<Item = u16>,
    {
        let mut out: Vec<ProposedCipher> = Vec::new();

        for (name, sizes) in entries {
            let name = name.into();
            if out.iter().any(|p| p.name == name) {
                return Err(Error::Parse(format!("Cipher proposed twice: {}", name)));
            }

            let mut key_sizes: Vec<u16> = sizes.into_iter().collect();
            if key_sizes.is_empty() || key_sizes.contains(&0) {
                return Err(Error::Parse(format!("Invalid key sizes for {}", name)));
            }
            key_sizes.sort_unstable();
            key_sizes.dedup();

            out.push(ProposedCipher { name, key_sizes });
        }

        if out.is_empty() {
            return Err(Error::Parse("Empty proposal".to_string()));
        }

        Ok(Proposal { entries: out })
    }

    /// Offer everything in `catalog`.
    pub fn from_catalog(catalog: &CipherCatalog) -> Proposal {
        Proposal {
            entries: catalog
                .iter()
                .map(|e| ProposedCipher {
                    name: e.cipher().name().to_string(),
                    key_sizes: e.key_sizes().to_vec(),
                })
                .collect(),
        }
    }

    pub fn key_sizes(&self, name: &str) -> Option<&[u16]> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.key_sizes())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProposedCipher> {
        self.entries.iter()
    }

    pub fn parse(input: &str) -> Result<Proposal, Error> {
        let records = parse_all("proposal", input, proposal)?;
        Proposal::new(records)
    }

    pub fn serialize(&self, out: &mut String) {
        out.push_str(PREFIX);
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&entry.name);
            out.push_str(":[");
            for (j, size) in entry.key_sizes.iter().enumerate() {
                if j > 0 {
                    out.push(',');
                }
                out.push_str(&size.to_string());
            }
            out.push(']');
        }
    }
}

fn proposal(input: &str) -> IResult<&str, Vec<(&str, Vec<u16>)>> {
    preceded(tag(PREFIX), separated_list1(char(','), record))(input)
}

fn record(input: &str) -> IResult<&str, (&str, Vec<u16>)> {
    separated_pair(cipher_name, char(':'), key_size_list)(input)
}

/// `[128,192,256]`, also accepting `[128, 192, 256]`.
fn key_size_list(input: &str) -> IResult<&str, Vec<u16>> {
    delimited(
        char('['),
        separated_list1(char(','), preceded(space0, key_size)),
        preceded(space0, char(']')),
    )(input)
}
