//! DNS message parsing and construction.
//!
//! Only what the iterative walk needs: query building for A/NS lookups
//! and response parsing for the answer, authority, and additional
//! sections (RFC 1035 section 4.1 layout). Compression pointers are
//! followed when decoding names; the encoder never emits them.

use std::net::Ipv4Addr;

use rand::Rng;

use crate::error::{Error, Result};

const HEADER_LEN: usize = 12;

/// Limit on compression-pointer jumps while decoding one name.
/// A legitimate name needs only a handful; more means a pointer cycle.
const MAX_JUMPS: usize = 5;

pub const TYPE_A: u16 = 1;
pub const TYPE_NS: u16 = 2;
pub const TYPE_CNAME: u16 = 5;
pub const CLASS_IN: u16 = 1;

/// Record type a walk step asks for: `NS` while descending, `A` at the
/// final hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    A,
    Ns,
}

impl RecordKind {
    pub fn code(self) -> u16 {
        match self {
            RecordKind::A => TYPE_A,
            RecordKind::Ns => TYPE_NS,
        }
    }
}

/// Build a single-question query with a random transaction id.
///
/// All header flags are zero, in particular recursion-desired: the walk
/// does its own iteration and never asks a server to recurse for it.
pub fn build_query(domain: &str, kind: RecordKind) -> (Vec<u8>, u16) {
    let id: u16 = rand::rng().random();

    let mut data = Vec::with_capacity(HEADER_LEN + domain.len() + 6);
    data.extend_from_slice(&id.to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00]); // flags: standard query, rd clear
    data.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    data.extend_from_slice(&[0x00, 0x00]); // ANCOUNT
    data.extend_from_slice(&[0x00, 0x00]); // NSCOUNT
    data.extend_from_slice(&[0x00, 0x00]); // ARCOUNT

    encode_name(&mut data, domain);
    data.extend_from_slice(&kind.code().to_be_bytes());
    data.extend_from_slice(&CLASS_IN.to_be_bytes());

    (data, id)
}

fn encode_name(buf: &mut Vec<u8>, domain: &str) {
    for label in domain.split('.') {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
}

/// Decoded rdata, typed for the record kinds the walk acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// A record: an IPv4 address.
    Addr(Ipv4Addr),
    /// NS or CNAME record: a domain name.
    Name(String),
    /// Anything else, kept raw and ignored by the walk.
    Other(Vec<u8>),
}

/// A parsed resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub rtype: u16,
    pub ttl: u32,
    pub data: RecordData,
}

/// The question section entry, needed when encoding a response.
#[derive(Debug, Clone)]
pub struct Question {
    pub name: String,
    pub qtype: u16,
}

/// A parsed DNS response.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub id: u16,
    pub rcode: u8,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
}

impl Response {
    /// Parse a response from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::Malformed("truncated header"));
        }

        let id = be16(data, 0);
        let flags = be16(data, 2);
        let rcode = (flags & 0x000F) as u8;
        let qdcount = be16(data, 4) as usize;
        let ancount = be16(data, 6) as usize;
        let nscount = be16(data, 8) as usize;
        let arcount = be16(data, 10) as usize;

        let mut pos = HEADER_LEN;

        // Question section: name + QTYPE + QCLASS, contents not needed.
        for _ in 0..qdcount {
            let (_, next) = read_name(data, pos)?;
            pos = next + 4;
            if pos > data.len() {
                return Err(Error::Malformed("truncated question"));
            }
        }

        let answers = read_records(data, &mut pos, ancount)?;
        let authorities = read_records(data, &mut pos, nscount)?;
        let additionals = read_records(data, &mut pos, arcount)?;

        Ok(Self {
            id,
            rcode,
            answers,
            authorities,
            additionals,
        })
    }

    /// Encode the response to wire format.
    ///
    /// Names are written in full; no compression pointers. Used by the
    /// scripted test server and small enough to keep next to the parser.
    pub fn to_bytes(&self, question: &Question) -> Vec<u8> {
        let mut data = Vec::with_capacity(512);

        data.extend_from_slice(&self.id.to_be_bytes());
        let flags = 0x8000u16 | self.rcode as u16; // QR set, rcode in low bits
        data.extend_from_slice(&flags.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&(self.answers.len() as u16).to_be_bytes());
        data.extend_from_slice(&(self.authorities.len() as u16).to_be_bytes());
        data.extend_from_slice(&(self.additionals.len() as u16).to_be_bytes());

        encode_name(&mut data, &question.name);
        data.extend_from_slice(&question.qtype.to_be_bytes());
        data.extend_from_slice(&CLASS_IN.to_be_bytes());

        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            encode_name(&mut data, &record.name);
            data.extend_from_slice(&record.rtype.to_be_bytes());
            data.extend_from_slice(&CLASS_IN.to_be_bytes());
            data.extend_from_slice(&record.ttl.to_be_bytes());

            let rdata = match &record.data {
                RecordData::Addr(addr) => addr.octets().to_vec(),
                RecordData::Name(name) => {
                    let mut buf = Vec::with_capacity(name.len() + 2);
                    encode_name(&mut buf, name);
                    buf
                }
                RecordData::Other(raw) => raw.clone(),
            };
            data.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
            data.extend_from_slice(&rdata);
        }

        data
    }
}

fn be16(data: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([data[pos], data[pos + 1]])
}

/// Read a possibly-compressed name starting at `start`.
///
/// Returns the dotted name and the position just past the name in the
/// original stream (past the first pointer when compression was used).
fn read_name(data: &[u8], start: usize) -> Result<(String, usize)> {
    let mut parts: Vec<&str> = Vec::new();
    let mut pos = start;
    let mut jumps = 0;
    let mut resume = None;

    loop {
        let len = *data
            .get(pos)
            .ok_or(Error::Malformed("name runs past end of message"))?;

        if len & 0xC0 == 0xC0 {
            let low = *data
                .get(pos + 1)
                .ok_or(Error::Malformed("truncated compression pointer"))?;
            if resume.is_none() {
                resume = Some(pos + 2);
            }
            jumps += 1;
            if jumps > MAX_JUMPS {
                return Err(Error::Malformed("compression pointer cycle"));
            }
            pos = (((len & 0x3F) as usize) << 8) | low as usize;
        } else if len == 0 {
            pos += 1;
            break;
        } else {
            let label = data
                .get(pos + 1..pos + 1 + len as usize)
                .ok_or(Error::Malformed("label runs past end of message"))?;
            parts.push(
                std::str::from_utf8(label).map_err(|_| Error::Malformed("label is not utf-8"))?,
            );
            pos += 1 + len as usize;
        }
    }

    Ok((parts.join("."), resume.unwrap_or(pos)))
}

fn read_records(data: &[u8], pos: &mut usize, count: usize) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(count);

    for _ in 0..count {
        let (name, next) = read_name(data, *pos)?;
        if next + 10 > data.len() {
            return Err(Error::Malformed("truncated record header"));
        }

        let rtype = be16(data, next);
        let ttl = u32::from_be_bytes([
            data[next + 4],
            data[next + 5],
            data[next + 6],
            data[next + 7],
        ]);
        let rdlength = be16(data, next + 8) as usize;
        let rdata_start = next + 10;
        let rdata = data
            .get(rdata_start..rdata_start + rdlength)
            .ok_or(Error::Malformed("truncated rdata"))?;

        let record_data = match rtype {
            TYPE_A if rdlength == 4 => {
                RecordData::Addr(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]))
            }
            TYPE_NS | TYPE_CNAME => {
                let (target, _) = read_name(data, rdata_start)?;
                RecordData::Name(target)
            }
            _ => RecordData::Other(rdata.to_vec()),
        };

        records.push(Record {
            name,
            rtype,
            ttl,
            data: record_data,
        });
        *pos = rdata_start + rdlength;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_query_clears_recursion_desired() {
        let (bytes, id) = build_query("example.com", RecordKind::Ns);

        assert_eq!(be16(&bytes, 0), id);
        assert_eq!(be16(&bytes, 2), 0, "all flags must be zero");
        assert_eq!(be16(&bytes, 4), 1, "one question");
        // 7"example" 3"com" 0, then QTYPE=NS QCLASS=IN
        let qname_end = HEADER_LEN + 1 + 7 + 1 + 3 + 1;
        assert_eq!(be16(&bytes, qname_end), TYPE_NS);
        assert_eq!(be16(&bytes, qname_end + 2), CLASS_IN);
    }

    #[test]
    fn parse_follows_compression_pointers() {
        // Header: id=0x1234, response flags, 1 question, 1 answer.
        let mut data = vec![
            0x12, 0x34, 0x80, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        // Question: example.com A IN (name at offset 12).
        data.extend_from_slice(&[7]);
        data.extend_from_slice(b"example");
        data.extend_from_slice(&[3]);
        data.extend_from_slice(b"com");
        data.extend_from_slice(&[0, 0x00, 0x01, 0x00, 0x01]);
        // Answer: pointer to offset 12, A IN ttl=300 rdata=93.184.216.34.
        data.extend_from_slice(&[0xC0, 0x0C]);
        data.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        data.extend_from_slice(&300u32.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x04, 93, 184, 216, 34]);

        let response = Response::parse(&data).unwrap();
        assert_eq!(response.id, 0x1234);
        assert_eq!(response.rcode, 0);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].name, "example.com");
        assert_eq!(
            response.answers[0].data,
            RecordData::Addr(Ipv4Addr::new(93, 184, 216, 34))
        );
    }

    #[test]
    fn encoded_referral_parses_back() {
        let response = Response {
            id: 77,
            rcode: 0,
            answers: vec![],
            authorities: vec![Record {
                name: "com".into(),
                rtype: TYPE_NS,
                ttl: 3600,
                data: RecordData::Name("a.gtld-servers.net".into()),
            }],
            additionals: vec![Record {
                name: "a.gtld-servers.net".into(),
                rtype: TYPE_A,
                ttl: 3600,
                data: RecordData::Addr(Ipv4Addr::new(192, 5, 6, 30)),
            }],
        };

        let bytes = response.to_bytes(&Question {
            name: "com".into(),
            qtype: TYPE_NS,
        });
        let parsed = Response::parse(&bytes).unwrap();

        assert_eq!(parsed.id, 77);
        assert_eq!(parsed.authorities, response.authorities);
        assert_eq!(parsed.additionals, response.additionals);
    }

    #[test]
    fn pointer_cycle_is_rejected() {
        // Question name is a pointer to itself.
        let mut data = vec![
            0x00, 0x01, 0x80, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        data.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);

        assert!(matches!(
            Response::parse(&data),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert!(Response::parse(&[0x12, 0x34, 0x80]).is_err());
    }
}
