//! Building the probe's query packets and synthesizing the reflector's
//! responses.
//!
//! A response is either **answered** — the original question echoed back
//! with one canned `A` record appended — or **refused**, which is the
//! request bytes unchanged apart from a rewritten flags field. Nothing in
//! the question body is ever decoded; the reflector's checks stop at the
//! header, the question bounds, and the query type.

use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use log::*;

use crate::wire::{Header, WireError, FLAGS_QUERY};


/// The length in bytes of a client identifier carried in query packets.
pub const CLIENT_ID_LENGTH: usize = 16;

/// The type number of an `A` record query.
pub const QTYPE_A: u16 = 1;

/// The class number of the Internet.
pub const QCLASS_IN: u16 = 1;

/// The OPT pseudo-record written after the question when a client id is
/// configured. The record advertises a 4096-byte payload, sets the DO bit,
/// and carries one 16-byte option with a private-use code; the id bytes
/// follow this template directly.
pub const OPT_TEMPLATE: [u8; 15] = [
    0x00,                    // name (root)
    0x00, 0x29,              // type OPT
    0x10, 0x00,              // advertised UDP payload size
    0x00,                    // extended RCODE
    0x00,                    // EDNS version
    0x80, 0x00,              // flags (DO bit)
    0x00, 0x14,              // RDATA length (20)
    0xff, 0xee,              // option code
    0x00, 0x10,              // option length (16)
];

/// The canned record appended to every accepted query.
pub const ANSWER_RECORD: [u8; 16] = [
    0xc0, 0x0c,              // name (pointer to the question)
    0x00, 0x01,              // type A
    0x00, 0x01,              // class IN
    0x00, 0x00, 0x0e, 0x10,  // TTL (3600)
    0x00, 0x04,              // data length 4
    0x01, 0x02, 0x03, 0x04,  // IP address 1.2.3.4
];

/// Flag bits a query may carry and still be answered: recursion desired
/// and nothing else.
const FLAGS_ALLOWED: u16 = FLAGS_QUERY;

/// Flag bits carried over from the query into the response: the opcode,
/// RD, Z, AD, and CD bits.
const FLAGS_PRESERVED: u16 = 0x7970;

/// Response bits of a refusal: QR plus RCODE 5 (REFUSED).
const FLAGS_REFUSED: u16 = 0x8005;

/// Response bits of an answer: QR plus AA.
const FLAGS_ANSWERED: u16 = 0x8400;


/// Serializes one probe query: the header, the pre-encoded name, QTYPE and
/// QCLASS, and — when a client id is given — the OPT record carrying it.
pub fn build_query(transaction_id: u16, qname: &[u8], client_id: Option<&[u8; CLIENT_ID_LENGTH]>) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(Header::SIZE + qname.len() + 4);

    let header = Header {
        transaction_id,
        flags: FLAGS_QUERY,
        questions: 1,
        answers: 0,
        authorities: 0,
        additional: if client_id.is_some() { 1 } else { 0 },
    };

    header.write_to(&mut bytes)?;
    bytes.extend_from_slice(qname);
    bytes.write_u16::<BigEndian>(QTYPE_A)?;
    bytes.write_u16::<BigEndian>(QCLASS_IN)?;

    if let Some(id) = client_id {
        bytes.extend_from_slice(&OPT_TEMPLATE);
        bytes.extend_from_slice(id);
    }

    Ok(bytes)
}


/// How the reflector decided to respond to a query.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum Outcome {

    /// The query was an ordinary `A` question and got the canned record.
    Answered,

    /// The query had unexpected flags, counts, or type, and was bounced
    /// back with RCODE 5.
    Refused,
}


/// Synthesizes the response to one query into `answer`, replacing whatever
/// the buffer held before.
///
/// An answered response is the query's header and question copied verbatim
/// with the flags and answer count rewritten, the canned record appended,
/// and any trailing bytes of the query (an OPT record, usually) copied
/// through unchanged — so the output is exactly sixteen bytes longer than
/// the input. A refusal is the same size as the input.
pub fn synthesize_response(query: &[u8], answer: &mut Vec<u8>) -> Result<Outcome, WireError> {
    let header = Header::from_bytes(query)?;

    if header.flags & !FLAGS_ALLOWED != 0
        || header.questions != 1
        || header.answers != 0
        || header.authorities != 0
    {
        return Ok(refuse(query, header.flags, answer));
    }

    // The question starts right after the header: labels until a zero
    // length byte, then the type and class.
    let name_end = match query[Header::SIZE..].iter().position(|&b| b == 0) {
        Some(offset) => Header::SIZE + offset + 1,
        None => return Err(WireError::QuestionTooShort { length: query.len() }),
    };

    let question_end = name_end + 4;
    if query.len() < question_end {
        return Err(WireError::QuestionTooShort { length: query.len() });
    }

    let qtype = u16::from_be_bytes([query[name_end], query[name_end + 1]]);
    if qtype != QTYPE_A {
        return Ok(refuse(query, header.flags, answer));
    }

    answer.clear();
    answer.extend_from_slice(&query[..question_end]);
    patch_flags(answer, (header.flags & FLAGS_PRESERVED) | FLAGS_ANSWERED);
    answer[6..8].copy_from_slice(&1_u16.to_be_bytes());
    answer.extend_from_slice(&ANSWER_RECORD);
    answer.extend_from_slice(&query[question_end..]);

    trace!("Synthesized {}-byte answer for transaction {}", answer.len(), header.transaction_id);
    Ok(Outcome::Answered)
}

fn refuse(query: &[u8], flags: u16, answer: &mut Vec<u8>) -> Outcome {
    answer.clear();
    answer.extend_from_slice(query);
    patch_flags(answer, (flags & FLAGS_PRESERVED) | FLAGS_REFUSED);
    Outcome::Refused
}

fn patch_flags(message: &mut [u8], flags: u16) {
    message[2..4].copy_from_slice(&flags.to_be_bytes());
}


#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    // The qname bytes for "bsago.me", used all over these tests.
    const QNAME: &[u8] = &[ 0x05, b'b', b's', b'a', b'g', b'o', 0x02, b'm', b'e', 0x00 ];

    fn plain_query() -> Vec<u8> {
        build_query(0xceac, QNAME, None).unwrap()
    }

    #[test]
    fn builds_without_client_id() {
        assert_eq!(plain_query(), &[
            0xce, 0xac,  // transaction ID
            0x01, 0x00,  // flags (standard query, recursion desired)
            0x00, 0x01,  // query count
            0x00, 0x00,  // answer count
            0x00, 0x00,  // authority RR count
            0x00, 0x00,  // additional RR count
            0x05, 0x62, 0x73, 0x61, 0x67, 0x6f, 0x02, 0x6d, 0x65, 0x00,  // name
            0x00, 0x01,  // type A
            0x00, 0x01,  // class IN
        ]);
    }

    #[test]
    fn builds_with_client_id() {
        let id = [0xab_u8; CLIENT_ID_LENGTH];
        let bytes = build_query(3, QNAME, Some(&id)).unwrap();

        // additional count flips to one
        assert_eq!(&bytes[10..12], &[ 0x00, 0x01 ]);

        // the question is followed by the template and then the raw id
        let question_end = Header::SIZE + QNAME.len() + 4;
        assert_eq!(&bytes[question_end..question_end + OPT_TEMPLATE.len()], &OPT_TEMPLATE);
        assert_eq!(&bytes[question_end + OPT_TEMPLATE.len()..], &id);
    }

    #[test]
    fn answers_a_query() {
        let query = plain_query();
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Answered));
        assert_eq!(answer.len(), query.len() + 16);

        // QR and AA set, RD preserved
        assert_eq!(&answer[2..4], &[ 0x85, 0x00 ]);

        // answer count rewritten
        assert_eq!(&answer[6..8], &[ 0x00, 0x01 ]);

        // question copied verbatim
        assert_eq!(&answer[12..query.len()], &query[12..]);

        // canned record appended
        assert_eq!(&answer[query.len()..], &ANSWER_RECORD);
    }

    #[test]
    fn copies_trailing_bytes() {
        let id = [0x11_u8; CLIENT_ID_LENGTH];
        let query = build_query(7, QNAME, Some(&id)).unwrap();
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Answered));
        assert_eq!(answer.len(), query.len() + 16);

        // the OPT record and client id follow the canned record unchanged
        let question_end = Header::SIZE + QNAME.len() + 4;
        assert_eq!(&answer[question_end + 16..], &query[question_end..]);
    }

    #[test]
    fn refuses_unexpected_flags() {
        let mut query = plain_query();
        query[2..4].copy_from_slice(&0x0300_u16.to_be_bytes());  // truncated bit on top of RD
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Refused));
        assert_eq!(answer.len(), query.len());

        // preserved bits (RD) survive, QR and RCODE 5 appear, TC is dropped
        assert_eq!(&answer[2..4], &[ 0x81, 0x05 ]);

        // everything else is the query, byte for byte
        assert_eq!(&answer[..2], &query[..2]);
        assert_eq!(&answer[4..], &query[4..]);
    }

    #[test]
    fn refuses_multiple_questions() {
        let mut query = plain_query();
        query[4..6].copy_from_slice(&2_u16.to_be_bytes());
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Refused));
        assert_eq!(&answer[2..4], &[ 0x81, 0x05 ]);
    }

    #[test]
    fn refuses_prefilled_answers() {
        let mut query = plain_query();
        query[6..8].copy_from_slice(&1_u16.to_be_bytes());
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Refused));
    }

    #[test]
    fn refuses_prefilled_authorities() {
        let mut query = plain_query();
        query[8..10].copy_from_slice(&1_u16.to_be_bytes());
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Refused));
    }

    #[test]
    fn refuses_non_a_queries() {
        let mut query = plain_query();
        let qtype_at = Header::SIZE + QNAME.len();
        query[qtype_at..qtype_at + 2].copy_from_slice(&28_u16.to_be_bytes());  // AAAA
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Refused));
        assert_eq!(answer.len(), query.len());
    }

    #[test]
    fn rejects_short_header() {
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&[ 0x01, 0x02, 0x03 ], &mut answer),
                   Err(WireError::HeaderTooShort { length: 3 }));
    }

    #[test]
    fn rejects_unterminated_name() {
        let query = plain_query();
        let mut answer = Vec::new();

        // chop the packet inside the name, before its zero byte
        assert_eq!(synthesize_response(&query[..Header::SIZE + 4], &mut answer),
                   Err(WireError::QuestionTooShort { length: 16 }));
    }

    #[test]
    fn rejects_missing_type_and_class() {
        let query = plain_query();
        let mut answer = Vec::new();

        // keep the name but drop the four type and class bytes
        let name_end = Header::SIZE + QNAME.len();
        assert_eq!(synthesize_response(&query[..name_end], &mut answer),
                   Err(WireError::QuestionTooShort { length: name_end }));
    }

    #[test]
    fn bad_flags_beat_bad_bounds() {
        // a refused packet is bounced even when its question is truncated
        let mut query = plain_query();
        query[2..4].copy_from_slice(&0x8000_u16.to_be_bytes());
        query.truncate(Header::SIZE + 2);
        let mut answer = Vec::new();

        assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Refused));
    }
}
