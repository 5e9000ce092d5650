//! The DNS message header and the errors found while inspecting packets.

use std::fmt;
use std::io;

use byteorder::{BigEndian, WriteBytesExt};


/// The set of flags that represents a standard query: nothing set except
/// the recursion desired bit.
pub const FLAGS_QUERY: u16 = 0x0100;


/// The twelve-byte DNS message **header**: six big-endian 16-bit fields.
/// This is the only part of a packet either end of the measurement pair
/// ever interprets.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Header {

    /// The transaction ID, correlating responses with outstanding queries.
    pub transaction_id: u16,

    /// The raw flags field. The probe and reflector work with mask
    /// arithmetic rather than named bits, so it stays a number.
    pub flags: u16,

    /// How many questions the packet carries.
    pub questions: u16,

    /// How many answer records the packet carries.
    pub answers: u16,

    /// How many authority records the packet carries.
    pub authorities: u16,

    /// How many additional records the packet carries.
    pub additional: u16,
}

impl Header {

    /// The encoded size of a header.
    pub const SIZE: usize = 12;

    /// Writes the six fields in wire order.
    pub fn write_to<W: io::Write>(&self, bytes: &mut W) -> io::Result<()> {
        bytes.write_u16::<BigEndian>(self.transaction_id)?;
        bytes.write_u16::<BigEndian>(self.flags)?;
        bytes.write_u16::<BigEndian>(self.questions)?;
        bytes.write_u16::<BigEndian>(self.answers)?;
        bytes.write_u16::<BigEndian>(self.authorities)?;
        bytes.write_u16::<BigEndian>(self.additional)?;
        Ok(())
    }

    /// Reads the header off the front of a packet.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < Self::SIZE {
            return Err(WireError::HeaderTooShort { length: bytes.len() });
        }

        let field = |at: usize| u16::from_be_bytes([bytes[at], bytes[at + 1]]);

        Ok(Self {
            transaction_id:  field(0),
            flags:           field(2),
            questions:       field(4),
            answers:         field(6),
            authorities:     field(8),
            additional:      field(10),
        })
    }
}


/// Something that can go wrong deciphering a packet.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum WireError {

    /// The packet ended before the twelve header bytes did.
    HeaderTooShort {

        /// How many bytes the packet actually had.
        length: usize,
    },

    /// The question section ran past the end of the packet, either because
    /// the name never terminated or because the type and class are missing.
    QuestionTooShort {

        /// How many bytes the packet actually had.
        length: usize,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderTooShort { length } => {
                write!(f, "Expected at least {} header bytes but got only {}", Header::SIZE, length)
            }
            Self::QuestionTooShort { length } => {
                write!(f, "Question section runs past the packet end ({} bytes)", length)
            }
        }
    }
}
