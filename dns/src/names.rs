//! Encoding domain names as labels, and the domain set the probe cycles
//! through.
//!
//! Domain names in the DNS protocol are encoded as **labels**: segments of
//! ASCII characters prefixed by their length, ending with a segment of zero
//! length. The whole set is encoded once, up front, so sending a query is
//! pointer arithmetic rather than string work.

use std::fmt;


/// Encodes one dotted name into wire labels.
///
/// So `dns.lookup.dog` becomes `3, dns, 6, lookup, 3, dog, 0`.
pub fn encode(name: &str) -> Result<Vec<u8>, NameErrorKind> {
    let mut bytes = Vec::with_capacity(name.len() + 2);
    encode_into(name.as_bytes(), &mut bytes)?;
    Ok(bytes)
}

fn encode_into(name: &[u8], bytes: &mut Vec<u8>) -> Result<(), NameErrorKind> {
    for label in name.split(|&b| b == b'.') {
        if label.is_empty() {
            return Err(NameErrorKind::EmptyLabel);
        }

        match u8::try_from(label.len()) {
            Ok(length) => {
                bytes.push(length);
                bytes.extend_from_slice(label);
            }
            Err(_) => {
                return Err(NameErrorKind::LabelTooLong { length: label.len() });
            }
        }
    }

    bytes.push(0);  // terminate the name
    Ok(())
}

/// Decodes wire labels back into a dotted name. Returns `None` when the
/// bytes end before the zero terminator does.
pub fn decode(bytes: &[u8]) -> Option<String> {
    let mut name = String::new();
    let mut position = 0;

    loop {
        let length = usize::from(*bytes.get(position)?);
        position += 1;

        if length == 0 {
            break;
        }

        let label = bytes.get(position .. position + length)?;
        position += length;

        if ! name.is_empty() {
            name.push('.');
        }
        name.push_str(&String::from_utf8_lossy(label));
    }

    Some(name)
}


/// The ordered, non-empty set of wire-encoded names a probe run queries.
///
/// The names are concatenated into one buffer with a per-name offset table,
/// and lookups cycle: asking for an index past the end wraps around, so a
/// run can send more queries than it has domains.
#[derive(PartialEq, Debug, Clone)]
pub struct DomainSet {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl DomainSet {

    /// Parses newline-separated dotted names, skipping empty lines.
    /// The first bad name fails the whole parse with its line number.
    pub fn parse(text: &[u8]) -> Result<Self, NameError> {
        let mut buffer = Vec::new();
        let mut offsets = Vec::new();

        for (index, line) in text.split(|&b| b == b'\n').enumerate() {
            if line.is_empty() {
                continue;
            }

            let start = buffer.len();
            match encode_into(line, &mut buffer) {
                Ok(())    => offsets.push(start),
                Err(kind) => return Err(NameError { line: index + 1, kind }),
            }
        }

        Ok(Self { buffer, offsets })
    }

    /// Returns the number of names in the set.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns whether the set holds no names at all.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the wire bytes of the `index`th name, cycling past the end.
    pub fn get(&self, index: usize) -> &[u8] {
        let slot = index % self.offsets.len();
        let start = self.offsets[slot];
        let end = self.offsets.get(slot + 1).copied().unwrap_or(self.buffer.len());
        &self.buffer[start .. end]
    }

    /// Iterates over the names in file order, one wire encoding at a time.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        (0 .. self.len()).map(move |index| self.get(index))
    }
}


/// An invalid name found while parsing a domain list.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct NameError {

    /// The 1-based line the name was found on.
    pub line: usize,

    /// What was wrong with it.
    pub kind: NameErrorKind,
}

/// The ways a dotted name can fail to encode.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum NameErrorKind {

    /// A dot with no label before it: a leading dot, a trailing dot, or
    /// two dots in a row.
    EmptyLabel,

    /// A label that does not fit its one-byte length prefix.
    LabelTooLong {

        /// How long the label actually was.
        length: usize,
    },
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid domain name at line {}: {}", self.line, self.kind)
    }
}

impl fmt::Display for NameErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLabel => {
                write!(f, "empty label")
            }
            Self::LabelTooLong { length } => {
                write!(f, "label of {} bytes is longer than 255", length)
            }
        }
    }
}
