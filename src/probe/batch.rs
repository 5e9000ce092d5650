//! Pre-serializing the query batch.
//!
//! Every query of a run is built once, up front, and packed into one
//! contiguous buffer: a host-endian length prefix, then the ready-to-send
//! packet. Transmission is nothing but a cursor walking the buffer, so the
//! hot loop does no encoding work at all.

use std::io;
use std::mem;

use dns::{build_query, DomainSet, CLIENT_ID_LENGTH};

use super::TXID_SPACE;


const PREFIX_SIZE: usize = mem::size_of::<usize>();


/// All the queries of a run, packed end to end in send order.
pub struct QueryBatch {
    buffer: Vec<u8>,
    count: usize,
}

impl QueryBatch {

    /// Serializes `count` queries, cycling through the domain set and
    /// aliasing transaction ids into the 16-bit space.
    pub fn build(domains: &DomainSet, count: usize, client_id: Option<&[u8; CLIENT_ID_LENGTH]>) -> io::Result<Self> {
        let mut buffer = Vec::new();

        for index in 0 .. count {
            let transaction_id = (index % TXID_SPACE) as u16;
            let query = build_query(transaction_id, domains.get(index), client_id)?;

            buffer.extend_from_slice(&query.len().to_ne_bytes());
            buffer.extend_from_slice(&query);
        }

        Ok(Self { buffer, count })
    }

    /// Returns how many queries the batch holds.
    pub fn count(&self) -> usize {
        self.count
    }

    /// A cursor over the packed records, front to back.
    pub fn cursor(&self) -> BatchCursor<'_> {
        BatchCursor { batch: self, position: 0 }
    }
}


/// Walks a batch, yielding each packet's bytes in send order.
pub struct BatchCursor<'a> {
    batch: &'a QueryBatch,
    position: usize,
}

impl<'a> Iterator for BatchCursor<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let buffer = &self.batch.buffer;
        if self.position >= buffer.len() {
            return None;
        }

        let mut prefix = [0_u8; PREFIX_SIZE];
        prefix.copy_from_slice(&buffer[self.position .. self.position + PREFIX_SIZE]);
        let length = usize::from_ne_bytes(prefix);

        let start = self.position + PREFIX_SIZE;
        self.position = start + length;

        Some(&buffer[start .. start + length])
    }
}
