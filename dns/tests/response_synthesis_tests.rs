use dns::{build_query, encode, synthesize_response, Outcome};

use pretty_assertions::assert_eq;


#[test]
fn answer_round_trip() {
    // take a freshly built query and run it through the responder
    let qname = encode("bsago.me").unwrap();
    let query = build_query(0x1234, &qname, None).unwrap();

    let mut answer = Vec::new();
    assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Answered));

    let result = vec![
        0x12, 0x34,  // transaction ID
        0x85, 0x00,  // flags (response, authoritative, recursion desired)
        0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,  // counts (1, 1, 0, 0)

        // query, copied through:
        0x05, 0x62, 0x73, 0x61, 0x67, 0x6f, 0x02, 0x6d, 0x65, 0x00,  // qname
        0x00, 0x01,  // type A
        0x00, 0x01,  // class IN

        // canned answer:
        0xc0, 0x0c,  // name (backreference to the question)
        0x00, 0x01,  // type A
        0x00, 0x01,  // class IN
        0x00, 0x00, 0x0e, 0x10,  // TTL (3600)
        0x00, 0x04,  // data length 4
        0x01, 0x02, 0x03, 0x04,  // IP address 1.2.3.4
    ];

    assert_eq!(answer, result);
}

#[test]
fn refusal_round_trip() {
    let qname = encode("bsago.me").unwrap();
    let mut query = build_query(0x1234, &qname, None).unwrap();

    // turn the query into a response packet, which no server should accept
    query[2] |= 0x80;

    let mut answer = Vec::new();
    assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Refused));
    assert_eq!(answer.len(), query.len());

    // flags come back rewritten: response, recursion desired, REFUSED
    assert_eq!(&answer[2..4], &[ 0x81, 0x05 ]);

    // the rest of the packet is the query, byte for byte
    assert_eq!(&answer[..2], &query[..2]);
    assert_eq!(&answer[4..], &query[4..]);
}

#[test]
fn the_reused_buffer_is_replaced_every_time() {
    let qname = encode("bsago.me").unwrap();
    let query = build_query(1, &qname, None).unwrap();

    let mut answer = vec![ 0xff; 400 ];
    assert_eq!(synthesize_response(&query, &mut answer), Ok(Outcome::Answered));

    assert_eq!(answer.len(), query.len() + 16);
}
