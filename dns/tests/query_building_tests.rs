use dns::{build_query, encode, CLIENT_ID_LENGTH};

use pretty_assertions::assert_eq;


#[test]
fn build_plain_query() {
    let qname = encode("rfcs.io").unwrap();

    let result = vec![
        0xce, 0xac,  // transaction ID
        0x01, 0x00,  // flags (standard query)
        0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,  // counts (1, 0, 0, 0)

        // query:
        0x04, 0x72, 0x66, 0x63, 0x73, 0x02, 0x69, 0x6f, 0x00,  // qname
        0x00, 0x01,  // type A
        0x00, 0x01,  // class IN
    ];

    assert_eq!(build_query(0xceac, &qname, None).unwrap(), result);
}

#[test]
fn build_query_with_client_id() {
    let qname = encode("rfcs.io").unwrap();
    let client_id = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
        0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    ];

    let result = vec![
        0xce, 0xac,  // transaction ID
        0x01, 0x00,  // flags (standard query)
        0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,  // counts (1, 0, 0, 1)

        // query:
        0x04, 0x72, 0x66, 0x63, 0x73, 0x02, 0x69, 0x6f, 0x00,  // qname
        0x00, 0x01,  // type A
        0x00, 0x01,  // class IN

        // OPT record:
        0x00,        // name
        0x00, 0x29,  // type OPT
        0x10, 0x00,  // UDP payload size
        0x00,        // higher bits
        0x00,        // EDNS(0) version
        0x80, 0x00,  // more flags (DO bit)
        0x00, 0x14,  // data length (20)
        0xff, 0xee,  // option code
        0x00, 0x10,  // option length (16)

        // client id:
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
        0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    ];

    assert_eq!(build_query(0xceac, &qname, Some(&client_id)).unwrap(), result);
    assert_eq!(client_id.len(), CLIENT_ID_LENGTH);
}
