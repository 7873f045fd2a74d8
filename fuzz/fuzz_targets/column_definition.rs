#![no_main]

use libfuzzer_sys::fuzz_target;
use mariadb_protocol::{FieldDescriptor, PrepareOk};

fuzz_target!(|data: &[u8]| {
    let _ = FieldDescriptor::decode(&mut &data[..]);
    let _ = PrepareOk::decode(&mut &data[..]);

    // Whatever decodes must encode back to something that decodes the same
    if let Ok(field) = FieldDescriptor::decode(&mut &data[..]) {
        let encoded = field.encode_to_bytes();
        let again = FieldDescriptor::decode(&mut &encoded[..]).ok();
        assert_eq!(again.as_ref(), Some(&field));
    }
});
