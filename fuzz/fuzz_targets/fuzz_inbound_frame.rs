#![no_main]

use libfuzzer_sys::fuzz_target;

use round_table_client::protocol::{classify, InboundFrame};

fuzz_target!(|data: &[u8]| {
    // Exercise the raw-byte deserialization path (includes serde_json's
    // own UTF-8 validation and error handling for invalid sequences).
    let _ = serde_json::from_slice::<InboundFrame>(data);

    // Valid UTF-8 input additionally goes through classification, which
    // must never panic regardless of what the content decodes to.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(frame) = serde_json::from_str::<InboundFrame>(s) {
            let _ = classify(&frame, false);
            let _ = classify(&frame, true);
        }
    }
});
