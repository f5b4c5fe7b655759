#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Header length, JSON metadata, dtype and offset checks must reject
    // arbitrary bytes with an error, never a panic
    let _ = wtsgen::serialization::parse_safetensors(data);
});
