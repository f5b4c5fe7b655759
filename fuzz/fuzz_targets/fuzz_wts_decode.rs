#![no_main]

use libfuzzer_sys::fuzz_target;
use wtsgen::format::wts::encode;
use wtsgen::format::wts_reader::decode;
use wtsgen::{Tensor, TensorCollection};

fuzz_target!(|data: &[u8]| {
    let Ok(records) = decode(data) else {
        return;
    };

    // Anything the decoder accepts re-encodes to a file it accepts again
    let tensors: Vec<Tensor> = records
        .into_iter()
        .map(|r| Tensor::vector(r.name, r.values))
        .collect();
    let Ok(collection) = TensorCollection::from_tensors(tensors) else {
        return;
    };
    let mut out = Vec::new();
    if encode(&collection, &mut out).is_ok() {
        assert!(decode(out.as_slice()).is_ok());
    }
});
