//! Fuzz target: `config.json` import through the validating store
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Whatever the store accepts, it loads back identically and validates
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use kilnctl::adapters::config_store::MemoryConfigStore;
use kilnctl::app::ports::ConfigPort;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let store = MemoryConfigStore::new();
    if let Ok(cfg) = store.import_json(text) {
        let loaded = store.load().expect("accepted config must load back");
        assert_eq!(loaded, cfg);
        assert!(loaded.validate().is_ok());
    }
});
