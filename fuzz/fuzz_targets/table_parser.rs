#![no_main]

use factor_prune::tables::{AssociationTable, CrossTable, DegreesOfFreedom};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed tables must come back as errors, never panics
        let _ = AssociationTable::from_csv_str("continuous", input);
        let _ = CrossTable::from_csv_str(input);
        let _ = DegreesOfFreedom::from_csv_str(input);
    }
});
