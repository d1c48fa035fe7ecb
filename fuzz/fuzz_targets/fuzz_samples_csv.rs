#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whatever ingestion accepts must analyse or fail cleanly.
    if let Ok(rows) = trackbench_config::read_samples_csv(data)
        && let Ok(ds) = trackbench_core::dataset_from_rows("fuzz", &rows)
    {
        let _ = trackbench_core::compute(&ds);
    }
    let _ = trackbench_config::read_levels_csv(data);
});
