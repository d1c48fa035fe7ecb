#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<trackbench_config::Config>(data)
        && cfg.validate().is_ok()
    {
        for name in cfg.presets().keys() {
            let _ = cfg.preset(name);
        }
    }
});
