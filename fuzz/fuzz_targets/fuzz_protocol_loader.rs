#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Protocol TOML is the other untrusted file format the host reads;
    // fuzz it the same way: parse error or Ok, never a panic.
    let _ = quantctl_config::protocol::load_protocol_toml(data);
});
