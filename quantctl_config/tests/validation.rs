use quantctl_config::load_toml;

#[test]
fn rejects_zero_hardware_sample_rate() {
    let toml = r#"
[hardware]
sample_rate_hz = 0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject sample_rate_hz=0");
    assert!(err.to_string().to_lowercase().contains("sample_rate_hz"));
}

#[test]
fn accepts_defaults() {
    let cfg = load_toml("").expect("empty TOML uses defaults");
    cfg.validate().expect("defaults should be valid");
}

#[test]
fn rejects_zero_max_amp_vpp() {
    let toml = r#"
[safety]
max_amp_vpp = 0.0
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    assert!(cfg.validate().is_err());
}
