use crate::CliTest;

#[test]
fn init_writes_starter_config() {
    let test = CliTest::new().unwrap();
    let mut cmd = test.command();
    cmd.arg("init");
    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let config = test.read_file(".glotrc.json").unwrap();
    assert!(config.contains("\"locales\""));
    assert!(config.contains("\"extract\""));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let test = CliTest::new().unwrap();
    test.write_file(".glotrc.json", "{}").unwrap();

    let mut cmd = test.command();
    cmd.arg("init");
    let output = cmd.output().unwrap();
    assert!(!output.status.success());

    let config = test.read_file(".glotrc.json").unwrap();
    assert_eq!(config, "{}");
}

#[test]
fn init_force_overwrites_existing_config() {
    let test = CliTest::new().unwrap();
    test.write_file(".glotrc.json", "{}").unwrap();

    let mut cmd = test.command();
    cmd.arg("init").arg("--force");
    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let config = test.read_file(".glotrc.json").unwrap();
    assert!(config.contains("\"locales\""));
}
