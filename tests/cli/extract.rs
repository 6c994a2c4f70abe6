use serde_json::Value;

use crate::CliTest;

fn write_config(test: &CliTest, extra: &str) {
    let config = format!(
        r#"{{
  "locales": ["en", "fr"],
  "extract": {{
    "input": ["src/**/*.tsx"],
    "output": "locales/{{{{language}}}}/{{{{namespace}}}}.json"{extra}
  }}
}}"#
    );
    test.write_file(".glotrc.json", &config).unwrap();
}

#[test]
fn extract_seeds_primary_locale_default_from_call_site() {
    let test = CliTest::new().unwrap();
    write_config(&test, "");
    test.write_file(
        "src/app.tsx",
        "const { t } = useTranslation('common'); t('save');",
    )
    .unwrap();

    let output = test.extract_command().output().unwrap();
    assert!(output.status.success());

    let en: Value = serde_json::from_str(&test.read_file("locales/en/common.json").unwrap()).unwrap();
    assert_eq!(en["save"], "save");

    let fr: Value = serde_json::from_str(&test.read_file("locales/fr/common.json").unwrap()).unwrap();
    assert_eq!(fr["save"], "");
}

#[test]
fn extract_second_run_is_idempotent() {
    let test = CliTest::new().unwrap();
    write_config(&test, "");
    test.write_file("src/app.tsx", "t('hello', 'Hello');").unwrap();

    assert!(test.extract_command().output().unwrap().status.success());
    assert!(test.extract_command().output().unwrap().status.success());

    // --ci should now report no update on an unchanged tree.
    let mut cmd = test.extract_command();
    cmd.arg("--ci");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
}

#[test]
fn extract_ci_flag_exits_nonzero_when_a_file_was_updated() {
    let test = CliTest::new().unwrap();
    write_config(&test, "");
    test.write_file("src/app.tsx", "t('hello', 'Hello');").unwrap();

    let mut cmd = test.extract_command();
    cmd.arg("--ci");
    let output = cmd.output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn extract_dry_run_does_not_write_files() {
    let test = CliTest::new().unwrap();
    write_config(&test, "");
    test.write_file("src/app.tsx", "t('hello', 'Hello');").unwrap();

    let mut cmd = test.extract_command();
    cmd.arg("--dry-run");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    assert!(test.read_file("locales/en/translation.json").is_err());
}

#[test]
fn extract_preserves_user_authored_values_not_removed() {
    let test = CliTest::new().unwrap();
    write_config(&test, r#", "preservePatterns": ["legacy*"]"#);
    test.write_file("src/app.tsx", "t('save');").unwrap();
    test.write_file(
        "locales/en/translation.json",
        r#"{ "legacy_key": "Keep me" }"#,
    )
    .unwrap();

    assert!(test.extract_command().output().unwrap().status.success());

    let en: Value = serde_json::from_str(&test.read_file("locales/en/translation.json").unwrap()).unwrap();
    assert_eq!(en["legacy_key"], "Keep me");
    assert_eq!(en["save"], "save");
}
