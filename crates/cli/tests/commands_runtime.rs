use std::env;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use coverquote_cli::commands::{
    config, countries, packages, packages::PackagesArgs, quote, quote::QuoteArgs, wizard,
};
use coverquote_core::config::LoadOptions;
use coverquote_core::{QuoteSession, ReferenceCatalog, WizardStep};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn quote_prices_summary_for_given_fields() {
    with_env(&[], || {
        let result = quote::run(
            QuoteArgs {
                name: Some("Ada".to_string()),
                age: Some(60),
                country: Some("USD".to_string()),
                ..QuoteArgs::default()
            },
            LoadOptions::default(),
        );
        assert_eq!(result.exit_code, 0, "expected successful quote: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "your premium is $1,200.00");
        assert_eq!(payload["data"]["step"], "summary");
        assert_eq!(payload["data"]["quote"]["name"], "Ada");
        assert_eq!(payload["data"]["quote"]["formatted_premium"], "$1,200.00");
        assert_eq!(payload["data"]["pricing"]["currency"], "USD");
        assert!(payload["data"].get("purchase").is_none(), "no purchase without --buy");
        assert_eq!(
            payload["data"]["audit_trail"],
            serde_json::json!([
                "wizard.transition_applied",
                "wizard.quote_priced",
                "wizard.transition_applied",
                "wizard.quote_priced"
            ])
        );
    });
}

#[test]
fn quote_with_buy_returns_receipt_and_resets() {
    with_env(&[], || {
        let result = quote::run(
            QuoteArgs {
                name: Some("Ada".to_string()),
                age: Some(50),
                package: Some("sf".to_string()),
                buy: true,
                ..QuoteArgs::default()
            },
            LoadOptions::default(),
        );
        assert_eq!(result.exit_code, 0, "expected successful purchase: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["step"], "intro");
        assert_eq!(payload["data"]["quote"]["formatted_premium"], "HK$750.00");
        assert_eq!(payload["data"]["purchase"]["currency_code"], "HKD");
        let trail = payload["data"]["audit_trail"].as_array().expect("audit trail");
        let tail: Vec<&str> = trail.iter().rev().take(2).filter_map(Value::as_str).collect();
        assert_eq!(tail, ["wizard.transition_applied", "wizard.purchase_confirmed"]);
        assert!(payload["message"].as_str().unwrap_or_default().starts_with("purchased Safe cover"));
    });
}

#[test]
fn quote_over_age_limit_is_rejected() {
    with_env(&[], || {
        let result = quote::run(
            QuoteArgs { name: Some("Ada".to_string()), age: Some(101), ..QuoteArgs::default() },
            LoadOptions::default(),
        );
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "age_rejected");
    });
}

#[test]
fn quote_without_name_is_a_bad_request() {
    with_env(&[], || {
        let result = quote::run(QuoteArgs::default(), LoadOptions::default());
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "bad_request");
        assert!(payload["message"].as_str().unwrap_or_default().contains("name"));
    });
}

#[test]
fn quote_respects_age_limit_from_config_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, "coverquote.toml", "[wizard]\nmax_age = 60\n");

        let result = quote::run(
            QuoteArgs { name: Some("Ada".to_string()), age: Some(61), ..QuoteArgs::default() },
            LoadOptions { config_path: Some(path), require_file: true, ..LoadOptions::default() },
        );
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "age_rejected");
    });
}

#[test]
fn missing_required_config_file_is_a_config_failure() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let result = countries::run(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "countries");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn unreadable_reference_data_is_an_internal_failure() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("missing-reference.toml");
    let missing = missing.to_str().expect("utf-8 temp path");

    with_env(&[("COVERQUOTE_REFERENCE_PATH", missing)], || {
        let result = packages::run(PackagesArgs::default(), LoadOptions::default());
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "internal");
    });
}

#[test]
fn packages_list_add_prices_for_default_session() {
    with_env(&[], || {
        let result = packages::run(PackagesArgs::default(), LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["standard_premium"], "HK$500.00");
        let labels: Vec<&str> = payload["data"]["packages"]
            .as_array()
            .expect("packages array")
            .iter()
            .filter_map(|row| row["label"].as_str())
            .collect();
        assert_eq!(
            labels,
            ["Standard (+HK$0.00, 0%)", "Safe (+HK$250.00, 50%)", "Super Safe (+HK$375.00, 75%)"]
        );
    });
}

#[test]
fn packages_follow_requested_country() {
    with_env(&[], || {
        let result = packages::run(
            PackagesArgs { age: Some(60), country: Some("AUD".to_string()) },
            LoadOptions::default(),
        );
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["country"], "Australia");
        assert_eq!(payload["data"]["packages"][1]["add_price"], "A$900.00");
    });
}

#[test]
fn countries_come_from_reference_file() {
    let dir = TempDir::new().expect("temp dir");
    let reference = write_file(
        &dir,
        "reference.toml",
        "[[countries]]\nid = \"NZD\"\nname = \"New Zealand\"\nrate = 2.5\n\n\
         [[packages]]\nid = \"sd\"\nname = \"Standard\"\nloading_ratio = 0\n",
    );
    let reference = reference.to_str().expect("utf-8 temp path").to_string();

    with_env(&[("COVERQUOTE_REFERENCE_PATH", reference.as_str())], || {
        let result = countries::run(LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"][0]["id"], "NZD");
        assert_eq!(payload["data"][0]["currency_code"], "NZD");
        assert_eq!(payload["message"], "1 countries available");
    });
}

#[test]
fn builtin_countries_are_listed_in_order() {
    with_env(&[], || {
        let payload = parse_payload(&countries::run(LoadOptions::default()).output);
        let ids: Vec<&str> = payload["data"]
            .as_array()
            .expect("countries array")
            .iter()
            .filter_map(|row| row["id"].as_str())
            .collect();
        assert_eq!(ids, ["HKD", "USD", "AUD"]);
    });
}

#[test]
fn config_reports_value_sources() {
    with_env(&[("COVERQUOTE_WIZARD_MAX_AGE", "90")], || {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 0);
        let output = result.output;
        assert!(output.contains("- wizard.max_age = 90 (source: env (COVERQUOTE_WIZARD_MAX_AGE))"));
        assert!(output.contains("- wizard.default_age = 50 (source: default)"));
        assert!(output.contains("- reference.path = <built-in> (source: default)"));
    });
}

#[test]
fn config_reports_file_sources() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, "coverquote.toml", "[logging]\nlevel = \"warn\"\n");

        let output =
            config::run(LoadOptions { config_path: Some(path.clone()), ..LoadOptions::default() })
                .output;
        let expected = format!("- logging.level = warn (source: file ({}))", path.display());
        assert!(output.contains(&expected), "unexpected output:\n{output}");
    });
}

#[test]
fn config_exits_with_config_failure_when_required_file_is_missing() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let result = config::run(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        assert_eq!(result.exit_code, 2, "expected config failure code");
        assert!(result.output.starts_with("config validation failed:"));
        assert!(result.output.contains("absent.toml"));
    });
}

#[test]
fn config_exits_with_config_failure_on_invalid_env() {
    with_env(&[("COVERQUOTE_LOGGING_LEVEL", "loud")], || {
        let result = config::run(LoadOptions::default());
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("logging.level"));
    });
}

#[test]
fn wizard_labels_packages_by_add_price_not_ratio() {
    let mut session = builtin_session();

    let output = drive(&mut session, "start
age 0
");

    assert!(output.contains("Your premium is: HK$0.00"));
    let details = output.rsplit("== Tell us about yourself ==").next().unwrap_or_default();
    assert!(details.contains("  Safe (sf)"), "zero add price hides the label:\n{details}");
    assert!(!details.contains("(+HK$"));
}

#[test]
fn wizard_walks_through_to_purchase() {
    let mut session = builtin_session();
    let script = "start\nname Ada\nage 60\ncountry USD\nnext\nbuy\nquit\n";

    let output = drive(&mut session, script);

    assert!(output.contains("== Hello There! =="));
    assert!(output.contains("== Tell us about yourself =="));
    assert!(output.contains("Your premium is: $1,200.00"));
    assert!(output.contains("== Summary =="));
    assert!(output.contains("Premium: $1,200.00"));
    assert!(output.contains("Thank you! Your purchase reference is"));
    assert_eq!(session.step(), WizardStep::Intro);
    assert_eq!(session.name(), "", "purchase should reset the session");
}

#[test]
fn wizard_shows_package_add_prices() {
    let mut session = builtin_session();

    let output = drive(&mut session, "start\npackage ss\n");

    assert!(output.contains("Safe (+HK$250.00, 50%) (sf)"));
    assert!(output.contains("* Super Safe (+HK$375.00, 75%) (ss)"));
    assert!(output.contains("Your premium is: HK$875.00"));
}

#[test]
fn wizard_rejects_over_age_and_restarts() {
    let mut session = builtin_session();
    let script = "start\nname Ada\nage 101\nnext\nnext\nok\n";

    let output = drive(&mut session, script);

    assert!(output.contains("Your age is over our accepted limit."));
    assert!(output.contains("We are sorry but we cannot insure you now"));
    assert!(output.contains("! "), "going forward from the rejection page is refused");
    assert_eq!(session.step(), WizardStep::Intro);
    assert_eq!(session.age(), 50);
}

#[test]
fn wizard_keeps_details_when_name_is_missing() {
    let mut session = builtin_session();

    let output = drive(&mut session, "start\nnext\n");

    assert!(output.lines().any(|line| line.starts_with("! ") && line.contains("name")));
    assert_eq!(session.step(), WizardStep::Details);
}

#[test]
fn wizard_refuses_field_changes_outside_details() {
    let mut session = builtin_session();

    let output = drive(&mut session, "name Ada\nage old\n");

    assert!(output.contains("! fields can only be changed on the details page"));
    assert_eq!(session.name(), "");
}

#[test]
fn wizard_reports_bad_age_input() {
    let mut session = builtin_session();

    let output = drive(&mut session, "start\nage old\n");

    assert!(output.contains("! age must be a whole number of years, got `old`"));
    assert_eq!(session.age(), 50);
}

#[test]
fn wizard_recovers_from_unknown_page() {
    let mut session = builtin_session();
    session.restore_step("7");

    let output = drive(&mut session, "restart\n");

    assert!(output.contains("Something went wrong."));
    assert!(output.contains("== Hello There! =="));
    assert_eq!(session.step(), WizardStep::Intro);
}

fn builtin_session() -> QuoteSession {
    QuoteSession::new(Arc::new(ReferenceCatalog::builtin()))
}

fn drive(session: &mut QuoteSession, script: &str) -> String {
    let mut output = Vec::new();
    wizard::run_with_io(session, Cursor::new(script.as_bytes()), &mut output)
        .expect("scripted wizard session should not fail");
    String::from_utf8(output).expect("wizard output should be utf-8")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "COVERQUOTE_WIZARD_DEFAULT_AGE",
        "COVERQUOTE_WIZARD_DEFAULT_COUNTRY",
        "COVERQUOTE_WIZARD_DEFAULT_PACKAGE",
        "COVERQUOTE_WIZARD_MAX_AGE",
        "COVERQUOTE_WIZARD_REQUIRE_NAME",
        "COVERQUOTE_WIZARD_CLEAR_FIELDS_ON_RESET",
        "COVERQUOTE_REFERENCE_PATH",
        "COVERQUOTE_LOGGING_LEVEL",
        "COVERQUOTE_LOGGING_FORMAT",
        "COVERQUOTE_LOG_LEVEL",
        "COVERQUOTE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
