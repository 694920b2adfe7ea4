// tests/config_env.rs
use p2p_quote_bot::BotConfig;
use std::{env, fs};

const VARS: &[&str] = &[
    "BOT_TOKEN",
    "SECRET_PATH",
    "CRON_KEY",
    "CHAT_ID",
    "QUOTE_SOURCES",
    "QUOTE_SOURCES_PATH",
];

fn clear_env() {
    for k in VARS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn from_env_fails_without_required_vars() {
    clear_env();
    let err = BotConfig::from_env().unwrap_err().to_string();
    assert!(err.starts_with("Faltan variables de entorno obligatorias"), "{err}");
    assert!(err.contains("BOT_TOKEN"));
}

#[serial_test::serial]
#[test]
fn from_env_reads_required_and_source_file() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("sources.toml");
    fs::write(&p, r#"sources = ["xapo", " bybitp2p "]"#).unwrap();

    env::set_var("BOT_TOKEN", "123:abc");
    env::set_var("SECRET_PATH", "tg-hook");
    env::set_var("CRON_KEY", "s3cret");
    env::set_var("CHAT_ID", "-42");
    env::set_var("QUOTE_SOURCES_PATH", p.display().to_string());

    let cfg = BotConfig::from_env().unwrap();
    assert_eq!(cfg.secret_path, "tg-hook");
    assert_eq!(cfg.default_chat_id.as_deref(), Some("-42"));
    assert_eq!(cfg.sources, vec!["xapo", "bybitp2p"]);

    // The inline list wins over the file.
    env::set_var("QUOTE_SOURCES", "binancep2p");
    let cfg = BotConfig::from_env().unwrap();
    assert_eq!(cfg.sources, vec!["binancep2p"]);

    clear_env();
}
