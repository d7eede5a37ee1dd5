use serde_json::{json, Value};

use zcf_lib::{
    read_codex_config, AppError, ApiMode, CodexProvider, CodexProviderService, ProviderInput,
    ProviderPatch, WireApi, OPENAI_API_KEY,
};

mod support;
use support::{list_files, CodexHome};

const TWO_PROVIDERS: &str = r#"model_provider = "alpha"

[model_providers.alpha]
name = "Alpha"
base_url = "https://alpha.example.com/v1"
wire_api = "responses"
env_key = "ALPHA_API_KEY"

[model_providers.beta]
name = "Beta"
base_url = "https://beta.example.com/v1"
wire_api = "chat"
env_key = "BETA_API_KEY"
"#;

fn seeded() -> CodexHome {
    let home = CodexHome::with_config(TWO_PROVIDERS);
    home.write_auth(&json!({
        "ALPHA_API_KEY": "sk-alpha",
        "BETA_API_KEY": "sk-beta",
        OPENAI_API_KEY: "sk-alpha",
    }));
    home
}

fn provider(id: &str) -> CodexProvider {
    CodexProvider::new(
        id,
        id.to_uppercase(),
        format!("https://{id}.example.com/v1"),
        WireApi::Responses,
    )
}

#[test]
fn add_appends_exactly_one_provider_and_stores_key() {
    let home = seeded();

    let outcome = CodexProviderService::add_provider_to_existing(
        &home.paths,
        provider("gamma"),
        "sk-gamma",
        false,
    )
    .expect("add provider");

    assert_eq!(outcome.added_provider.id, "gamma");
    assert!(outcome.backup_path.is_some());

    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.providers.len(), 3);
    assert_eq!(config.active_provider(), Some("alpha"));

    let auth = home.read_auth();
    assert_eq!(auth["GAMMA_API_KEY"], json!("sk-gamma"));
    assert_eq!(auth[OPENAI_API_KEY], json!("sk-alpha"));
}

#[test]
fn add_as_default_activates_and_syncs_openai_key() {
    let home = seeded();

    CodexProviderService::add_provider_to_existing(&home.paths, provider("gamma"), "sk-gamma", true)
        .expect("add provider");

    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.active_provider(), Some("gamma"));
    assert_eq!(home.read_auth()[OPENAI_API_KEY], json!("sk-gamma"));
}

#[test]
fn duplicate_add_fails_before_any_backup_or_write() {
    let home = seeded();
    let before = home.read_config();

    let err = CodexProviderService::add_provider_to_existing(
        &home.paths,
        provider("alpha"),
        "sk-new",
        true,
    )
    .expect_err("duplicate id");

    assert!(matches!(err, AppError::ProviderExists(ref id) if id == "alpha"));
    assert_eq!(home.read_config(), before);
    assert!(home.backups().is_empty());
    assert_eq!(home.read_auth()["ALPHA_API_KEY"], json!("sk-alpha"));
}

#[test]
fn unknown_provider_is_reported_by_id_without_writing() {
    let home = seeded();
    let files_before = list_files(home.paths.dir());
    let before = home.read_config();

    let err = CodexProviderService::switch_codex_provider(&home.paths, "nope")
        .expect_err("unknown provider");
    assert!(matches!(err, AppError::ProviderNotFound(ref id) if id == "nope"));
    assert!(err.to_string().contains("nope"));

    let err = CodexProviderService::edit_existing_provider(
        &home.paths,
        "nope",
        ProviderPatch {
            name: Some("X".into()),
            ..ProviderPatch::default()
        },
    )
    .expect_err("unknown provider");
    assert!(matches!(err, AppError::ProviderNotFound(_)));

    let err = CodexProviderService::delete_providers(&home.paths, &["alpha".into(), "nope".into()])
        .expect_err("unknown provider");
    assert!(matches!(err, AppError::ProviderNotFound(ref id) if id == "nope"));

    assert_eq!(home.read_config(), before);
    assert_eq!(list_files(home.paths.dir()), files_before);
}

#[test]
fn edit_patches_only_supplied_fields() {
    let home = seeded();

    let outcome = CodexProviderService::edit_existing_provider(
        &home.paths,
        "beta",
        ProviderPatch {
            base_url: Some("https://beta.example.org/v2".into()),
            ..ProviderPatch::default()
        },
    )
    .expect("edit provider");
    assert!(outcome.backup_path.is_some());

    let config = read_codex_config(&home.paths).expect("read config");
    let beta = config.find_provider("beta").expect("beta kept");
    assert_eq!(beta.base_url, "https://beta.example.org/v2");
    assert_eq!(beta.name, "Beta");
    assert_eq!(beta.wire_api, WireApi::Chat);
    assert_eq!(beta.env_key, "BETA_API_KEY");
    assert_eq!(
        config.find_provider("alpha").expect("alpha kept").base_url,
        "https://alpha.example.com/v1"
    );
    assert_eq!(home.read_auth()["BETA_API_KEY"], json!("sk-beta"));
}

#[test]
fn editing_the_active_key_refreshes_openai_key() {
    let home = seeded();

    CodexProviderService::edit_existing_provider(
        &home.paths,
        "alpha",
        ProviderPatch {
            api_key: Some("sk-alpha-2".into()),
            ..ProviderPatch::default()
        },
    )
    .expect("edit key");

    let auth = home.read_auth();
    assert_eq!(auth["ALPHA_API_KEY"], json!("sk-alpha-2"));
    assert_eq!(auth[OPENAI_API_KEY], json!("sk-alpha-2"));
}

#[test]
fn deleting_the_active_provider_promotes_the_first_remaining() {
    let home = CodexHome::with_config(&format!(
        "{TWO_PROVIDERS}\n[model_providers.gamma]\nname = \"Gamma\"\nbase_url = \"https://g.example.com\"\nwire_api = \"responses\"\nenv_key = \"GAMMA_API_KEY\"\n"
    ));
    home.write_auth(&json!({ "ALPHA_API_KEY": "sk-alpha", "GAMMA_API_KEY": "sk-gamma" }));

    let outcome =
        CodexProviderService::delete_providers(&home.paths, &["alpha".into(), "beta".into()])
            .expect("delete providers");

    assert_eq!(outcome.deleted, vec!["alpha".to_string(), "beta".to_string()]);
    assert_eq!(outcome.new_default_provider.as_deref(), Some("gamma"));

    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.providers.len(), 1);
    assert_eq!(config.active_provider(), Some("gamma"));
    assert_eq!(home.read_auth()[OPENAI_API_KEY], json!("sk-gamma"));
}

#[test]
fn deleting_a_non_active_provider_keeps_the_default() {
    let home = seeded();

    let outcome = CodexProviderService::delete_providers(&home.paths, &["beta".into()])
        .expect("delete beta");
    assert_eq!(outcome.new_default_provider, None);

    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.active_provider(), Some("alpha"));
    assert!(config.find_provider("beta").is_none());
}

#[test]
fn deleting_every_provider_clears_the_active_one() {
    let home = seeded();

    let outcome =
        CodexProviderService::delete_providers(&home.paths, &["alpha".into(), "beta".into()])
            .expect("delete all");
    assert_eq!(outcome.new_default_provider, None);

    let config = read_codex_config(&home.paths).expect("read config");
    assert!(config.providers.is_empty());
    assert_eq!(config.model_provider, None);
    assert!(!home.read_config().contains("model_provider"));
}

#[test]
fn empty_delete_request_is_rejected() {
    let home = seeded();
    let err = CodexProviderService::delete_providers(&home.paths, &[]).expect_err("empty");
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(home.backups().is_empty());
}

#[test]
fn switch_activates_provider_and_syncs_openai_key() {
    let home = seeded();

    let outcome =
        CodexProviderService::switch_codex_provider(&home.paths, "beta").expect("switch");
    assert_eq!(outcome.active.as_deref(), Some("beta"));
    let backup = outcome.backup_path.expect("config backed up");
    assert!(backup.ends_with("config.toml"));
    assert!(backup.is_file());

    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.active_provider(), Some("beta"));

    let auth = home.read_auth();
    assert_eq!(auth[OPENAI_API_KEY], json!("sk-beta"));
    assert_eq!(auth["ALPHA_API_KEY"], json!("sk-alpha"));
}

#[test]
fn official_login_comments_out_provider_and_nulls_key() {
    let home = seeded();

    let outcome =
        CodexProviderService::switch_to_official_login(&home.paths).expect("official login");
    assert_eq!(outcome.active, None);

    let text = home.read_config();
    assert!(text.contains("# model_provider = \"alpha\""));
    assert!(!text.lines().any(|l| l.starts_with("model_provider")));

    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.active_provider(), None);

    let auth = home.read_auth();
    assert_eq!(auth[OPENAI_API_KEY], Value::Null);
    assert_eq!(auth["BETA_API_KEY"], json!("sk-beta"));

    // 再次切换回供应商会取消注释
    CodexProviderService::switch_codex_provider(&home.paths, "alpha").expect("switch back");
    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.active_provider(), Some("alpha"));
    assert_eq!(home.read_auth()[OPENAI_API_KEY], json!("sk-alpha"));
}

#[test]
fn configure_api_creates_files_from_scratch() {
    let home = CodexHome::missing();

    let outcome = CodexProviderService::configure_codex_api(
        &home.paths,
        ApiMode::Custom {
            providers: vec![ProviderInput {
                provider: provider("packy"),
                api_key: "sk-packy".into(),
            }],
            default_provider: "packy".into(),
        },
    )
    .expect("configure api");

    assert_eq!(outcome.active.as_deref(), Some("packy"));
    assert_eq!(outcome.backup_path, None);

    let config = read_codex_config(&home.paths).expect("read config");
    assert!(config.managed);
    assert_eq!(config.active_provider(), Some("packy"));

    let auth = home.read_auth();
    assert_eq!(auth["PACKY_API_KEY"], json!("sk-packy"));
    assert_eq!(auth[OPENAI_API_KEY], json!("sk-packy"));
}

#[test]
fn configure_api_upserts_existing_providers() {
    let home = seeded();
    let mut replacement = provider("beta");
    replacement.env_key = "BETA_API_KEY".into();

    CodexProviderService::configure_codex_api(
        &home.paths,
        ApiMode::Custom {
            providers: vec![ProviderInput {
                provider: replacement,
                api_key: "sk-beta-2".into(),
            }],
            default_provider: "beta".into(),
        },
    )
    .expect("configure api");

    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.providers.len(), 2);
    assert_eq!(
        config.find_provider("beta").expect("beta").base_url,
        "https://beta.example.com/v1"
    );
    assert_eq!(config.find_provider("beta").expect("beta").wire_api, WireApi::Responses);
    assert_eq!(config.active_provider(), Some("beta"));
    assert_eq!(home.read_auth()[OPENAI_API_KEY], json!("sk-beta-2"));
}

#[test]
fn configure_api_rejects_unknown_default() {
    let home = seeded();
    let before = home.read_config();

    let err = CodexProviderService::configure_codex_api(
        &home.paths,
        ApiMode::Custom {
            providers: vec![ProviderInput {
                provider: provider("gamma"),
                api_key: "sk-gamma".into(),
            }],
            default_provider: "delta".into(),
        },
    )
    .expect_err("unknown default");

    assert!(matches!(err, AppError::ProviderNotFound(ref id) if id == "delta"));
    assert_eq!(home.read_config(), before);
    assert!(home.backups().is_empty());
}

#[test]
fn listing_reports_commented_state() {
    let home = seeded();
    CodexProviderService::switch_to_official_login(&home.paths).expect("official");

    let listing = CodexProviderService::list_codex_providers(&home.paths).expect("list");
    assert!(listing.commented);
    assert_eq!(listing.model_provider.as_deref(), Some("alpha"));
    assert_eq!(listing.providers.len(), 2);
}

#[test]
fn hand_written_provider_without_env_key_can_be_edited() {
    let home = CodexHome::with_config(
        r#"model_provider = "local"

[model_providers.local]
name = "Local"
base_url = "http://localhost:8080/v1"
wire_api = "chat"
"#,
    );

    CodexProviderService::edit_existing_provider(
        &home.paths,
        "local",
        ProviderPatch {
            name: Some("Local LLM".into()),
            ..ProviderPatch::default()
        },
    )
    .expect("rename without key");
    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.find_provider("local").expect("local").env_key, "");
    assert!(!home.read_config().contains("env_key"));

    CodexProviderService::edit_existing_provider(
        &home.paths,
        "local",
        ProviderPatch {
            api_key: Some("sk-local".into()),
            ..ProviderPatch::default()
        },
    )
    .expect("set key");
    let config = read_codex_config(&home.paths).expect("read config");
    assert_eq!(config.find_provider("local").expect("local").env_key, "LOCAL_API_KEY");
    let auth = home.read_auth();
    assert_eq!(auth["LOCAL_API_KEY"], json!("sk-local"));
    assert_eq!(auth[OPENAI_API_KEY], json!("sk-local"));
}

#[test]
fn failed_backup_aborts_the_write() {
    let home = seeded();
    // `backup` 是普通文件，无法在其下创建备份目录
    std::fs::write(home.paths.backup_root(), "not a dir").expect("block backup root");
    let before = home.read_config();
    let auth_before = home.read_auth();

    let err = CodexProviderService::add_provider_to_existing(
        &home.paths,
        provider("gamma"),
        "sk-gamma",
        true,
    )
    .expect_err("backup must fail");
    assert!(matches!(err, AppError::Io { .. }));

    let err = CodexProviderService::switch_codex_provider(&home.paths, "beta")
        .expect_err("backup must fail");
    assert!(matches!(err, AppError::Io { .. }));

    assert_eq!(home.read_config(), before);
    assert_eq!(home.read_auth(), auth_before);
}
