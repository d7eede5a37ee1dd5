use toml::Value;
use toml_edit::{Array, InlineTable};

use super::model::{CodexConfig, CodexMcpService, CodexProvider, MANAGED_MARKER};
use super::scan::table_block_start;

/// 将结构化模型渲染回 TOML 文本。
///
/// 输出顺序固定：托管标记 -> `model_provider` -> `model` -> 其余顶层行 ->
/// `[model_providers.*]` -> `[mcp_servers.*]` -> 其余表。所有无作用域的
/// 键都必须出现在第一个表头之前，否则 TOML 会把它们归入前一个表。
pub fn render_codex_config(config: &CodexConfig) -> String {
    let split = table_block_start(&config.other_config);
    let (root_lines, table_lines) = config.other_config.split_at(split);

    let mut prelude = Vec::new();
    if config.managed {
        prelude.push(MANAGED_MARKER.to_string());
    }
    if let Some(id) = &config.model_provider {
        let line = format!("model_provider = {}", quote(id));
        if config.model_provider_commented == Some(true) {
            prelude.push(format!("# {line}"));
        } else {
            prelude.push(line);
        }
    }
    if let Some(model) = &config.model {
        prelude.push(format!("model = {}", quote(model)));
    }
    prelude.extend(trim_blank_edges(root_lines).iter().cloned());

    let mut blocks: Vec<Vec<String>> = Vec::new();
    if !prelude.is_empty() {
        blocks.push(prelude);
    }
    blocks.extend(config.providers.iter().map(render_provider));
    blocks.extend(config.mcp_services.iter().map(render_mcp_service));

    let tables = trim_blank_edges(table_lines);
    if !tables.is_empty() {
        blocks.push(tables.to_vec());
    }

    if blocks.is_empty() {
        return String::new();
    }

    let mut out = blocks
        .iter()
        .map(|block| block.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

fn render_provider(provider: &CodexProvider) -> Vec<String> {
    let mut lines = vec![format!(
        "[model_providers.{}]",
        format_key(&provider.id)
    )];
    lines.push(format!("name = {}", quote(&provider.name)));
    if !provider.base_url.is_empty() {
        lines.push(format!("base_url = {}", quote(&provider.base_url)));
    }
    lines.push(format!("wire_api = {}", quote(provider.wire_api.as_str())));
    if !provider.env_key.is_empty() {
        lines.push(format!("env_key = {}", quote(&provider.env_key)));
    }
    if let Some(requires) = provider.requires_openai_auth {
        lines.push(format!("requires_openai_auth = {requires}"));
    }
    push_extra(&mut lines, &provider.extra);
    lines
}

fn render_mcp_service(service: &CodexMcpService) -> Vec<String> {
    let mut lines = vec![format!("[mcp_servers.{}]", format_key(&service.id))];
    lines.push(format!("command = {}", quote(&service.command)));
    if let Some(args) = &service.args {
        let array: Array = args.iter().map(String::as_str).collect();
        lines.push(format!("args = {array}"));
    }
    if let Some(env) = &service.env {
        let mut table = InlineTable::new();
        for (key, value) in env {
            table.insert(key.as_str(), value.as_str().into());
        }
        lines.push(format!("env = {table}"));
    }
    if let Some(timeout) = service.startup_timeout_ms {
        lines.push(format!("startup_timeout_ms = {timeout}"));
    }
    push_extra(&mut lines, &service.extra);
    lines
}

fn push_extra(lines: &mut Vec<String>, extra: &toml::Table) {
    for (key, value) in extra {
        lines.push(format!("{} = {}", format_key(key), to_edit_value(value)));
    }
}

fn trim_blank_edges(lines: &[String]) -> &[String] {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |idx| idx + 1);
    &lines[start..end]
}

pub(crate) fn quote(value: &str) -> String {
    toml_edit::Value::from(value).to_string()
}

fn format_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        quote(key)
    }
}

fn to_edit_value(value: &Value) -> toml_edit::Value {
    match value {
        Value::String(s) => s.as_str().into(),
        Value::Integer(n) => (*n).into(),
        Value::Float(f) => (*f).into(),
        Value::Boolean(b) => (*b).into(),
        Value::Datetime(dt) => dt
            .to_string()
            .parse::<toml_edit::Datetime>()
            .map(toml_edit::Value::from)
            .unwrap_or_else(|_| dt.to_string().into()),
        Value::Array(items) => items.iter().map(to_edit_value).collect::<Array>().into(),
        Value::Table(table) => {
            let mut inline = InlineTable::new();
            for (key, item) in table {
                inline.insert(key.as_str(), to_edit_value(item));
            }
            inline.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codex_config::model::WireApi;
    use crate::codex_config::parse_codex_config;
    use indexmap::IndexMap;

    fn sample_config() -> CodexConfig {
        let mut env = IndexMap::new();
        env.insert("EXA_API_KEY".to_string(), "secret".to_string());
        CodexConfig {
            model: Some("gpt-5".into()),
            model_provider: Some("packy".into()),
            model_provider_commented: None,
            providers: vec![
                CodexProvider::new("packy", "Packy", "https://packy.example/v1", WireApi::Responses),
                CodexProvider {
                    requires_openai_auth: Some(true),
                    ..CodexProvider::new("chat-one", "Chat \"One\"", "https://c.example", WireApi::Chat)
                },
            ],
            mcp_services: vec![CodexMcpService {
                id: "exa".into(),
                command: "npx".into(),
                args: Some(vec!["-y".into(), "exa-mcp-server".into()]),
                env: Some(env),
                startup_timeout_ms: Some(15000),
                extra: toml::Table::new(),
            }],
            managed: true,
            other_config: vec![
                "approval_policy = \"never\"".into(),
                String::new(),
                "[projects.\"/a\"]".into(),
                "trust_level = \"trusted\"".into(),
            ],
        }
    }

    #[test]
    fn empty_model_renders_empty_text() {
        assert_eq!(render_codex_config(&CodexConfig::default()), "");
    }

    #[test]
    fn globals_precede_every_table_header() {
        let text = render_codex_config(&sample_config());
        let provider_idx = text.find("model_provider = ").expect("provider line");
        let header_idx = text.find("\n[").expect("header");
        assert!(provider_idx < header_idx);
        assert!(text.starts_with(MANAGED_MARKER));

        let policy_idx = text.find("approval_policy").expect("root scalar");
        assert!(policy_idx < header_idx, "root scalars must stay unscoped");
        assert!(text.trim_end().ends_with("trust_level = \"trusted\""));
    }

    #[test]
    fn round_trip_preserves_structure() {
        let config = sample_config();
        let reparsed = parse_codex_config(&render_codex_config(&config)).expect("reparse");
        assert_eq!(reparsed, config);
    }

    #[test]
    fn commented_provider_renders_as_comment() {
        let config = CodexConfig {
            model_provider: Some("claude".into()),
            model_provider_commented: Some(true),
            ..CodexConfig::default()
        };
        let text = render_codex_config(&config);
        assert_eq!(text, "# model_provider = \"claude\"\n");

        let reparsed = parse_codex_config(&text).expect("reparse");
        assert_eq!(reparsed.model_provider.as_deref(), Some("claude"));
        assert_eq!(reparsed.model_provider_commented, Some(true));
    }

    #[test]
    fn render_is_idempotent_over_parse() {
        let text = r#"# header comment
model_provider = "a"
[tui]
notifications = true


[model_providers.a]
name = "A"
base_url = "https://a"
env_key = "A_API_KEY"

[projects."/x"]
trust_level = "trusted"
"#;
        let once = render_codex_config(&parse_codex_config(text).expect("first parse"));
        let twice = render_codex_config(&parse_codex_config(&once).expect("second parse"));
        assert_eq!(once, twice);
    }

    #[test]
    fn keys_needing_quotes_are_quoted() {
        assert_eq!(format_key("plain-id_1"), "plain-id_1");
        assert_eq!(format_key("has.dot"), "\"has.dot\"");
    }

    #[test]
    fn extra_values_render_as_valid_toml() {
        let mut provider = CodexProvider::new("azure", "Azure", "https://az", WireApi::Responses);
        let mut params = toml::Table::new();
        params.insert("api-version".into(), Value::String("2025-04-01".into()));
        provider.extra.insert("query_params".into(), Value::Table(params));
        provider
            .extra
            .insert("stream_max_retries".into(), Value::Integer(3));

        let config = CodexConfig {
            providers: vec![provider.clone()],
            ..CodexConfig::default()
        };
        let reparsed = parse_codex_config(&render_codex_config(&config)).expect("reparse");
        assert_eq!(reparsed.providers, vec![provider]);
    }
}
