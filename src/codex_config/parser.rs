use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use toml::{Table, Value};

use super::model::{
    CodexConfig, CodexMcpService, CodexProvider, LEGACY_MCP_MARKER, MANAGED_MARKER,
};
use super::scan::{scan_items, Item};

const PROVIDERS_TABLE: &str = "model_providers";
const MCP_TABLE: &str = "mcp_servers";

fn commented_provider_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*#\s*(model_provider\s*=.*)$").expect("commented provider regex")
    })
}

struct Section {
    header: Option<String>,
    path: Vec<String>,
    items: Vec<Item>,
}

/// Accumulates `[model_providers.*]` / `[mcp_servers.*]` tables by id.
///
/// A repeated main table replaces everything seen so far for that id;
/// sub-tables (`[mcp_servers.x.env]`) merge into whatever is there.
#[derive(Default)]
struct Collector {
    tables: IndexMap<String, Table>,
    seen_main: HashSet<String>,
}

impl Collector {
    fn main_table(&mut self, id: &str, table: Table) {
        if self.seen_main.insert(id.to_string()) {
            let entry = self.tables.entry(id.to_string()).or_default();
            merge_table(entry, table);
        } else {
            self.tables.insert(id.to_string(), table);
        }
    }

    fn sub_table(&mut self, id: &str, sub_path: &[String], table: Table) {
        let entry = self.tables.entry(id.to_string()).or_default();
        insert_nested(entry, sub_path, table);
    }

    fn merge_parent(&mut self, parent: Table) {
        for (id, value) in parent {
            match value {
                Value::Table(table) => {
                    let entry = self.tables.entry(id).or_default();
                    merge_table(entry, table);
                }
                other => log::warn!("忽略非表结构的条目 {id} = {other}"),
            }
        }
    }
}

/// 将 `config.toml` 文本解析为结构化模型。
///
/// 语法错误（引号不配对、表头损坏等）原样返回；缺失的可选字段取默认值。
///
/// `[model_providers.*]` / `[mcp_servers.*]` 表体内的注释不会保留（这些表由
/// 模型重新渲染）。紧跟在这类表之后的注释行视为下一个非托管表的表头注释，
/// 随它一起进入 `other_config`；文件末尾的则追加到 `other_config` 末尾。
pub fn parse_codex_config(text: &str) -> Result<CodexConfig, toml::de::Error> {
    let mut config = CodexConfig {
        managed: text.contains(MANAGED_MARKER) || text.contains(LEGACY_MCP_MARKER),
        ..CodexConfig::default()
    };
    if text.trim().is_empty() {
        return Ok(config);
    }

    let sections = split_sections(text)?;
    let mut providers = Collector::default();
    let mut mcp = Collector::default();
    let mut other = OtherLines::default();
    let mut commented_provider: Option<String> = None;
    // 托管表之后、下一个非托管表头之前的注释
    let mut lead_comments: Vec<Item> = Vec::new();

    for section in sections {
        let Some(header) = section.header else {
            let root = parse_body(&section.items)?;
            absorb_root(&mut config, root, &mut providers, &mut mcp);
            for item in &section.items {
                match item {
                    Item::Comment(line) => {
                        if is_marker(line) {
                            continue;
                        }
                        // 只取第一条；已有生效的 model_provider 时注释原样保留
                        if config.model_provider.is_none() && commented_provider.is_none() {
                            if let Some(id) = parse_commented_provider(line) {
                                commented_provider = Some(id);
                                continue;
                            }
                        }
                        other.push(item);
                    }
                    Item::Statement { key, .. } if is_structural_root_key(&config, key) => {}
                    _ => other.push(item),
                }
            }
            continue;
        };

        let path = section.path;
        match path.first().map(String::as_str) {
            Some(PROVIDERS_TABLE) => {
                let table = parse_body(&section.items)?;
                lead_comments.extend(trailing_comments(section.items));
                match path.len() {
                    1 => providers.merge_parent(table),
                    2 => providers.main_table(&path[1], table),
                    _ => providers.sub_table(&path[1], &path[2..], table),
                }
            }
            Some(MCP_TABLE) => {
                let table = parse_body(&section.items)?;
                lead_comments.extend(trailing_comments(section.items));
                match path.len() {
                    1 => mcp.merge_parent(table),
                    2 => mcp.main_table(&path[1], table),
                    _ => mcp.sub_table(&path[1], &path[2..], table),
                }
            }
            _ => {
                let kept = recover_stray_directives(&mut config, &path, section.items);
                // 只做语法校验，内容按原文保留
                parse_body(&kept)?;
                other.push_header(header, &std::mem::take(&mut lead_comments));
                for item in &kept {
                    other.push(item);
                }
            }
        }
    }

    for item in &lead_comments {
        other.push(item);
    }

    if config.model_provider.is_none() {
        if let Some(id) = commented_provider {
            config.model_provider = Some(id);
            config.model_provider_commented = Some(true);
        }
    }

    config.providers = providers
        .tables
        .into_iter()
        .map(|(id, table)| provider_from_table(id, table))
        .collect();
    config.mcp_services = mcp
        .tables
        .into_iter()
        .map(|(id, table)| mcp_service_from_table(id, table))
        .collect();
    config.other_config = other.finish();

    Ok(config)
}

fn split_sections(text: &str) -> Result<Vec<Section>, toml::de::Error> {
    let mut sections = vec![Section {
        header: None,
        path: Vec::new(),
        items: Vec::new(),
    }];

    for item in scan_items(text) {
        if let Item::Header(raw) = &item {
            let path = header_path(raw)?;
            sections.push(Section {
                header: Some(raw.clone()),
                path,
                items: Vec::new(),
            });
            continue;
        }
        if let Some(current) = sections.last_mut() {
            current.items.push(item);
        }
    }

    Ok(sections)
}

/// 借助 TOML 解析器本身解析表头，正确处理带引号的键
fn header_path(raw: &str) -> Result<Vec<String>, toml::de::Error> {
    let table: Table = toml::from_str(&format!("{}\n", raw.trim()))?;
    let mut path = Vec::new();
    let mut current = &table;
    while current.len() == 1 {
        let Some((key, value)) = current.iter().next() else {
            break;
        };
        path.push(key.clone());
        current = match value {
            Value::Table(next) => next,
            Value::Array(items) => match items.last() {
                Some(Value::Table(next)) => next,
                _ => break,
            },
            _ => break,
        };
    }
    Ok(path)
}

fn is_marker(line: &str) -> bool {
    line.contains(MANAGED_MARKER) || line.contains(LEGACY_MCP_MARKER)
}

/// 最后一条赋值之后的注释与空行（ZCF 标记除外）；不含注释时返回空
fn trailing_comments(mut items: Vec<Item>) -> Vec<Item> {
    let cut = items
        .iter()
        .rposition(|item| matches!(item, Item::Statement { .. }))
        .map_or(0, |idx| idx + 1);
    let mut tail = items.split_off(cut);
    tail.retain(|item| !matches!(item, Item::Comment(line) if is_marker(line)));
    if tail.iter().any(|item| matches!(item, Item::Comment(_))) {
        tail
    } else {
        Vec::new()
    }
}

fn parse_body(items: &[Item]) -> Result<Table, toml::de::Error> {
    let mut body = String::new();
    for item in items {
        if let Item::Statement { lines, .. } = item {
            for line in lines {
                body.push_str(line);
                body.push('\n');
            }
        }
    }
    if body.is_empty() {
        return Ok(Table::new());
    }
    toml::from_str(&body)
}

fn absorb_root(
    config: &mut CodexConfig,
    mut root: Table,
    providers: &mut Collector,
    mcp: &mut Collector,
) {
    if let Some(Value::String(model)) = root.remove("model") {
        config.model = Some(model);
    }
    if let Some(Value::String(id)) = root.remove("model_provider") {
        config.model_provider = Some(id);
    }
    if let Some(Value::Table(table)) = root.remove(PROVIDERS_TABLE) {
        providers.merge_parent(table);
    }
    if let Some(Value::Table(table)) = root.remove(MCP_TABLE) {
        mcp.merge_parent(table);
    }
}

fn is_structural_root_key(config: &CodexConfig, key: &[String]) -> bool {
    match key {
        [single] if single == "model" => config.model.is_some(),
        [single] if single == "model_provider" => config.model_provider.is_some(),
        [first, ..] => first == PROVIDERS_TABLE || first == MCP_TABLE,
        [] => false,
    }
}

/// `# model_provider = "x"` -> `Some("x")`
fn parse_commented_provider(line: &str) -> Option<String> {
    let caps = commented_provider_re().captures(line)?;
    let payload = caps.get(1)?.as_str();
    let table: Table = toml::from_str(payload).ok()?;
    table
        .get("model_provider")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// 早期写入器会把全局指令追加在 `[projects.*]` 信任表之后（以空行隔开），
/// 导致它们被 TOML 归入该表。这里在缺少真正的顶层赋值时把它们取回；
/// 与表内其他键紧邻的赋值仍视为表内字段。
fn recover_stray_directives(
    config: &mut CodexConfig,
    path: &[String],
    items: Vec<Item>,
) -> Vec<Item> {
    if path.first().map(String::as_str) != Some("projects") {
        return items;
    }

    let mut kept = Vec::with_capacity(items.len());
    let mut separated = false;
    for item in items {
        match &item {
            Item::Blank(_) => separated = true,
            Item::Statement { key, lines } if separated && key.len() == 1 => {
                let slot = match key[0].as_str() {
                    "model_provider" if config.model_provider.is_none() => {
                        Some(&mut config.model_provider)
                    }
                    "model" if config.model.is_none() => Some(&mut config.model),
                    _ => None,
                };
                if let Some(slot) = slot {
                    let value = toml::from_str::<Table>(&lines.join("\n"))
                        .ok()
                        .and_then(|t| t.get(&key[0]).and_then(Value::as_str).map(str::to_string));
                    if let Some(value) = value {
                        log::warn!(
                            "检测到被误放在 [{}] 表后的全局指令 {} = \"{}\"，已提升为顶层配置",
                            path.join("."),
                            key[0],
                            value
                        );
                        *slot = Some(value);
                        continue;
                    }
                }
                separated = false;
            }
            Item::Statement { .. } => separated = false,
            _ => {}
        }
        kept.push(item);
    }
    kept
}

/// Collects unmanaged lines: leading/trailing blanks dropped, blank runs collapsed.
#[derive(Default)]
struct OtherLines {
    lines: Vec<String>,
    last_blank: bool,
}

impl OtherLines {
    fn push(&mut self, item: &Item) {
        if let Item::Blank(_) = item {
            if self.lines.is_empty() || self.last_blank {
                return;
            }
            self.last_blank = true;
            self.lines.push(String::new());
            return;
        }
        self.last_blank = false;
        item.push_lines(&mut self.lines);
    }

    /// `lead` 为紧贴表头的注释，首尾空行去掉，与表头之间不插空行
    fn push_header(&mut self, header: String, lead: &[Item]) {
        if !self.lines.is_empty() && !self.last_blank {
            self.lines.push(String::new());
        }
        let start = lead
            .iter()
            .position(|item| !matches!(item, Item::Blank(_)))
            .unwrap_or(lead.len());
        let end = lead
            .iter()
            .rposition(|item| !matches!(item, Item::Blank(_)))
            .map_or(start, |idx| idx + 1);
        for item in &lead[start..end] {
            item.push_lines(&mut self.lines);
        }
        self.last_blank = false;
        self.lines.push(header);
    }

    fn finish(mut self) -> Vec<String> {
        while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

fn take_string(table: &mut Table, key: &str) -> Option<String> {
    match table.remove(key)? {
        Value::String(s) => Some(s),
        other => {
            log::warn!("字段 {key} 应为字符串，实际为 {other}，已忽略");
            None
        }
    }
}

fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const PROVIDER_KEYS: &[&str] = &[
    "name",
    "base_url",
    "wire_api",
    "env_key",
    "requires_openai_auth",
];
const MCP_KEYS: &[&str] = &["command", "args", "env", "startup_timeout_ms"];

/// 拆分已建模字段与其余字段，保持其余字段的原始顺序
fn partition_known(table: Table, known: &[&str]) -> (Table, Table) {
    let mut modeled = Table::new();
    let mut extra = Table::new();
    for (key, value) in table {
        if known.contains(&key.as_str()) {
            modeled.insert(key, value);
        } else {
            extra.insert(key, value);
        }
    }
    (modeled, extra)
}

fn provider_from_table(id: String, table: Table) -> CodexProvider {
    let (mut table, extra) = partition_known(table, PROVIDER_KEYS);
    let name = take_string(&mut table, "name").unwrap_or_else(|| id.clone());
    let base_url = take_string(&mut table, "base_url").unwrap_or_default();
    let wire_api = take_string(&mut table, "wire_api")
        .and_then(|raw| match raw.parse() {
            Ok(api) => Some(api),
            Err(err) => {
                log::warn!("供应商 {id}: {err}，按 responses 处理");
                None
            }
        })
        .unwrap_or_default();
    let env_key = take_string(&mut table, "env_key").unwrap_or_default();
    let requires_openai_auth = match table.remove("requires_openai_auth") {
        Some(Value::Boolean(b)) => Some(b),
        Some(other) => {
            log::warn!("供应商 {id}: requires_openai_auth 应为布尔值，实际为 {other}");
            None
        }
        None => None,
    };

    CodexProvider {
        id,
        name,
        base_url,
        wire_api,
        env_key,
        requires_openai_auth,
        extra,
    }
}

fn mcp_service_from_table(id: String, table: Table) -> CodexMcpService {
    let (mut table, extra) = partition_known(table, MCP_KEYS);
    let command = take_string(&mut table, "command").unwrap_or_default();
    let args = match table.remove("args") {
        Some(Value::Array(items)) => Some(items.iter().map(value_to_plain_string).collect()),
        Some(other) => {
            log::warn!("MCP 服务 {id}: args 应为数组，实际为 {other}");
            None
        }
        None => None,
    };
    let env = match table.remove("env") {
        Some(Value::Table(vars)) => Some(
            vars.iter()
                .map(|(k, v)| (k.clone(), value_to_plain_string(v)))
                .collect::<IndexMap<_, _>>(),
        ),
        Some(other) => {
            log::warn!("MCP 服务 {id}: env 应为表，实际为 {other}");
            None
        }
        None => None,
    };
    let startup_timeout_ms = match table.remove("startup_timeout_ms") {
        Some(Value::Integer(n)) => u64::try_from(n).ok(),
        Some(other) => {
            log::warn!("MCP 服务 {id}: startup_timeout_ms 应为整数，实际为 {other}");
            None
        }
        None => None,
    };

    CodexMcpService {
        id,
        command,
        args,
        env,
        startup_timeout_ms,
        extra,
    }
}

fn merge_table(dst: &mut Table, src: Table) {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_table(existing, incoming)
            }
            (_, value) => {
                dst.insert(key, value);
            }
        }
    }
}

fn insert_nested(dst: &mut Table, path: &[String], table: Table) {
    let Some((head, rest)) = path.split_first() else {
        merge_table(dst, table);
        return;
    };
    let slot = dst
        .entry(head.clone())
        .or_insert_with(|| Value::Table(Table::new()));
    if !slot.is_table() {
        *slot = Value::Table(Table::new());
    }
    if let Value::Table(inner) = slot {
        insert_nested(inner, rest, table);
    }
}
