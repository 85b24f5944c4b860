//! 构建环境变量展开（`$VAR` / `${VAR}`）
//!
//! 未定义的变量原样保留，`$$` 表示字面量 `$`。

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_.]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("variable pattern must compile")
    })
}

pub fn expand_variables(value: &str, env: &BTreeMap<String, String>) -> String {
    if !value.contains('$') {
        return value.to_string();
    }

    variable_regex()
        .replace_all(value, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2));
            match name {
                Some(name) => env
                    .get(name.as_str())
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string()),
                None => "$".to_string(),
            }
        })
        .into_owned()
}
