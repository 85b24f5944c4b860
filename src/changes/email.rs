//! 提交作者邮箱识别
//!
//! 匹配规则刻意宽松：地址是否真实有效由聊天服务端判断，这里只负责
//! 找出“看起来像邮箱”的片段。git 把邮箱放在 author id 里，
//! mercurial 把邮箱留在显示名里（`Jane Doe <jane@example.com>`），
//! svn 通常两者都没有。

use regex::Regex;
use std::sync::OnceLock;

use super::ChangeAuthor;

const EMAIL_PATTERN: &str = r"<?\s*(?P<email>[\w!#$%&'*+/=?^`{|}~-]+(?:\.[\w!#$%&'*+/=?^`{|}~-]+)*@(?P<domain>(?:[\w-]+\.)*[\w-]+))\s*>?";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern must compile"))
}

/// 从任意文本中提取第一个邮箱形状的片段
///
/// 域名不能以 `-` 开头；命中这种片段时从下一个字符重新匹配，
/// 所以 `foo@-bar@baz.com` 得到 `-bar@baz.com`。
pub fn extract_email(text: &str) -> Option<String> {
    let re = email_regex();
    let mut start = 0;
    while let Some(caps) = re.captures_at(text, start) {
        let domain_ok = caps
            .name("domain")
            .map(|d| !d.as_str().starts_with('-'))
            .unwrap_or(false);
        if domain_ok {
            return caps.name("email").map(|m| m.as_str().to_string());
        }
        let matched = caps.get(0)?;
        start = matched.start()
            + text[matched.start()..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    None
}

/// 解析作者邮箱：优先 author id，其次显示名，都没有则返回 None
pub fn resolve_author_email(author: &ChangeAuthor) -> Option<String> {
    author
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .and_then(extract_email)
        .or_else(|| extract_email(&author.display_name))
        .map(|email| email.to_lowercase())
}
