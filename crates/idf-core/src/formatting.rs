//! Telegram HTML responses.

use crate::{
    entity::{EntityId, EntityRecord},
    resolve::ResolutionError,
};

pub const COULD_NOT_EXTRACT: &str =
    "❌ Could not extract entity info. Please forward a valid message or send a valid username/link.";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Anything the resolver can hand to the formatter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Entity(EntityRecord),
    Unresolved(ResolutionError),
    Unextracted,
}

impl From<Option<EntityRecord>> for Outcome {
    fn from(v: Option<EntityRecord>) -> Self {
        match v {
            Some(rec) => Outcome::Entity(rec),
            None => Outcome::Unextracted,
        }
    }
}

impl From<Result<EntityRecord, ResolutionError>> for Outcome {
    fn from(v: Result<EntityRecord, ResolutionError>) -> Self {
        match v {
            Ok(rec) => Outcome::Entity(rec),
            Err(e) => Outcome::Unresolved(e),
        }
    }
}

pub fn format_response(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Entity(rec) => format_entity(rec),
        Outcome::Unresolved(err) => format_resolution_error(err),
        Outcome::Unextracted => COULD_NOT_EXTRACT.to_string(),
    }
}

// Line order is relied on by existing consumers.
fn format_entity(rec: &EntityRecord) -> String {
    let mut lines = vec![
        format!("✅ <b>Entity Detected:</b> {}", escape_html(rec.kind.label())),
        format!("🔗 <b>Name/Title:</b> {}", escape_html(&rec.display_name)),
    ];

    if let EntityId::Numeric(id) = rec.id {
        lines.push(format!("🆔 <b>ID:</b> <code>{id}</code>"));
    }
    if let Some(username) = rec.username.as_deref().filter(|u| !u.is_empty()) {
        lines.push(format!("📎 <b>Username:</b> @{}", escape_html(username)));
    }
    if let Some(verified) = rec.verified {
        let yes_no = if verified { "Yes" } else { "No" };
        lines.push(format!("✅ <b>Verified:</b> {yes_no}"));
    }
    if let Some(story_id) = rec.story_id {
        lines.push(format!("📱 <b>Story ID:</b> <code>{story_id}</code>"));
    }

    lines.join("\n")
}

fn format_resolution_error(err: &ResolutionError) -> String {
    format!(
        "❌ <b>{}</b>\n\n<b>Reason:</b> {}\n\n<b>Explanation:</b> {}",
        escape_html(&err.message),
        escape_html(&err.reason),
        escape_html(&err.explanation)
    )
}

/// A person's id card, used by `/id` and `/whois`.
pub fn format_user_card(
    heading: &str,
    id: i64,
    first_name: &str,
    last_name: Option<&str>,
    username: Option<&str>,
) -> String {
    let mut out = format!(
        "{heading}\n\n🆔 <b>ID:</b> <code>{id}</code>\n👤 <b>Name:</b> {}",
        escape_html(first_name)
    );
    if let Some(last) = last_name.filter(|s| !s.is_empty()) {
        out.push(' ');
        out.push_str(&escape_html(last));
    }
    if let Some(username) = username.filter(|s| !s.is_empty()) {
        out.push_str(&format!("\n📎 <b>Username:</b> @{}", escape_html(username)));
    }
    out
}

/// The current group's id card (`/ids`).
pub fn format_group_card(id: i64, title: Option<&str>, username: Option<&str>) -> String {
    let mut out = format!(
        "👥 <b>Group Information</b>\n\n🆔 <b>Group ID:</b> <code>{id}</code>\n📝 <b>Title:</b> {}",
        escape_html(title.unwrap_or("Unknown"))
    );
    if let Some(username) = username.filter(|s| !s.is_empty()) {
        out.push_str(&format!("\n📎 <b>Username:</b> @{}", escape_html(username)));
    }
    out
}

/// Membership status line for `/whois`.
pub fn format_member_status(status: &str) -> String {
    let emoji = match status {
        "creator" => "👑",
        "administrator" => "🛡️",
        "member" => "👤",
        "restricted" => "🚫",
        "left" => "🚪",
        "kicked" => "❌",
        _ => "❓",
    };
    format!("🏷️ <b>Status:</b> {emoji} {}", escape_html(&title_case(status)))
}

/// Clickable mention by numeric id.
pub fn format_mention(id: i64, name: &str) -> String {
    format!(
        "🔗 <a href=\"tg://user?id={id}\">{}</a>\n🆔 <b>ID:</b> <code>{id}</code>",
        escape_html(name)
    )
}

/// One row of `/listadmins`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminEntry {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_bot: bool,
    pub is_creator: bool,
}

/// Creator first, then numbered administrators, then the total.
pub fn format_admin_roster(admins: &[AdminEntry]) -> String {
    let mut out = String::from("🛡️ <b>Group Administrators</b>\n\n");

    let (creators, others): (Vec<&AdminEntry>, Vec<&AdminEntry>) =
        admins.iter().partition(|a| a.is_creator);

    if !creators.is_empty() {
        out.push_str("👑 <b>Group Creator:</b>\n");
        for c in &creators {
            out.push_str(&admin_line(c));
            out.push_str("\n\n");
        }
    }
    if !others.is_empty() {
        out.push_str(&format!("🛡️ <b>Administrators ({}):</b>\n", others.len()));
        for (i, a) in others.iter().enumerate() {
            out.push_str(&format!("<b>{}.</b> {}\n\n", i + 1, admin_line(a)));
        }
    }
    out.push_str(&format!("📊 <b>Total:</b> {} administrators", admins.len()));
    out
}

fn admin_line(a: &AdminEntry) -> String {
    let mut line = format!("👤 {}", escape_html(&a.first_name));
    if let Some(last) = a.last_name.as_deref().filter(|s| !s.is_empty()) {
        line.push(' ');
        line.push_str(&escape_html(last));
    }
    if let Some(username) = a.username.as_deref().filter(|s| !s.is_empty()) {
        line.push_str(&format!(" (@{})", escape_html(username)));
    }
    line.push_str(&format!("\n   🆔 <code>{}</code>", a.id));
    if a.is_bot {
        line.push_str(" 🤖");
    }
    line
}

/// Input for `/groupinfo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupStats {
    pub id: i64,
    pub title: Option<String>,
    pub username: Option<String>,
    pub description: Option<String>,
    pub supergroup: bool,
    pub member_count: u32,
    pub admin_count: usize,
}

const DESCRIPTION_LIMIT: usize = 100;

pub fn format_group_stats(g: &GroupStats) -> String {
    let mut out = format!(
        "📊 <b>Group Information</b>\n\n📝 <b>Title:</b> {}\n🆔 <b>ID:</b> <code>{}</code>\n",
        escape_html(g.title.as_deref().unwrap_or("Unknown")),
        g.id
    );
    if let Some(username) = g.username.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("📎 <b>Username:</b> @{}\n", escape_html(username)));
    }
    if let Some(desc) = g.description.as_deref().filter(|s| !s.is_empty()) {
        let mut short: String = desc.chars().take(DESCRIPTION_LIMIT).collect();
        if desc.chars().count() > DESCRIPTION_LIMIT {
            short.push_str("...");
        }
        out.push_str(&format!("📄 <b>Description:</b> {}\n", escape_html(&short)));
    }
    let kind = if g.supergroup { "Supergroup" } else { "Group" };
    out.push_str(&format!(
        "\n👥 <b>Members:</b> {}\n🛡️ <b>Administrators:</b> {}\n📅 <b>Type:</b> {kind}",
        group_digits(u64::from(g.member_count)),
        g.admin_count
    ));
    out
}

/// `1234567` → `1,234,567`.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `/mem` answer: a member's card plus their chat-member status.
pub fn format_member_info(
    id: i64,
    first_name: &str,
    last_name: Option<&str>,
    username: Option<&str>,
    status: &str,
) -> String {
    let mut out = format!(
        "✅ <b>Member Information</b>\n\n👤 <b>Name:</b> {}",
        escape_html(first_name)
    );
    if let Some(last) = last_name.filter(|s| !s.is_empty()) {
        out.push(' ');
        out.push_str(&escape_html(last));
    }
    out.push_str(&format!("\n🆔 <b>User ID:</b> <code>{id}</code>"));
    if let Some(username) = username.filter(|s| !s.is_empty()) {
        out.push_str(&format!("\n📎 <b>Username:</b> @{}", escape_html(username)));
    }
    out.push_str(&format!("\n📊 <b>Status:</b> {}", escape_html(&title_case(status))));
    match status {
        "administrator" => out.push_str(" (Admin)"),
        "creator" => out.push_str(" (Owner)"),
        _ => {}
    }
    out
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
