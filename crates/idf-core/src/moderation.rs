//! Group moderation: argument parsing and result messages.

use std::{sync::OnceLock, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;

use crate::formatting::escape_html;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationAction {
    Mute,
    Unmute,
    Kick,
    Ban,
    Unban,
}

impl ModerationAction {
    pub fn from_command(cmd: &str) -> Option<Self> {
        match cmd {
            "mute" => Some(Self::Mute),
            "unmute" => Some(Self::Unmute),
            "kick" => Some(Self::Kick),
            "ban" => Some(Self::Ban),
            "unban" => Some(Self::Unban),
            _ => None,
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Kick => "kick",
            Self::Ban => "ban",
            Self::Unban => "unban",
        }
    }

    /// Actions that must never target an administrator.
    pub fn protects_admins(self) -> bool {
        matches!(self, Self::Mute | Self::Kick | Self::Ban)
    }

    /// Whether a target with the given chat-member status is off limits.
    pub fn refuses_target(self, target_status: Option<&str>) -> bool {
        self.protects_admins() && target_status.is_some_and(is_privileged_status)
    }

    pub fn usage(self) -> String {
        let cmd = self.command();
        let head = "❌ Please reply to a user's message or pass their numeric ID.";
        if self == Self::Mute {
            return format!(
                "{head}\nUsage: <code>/mute 123456789 [time]</code> or reply to a message with \
                 <code>/mute [time]</code>\nTime examples: 10m, 2h, 1d"
            );
        }
        format!(
            "{head}\nUsage: <code>/{cmd} 123456789</code> or reply to a message with <code>/{cmd}</code>"
        )
    }

    pub fn protected_admin_message(self) -> String {
        format!("❌ Cannot {} group administrators.", self.command())
    }

    pub fn failure_message(self, detail: &str) -> String {
        format!(
            "❌ Failed to {} user: {}",
            self.command(),
            escape_html(detail)
        )
    }
}

pub const ADMIN_ONLY: &str = "❌ This command is only available to group administrators.";
pub const BOT_NOT_ADMIN: &str = "❌ I need to be a group administrator to do that.";

/// `creator` and `administrator` may moderate.
pub fn is_privileged_status(status: &str) -> bool {
    matches!(status, "creator" | "administrator")
}

/// Parsed `/cmd` arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModerationArgs {
    pub target_id: Option<i64>,
    pub duration: Option<String>,
}

/// When replying, every argument is about the action (`/mute 2h`); otherwise the
/// first argument names the target (`/mute 12345 2h`).
pub fn parse_args(args: &str, has_reply: bool) -> ModerationArgs {
    let mut words = args.split_whitespace();
    if has_reply {
        return ModerationArgs {
            target_id: None,
            duration: words.next().map(str::to_string),
        };
    }

    let target_id = words.next().and_then(|w| w.parse::<i64>().ok());
    ModerationArgs {
        target_id,
        duration: words.next().map(str::to_string),
    }
}

/// The user an action applies to: the replied-to sender wins, otherwise the
/// first argument if it is a positive numeric id.
pub fn select_target(reply_user: Option<i64>, args: &str) -> Option<i64> {
    if reply_user.is_some() {
        return reply_user;
    }
    parse_args(args, false).target_id.filter(|id| *id > 0)
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([mhd])$").expect("valid regex"))
}

/// Parse `10m`, `2h`, `1d`; anything else falls back to `default`.
pub fn parse_duration(raw: Option<&str>, default: Duration) -> Duration {
    let Some(raw) = raw else {
        return default;
    };
    let raw = raw.trim().to_lowercase();
    let Some(caps) = duration_re().captures(&raw) else {
        return default;
    };

    let Ok(amount) = caps[1].parse::<u64>() else {
        return default;
    };
    let unit_secs = match &caps[2] {
        "m" => 60,
        "h" => 3600,
        _ => 86_400,
    };
    match amount.checked_mul(unit_secs) {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        _ => default,
    }
}

/// Compact label such as `1d 2h`, `90m` → `1h 30m`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (mins, "m")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{n}{unit}"))
        .collect();
    if parts.is_empty() {
        return "0m".to_string();
    }
    parts.join(" ")
}

/// The user an action is applied to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub user_id: i64,
    pub name: String,
}

/// A mute's length, rendered into the confirmation.
#[derive(Clone, Copy, Debug)]
pub struct MuteWindow {
    pub duration: Duration,
    pub until: DateTime<Utc>,
}

impl MuteWindow {
    /// Mute length from the raw argument (or `default`), ending `now + duration`.
    /// `None` when the end date does not fit the calendar.
    pub fn starting_at(raw: Option<&str>, default: Duration, now: DateTime<Utc>) -> Option<Self> {
        let duration = parse_duration(raw, default);
        let until = TimeDelta::from_std(duration)
            .ok()
            .and_then(|d| now.checked_add_signed(d))?;
        Some(Self { duration, until })
    }
}

pub fn format_pinned(admin_name: &str) -> String {
    format!(
        "📌 <b>Message Pinned</b>\n\n✅ The replied message has been pinned to the group.\n\
         🛡️ <b>Admin:</b> {}",
        escape_html(admin_name)
    )
}

pub const PIN_USAGE: &str = "❌ Please reply to a message to pin it.\n\
    Usage: Reply to any message and send <code>/pin</code>";

pub fn format_done(
    action: ModerationAction,
    target: &Target,
    admin_name: &str,
    mute: Option<MuteWindow>,
) -> String {
    let mention = format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        target.user_id,
        escape_html(&target.name)
    );
    let (heading, status) = match action {
        ModerationAction::Mute => ("🔇 <b>User Muted</b>", String::new()),
        ModerationAction::Unmute => (
            "🔊 <b>User Unmuted</b>",
            "✅ <b>Status:</b> Can now send messages".to_string(),
        ),
        ModerationAction::Kick => (
            "👢 <b>User Kicked</b>",
            "✅ <b>Status:</b> Removed from group (can rejoin)".to_string(),
        ),
        ModerationAction::Ban => (
            "🚫 <b>User Banned</b>",
            "❌ <b>Status:</b> Permanently banned from group".to_string(),
        ),
        ModerationAction::Unban => (
            "✅ <b>User Unbanned</b>",
            "🔓 <b>Status:</b> Can now rejoin the group".to_string(),
        ),
    };

    let mut lines = vec![heading.to_string(), String::new(), format!("👤 <b>User:</b> {mention}")];
    if let Some(w) = mute {
        lines.push(format!("⏰ <b>Duration:</b> {}", format_duration(w.duration)));
        lines.push(format!(
            "📅 <b>Until:</b> {} UTC",
            w.until.format("%Y-%m-%d %H:%M")
        ));
    }
    if !status.is_empty() {
        lines.push(status);
    }
    lines.push(String::new());
    lines.push(format!("🛡️ <b>Admin:</b> {}", escape_html(admin_name)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration(Some("10m"), HOUR), Duration::from_secs(600));
        assert_eq!(parse_duration(Some("2H"), HOUR), Duration::from_secs(7200));
        assert_eq!(parse_duration(Some(" 1d "), HOUR), Duration::from_secs(86_400));
    }

    #[test]
    fn malformed_durations_fall_back() {
        for raw in ["", "10", "m", "1w", "1.5h", "-1h", "0m", "99999999999999999999d"] {
            assert_eq!(parse_duration(Some(raw), HOUR), HOUR, "input {raw:?}");
        }
        assert_eq!(parse_duration(None, HOUR), HOUR);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_secs(600)), "10m");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
        assert_eq!(format_duration(Duration::from_secs(93_600)), "1d 2h");
        assert_eq!(format_duration(Duration::from_secs(5)), "0m");
    }

    #[test]
    fn args_depend_on_reply() {
        assert_eq!(
            parse_args("2h", true),
            ModerationArgs {
                target_id: None,
                duration: Some("2h".to_string())
            }
        );
        assert_eq!(
            parse_args("12345 2h", false),
            ModerationArgs {
                target_id: Some(12345),
                duration: Some("2h".to_string())
            }
        );
        assert_eq!(parse_args("@someone", false).target_id, None);
        assert_eq!(parse_args("", false), ModerationArgs::default());
    }

    #[test]
    fn reply_beats_numeric_argument() {
        assert_eq!(select_target(Some(7), "12345 2h"), Some(7));
        assert_eq!(select_target(Some(7), ""), Some(7));
        assert_eq!(select_target(None, "12345 2h"), Some(12345));
    }

    #[test]
    fn rejects_negative_and_non_numeric_targets() {
        assert_eq!(select_target(None, "-100123"), None);
        assert_eq!(select_target(None, "0"), None);
        assert_eq!(select_target(None, "@mallory"), None);
        assert_eq!(select_target(None, "abc 12345"), None);
        assert_eq!(select_target(None, ""), None);
    }

    #[test]
    fn admins_are_protected_from_punitive_actions() {
        for action in [ModerationAction::Mute, ModerationAction::Kick, ModerationAction::Ban] {
            assert!(action.refuses_target(Some("administrator")));
            assert!(action.refuses_target(Some("creator")));
            assert!(!action.refuses_target(Some("member")));
            assert!(!action.refuses_target(None));
        }
        assert!(!ModerationAction::Unmute.refuses_target(Some("administrator")));
        assert!(!ModerationAction::Unban.refuses_target(Some("creator")));
    }

    #[test]
    fn mute_window_uses_the_parsed_duration() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        let w = MuteWindow::starting_at(Some("2h"), HOUR, now).unwrap();
        assert_eq!(w.duration, Duration::from_secs(7200));
        assert_eq!(w.until, Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap());

        let w = MuteWindow::starting_at(Some("soon"), HOUR, now).unwrap();
        assert_eq!(w.duration, HOUR);
        assert_eq!(w.until, Utc.with_ymd_and_hms(2026, 10, 19, 13, 0, 0).unwrap());
    }

    #[test]
    fn mute_window_past_the_calendar_is_none() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert!(MuteWindow::starting_at(Some("999999999999d"), HOUR, now).is_none());
    }

    #[test]
    fn pin_confirmation_escapes_admin() {
        assert_eq!(
            format_pinned("A<B"),
            "📌 <b>Message Pinned</b>\n\n✅ The replied message has been pinned to the group.\n\
             🛡️ <b>Admin:</b> A&lt;B"
        );
    }

    #[test]
    fn commands_round_trip() {
        for cmd in ["mute", "unmute", "kick", "ban", "unban"] {
            assert_eq!(ModerationAction::from_command(cmd).unwrap().command(), cmd);
        }
        assert_eq!(ModerationAction::from_command("pin"), None);
        assert!(ModerationAction::Ban.protects_admins());
        assert!(!ModerationAction::Unban.protects_admins());
    }

    #[test]
    fn privileged_statuses() {
        assert!(is_privileged_status("creator"));
        assert!(is_privileged_status("administrator"));
        assert!(!is_privileged_status("member"));
        assert!(!is_privileged_status("restricted"));
    }

    #[test]
    fn mute_confirmation() {
        let until = Utc.with_ymd_and_hms(2026, 10, 19, 12, 30, 0).unwrap();
        let out = format_done(
            ModerationAction::Mute,
            &Target {
                user_id: 7,
                name: "Eve <3".to_string(),
            },
            "Admin",
            Some(MuteWindow {
                duration: HOUR,
                until,
            }),
        );
        assert_eq!(
            out,
            "🔇 <b>User Muted</b>\n\n\
             👤 <b>User:</b> <a href=\"tg://user?id=7\">Eve &lt;3</a>\n\
             ⏰ <b>Duration:</b> 1h\n\
             📅 <b>Until:</b> 2026-10-19 12:30 UTC\n\n\
             🛡️ <b>Admin:</b> Admin"
        );
    }

    #[test]
    fn ban_confirmation_has_status_line() {
        let out = format_done(
            ModerationAction::Ban,
            &Target {
                user_id: 9,
                name: "Mallory".to_string(),
            },
            "Root",
            None,
        );
        assert!(out.contains("❌ <b>Status:</b> Permanently banned from group"));
        assert!(out.ends_with("🛡️ <b>Admin:</b> Root"));
    }
}
