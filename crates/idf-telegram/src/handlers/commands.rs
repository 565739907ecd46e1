use idf_core::formatting::escape_html;

/// A parsed `/cmd@botname args` message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Command {
    /// Lowercase command name without the slash.
    pub name: String,
    /// The `@botname` suffix, if any.
    pub mention: Option<String>,
    /// Everything after the command word, trimmed.
    pub args: String,
}

impl Command {
    /// Unaddressed commands are ours; addressed ones only when they name us.
    /// With our own username unknown, addressed commands are ignored.
    pub fn is_for(&self, bot_username: Option<&str>) -> bool {
        match (self.mention.as_deref(), bot_username) {
            (None, _) => true,
            (Some(mention), Some(me)) => mention.eq_ignore_ascii_case(me),
            (Some(_), None) => false,
        }
    }
}

pub(crate) fn parse_command(text: &str) -> Command {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let args = parts.next().unwrap_or("").trim().to_string();

    let mut word = first.trim_start_matches('/').splitn(2, '@');
    let name = word.next().unwrap_or("").to_lowercase();
    let mention = word.next().filter(|m| !m.is_empty()).map(str::to_string);

    Command {
        name,
        mention,
        args,
    }
}

pub(crate) fn welcome_text(first_name: &str) -> String {
    format!(
        "👋 <b>Welcome to ID Finder Pro Bot, {}!</b>\n\n\
         🔍 <b>What I Can Do:</b>\n\
         • Find Telegram IDs of users, groups, channels &amp; bots\n\
         • Extract IDs from forwarded messages &amp; stories\n\
         • Resolve @usernames and t.me links\n\n\
         🚀 <b>Quick Start:</b>\n\
         • <b>Forward any message</b> to get the sender's ID\n\
         • <b>Forward stories</b> to get the poster's ID\n\
         • <b>Share a contact</b> to get that user's ID\n\
         • Type <b>/id</b> to get your own ID\n\
         • Type <b>/help</b> for all commands\n\n\
         🛡️ <b>Group Features:</b>\n\
         Add me to your groups for ID commands and admin tools.",
        escape_html(first_name)
    )
}

pub(crate) const HELP_TEXT: &str = "🔍 <b>ID Finder Pro Bot - Help</b>\n\n\
    👤 <b>Private chat</b>\n\
    /id - your own ID\n\
    /username [name] - ID of a @username or t.me link\n\
    /find [id] - look up a numeric ID\n\
    Forward a message or story, share a contact, or just send a username.\n\n\
    👥 <b>Groups</b>\n\
    /id - your ID\n\
    /ids - this group's ID\n\
    /find [id] - look up a numeric ID\n\
    /whois - info about the replied-to user\n\
    /mentionid - clickable mention of the replied-to user\n\n\
    🛡️ <b>Group admins</b>\n\
    /mute [10m|2h|1d], /unmute, /kick, /ban, /unban\n\
    Reply to a message or pass a numeric user ID.\n\
    /mem [id|@username] - member info and status\n\
    /pin - pin the replied-to message\n\
    /groupinfo - title, ID, member and admin counts\n\
    /listadmins - administrators with their IDs\n\n\
    💡 <b>Inline:</b> type <code>@botname username</code> in any chat.";

pub(crate) const USERNAME_PROMPT: &str = "🔍 <b>Username Lookup</b>\n\n\
    Please enter a username to get its ID.\n\n\
    📋 <b>Supported formats:</b>\n\
    • @username (for users, bots, channels, groups)\n\
    • username (without @)\n\
    • t.me/username links\n\n\
    Just type the username below:";

pub(crate) const FIND_USAGE: &str = "🔍 <b>Find by ID</b>\n\n\
    Usage: <code>/find [user_id]</code>\n\n\
    Example: <code>/find 123456789</code>";

pub(crate) const INVALID_ID: &str =
    "❌ Invalid user ID. Please provide a valid numeric Telegram ID.";

pub(crate) const FORWARD_HINT: &str =
    "Please forward a message from a user, channel, group, or bot to get its ID.\n\n\
     You can also use the /id command to get your own ID.";

pub(crate) const GROUP_ONLY: &str = "❌ This command only works in groups.";
