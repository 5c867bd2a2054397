use std::fmt;

use super::types::Message;

impl fmt::Display for Message {
    /// Serialize back to `type:id:endpoint:data`.
    ///
    /// `id` and `endpoint` always get their colon, empty or not; `data`'s
    /// leading colon is omitted entirely when there's no data, matching the
    /// wire-level examples throughout the frame grammar (a bare heartbeat is
    /// `2::`, not `2:::`). This is the exact inverse of
    /// [`std::str::FromStr::from_str`] for any `Message` it produces, since
    /// the parser already treats a missing fourth field the same as an
    /// empty one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.message_type.as_digit() as char,
            self.id,
            self.endpoint,
        )?;
        if !self.data.is_empty() {
            write!(f, ":{}", self.data)?;
        }
        Ok(())
    }
}
