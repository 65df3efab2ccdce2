use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::{Identity, Message};

/// Summary of the most recent exchange with one counterpart.
///
/// Derived on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub counterpart: Identity,
    pub last_message_content: String,
    pub last_message_timestamp: DateTime<Utc>,
}

impl Conversation {
    fn from_message(counterpart: Identity, message: &Message) -> Self {
        Self {
            counterpart,
            last_message_content: message.content.clone(),
            last_message_timestamp: message.created_at,
        }
    }

    /// Collapse a viewer's history into one summary per counterpart.
    ///
    /// `newest_first` must be ordered by `created_at` descending: the first
    /// message seen for a counterpart is its latest, later ones are skipped.
    /// Output keeps first-seen order.
    pub fn aggregate<'a, I>(viewer: &Identity, newest_first: I) -> Vec<Conversation>
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let mut seen: HashSet<&Identity> = HashSet::new();
        let mut conversations = Vec::new();

        for message in newest_first {
            let counterpart = message.counterpart(viewer);
            if seen.insert(counterpart) {
                conversations.push(Conversation::from_message(counterpart.clone(), message));
            }
        }

        conversations
    }

    /// Home-list label for the last message time, relative to `now`.
    pub fn timestamp_label(&self, now: DateTime<Utc>) -> String {
        relative_day_label(self.last_message_timestamp, now)
    }
}

/// `Today`, `Yesterday`, a weekday name within the last week, else `MM/DD/YYYY`.
///
/// Days are whole 24h periods elapsed, not calendar boundaries. Weekday and
/// date are those of the local time zone.
pub fn relative_day_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    relative_day_label_in(at, now, &Local)
}

/// [`relative_day_label`] with weekday and date taken in `tz`
pub fn relative_day_label_in<Tz>(at: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let days = now.signed_duration_since(at).num_milliseconds().div_euclid(86_400_000);
    let local = at.with_timezone(tz);

    match days {
        i64::MIN..=0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => weekday_name(local.weekday()).to_string(),
        _ => local.format("%m/%d/%Y").to_string(),
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
