use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("no time slot selected")]
    Empty,
    #[error("'{0}' is not an offered time slot")]
    NotOffered(String),
    #[error("'{0}' is not a valid time")]
    Malformed(String),
}

/// Half-hour test-drive slot, persisted as the appointment date combined with
/// the slot in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot {
    hour: u8,
    minute: u8,
}

const fn slot(hour: u8, minute: u8) -> TimeSlot {
    TimeSlot { hour, minute }
}

/// Morning 08:30–11:30 and afternoon 13:30–17:30.
pub const SLOTS: [TimeSlot; 16] = [
    slot(8, 30),
    slot(9, 0),
    slot(9, 30),
    slot(10, 0),
    slot(10, 30),
    slot(11, 0),
    slot(11, 30),
    slot(13, 30),
    slot(14, 0),
    slot(14, 30),
    slot(15, 0),
    slot(15, 30),
    slot(16, 0),
    slot(16, 30),
    slot(17, 0),
    slot(17, 30),
];

impl TimeSlot {
    pub fn all() -> &'static [TimeSlot] {
        &SLOTS
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    fn offered(hour: u32, minute: u32) -> Option<TimeSlot> {
        SLOTS
            .iter()
            .copied()
            .find(|s| u32::from(s.hour) == hour && u32::from(s.minute) == minute)
    }

    /// Parses a 24-hour `"HH:MM"` selection.
    pub fn parse(value: &str) -> Result<TimeSlot, SlotError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SlotError::Empty);
        }
        let time = NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|_| SlotError::Malformed(value.to_string()))?;
        Self::offered(time.hour(), time.minute())
            .ok_or_else(|| SlotError::NotOffered(value.to_string()))
    }

    /// Parses a display label such as `"1:30 PM"` or `"08:30 AM"`.
    pub fn parse_label(label: &str) -> Result<TimeSlot, SlotError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SlotError::Empty);
        }
        let (clock, meridiem) = label
            .rsplit_once(' ')
            .ok_or_else(|| SlotError::Malformed(label.to_string()))?;
        let (h, m) = clock
            .split_once(':')
            .ok_or_else(|| SlotError::Malformed(label.to_string()))?;
        let hour12: u32 = h.parse().map_err(|_| SlotError::Malformed(label.to_string()))?;
        let minute: u32 = m.parse().map_err(|_| SlotError::Malformed(label.to_string()))?;
        if !(1..=12).contains(&hour12) || minute > 59 {
            return Err(SlotError::Malformed(label.to_string()));
        }
        let hour = match meridiem.to_ascii_uppercase().as_str() {
            "AM" => hour12 % 12,
            "PM" => hour12 % 12 + 12,
            _ => return Err(SlotError::Malformed(label.to_string())),
        };
        Self::offered(hour, minute).ok_or_else(|| SlotError::NotOffered(label.to_string()))
    }

    /// The 12-hour label sent with storefront bookings.
    pub fn label(&self) -> String {
        twelve_hour_label(u32::from(self.hour), u32::from(self.minute))
    }

    pub fn naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Re-selects the slot a stored instant falls on, in local time.
    pub fn from_instant(instant: DateTime<Utc>) -> Option<TimeSlot> {
        let local = instant.with_timezone(&Local);
        Self::offered(local.hour(), local.minute())
    }

    /// Combines `date` with this slot into the stored instant.
    pub fn on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        local_instant(date, self.naive_time())
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// `hour < 12` is AM; the displayed hour is `hour % 12` with 0 shown as 12.
pub fn twelve_hour_label(hour: u32, minute: u32) -> String {
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display, minute, meridiem)
}

/// Resolves a local wall-clock time to an instant. On a DST fold the earlier
/// instant wins; a time skipped by a DST gap has no instant.
pub fn local_instant(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The instant of local midnight on `date`.
pub fn local_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    local_instant(date, NaiveTime::MIN)
}
