//! File naming rules.
//!
//! Every picture is stored under a canonical name of the form
//! `IMG_yyyyMMdd_HHmmss.jpg` or `VID_yyyyMMdd_HHmmss.mkv`, optionally
//! followed by a ` (N)` duplicate index before the extension. Pictures taken
//! by older versions of the camera used other schemes, which are rewritten
//! ("regulated") into the canonical form when they are migrated:
//!
//! | Stored name                    | Regulated name                  |
//! |--------------------------------|---------------------------------|
//! | `IMG_20240101_120000_2.jpg`    | `IMG_20240101_120000 (2).jpg`   |
//! | `VID_20240101_120000.webm`     | `VID_20240101_120000.mkv`       |
//! | `1234567890123.jpg`            | `IMG_19700523_212118.jpg`       |
//!
//! All functions here are pure string manipulation; none of them touch
//! storage.

use regex::Regex;
use shutter_media::MediaKind;
use std::sync::LazyLock;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub const IMAGE_PREFIX: &str = "IMG_";
pub const VIDEO_PREFIX: &str = "VID_";
pub const THUMBNAIL_PREFIX: &str = "thumb-";

const IMAGE_EXTENSION: &str = ".jpg";
const VIDEO_EXTENSION: &str = ".mkv";
const LEGACY_VIDEO_EXTENSION: &str = ".webm";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Prefixed names, with the duplicate index written `_N` by older versions.
regex!(PREFIXED_REGEX, r"(\w{3}_\d{8}_\d{6})(?:_(\d+))?(\..+)?$");
// Earliest pictures were named after their capture time in milliseconds.
regex!(LEGACY_REGEX, r"(\d+).(?:\d+)");
regex!(TIMESTAMP_REGEX, r"_(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})(?: \((\d+)\))?");
regex!(TIMESTAMPED_REGEX, r"_(\d{8})_(\d{6})(?: \((\d+)\))?");
regex!(SPLIT_EXTENSION_REGEX, r"^([^.]+)(\..+)?$");
regex!(DUPLICATE_INDEX_REGEX, r" \((\d+)\)$");

/// Time zone in which timestamps embedded in names are written and read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeZone {
    /// The system time zone. The offset is looked up for every instant, so
    /// names follow daylight saving changes. Platforms that cannot report
    /// their offset (for example a multi-threaded process on some Unixes)
    /// fall back to UTC.
    #[default]
    Local,
    Fixed(UtcOffset),
}
impl TimeZone {
    pub const UTC: Self = Self::Fixed(UtcOffset::UTC);

    /// Offset in effect at `instant`.
    pub fn offset_at(self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Self::Local => UtcOffset::local_offset_at(instant).unwrap_or(UtcOffset::UTC),
            Self::Fixed(offset) => offset,
        }
    }

    /// Offset in effect at a wall-clock time. Ambiguous wall-clock times
    /// (around daylight saving transitions) resolve to the offset of the
    /// same reading taken as UTC.
    fn offset_of_wall_clock(self, wall: PrimitiveDateTime) -> UtcOffset {
        self.offset_at(wall.assume_utc())
    }
}
impl From<shutter_config::TimeZone> for TimeZone {
    fn from(zone: shutter_config::TimeZone) -> Self {
        match zone {
            shutter_config::TimeZone::Local => Self::Local,
            shutter_config::TimeZone::Utc => Self::UTC,
        }
    }
}

/// Classification of a stored file by its name prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Thumbnail,
    /// Anything else; legacy pictures in the internal store look like this.
    Other,
}
impl FileKind {
    pub fn of(name: &str) -> Self {
        if name.starts_with(IMAGE_PREFIX) {
            Self::Image
        } else if name.starts_with(VIDEO_PREFIX) {
            Self::Video
        } else if name.starts_with(THUMBNAIL_PREFIX) {
            Self::Thumbnail
        } else {
            Self::Other
        }
    }

    pub fn is_thumbnail(self) -> bool {
        matches!(self, Self::Thumbnail)
    }

    /// `IMG_` or `VID_` prefixed.
    pub fn is_prefixed(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    /// Media kind of a primary file. Only the `VID_` prefix marks a video.
    pub fn media_kind(self) -> MediaKind {
        match self {
            Self::Video => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

/// Canonical name for a picture captured at `instant`.
pub fn generate_name(kind: MediaKind, instant: OffsetDateTime, zone: TimeZone) -> String {
    let (prefix, extension) = match kind {
        MediaKind::Image => (IMAGE_PREFIX, IMAGE_EXTENSION),
        MediaKind::Video => (VIDEO_PREFIX, VIDEO_EXTENSION),
    };
    let local = instant.checked_to_offset(zone.offset_at(instant)).unwrap_or(instant);
    format!(
        "{prefix}{:04}{:02}{:02}_{:02}{:02}{:02}{extension}",
        local.year(),
        u8::from(local.month()),
        local.day(),
        local.hour(),
        local.minute(),
        local.second(),
    )
}

/// Rewrite a legacy name into the canonical format. Names that are already
/// canonical, or that match no known scheme, are returned unchanged.
pub fn regulate_name(name: &str, zone: TimeZone) -> String {
    if FileKind::of(name).is_prefixed() {
        if let Some(captures) = PREFIXED_REGEX.captures(name) {
            let base = &captures[1];
            let extension = match captures.get(3).map(|m| m.as_str()) {
                Some(LEGACY_VIDEO_EXTENSION) => VIDEO_EXTENSION,
                Some(extension) => extension,
                None => "",
            };
            return match captures.get(2) {
                Some(index) => format!("{base} ({}){extension}", index.as_str()),
                None => format!("{base}{extension}"),
            };
        }
    } else if let Some(captures) = LEGACY_REGEX.captures(name) {
        // The captured integer is taken as milliseconds since the epoch,
        // whatever the original intent of the legacy scheme was.
        let instant = captures[1]
            .parse::<i128>()
            .ok()
            .and_then(|millis| OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok());
        if let Some(instant) = instant {
            return generate_name(MediaKind::Image, instant, zone);
        }
    }
    name.to_string()
}

/// Capture time encoded in a (possibly legacy) name.
///
/// The duplicate index, if any, is added as milliseconds so that duplicates
/// sort after the original. Calendar fields out of their usual range carry
/// over into the next larger unit (month 13 is January of the following
/// year, day 0 is the last day of the previous month). Names with no
/// recognisable timestamp yield the Unix epoch; this never fails.
pub fn parse_timestamp(name: &str, zone: TimeZone) -> OffsetDateTime {
    let regulated = regulate_name(name, zone);
    let Some(captures) = TIMESTAMP_REGEX.captures(&regulated) else {
        return OffsetDateTime::UNIX_EPOCH;
    };
    let field = |index: usize| captures.get(index).and_then(|m| m.as_str().parse::<i64>().ok());
    let wall_clock = || -> Option<PrimitiveDateTime> {
        let months = field(1)? * 12 + field(2)? - 1;
        let year = i32::try_from(months.div_euclid(12)).ok()?;
        let month = Month::try_from(u8::try_from(months.rem_euclid(12) + 1).ok()?).ok()?;
        let start = PrimitiveDateTime::new(Date::from_calendar_date(year, month, 1).ok()?, Time::MIDNIGHT);
        start.checked_add(
            Duration::days(field(3)? - 1)
                + Duration::hours(field(4)?)
                + Duration::minutes(field(5)?)
                + Duration::seconds(field(6)?),
        )
    };
    let Some(wall) = wall_clock() else {
        return OffsetDateTime::UNIX_EPOCH;
    };
    let duplicate = Duration::milliseconds(field(7).unwrap_or(0));
    wall.assume_offset(zone.offset_of_wall_clock(wall)) + duplicate
}

/// Whether a name carries a `_yyyyMMdd_HHmmss` timestamp.
pub fn is_timestamped(name: &str) -> bool {
    TIMESTAMPED_REGEX.is_match(name)
}

/// Next candidate name after `name` collided with an existing file:
/// `IMG_x.jpg` → `IMG_x (1).jpg` → `IMG_x (2).jpg`.
///
/// Names without an extension, or starting with a dot, are indexed as a
/// whole.
pub fn increment_name(name: &str) -> String {
    let (base, extension) = match SPLIT_EXTENSION_REGEX.captures(name) {
        Some(captures) => {
            let base = captures.get(1).map_or(name, |m| m.as_str());
            (base, captures.get(2).map_or("", |m| m.as_str()))
        },
        None => (name, ""),
    };
    let (base, index) = match DUPLICATE_INDEX_REGEX.captures(base) {
        Some(captures) => match (captures.get(0), captures[1].parse::<u64>()) {
            (Some(whole), Ok(index)) => (&base[..whole.start()], index),
            _ => (base, 0),
        },
        None => (base, 0),
    };
    format!("{base} ({}){extension}", index.saturating_add(1))
}

/// Name of the thumbnail belonging to the primary file `name`.
pub fn thumbnail_name(name: &str) -> String {
    let prefixed = format!("{THUMBNAIL_PREFIX}{name}");
    let stem = prefixed.rfind('.').map_or(prefixed.as_str(), |dot| &prefixed[..dot]);
    format!("{stem}{IMAGE_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::{datetime, offset};

    #[rstest]
    #[case(MediaKind::Image, datetime!(2024-03-05 07:08:09 UTC), "IMG_20240305_070809.jpg")]
    #[case(MediaKind::Video, datetime!(2024-12-31 23:59:59 UTC), "VID_20241231_235959.mkv")]
    #[case(MediaKind::Image, datetime!(1999-01-01 00:00:00.999 UTC), "IMG_19990101_000000.jpg")]
    fn test_generate_name_utc(#[case] kind: MediaKind, #[case] instant: OffsetDateTime, #[case] expected: &str) {
        assert_eq!(generate_name(kind, instant, TimeZone::UTC), expected);
    }

    #[test]
    fn test_generate_name_fixed_offset() {
        let zone = TimeZone::Fixed(offset!(+9));
        assert_eq!(
            generate_name(MediaKind::Image, datetime!(2024-03-05 20:00:00 UTC), zone),
            "IMG_20240306_050000.jpg"
        );
    }

    #[rstest]
    #[case("IMG_20240101_120000.jpg", "IMG_20240101_120000.jpg")]
    #[case("IMG_20240101_120000_2.jpg", "IMG_20240101_120000 (2).jpg")]
    #[case("VID_20240101_120000.webm", "VID_20240101_120000.mkv")]
    #[case("VID_20240101_120000_3.webm", "VID_20240101_120000 (3).mkv")]
    #[case("VID_20240101_120000.mkv", "VID_20240101_120000.mkv")]
    #[case("IMG_20240101_120000", "IMG_20240101_120000")]
    #[case("IMG_holiday.jpg", "IMG_holiday.jpg")]
    #[case("notes.txt", "notes.txt")]
    #[case("1234567890123.jpg", "IMG_19700523_212118.jpg")]
    #[case("99999999999999999999999999999999999999999.jpg", "99999999999999999999999999999999999999999.jpg")]
    fn test_regulate_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(regulate_name(name, TimeZone::UTC), expected);
    }

    #[test]
    fn test_legacy_integer_is_milliseconds() {
        // The pattern needs "<any><digits>" after the capture, so the last
        // two digits are split off and 12345678901 ms remains.
        let regulated = regulate_name("1234567890123.jpg", TimeZone::UTC);
        assert_eq!(
            parse_timestamp(&regulated, TimeZone::UTC),
            OffsetDateTime::UNIX_EPOCH + Duration::milliseconds(12_345_678_901) - Duration::milliseconds(901)
        );
    }

    #[rstest]
    #[case("IMG_20240101_120000.jpg", datetime!(2024-01-01 12:00:00 UTC))]
    #[case("IMG_20240101_120000 (3).jpg", datetime!(2024-01-01 12:00:00.003 UTC))]
    #[case("IMG_20240101_120000_3.jpg", datetime!(2024-01-01 12:00:00.003 UTC))]
    #[case("VID_20230615_083015.webm", datetime!(2023-06-15 08:30:15 UTC))]
    #[case("IMG_20241301_120000.jpg", datetime!(2025-01-01 12:00:00 UTC))]
    #[case("IMG_20240230_120000.jpg", datetime!(2024-03-01 12:00:00 UTC))]
    #[case("IMG_20240101_250000.jpg", datetime!(2024-01-02 01:00:00 UTC))]
    #[case("IMG_20240100_000000.jpg", datetime!(2023-12-31 00:00:00 UTC))]
    #[case("IMG_20240015_000000.jpg", datetime!(2023-12-15 00:00:00 UTC))]
    #[case("IMG_20240101_126161.jpg", datetime!(2024-01-01 13:02:01 UTC))]
    #[case("random.txt", OffsetDateTime::UNIX_EPOCH)]
    #[case("", OffsetDateTime::UNIX_EPOCH)]
    fn test_parse_timestamp(#[case] name: &str, #[case] expected: OffsetDateTime) {
        assert_eq!(parse_timestamp(name, TimeZone::UTC), expected);
    }

    #[test]
    fn test_parse_timestamp_fixed_offset() {
        let zone = TimeZone::Fixed(offset!(+2));
        assert_eq!(parse_timestamp("IMG_20240101_120000.jpg", zone), datetime!(2024-01-01 10:00:00 UTC));
    }

    #[rstest]
    #[case(TimeZone::UTC)]
    #[case(TimeZone::Fixed(offset!(-5:30)))]
    #[case(TimeZone::Local)]
    fn test_name_round_trip(#[case] zone: TimeZone) {
        let instant = datetime!(2022-07-14 16:45:30 UTC);
        for kind in [MediaKind::Image, MediaKind::Video] {
            let name = generate_name(kind, instant, zone);
            assert_eq!(parse_timestamp(&name, zone), instant, "{name}");
            assert_eq!(regulate_name(&name, zone), name);
        }
    }

    #[rstest]
    #[case("IMG_x.jpg", "IMG_x (1).jpg")]
    #[case("IMG_x (1).jpg", "IMG_x (2).jpg")]
    #[case("IMG_x (9).jpg", "IMG_x (10).jpg")]
    #[case("archive.tar.gz", "archive (1).tar.gz")]
    #[case("README", "README (1)")]
    #[case("clip (3)", "clip (4)")]
    #[case(".hidden", ".hidden (1)")]
    #[case("IMG_x(1).jpg", "IMG_x(1) (1).jpg")]
    fn test_increment_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(increment_name(name), expected);
    }

    #[test]
    fn test_increment_name_sequence() {
        let mut name = "IMG_20240101_120000.jpg".to_string();
        for expected in ["IMG_20240101_120000 (1).jpg", "IMG_20240101_120000 (2).jpg", "IMG_20240101_120000 (3).jpg"] {
            name = increment_name(&name);
            assert_eq!(name, expected);
        }
    }

    #[rstest]
    #[case("IMG_20240101_120000.jpg", "thumb-IMG_20240101_120000.jpg")]
    #[case("VID_20240101_120000 (2).mkv", "thumb-VID_20240101_120000 (2).jpg")]
    #[case("archive.tar.gz", "thumb-archive.tar.jpg")]
    #[case("README", "thumb-README.jpg")]
    fn test_thumbnail_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(thumbnail_name(name), expected);
    }

    #[rstest]
    #[case("IMG_20240101_120000.jpg", FileKind::Image)]
    #[case("VID_20240101_120000.mkv", FileKind::Video)]
    #[case("thumb-IMG_20240101_120000.jpg", FileKind::Thumbnail)]
    #[case("1234567890123.jpg", FileKind::Other)]
    #[case("img_20240101_120000.jpg", FileKind::Other)]
    fn test_file_kind(#[case] name: &str, #[case] expected: FileKind) {
        assert_eq!(FileKind::of(name), expected);
    }

    #[test]
    fn test_media_kind_from_prefix() {
        assert_eq!(FileKind::of("VID_1.mkv").media_kind(), MediaKind::Video);
        assert_eq!(FileKind::of("IMG_1.jpg").media_kind(), MediaKind::Image);
        assert_eq!(FileKind::of("123.jpg").media_kind(), MediaKind::Image);
    }

    #[rstest]
    #[case("IMG_20240101_120000.jpg", true)]
    #[case("IMG_20240101_120000 (4).jpg", true)]
    #[case("IMG_holiday.jpg", false)]
    #[case("VID_2024_12.mkv", false)]
    fn test_is_timestamped(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_timestamped(name), expected);
    }
}
