use crate::error::ParseLevelError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record.
///
/// Levels are plain integers so that callers can define their own
/// intermediate severities (a `NOTICE` at `Level(2)` sits between
/// [`Level::INFO`] and [`Level::WARN`]). Ordering follows the integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(pub i32);

impl Level {
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);

    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Level {
    /// Renders the nearest named level at or below this one, plus the
    /// offset from it when the level is not exactly a named one.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = if self.0 < Level::INFO.0 {
            ("DEBUG", Level::DEBUG.0)
        } else if self.0 < Level::WARN.0 {
            ("INFO", Level::INFO.0)
        } else if self.0 < Level::ERROR.0 {
            ("WARN", Level::WARN.0)
        } else {
            ("ERROR", Level::ERROR.0)
        };
        let delta = self.0 - base;
        if delta == 0 {
            f.write_str(name)
        } else {
            write!(f, "{}{:+}", name, delta)
        }
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i32>() {
            return Ok(Level(n));
        }

        let (name, offset) = match s.find(|c: char| c == '+' || c == '-') {
            Some(i) => {
                let offset = s[i..]
                    .parse::<i32>()
                    .map_err(|_| ParseLevelError(s.to_string()))?;
                (&s[..i], offset)
            }
            None => (s, 0),
        };

        let base = match name.to_ascii_lowercase().as_str() {
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => return Err(ParseLevelError(s.to_string())),
        };
        base.0
            .checked_add(offset)
            .map(Level)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level(Level::DEBUG.0 - 4),
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::ERROR => Level::ERROR,
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_and_offsets() {
        assert_eq!(Level::DEBUG.to_string(), "DEBUG");
        assert_eq!(Level::INFO.to_string(), "INFO");
        assert_eq!(Level(2).to_string(), "INFO+2");
        assert_eq!(Level::WARN.to_string(), "WARN");
        assert_eq!(Level(12).to_string(), "ERROR+4");
        assert_eq!(Level(-8).to_string(), "DEBUG-4");
    }

    #[test]
    fn parse_accepts_names_offsets_and_numbers() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::WARN);
        assert_eq!("ERROR".parse::<Level>().unwrap(), Level::ERROR);
        assert_eq!("INFO+2".parse::<Level>().unwrap(), Level(2));
        assert_eq!("debug-4".parse::<Level>().unwrap(), Level(-8));
        assert_eq!("-4".parse::<Level>().unwrap(), Level::DEBUG);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn parse_rejects_offsets_that_overflow() {
        assert!("error+2147483647".parse::<Level>().is_err());
        assert!("debug-2147483648".parse::<Level>().is_err());
        assert_eq!("info+2147483647".parse::<Level>().unwrap(), Level(i32::MAX));
    }

    #[test]
    fn levels_are_ordered() {
        assert!(Level::DEBUG < Level::INFO);
        assert!(Level::INFO < Level(2));
        assert!(Level(2) < Level::WARN);
        assert!(Level::WARN < Level::ERROR);
    }
}
