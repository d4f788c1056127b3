use crate::attr::{args_to_attrs, Arg, Attr};
use crate::level::Level;
use crate::record::LogRecord;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Rewrites a record before it is rendered.
///
/// Transformers run in the order they are configured on the middleware,
/// each one receiving the output of the previous.
pub type RecordTransformer = Arc<dyn Fn(LogRecord) -> LogRecord + Send + Sync>;

/// Appends each of `args` whose key is not already on the record.
pub fn default_attrs(args: Vec<Arg>) -> RecordTransformer {
    let defaults = args_to_attrs(args);
    Arc::new(move |mut r: LogRecord| {
        let present: HashSet<&str> = r.attrs.iter().map(|a| a.key.as_str()).collect();
        let missing: Vec<Attr> = defaults
            .iter()
            .filter(|a| !present.contains(a.key.as_str()))
            .cloned()
            .collect();
        r.add_attrs(missing);
        r
    })
}

/// Removes every attribute whose key is one of `keys`.
pub fn drop_attrs<I, K>(keys: I) -> RecordTransformer
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let keys: HashSet<String> = keys.into_iter().map(Into::into).collect();
    Arc::new(move |r: LogRecord| {
        let attrs = r.attrs.iter().filter(|a| !keys.contains(&a.key)).cloned().collect();
        r.with_attrs_replaced(attrs)
    })
}

/// Renames attributes according to `mapping`, keeping their values and order.
pub fn rename_attrs(mapping: HashMap<String, String>) -> RecordTransformer {
    Arc::new(move |r: LogRecord| {
        let attrs = r
            .attrs
            .iter()
            .map(|a| match mapping.get(&a.key) {
                Some(key) => Attr { key: key.clone(), value: a.value.clone() },
                None => a.clone(),
            })
            .collect();
        r.with_attrs_replaced(attrs)
    })
}

/// Collapses repeated keys so each appears once, holding the value of its
/// last occurrence. The order of the resulting attributes is unspecified.
pub fn unique_attrs() -> RecordTransformer {
    Arc::new(|r: LogRecord| {
        let mut by_key = BTreeMap::new();
        for a in &r.attrs {
            by_key.insert(a.key.clone(), a.value.clone());
        }
        let attrs = by_key.into_iter().map(|(key, value)| Attr { key, value }).collect();
        r.with_attrs_replaced(attrs)
    })
}

/// Promotes records logged at [`Level::INFO`] whose message carries a
/// bracketed level tag, such as `"[warn] disk almost full"`.
///
/// The text between the first `[` and the following `]` is looked up in
/// `level_map` (lowercased first when `case_insensitive`). On a hit the
/// record takes the mapped level and its message becomes the trimmed text
/// after the `]`. On a miss, or when there is no bracket pair, the record
/// is returned untouched. Records at any other level are never altered.
///
/// A `None` map yields a transformer that passes everything through.
///
/// ```
/// use std::collections::HashMap;
/// use tracing_log_middleware::{level::Level, record::LogRecord, transform::convert_legacy_level};
///
/// let t = convert_legacy_level(Some(HashMap::from([("debug".to_string(), Level::DEBUG)])), true);
/// let r = t(LogRecord::new(chrono::Utc::now(), Level::INFO, "[DEBUG] hello world"));
/// assert_eq!(r.level, Level::DEBUG);
/// assert_eq!(r.message, "hello world");
/// ```
pub fn convert_legacy_level(level_map: Option<HashMap<String, Level>>, case_insensitive: bool) -> RecordTransformer {
    let Some(level_map) = level_map else {
        return Arc::new(|r: LogRecord| r);
    };
    let level_map: HashMap<String, Level> = if case_insensitive {
        level_map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
    } else {
        level_map
    };

    Arc::new(move |mut r: LogRecord| {
        if r.level != Level::INFO {
            return r;
        }
        let Some(open) = r.message.find('[') else {
            return r;
        };
        let Some(close) = r.message[open..].find(']').map(|i| open + i) else {
            return r;
        };

        let tag = &r.message[open + 1..close];
        let found = if case_insensitive {
            level_map.get(&tag.to_lowercase())
        } else {
            level_map.get(tag)
        };
        if let Some(level) = found.copied() {
            r.message = r.message[close + 1..].trim().to_string();
            r.level = level;
        }
        r
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use chrono::Utc;

    fn record(level: Level, msg: &str, attrs: Vec<Attr>) -> LogRecord {
        let mut r = LogRecord::new(Utc::now(), level, msg);
        r.add_attrs(attrs);
        r
    }

    fn keys(r: &LogRecord) -> Vec<&str> {
        r.attrs.iter().map(|a| a.key.as_str()).collect()
    }

    #[test]
    fn default_attrs_only_adds_missing_keys() {
        let t = default_attrs(args!["foo", "bar", "baz", "buzz"]);
        let r = t(record(Level::INFO, "m", vec![Attr::string("foo", "foo")]));
        assert_eq!(keys(&r), vec!["foo", "baz"]);
        assert_eq!(r.attr("foo").unwrap().value.as_str(), Some("foo"));
        assert_eq!(r.attr("baz").unwrap().value.as_str(), Some("buzz"));
    }

    #[test]
    fn default_attrs_is_idempotent() {
        let t = default_attrs(args!["a", 1, "b", 2]);
        let once = t(record(Level::INFO, "m", vec![Attr::int("b", 9)]));
        let twice = t(once.clone());
        assert_eq!(once.attrs, twice.attrs);
    }

    #[test]
    fn drop_attrs_removes_every_occurrence() {
        let t = drop_attrs(["foo"]);
        let r = t(record(
            Level::INFO,
            "m",
            vec![Attr::int("foo", 1), Attr::int("bar", 2), Attr::int("foo", 3), Attr::int("bar", 4)],
        ));
        assert_eq!(keys(&r), vec!["bar", "bar"]);
        assert_eq!(r.message, "m");
    }

    #[test]
    fn dropped_key_comes_back_with_default() {
        let drop = drop_attrs(["secret"]);
        let default = default_attrs(args!["secret", "REDACTED"]);
        let r = default(drop(record(Level::INFO, "m", vec![Attr::string("secret", "hunter2")])));
        assert_eq!(r.attrs, vec![Attr::string("secret", "REDACTED")]);
    }

    #[test]
    fn rename_attrs_keeps_values_and_order() {
        let t = rename_attrs(HashMap::from([("foo".to_string(), "baz".to_string())]));
        let r = t(record(Level::INFO, "m", vec![Attr::int("foo", 1), Attr::int("bar", 2)]));
        assert_eq!(r.attrs, vec![Attr::int("baz", 1), Attr::int("bar", 2)]);
    }

    #[test]
    fn unique_attrs_keeps_last_value() {
        let t = unique_attrs();
        let r = t(record(
            Level::INFO,
            "m",
            vec![Attr::string("foo", "a"), Attr::int("x", 1), Attr::string("foo", "b")],
        ));
        let foos: Vec<_> = r.attrs.iter().filter(|a| a.key == "foo").collect();
        assert_eq!(foos.len(), 1);
        assert_eq!(foos[0].value.as_str(), Some("b"));
        assert_eq!(r.attrs.len(), 2);
    }

    fn legacy_map() -> HashMap<String, Level> {
        HashMap::from([
            ("debug".to_string(), Level::DEBUG),
            ("info".to_string(), Level::INFO),
            ("notice".to_string(), Level(2)),
            ("warn".to_string(), Level::WARN),
            ("error".to_string(), Level::ERROR),
        ])
    }

    #[test]
    fn convert_legacy_level_cases() {
        let t = convert_legacy_level(Some(legacy_map()), true);
        let cases = [
            ("level is not info", Level::DEBUG, "foo", Level::DEBUG),
            ("no tag", Level::INFO, "foo", Level::INFO),
            ("debug", Level::INFO, "[debug] foo", Level::DEBUG),
            ("notice", Level::INFO, "[notice] foo", Level(2)),
            ("warn", Level::INFO, "[warn] foo", Level::WARN),
            ("error", Level::INFO, "[error] foo", Level::ERROR),
            ("unknown tag", Level::INFO, "[danger] foo", Level::INFO),
            ("uppercase debug", Level::INFO, "[DEBUG] foo", Level::DEBUG),
            ("uppercase notice", Level::INFO, "[NOTICE] foo", Level(2)),
            ("uppercase warn", Level::INFO, "[WARN] foo", Level::WARN),
            ("uppercase error", Level::INFO, "[ERROR] foo", Level::ERROR),
            ("uppercase unknown tag", Level::INFO, "[DANGER] foo", Level::INFO),
        ];
        for (name, level, msg, expected) in cases {
            let r = t(record(level, msg, vec![]));
            assert_eq!(r.level, expected, "case {name}");
        }
    }

    #[test]
    fn promotion_strips_tag_from_message() {
        let t = convert_legacy_level(Some(legacy_map()), true);
        let r = t(record(Level::INFO, "[debug]   foo  ", vec![]));
        assert_eq!(r.level, Level::DEBUG);
        assert_eq!(r.message, "foo");
    }

    #[test]
    fn failed_lookup_keeps_message() {
        let t = convert_legacy_level(Some(legacy_map()), true);
        let r = t(record(Level::INFO, "[DANGER] foo", vec![]));
        assert_eq!(r.level, Level::INFO);
        assert_eq!(r.message, "[DANGER] foo");
    }

    #[test]
    fn non_info_record_is_never_touched() {
        let t = convert_legacy_level(Some(legacy_map()), true);
        let r = t(record(Level::WARN, "[debug] foo", vec![]));
        assert_eq!(r.level, Level::WARN);
        assert_eq!(r.message, "[debug] foo");
    }

    #[test]
    fn case_sensitive_map_requires_exact_tag() {
        let map = HashMap::from([("DEBUG".to_string(), Level::DEBUG)]);
        let t = convert_legacy_level(Some(map), false);
        assert_eq!(t(record(Level::INFO, "[DEBUG] foo", vec![])).level, Level::DEBUG);
        assert_eq!(t(record(Level::INFO, "[debug] foo", vec![])).level, Level::INFO);
    }

    #[test]
    fn mixed_case_map_keys_are_lowered() {
        let map = HashMap::from([("Warn".to_string(), Level::WARN)]);
        let t = convert_legacy_level(Some(map), true);
        assert_eq!(t(record(Level::INFO, "[wArN] foo", vec![])).level, Level::WARN);
    }

    #[test]
    fn unterminated_bracket_is_ignored() {
        let t = convert_legacy_level(Some(legacy_map()), true);
        let r = t(record(Level::INFO, "[debug foo", vec![]));
        assert_eq!(r.level, Level::INFO);
        assert_eq!(r.message, "[debug foo");
    }

    #[test]
    fn missing_map_passes_through() {
        let t = convert_legacy_level(None, true);
        let r = t(record(Level::INFO, "[debug] foo", vec![]));
        assert_eq!(r.level, Level::INFO);
        assert_eq!(r.message, "[debug] foo");
    }
}
